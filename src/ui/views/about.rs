use crate::api::types::{AboutContent, AboutSection, Skill, SECTION_KEYS, SKILL_CATEGORIES};
use crate::query::{Mutation, Query, QueryKey, QueryStatus, Tag};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::ViewContext;
use crate::ui::ensure_valid_selection;
use crate::util::comma_list;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

// Section form rows
const ROW_SEC_TITLE: usize = 0;
const ROW_SEC_DESCRIPTION: usize = 1;
const ROW_SEC_ITEMS: usize = 2;

// Skill form rows
const ROW_SKILL_NAME: usize = 0;
const ROW_SKILL_LEVEL: usize = 1;
const ROW_SKILL_EXPERIENCE: usize = 2;
const ROW_SKILL_DETAILS: usize = 3;
const ROW_SKILL_PROJECTS: usize = 4;
const ROW_SKILL_KEYWORDS: usize = 5;

const TOP_ROWS: [&str; 6] = [
  "Current focus",
  "Learning",
  "Interests",
  "Skills: frontend",
  "Skills: backend",
  "Skills: tools",
];

enum Mode {
  /// Top-level list: three sections, three skill categories
  Browsing,
  /// Inside one skill category
  Skills { category: usize },
  EditingSection { key: &'static str, form: Form },
  EditingSkill {
    category: usize,
    /// None = new skill
    index: Option<usize>,
    form: Form,
  },
}

/// Editor for the about page: narrative sections and categorized skills.
/// The whole page is one document on the backend, so every save replaces a
/// section or a category list wholesale.
pub struct AboutView {
  ctx: ViewContext,
  query: Query<AboutContent>,
  top_state: ListState,
  skill_state: ListState,
  mode: Mode,
  confirm: ConfirmDialog,
  pending_delete: Option<(usize, usize)>,
  saving: Option<Mutation<AboutContent>>,
}

fn about_query(ctx: &ViewContext) -> Query<AboutContent> {
  let api = ctx.api.clone();
  let mut query = Query::new(
    ctx.queries.clone(),
    QueryKey::new("about", &()),
    &[Tag::About],
    move || {
      let api = api.clone();
      async move { api.about().await.map_err(|e| e.to_string()) }
    },
  );
  query.fetch();
  query
}

impl AboutView {
  pub fn new(ctx: ViewContext) -> Self {
    let query = about_query(&ctx);
    Self {
      ctx,
      query,
      top_state: ListState::default(),
      skill_state: ListState::default(),
      mode: Mode::Browsing,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
      saving: None,
    }
  }

  fn section(&self, idx: usize) -> Option<&AboutSection> {
    let about = self.query.data()?;
    match idx {
      0 => Some(&about.current_focus),
      1 => Some(&about.learning),
      2 => Some(&about.interests),
      _ => None,
    }
  }

  fn skills(&self, category: usize) -> &[Skill] {
    match self.query.data() {
      Some(about) => match category {
        0 => &about.skills.frontend,
        1 => &about.skills.backend,
        _ => &about.skills.tools,
      },
      None => &[],
    }
  }

  fn section_form(section: &AboutSection, label: &'static str) -> Form {
    Form::new(format!("Edit {label}"))
      .text("Title", &section.title)
      .text("Description", &section.description)
      .list("Items", section.items.clone())
  }

  fn skill_form(skill: &Skill, is_new: bool) -> Form {
    Form::new(if is_new { "New skill" } else { "Edit skill" })
      .text("Name", &skill.name)
      .text("Level", &skill.level)
      .text("Experience", &skill.experience)
      .text("Details", &skill.details)
      .text("Projects", &skill.projects.join(", "))
      .text("Keywords", &skill.keywords.join(", "))
  }

  fn build_skill(form: &Form) -> Result<Skill, String> {
    let name = form.text_value(ROW_SKILL_NAME).trim().to_string();
    if name.is_empty() {
      return Err("skill name is required".to_string());
    }
    Ok(Skill {
      name,
      level: form.text_value(ROW_SKILL_LEVEL).trim().to_string(),
      experience: form.text_value(ROW_SKILL_EXPERIENCE).trim().to_string(),
      details: form.text_value(ROW_SKILL_DETAILS),
      // Free-typed comma lists, split and cleaned on save
      projects: comma_list(&form.text_value(ROW_SKILL_PROJECTS)),
      keywords: comma_list(&form.text_value(ROW_SKILL_KEYWORDS)),
    })
  }

  fn save_section(&mut self, key: &'static str, data: AboutSection) {
    let api = self.ctx.api.clone();
    self.saving = Some(self.ctx.queries.mutation(&[Tag::About], async move {
      api
        .update_about_section(key, &data)
        .await
        .map_err(|e| e.to_string())
    }));
  }

  fn save_skills(&mut self, category: usize, skills: Vec<Skill>) {
    let api = self.ctx.api.clone();
    let name = SKILL_CATEGORIES[category.min(2)];
    self.saving = Some(self.ctx.queries.mutation(&[Tag::About], async move {
      api
        .update_skills(name, &skills)
        .await
        .map_err(|e| e.to_string())
    }));
  }

  fn render_top(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.query.status() {
      QueryStatus::Loading => " About (loading...) ".to_string(),
      QueryStatus::Error => format!(
        " About (error: {}) ",
        self.query.error().unwrap_or("unknown")
      ),
      QueryStatus::Success => " About ".to_string(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.query.data().is_none() && !self.query.is_loading() {
      let paragraph = Paragraph::new("Failed to load the about page. Press 'r' to retry.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    ensure_valid_selection(&mut self.top_state, TOP_ROWS.len());

    let items: Vec<ListItem> = TOP_ROWS
      .iter()
      .enumerate()
      .map(|(i, label)| {
        let summary = if i < 3 {
          self
            .section(i)
            .map(|s| truncate(&s.title, 40))
            .unwrap_or_default()
        } else {
          format!("{} skills", self.skills(i - 3).len())
        };
        let line = Line::from(vec![
          Span::raw(format!("{:<20}", label)),
          Span::styled(summary, Style::default().fg(Color::DarkGray)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.top_state);
  }

  fn render_skills(&mut self, frame: &mut Frame, area: Rect, category: usize) {
    let len = self.skills(category).len();
    ensure_valid_selection(&mut self.skill_state, len);

    let block = Block::default()
      .title(format!(" Skills - {} ", SKILL_CATEGORIES[category.min(2)]))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let paragraph = Paragraph::new("No skills in this category. Press 'n' to add one.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .skills(category)
      .iter()
      .map(|skill| {
        let line = Line::from(vec![
          Span::raw(format!("{:<24}", truncate(&skill.name, 24))),
          Span::styled(
            format!("{:<14}", truncate(&skill.level, 14)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            truncate(&skill.experience, 20),
            Style::default().fg(Color::DarkGray),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.skill_state);
  }
}

impl View for AboutView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some((category, index)) = self.pending_delete.take() {
          let mut skills = self.skills(category).to_vec();
          if index < skills.len() {
            skills.remove(index);
            self.save_skills(category, skills);
          }
        }
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match &mut self.mode {
      Mode::Browsing => match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
          self.top_state.select_next();
          ViewAction::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
          self.top_state.select_previous();
          ViewAction::None
        }
        KeyCode::Char('r') => {
          self.query.refetch();
          ViewAction::None
        }
        KeyCode::Char('e') | KeyCode::Enter => {
          let Some(idx) = self.top_state.selected() else {
            return ViewAction::None;
          };
          if idx < 3 {
            if let Some(section) = self.section(idx) {
              self.mode = Mode::EditingSection {
                key: SECTION_KEYS[idx],
                form: Self::section_form(section, TOP_ROWS[idx]),
              };
            } else {
              return ViewAction::Notify(Notice::error("about page is still loading"));
            }
          } else {
            self.skill_state.select(None);
            self.mode = Mode::Skills { category: idx - 3 };
          }
          ViewAction::None
        }
        KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
        _ => ViewAction::None,
      },

      Mode::Skills { category } => {
        let category = *category;
        match key.code {
          KeyCode::Char('j') | KeyCode::Down => {
            self.skill_state.select_next();
          }
          KeyCode::Char('k') | KeyCode::Up => {
            self.skill_state.select_previous();
          }
          KeyCode::Char('n') => {
            self.mode = Mode::EditingSkill {
              category,
              index: None,
              form: Self::skill_form(&Skill::default(), true),
            };
          }
          KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(index) = self.skill_state.selected() {
              if let Some(skill) = self.skills(category).get(index) {
                self.mode = Mode::EditingSkill {
                  category,
                  index: Some(index),
                  form: Self::skill_form(skill, false),
                };
              }
            }
          }
          KeyCode::Char('d') => {
            if let Some(index) = self.skill_state.selected() {
              if let Some(skill) = self.skills(category).get(index) {
                let msg = format!("Delete skill \"{}\"?", truncate(&skill.name, 30));
                self.pending_delete = Some((category, index));
                self.confirm.show(msg);
              }
            }
          }
          KeyCode::Char('q') | KeyCode::Esc => {
            self.mode = Mode::Browsing;
          }
          _ => {}
        }
        ViewAction::None
      }

      Mode::EditingSection { key: section_key, form } => {
        let section_key = *section_key;
        let mut close_form = false;
        let action = match form.handle_key(key) {
          KeyResult::Event(FormEvent::Save) => {
            let data = AboutSection {
              title: form.text_value(ROW_SEC_TITLE).trim().to_string(),
              description: form.text_value(ROW_SEC_DESCRIPTION),
              items: form.list_items(ROW_SEC_ITEMS),
            };
            self.save_section(section_key, data);
            ViewAction::Notify(Notice::info("saving..."))
          }
          KeyResult::Event(FormEvent::Cancelled) => {
            close_form = true;
            ViewAction::None
          }
          KeyResult::Event(FormEvent::RowSubmitted(_)) => {
            form.focus_next();
            ViewAction::None
          }
          KeyResult::Event(FormEvent::Rejected(reason)) => {
            ViewAction::Notify(Notice::error(reason))
          }
          KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
        };
        if close_form {
          self.mode = Mode::Browsing;
        }
        action
      }

      Mode::EditingSkill { category, index, form } => {
        let (category, index) = (*category, *index);
        let mut close_form = false;
        let action = match form.handle_key(key) {
          KeyResult::Event(FormEvent::Save) => match Self::build_skill(form) {
            Ok(skill) => {
              let mut skills = self.skills(category).to_vec();
              match index {
                Some(i) if i < skills.len() => skills[i] = skill,
                _ => skills.push(skill),
              }
              self.save_skills(category, skills);
              ViewAction::Notify(Notice::info("saving..."))
            }
            Err(reason) => ViewAction::Notify(Notice::error(reason)),
          },
          KeyResult::Event(FormEvent::Cancelled) => {
            close_form = true;
            ViewAction::None
          }
          KeyResult::Event(FormEvent::RowSubmitted(_)) => {
            form.focus_next();
            ViewAction::None
          }
          KeyResult::Event(FormEvent::Rejected(reason)) => {
            ViewAction::Notify(Notice::error(reason))
          }
          KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
        };
        if close_form {
          self.mode = Mode::Skills { category };
        }
        action
      }
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match &self.mode {
      Mode::Browsing => self.render_top(frame, area),
      Mode::Skills { category } => {
        let category = *category;
        self.render_skills(frame, area, category);
      }
      Mode::EditingSection { form, .. } | Mode::EditingSkill { form, .. } => {
        form.render(frame, area);
      }
    }
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "About".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    if let Some(result) = self.saving.as_mut().and_then(|m| m.poll()) {
      self.saving = None;
      match result {
        Ok(_) => {
          // Leave the form; stay inside the category after a skill edit
          match &self.mode {
            Mode::EditingSkill { category, .. } => {
              self.mode = Mode::Skills {
                category: *category,
              };
            }
            Mode::EditingSection { .. } => self.mode = Mode::Browsing,
            _ => {}
          }
          return ViewAction::Notify(Notice::info("about page saved"));
        }
        Err(e) => return ViewAction::Notify(Notice::error(format!("save failed: {e}"))),
      }
    }

    ViewAction::None
  }

  fn capturing_input(&self) -> bool {
    matches!(
      self.mode,
      Mode::EditingSection { .. } | Mode::EditingSkill { .. }
    ) || self.confirm.is_active()
  }

  fn key_hints(&self) -> &'static str {
    match &self.mode {
      Mode::Browsing => " j/k:nav  Enter:open  r:refresh  q:back",
      Mode::Skills { .. } => " j/k:nav  n:new  e:edit  d:delete  q:back",
      Mode::EditingSection { .. } | Mode::EditingSkill { .. } => {
        " Tab:next field  Ctrl-S:save  Esc:cancel"
      }
    }
  }
}
