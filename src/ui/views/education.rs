use crate::api::types::{Education, EducationPage};
use crate::query::{Mutation, Query, QueryKey, QueryStatus, Tag};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::ViewContext;
use crate::ui::ensure_valid_selection;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const ROW_DEGREE: usize = 0;
const ROW_INSTITUTION: usize = 1;
const ROW_PERIOD: usize = 2;
const ROW_RESULT: usize = 3;

enum Mode {
  Browsing,
  Editing { id: String, form: Form },
}

/// Paginated education-entry management.
pub struct EducationView {
  ctx: ViewContext,
  page: u32,
  query: Query<EducationPage>,
  list_state: ListState,
  mode: Mode,
  confirm: ConfirmDialog,
  pending_delete: Option<String>,
  saving: Option<Mutation<Education>>,
  deleting: Option<Mutation<()>>,
}

fn education_query(ctx: &ViewContext, page: u32) -> Query<EducationPage> {
  let api = ctx.api.clone();
  let mut query = Query::new(
    ctx.queries.clone(),
    QueryKey::new("education", &page),
    &[Tag::Educations],
    move || {
      let api = api.clone();
      async move { api.education(page).await.map_err(|e| e.to_string()) }
    },
  );
  query.fetch();
  query
}

impl EducationView {
  pub fn new(ctx: ViewContext) -> Self {
    let query = education_query(&ctx, 1);
    Self {
      ctx,
      page: 1,
      query,
      list_state: ListState::default(),
      mode: Mode::Browsing,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
      saving: None,
      deleting: None,
    }
  }

  fn entries(&self) -> &[Education] {
    self
      .query
      .data()
      .map(|page| page.education.as_slice())
      .unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self.query.data().map(|page| page.total_pages).unwrap_or(1)
  }

  fn set_page(&mut self, page: u32) {
    self.page = page;
    self.query = education_query(&self.ctx, page);
    self.list_state.select(None);
  }

  fn selected_entry(&self) -> Option<&Education> {
    self.list_state.selected().and_then(|idx| self.entries().get(idx))
  }

  fn form_for(entry: &Education) -> Form {
    Form::new(if entry.id.is_empty() {
      "New education entry"
    } else {
      "Edit education entry"
    })
    .text("Degree", &entry.degree)
    .text("Institution", &entry.institution)
    .text("Period", &entry.period)
    .text("Result", &entry.result)
  }

  fn build_entry(id: &str, form: &Form) -> Result<Education, String> {
    let degree = form.text_value(ROW_DEGREE).trim().to_string();
    let institution = form.text_value(ROW_INSTITUTION).trim().to_string();
    if degree.is_empty() || institution.is_empty() {
      return Err("degree and institution are required".to_string());
    }
    Ok(Education {
      id: id.to_string(),
      degree,
      institution,
      period: form.text_value(ROW_PERIOD).trim().to_string(),
      result: form.text_value(ROW_RESULT).trim().to_string(),
    })
  }

  fn start_delete(&mut self, id: String) {
    let api = self.ctx.api.clone();
    self.deleting = Some(self.ctx.queries.mutation(&[Tag::Educations], async move {
      api.delete_education(&id).await.map_err(|e| e.to_string())
    }));
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.entries().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.status() {
      QueryStatus::Loading => " Education (loading...) ".to_string(),
      QueryStatus::Error => format!(
        " Education (error: {}) ",
        self.query.error().unwrap_or("unknown")
      ),
      QueryStatus::Success => {
        format!(" Education - page {}/{} ", self.page, self.total_pages())
      }
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.error().is_some() {
        "Failed to load entries. Press 'r' to retry."
      } else {
        "No entries yet. Press 'n' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .entries()
      .iter()
      .map(|entry| {
        let line = Line::from(vec![
          Span::raw(format!("{:<34}", truncate(&entry.degree, 34))),
          Span::styled(
            format!("{:<28}", truncate(&entry.institution, 28)),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(
            truncate(&entry.period, 16),
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

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for EducationView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(id) = self.pending_delete.take() {
          self.start_delete(id);
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

    if let Mode::Editing { id, form } = &mut self.mode {
      let mut close_form = false;
      let action = match form.handle_key(key) {
        KeyResult::Event(FormEvent::Save) => match Self::build_entry(id, form) {
          Ok(entry) => {
            let api = self.ctx.api.clone();
            self.saving = Some(self.ctx.queries.mutation(&[Tag::Educations], async move {
              let result = if entry.id.is_empty() {
                api.create_education(&entry).await
              } else {
                api.update_education(&entry).await
              };
              result.map_err(|e| e.to_string())
            }));
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
        self.mode = Mode::Browsing;
      }
      return action;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('h') | KeyCode::Left => {
        if self.page > 1 {
          self.set_page(self.page - 1);
        }
      }
      KeyCode::Char('l') | KeyCode::Right => {
        if self.page < self.total_pages() {
          self.set_page(self.page + 1);
        }
      }
      KeyCode::Char('r') => {
        self.query.refetch();
      }
      KeyCode::Char('n') => {
        self.mode = Mode::Editing {
          id: String::new(),
          form: Self::form_for(&Education::default()),
        };
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(entry) = self.selected_entry() {
          self.mode = Mode::Editing {
            id: entry.id.clone(),
            form: Self::form_for(entry),
          };
        }
      }
      KeyCode::Char('d') => {
        if let Some(entry) = self.selected_entry() {
          let id = entry.id.clone();
          let msg = format!("Delete \"{}\"?", truncate(&entry.degree, 40));
          self.pending_delete = Some(id);
          self.confirm.show(msg);
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match &self.mode {
      Mode::Browsing => self.render_list(frame, area),
      Mode::Editing { form, .. } => form.render(frame, area),
    }
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Education".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    if let Some(result) = self.saving.as_mut().and_then(|m| m.poll()) {
      self.saving = None;
      match result {
        Ok(_) => {
          self.mode = Mode::Browsing;
          return ViewAction::Notify(Notice::info("entry saved"));
        }
        Err(e) => return ViewAction::Notify(Notice::error(format!("save failed: {e}"))),
      }
    }

    if let Some(result) = self.deleting.as_mut().and_then(|m| m.poll()) {
      self.deleting = None;
      match result {
        Ok(()) => return ViewAction::Notify(Notice::info("entry deleted")),
        Err(e) => return ViewAction::Notify(Notice::error(format!("delete failed: {e}"))),
      }
    }

    ViewAction::None
  }

  fn capturing_input(&self) -> bool {
    !matches!(self.mode, Mode::Browsing) || self.confirm.is_active()
  }

  fn key_hints(&self) -> &'static str {
    match &self.mode {
      Mode::Browsing => " j/k:nav  h/l:page  n:new  e:edit  d:delete  r:refresh  q:back",
      Mode::Editing { .. } => " Tab:next field  Ctrl-S:save  Esc:cancel",
    }
  }
}
