use crate::api::types::{MediaItem, MediaType, Project, ProjectCategory, ProjectLinks, ProjectPage};
use crate::query::{Mutation, Query, QueryKey, QueryStatus, Tag};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::ViewContext;
use crate::ui::ensure_valid_selection;
use crate::util::youtube_video_id;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const ROW_TITLE: usize = 0;
const ROW_DESCRIPTION: usize = 1;
const ROW_LONG_DESCRIPTION: usize = 2;
const ROW_CATEGORY: usize = 3;
const ROW_TECHNOLOGIES: usize = 4;
const ROW_IMAGE: usize = 5;
const ROW_REPO: usize = 6;
const ROW_USERNAME: usize = 7;
const ROW_LIVE: usize = 8;
const ROW_CLIENT: usize = 9;
const ROW_SERVER: usize = 10;
const ROW_GITHUB: usize = 11;
const ROW_YOUTUBE: usize = 12;
const ROW_GALLERY: usize = 13;

const CATEGORY_LABELS: [&str; 3] = ["Frontend", "Backend", "Full Stack"];

/// Where an upload result lands once it completes
enum UploadTarget {
  /// Replace the text of a form row (project thumbnail)
  Row(usize),
  /// Append an image item to the media gallery
  Gallery,
}

enum Mode {
  Browsing,
  Editing {
    id: String,
    form: Form,
    media: Vec<MediaItem>,
  },
}

/// Paginated project management, including the media gallery.
pub struct ProjectsView {
  ctx: ViewContext,
  page: u32,
  query: Query<ProjectPage>,
  list_state: ListState,
  mode: Mode,
  confirm: ConfirmDialog,
  pending_delete: Option<String>,
  saving: Option<Mutation<Project>>,
  deleting: Option<Mutation<()>>,
  uploading: Option<(UploadTarget, Mutation<String>)>,
}

fn project_query(ctx: &ViewContext, page: u32) -> Query<ProjectPage> {
  let api = ctx.api.clone();
  let mut query = Query::new(
    ctx.queries.clone(),
    QueryKey::new("projects", &page),
    &[Tag::Projects],
    move || {
      let api = api.clone();
      async move { api.projects(page).await.map_err(|e| e.to_string()) }
    },
  );
  query.fetch();
  query
}

fn optional(value: String) -> Option<String> {
  let value = value.trim().to_string();
  if value.is_empty() {
    None
  } else {
    Some(value)
  }
}

impl ProjectsView {
  pub fn new(ctx: ViewContext) -> Self {
    let query = project_query(&ctx, 1);
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
      uploading: None,
    }
  }

  fn projects(&self) -> &[Project] {
    self
      .query
      .data()
      .map(|page| page.projects.as_slice())
      .unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self.query.data().map(|page| page.total_pages).unwrap_or(1)
  }

  fn set_page(&mut self, page: u32) {
    self.page = page;
    self.query = project_query(&self.ctx, page);
    self.list_state.select(None);
  }

  fn selected_project(&self) -> Option<&Project> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.projects().get(idx))
  }

  fn form_for(project: &Project) -> Form {
    let category = ProjectCategory::ALL
      .iter()
      .position(|c| *c == project.category)
      .unwrap_or(0);
    let links = &project.links;
    Form::new(if project.id.is_empty() {
      "New project"
    } else {
      "Edit project"
    })
    .text("Title", &project.title)
    .text("Description", &project.description)
    .text("Long desc", &project.long_description)
    .select("Category", &CATEGORY_LABELS, category)
    .list("Technologies", project.technologies.clone())
    .text("Image", &project.image)
    .text("Repo", &project.repo)
    .text("Username", &project.username)
    .text("Live URL", links.live.as_deref().unwrap_or(""))
    .text("Client URL", links.client.as_deref().unwrap_or(""))
    .text("Server URL", links.server.as_deref().unwrap_or(""))
    .text("GitHub URL", links.github.as_deref().unwrap_or(""))
    .text("YouTube URL", "")
    .text("Gallery image", "")
  }

  fn build_project(id: &str, form: &Form, media: &[MediaItem]) -> Result<Project, String> {
    let title = form.text_value(ROW_TITLE).trim().to_string();
    let description = form.text_value(ROW_DESCRIPTION).trim().to_string();
    if title.is_empty() || description.is_empty() {
      return Err("title and description are required".to_string());
    }
    Ok(Project {
      id: id.to_string(),
      title,
      description,
      long_description: form.text_value(ROW_LONG_DESCRIPTION),
      category: ProjectCategory::from_label(form.select_value(ROW_CATEGORY)).unwrap_or_default(),
      technologies: form.list_items(ROW_TECHNOLOGIES),
      image: form.text_value(ROW_IMAGE).trim().to_string(),
      repo: form.text_value(ROW_REPO).trim().to_string(),
      username: form.text_value(ROW_USERNAME).trim().to_string(),
      links: ProjectLinks {
        live: optional(form.text_value(ROW_LIVE)),
        client: optional(form.text_value(ROW_CLIENT)),
        server: optional(form.text_value(ROW_SERVER)),
        github: optional(form.text_value(ROW_GITHUB)),
      },
      media: media.to_vec(),
    })
  }

  fn start_upload(&mut self, target: UploadTarget, path: String) -> ViewAction {
    let Some(uploader) = self.ctx.uploader.clone() else {
      return ViewAction::Notify(Notice::error(
        "no upload endpoint configured; paste an image URL instead",
      ));
    };
    let path = std::path::PathBuf::from(path);
    self.uploading = Some((
      target,
      self.ctx.queries.mutation(&[], async move {
        uploader.upload(&path).await.map_err(|e| e.to_string())
      }),
    ));
    ViewAction::Notify(Notice::info("uploading image..."))
  }

  fn start_delete(&mut self, id: String) {
    let api = self.ctx.api.clone();
    self.deleting = Some(self.ctx.queries.mutation(&[Tag::Projects], async move {
      api.delete_project(&id).await.map_err(|e| e.to_string())
    }));
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.projects().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.status() {
      QueryStatus::Loading => " Projects (loading...) ".to_string(),
      QueryStatus::Error => format!(
        " Projects (error: {}) ",
        self.query.error().unwrap_or("unknown")
      ),
      QueryStatus::Success => format!(" Projects - page {}/{} ", self.page, self.total_pages()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.error().is_some() {
        "Failed to load projects. Press 'r' to retry."
      } else {
        "No projects yet. Press 'n' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .projects()
      .iter()
      .map(|project| {
        let media = if project.media.is_empty() {
          String::new()
        } else {
          format!("{} media", project.media.len())
        };
        let line = Line::from(vec![
          Span::raw(format!("{:<36}", truncate(&project.title, 36))),
          Span::styled(
            format!("{:<12}", project.category.label()),
            Style::default().fg(Color::Cyan),
          ),
          Span::styled(media, Style::default().fg(Color::DarkGray)),
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

  fn render_editor(frame: &mut Frame, area: Rect, form: &Form, media: &[MediaItem]) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(3)])
      .split(area);

    form.render(frame, chunks[0]);

    let mut spans = vec![Span::styled(
      format!(" Media ({}): ", media.len()),
      Style::default().fg(Color::White),
    )];
    for item in media {
      let label = match (item.kind, item.video_id.as_deref()) {
        (MediaType::Youtube, Some(id)) => format!("[▶ {id}]"),
        (kind, _) => format!("[{} {}]", kind.label(), truncate(&item.url, 24)),
      };
      spans.push(Span::styled(label, Style::default().fg(Color::Cyan)));
      spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
      "(Ctrl-D on a media row removes the last item)",
      Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[1]);
  }
}

impl View for ProjectsView {
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

    if let Mode::Editing { id, form, media } = &mut self.mode {
      // Media rows get one extra binding: Ctrl-D drops the last gallery item
      if key.code == KeyCode::Char('d')
        && key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(form.focused_row(), ROW_YOUTUBE | ROW_GALLERY)
      {
        return match media.pop() {
          Some(_) => ViewAction::Notify(Notice::info("removed last media item")),
          None => ViewAction::Notify(Notice::error("no media to remove")),
        };
      }

      let mut close_form = false;
      let action = match form.handle_key(key) {
        KeyResult::Event(FormEvent::Save) => match Self::build_project(id, form, media) {
          Ok(project) => {
            let api = self.ctx.api.clone();
            self.saving = Some(self.ctx.queries.mutation(&[Tag::Projects], async move {
              let result = if project.id.is_empty() {
                api.create_project(&project).await
              } else {
                api.update_project(&project).await
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
        KeyResult::Event(FormEvent::RowSubmitted(ROW_YOUTUBE)) => {
          let url = form.text_value(ROW_YOUTUBE).trim().to_string();
          if url.is_empty() {
            ViewAction::None
          } else {
            match youtube_video_id(&url) {
              Some(video_id) => {
                media.push(MediaItem {
                  kind: MediaType::Youtube,
                  url,
                  video_id: Some(video_id),
                  thumbnail: None,
                });
                form.set_text(ROW_YOUTUBE, "");
                ViewAction::Notify(Notice::info("video added to gallery"))
              }
              None => ViewAction::Notify(Notice::error("not a recognizable YouTube URL")),
            }
          }
        }
        KeyResult::Event(FormEvent::RowSubmitted(ROW_GALLERY)) => {
          let value = form.text_value(ROW_GALLERY).trim().to_string();
          if value.is_empty() {
            ViewAction::None
          } else if value.starts_with("http://") || value.starts_with("https://") {
            media.push(MediaItem {
              kind: MediaType::Image,
              url: value,
              video_id: None,
              thumbnail: None,
            });
            form.set_text(ROW_GALLERY, "");
            ViewAction::Notify(Notice::info("image added to gallery"))
          } else {
            return self.start_upload(UploadTarget::Gallery, value);
          }
        }
        KeyResult::Event(FormEvent::RowSubmitted(ROW_IMAGE)) => {
          let value = form.text_value(ROW_IMAGE).trim().to_string();
          if value.is_empty() || value.starts_with("http://") || value.starts_with("https://") {
            ViewAction::None
          } else {
            return self.start_upload(UploadTarget::Row(ROW_IMAGE), value);
          }
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
          form: Self::form_for(&Project::default()),
          media: Vec::new(),
        };
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(project) = self.selected_project() {
          self.mode = Mode::Editing {
            id: project.id.clone(),
            form: Self::form_for(project),
            media: project.media.clone(),
          };
        }
      }
      KeyCode::Char('d') => {
        if let Some(project) = self.selected_project() {
          let id = project.id.clone();
          let msg = format!("Delete \"{}\"?", truncate(&project.title, 40));
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
      Mode::Editing { form, media, .. } => Self::render_editor(frame, area, form, media),
    }
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Projects".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    if let Some(result) = self.uploading.as_mut().and_then(|(_, m)| m.poll()) {
      let target = self
        .uploading
        .take()
        .map(|(target, _)| target)
        .unwrap_or(UploadTarget::Row(ROW_IMAGE));
      match result {
        Ok(url) => {
          if let Mode::Editing { form, media, .. } = &mut self.mode {
            match target {
              UploadTarget::Row(row) => form.set_text(row, url),
              UploadTarget::Gallery => {
                media.push(MediaItem {
                  kind: MediaType::Image,
                  url,
                  video_id: None,
                  thumbnail: None,
                });
                form.set_text(ROW_GALLERY, "");
              }
            }
          }
          return ViewAction::Notify(Notice::info("image uploaded"));
        }
        Err(e) => return ViewAction::Notify(Notice::error(format!("upload failed: {e}"))),
      }
    }

    if let Some(result) = self.saving.as_mut().and_then(|m| m.poll()) {
      self.saving = None;
      match result {
        Ok(_) => {
          self.mode = Mode::Browsing;
          return ViewAction::Notify(Notice::info("project saved"));
        }
        Err(e) => return ViewAction::Notify(Notice::error(format!("save failed: {e}"))),
      }
    }

    if let Some(result) = self.deleting.as_mut().and_then(|m| m.poll()) {
      self.deleting = None;
      match result {
        Ok(()) => return ViewAction::Notify(Notice::info("project deleted")),
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
      Mode::Editing { .. } => " Tab:next field  Enter:add media/upload  Ctrl-S:save  Esc:cancel",
    }
  }
}
