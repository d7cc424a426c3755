use crate::api::types::{BlogPage, BlogPost, BlogStatus, CoverImage};
use crate::query::{Mutation, Query, QueryKey, QueryStatus, Tag};
use crate::ui::components::{ConfirmDialog, ConfirmEvent, Form, FormEvent, KeyResult};
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::ViewContext;
use crate::ui::ensure_valid_selection;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

const ROW_TITLE: usize = 0;
const ROW_SLUG: usize = 1;
const ROW_EXCERPT: usize = 2;
const ROW_CONTENT: usize = 3;
const ROW_CATEGORY: usize = 4;
const ROW_TAGS: usize = 5;
const ROW_STATUS: usize = 6;
const ROW_COVER: usize = 7;

enum Mode {
  Browsing,
  /// `id` is empty for a new post
  Editing { id: String, form: Form },
}

/// Paginated blog post management: browse, create, edit, delete.
pub struct BlogsView {
  ctx: ViewContext,
  page: u32,
  query: Query<BlogPage>,
  list_state: ListState,
  mode: Mode,
  confirm: ConfirmDialog,
  pending_delete: Option<String>,
  saving: Option<Mutation<BlogPost>>,
  deleting: Option<Mutation<()>>,
  uploading: Option<(usize, Mutation<String>)>,
}

fn blog_query(ctx: &ViewContext, page: u32) -> Query<BlogPage> {
  let api = ctx.api.clone();
  let mut query = Query::new(
    ctx.queries.clone(),
    QueryKey::new("blogs", &page),
    &[Tag::Blogs],
    move || {
      let api = api.clone();
      async move { api.blogs(page).await.map_err(|e| e.to_string()) }
    },
  );
  query.fetch();
  query
}

impl BlogsView {
  pub fn new(ctx: ViewContext) -> Self {
    let query = blog_query(&ctx, 1);
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

  fn blogs(&self) -> &[BlogPost] {
    self.query.data().map(|page| page.blogs.as_slice()).unwrap_or(&[])
  }

  fn total_pages(&self) -> u32 {
    self.query.data().map(|page| page.total_pages).unwrap_or(1)
  }

  fn set_page(&mut self, page: u32) {
    self.page = page;
    self.query = blog_query(&self.ctx, page);
    self.list_state.select(None);
  }

  fn selected_blog(&self) -> Option<&BlogPost> {
    self.list_state.selected().and_then(|idx| self.blogs().get(idx))
  }

  fn form_for(blog: &BlogPost) -> Form {
    let status = BlogStatus::ALL
      .iter()
      .position(|s| *s == blog.status)
      .unwrap_or(0);
    let cover = blog
      .cover_image
      .as_ref()
      .map(|c| c.url.clone())
      .unwrap_or_default();
    Form::new(if blog.id.is_empty() {
      "New blog post"
    } else {
      "Edit blog post"
    })
    .text("Title", &blog.title)
    .text("Slug", &blog.slug)
    .text("Excerpt", &blog.excerpt)
    .text("Content", &blog.content)
    .text("Category", &blog.category)
    .list("Tags", blog.tags.clone())
    .select("Status", &["draft", "published"], status)
    .text("Cover image", &cover)
  }

  fn build_blog(id: &str, form: &Form) -> Result<BlogPost, String> {
    let title = form.text_value(ROW_TITLE).trim().to_string();
    if title.is_empty() {
      return Err("title is required".to_string());
    }
    let cover = form.text_value(ROW_COVER).trim().to_string();
    Ok(BlogPost {
      id: id.to_string(),
      title,
      slug: form.text_value(ROW_SLUG).trim().to_string(),
      excerpt: form.text_value(ROW_EXCERPT),
      content: form.text_value(ROW_CONTENT),
      category: form.text_value(ROW_CATEGORY).trim().to_string(),
      tags: form.list_items(ROW_TAGS),
      status: BlogStatus::from_label(form.select_value(ROW_STATUS)).unwrap_or_default(),
      cover_image: if cover.is_empty() {
        None
      } else {
        Some(CoverImage { url: cover })
      },
    })
  }

  /// Enter on the cover row: upload a local file, or keep a remote URL as-is.
  fn submit_image_row(&mut self, row: usize, value: String) -> ViewAction {
    let value = value.trim().to_string();
    if value.is_empty() {
      return ViewAction::None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
      return ViewAction::Notify(Notice::info("keeping remote image URL"));
    }
    let Some(uploader) = self.ctx.uploader.clone() else {
      return ViewAction::Notify(Notice::error(
        "no upload endpoint configured; paste an image URL instead",
      ));
    };
    let path = std::path::PathBuf::from(value);
    self.uploading = Some((
      row,
      self.ctx.queries.mutation(&[], async move {
        uploader.upload(&path).await.map_err(|e| e.to_string())
      }),
    ));
    ViewAction::Notify(Notice::info("uploading image..."))
  }

  fn start_delete(&mut self, id: String) {
    let api = self.ctx.api.clone();
    self.deleting = Some(self.ctx.queries.mutation(&[Tag::Blogs], async move {
      api.delete_blog(&id).await.map_err(|e| e.to_string())
    }));
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.blogs().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.status() {
      QueryStatus::Loading => " Blogs (loading...) ".to_string(),
      QueryStatus::Error => format!(
        " Blogs (error: {}) ",
        self.query.error().unwrap_or("unknown")
      ),
      QueryStatus::Success => format!(" Blogs - page {}/{} ", self.page, self.total_pages()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.error().is_some() {
        "Failed to load posts. Press 'r' to retry."
      } else {
        "No posts yet. Press 'n' to write one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .blogs()
      .iter()
      .map(|blog| {
        let line = Line::from(vec![
          Span::styled(
            format!("{:<10}", blog.status.label()),
            Style::default().fg(status_color(blog.status)),
          ),
          Span::raw(" "),
          Span::raw(format!("{:<50}", truncate(&blog.title, 50))),
          Span::styled(
            truncate(&blog.category, 20),
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

impl View for BlogsView {
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
        KeyResult::Event(FormEvent::Save) => match Self::build_blog(id, form) {
          Ok(blog) => {
            let api = self.ctx.api.clone();
            self.saving = Some(self.ctx.queries.mutation(&[Tag::Blogs], async move {
              let result = if blog.id.is_empty() {
                api.create_blog(&blog).await
              } else {
                api.update_blog(&blog).await
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
        KeyResult::Event(FormEvent::RowSubmitted(ROW_COVER)) => {
          let value = form.text_value(ROW_COVER);
          return self.submit_image_row(ROW_COVER, value);
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
          form: Self::form_for(&BlogPost::default()),
        };
      }
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(blog) = self.selected_blog() {
          self.mode = Mode::Editing {
            id: blog.id.clone(),
            form: Self::form_for(blog),
          };
        }
      }
      KeyCode::Char('d') => {
        if let Some(blog) = self.selected_blog() {
          let id = blog.id.clone();
          let msg = format!("Delete \"{}\"?", truncate(&blog.title, 40));
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
    "Blogs".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    self.query.poll();

    if let Some(result) = self.uploading.as_mut().and_then(|(_, m)| m.poll()) {
      let row = self.uploading.take().map(|(row, _)| row).unwrap_or(ROW_COVER);
      match result {
        Ok(url) => {
          if let Mode::Editing { form, .. } = &mut self.mode {
            form.set_text(row, url);
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
          return ViewAction::Notify(Notice::info("post saved"));
        }
        Err(e) => return ViewAction::Notify(Notice::error(format!("save failed: {e}"))),
      }
    }

    if let Some(result) = self.deleting.as_mut().and_then(|m| m.poll()) {
      self.deleting = None;
      match result {
        Ok(()) => return ViewAction::Notify(Notice::info("post deleted")),
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
