use crate::api::ApiClient;
use crate::query::{Mutation, QueryClient};
use crate::session::Session;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{Notice, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// The login gate. Every other view sits behind it; it is replaced by the
/// dashboard once the backend hands us a token.
pub struct LoginView {
  api: ApiClient,
  queries: QueryClient,
  user: TextInput,
  password: TextInput,
  focused: usize,
  submitting: Option<Mutation<String>>,
  error: Option<String>,
}

impl LoginView {
  pub fn new(api: ApiClient, queries: QueryClient) -> Self {
    Self {
      api,
      queries,
      user: TextInput::new(),
      password: TextInput::new(),
      focused: 0,
      submitting: None,
      error: None,
    }
  }

  fn submit(&mut self) -> ViewAction {
    if self.submitting.is_some() {
      return ViewAction::None;
    }
    let user = self.user.value().trim().to_string();
    let password = self.password.value().to_string();
    if user.is_empty() || password.is_empty() {
      return ViewAction::Notify(Notice::error("username and password are required"));
    }
    self.error = None;
    let api = self.api.clone();
    self.submitting = Some(self.queries.mutation(&[], async move {
      api.login(&user, &password).await.map_err(|e| e.to_string())
    }));
    ViewAction::None
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.submitting.is_some() {
      // Ignore input while the login request is in flight
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
        self.focused = 1 - self.focused;
        return ViewAction::None;
      }
      KeyCode::Enter => {
        if self.focused == 0 {
          self.focused = 1;
          return ViewAction::None;
        }
        return self.submit();
      }
      _ => {}
    }

    let field = if self.focused == 0 {
      &mut self.user
    } else {
      &mut self.password
    };
    match field.handle_key(key) {
      InputResult::Consumed => {
        self.error = None;
        ViewAction::None
      }
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let width = 46.min(area.width.saturating_sub(2));
    let height = 8.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let box_area = Rect::new(x, y, width, height);

    let block = Block::default()
      .title(" Sign in ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let field_line = |label: &str, value: String, focused: bool| {
      let marker = if focused { "> " } else { "  " };
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::White)
      };
      let mut spans = vec![
        Span::styled(marker.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<10}", label), label_style),
        Span::raw(value),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      Line::from(spans)
    };

    let masked = "*".repeat(self.password.value().chars().count());
    let mut lines = vec![
      Line::raw(""),
      field_line("Username", self.user.value().to_string(), self.focused == 0),
      field_line("Password", masked, self.focused == 1),
      Line::raw(""),
    ];

    if self.submitting.is_some() {
      lines.push(Line::from(Span::styled(
        " signing in...",
        Style::default().fg(Color::Yellow),
      )));
    } else if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        format!(" {error}"),
        Style::default().fg(Color::Red),
      )));
    } else {
      lines.push(Line::from(Span::styled(
        " Enter to sign in",
        Style::default().fg(Color::DarkGray),
      )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Sign in".to_string()
  }

  fn tick(&mut self) -> ViewAction {
    if let Some(result) = self.submitting.as_mut().and_then(|m| m.poll()) {
      self.submitting = None;
      match result {
        Ok(token) => match Session::from_token(token) {
          Ok(session) => return ViewAction::LoggedIn(session),
          Err(e) => self.error = Some(e.to_string()),
        },
        Err(e) => self.error = Some(e),
      }
    }
    ViewAction::None
  }

  fn key_hints(&self) -> &'static str {
    " Tab:switch field  Enter:sign in  Ctrl-C:quit"
  }
}
