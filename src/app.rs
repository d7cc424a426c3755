use crate::api::{ApiClient, Uploader};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::QueryClient;
use crate::session::{Session, SessionStore};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{Notice, View, ViewAction};
use crate::ui::views::{
  AboutView, BlogsView, EducationView, ExperienceView, LoginView, ProjectsView, ViewContext,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::info;

const TICK_RATE: Duration = Duration::from_millis(100);
const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Top-level application: owns the view stack, the session, and the
/// process-wide query cache.
pub struct App {
  config: Config,
  ctx: ViewContext,
  session_store: SessionStore,
  session: Option<Session>,
  views: Vec<Box<dyn View>>,
  command: CommandInput,
  notice: Option<(Notice, Instant)>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config.api.base_url);
    let uploader = config.upload.as_ref().map(Uploader::new);
    let ctx = ViewContext {
      api: api.clone(),
      queries: QueryClient::new(),
      uploader,
    };

    let session_store = SessionStore::open()?;
    let session = session_store.load()?;

    let views: Vec<Box<dyn View>> = match &session {
      Some(session) => {
        api.set_token(&session.token);
        info!(user = session.display_name(), "restored session");
        vec![Box::new(BlogsView::new(ctx.clone()))]
      }
      None => vec![Box::new(LoginView::new(api.clone(), ctx.queries.clone()))],
    };

    Ok(Self {
      config,
      ctx,
      session_store,
      session,
      views,
      command: CommandInput::new(),
      notice: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventHandler::new(TICK_RATE);

    loop {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.on_key(key),
        Some(Event::Tick) => self.on_tick(),
        Some(Event::Resize) => {}
        None => break,
      }

      if self.should_quit {
        break;
      }
    }

    Ok(())
  }

  fn on_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The command palette is only reachable once signed in, and never
    // steals keys from an open form or dialog
    let capturing = self
      .views
      .last()
      .map(|view| view.capturing_input())
      .unwrap_or(false);
    if self.session.is_some() && (self.command.is_active() || !capturing) {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.views.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  fn on_tick(&mut self) {
    if let Some(session) = &self.session {
      if session.is_expired() {
        self.logout();
        self.set_notice(Notice::error("session expired, sign in again"));
        return;
      }
    }

    if let Some((_, shown_at)) = &self.notice {
      if shown_at.elapsed() > NOTICE_TTL {
        self.notice = None;
      }
    }

    let action = match self.views.last_mut() {
      Some(view) => view.tick(),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.views.push(view),
      ViewAction::Pop => {
        if self.views.len() > 1 {
          self.views.pop();
        } else if self.session.is_some() {
          // q on the root view exits, like any pager would
          self.should_quit = true;
        }
      }
      ViewAction::LoggedIn(session) => {
        self.ctx.api.set_token(&session.token);
        if let Err(e) = self.session_store.save(&session.token) {
          self.set_notice(Notice::error(format!("could not persist session: {e}")));
        }
        info!(user = session.display_name(), "signed in");
        self.session = Some(session);
        self.views = vec![Box::new(BlogsView::new(self.ctx.clone()))];
      }
      ViewAction::Logout => {
        self.logout();
        self.set_notice(Notice::info("signed out"));
      }
      ViewAction::Notify(notice) => self.set_notice(notice),
    }
  }

  fn logout(&mut self) {
    self.ctx.api.clear_token();
    if let Err(e) = self.session_store.clear() {
      tracing::warn!("failed to clear session store: {e}");
    }
    self.session = None;
    self.views = vec![Box::new(LoginView::new(
      self.ctx.api.clone(),
      self.ctx.queries.clone(),
    ))];
  }

  fn set_notice(&mut self, notice: Notice) {
    self.notice = Some((notice, Instant::now()));
  }

  fn execute_command(&mut self, cmd: &str) {
    let view: Box<dyn View> = match cmd {
      "blogs" => Box::new(BlogsView::new(self.ctx.clone())),
      "projects" => Box::new(ProjectsView::new(self.ctx.clone())),
      "experience" => Box::new(ExperienceView::new(self.ctx.clone())),
      "education" => Box::new(EducationView::new(self.ctx.clone())),
      "about" => Box::new(AboutView::new(self.ctx.clone())),
      "logout" => {
        self.apply_action(ViewAction::Logout);
        return;
      }
      "quit" => {
        self.should_quit = true;
        return;
      }
      "" => return,
      other => {
        self.set_notice(Notice::error(format!("unknown command: {other}")));
        return;
      }
    };
    // Root navigation replaces the stack rather than nesting views
    self.views = vec![view];
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Key hints
        Constraint::Length(1), // Breadcrumb + notices
      ])
      .split(frame.area());

    let title = self.config.display_title();
    let user = self.session.as_ref().map(|s| s.display_name().to_string());
    draw_header(frame, chunks[0], &title, user.as_deref());

    if let Some(view) = self.views.last_mut() {
      view.render(frame, chunks[1]);
    }
    self.command.render_overlay(frame, chunks[1]);

    let hints = match self.views.last() {
      Some(view) => view.key_hints(),
      None => "",
    };
    let hint_bar =
      Paragraph::new(hints).style(Style::default().fg(Color::DarkGray).bg(Color::Black));
    frame.render_widget(hint_bar, chunks[2]);

    let breadcrumb: Vec<String> = self.views.iter().map(|v| v.breadcrumb_label()).collect();
    let notice = self.notice.as_ref().map(|(notice, _)| notice);
    draw_footer(frame, chunks[3], &breadcrumb, notice);
  }
}
