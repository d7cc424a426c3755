use crate::session::Session;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Severity of a transient status-bar message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  Info,
  Error,
}

/// A transient message shown in the status bar for a few seconds
#[derive(Debug, Clone)]
pub struct Notice {
  pub kind: NoticeKind,
  pub text: String,
}

impl Notice {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      kind: NoticeKind::Info,
      text: text.into(),
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      kind: NoticeKind::Error,
      text: text.into(),
    }
  }
}

/// Actions that a view can request in response to user input or a tick
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Login succeeded; install the session and leave the login gate
  LoggedIn(Session),
  /// Drop the session and return to the login gate
  Logout,
  /// Show a transient message in the status bar
  Notify(Notice),
}

/// Trait for view behavior
///
/// Views handle their own input modes (browsing, form editing, confirming)
/// and return actions for the App to execute. This creates a clean delegation
/// chain: App → View → Components
///
/// Views that load data asynchronously use Query<T> internally and poll it in
/// the tick() method; tick may itself produce an action, which is how mutation
/// results and auth expiry surface.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to let views poll queries and in-flight mutations
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// True while the view is capturing free text (a form or dialog is open),
  /// so global bindings like `:` must not steal keystrokes
  fn capturing_input(&self) -> bool {
    false
  }

  /// Key hint line for the status bar, matching the view's current mode
  fn key_hints(&self) -> &'static str {
    " :command  j/k:nav  q:back  Ctrl-C:quit"
  }
}
