use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by the confirm dialog that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Cancelled,
}

/// Yes/no overlay guarding destructive operations. Nothing is deleted
/// unless the user explicitly confirms.
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  message: String,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.active = true;
    self.message = message.into();
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.message.clear();
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the dialog overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (self.message.len() as u16 + 6).min(area.width.saturating_sub(4)).max(30);
    let height = 5.min(area.height.saturating_sub(2));

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let lines = vec![
      Line::from(Span::raw(self.message.clone())),
      Line::raw(""),
      Line::from(vec![
        Span::styled("y", Style::default().fg(Color::Red).bold()),
        Span::styled("es / ", Style::default().fg(Color::DarkGray)),
        Span::styled("n", Style::default().fg(Color::Cyan).bold()),
        Span::styled("o", Style::default().fg(Color::DarkGray)),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut dialog = ConfirmDialog::new();
    assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_confirm() {
    let mut dialog = ConfirmDialog::new();
    dialog.show("Delete \"Post\"?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
    assert!(!dialog.is_active());
  }

  #[test]
  fn test_cancel() {
    let mut dialog = ConfirmDialog::new();
    dialog.show("Delete \"Post\"?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
    assert!(!dialog.is_active());
  }

  #[test]
  fn test_swallows_other_keys_while_active() {
    let mut dialog = ConfirmDialog::new();
    dialog.show("Delete?");
    assert_eq!(dialog.handle_key(key(KeyCode::Char('j'))), KeyResult::Handled);
    assert!(dialog.is_active());
  }
}
