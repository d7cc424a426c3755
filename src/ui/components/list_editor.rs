use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;

/// Events emitted by the list editor that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
  /// An add was refused (blank or duplicate); the reason is user-facing
  Rejected(String),
}

/// Inline editor for a list of strings (tags, technologies, achievements,
/// skill keywords). Typing feeds a staging input; Enter appends it, Ctrl-D
/// removes the selected item. Blank and duplicate entries are refused.
#[derive(Debug, Clone, Default)]
pub struct ListEditor {
  items: Vec<String>,
  input: TextInput,
  selected: usize,
}

impl ListEditor {
  pub fn new(items: Vec<String>) -> Self {
    Self {
      items,
      input: TextInput::new(),
      selected: 0,
    }
  }

  pub fn items(&self) -> &[String] {
    &self.items
  }

  pub fn into_items(self) -> Vec<String> {
    self.items
  }

  /// Append `value` if it is non-blank and not already present.
  pub fn add(&mut self, value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
      return Err("empty item ignored".to_string());
    }
    if self.items.iter().any(|item| item == value) {
      return Err(format!("\"{value}\" is already in the list"));
    }
    self.items.push(value.to_string());
    Ok(())
  }

  /// Remove the first item equal to `value`.
  pub fn remove(&mut self, value: &str) {
    if let Some(pos) = self.items.iter().position(|item| item == value) {
      self.items.remove(pos);
      if self.selected >= self.items.len() && self.selected > 0 {
        self.selected -= 1;
      }
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ListEvent> {
    match key.code {
      KeyCode::Enter => {
        let staged = self.input.value().to_string();
        match self.add(&staged) {
          Ok(()) => {
            self.input.clear();
            KeyResult::Handled
          }
          Err(reason) => KeyResult::Event(ListEvent::Rejected(reason)),
        }
      }
      KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        if let Some(item) = self.items.get(self.selected).cloned() {
          self.remove(&item);
        }
        KeyResult::Handled
      }
      KeyCode::Left if self.input.is_empty() => {
        if self.selected > 0 {
          self.selected -= 1;
        }
        KeyResult::Handled
      }
      KeyCode::Right if self.input.is_empty() => {
        if self.selected + 1 < self.items.len() {
          self.selected += 1;
        }
        KeyResult::Handled
      }
      _ => match self.input.handle_key(key) {
        InputResult::Consumed => KeyResult::Handled,
        InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::NotHandled,
        InputResult::NotHandled => KeyResult::NotHandled,
      },
    }
  }

  /// Render as a single line: existing items as chips, then the staging input.
  pub fn line(&self, focused: bool) -> Line<'_> {
    let mut spans = Vec::new();
    for (i, item) in self.items.iter().enumerate() {
      if i > 0 {
        spans.push(Span::raw(" "));
      }
      let style = if focused && i == self.selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Cyan)
      };
      spans.push(Span::styled(format!("[{item}]"), style));
    }
    if focused || !self.input.is_empty() {
      if !self.items.is_empty() {
        spans.push(Span::raw(" "));
      }
      spans.push(Span::styled("+ ", Style::default().fg(Color::DarkGray)));
      spans.push(Span::raw(self.input.value().to_string()));
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
    }
    if spans.is_empty() {
      spans.push(Span::styled("(none)", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(editor: &mut ListEditor, s: &str) {
    for c in s.chars() {
      editor.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_add_via_enter() {
    let mut editor = ListEditor::default();
    type_str(&mut editor, "rust");
    assert_eq!(editor.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(editor.items(), ["rust"]);
  }

  #[test]
  fn test_blank_add_rejected() {
    let mut editor = ListEditor::default();
    type_str(&mut editor, "   ");
    let result = editor.handle_key(key(KeyCode::Enter));
    assert_eq!(
      result,
      KeyResult::Event(ListEvent::Rejected("empty item ignored".to_string()))
    );
    assert!(editor.items().is_empty());
  }

  #[test]
  fn test_duplicate_add_rejected() {
    let mut editor = ListEditor::new(vec!["rust".to_string()]);
    type_str(&mut editor, "rust");
    let result = editor.handle_key(key(KeyCode::Enter));
    assert!(matches!(result, KeyResult::Event(ListEvent::Rejected(_))));
    assert_eq!(editor.items(), ["rust"]);
  }

  #[test]
  fn test_whitespace_trimmed_before_checks() {
    let mut editor = ListEditor::new(vec!["rust".to_string()]);
    assert!(editor.add("  rust  ").is_err());
    assert!(editor.add("  tokio  ").is_ok());
    assert_eq!(editor.items(), ["rust", "tokio"]);
  }

  #[test]
  fn test_remove_exact_match() {
    let mut editor =
      ListEditor::new(vec!["rust".to_string(), "go".to_string(), "zig".to_string()]);
    editor.remove("go");
    assert_eq!(editor.items(), ["rust", "zig"]);
    // No-op for a value that is not present
    editor.remove("go");
    assert_eq!(editor.items(), ["rust", "zig"]);
  }

  #[test]
  fn test_ctrl_d_removes_selected() {
    let mut editor = ListEditor::new(vec!["a".to_string(), "b".to_string()]);
    editor.handle_key(key(KeyCode::Right));
    editor.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
    assert_eq!(editor.items(), ["a"]);
  }
}
