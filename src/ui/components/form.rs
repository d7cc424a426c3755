use super::input::{InputResult, TextInput};
use super::list_editor::{ListEditor, ListEvent};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Events emitted by a form that parent views need to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Ctrl-S pressed: the view should validate and submit
  Save,
  /// Esc pressed: discard the form
  Cancelled,
  /// Enter pressed on the focused text row; views hook rows that transform
  /// their input (image paths, video URLs) here
  RowSubmitted(usize),
  /// A list row refused an add; the reason is user-facing
  Rejected(String),
}

enum RowKind {
  Text(TextInput),
  Select {
    options: Vec<&'static str>,
    selected: usize,
  },
  List(ListEditor),
}

struct Row {
  label: &'static str,
  kind: RowKind,
}

/// A vertical stack of labelled rows: free text, fixed-choice selects, and
/// string-list editors. One row is focused at a time; Up/Down and Tab move
/// focus, Ctrl-S submits the whole form.
pub struct Form {
  title: String,
  rows: Vec<Row>,
  focused: usize,
}

impl Form {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      rows: Vec::new(),
      focused: 0,
    }
  }

  pub fn text(mut self, label: &'static str, initial: &str) -> Self {
    self.rows.push(Row {
      label,
      kind: RowKind::Text(TextInput::with_value(initial)),
    });
    self
  }

  pub fn select(mut self, label: &'static str, options: &[&'static str], selected: usize) -> Self {
    self.rows.push(Row {
      label,
      kind: RowKind::Select {
        options: options.to_vec(),
        selected: selected.min(options.len().saturating_sub(1)),
      },
    });
    self
  }

  pub fn list(mut self, label: &'static str, items: Vec<String>) -> Self {
    self.rows.push(Row {
      label,
      kind: RowKind::List(ListEditor::new(items)),
    });
    self
  }

  pub fn focused_row(&self) -> usize {
    self.focused
  }

  pub fn focus_next(&mut self) {
    if !self.rows.is_empty() {
      self.focused = (self.focused + 1) % self.rows.len();
    }
  }

  pub fn focus_prev(&mut self) {
    if !self.rows.is_empty() {
      self.focused = if self.focused == 0 {
        self.rows.len() - 1
      } else {
        self.focused - 1
      };
    }
  }

  /// Value of a text row; empty for other row kinds.
  pub fn text_value(&self, idx: usize) -> String {
    match self.rows.get(idx).map(|row| &row.kind) {
      Some(RowKind::Text(input)) => input.value().to_string(),
      _ => String::new(),
    }
  }

  /// Replace the value of a text row. Used after transforming input in
  /// place (uploaded image URL, extracted video id).
  pub fn set_text(&mut self, idx: usize, value: impl Into<String>) {
    if let Some(Row {
      kind: RowKind::Text(input),
      ..
    }) = self.rows.get_mut(idx)
    {
      input.set_value(value);
    }
  }

  /// Label of the chosen option in a select row.
  pub fn select_value(&self, idx: usize) -> &'static str {
    match self.rows.get(idx).map(|row| &row.kind) {
      Some(RowKind::Select { options, selected }) => options.get(*selected).copied().unwrap_or(""),
      _ => "",
    }
  }

  /// Items of a list row; empty for other row kinds.
  pub fn list_items(&self, idx: usize) -> Vec<String> {
    match self.rows.get(idx).map(|row| &row.kind) {
      Some(RowKind::List(editor)) => editor.items().to_vec(),
      _ => Vec::new(),
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return KeyResult::Event(FormEvent::Save);
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focus_next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus_prev();
        return KeyResult::Handled;
      }
      _ => {}
    }

    let focused = self.focused;
    let Some(row) = self.rows.get_mut(focused) else {
      return KeyResult::NotHandled;
    };
    match &mut row.kind {
      RowKind::Text(input) => match input.handle_key(key) {
        InputResult::Submitted(_) => KeyResult::Event(FormEvent::RowSubmitted(focused)),
        InputResult::Consumed => KeyResult::Handled,
        InputResult::Cancelled | InputResult::NotHandled => KeyResult::NotHandled,
      },
      RowKind::Select { options, selected } => match key.code {
        KeyCode::Left | KeyCode::Char('h') => {
          if !options.is_empty() {
            *selected = if *selected == 0 {
              options.len() - 1
            } else {
              *selected - 1
            };
          }
          KeyResult::Handled
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
          if !options.is_empty() {
            *selected = (*selected + 1) % options.len();
          }
          KeyResult::Handled
        }
        KeyCode::Enter => KeyResult::Event(FormEvent::RowSubmitted(focused)),
        _ => KeyResult::Handled,
      },
      RowKind::List(editor) => match editor.handle_key(key) {
        KeyResult::Event(ListEvent::Rejected(reason)) => {
          KeyResult::Event(FormEvent::Rejected(reason))
        }
        KeyResult::Handled => KeyResult::Handled,
        KeyResult::NotHandled => KeyResult::NotHandled,
      },
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    for (i, row) in self.rows.iter().enumerate() {
      let focused = i == self.focused;
      let marker = if focused { "> " } else { "  " };
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::White)
      };
      let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<14}", row.label), label_style),
      ];
      match &row.kind {
        RowKind::Text(input) => {
          spans.push(Span::raw(input.value().to_string()));
          if focused {
            spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
          }
        }
        RowKind::Select { options, selected } => {
          for (j, option) in options.iter().enumerate() {
            if j > 0 {
              spans.push(Span::raw(" "));
            }
            let style = if j == *selected {
              Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
              Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!(" {option} "), style));
          }
        }
        RowKind::List(editor) => {
          spans.extend(editor.line(focused).spans);
        }
      }
      lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
      " Ctrl-S save   Esc cancel   Tab next field",
      Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn sample_form() -> Form {
    Form::new("New Blog")
      .text("Title", "")
      .select("Status", &["draft", "published"], 0)
      .list("Tags", vec!["rust".to_string()])
  }

  #[test]
  fn test_typing_goes_to_focused_row() {
    let mut form = sample_form();
    form.handle_key(key(KeyCode::Char('H')));
    form.handle_key(key(KeyCode::Char('i')));
    assert_eq!(form.text_value(0), "Hi");
  }

  #[test]
  fn test_focus_wraps() {
    let mut form = sample_form();
    form.handle_key(key(KeyCode::Down));
    form.handle_key(key(KeyCode::Down));
    assert_eq!(form.focused_row(), 2);
    form.handle_key(key(KeyCode::Down));
    assert_eq!(form.focused_row(), 0);
    form.handle_key(key(KeyCode::Up));
    assert_eq!(form.focused_row(), 2);
  }

  #[test]
  fn test_select_cycles() {
    let mut form = sample_form();
    form.handle_key(key(KeyCode::Down));
    assert_eq!(form.select_value(1), "draft");
    form.handle_key(key(KeyCode::Right));
    assert_eq!(form.select_value(1), "published");
    form.handle_key(key(KeyCode::Right));
    assert_eq!(form.select_value(1), "draft");
  }

  #[test]
  fn test_save_and_cancel_events() {
    let mut form = sample_form();
    let save = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert_eq!(save, KeyResult::Event(FormEvent::Save));
    let cancel = form.handle_key(key(KeyCode::Esc));
    assert_eq!(cancel, KeyResult::Event(FormEvent::Cancelled));
  }

  #[test]
  fn test_enter_on_text_row_is_surfaced() {
    let mut form = sample_form();
    form.handle_key(key(KeyCode::Char('x')));
    let result = form.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Event(FormEvent::RowSubmitted(0)));
  }

  #[test]
  fn test_list_row_accepts_and_rejects() {
    let mut form = sample_form();
    form.handle_key(key(KeyCode::Down));
    form.handle_key(key(KeyCode::Down));
    for c in "tokio".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    form.handle_key(key(KeyCode::Enter));
    assert_eq!(form.list_items(2), ["rust", "tokio"]);

    for c in "rust".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    let result = form.handle_key(key(KeyCode::Enter));
    assert!(matches!(result, KeyResult::Event(FormEvent::Rejected(_))));
  }

  #[test]
  fn test_set_text_replaces_value() {
    let mut form = sample_form();
    form.set_text(0, "https://cdn.example/a.png");
    assert_eq!(form.text_value(0), "https://cdn.example/a.png");
  }
}
