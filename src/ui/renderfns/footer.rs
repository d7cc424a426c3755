use crate::ui::view::{Notice, NoticeKind};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: breadcrumb on the left, transient notice on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], notice: Option<&Notice>) {
  let mut spans = Vec::new();

  spans.push(Span::raw(" "));

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  if let Some(notice) = notice {
    let style = match notice.kind {
      NoticeKind::Info => Style::default().fg(Color::Green),
      NoticeKind::Error => Style::default().fg(Color::Red).bold(),
    };
    spans.push(Span::raw("  "));
    spans.push(Span::styled(notice.text.clone(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
