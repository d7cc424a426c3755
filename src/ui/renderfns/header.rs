use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, site title, signed-in user, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, user: Option<&str>) {
  let mut spans = vec![
    Span::styled(" folio ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  match user {
    Some(name) => spans.push(Span::styled(
      format!(" {} ", name),
      Style::default().fg(Color::Yellow).bold(),
    )),
    None => spans.push(Span::styled(
      " signed out ",
      Style::default().fg(Color::DarkGray),
    )),
  }

  spans.extend([
    Span::raw("  "),
    // Shortcuts - keys highlighted, descriptions dimmed
    Span::styled("<:>", Style::default().fg(Color::Cyan)),
    Span::styled(" command", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" back", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
