use crate::api::types::BlogStatus;
use ratatui::prelude::Color;

/// Truncate a string to a maximum char length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let keep: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", keep)
  }
}

/// Display color for a blog post status
pub fn status_color(status: BlogStatus) -> Color {
  match status {
    BlogStatus::Published => Color::Green,
    BlogStatus::Draft => Color::Yellow,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("héllö wörld", 8), "héllö...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color(BlogStatus::Published), Color::Green);
    assert_eq!(status_color(BlogStatus::Draft), Color::Yellow);
  }
}
