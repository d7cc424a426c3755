//! Small parsing helpers shared by the form views.

use url::Url;

/// Extract the 11-character video id from the standard YouTube URL shapes:
/// `watch?v=`, `youtu.be/` and `embed/`. Returns `None` for anything else.
pub fn youtube_video_id(input: &str) -> Option<String> {
  let url = Url::parse(input).ok()?;
  let host = url.host_str()?.trim_start_matches("www.");

  let candidate = match host {
    "youtu.be" => url.path_segments()?.next().map(str::to_string),
    "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" => {
      let mut segments = url.path_segments()?;
      match segments.next() {
        Some("watch") => url
          .query_pairs()
          .find(|(name, _)| name == "v")
          .map(|(_, value)| value.into_owned()),
        Some("embed") | Some("v") | Some("e") => segments.next().map(str::to_string),
        _ => None,
      }
    }
    _ => None,
  }?;

  if is_video_id(&candidate) {
    Some(candidate)
  } else {
    None
  }
}

fn is_video_id(s: &str) -> bool {
  s.len() == 11
    && s
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a comma-separated field into a list: split on commas, trim each
/// piece, drop the empty ones. The raw text stays in the input buffer so a
/// trailing comma mid-edit is never destroyed by this round trip.
pub fn comma_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|piece| !piece.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_youtube_short_url() {
    assert_eq!(
      youtube_video_id("https://youtu.be/dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn test_youtube_watch_url() {
    assert_eq!(
      youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn test_youtube_embed_url() {
    assert_eq!(
      youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
      Some("dQw4w9WgXcQ".to_string())
    );
  }

  #[test]
  fn test_youtube_rejects_other_urls() {
    assert_eq!(youtube_video_id("https://example.com/video"), None);
    assert_eq!(youtube_video_id("https://www.youtube.com/watch"), None);
    assert_eq!(youtube_video_id("not a url"), None);
  }

  #[test]
  fn test_youtube_rejects_short_ids() {
    assert_eq!(youtube_video_id("https://youtu.be/short"), None);
  }

  #[test]
  fn test_comma_list_trims_and_drops_blanks() {
    assert_eq!(
      comma_list("Proj A, Proj B,  , Proj C"),
      vec!["Proj A", "Proj B", "Proj C"]
    );
  }

  #[test]
  fn test_comma_list_empty_input() {
    assert!(comma_list("").is_empty());
    assert!(comma_list("  ,  , ").is_empty());
  }

  #[test]
  fn test_comma_list_trailing_comma() {
    assert_eq!(comma_list("Rust, "), vec!["Rust"]);
  }
}
