pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::widgets::ListState;

/// Clamp a list selection to the current item count, selecting the first
/// item once data arrives.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(selected) if selected >= len => state.select(Some(len - 1)),
    Some(_) => {}
    None => state.select(Some(0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_list_clears_selection() {
    let mut state = ListState::default();
    state.select(Some(3));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_selection_clamped_to_len() {
    let mut state = ListState::default();
    state.select(Some(9));
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(3));
  }

  #[test]
  fn test_first_item_selected_when_data_arrives() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 5);
    assert_eq!(state.selected(), Some(0));
  }
}
