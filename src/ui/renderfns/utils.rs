use serde_json::Value;
use tabledeck::params::display_value;

/// Truncate a string to at most `max_len` chars, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Single-line text for a table cell
pub fn cell_text(value: Option<&Value>, max_len: usize) -> String {
  let text = match value {
    Some(Value::Object(_)) => "{…}".to_string(),
    Some(value) => display_value(value),
    None => String::new(),
  };
  truncate(&text.replace(|c: char| c.is_control(), " "), max_len)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

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
    assert_eq!(truncate("ééééé", 4), "é...");
  }

  #[test]
  fn test_cell_text() {
    assert_eq!(cell_text(Some(&json!("a\nb")), 20), "a b");
    assert_eq!(cell_text(Some(&json!(42)), 20), "42");
    assert_eq!(cell_text(Some(&json!(["x", "y"])), 20), "x,y");
    assert_eq!(cell_text(Some(&json!({ "k": 1 })), 20), "{…}");
    assert_eq!(cell_text(Some(&json!(null)), 20), "");
    assert_eq!(cell_text(None, 20), "");
  }
}
