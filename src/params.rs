//! Request parameters and pagination key names.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Parameters sent to the fetch function: field name to scalar/array value.
pub type Params = Map<String, Value>;

/// Names of the page-index and page-size fields in outgoing requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationKeys {
  pub current: String,
  pub size: String,
}

impl Default for PaginationKeys {
  fn default() -> Self {
    Self {
      current: "current".to_string(),
      size: "size".to_string(),
    }
  }
}

impl PaginationKeys {
  pub fn new(current: impl Into<String>, size: impl Into<String>) -> Self {
    Self {
      current: current.into(),
      size: size.into(),
    }
  }

  /// Whether `key` is a pagination field rather than a search condition.
  pub fn is_pagination_field(&self, key: &str) -> bool {
    key == self.current || key == self.size || key == "total"
  }
}

/// Drop every key listed in `excluded` from `params`.
pub fn strip_excluded(params: &mut Params, excluded: &[String]) {
  for key in excluded {
    params.remove(key);
  }
}

/// Read a positive page number from a parameter value.
///
/// Accepts numbers and numeric strings, since search forms often hand back text.
pub fn page_value(value: Option<&Value>) -> Option<u64> {
  let page = match value? {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64)),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  };
  page.filter(|v| *v > 0)
}

/// Render a value the way it appears in tags and query strings.
pub fn display_value(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Array(items) => items
      .iter()
      .map(display_value)
      .collect::<Vec<_>>()
      .join(","),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_default_keys() {
    let keys = PaginationKeys::default();
    assert!(keys.is_pagination_field("current"));
    assert!(keys.is_pagination_field("size"));
    assert!(keys.is_pagination_field("total"));
    assert!(!keys.is_pagination_field("name"));
  }

  #[test]
  fn test_custom_keys_deserialize() {
    let keys: PaginationKeys = serde_json::from_value(json!({ "current": "page" })).unwrap();
    assert_eq!(keys.current, "page");
    assert_eq!(keys.size, "size");
  }

  #[test]
  fn test_strip_excluded() {
    let mut params = json!({ "a": 1, "b": 2, "c": 3 }).as_object().cloned().unwrap();
    strip_excluded(&mut params, &["b".to_string(), "missing".to_string()]);
    assert_eq!(Value::Object(params), json!({ "a": 1, "c": 3 }));
  }

  #[test]
  fn test_page_value() {
    assert_eq!(page_value(Some(&json!(3))), Some(3));
    assert_eq!(page_value(Some(&json!("4"))), Some(4));
    assert_eq!(page_value(Some(&json!(0))), None);
    assert_eq!(page_value(Some(&json!(null))), None);
    assert_eq!(page_value(None), None);
  }

  #[test]
  fn test_display_value() {
    assert_eq!(display_value(&json!("x")), "x");
    assert_eq!(display_value(&json!(12)), "12");
    assert_eq!(display_value(&json!(true)), "true");
    assert_eq!(display_value(&json!([1, "a"])), "1,a");
  }
}
