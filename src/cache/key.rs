//! Cache keys and tags derived from request parameters.

use sha2::{Digest, Sha256};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

use crate::params::{display_value, PaginationKeys, Params};

/// Tag carried by every paged entry; clearing it clears all pages.
pub const PAGINATION_TAG: &str = "pagination";

const DEFAULT_PAGE_SIZE: u64 = 10;

/// Canonical cache key: the request parameters serialized with object keys
/// sorted at every depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Short SHA256 digest for log lines, where the full key would be noise.
  pub fn digest(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    hex::encode(&hasher.finalize()[..6])
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Fingerprint a parameter map.
pub fn fingerprint(params: &Params) -> Fingerprint {
  Fingerprint(serialize(&Value::Object(sort_keys(params))))
}

/// Fingerprint any value. Non-objects are serialized as they are.
pub fn fingerprint_value(value: &Value) -> Fingerprint {
  match value {
    Value::Object(map) => fingerprint(map),
    other => Fingerprint(serialize(other)),
  }
}

// Arrays are left in order; only object keys are canonicalized
fn sort_keys(map: &Map<String, Value>) -> Map<String, Value> {
  let mut keys: Vec<&String> = map.keys().collect();
  keys.sort();

  let mut sorted = Map::new();
  for key in keys {
    let value = match &map[key] {
      Value::Object(inner) => Value::Object(sort_keys(inner)),
      other => other.clone(),
    };
    sorted.insert(key.clone(), value);
  }
  sorted
}

fn serialize(value: &Value) -> String {
  serde_json::to_string(value).unwrap_or_default()
}

/// Tags for an entry: its search condition, its page size, and the generic
/// pagination tag.
pub fn generate_tags(params: &Params, keys: &PaginationKeys) -> BTreeSet<String> {
  let mut tags = BTreeSet::new();

  let conditions: Vec<String> = params
    .iter()
    .filter(|(key, value)| !keys.is_pagination_field(key) && is_set(value))
    .map(|(key, value)| format!("{}:{}", key, display_value(value)))
    .collect();

  if conditions.is_empty() {
    tags.insert("search:default".to_string());
  } else {
    tags.insert(format!("search:{}", conditions.join("|")));
  }

  let size = params
    .get(&keys.size)
    .and_then(|v| crate::params::page_value(Some(v)))
    .unwrap_or(DEFAULT_PAGE_SIZE);
  tags.insert(format!("{}:{}", PAGINATION_TAG, size));
  tags.insert(PAGINATION_TAG.to_string());

  tags
}

fn is_set(value: &Value) -> bool {
  !matches!(value, Value::Null) && value.as_str() != Some("")
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn test_fingerprint_ignores_key_order() {
    let mut a = Map::new();
    a.insert("a".into(), json!(1));
    a.insert("b".into(), json!(2));
    let mut b = Map::new();
    b.insert("b".into(), json!(2));
    b.insert("a".into(), json!(1));
    assert_eq!(fingerprint(&a), fingerprint(&b));
    assert_eq!(fingerprint(&a).as_str(), r#"{"a":1,"b":2}"#);
  }

  #[test]
  fn test_fingerprint_sorts_nested_objects() {
    let fp = fingerprint(&params(json!({ "z": { "y": 1, "x": [ { "b": 1, "a": 2 } ] }, "a": 0 })));
    assert!(fp.as_str().starts_with(r#"{"a":0,"z":{"x":"#));
  }

  #[test]
  fn test_fingerprint_distinguishes_values() {
    let a = fingerprint(&params(json!({ "name": "x", "current": 1 })));
    let b = fingerprint(&params(json!({ "name": "x", "current": 2 })));
    assert_ne!(a, b);
  }

  #[test]
  fn test_fingerprint_non_object() {
    assert_eq!(fingerprint_value(&json!(null)).as_str(), "null");
    assert_eq!(fingerprint_value(&json!([2, 1])).as_str(), "[2,1]");
  }

  #[test]
  fn test_digest_is_short_and_stable() {
    let fp = fingerprint(&params(json!({ "a": 1 })));
    assert_eq!(fp.digest().len(), 12);
    assert_eq!(fp.digest(), fp.clone().digest());
  }

  #[test]
  fn test_tags_with_search_fields() {
    let keys = PaginationKeys::default();
    let tags = generate_tags(
      &params(json!({ "name": "x", "status": 1, "empty": "", "gone": null, "current": 2, "size": 20 })),
      &keys,
    );
    assert!(tags.contains("search:name:x|status:1"));
    assert!(tags.contains("pagination:20"));
    assert!(tags.contains("pagination"));
    assert_eq!(tags.len(), 3);
  }

  #[test]
  fn test_tags_default_search() {
    let keys = PaginationKeys::default();
    let tags = generate_tags(&params(json!({ "current": 1 })), &keys);
    assert!(tags.contains("search:default"));
    assert!(tags.contains("pagination:10"));
  }

  #[test]
  fn test_tags_respect_custom_keys() {
    let keys = PaginationKeys::new("page", "pageSize");
    let tags = generate_tags(&params(json!({ "page": 3, "pageSize": 50, "q": "abc" })), &keys);
    assert!(tags.contains("search:q:abc"));
    assert!(tags.contains("pagination:50"));
  }
}
