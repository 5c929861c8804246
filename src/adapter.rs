//! Normalization of heterogeneous paged responses.
//!
//! Paged APIs disagree on where the rows and the total live: `records`,
//! `list`, `items`, a nested `data` object, or a bare array. The default
//! adapter probes the common shapes in a fixed order and always produces a
//! [`NormalizedResponse`]; an unrecognized shape is logged, never an error.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Canonical page shape every adapter must produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
  pub records: Vec<Value>,
  pub total: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
}

impl NormalizedResponse {
  /// An empty page with no pagination hints.
  pub fn empty() -> Self {
    Self::default()
  }

  /// The page handed back by a request that was superseded before it finished.
  pub fn cancelled() -> Self {
    Self {
      records: Vec::new(),
      total: 0,
      current: Some(1),
      size: Some(10),
    }
  }
}

// Top-level fields that may hold the record list, in priority order
const RECORD_FIELDS: &[&str] = &["records", "data", "list", "items", "result"];
// Record fields probed inside a nested `data` object
const NESTED_RECORD_FIELDS: &[&str] = &["list", "records", "items"];
const TOTAL_FIELDS: &[&str] = &["total", "count"];
const CURRENT_FIELDS: &[&str] = &["current", "page", "pageNum"];
const SIZE_FIELDS: &[&str] = &["size", "pageSize", "limit"];

/// Normalize any response value. Never fails.
pub fn default_response_adapter(response: &Value) -> NormalizedResponse {
  let obj = match response {
    Value::Null => return NormalizedResponse::empty(),
    Value::Array(items) => {
      return NormalizedResponse {
        records: items.clone(),
        total: items.len() as u64,
        ..Default::default()
      }
    }
    Value::Object(obj) => obj,
    other => {
      warn!(response = %other, "unrecognized response shape");
      return NormalizedResponse::empty();
    }
  };

  let mut records = extract_records(obj, RECORD_FIELDS);
  let mut total = extract_total(obj, &records, TOTAL_FIELDS);
  let mut pagination = extract_pagination(obj, None);

  if records.is_empty() {
    match obj.get("data") {
      Some(Value::Object(data)) => {
        records = extract_records(data, NESTED_RECORD_FIELDS);
        total = extract_total(data, &records, TOTAL_FIELDS);
        pagination = extract_pagination(obj, Some(data));
      }
      Some(Value::Array(data)) => {
        records = data.clone();
        total = records.len() as u64;
        pagination = extract_pagination(obj, None);
      }
      _ => {}
    }
  }

  if records.is_empty() {
    warn!(response = %response, "unrecognized response shape");
  }

  let (current, size) = pagination;
  NormalizedResponse {
    records,
    total,
    current,
    size,
  }
}

fn extract_records(obj: &Map<String, Value>, fields: &[&str]) -> Vec<Value> {
  fields
    .iter()
    .find_map(|field| obj.get(*field).and_then(Value::as_array))
    .cloned()
    .unwrap_or_default()
}

fn extract_total(obj: &Map<String, Value>, records: &[Value], fields: &[&str]) -> u64 {
  fields
    .iter()
    .find_map(|field| number_field(obj, field))
    .unwrap_or(records.len() as u64)
}

/// Current page and page size, looked up on the top-level object first and
/// then on the nested `data` object.
fn extract_pagination(
  obj: &Map<String, Value>,
  data: Option<&Map<String, Value>>,
) -> (Option<u64>, Option<u64>) {
  let sources: Vec<&Map<String, Value>> = std::iter::once(obj).chain(data).collect();
  let find = |fields: &[&str]| {
    sources
      .iter()
      .find_map(|src| fields.iter().find_map(|field| number_field(src, field)))
  };
  (find(CURRENT_FIELDS), find(SIZE_FIELDS))
}

/// A numeric field as a non-negative integer; any JSON number counts as a match.
fn number_field(obj: &Map<String, Value>, field: &str) -> Option<u64> {
  match obj.get(field)? {
    Value::Number(n) => Some(
      n.as_u64()
        .unwrap_or_else(|| n.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0)),
    ),
    _ => None,
  }
}

/// Re-serialize a value through JSON to convert between compatible types.
pub fn reserialize<T: DeserializeOwned>(value: impl Serialize) -> serde_json::Result<T> {
  serde_json::from_value(serde_json::to_value(value)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_null_is_empty() {
    assert_eq!(default_response_adapter(&Value::Null), NormalizedResponse::empty());
  }

  #[test]
  fn test_array_input() {
    let res = default_response_adapter(&json!([{ "id": 1 }, { "id": 2 }]));
    assert_eq!(res.records, vec![json!({ "id": 1 }), json!({ "id": 2 })]);
    assert_eq!(res.total, 2);
    assert_eq!(res.current, None);
    assert_eq!(res.size, None);
  }

  #[test]
  fn test_scalar_is_empty() {
    assert_eq!(default_response_adapter(&json!("oops")), NormalizedResponse::empty());
    assert_eq!(default_response_adapter(&json!(42)), NormalizedResponse::empty());
  }

  #[test]
  fn test_standard_shape() {
    let res = default_response_adapter(&json!({
      "records": [{ "id": 1 }],
      "total": 31,
      "current": 2,
      "size": 10
    }));
    assert_eq!(res.records.len(), 1);
    assert_eq!(res.total, 31);
    assert_eq!(res.current, Some(2));
    assert_eq!(res.size, Some(10));
  }

  #[test]
  fn test_record_field_priority() {
    let res = default_response_adapter(&json!({
      "list": [{ "id": "list" }],
      "records": [{ "id": "records" }]
    }));
    assert_eq!(res.records, vec![json!({ "id": "records" })]);
  }

  #[test]
  fn test_total_falls_back_to_record_count() {
    let res = default_response_adapter(&json!({ "items": [1, 2, 3], "total": "many" }));
    assert_eq!(res.total, 3);
  }

  #[test]
  fn test_count_field() {
    let res = default_response_adapter(&json!({ "result": [1], "count": 9 }));
    assert_eq!(res.total, 9);
  }

  #[test]
  fn test_alternate_page_fields() {
    let res = default_response_adapter(&json!({
      "list": [1],
      "pageNum": 4,
      "limit": 25
    }));
    assert_eq!(res.current, Some(4));
    assert_eq!(res.size, Some(25));
  }

  #[test]
  fn test_nested_data_object() {
    let res = default_response_adapter(&json!({
      "code": 200,
      "data": {
        "list": [{ "id": 1 }, { "id": 2 }],
        "total": 12,
        "pageSize": 2,
        "page": 3
      }
    }));
    assert_eq!(res.records.len(), 2);
    assert_eq!(res.total, 12);
    assert_eq!(res.current, Some(3));
    assert_eq!(res.size, Some(2));
  }

  #[test]
  fn test_top_level_pagination_wins_over_nested() {
    let res = default_response_adapter(&json!({
      "current": 1,
      "data": { "records": [1], "current": 5, "size": 20 }
    }));
    assert_eq!(res.current, Some(1));
    assert_eq!(res.size, Some(20));
  }

  #[test]
  fn test_data_array_used_directly() {
    let res = default_response_adapter(&json!({ "data": [{ "id": 7 }] }));
    assert_eq!(res.records, vec![json!({ "id": 7 })]);
    assert_eq!(res.total, 1);
  }

  #[test]
  fn test_unrecognized_object() {
    let res = default_response_adapter(&json!({ "message": "ok", "data": null }));
    assert_eq!(res, NormalizedResponse::empty());
  }

  #[test]
  fn test_reserialize() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Row {
      id: u32,
    }
    let rows: Vec<Row> = reserialize(vec![json!({ "id": 3 })]).unwrap();
    assert_eq!(rows, vec![Row { id: 3 }]);
  }
}
