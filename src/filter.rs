//! Turning the search box text into request parameters.

use serde_json::Value;
use tabledeck::Params;

/// Parse `key=value` pairs; any remaining words become a free-text search
/// under `search_key`.
///
/// `status=open acme corp` → `{ status: "open", keyword: "acme corp" }`
pub fn parse_search(text: &str, search_key: &str) -> Params {
  let mut params = Params::new();
  let mut free_text = Vec::new();

  for word in text.split_whitespace() {
    match word.split_once('=') {
      Some((key, value)) if !key.is_empty() => {
        params.insert(key.to_string(), Value::String(value.to_string()));
      }
      _ => free_text.push(word),
    }
  }

  if !free_text.is_empty() {
    params.insert(search_key.to_string(), Value::String(free_text.join(" ")));
  }
  params
}
