//! HTTP transport for the browser: request params become a query string,
//! failures become [`TableError`]s with transport-specific codes.

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tabledeck::error::{PARSE_ERROR, TIMEOUT};
use tabledeck::{Params, TableError};
use tracing::debug;
use url::Url;

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// GETs pages from one endpoint.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl HttpFetcher {
  pub fn new(url: &str, timeout: Duration, token: Option<String>) -> Result<Self> {
    let base = Url::parse(url).map_err(|e| eyre!("Invalid endpoint URL {}: {}", url, e))?;
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self {
      client,
      base,
      token,
    })
  }

  /// Fetch one page. Every failure is returned as a [`TableError`] inside
  /// the report, so its code survives normalization.
  pub async fn fetch(&self, params: Params) -> Result<Value> {
    let url = build_url(&self.base, &params);
    debug!(%url, "GET");

    let mut request = self.client.get(url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;

    if !status.is_success() {
      return Err(status_error(status, &body).into());
    }

    serde_json::from_slice(&body)
      .map_err(|e| TableError::new(PARSE_ERROR, format!("Failed to parse response: {}", e)).into())
  }
}

/// Append params to the endpoint's own query string. Scalars are sent as
/// is, arrays as repeated keys, nulls are skipped.
pub fn build_url(base: &Url, params: &Params) -> Url {
  let mut url = base.clone();
  {
    let mut query = url.query_pairs_mut();
    for (key, value) in params {
      match value {
        Value::Null => {}
        Value::Array(items) => {
          for item in items {
            query.append_pair(key, &scalar(item));
          }
        }
        other => {
          query.append_pair(key, &scalar(other));
        }
      }
    }
  }
  if url.query() == Some("") {
    url.set_query(None);
  }
  url
}

fn scalar(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn transport_error(e: reqwest::Error) -> TableError {
  if e.is_timeout() {
    TableError::new(TIMEOUT, format!("Request timed out: {}", e))
  } else if e.is_decode() {
    TableError::new(PARSE_ERROR, format!("Failed to decode response: {}", e))
  } else {
    TableError::new(NETWORK_ERROR, format!("Request failed: {}", e))
  }
}

fn status_error(status: StatusCode, body: &[u8]) -> TableError {
  let detail = String::from_utf8_lossy(body);
  let detail = detail.trim();
  let message = if detail.is_empty() {
    status.canonical_reason().unwrap_or("request failed").to_string()
  } else {
    detail.chars().take(200).collect()
  };
  TableError::new(format!("HTTP_{}", status.as_u16()), message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap()
  }

  #[test]
  fn test_build_url_scalars_and_arrays() {
    let base = Url::parse("https://api.example.com/users").unwrap();
    let url = build_url(
      &base,
      &params(json!({ "current": 2, "size": 10, "tag": ["a", "b"], "name": "jo", "gone": null })),
    );
    assert_eq!(
      url.as_str(),
      "https://api.example.com/users?current=2&name=jo&size=10&tag=a&tag=b"
    );
  }

  #[test]
  fn test_build_url_keeps_existing_query() {
    let base = Url::parse("http://localhost/items?tenant=acme").unwrap();
    let url = build_url(&base, &params(json!({ "current": 1 })));
    assert_eq!(url.query(), Some("tenant=acme&current=1"));
  }

  #[test]
  fn test_build_url_without_params() {
    let base = Url::parse("http://localhost/items").unwrap();
    assert_eq!(build_url(&base, &Params::new()).as_str(), "http://localhost/items");
  }

  #[test]
  fn test_status_error_codes() {
    let err = status_error(StatusCode::NOT_FOUND, b"");
    assert_eq!(err.code, "HTTP_404");
    assert_eq!(err.message, "Not Found");

    let err = status_error(StatusCode::BAD_GATEWAY, b"  upstream down \n");
    assert_eq!(err.code, "HTTP_502");
    assert_eq!(err.message, "upstream down");
  }

  #[test]
  fn test_fetcher_rejects_bad_url() {
    assert!(HttpFetcher::new("not a url", Duration::from_secs(1), None).is_err());
  }
}
