//! Serializable table options.

use serde::Deserialize;
use std::time::Duration;

use crate::params::{PaginationKeys, Params};

/// Declarative options for a table. Everything has a default, so an empty
/// YAML/JSON object is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableOptions {
  /// Extra parameters sent with every request
  pub api_params: Params,
  /// Keys kept in local search state but never sent upstream
  pub exclude_params: Vec<String>,
  /// Load the first page as soon as the table is initialized
  pub immediate: bool,
  pub pagination_key: PaginationKeys,
  pub cache: CacheOptions,
}

impl Default for TableOptions {
  fn default() -> Self {
    Self {
      api_params: Params::new(),
      exclude_params: Vec::new(),
      immediate: true,
      pagination_key: PaginationKeys::default(),
      cache: CacheOptions::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
  pub enabled: bool,
  /// Entry time-to-live in milliseconds
  pub ttl_ms: u64,
  /// Quiet period for debounced searches, in milliseconds
  pub debounce_ms: u64,
  pub max_entries: usize,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      enabled: false,
      ttl_ms: 5 * 60 * 1000,
      debounce_ms: 300,
      max_entries: 50,
    }
  }
}

impl CacheOptions {
  pub fn ttl(&self) -> Duration {
    Duration::from_millis(self.ttl_ms)
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  /// How often expired entries are swept: half the TTL.
  pub fn sweep_interval(&self) -> Duration {
    (self.ttl() / 2).max(Duration::from_millis(1))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_empty_object_uses_defaults() {
    let opts: TableOptions = serde_json::from_value(json!({})).unwrap();
    assert!(opts.immediate);
    assert!(!opts.cache.enabled);
    assert_eq!(opts.cache.ttl(), Duration::from_secs(300));
    assert_eq!(opts.cache.debounce(), Duration::from_millis(300));
    assert_eq!(opts.cache.max_entries, 50);
    assert_eq!(opts.pagination_key, PaginationKeys::default());
  }

  #[test]
  fn test_partial_yaml() {
    let opts: TableOptions = serde_yaml::from_str(
      "exclude_params: [draft]\npagination_key:\n  current: page\ncache:\n  enabled: true\n  ttl_ms: 1000\n",
    )
    .unwrap();
    assert_eq!(opts.exclude_params, vec!["draft".to_string()]);
    assert_eq!(opts.pagination_key.current, "page");
    assert_eq!(opts.pagination_key.size, "size");
    assert!(opts.cache.enabled);
    assert_eq!(opts.cache.sweep_interval(), Duration::from_millis(500));
  }
}
