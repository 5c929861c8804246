use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::adapter::NormalizedResponse;

/// A cached page and its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  /// Records as handed to the table (after any data transform)
  pub data: Vec<Value>,
  /// The normalized response the records came from
  pub response: NormalizedResponse,
  /// When the entry was stored
  pub timestamp: DateTime<Utc>,
  pub tags: BTreeSet<String>,
  /// Number of times the entry was stored or read, at least 1
  pub access_count: u64,
  pub last_access_time: DateTime<Utc>,
}

impl CacheEntry {
  pub(crate) fn new(
    data: Vec<Value>,
    response: NormalizedResponse,
    tags: BTreeSet<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      data,
      response,
      timestamp: now,
      tags,
      access_count: 1,
      last_access_time: now,
    }
  }

  /// Age in milliseconds at `now`.
  pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
    (now - self.timestamp).num_milliseconds()
  }

  /// Whether any tag contains `tag` as a substring.
  pub fn matches_tag(&self, tag: &str) -> bool {
    self.tags.iter().any(|t| t.contains(tag))
  }
}

/// Snapshot of cache usage, computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
  pub total: usize,
  /// Rough size of the cached records as serialized JSON
  pub approx_size_kb: f64,
  /// Mean access count across entries
  pub avg_hits: f64,
}

impl fmt::Display for CacheStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} entries, {:.2}KB, {:.1} avg hits",
      self.total, self.approx_size_kb, self.avg_hits
    )
  }
}
