//! The tagged cache store.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::entry::{CacheEntry, CacheStats};
use super::key::{fingerprint, generate_tags, Fingerprint, PAGINATION_TAG};
use crate::adapter::NormalizedResponse;
use crate::params::{PaginationKeys, Params};

/// Bounded in-memory cache of table pages.
///
/// Entries expire lazily on `get` once older than the TTL; `cleanup_expired`
/// sweeps the rest. When a new fingerprint would push the store past
/// `max_size`, one entry is evicted first: the one with the fewest accesses,
/// ties going to the least recently accessed.
#[derive(Debug)]
pub struct TableCache {
  entries: HashMap<Fingerprint, CacheEntry>,
  ttl_ms: i64,
  max_size: usize,
  keys: PaginationKeys,
  clock: Arc<dyn Clock>,
}

impl TableCache {
  pub fn new(ttl: Duration, max_size: usize) -> Self {
    Self {
      entries: HashMap::new(),
      ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
      max_size: max_size.max(1),
      keys: PaginationKeys::default(),
      clock: Arc::new(SystemClock),
    }
  }

  /// Use these pagination field names when deriving tags.
  pub fn with_keys(mut self, keys: PaginationKeys) -> Self {
    self.keys = keys;
    self
  }

  /// Replace the time source.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Store a page under the fingerprint of `params`.
  pub fn set(&mut self, params: &Params, data: Vec<Value>, response: NormalizedResponse) {
    let key = fingerprint(params);
    let tags = generate_tags(params, &self.keys);
    let now = self.clock.now();

    if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
      self.evict_one();
    }

    self
      .entries
      .insert(key, CacheEntry::new(data, response, tags, now));
  }

  /// Look up a page. Expired entries are removed and reported as a miss.
  pub fn get(&mut self, params: &Params) -> Option<&CacheEntry> {
    let key = fingerprint(params);
    let now = self.clock.now();

    let expired = self.entries.get(&key)?.age_ms(now) > self.ttl_ms;
    if expired {
      self.entries.remove(&key);
      debug!(key = %key.digest(), "cache entry expired");
      return None;
    }

    let entry = self.entries.get_mut(&key)?;
    entry.access_count += 1;
    entry.last_access_time = now;
    Some(entry)
  }

  /// Remove every entry having a tag that contains any of `tags`.
  pub fn clear_by_tags(&mut self, tags: &[&str]) -> usize {
    let before = self.entries.len();
    self
      .entries
      .retain(|_, entry| !tags.iter().any(|tag| entry.matches_tag(tag)));
    before - self.entries.len()
  }

  /// Remove the single entry for exactly these parameters.
  pub fn clear_current_search(&mut self, params: &Params) -> usize {
    usize::from(self.entries.remove(&fingerprint(params)).is_some())
  }

  /// Remove all paged entries, whatever their search condition.
  pub fn clear_pagination(&mut self) -> usize {
    self.clear_by_tags(&[PAGINATION_TAG])
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// Remove every entry older than the TTL.
  pub fn cleanup_expired(&mut self) -> usize {
    let now = self.clock.now();
    let ttl_ms = self.ttl_ms;
    let before = self.entries.len();
    self.entries.retain(|_, entry| entry.age_ms(now) <= ttl_ms);
    before - self.entries.len()
  }

  pub fn stats(&self) -> CacheStats {
    let total = self.entries.len();
    if total == 0 {
      return CacheStats::default();
    }

    let (bytes, hits) = self.entries.values().fold((0usize, 0u64), |(bytes, hits), entry| {
      let size = serde_json::to_string(&entry.data)
        .map(|s| s.len())
        .unwrap_or(0);
      (bytes + size, hits + entry.access_count)
    });

    CacheStats {
      total,
      approx_size_kb: bytes as f64 / 1024.0,
      avg_hits: hits as f64 / total as f64,
    }
  }

  fn evict_one(&mut self) {
    let victim = self
      .entries
      .iter()
      .min_by(|(_, a), (_, b)| {
        a.access_count
          .cmp(&b.access_count)
          .then(a.last_access_time.cmp(&b.last_access_time))
      })
      .map(|(key, _)| key.clone());

    if let Some(key) = victim {
      self.entries.remove(&key);
      debug!(key = %key.digest(), "evicted least used cache entry");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::ManualClock;
  use chrono::Duration as ChronoDuration;
  use serde_json::json;

  const TTL: Duration = Duration::from_secs(60);

  fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap()
  }

  fn page(n: u64) -> NormalizedResponse {
    NormalizedResponse {
      records: vec![json!({ "id": n })],
      total: 1,
      ..Default::default()
    }
  }

  fn cache_with_clock(max: usize) -> (TableCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = TableCache::new(TTL, max).with_clock(clock.clone());
    (cache, clock)
  }

  fn put(cache: &mut TableCache, n: u64) {
    let response = page(n);
    cache.set(&params(json!({ "current": n })), response.records.clone(), response);
  }

  #[test]
  fn test_set_then_get() {
    let (mut cache, _) = cache_with_clock(10);
    put(&mut cache, 1);

    let entry = cache.get(&params(json!({ "current": 1 }))).unwrap();
    assert_eq!(entry.data, vec![json!({ "id": 1 })]);
    assert_eq!(entry.access_count, 2);
    assert!(cache.get(&params(json!({ "current": 2 }))).is_none());
  }

  #[test]
  fn test_ttl_boundary() {
    let (mut cache, clock) = cache_with_clock(10);
    put(&mut cache, 1);
    let key = params(json!({ "current": 1 }));

    clock.advance(ChronoDuration::milliseconds(59_999));
    assert!(cache.get(&key).is_some());

    clock.advance(ChronoDuration::milliseconds(2));
    assert!(cache.get(&key).is_none());
    assert!(cache.is_empty());
  }

  #[test]
  fn test_capacity_bound_evicts_least_used() {
    let (mut cache, clock) = cache_with_clock(3);
    for n in 1..=3 {
      put(&mut cache, n);
      clock.advance(ChronoDuration::milliseconds(10));
    }
    // Entry 1 and 3 get a hit; entry 2 stays at one access
    cache.get(&params(json!({ "current": 1 })));
    cache.get(&params(json!({ "current": 3 })));

    put(&mut cache, 4);
    assert_eq!(cache.len(), 3);
    assert!(cache.get(&params(json!({ "current": 2 }))).is_none());
    assert!(cache.get(&params(json!({ "current": 1 }))).is_some());
  }

  #[test]
  fn test_eviction_tie_breaks_on_oldest_access() {
    let (mut cache, clock) = cache_with_clock(2);
    put(&mut cache, 1);
    clock.advance(ChronoDuration::milliseconds(5));
    put(&mut cache, 2);
    clock.advance(ChronoDuration::milliseconds(5));

    put(&mut cache, 3);
    assert_eq!(cache.len(), 2);
    assert!(cache.get(&params(json!({ "current": 1 }))).is_none());
    assert!(cache.get(&params(json!({ "current": 2 }))).is_some());
  }

  #[test]
  fn test_overwrite_does_not_evict() {
    let (mut cache, _) = cache_with_clock(2);
    put(&mut cache, 1);
    put(&mut cache, 2);
    put(&mut cache, 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.get(&params(json!({ "current": 1 }))).is_some());
  }

  #[test]
  fn test_clear_by_tags_matches_substrings() {
    let (mut cache, _) = cache_with_clock(10);
    let a = params(json!({ "name": "alice", "current": 1 }));
    let b = params(json!({ "name": "bob", "current": 1 }));
    cache.set(&a, vec![], page(1));
    cache.set(&b, vec![], page(2));

    assert_eq!(cache.clear_by_tags(&["name:ali"]), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&b).is_some());
  }

  #[test]
  fn test_clear_pagination_ignores_search_condition() {
    let (mut cache, _) = cache_with_clock(10);
    cache.set(&params(json!({ "name": "a", "size": 10 })), vec![], page(1));
    cache.set(&params(json!({ "name": "b", "size": 20 })), vec![], page(2));
    cache.set(&params(json!({ "size": 50 })), vec![], page(3));

    assert_eq!(cache.clear_pagination(), 3);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_clear_current_search() {
    let (mut cache, _) = cache_with_clock(10);
    let a = params(json!({ "q": "x", "current": 1 }));
    cache.set(&a, vec![], page(1));
    put(&mut cache, 2);

    assert_eq!(cache.clear_current_search(&a), 1);
    assert_eq!(cache.clear_current_search(&a), 0);
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn test_cleanup_expired() {
    let (mut cache, clock) = cache_with_clock(10);
    put(&mut cache, 1);
    clock.advance(ChronoDuration::seconds(45));
    put(&mut cache, 2);
    clock.advance(ChronoDuration::seconds(30));

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&params(json!({ "current": 2 }))).is_some());
  }

  #[test]
  fn test_stats() {
    let (mut cache, _) = cache_with_clock(10);
    assert_eq!(cache.stats(), CacheStats::default());

    put(&mut cache, 1);
    put(&mut cache, 2);
    cache.get(&params(json!({ "current": 1 })));

    let stats = cache.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.avg_hits, 1.5);
    assert!(stats.approx_size_kb > 0.0);
    assert!(stats.to_string().starts_with("2 entries, "));
    assert!(stats.to_string().ends_with("1.5 avg hits"));
  }
}
