//! In-memory tagged cache for paged query results.
//!
//! This module provides the per-table cache the manager consults before
//! calling out:
//! - Entries keyed by a stable fingerprint of the request parameters
//! - Lazy TTL expiry on read plus an explicit sweep
//! - Capacity-bounded eviction (fewest hits first, then least recently used)
//! - Tag-based bulk invalidation (search condition, page size, "pagination")

mod clock;
mod entry;
mod key;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheStats};
pub use key::{fingerprint, fingerprint_value, generate_tags, Fingerprint, PAGINATION_TAG};
pub use store::TableCache;

/// Which cached pages a refresh should throw away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationStrategy {
  /// Drop every entry
  ClearAll,
  /// Drop only the entry for the current search condition and page
  ClearCurrent,
  /// Drop every paged entry, whatever its search condition
  ClearPagination,
  /// Leave the cache alone
  KeepAll,
}
