//! Paged table fetching with a tagged, TTL-bounded cache.
//!
//! The [`table::TableManager`] owns search state and pagination for one
//! remote record list. It normalizes whatever shape the endpoint returns
//! ([`adapter`]), serves repeat queries from a [`cache::TableCache`], drops
//! results from superseded requests, and invalidates cached pages according
//! to what changed (create, update, delete, new search).

pub mod adapter;
pub mod cache;
pub mod debounce;
pub mod error;
pub mod params;
pub mod table;

pub use adapter::{default_response_adapter, NormalizedResponse};
pub use cache::{CacheStats, InvalidationStrategy};
pub use error::TableError;
pub use params::{PaginationKeys, Params};
pub use table::{CacheOptions, Pagination, TableConfig, TableManager, TableOptions, WithColumns};
