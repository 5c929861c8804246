//! Refresh strategies run after the underlying records changed.
//!
//! Each strategy picks a cache invalidation and a page to land on, then
//! refetches through the cache-aware path.

use serde_json::json;

use super::{TableManager, DEFAULT_PAGE_SIZE};
use crate::adapter::NormalizedResponse;
use crate::cache::InvalidationStrategy;
use crate::params::page_value;

impl TableManager {
  /// A record was created: every cached page may have shifted, so drop all
  /// paged entries and go back to page 1.
  pub async fn refresh_create(&self) -> Option<NormalizedResponse> {
    self.cancel_search();
    self.clear_cache(InvalidationStrategy::ClearPagination, "after create");
    {
      let mut state = self.shared.state();
      state.set_page(1, self.shared.keys());
    }
    self.get_data(None).await
  }

  /// A record was edited in place: refetch the current page only.
  pub async fn refresh_update(&self) -> Option<NormalizedResponse> {
    self.clear_cache(InvalidationStrategy::ClearCurrent, "after update");
    self.get_data(None).await
  }

  /// Records were removed. Steps back one page when the current page would
  /// otherwise be left empty, then drops the entry for the page being
  /// refetched.
  pub async fn refresh_remove(&self) -> Option<NormalizedResponse> {
    {
      let mut state = self.shared.state();
      let pagination = state.pagination;
      let showing = state.data.len();
      let last_record_on_last_page = pagination.is_last_page() && showing == 1;

      if pagination.current > 1 && (last_record_on_last_page || showing == 0) {
        state.set_page(pagination.current - 1, self.shared.keys());
      }
    }

    self.clear_cache(InvalidationStrategy::ClearCurrent, "after delete");
    self.get_data(None).await
  }

  /// Drop the whole cache and refetch the current page.
  pub async fn refresh_data(&self) -> Option<NormalizedResponse> {
    self.cancel_search();
    self.clear_cache(InvalidationStrategy::ClearAll, "refresh");
    self.get_data(None).await
  }

  /// Refetch the current page from upstream without moving it.
  pub async fn refresh_soft(&self) -> Option<NormalizedResponse> {
    self.clear_cache(InvalidationStrategy::ClearCurrent, "soft refresh");
    self.get_data(None).await
  }

  /// Forget all search conditions, keeping the page size.
  ///
  /// Restores the configured `api_params`, returns to page 1, clears the
  /// cache and refetches. The reset hook runs afterwards, on a later task
  /// turn.
  pub async fn reset_search_params(&self) -> Option<NormalizedResponse> {
    self.cancel_search();

    {
      let keys = self.shared.keys();
      let options = &self.shared.config.options;
      let mut state = self.shared.state();
      let size = page_value(state.search_params.get(&keys.size)).unwrap_or(DEFAULT_PAGE_SIZE);

      state.search_params.clear();
      state.search_params.extend(options.api_params.clone());
      state.search_params.insert(keys.current.clone(), json!(1));
      state.search_params.insert(keys.size.clone(), json!(size));
      state.pagination.current = 1;
      state.pagination.size = size;
      state.error = None;
    }

    self.clear_cache(InvalidationStrategy::ClearAll, "reset search");
    let response = self.get_data(None).await;

    if let Some(hook) = &self.shared.config.hooks.on_reset {
      tokio::task::yield_now().await;
      hook();
    }
    response
  }
}
