//! The table manager: search state, pagination and cached fetching for one
//! paged record list.
//!
//! A [`TableManager`] is a cheap, cloneable handle. It keeps the search
//! parameters and pagination, asks the [`TableCache`] before calling the
//! remote fetch function, and makes sure only the newest request may touch
//! state. Every fetch takes a generation number; a result whose generation
//! is no longer current is dropped, whether it succeeded or failed.
//!
//! # Example
//!
//! ```ignore
//! let table = TableManager::init(
//!   TableConfig::new(|params| async move { api.list_users(params).await })
//!     .with_options(options)
//!     .on_error(|e| tracing::warn!("{}", e)),
//! )
//! .await;
//!
//! table.set_search_param("name", "alice");
//! table.search(None).await;
//! table.handle_current_change(2).await;
//! ```

mod columns;
mod config;
mod options;
mod pagination;
mod refresh;


pub use columns::WithColumns;
pub use config::{
  AdapterFn, DataHook, ErrorHook, FetchFn, Hooks, ResetHook, TableConfig, TransformFn,
};
pub use options::{CacheOptions, TableOptions};
pub use pagination::Pagination;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::adapter::{reserialize, NormalizedResponse};
use crate::cache::{CacheStats, InvalidationStrategy, TableCache};
use crate::debounce::Debouncer;
use crate::error::TableError;
use crate::params::{page_value, strip_excluded, PaginationKeys, Params};

const DEFAULT_PAGE_SIZE: u64 = 10;

/// Mutable table state. Only ever locked briefly, never across an await.
struct TableState {
  search_params: Params,
  pagination: Pagination,
  data: Vec<Value>,
  loading: bool,
  error: Option<TableError>,
  /// Generation of the request allowed to commit results
  generation: u64,
  /// Abort signal of the in-flight request, if any
  in_flight: Option<Arc<Notify>>,
}

impl TableState {
  /// Supersede any in-flight request and claim the slot for a new one.
  fn begin(&mut self) -> (u64, Arc<Notify>) {
    if let Some(previous) = self.in_flight.take() {
      previous.notify_one();
    }
    self.generation += 1;
    let abort = Arc::new(Notify::new());
    self.in_flight = Some(Arc::clone(&abort));
    self.loading = true;
    self.error = None;
    (self.generation, abort)
  }

  fn owns(&self, generation: u64) -> bool {
    self.generation == generation
  }

  /// Release the slot if `generation` still holds it.
  fn finish(&mut self, generation: u64) {
    if self.owns(generation) {
      self.loading = false;
      self.in_flight = None;
    }
  }

  /// Abort the in-flight request; its result will be ignored.
  fn cancel(&mut self) {
    if let Some(previous) = self.in_flight.take() {
      previous.notify_one();
    }
    self.generation += 1;
    self.loading = false;
  }

  /// Search params, then current pagination, then overrides, minus excluded keys.
  fn request_params(&self, overrides: Option<&Params>, options: &TableOptions) -> Params {
    let keys = &options.pagination_key;
    let mut params = self.search_params.clone();
    params.insert(keys.current.clone(), json!(self.pagination.current));
    params.insert(keys.size.clone(), json!(self.pagination.size));
    if let Some(overrides) = overrides {
      params.extend(overrides.clone());
    }
    strip_excluded(&mut params, &options.exclude_params);
    params
  }

  fn apply_page(&mut self, data: Vec<Value>, response: &NormalizedResponse, keys: &PaginationKeys) {
    self.data = data;
    self.pagination.update_from_response(response);
    self.sync_page_fields(keys);
  }

  /// Mirror pagination into the search params, writing only what changed.
  fn sync_page_fields(&mut self, keys: &PaginationKeys) {
    let current = json!(self.pagination.current);
    if self.search_params.get(&keys.current) != Some(&current) {
      self.search_params.insert(keys.current.clone(), current);
    }
    let size = json!(self.pagination.size);
    if self.search_params.get(&keys.size) != Some(&size) {
      self.search_params.insert(keys.size.clone(), size);
    }
  }

  fn set_page(&mut self, page: u64, keys: &PaginationKeys) {
    self.pagination.current = page;
    self.search_params.insert(keys.current.clone(), json!(page));
  }
}

struct Shared {
  config: TableConfig,
  state: Mutex<TableState>,
  cache: Option<Mutex<TableCache>>,
  debouncer: Debouncer<Option<Params>, Option<NormalizedResponse>>,
  sweeper: Mutex<Option<JoinHandle<()>>>,
  page_changing: AtomicBool,
}

impl Shared {
  fn state(&self) -> MutexGuard<'_, TableState> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn with_cache<T>(&self, f: impl FnOnce(&mut TableCache) -> T) -> Option<T> {
    let cache = self.cache.as_ref()?;
    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
    Some(f(&mut cache))
  }

  fn keys(&self) -> &PaginationKeys {
    &self.config.options.pagination_key
  }

  fn stop_sweeper(&self) {
    let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(task) = sweeper.take() {
      task.abort();
    }
  }
}

impl Drop for Shared {
  fn drop(&mut self) {
    self.stop_sweeper();
  }
}

/// Handle to a table's data, search state and cache.
#[derive(Clone)]
pub struct TableManager {
  shared: Arc<Shared>,
}

impl TableManager {
  /// Build a table. Does not fetch anything yet; see [`TableManager::init`].
  ///
  /// When caching is enabled and a tokio runtime is available, a background
  /// task sweeps expired entries every half TTL until the table is disposed
  /// or dropped.
  pub fn new(config: TableConfig) -> Self {
    let options = &config.options;
    let keys = options.pagination_key.clone();

    let mut search_params = Params::new();
    search_params.insert(keys.current.clone(), json!(1));
    search_params.insert(keys.size.clone(), json!(DEFAULT_PAGE_SIZE));
    search_params.extend(options.api_params.clone());

    let pagination = Pagination::new(
      page_value(search_params.get(&keys.current)).unwrap_or(1),
      page_value(search_params.get(&keys.size)).unwrap_or(DEFAULT_PAGE_SIZE),
    );

    let cache = options.cache.enabled.then(|| {
      Mutex::new(
        TableCache::new(options.cache.ttl(), options.cache.max_entries)
          .with_keys(keys.clone())
          .with_clock(Arc::clone(&config.clock)),
      )
    });
    let delay = options.cache.debounce();

    let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
      let weak = weak.clone();
      let debouncer = Debouncer::new(delay, move |params: Option<Params>| {
        let weak = weak.clone();
        async move {
          let shared = weak.upgrade()?;
          TableManager { shared }.search(params).await
        }
      });

      Shared {
        config,
        state: Mutex::new(TableState {
          search_params,
          pagination,
          data: Vec::new(),
          loading: false,
          error: None,
          generation: 0,
          in_flight: None,
        }),
        cache,
        debouncer,
        sweeper: Mutex::new(None),
        page_changing: AtomicBool::new(false),
      }
    });

    let manager = Self { shared };
    manager.start_sweeper();
    manager
  }

  /// Build a table and, if `immediate` is set, load the first page.
  pub async fn init(config: TableConfig) -> Self {
    let manager = Self::new(config);
    if manager.shared.config.options.immediate {
      manager.get_data(None).await;
    }
    manager
  }

  fn start_sweeper(&self) {
    if self.shared.cache.is_none() {
      return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
      warn!("no tokio runtime, expired cache entries are only dropped on read");
      return;
    };

    let period = self.shared.config.options.cache.sweep_interval();
    let weak = Arc::downgrade(&self.shared);
    let task = runtime.spawn(async move {
      let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
      loop {
        ticker.tick().await;
        let Some(shared) = weak.upgrade() else {
          break;
        };
        let cleaned = shared.with_cache(|c| c.cleanup_expired()).unwrap_or(0);
        if cleaned > 0 {
          debug!(cleaned, "swept expired cache entries");
        }
      }
    });

    let mut sweeper = self.shared.sweeper.lock().unwrap_or_else(|e| e.into_inner());
    *sweeper = Some(task);
  }

  /// Fetch a page, consulting the cache first when `use_cache` is set.
  ///
  /// Any in-flight request is superseded. A request that is itself
  /// superseded before finishing resolves to [`NormalizedResponse::cancelled`]
  /// without touching state. Upstream failures clear the data, are reported
  /// through the error hook and returned.
  pub async fn fetch_data(
    &self,
    params: Option<Params>,
    use_cache: bool,
  ) -> Result<NormalizedResponse, TableError> {
    let shared = &self.shared;
    let keys = shared.keys();

    let (generation, abort, request) = {
      let mut state = shared.state();
      let (generation, abort) = state.begin();
      let request = state.request_params(params.as_ref(), &shared.config.options);
      (generation, abort, request)
    };

    if use_cache {
      let hit = shared
        .with_cache(|cache| {
          cache
            .get(&request)
            .map(|entry| (entry.data.clone(), entry.response.clone()))
        })
        .flatten();

      if let Some((data, response)) = hit {
        {
          let mut state = shared.state();
          if !state.owns(generation) {
            return Ok(superseded(generation));
          }
          state.apply_page(data.clone(), &response, keys);
          state.finish(generation);
        }
        debug!(records = data.len(), "cache hit");
        if let Some(hook) = &shared.config.hooks.on_cache_hit {
          hook(&data, &response);
        }
        return Ok(response);
      }
    }

    let fetch = (shared.config.fetcher)(request.clone());
    let outcome = tokio::select! {
      biased;
      _ = abort.notified() => None,
      result = fetch => Some(result),
    };
    let Some(outcome) = outcome else {
      return Ok(superseded(generation));
    };

    match outcome {
      Ok(raw) => {
        let response = (shared.config.adapter)(&raw);
        let data = match &shared.config.transform {
          Some(transform) => transform(response.records.clone()),
          None => response.records.clone(),
        };

        {
          let mut state = shared.state();
          if !state.owns(generation) {
            return Ok(superseded(generation));
          }
          state.apply_page(data.clone(), &response, keys);
          state.finish(generation);
        }

        if use_cache {
          let stored = shared.with_cache(|cache| {
            cache.set(&request, data.clone(), response.clone());
            cache.len()
          });
          if let Some(entries) = stored {
            debug!(entries, "page cached");
          }
        }

        if let Some(hook) = &shared.config.hooks.on_success {
          hook(&data, &response);
        }
        Ok(response)
      }
      Err(report) => {
        let err = TableError::from_report(report);
        {
          let mut state = shared.state();
          if !state.owns(generation) {
            return Ok(superseded(generation));
          }
          state.data.clear();
          state.error = Some(err.clone());
          state.finish(generation);
        }

        error!(code = %err.code, message = %err.message, "failed to fetch table data");
        if let Some(hook) = &shared.config.hooks.on_error {
          hook(&err);
        }
        Err(err)
      }
    }
  }

  /// Fetch keeping the current page. Failures are already reported through
  /// the error hook, so they are swallowed here.
  pub async fn get_data(&self, params: Option<Params>) -> Option<NormalizedResponse> {
    self.fetch_data(params, self.cache_enabled()).await.ok()
  }

  /// Fetch for new search criteria: back to page 1, drop this condition's
  /// cached page and bypass the cache.
  pub async fn search(&self, params: Option<Params>) -> Option<NormalizedResponse> {
    {
      let mut state = self.shared.state();
      state.set_page(1, self.shared.keys());
    }
    self.clear_cache(InvalidationStrategy::ClearCurrent, "search");
    self.fetch_data(params, false).await.ok()
  }

  /// Debounced [`search`](Self::search). Only the last call within the quiet
  /// period runs; superseded calls never resolve.
  pub fn search_debounced(
    &self,
    params: Option<Params>,
  ) -> impl std::future::Future<Output = Option<NormalizedResponse>> + Send + 'static {
    self.shared.debouncer.call(params)
  }

  /// Run a pending debounced search now.
  pub async fn flush_search(&self) -> Option<NormalizedResponse> {
    self.shared.debouncer.flush().await.flatten()
  }

  /// Drop a pending debounced search without running it.
  pub fn cancel_search(&self) {
    self.shared.debouncer.cancel();
  }

  /// Whether a debounced search is waiting out its quiet period.
  pub fn search_pending(&self) -> bool {
    self.shared.debouncer.is_pending()
  }

  /// Change page size: back to page 1 and drop this condition's cached page.
  pub async fn handle_size_change(&self, size: u64) {
    if size == 0 {
      return;
    }
    self.cancel_search();

    {
      let keys = self.shared.keys();
      let mut state = self.shared.state();
      state.pagination.size = size;
      state.search_params.insert(keys.size.clone(), json!(size));
      state.set_page(1, keys);
    }

    self.clear_cache(InvalidationStrategy::ClearCurrent, "page size changed");
    self.get_data(None).await;
  }

  /// Navigate to `page`. Same-page and overlapping calls are ignored.
  pub async fn handle_current_change(&self, page: u64) {
    if page == 0 {
      return;
    }
    if self.pagination().current == page {
      debug!(page, "page unchanged, skipping fetch");
      return;
    }
    if self
      .shared
      .page_changing
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return;
    }
    let _guard = ResetOnDrop(&self.shared.page_changing);

    {
      let mut state = self.shared.state();
      state.set_page(page, self.shared.keys());
    }
    self.get_data(None).await;
  }

  /// Invalidate cached pages according to `strategy`. Returns how many
  /// entries went away.
  pub fn clear_cache(&self, strategy: InvalidationStrategy, context: &str) -> usize {
    if self.shared.cache.is_none() {
      return 0;
    }

    let current = match strategy {
      InvalidationStrategy::ClearCurrent => Some(self.current_request_params()),
      _ => None,
    };

    let cleared = self
      .shared
      .with_cache(|cache| match (strategy, &current) {
        (InvalidationStrategy::ClearAll, _) => {
          let count = cache.len();
          cache.clear();
          count
        }
        (InvalidationStrategy::ClearCurrent, Some(params)) => cache.clear_current_search(params),
        (InvalidationStrategy::ClearPagination, _) => cache.clear_pagination(),
        _ => 0,
      })
      .unwrap_or(0);

    debug!(?strategy, cleared, context, "cache invalidated");
    cleared
  }

  /// Sweep expired cache entries now.
  pub fn clear_expired_cache(&self) -> usize {
    self
      .shared
      .with_cache(|cache| cache.cleanup_expired())
      .unwrap_or(0)
  }

  pub fn cache_stats(&self) -> CacheStats {
    self
      .shared
      .with_cache(|cache| cache.stats())
      .unwrap_or_default()
  }

  /// Abort the in-flight request and any pending debounced search.
  pub fn cancel_request(&self) {
    self.shared.state().cancel();
    self.cancel_search();
  }

  /// Empty the table and its cache.
  pub fn clear_data(&self) {
    {
      let mut state = self.shared.state();
      state.data.clear();
      state.error = None;
    }
    self.clear_cache(InvalidationStrategy::ClearAll, "clear data");
  }

  /// Tear down: cancel requests, empty the cache, stop the expiry sweep.
  pub fn dispose(&self) {
    self.cancel_request();
    self.shared.with_cache(|cache| cache.clear());
    self.shared.stop_sweeper();
  }

  /// Attach an opaque column configuration.
  pub fn with_columns<C>(self, columns: C) -> WithColumns<C> {
    WithColumns::new(self, columns)
  }

  // Accessors

  pub fn data(&self) -> Vec<Value> {
    self.shared.state().data.clone()
  }

  /// The current records deserialized into `T`.
  pub fn records_as<T: DeserializeOwned>(&self) -> serde_json::Result<Vec<T>> {
    reserialize(self.data())
  }

  pub fn loading(&self) -> bool {
    self.shared.state().loading
  }

  pub fn error(&self) -> Option<TableError> {
    self.shared.state().error.clone()
  }

  pub fn pagination(&self) -> Pagination {
    self.shared.state().pagination
  }

  pub fn search_params(&self) -> Params {
    self.shared.state().search_params.clone()
  }

  pub fn is_empty(&self) -> bool {
    self.shared.state().data.is_empty()
  }

  pub fn has_data(&self) -> bool {
    !self.is_empty()
  }

  pub fn cache_enabled(&self) -> bool {
    self.shared.cache.is_some()
  }

  pub fn options(&self) -> &TableOptions {
    &self.shared.config.options
  }

  /// Set a search condition. Takes effect on the next fetch.
  pub fn set_search_param(&self, key: impl Into<String>, value: impl Into<Value>) {
    self
      .shared
      .state()
      .search_params
      .insert(key.into(), value.into());
  }

  pub fn remove_search_param(&self, key: &str) -> Option<Value> {
    self.shared.state().search_params.remove(key)
  }

  /// The parameters a plain fetch would send right now.
  pub fn current_request_params(&self) -> Params {
    self
      .shared
      .state()
      .request_params(None, &self.shared.config.options)
  }
}

impl std::fmt::Debug for TableManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.shared.state();
    f.debug_struct("TableManager")
      .field("pagination", &state.pagination)
      .field("records", &state.data.len())
      .field("loading", &state.loading)
      .field("generation", &state.generation)
      .finish_non_exhaustive()
  }
}

fn superseded(generation: u64) -> NormalizedResponse {
  debug!(generation, "superseded request ignored");
  NormalizedResponse::cancelled()
}

struct ResetOnDrop<'a>(&'a AtomicBool);

impl Drop for ResetOnDrop<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::SeqCst);
  }
}
