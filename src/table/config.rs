//! Everything needed to build a [`TableManager`](super::TableManager).

use color_eyre::Result;
use futures::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::options::TableOptions;
use crate::adapter::{default_response_adapter, NormalizedResponse};
use crate::cache::{Clock, SystemClock};
use crate::error::TableError;
use crate::params::Params;

/// Remote fetch: request parameters in, raw response out.
pub type FetchFn = Arc<dyn Fn(Params) -> BoxFuture<'static, Result<Value>> + Send + Sync>;
pub type AdapterFn = Arc<dyn Fn(&Value) -> NormalizedResponse + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync>;

pub type DataHook = Arc<dyn Fn(&[Value], &NormalizedResponse) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&TableError) + Send + Sync>;
pub type ResetHook = Arc<dyn Fn() + Send + Sync>;

/// Callbacks fired by the manager. They run synchronously, after internal
/// state is updated and with no lock held, and are never awaited.
#[derive(Clone, Default)]
pub struct Hooks {
  pub on_success: Option<DataHook>,
  pub on_error: Option<ErrorHook>,
  pub on_cache_hit: Option<DataHook>,
  pub on_reset: Option<ResetHook>,
}

/// Options plus the non-serializable pieces of a table.
#[derive(Clone)]
pub struct TableConfig {
  pub(crate) fetcher: FetchFn,
  pub(crate) options: TableOptions,
  pub(crate) adapter: AdapterFn,
  pub(crate) transform: Option<TransformFn>,
  pub(crate) hooks: Hooks,
  pub(crate) clock: Arc<dyn Clock>,
}

impl TableConfig {
  /// Create a config around the remote fetch function.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
  {
    Self {
      fetcher: Arc::new(move |params: Params| -> BoxFuture<'static, Result<Value>> {
        Box::pin(fetcher(params))
      }),
      options: TableOptions::default(),
      adapter: Arc::new(default_response_adapter),
      transform: None,
      hooks: Hooks::default(),
      clock: Arc::new(SystemClock),
    }
  }

  pub fn with_options(mut self, options: TableOptions) -> Self {
    self.options = options;
    self
  }

  /// Replace the default response adapter.
  pub fn with_adapter<F>(mut self, adapter: F) -> Self
  where
    F: Fn(&Value) -> NormalizedResponse + Send + Sync + 'static,
  {
    self.adapter = Arc::new(adapter);
    self
  }

  /// Transform records after normalization, before they reach state and cache.
  pub fn with_transform<F>(mut self, transform: F) -> Self
  where
    F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
  {
    self.transform = Some(Arc::new(transform));
    self
  }

  /// Time source for cache entries.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn on_success<F>(mut self, hook: F) -> Self
  where
    F: Fn(&[Value], &NormalizedResponse) + Send + Sync + 'static,
  {
    self.hooks.on_success = Some(Arc::new(hook));
    self
  }

  pub fn on_error<F>(mut self, hook: F) -> Self
  where
    F: Fn(&TableError) + Send + Sync + 'static,
  {
    self.hooks.on_error = Some(Arc::new(hook));
    self
  }

  pub fn on_cache_hit<F>(mut self, hook: F) -> Self
  where
    F: Fn(&[Value], &NormalizedResponse) + Send + Sync + 'static,
  {
    self.hooks.on_cache_hit = Some(Arc::new(hook));
    self
  }

  /// Called after `reset_search_params` has refetched.
  pub fn on_reset<F>(mut self, hook: F) -> Self
  where
    F: Fn() + Send + Sync + 'static,
  {
    self.hooks.on_reset = Some(Arc::new(hook));
    self
  }

  pub fn options(&self) -> &TableOptions {
    &self.options
  }
}
