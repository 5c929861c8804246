use serde::Serialize;

use crate::adapter::NormalizedResponse;

/// Pagination state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
  /// 1-based page index
  pub current: u64,
  pub size: u64,
  pub total: u64,
}

impl Default for Pagination {
  fn default() -> Self {
    Self {
      current: 1,
      size: 10,
      total: 0,
    }
  }
}

impl Pagination {
  pub fn new(current: u64, size: u64) -> Self {
    Self {
      current: current.max(1),
      size: size.max(1),
      total: 0,
    }
  }

  /// Number of pages, never less than one.
  pub fn total_pages(&self) -> u64 {
    self.total.div_ceil(self.size.max(1)).max(1)
  }

  pub fn is_last_page(&self) -> bool {
    self.current == self.total_pages()
  }

  /// Take total, page and size from a response, then clamp the page into range.
  pub fn update_from_response(&mut self, response: &NormalizedResponse) {
    self.total = response.total;
    if let Some(current) = response.current {
      self.current = current.max(1);
    }
    if let Some(size) = response.size.filter(|s| *s > 0) {
      self.size = size;
    }
    self.clamp();
  }

  /// Pull `current` back to the last page if it points past it.
  pub fn clamp(&mut self) {
    self.current = self.current.clamp(1, self.total_pages());
  }
}
