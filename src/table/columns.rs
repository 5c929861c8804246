use std::ops::{Deref, DerefMut};

use super::TableManager;

/// A table bundled with caller-defined column configuration.
///
/// The manager never looks at `C`; it is carried along so views can keep
/// columns and data together. Derefs to the manager.
#[derive(Debug, Clone)]
pub struct WithColumns<C> {
  table: TableManager,
  columns: C,
}

impl<C> WithColumns<C> {
  pub(super) fn new(table: TableManager, columns: C) -> Self {
    Self { table, columns }
  }

  pub fn columns(&self) -> &C {
    &self.columns
  }

  pub fn columns_mut(&mut self) -> &mut C {
    &mut self.columns
  }

  pub fn table(&self) -> &TableManager {
    &self.table
  }
}

impl<C> Deref for WithColumns<C> {
  type Target = TableManager;

  fn deref(&self) -> &TableManager {
    &self.table
  }
}

impl<C> DerefMut for WithColumns<C> {
  fn deref_mut(&mut self) -> &mut TableManager {
    &mut self.table
  }
}
