use serde_json::Value;

/// A record field shown as a table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
  /// Field name; dots address nested objects (`customer.name`)
  pub field: String,
  pub visible: bool,
}

/// The columns of the browser's table, in display order.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
  columns: Vec<Column>,
}

impl ColumnSet {
  pub fn new(fields: impl IntoIterator<Item = String>) -> Self {
    Self {
      columns: fields
        .into_iter()
        .map(|field| Column {
          field,
          visible: true,
        })
        .collect(),
    }
  }

  pub fn all(&self) -> &[Column] {
    &self.columns
  }

  pub fn visible(&self) -> impl Iterator<Item = &Column> {
    self.columns.iter().filter(|c| c.visible)
  }

  /// Without configured columns, take the fields of the first record
  pub fn infer_from(&mut self, records: &[Value]) {
    if !self.columns.is_empty() {
      return;
    }
    if let Some(Value::Object(first)) = records.first() {
      *self = Self::new(first.keys().cloned());
    }
  }

  /// Flip visibility of the column at `index` (0-based). Returns false when
  /// there is no such column.
  pub fn toggle(&mut self, index: usize) -> bool {
    match self.columns.get_mut(index) {
      Some(column) => {
        column.visible = !column.visible;
        true
      }
      None => false,
    }
  }

  pub fn show_all(&mut self) {
    for column in &mut self.columns {
      column.visible = true;
    }
  }
}

/// Resolve a dotted field path in a record
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
  path
    .split('.')
    .try_fold(record, |value, segment| match value {
      Value::Object(map) => map.get(segment),
      Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_infer_from_first_record() {
    let mut columns = ColumnSet::default();
    columns.infer_from(&[json!({ "id": 1, "name": "a" }), json!({ "other": true })]);
    let fields: Vec<&str> = columns.all().iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec!["id", "name"]);
  }

  #[test]
  fn test_configured_columns_not_replaced() {
    let mut columns = ColumnSet::new(vec!["name".to_string()]);
    columns.infer_from(&[json!({ "id": 1 })]);
    assert_eq!(columns.all().len(), 1);
    assert_eq!(columns.all()[0].field, "name");
  }

  #[test]
  fn test_toggle_and_show_all() {
    let mut columns = ColumnSet::new(vec!["a".to_string(), "b".to_string()]);
    assert!(columns.toggle(0));
    assert!(!columns.toggle(5));
    assert_eq!(columns.visible().count(), 1);
    columns.show_all();
    assert_eq!(columns.visible().count(), 2);
  }

  #[test]
  fn test_lookup_nested() {
    let record = json!({ "customer": { "name": "acme" }, "tags": ["x", "y"] });
    assert_eq!(lookup(&record, "customer.name"), Some(&json!("acme")));
    assert_eq!(lookup(&record, "tags.1"), Some(&json!("y")));
    assert_eq!(lookup(&record, "customer.missing"), None);
  }
}
