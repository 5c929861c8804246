use super::columns::{lookup, ColumnSet};
use super::renderfns::{cell_text, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use serde_json::Value;

const MAX_CELL_WIDTH: usize = 48;

/// Block title for the records table
pub fn title(name: &str, shown: usize, query: &str) -> String {
  if query.is_empty() {
    format!(" {} ({}) ", name, shown)
  } else {
    format!(" {} ({}) /{} ", name, shown, truncate(query, 30))
  }
}

/// Draw the current page's records using the visible columns
pub fn draw_records(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  records: &[Value],
  columns: &ColumnSet,
  loading: bool,
  state: &mut TableState,
) {
  let block = Block::default()
    .title(title.to_string())
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let visible: Vec<&str> = columns.visible().map(|c| c.field.as_str()).collect();

  if records.is_empty() || visible.is_empty() {
    let content = if loading {
      "Loading..."
    } else if records.is_empty() {
      "No records."
    } else {
      "All columns hidden. Use :columns to show them again."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let header = Row::new(
    columns
      .all()
      .iter()
      .enumerate()
      .filter(|(_, c)| c.visible)
      .map(|(i, c)| {
        let label = if i < 9 {
          format!("{} {}", i + 1, c.field)
        } else {
          c.field.clone()
        };
        Cell::from(label)
      }),
  )
  .style(Style::default().fg(Color::Cyan).bold());

  let rows = records.iter().map(|record| {
    Row::new(
      visible
        .iter()
        .map(|field| Cell::from(cell_text(lookup(record, field), MAX_CELL_WIDTH))),
    )
  });

  let widths = vec![Constraint::Fill(1); visible.len()];
  let table = Table::new(rows, widths)
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, area, state);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_title() {
    assert_eq!(title("users", 10, ""), " users (10) ");
    assert_eq!(title("users", 3, "name=al"), " users (3) /name=al ");
  }
}
