pub mod columns;
pub mod components;
pub mod renderfns;
mod records;

use crate::app::App;
use ratatui::prelude::*;
use renderfns::FooterInfo;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Records
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], &app.title(), app.endpoint());

  let records = app.records();
  let loading = app.loading();
  let title = records::title(&app.title(), records.len(), app.search_query());
  let (columns, state) = app.table_view();
  records::draw_records(frame, chunks[1], &title, &records, columns, loading, state);

  app.search_input().render_overlay(frame, chunks[1]);
  app.command_input().render_overlay(frame, chunks[1]);

  let status = app.status().clone();
  let info = FooterInfo {
    pagination: app.pagination(),
    loading,
    status: &status,
    cache: app.cache_stats(),
  };
  renderfns::draw_footer(frame, chunks[2], &info);
}
