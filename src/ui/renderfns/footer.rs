use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tabledeck::{CacheStats, Pagination};

/// Outcome of the last table operation, for the status line
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
  Idle,
  Loaded(usize),
  CacheHit(usize),
  Failed { code: String, message: String },
  Info(String),
}

/// Everything the footer shows
#[derive(Debug, Clone)]
pub struct FooterInfo<'a> {
  pub pagination: Pagination,
  pub loading: bool,
  pub status: &'a Status,
  pub cache: Option<CacheStats>,
}

/// `page 2/5 · 48 total · 10/page`
pub fn page_summary(pagination: &Pagination) -> String {
  format!(
    "page {}/{} · {} total · {}/page",
    pagination.current,
    pagination.total_pages(),
    pagination.total,
    pagination.size
  )
}

/// Draw the footer bar with pagination, last outcome and cache stats
pub fn draw_footer(frame: &mut Frame, area: Rect, info: &FooterInfo) {
  let separator = || Span::styled(" │ ", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::raw(" "),
    Span::styled(page_summary(&info.pagination), Style::default().fg(Color::White)),
    separator(),
  ];

  let status = if info.loading {
    Span::styled("loading…", Style::default().fg(Color::Yellow))
  } else {
    match info.status {
      Status::Idle => Span::styled("ready", Style::default().fg(Color::DarkGray)),
      Status::Loaded(n) => Span::styled(format!("{} loaded", n), Style::default().fg(Color::Green)),
      Status::CacheHit(n) => Span::styled(
        format!("{} from cache", n),
        Style::default().fg(Color::Cyan),
      ),
      Status::Failed { code, message } => Span::styled(
        format!("{}: {}", code, message),
        Style::default().fg(Color::Red).bold(),
      ),
      Status::Info(text) => Span::styled(text.clone(), Style::default().fg(Color::White)),
    }
  };
  spans.push(status);

  if let Some(stats) = &info.cache {
    spans.push(separator());
    spans.push(Span::styled(
      format!("cache {}", stats),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
