use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

const SHORTCUTS: &[(&str, &str)] = &[
  ("<:>", " command"),
  ("</>", " search"),
  ("<n/p>", " page"),
  ("<+/->", " size"),
  ("<r/R>", " refresh"),
  ("<1-9>", " columns"),
  ("<q>", " quit"),
];

/// Draw the header bar with title, endpoint and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, title: &str, endpoint: &str) {
  let mut spans = vec![
    Span::styled(" tabledeck ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Yellow).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", endpoint), Style::default().fg(Color::White)),
    Span::raw(" "),
  ];

  for (key, label) in SHORTCUTS {
    spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(*label, Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw("  "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host and path of an endpoint URL, without scheme or query
pub fn endpoint_label(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split(|c: char| c == '?' || c == '#').next().unwrap_or(rest)
}
