use crate::commands::Action;
use crate::config::Config;
use crate::event::{Event, EventHandler, TableEvent};
use crate::filter::parse_search;
use crate::http::HttpFetcher;
use crate::ui;
use crate::ui::columns::ColumnSet;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, SearchEvent, SearchInput};
use crate::ui::renderfns::{endpoint_label, Status};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::TableState;
use std::future::Future;
use std::io::stdout;
use tabledeck::{CacheStats, Pagination, TableConfig, TableManager, WithColumns};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Page sizes cycled with `+` and `-`
const PAGE_SIZES: [u64; 4] = [10, 20, 50, 100];

/// Main application state
pub struct App {
  table: WithColumns<ColumnSet>,
  config: Config,
  /// Search conditions currently set from the search box
  applied_filter: Vec<String>,
  search: SearchInput,
  command: CommandInput,
  table_state: TableState,
  status: Status,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, events: &EventHandler) -> Result<Self> {
    let fetcher = HttpFetcher::new(
      &config.endpoint.url,
      config.endpoint.timeout(),
      Config::api_token(),
    )?;
    let table = TableManager::new(table_config(&config, fetcher, events.sender()))
      .with_columns(ColumnSet::new(config.columns.clone()));

    Ok(Self {
      table,
      config,
      applied_filter: Vec::new(),
      search: SearchInput::new(),
      command: CommandInput::new(),
      table_state: TableState::default(),
      status: Status::Idle,
      should_quit: false,
    })
  }

  pub async fn run(&mut self, mut events: EventHandler) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    info!(endpoint = %self.config.endpoint.url, "browser started");
    if self.table.options().immediate {
      self.spawn(|table| async move {
        table.get_data(None).await;
      });
    }

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    self.table.dispose();

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  /// Run a table operation in the background; results come back as events.
  fn spawn<F, Fut>(&self, op: F)
  where
    F: FnOnce(TableManager) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
  {
    tokio::spawn(op(self.table.table().clone()));
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Table(table_event) => self.handle_table_event(table_event),
    }
  }

  fn handle_table_event(&mut self, event: TableEvent) {
    match event {
      TableEvent::Loaded { records } => {
        self.status = Status::Loaded(records);
        self.after_load();
      }
      TableEvent::CacheHit { records } => {
        self.status = Status::CacheHit(records);
        self.after_load();
      }
      TableEvent::Failed(err) => {
        self.status = Status::Failed {
          code: err.code,
          message: err.message,
        };
      }
      TableEvent::Reset => {
        self.status = Status::Info("search reset".to_string());
      }
    }
  }

  fn after_load(&mut self) {
    let records = self.table.data();
    self.table.columns_mut().infer_from(&records);
    match self.table_state.selected() {
      Some(i) if i >= records.len() => self.table_state.select(records.len().checked_sub(1)),
      None if !records.is_empty() => self.table_state.select(Some(0)),
      _ => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    if !self.search.is_active() {
      match self.command.handle_key(key) {
        KeyResult::Event(event) => return self.handle_command(event),
        KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    match self.search.handle_key(key) {
      KeyResult::Event(event) => return self.handle_search(event),
      KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.handle_normal_key(key);
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    let pagination = self.table.pagination();

    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::Char('n') | KeyCode::Right => {
        if pagination.current < pagination.total_pages() {
          self.go_to_page(pagination.current + 1);
        }
      }
      KeyCode::Char('p') | KeyCode::Left => {
        if pagination.current > 1 {
          self.go_to_page(pagination.current - 1);
        }
      }
      KeyCode::Char('+') => self.change_size(next_size(pagination.size, true)),
      KeyCode::Char('-') => self.change_size(next_size(pagination.size, false)),
      KeyCode::Char('r') => self.spawn(|table| async move {
        table.refresh_soft().await;
      }),
      KeyCode::Char('R') => self.spawn(|table| async move {
        table.refresh_data().await;
      }),
      KeyCode::Char(c @ '1'..='9') => {
        let index = c as usize - '1' as usize;
        if !self.table.columns_mut().toggle(index) {
          self.status = Status::Info(format!("no column {}", c));
        }
      }
      _ => {}
    }
  }

  fn go_to_page(&mut self, page: u64) {
    self.table_state.select(Some(0));
    self.spawn(move |table| async move {
      table.handle_current_change(page).await;
    });
  }

  fn change_size(&mut self, size: u64) {
    self.table_state.select(Some(0));
    self.spawn(move |table| async move {
      table.handle_size_change(size).await;
    });
  }

  fn handle_search(&mut self, event: SearchEvent) {
    match event {
      SearchEvent::Changed(text) => {
        self.apply_filter(&text);
        // The debounced run reports through the table hooks; nobody needs
        // to await this particular call.
        let _ = self.table.search_debounced(None);
      }
      SearchEvent::Submitted(text) => {
        self.apply_filter(&text);
        self.spawn(|table| async move {
          if table.search_pending() {
            table.flush_search().await;
          } else {
            table.search(None).await;
          }
        });
      }
      SearchEvent::Cleared => {
        self.clear_filter();
        self.spawn(|table| async move {
          table.reset_search_params().await;
        });
      }
    }
  }

  /// Replace the search box's conditions with the ones parsed from `text`
  fn apply_filter(&mut self, text: &str) {
    self.clear_filter();
    for (key, value) in parse_search(text, &self.config.endpoint.search_key) {
      self.table.set_search_param(key.clone(), value);
      self.applied_filter.push(key);
    }
  }

  fn clear_filter(&mut self) {
    for key in self.applied_filter.drain(..) {
      self.table.remove_search_param(&key);
    }
  }

  fn handle_command(&mut self, event: CommandEvent) {
    match event {
      CommandEvent::Run(action) => self.run_action(action),
      CommandEvent::Unknown(input) => {
        warn!(command = %input, "unknown command");
        self.status = Status::Info(format!("unknown command: {}", input));
      }
      CommandEvent::Cancelled => {}
    }
  }

  fn run_action(&mut self, action: Action) {
    match action {
      Action::Refresh => self.spawn(|table| async move {
        table.refresh_data().await;
      }),
      Action::Soft => self.spawn(|table| async move {
        table.refresh_soft().await;
      }),
      Action::Reset => {
        self.search = SearchInput::new();
        self.handle_search(SearchEvent::Cleared);
      }
      Action::Sweep => {
        let swept = self.table.clear_expired_cache();
        self.status = Status::Info(format!("swept {} expired entries", swept));
      }
      Action::Clear => {
        self.table.clear_data();
        self.table_state.select(None);
        self.status = Status::Info("table cleared".to_string());
      }
      Action::Columns => self.table.columns_mut().show_all(),
      Action::Quit => self.should_quit = true,
    }
  }

  fn move_selection(&mut self, delta: i64) {
    let len = self.table.data().len() as i64;
    if len == 0 {
      return;
    }
    let current = self.table_state.selected().unwrap_or(0) as i64;
    self.table_state.select(Some((current + delta).rem_euclid(len) as usize));
  }

  // Accessors for UI rendering

  pub fn title(&self) -> String {
    self
      .config
      .title
      .clone()
      .unwrap_or_else(|| "records".to_string())
  }

  pub fn endpoint(&self) -> &str {
    endpoint_label(&self.config.endpoint.url)
  }

  pub fn records(&self) -> Vec<serde_json::Value> {
    self.table.data()
  }

  pub fn loading(&self) -> bool {
    self.table.loading()
  }

  pub fn pagination(&self) -> Pagination {
    self.table.pagination()
  }

  pub fn cache_stats(&self) -> Option<CacheStats> {
    self
      .table
      .cache_enabled()
      .then(|| self.table.cache_stats())
  }

  pub fn status(&self) -> &Status {
    &self.status
  }

  pub fn search_query(&self) -> &str {
    self.search.query()
  }

  pub fn search_input(&self) -> &SearchInput {
    &self.search
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  /// Column set and row selection, borrowed together for the records table
  pub fn table_view(&mut self) -> (&ColumnSet, &mut TableState) {
    (self.table.columns(), &mut self.table_state)
  }
}

/// Wire the HTTP fetcher and the UI event channel into a table config.
fn table_config(
  config: &Config,
  fetcher: HttpFetcher,
  tx: mpsc::UnboundedSender<Event>,
) -> TableConfig {
  let send = move |event: TableEvent| {
    let _ = tx.send(Event::Table(event));
  };
  let on_success = send.clone();
  let on_cache_hit = send.clone();
  let on_error = send.clone();

  TableConfig::new(move |params| {
    let fetcher = fetcher.clone();
    async move { fetcher.fetch(params).await }
  })
  .with_options(config.table.clone())
  .on_success(move |data, _| on_success(TableEvent::Loaded { records: data.len() }))
  .on_cache_hit(move |data, _| on_cache_hit(TableEvent::CacheHit { records: data.len() }))
  .on_error(move |err| on_error(TableEvent::Failed(err.clone())))
  .on_reset(move || send(TableEvent::Reset))
}

/// Next (or previous) entry of [`PAGE_SIZES`], starting from wherever
/// `current` falls
fn next_size(current: u64, grow: bool) -> u64 {
  if grow {
    PAGE_SIZES
      .iter()
      .copied()
      .find(|s| *s > current)
      .unwrap_or(PAGE_SIZES[PAGE_SIZES.len() - 1])
  } else {
    PAGE_SIZES
      .iter()
      .rev()
      .copied()
      .find(|s| *s < current)
      .unwrap_or(PAGE_SIZES[0])
  }
}
