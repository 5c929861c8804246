mod app;
mod commands;
mod config;
mod event;
mod filter;
mod http;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tabledeck")]
#[command(about = "A terminal browser for paginated JSON APIs")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tabledeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Endpoint URL; overrides the config file's, or runs without one
  #[arg(short, long)]
  url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = match (&args.config, args.url) {
    (None, Some(url)) => config::Config::for_url(&url)?,
    (path, url) => {
      let mut config = config::Config::load(path.as_deref())?;
      if let Some(url) = url {
        config.endpoint.url = url;
      }
      config
    }
  };

  // Held until exit so buffered log lines get flushed
  let _log_guard = init_logging(&config.log.level)?;

  let events = event::EventHandler::new(Duration::from_millis(250));
  let mut app = app::App::new(config, &events)?;
  app.run(events).await?;

  Ok(())
}

/// Log to a daily file; the terminal belongs to the UI.
fn init_logging(level: &str) -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Failed to locate data directory for logs"))?
    .join("tabledeck")
    .join("logs");
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(level))
    .map_err(|e| eyre!("Invalid log level {}: {}", level, e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
    &dir,
    "tabledeck.log",
  ));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
