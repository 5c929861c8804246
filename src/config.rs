use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabledeck::TableOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub endpoint: EndpointConfig,
  /// Table behavior: params, pagination keys, caching
  #[serde(default)]
  pub table: TableOptions,
  /// Record fields shown as columns, in order. Empty means "infer from data".
  #[serde(default)]
  pub columns: Vec<String>,
  #[serde(default)]
  pub log: LogConfig,
  /// Custom title for header (defaults to the endpoint host)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Parameter free-text searches are sent as
  #[serde(default = "default_search_key")]
  pub search_key: String,
}

impl EndpointConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_search_key() -> String {
  "keyword".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default = "default_log_level")]
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tabledeck.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tabledeck/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tabledeck/config.yaml\n\
                 or pass --url to browse an endpoint with default settings."
      )),
    }
  }

  /// Configuration for a bare endpoint URL, everything else defaulted.
  pub fn for_url(url: &str) -> Result<Self> {
    Self::parse(&format!("endpoint:\n  url: {:?}\n", url))
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("tabledeck.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tabledeck").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Bearer token for the endpoint, if `TABLEDECK_TOKEN` is set.
  pub fn api_token() -> Option<String> {
    std::env::var("TABLEDECK_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }
}
