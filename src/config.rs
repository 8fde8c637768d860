use crate::activity::DEFAULT_RUN_DELAY;
use crate::navigation::DEFAULT_ORIGIN;
use crate::records::DEFAULT_API_BASE;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "hyperai-shell";

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
  pub data_dir: PathBuf,
  pub log_filter: String,
  /// Origin the shell is served from; same-origin input is routed in-app.
  pub origin: String,
  pub api_base: String,
  pub run_delay: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      log_filter: "info".to_string(),
      origin: DEFAULT_ORIGIN.to_string(),
      api_base: DEFAULT_API_BASE.to_string(),
      run_delay: DEFAULT_RUN_DELAY,
    }
  }
}

impl Config {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let defaults = Self::default();
    Self {
      data_dir: lookup("HYPERAI_DATA_DIR")
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(defaults.data_dir),
      log_filter: lookup("HYPERAI_LOG").unwrap_or(defaults.log_filter),
      origin: lookup("HYPERAI_ORIGIN").unwrap_or(defaults.origin),
      api_base: lookup("HYPERAI_API_BASE").unwrap_or(defaults.api_base),
      run_delay: lookup("HYPERAI_RUN_DELAY_MS")
        .and_then(|ms| ms.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(defaults.run_delay),
    }
  }
}

fn default_data_dir() -> PathBuf {
  dirs::config_dir()
    .unwrap_or_else(|| PathBuf::from("/tmp"))
    .join(APP_DIR)
}
