use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

pub const MAX_LOG_LINES: usize = 200;

/// Install the diagnostics subscriber. `filter` uses `EnvFilter` syntax.
pub fn init_tracing(filter: &str) {
  let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .try_init();
}

pub fn init_logger(log_path: &Path) -> io::Result<()> {
  if let Some(parent) = log_path.parent() {
    fs::create_dir_all(parent)?;
  }
  Ok(())
}

/// Append `<timestamp> | message` to the activity log.
pub fn append_log(path: &Path, message: &str) -> io::Result<()> {
  let timestamp = OffsetDateTime::now_local()
    .unwrap_or_else(|_| OffsetDateTime::now_utc())
    .format(&Rfc3339)
    .unwrap_or_else(|_| "unknown-time".to_string());

  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)?;
  writeln!(file, "{} | {}", timestamp, message)?;
  Ok(())
}

/// Last `MAX_LOG_LINES` lines of the activity log; empty if there is none.
pub fn read_log_tail(path: &Path) -> Vec<String> {
  let content = fs::read_to_string(path).unwrap_or_default();
  let mut lines: Vec<String> = content.lines().map(|line| line.to_string()).collect();
  if lines.len() > MAX_LOG_LINES {
    lines = lines.split_off(lines.len() - MAX_LOG_LINES);
  }
  lines
}

pub fn clear_log(path: &Path) -> io::Result<()> {
  fs::write(path, "")
}
