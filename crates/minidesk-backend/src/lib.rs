//! Minidesk backend process.
//!
//! Owns the SQLite database and answers document requests from the UI
//! process over stdin/stdout. See `main.rs` for the command-line surface.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

/// Default location of the configuration file, relative to the working
/// directory.
pub const DEFAULT_CONFIG_FILE: &str = "minidesk.toml";

/// Prefix of environment variables that override the configuration file,
/// e.g. `MINIDESK_STORE_PATH`.
pub const ENV_PREFIX: &str = "MINIDESK";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, layered from `minidesk.toml` and `MINIDESK_*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendConfig {
  /// SQLite file to open. Required unless given on the command line.
  #[serde(default)]
  pub store_path:         Option<PathBuf>,
  /// Per-request limit in milliseconds. Absent means wait indefinitely.
  #[serde(default)]
  pub request_timeout_ms: Option<u64>,
}

impl BackendConfig {
  /// Read `file` (if it exists) and then the environment.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()?
      .try_deserialize()
  }

  /// Replace the store path when `path` is given, then expand `~`.
  pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
    if path.is_some() {
      self.store_path = path;
    }
    self.store_path = self.store_path.map(|p| expand_tilde(&p));
    self
  }

  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_ms.map(Duration::from_millis)
  }
}

/// Combine a command's outcome with the outcome of the cleanup after it.
///
/// The command's error wins; a cleanup error that would otherwise hide it is
/// logged instead.
pub fn first_error(
  result: anyhow::Result<()>,
  cleanup: anyhow::Result<()>,
) -> anyhow::Result<()> {
  match (result, cleanup) {
    (Err(e), Err(cleanup_err)) => {
      tracing::error!("{cleanup_err:#}");
      Err(e)
    }
    (result, cleanup) => result.and(cleanup),
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = BackendConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.request_timeout(), None);
  }

  #[test]
  fn file_values_are_read() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "store_path = \"/tmp/minidesk/notes.db\"").unwrap();
    writeln!(file, "request_timeout_ms = 1500").unwrap();

    let cfg = BackendConfig::load(file.path()).unwrap();
    assert_eq!(cfg.store_path, Some(PathBuf::from("/tmp/minidesk/notes.db")));
    assert_eq!(cfg.request_timeout(), Some(Duration::from_millis(1500)));
  }

  #[test]
  fn command_line_path_overrides_file() {
    let cfg = BackendConfig {
      store_path:         Some(PathBuf::from("/from/file.db")),
      request_timeout_ms: None,
    }
    .with_store_path(Some(PathBuf::from("/from/cli.db")));
    assert_eq!(cfg.store_path, Some(PathBuf::from("/from/cli.db")));

    let kept = BackendConfig { store_path: Some(PathBuf::from("/kept.db")), ..Default::default() }
      .with_store_path(None);
    assert_eq!(kept.store_path, Some(PathBuf::from("/kept.db")));
  }

  #[test]
  fn command_error_outlives_cleanup_error() {
    let err = first_error(
      Err(anyhow::anyhow!("transport failed")),
      Err(anyhow::anyhow!("failed to close database")),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "transport failed");

    let err = first_error(Ok(()), Err(anyhow::anyhow!("failed to close database"))).unwrap_err();
    assert_eq!(err.to_string(), "failed to close database");

    assert!(first_error(Ok(()), Ok(())).is_ok());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/notes/minidesk.db")),
      PathBuf::from(home).join("notes/minidesk.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
