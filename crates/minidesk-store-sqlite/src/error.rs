//! Error type for `minidesk-store-sqlite`.

use std::path::PathBuf;

use minidesk_core::{Classify, ErrorKind};
use thiserror::Error;

use crate::migrate::MigrationError;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation and not-found failures, raised before storage is touched.
  #[error(transparent)]
  Core(#[from] minidesk_core::Error),

  #[error("no database path configured; one must be supplied on first initialization")]
  Configuration,

  #[error("database not initialized; call initialize() first")]
  NotInitialized,

  /// The file could not be opened or the connection pragmas were rejected.
  #[error("failed to open database at {path:?}: {source}")]
  Connection {
    path:   PathBuf,
    source: tokio_rusqlite::Error,
  },

  #[error("schema migration failed: {0}")]
  Migration(#[from] MigrationError),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      _ => ErrorKind::Storage,
    }
  }
}
