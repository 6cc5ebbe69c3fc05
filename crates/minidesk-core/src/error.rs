//! Error types for `minidesk-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Caller-supplied input was rejected before touching storage.
  #[error("{0}")]
  Validation(String),

  #[error("Document with id {0} not found")]
  DocumentNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The coarse category of a failure, as seen from across the process
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  /// A recognised failure inside the storage engine.
  Storage,
  Unknown,
}

/// Sorts an error into an [`ErrorKind`].
///
/// Implemented by every [`crate::store::DocumentStore`] error type so the
/// boundary layer can encode failures without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::DocumentNotFound(_) => ErrorKind::NotFound,
    }
  }
}
