//! The uniform success/error envelope returned by every boundary operation.

use std::fmt;

use minidesk_core::{Classify, ErrorKind};
use serde::{
  Deserialize, Serialize, Serializer,
  ser::SerializeStruct as _,
};
use thiserror::Error;

// ─── Error codes ─────────────────────────────────────────────────────────────

/// Stable code the remote caller branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  ValidationError,
  NotFound,
  DatabaseError,
  UnknownError,
}

impl ErrorCode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ValidationError => "VALIDATION_ERROR",
      Self::NotFound => "NOT_FOUND",
      Self::DatabaseError => "DATABASE_ERROR",
      Self::UnknownError => "UNKNOWN_ERROR",
    }
  }
}

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl From<ErrorKind> for ErrorCode {
  fn from(kind: ErrorKind) -> Self {
    match kind {
      ErrorKind::Validation => Self::ValidationError,
      ErrorKind::NotFound => Self::NotFound,
      ErrorKind::Storage => Self::DatabaseError,
      ErrorKind::Unknown => Self::UnknownError,
    }
  }
}

// ─── Error body ──────────────────────────────────────────────────────────────

/// The `error` member of a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} ({code})")]
pub struct ErrorBody {
  pub message: String,
  pub code:    ErrorCode,
}

impl ErrorBody {
  pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
    Self { message: message.into(), code }
  }

  /// Encode any classified error, keeping its display text as the message.
  pub fn from_error<E>(error: &E) -> Self
  where
    E: Classify + fmt::Display,
  {
    Self::new(error.kind().into(), error.to_string())
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// `{"success": true, "data": T}` or `{"success": false, "error": ErrorBody}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawEnvelope<T>")]
pub enum Envelope<T> {
  Success(T),
  Failure(ErrorBody),
}

impl<T> Envelope<T> {
  pub fn is_success(&self) -> bool { matches!(self, Self::Success(_)) }

  /// The error code, if this is a failure.
  pub fn code(&self) -> Option<ErrorCode> {
    match self {
      Self::Success(_) => None,
      Self::Failure(body) => Some(body.code),
    }
  }

  /// Unwrap on the calling side: the data, or the encoded error.
  pub fn into_result(self) -> Result<T, ErrorBody> {
    match self {
      Self::Success(data) => Ok(data),
      Self::Failure(body) => Err(body),
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
    match self {
      Self::Success(data) => Envelope::Success(f(data)),
      Self::Failure(body) => Envelope::Failure(body),
    }
  }
}

impl<T> From<Result<T, ErrorBody>> for Envelope<T> {
  fn from(result: Result<T, ErrorBody>) -> Self {
    match result {
      Ok(data) => Self::Success(data),
      Err(body) => Self::Failure(body),
    }
  }
}

impl<T: Serialize> Serialize for Envelope<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("Envelope", 2)?;
    match self {
      Self::Success(data) => {
        state.serialize_field("success", &true)?;
        state.serialize_field("data", data)?;
      }
      Self::Failure(body) => {
        state.serialize_field("success", &false)?;
        state.serialize_field("error", body)?;
      }
    }
    state.end()
  }
}

/// Wire shape accepted on deserialisation; `success` must agree with the
/// member that is present.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEnvelope<T> {
  Failure { success: bool, error: ErrorBody },
  Success { success: bool, data: T },
}

impl<T> TryFrom<RawEnvelope<T>> for Envelope<T> {
  type Error = String;

  fn try_from(raw: RawEnvelope<T>) -> Result<Self, Self::Error> {
    match raw {
      RawEnvelope::Failure { success: false, error } => Ok(Self::Failure(error)),
      RawEnvelope::Success { success: true, data } => Ok(Self::Success(data)),
      _ => Err("envelope `success` flag disagrees with its payload".to_owned()),
    }
  }
}
