//! Core types and trait definitions for the Minidesk document store.
//!
//! This crate has no database or transport dependencies.
//! The SQLite backend and the IPC boundary both depend on it.

pub mod document;
pub mod error;
pub mod store;
pub mod validate;

pub use error::{Classify, Error, ErrorKind, Result};
