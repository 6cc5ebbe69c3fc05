//! SQLite backend for the Minidesk document store.
//!
//! [`Database`] owns the single connection for the process, applies pragmas,
//! and brings the schema up to date through the [`Migrator`] before any
//! document query runs. [`SqliteDocumentStore`] implements
//! [`minidesk_core::store::DocumentStore`] on top of that connection.
//!
//! Database access goes through [`tokio_rusqlite`], so queries run on a
//! dedicated thread without blocking the async runtime.

mod database;
mod encode;
mod schema;
mod store;

pub mod error;
pub mod migrate;

pub use database::Database;
pub use error::{Error, Result};
pub use migrate::{Migration, MigrationError, Migrator, SchemaVersionRecord};
pub use schema::MIGRATIONS;
pub use store::SqliteDocumentStore;
