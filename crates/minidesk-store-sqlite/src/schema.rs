//! The built-in migration sequence for the Minidesk schema.
//!
//! Versions must stay strictly increasing; append new units at the end and
//! never edit one that has shipped.

use rusqlite::Connection;

use crate::migrate::Migration;

/// Every migration unit, oldest first.
pub const MIGRATIONS: &[Migration] = &[
  Migration {
    version: 1,
    name:    "initial_schema",
    apply:   initial_schema_up,
    revert:  initial_schema_down,
  },
  Migration {
    version: 2,
    name:    "add_indexes",
    apply:   add_indexes_up,
    revert:  add_indexes_down,
  },
];

// ─── 001 initial_schema ──────────────────────────────────────────────────────

/// The tracking table comes first so this very unit gets recorded.
const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    version    INTEGER NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    appliedAt  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE TABLE IF NOT EXISTS documents (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL CHECK (length(title) <= 255),
    content    TEXT NOT NULL DEFAULT '',
    createdAt  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updatedAt  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    isShared   INTEGER NOT NULL DEFAULT 0 CHECK (isShared IN (0, 1))
);
";

fn initial_schema_up(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(INITIAL_SCHEMA)
}

fn initial_schema_down(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "DROP TABLE IF EXISTS documents;
     DROP TABLE IF EXISTS schema_migrations;",
  )
}

// ─── 002 add_indexes ─────────────────────────────────────────────────────────

const DOCUMENT_INDEXES: &str = "
-- List views sort by most recently updated.
CREATE INDEX IF NOT EXISTS idx_documents_updatedAt ON documents(updatedAt DESC);
CREATE INDEX IF NOT EXISTS idx_documents_isShared  ON documents(isShared);
";

fn add_indexes_up(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(DOCUMENT_INDEXES)
}

fn add_indexes_down(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "DROP INDEX IF EXISTS idx_documents_isShared;
     DROP INDEX IF EXISTS idx_documents_updatedAt;",
  )
}
