//! Versioned, transactional schema migrations.
//!
//! Applied versions are recorded in the `schema_migrations` table, which the
//! first migration creates. The set of recorded versions is always a prefix
//! of the declared sequence: only units newer than the highest recorded
//! version are applied, in ascending order, each in its own transaction.

use chrono::Utc;
use rusqlite::{Connection, params};
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::MIGRATIONS;

// ─── Types ───────────────────────────────────────────────────────────────────

/// A versioned pair of forward and reverse schema changes.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
  /// Strictly positive; strictly increasing across the sequence.
  pub version: i64,
  pub name:    &'static str,
  pub apply:   fn(&Connection) -> rusqlite::Result<()>,
  pub revert:  fn(&Connection) -> rusqlite::Result<()>,
}

/// One row of `schema_migrations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersionRecord {
  pub version:    i64,
  pub name:       String,
  /// Unix seconds at which the migration transaction committed.
  pub applied_at: i64,
}

#[derive(Debug, Error)]
pub enum MigrationError {
  #[error("failed to apply migration {version}: {name}: {source}")]
  Apply {
    version: i64,
    name:    &'static str,
    source:  rusqlite::Error,
  },

  #[error("failed to roll back migration {version}: {name}: {source}")]
  Revert {
    version: i64,
    name:    &'static str,
    source:  rusqlite::Error,
  },

  /// The database records a version with no declared unit.
  #[error("migration version {0} not found")]
  UnknownVersion(i64),

  #[error("failed to read schema version: {0}")]
  Version(#[source] rusqlite::Error),
}

// ─── Migrator ────────────────────────────────────────────────────────────────

/// Runs an ordered sequence of [`Migration`]s against a connection.
///
/// The default migrator carries the built-in [`MIGRATIONS`].
#[derive(Debug, Clone)]
pub struct Migrator {
  migrations: Vec<Migration>,
}

impl Default for Migrator {
  fn default() -> Self { Self::new(MIGRATIONS.to_vec()) }
}

impl Migrator {
  pub fn new(migrations: Vec<Migration>) -> Self {
    debug_assert!(
      migrations.windows(2).all(|w| w[0].version < w[1].version),
      "migration versions must be strictly increasing"
    );
    debug_assert!(migrations.iter().all(|m| m.version > 0));
    Self { migrations }
  }

  pub fn migrations(&self) -> &[Migration] { &self.migrations }

  /// The highest declared version, or 0 for an empty sequence.
  pub fn latest_version(&self) -> i64 {
    self.migrations.last().map_or(0, |m| m.version)
  }

  /// The highest applied version. 0 means nothing has been applied yet,
  /// including when the tracking table does not exist.
  pub fn current_version(&self, conn: &Connection) -> Result<i64, MigrationError> {
    read_current_version(conn).map_err(MigrationError::Version)
  }

  /// All recorded migrations, oldest first.
  pub fn applied(
    &self,
    conn: &Connection,
  ) -> Result<Vec<SchemaVersionRecord>, MigrationError> {
    read_applied(conn).map_err(MigrationError::Version)
  }

  /// Apply every declared migration newer than the current version.
  ///
  /// Returns the versions applied by this call; empty when already up to
  /// date. Stops at the first failure. Units committed before the failure
  /// stay applied; the failing unit leaves no trace.
  pub fn run_pending(&self, conn: &mut Connection) -> Result<Vec<i64>, MigrationError> {
    let current = self.current_version(conn)?;
    let pending: Vec<&Migration> = self
      .migrations
      .iter()
      .filter(|m| m.version > current)
      .collect();

    if pending.is_empty() {
      debug!(version = current, "database schema is up to date");
      return Ok(Vec::new());
    }

    info!(
      current,
      pending = pending.len(),
      "running pending migrations"
    );

    let mut applied = Vec::with_capacity(pending.len());
    for migration in pending {
      apply_one(conn, migration).map_err(|source| MigrationError::Apply {
        version: migration.version,
        name: migration.name,
        source,
      })?;
      info!(version = migration.version, name = migration.name, "applied migration");
      applied.push(migration.version);
    }

    Ok(applied)
  }

  /// Revert the most recently applied migration.
  ///
  /// Returns the reverted version, or `None` when nothing is applied. Meant
  /// for development; production only ever migrates forward.
  pub fn rollback_last(&self, conn: &mut Connection) -> Result<Option<i64>, MigrationError> {
    let current = self.current_version(conn)?;
    if current == 0 {
      info!("no migrations to roll back");
      return Ok(None);
    }

    let migration = self
      .migrations
      .iter()
      .find(|m| m.version == current)
      .ok_or(MigrationError::UnknownVersion(current))?;

    revert_one(conn, migration).map_err(|source| MigrationError::Revert {
      version: migration.version,
      name: migration.name,
      source,
    })?;
    info!(version = migration.version, name = migration.name, "rolled back migration");

    Ok(Some(current))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn tracking_table_exists(conn: &Connection) -> rusqlite::Result<bool> {
  conn
    .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'")
    .and_then(|mut stmt| stmt.exists([]))
}

fn read_current_version(conn: &Connection) -> rusqlite::Result<i64> {
  if !tracking_table_exists(conn)? {
    return Ok(0);
  }
  let version: Option<i64> =
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
  Ok(version.unwrap_or(0))
}

fn read_applied(conn: &Connection) -> rusqlite::Result<Vec<SchemaVersionRecord>> {
  if !tracking_table_exists(conn)? {
    return Ok(Vec::new());
  }
  let mut stmt =
    conn.prepare("SELECT version, name, appliedAt FROM schema_migrations ORDER BY version")?;
  let rows = stmt
    .query_map([], |row| {
      Ok(SchemaVersionRecord {
        version:    row.get(0)?,
        name:       row.get(1)?,
        applied_at: row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn apply_one(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  (migration.apply)(&tx)?;

  // The tracking table only exists once the first unit has created it.
  if tracking_table_exists(&tx)? {
    tx.execute(
      "INSERT INTO schema_migrations (version, name, appliedAt) VALUES (?1, ?2, ?3)",
      params![migration.version, migration.name, Utc::now().timestamp()],
    )?;
  }

  tx.commit()
}

fn revert_one(conn: &mut Connection, migration: &Migration) -> rusqlite::Result<()> {
  let tx = conn.transaction()?;
  (migration.revert)(&tx)?;

  // Reverting the first unit drops the tracking table along with its rows.
  if tracking_table_exists(&tx)? {
    tx.execute(
      "DELETE FROM schema_migrations WHERE version = ?1",
      params![migration.version],
    )?;
  }

  tx.commit()
}
