//! [`Database`], owner of the process's single SQLite connection.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  migrate::{Migrator, SchemaVersionRecord},
  store::SqliteDocumentStore,
};

/// Path SQLite interprets as a private in-memory database.
const MEMORY_PATH: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Applied to every fresh connection, before migrations run.
const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA foreign_keys = ON;
PRAGMA temp_store = MEMORY;
";

// ─── Database ────────────────────────────────────────────────────────────────

/// Explicit initialize/close lifecycle around one SQLite connection.
///
/// At most one connection is open at a time. [`initialize`](Self::initialize)
/// opens the file, applies pragmas and runs pending migrations, so nothing
/// built from [`documents`](Self::documents) can observe a partially
/// migrated schema.
#[derive(Debug)]
pub struct Database {
  path:         Option<PathBuf>,
  conn:         Option<tokio_rusqlite::Connection>,
  migrator:     Migrator,
  auto_migrate: bool,
}

impl Default for Database {
  fn default() -> Self {
    Self { path: None, conn: None, migrator: Migrator::default(), auto_migrate: true }
  }
}

impl Database {
  /// An uninitialized manager with no path. The first call to
  /// [`initialize`](Self::initialize) must supply one.
  pub fn new() -> Self { Self::default() }

  /// An uninitialized manager that will open `path`.
  pub fn with_path(path: impl Into<PathBuf>) -> Self {
    Self { path: Some(path.into()), ..Self::default() }
  }

  /// Replace the migration sequence run at initialization.
  pub fn with_migrator(mut self, migrator: Migrator) -> Self {
    self.migrator = migrator;
    self
  }

  /// Whether [`initialize`](Self::initialize) runs pending migrations.
  ///
  /// Turned off only by the development migration commands, which must see
  /// the schema as it is on disk. Stores built from an unmigrated manager
  /// may hit missing tables.
  pub fn with_auto_migrate(mut self, auto_migrate: bool) -> Self {
    self.auto_migrate = auto_migrate;
    self
  }

  /// Open (or create) a database at `path` and bring its schema up to date.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let mut db = Self::with_path(path);
    db.initialize(None).await?;
    Ok(db)
  }

  /// Open a fresh in-memory database, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> { Self::open(MEMORY_PATH).await }

  /// Open the connection, apply pragmas and run pending migrations (unless
  /// [`with_auto_migrate(false)`](Self::with_auto_migrate)).
  ///
  /// A supplied `path` replaces the remembered one; `None` reuses it. Calling
  /// this on an open manager is a no-op. If migrations fail the connection is
  /// closed again and the manager stays uninitialized.
  pub async fn initialize(&mut self, path: Option<&Path>) -> Result<()> {
    if self.conn.is_some() {
      debug!("database already initialized");
      return Ok(());
    }

    if let Some(path) = path {
      self.path = Some(path.to_path_buf());
    }
    let path = self.path.clone().ok_or(Error::Configuration)?;

    let conn = open_connection(&path).await?;
    info!(?path, "database opened");

    if !self.auto_migrate {
      debug!("automatic migration disabled");
      self.conn = Some(conn);
      return Ok(());
    }

    let migrator = self.migrator.clone();
    let migrated = conn
      .call(move |conn| Ok(migrator.run_pending(conn)))
      .await
      .map_err(Error::from)
      .and_then(|outcome| outcome.map_err(Error::from));

    match migrated {
      Ok(applied) => {
        info!(applied = applied.len(), "database initialized");
        self.conn = Some(conn);
        Ok(())
      }
      Err(e) => {
        if let Err(close_err) = conn.close().await {
          warn!(error = %close_err, "failed to close database after migration failure");
        }
        Err(e)
      }
    }
  }

  /// The live connection.
  pub fn connection(&self) -> Result<&tokio_rusqlite::Connection> {
    self.conn.as_ref().ok_or(Error::NotInitialized)
  }

  pub fn is_connected(&self) -> bool { self.conn.is_some() }

  /// The path the manager opens, if one has been supplied.
  pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

  /// A document store bound to the live connection.
  pub fn documents(&self) -> Result<SqliteDocumentStore> {
    Ok(SqliteDocumentStore::new(self.connection()?.clone()))
  }

  pub fn migrator(&self) -> &Migrator { &self.migrator }

  /// Apply pending migrations. Returns the versions applied.
  pub async fn run_pending(&self) -> Result<Vec<i64>> {
    let migrator = self.migrator.clone();
    let applied = self
      .connection()?
      .call(move |conn| Ok(migrator.run_pending(conn)))
      .await??;
    Ok(applied)
  }

  /// The highest applied migration version.
  pub async fn current_version(&self) -> Result<i64> {
    let migrator = self.migrator.clone();
    let version = self
      .connection()?
      .call(move |conn| Ok(migrator.current_version(conn)))
      .await??;
    Ok(version)
  }

  /// Every recorded migration, oldest first.
  pub async fn applied_migrations(&self) -> Result<Vec<SchemaVersionRecord>> {
    let migrator = self.migrator.clone();
    let records = self
      .connection()?
      .call(move |conn| Ok(migrator.applied(conn)))
      .await??;
    Ok(records)
  }

  /// Revert the most recently applied migration. Development use only.
  pub async fn rollback_last(&self) -> Result<Option<i64>> {
    let migrator = self.migrator.clone();
    let reverted = self
      .connection()?
      .call(move |conn| Ok(migrator.rollback_last(conn)))
      .await??;
    Ok(reverted)
  }

  /// Release the connection. Safe to call when already closed; a later
  /// [`initialize`](Self::initialize) reopens the remembered path.
  pub async fn close(&mut self) -> Result<()> {
    if let Some(conn) = self.conn.take() {
      conn.close().await?;
      info!("database connection closed");
    }
    Ok(())
  }
}

/// Open `path` and apply [`PRAGMAS`]; any failure is a connection error.
async fn open_connection(path: &Path) -> Result<tokio_rusqlite::Connection> {
  let connection_error = |source| Error::Connection { path: path.to_path_buf(), source };

  let conn = tokio_rusqlite::Connection::open(path)
    .await
    .map_err(connection_error)?;

  conn
    .call(|conn| {
      conn.busy_timeout(BUSY_TIMEOUT)?;
      conn.execute_batch(PRAGMAS)?;
      Ok(())
    })
    .await
    .map_err(connection_error)?;

  Ok(conn)
}
