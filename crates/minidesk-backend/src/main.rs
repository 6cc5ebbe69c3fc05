//! `minidesk-backend` binary.
//!
//! Reads `minidesk.toml` (or the path given with `--config`), opens the SQLite
//! database, runs pending migrations, and serves document requests as
//! newline-delimited JSON on stdin/stdout. Logs go to stderr.
//!
//! ```
//! minidesk-backend --store-path ~/.minidesk/minidesk.db
//! minidesk-backend --store-path ./dev.db status
//! ```

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use minidesk_backend::{BackendConfig, DEFAULT_CONFIG_FILE, first_error};
use minidesk_ipc::DocumentHandlers;
use minidesk_store_sqlite::Database;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Minidesk document backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  /// SQLite database file. Overrides `store_path` from config and env.
  #[arg(long, value_name = "PATH")]
  store_path: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
  /// Serve requests on stdin/stdout until EOF (default).
  #[default]
  Serve,
  /// Apply pending migrations and print the schema version.
  Migrate,
  /// Revert the most recently applied migration. Development only.
  Rollback,
  /// Print the current and latest schema versions.
  Status,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
  // stdout carries the protocol, so logs must not.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match run(Cli::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{e:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  let cfg = BackendConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?
    .with_store_path(cli.store_path);

  if let Some(parent) = cfg.store_path.as_deref().and_then(|p| p.parent())
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create data directory {parent:?}"))?;
  }

  let command = cli.command.unwrap_or_default();

  // Migrations run here, so nothing is served before they have succeeded.
  // The development commands inspect the schema as it is on disk instead.
  let mut db = Database::new().with_auto_migrate(command.migrates_on_open());
  db.initialize(cfg.store_path.as_deref())
    .await
    .with_context(|| format!("failed to initialize database at {:?}", cfg.store_path))?;

  let result = match command {
    Command::Serve => serve(&db, &cfg).await,
    Command::Migrate => migrate(&db).await,
    Command::Rollback => rollback(&db).await,
    Command::Status => status(&db).await,
  };

  let closed = db.close().await.context("failed to close database");
  first_error(result, closed)
}

impl Command {
  fn migrates_on_open(self) -> bool { matches!(self, Self::Serve | Self::Migrate) }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn serve(db: &Database, cfg: &BackendConfig) -> anyhow::Result<()> {
  let handlers = DocumentHandlers::new(Arc::new(db.documents()?))
    .with_timeout(cfg.request_timeout());

  tracing::info!(timeout = ?cfg.request_timeout(), "serving on stdio");
  let stdin = tokio::io::BufReader::new(tokio::io::stdin());
  let served = minidesk_ipc::serve(stdin, tokio::io::stdout(), &handlers)
    .await
    .context("transport failed")?;

  tracing::info!(served, "shutting down");
  Ok(())
}

async fn migrate(db: &Database) -> anyhow::Result<()> {
  println!("schema version {}", db.current_version().await?);
  Ok(())
}

async fn rollback(db: &Database) -> anyhow::Result<()> {
  match db.rollback_last().await? {
    Some(version) => println!("reverted migration {version}"),
    None => println!("nothing to revert"),
  }
  println!("schema version {}", db.current_version().await?);
  Ok(())
}

async fn status(db: &Database) -> anyhow::Result<()> {
  let current = db.current_version().await?;
  let latest = db.migrator().latest_version();
  println!("current {current}, latest {latest}");
  for record in db.applied_migrations().await? {
    println!("  v{} {} (applied {})", record.version, record.name, record.applied_at);
  }
  Ok(())
}
