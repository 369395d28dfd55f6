//! # Tally Terminal Library
//!
//! Text-mode point of sale on top of `tally-core` and `tally-db`.
//!
//! ## Module Organization
//! ```text
//! tally_terminal/
//! ├── lib.rs          ◄─── You are here (logging & startup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── config.rs   ◄─── Layered configuration
//! ├── commands/
//! │   ├── cart.rs     ◄─── Cart edits for the checkout screen
//! │   ├── sale.rs     ◄─── Finalize, receipts, history, delete
//! │   ├── product.rs  ◄─── Catalog lookup, edits, stock movements
//! │   ├── customer.rs ◄─── Customer records
//! │   └── backup.rs   ◄─── Database snapshot
//! ├── scan.rs         ◄─── Scan dispatcher and focus keeper
//! ├── menu/           ◄─── Numbered menus and the checkout loop
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod menu;
pub mod scan;
pub mod state;

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use menu::{App, Console, MenuError};
use state::{ConfigError, ConfigState, DbState};

/// Log filter used when neither `--log` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn,tally=info,sqlx=warn";

/// Startup and shutdown failures.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot open database: {0}")]
    Database(#[from] tally_db::DbError),

    #[error("No database path configured and no home directory found")]
    NoDatabasePath,

    #[error(transparent)]
    Menu(#[from] MenuError),
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so they don't interleave with the menu on stdout.
///
/// ## Filter Precedence
/// 1. `filter` (the `--log` flag)
/// 2. `RUST_LOG`
/// 3. [`DEFAULT_LOG_FILTER`]
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the configured database and runs the menu on `console`.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Resolve database path ── --db, else config, else data folder       │
/// │  2. Connect ──────────────── WAL, busy timeout, run migrations         │
/// │  3. Main menu ────────────── until Exit or end of input                │
/// │  4. Backup on exit ───────── if enabled; failure is only logged        │
/// │  5. Close pool ───────────── checkpoint WAL                            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run<W: Write>(
    mut config: ConfigState,
    db_override: Option<PathBuf>,
    console: &mut Console<W>,
) -> Result<(), TerminalError> {
    let db_path = db_override
        .or_else(|| config.resolved_database_path())
        .ok_or(TerminalError::NoDatabasePath)?;
    info!(path = %db_path.display(), store = %config.store_name, "Starting Tally POS");
    // Backups default to a folder next to the database actually opened.
    config.database_path = Some(db_path.clone());

    let db = DbState::open(&db_path).await?;
    let app = App::new(db, config);

    let result = menu::run(&app, console).await;

    if app.config.backup_on_exit {
        match commands::backup::backup_database(&app.db, &app.config).await {
            Ok(backup) => info!(path = %backup.path, "Exit backup written"),
            Err(e) => warn!(error = %e, "Exit backup failed"),
        }
    }

    app.db.inner().close().await;
    info!("Tally POS stopped");

    Ok(result?)
}
