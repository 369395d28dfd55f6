//! # Tally Terminal Entry Point
//!
//! ```text
//! tally [--db <path>] [--config <path>] [--log <filter>]
//! ```
//!
//! ## Startup Sequence
//! 1. Parse flags
//! 2. Initialize tracing (stderr)
//! 3. Load configuration (defaults → file → `TALLY_*` env → flags)
//! 4. Open the database and run the menu on stdin/stdout

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use tally_terminal::menu::{spawn_stdin_reader, Console};
use tally_terminal::state::ConfigState;

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Tally POS text terminal")]
struct Args {
    /// SQLite database file (overrides config and TALLY_DB_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Config file (default: tally.toml in the platform config folder)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "tally=debug,sqlx=info"
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    tally_terminal::init_tracing(args.log.as_deref());

    let config = match ConfigState::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration failed");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut console = Console::new(spawn_stdin_reader(), std::io::stdout());
    match tally_terminal::run(config, args.db, &mut console).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Tally POS failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
