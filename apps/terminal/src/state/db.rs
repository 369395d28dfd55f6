//! # Database State
//!
//! Wraps the `Database` handle shared by the menu and the scan workers.
//!
//! ## Thread Safety
//! `Database` holds a `SqlitePool`, which is thread-safe and cheap to clone.
//! Scan workers get their own clone; no explicit locking.

use std::path::Path;

use tally_db::{Database, DbConfig, DbResult};
use tracing::info;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                tally_db::DbError::ConnectionFailed(format!("{}: {e}", parent.display()))
            })?;
        }

        let db = Database::new(DbConfig::new(path)).await?;
        info!(path = %path.display(), "Database connected and migrations applied");
        Ok(DbState::new(db))
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
