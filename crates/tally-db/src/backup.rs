//! # Backups
//!
//! Point-in-time copies of the database file, named
//! `pos_YYYYMMDD_HHMMSS.db`.
//!
//! `VACUUM INTO` writes a consistent snapshot even while WAL holds
//! uncheckpointed pages, which a plain file copy would miss.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::pool::Database;

impl Database {
    /// Writes a snapshot into `dir` (created if missing) and returns its path.
    pub async fn backup_to(&self, dir: &Path) -> DbResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .map_err(|e| DbError::BackupFailed(format!("{}: {e}", dir.display())))?;

        let target = unused_backup_path(dir, &Local::now().format("pos_%Y%m%d_%H%M%S").to_string());
        let target_str = target
            .to_str()
            .ok_or_else(|| DbError::BackupFailed(format!("non UTF-8 path {}", target.display())))?;

        sqlx::query("VACUUM INTO ?1")
            .bind(target_str)
            .execute(self.pool())
            .await
            .map_err(|e| DbError::BackupFailed(e.to_string()))?;

        info!(path = %target.display(), "Database backup written");
        Ok(target)
    }
}

/// `<stem>.db`, or `<stem>_N.db` when a backup already exists for this second.
fn unused_backup_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.db"));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}.db")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
