//! # Backup Command

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ErrorCode};
use crate::state::{ConfigState, DbState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupResponse {
    pub path: String,
}

/// Writes a snapshot of the database into the configured backup folder.
pub async fn backup_database(db: &DbState, config: &ConfigState) -> Result<BackupResponse, ApiError> {
    let dir = config.resolved_backup_dir().ok_or_else(|| {
        ApiError::new(
            ErrorCode::Internal,
            "No backup folder configured and no home directory found",
        )
    })?;
    debug!(dir = %dir.display(), "backup_database command");

    let path = db.inner().backup_to(&dir).await?;
    Ok(BackupResponse {
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_backup_lands_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let config = ConfigState {
            backup_dir: Some(dir.path().join("snapshots")),
            ..ConfigState::default()
        };

        let response = backup_database(&db, &config).await.unwrap();

        assert!(response.path.starts_with(&dir.path().join("snapshots").display().to_string()));
        assert!(std::path::Path::new(&response.path).exists());
    }
}
