//! # Configuration State
//!
//! Stores terminal configuration loaded at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`--config <path>`, else `tally.toml` in the platform
//!    config folder)
//! 3. Environment variables (`TALLY_*`)
//! 4. Command line flags (applied by `main`)
//!
//! ```toml
//! # tally.toml
//! store_name = "Corner Shop"
//! currency_symbol = "€"
//! database_path = "/var/lib/tally/tally.db"
//! focus_interval_ms = 500
//! ```
//!
//! Read-only after startup, so no lock.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tally_core::{Money, DEFAULT_SEARCH_LIMIT};
use thiserror::Error;
use tracing::{debug, info};

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but can't be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ConfigState`].
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value is out of range after all sources were applied.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Terminal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Store name (printed on receipts)
    pub store_name: String,

    /// Currency symbol (for display). Amounts always carry two decimals.
    pub currency_symbol: String,

    /// SQLite file. `None` means the platform data folder.
    pub database_path: Option<PathBuf>,

    /// Where backups go. `None` means `backups/` next to the database.
    pub backup_dir: Option<PathBuf>,

    /// Write a backup when the terminal exits.
    pub backup_on_exit: bool,

    /// How often the scan prompt is re-armed while the focus lock is on.
    pub focus_interval_ms: u64,

    /// Upper bound on one scan lookup.
    pub lookup_timeout_ms: u64,

    /// Maximum search candidates shown.
    pub search_limit: u32,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Tally POS".to_string(),
            currency_symbol: "$".to_string(),
            database_path: None,
            backup_dir: None,
            backup_on_exit: true,
            focus_interval_ms: 500,
            lookup_timeout_ms: 2000,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl ConfigState {
    /// Loads configuration from defaults, file and environment.
    ///
    /// An explicit `config_path` that does not exist is an error; the
    /// default location is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                other => {
                    debug!(path = ?other, "No config file, using defaults");
                    ConfigState::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies `TALLY_*` overrides. Unparseable numbers are ignored.
    ///
    /// ## Environment Variables
    /// - `TALLY_DB_PATH`: database file
    /// - `TALLY_STORE_NAME`: store name
    /// - `TALLY_BACKUP_DIR`: backup folder
    /// - `TALLY_FOCUS_INTERVAL_MS`: focus keeper period
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = var("TALLY_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(dir) = var("TALLY_BACKUP_DIR") {
            self.backup_dir = Some(PathBuf::from(dir));
        }

        if let Some(ms) = var("TALLY_FOCUS_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.focus_interval_ms = ms;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.focus_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "focus_interval_ms must be greater than 0".into(),
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "lookup_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid(
                "search_limit must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// `tally.toml` in the platform config folder.
    ///
    /// - **Linux**: `~/.config/tally-pos/tally.toml`
    /// - **macOS**: `~/Library/Application Support/com.tally.tally-pos/tally.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tally", "tally-pos").map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    /// Resolved database file.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.tally.tally-pos/tally.db`
    /// - **Windows**: `%APPDATA%\tally\tally-pos\data\tally.db`
    /// - **Linux**: `~/.local/share/tally-pos/tally.db`
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(|| {
            ProjectDirs::from("com", "tally", "tally-pos").map(|dirs| dirs.data_dir().join("tally.db"))
        })
    }

    /// Resolved backup folder.
    pub fn resolved_backup_dir(&self) -> Option<PathBuf> {
        self.backup_dir.clone().or_else(|| {
            self.resolved_database_path()
                .and_then(|db| db.parent().map(|dir| dir.join("backups")))
        })
    }

    pub fn focus_interval(&self) -> Duration {
        Duration::from_millis(self.focus_interval_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        Money::from_cents(cents).format_with(&self.currency_symbol)
    }
}
