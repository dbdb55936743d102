//! Runtime configuration resolved from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `TABNOTE_DB_PATH` | `<temp>/tabnote/tabnote.sqlite3` |
//! | `TABNOTE_LOG_LEVEL` | `debug` in debug builds, `info` otherwise |
//! | `TABNOTE_LOG_DIR` | `<temp>/tabnote/logs` |
//! | `TABNOTE_PRIVATE_GROUP` | `Recipe` |
//!
//! Blank values fall back to the default.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::logging::{default_log_level, normalize_level};
use crate::model::snapshot::DEFAULT_PRIVATE_GROUP_NAME;

pub const ENV_DB_PATH: &str = "TABNOTE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TABNOTE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TABNOTE_LOG_DIR";
pub const ENV_PRIVATE_GROUP: &str = "TABNOTE_PRIVATE_GROUP";

const DATA_DIR_NAME: &str = "tabnote";
const DB_FILE_NAME: &str = "tabnote.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    /// `TABNOTE_LOG_DIR` must be absolute.
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(level) => {
                write!(f, "{ENV_LOG_LEVEL}=`{level}` is not a supported level")
            }
            Self::RelativeLogDir(path) => {
                write!(f, "{ENV_LOG_DIR}=`{}` must be absolute", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to open a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: PathBuf,
    /// Name of the group hidden from the group bar and from backups.
    pub private_group_name: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = std::env::temp_dir().join(DATA_DIR_NAME);
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: data_dir.join("logs"),
            private_group_name: DEFAULT_PRIVATE_GROUP_NAME.to_string(),
        }
    }
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|_| ConfigError::UnsupportedLogLevel(level))?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = dir;
        }
        if let Some(name) = read(ENV_PRIVATE_GROUP) {
            config.private_group_name = name;
        }
        Ok(config)
    }

    /// Creates the directory holding `db_path` when missing.
    pub fn ensure_db_dir(&self) -> std::io::Result<()> {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}
