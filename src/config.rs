//! Application configuration
//!
//! Read from `config.toml` in the data directory. Every field is optional;
//! anything missing falls back to a default under the same directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = "wordhoard";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_QUIZ_SIZE: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {}: {}", .path.display(), .source)]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not determine a data directory")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root holding `decks/index.json`
    pub catalog_dir: Option<PathBuf>,
    /// SQLite database file
    pub database_path: Option<PathBuf>,
    /// Entries per quiz session
    pub quiz_size: Option<usize>,
}

impl AppConfig {
    /// Load `path`, or the default location when `None`.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => data_dir()?.join(CONFIG_FILE),
        };
        if !path.exists() {
            log::debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?;
        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn catalog_dir(&self) -> Result<PathBuf> {
        match &self.catalog_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("catalog")),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("study.db")),
        }
    }

    pub fn quiz_size(&self) -> usize {
        self.quiz_size.filter(|n| *n > 0).unwrap_or(DEFAULT_QUIZ_SIZE)
    }
}

/// `<local data dir>/wordhoard`
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::DataDirNotFound)
}
