//! Runtime configuration: which store backend to use and how to render.
//!
//! Values come from an optional JSON file and are then overridden by
//! environment variables:
//!
//! | variable               | field            |
//! |------------------------|------------------|
//! | `LEDGER_STORE`         | `store`          |
//! | `LEDGER_DATA_PATH`     | `data_path`      |
//! | `LEDGER_CURRENCY`      | `currency_label` |
//! | `LEDGER_MESSAGE_LIMIT` | `message_limit`  |
//! | `LEDGER_LOG_LEVEL`     | `log_level`      |

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default output channel limit (Telegram message length).
pub const DEFAULT_MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Persistence backend behind the entry store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    JsonFile,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "json_file" | "json" | "file" => Ok(StoreBackend::JsonFile),
            _ => Err(ConfigError::InvalidValue {
                key: "store",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreBackend,
    pub data_path: PathBuf,
    /// Suffix for rendered amounts; empty for none.
    pub currency_label: String,
    pub message_limit: usize,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::JsonFile,
            data_path: PathBuf::from("ledger_data.json"),
            currency_label: String::new(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load from `path` (if given) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides looked up through `lookup` (normally the process
    /// environment).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(store) = lookup("LEDGER_STORE") {
            self.store = store.parse()?;
        }
        if let Some(path) = lookup("LEDGER_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(label) = lookup("LEDGER_CURRENCY") {
            self.currency_label = label;
        }
        if let Some(limit) = lookup("LEDGER_MESSAGE_LIMIT") {
            self.message_limit = limit.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "message_limit",
                value: limit.clone(),
            })?;
        }
        if let Some(level) = lookup("LEDGER_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // Room for at least the "..." truncation marker plus one character.
        if self.message_limit < 4 {
            return Err(ConfigError::InvalidValue {
                key: "message_limit",
                value: self.message_limit.to_string(),
            });
        }
        if self.store == StoreBackend::JsonFile && self.data_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "data_path",
                value: String::new(),
            });
        }
        Ok(())
    }
}
