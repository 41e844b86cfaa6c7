//! Layered configuration with serde defaults.
//!
//! Every field has a default from [`defaults`], so an empty TOML document
//! yields a fully usable configuration and partial documents override only
//! what they name.

pub mod defaults;

mod adaptive_config;
mod storage_config;
mod sync_config;

pub use adaptive_config::AdaptiveConfig;
pub use storage_config::StorageConfig;
pub use sync_config::SyncConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{CardboxError, CardboxResult};

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardboxConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub adaptive: AdaptiveConfig,
    /// Log filter applied when the caller uses [`crate::logging::init`].
    pub log_level: LogLevelConfig,
}

/// Wrapper so the log level serializes as a plain string field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLevelConfig(pub String);

impl Default for LogLevelConfig {
    fn default() -> Self {
        Self(defaults::DEFAULT_LOG_LEVEL.to_string())
    }
}

impl CardboxConfig {
    /// Parse a TOML document; missing fields fall back to defaults.
    pub fn from_toml(s: &str) -> CardboxResult<Self> {
        toml::from_str(s).map_err(|e| CardboxError::Config {
            reason: format!("parse: {e}"),
        })
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> CardboxResult<String> {
        toml::to_string_pretty(self).map_err(|e| CardboxError::Config {
            reason: format!("serialize: {e}"),
        })
    }

    /// Load from a file path; a missing file yields all defaults.
    pub fn load(path: &std::path::Path) -> CardboxResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CardboxError::Config {
                reason: format!("read {}: {e}", path.display()),
            }),
        }
    }
}
