//! Runtime configuration loaded from environment variables.
//!
//! # Responsibility
//! - Resolve database location, logging and cache settings.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are rejected.
//! - Loading never mutates the process environment.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "KEYSTORE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "KEYSTORE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "KEYSTORE_LOG_DIR";
pub const ENV_OAUTH_CACHE: &str = "KEYSTORE_OAUTH_CACHE";

const DEFAULT_DB_FILE_NAME: &str = "keystore.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Keystore process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    /// Put the flushable cache in front of OAuth config reads.
    pub oauth_cache: bool,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            oauth_cache: true,
        }
    }
}

impl KeystoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let log_dir = match non_empty(ENV_LOG_DIR) {
            Some(value) => {
                let path = PathBuf::from(value.trim());
                if !path.is_absolute() {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LOG_DIR,
                        value,
                        reason: "must be an absolute path",
                    });
                }
                Some(path)
            }
            None => None,
        };

        let oauth_cache = match non_empty(ENV_OAUTH_CACHE) {
            Some(value) => parse_flag(ENV_OAUTH_CACHE, value)?,
            None => defaults.oauth_cache,
        };

        Ok(Self {
            db_path: non_empty(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_empty(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir,
            oauth_cache,
        })
    }
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true|false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KeystoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_OAUTH_CACHE};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(vars: &[(&str, &str)]) -> Result<KeystoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        KeystoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(load(&[]).unwrap(), KeystoreConfig::default());
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = load(&[
            (ENV_DB_PATH, "/var/lib/keystore/db.sqlite3"),
            (ENV_OAUTH_CACHE, "off"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/keystore/db.sqlite3"));
        assert!(!config.oauth_cache);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = load(&[(ENV_OAUTH_CACHE, "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_OAUTH_CACHE));

        let err = load(&[(ENV_LOG_DIR, "logs")]).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }
}
