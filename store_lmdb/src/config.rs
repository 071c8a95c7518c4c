//! Store configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::LmdbError;

/// Configuration forwarded to [`crate::LmdbEnvironment::open`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// LMDB map size in bytes (upper bound on the database size).
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Keep the database in a private scratch directory that is removed when
    /// the environment is dropped.
    #[serde(default)]
    pub memory_only: bool,

    /// Erase all existing entries when opening.
    #[serde(default)]
    pub wipe: bool,

    /// Store identifier; the subdirectory of the data dir holding the files.
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_cache_size() -> usize {
    64 * 1024 * 1024
}

fn default_name() -> String {
    "referrals".to_string()
}

impl StoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LmdbError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LmdbError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LmdbError> {
        toml::from_str(s).map_err(|e| LmdbError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("StoreConfig is always serializable to TOML")
    }

    /// A throwaway configuration for tests and tools.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            memory_only: true,
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            memory_only: false,
            wipe: false,
            name: default_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = StoreConfig::default();
        let parsed = StoreConfig::from_toml_str(&config.to_toml_string()).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = StoreConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.cache_size, 64 * 1024 * 1024);
        assert_eq!(config.name, "referrals");
        assert!(!config.memory_only);
        assert!(!config.wipe);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            wipe = true
            name = "referrals_regtest"
        "#;
        let config = StoreConfig::from_toml_str(toml).expect("should parse");
        assert!(config.wipe);
        assert_eq!(config.name, "referrals_regtest");
        assert_eq!(config.cache_size, 64 * 1024 * 1024);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = StoreConfig::from_toml_str("cache_size = \"big\"").unwrap_err();
        assert!(matches!(err, LmdbError::Config(_)));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let err = StoreConfig::from_toml_file("/nonexistent/refdb.toml").unwrap_err();
        assert!(matches!(err, LmdbError::Config(_)));
    }
}
