//! # Inventory Configuration
//!
//! Where the database lives and how the pool is sized.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INVENTORY_DB_PATH=/tmp/inventory.db                                │
//! │     INVENTORY_DB_MAX_CONNECTIONS=4                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/inventory/inventory.toml (Linux)                         │
//! │     ~/Library/Application Support/com.example.inventory/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     <platform data dir>/inventory.db                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # inventory.toml
//! [database]
//! path = "/var/lib/inventory/inventory.db"   # or ":memory:"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::pool::DbConfig;

/// File name of the database inside the platform data directory.
pub const DEFAULT_DB_FILE: &str = "inventory.db";

/// File name of the config inside the platform config directory.
pub const DEFAULT_CONFIG_FILE: &str = "inventory.toml";

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Could not determine a data directory for the database")]
    MissingDataDir,
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept open while idle.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a free connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Inventory Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl InventoryConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (inventory.toml), if present
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load), reading overrides from `lookup`
    /// instead of the process environment.
    pub fn load_with(
        config_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading inventory config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Applies overrides from a key lookup (the environment, in production).
    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup("INVENTORY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("INVENTORY_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .parse()
                .map_err(|_| ConfigError::InvalidValue("INVENTORY_DB_MAX_CONNECTIONS".into()))?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".into()));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue("database.min_connections".into()));
        }

        Ok(())
    }

    /// Builds the pool configuration.
    ///
    /// A path of `:memory:` selects the in-memory preset.
    pub fn to_db_config(&self) -> Result<DbConfig, ConfigError> {
        let path = match &self.database.path {
            Some(path) => path.clone(),
            None => Self::default_database_path().ok_or(ConfigError::MissingDataDir)?,
        };

        let config = DbConfig::new(path);
        if config.is_in_memory() {
            return Ok(DbConfig::in_memory());
        }

        Ok(config
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs)))
    }

    /// Returns the default database path.
    pub fn default_database_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "example", "inventory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InventoryConfig::default();
        assert_eq!(config.database.path, None);
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("inventory.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[database]\npath = \"/data/inv.db\"\nmax_connections = 3\n",
        );

        let config = InventoryConfig::load_with(Some(path), env(&[])).unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/data/inv.db")));
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.database.min_connections, 1);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[database]\npath = \"/data/inv.db\"\nmax_connections = 3\nconnect_timeout_secs = 7\n",
        );

        let config = InventoryConfig::load_with(
            Some(path),
            env(&[
                ("INVENTORY_DB_PATH", "/tmp/from-env.db"),
                ("INVENTORY_DB_MAX_CONNECTIONS", "9"),
            ]),
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/from-env.db")));
        assert_eq!(config.database.max_connections, 9);
        // Untouched by the environment.
        assert_eq!(config.database.connect_timeout_secs, 7);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = InventoryConfig::load_with(Some(path), env(&[])).unwrap();
        assert_eq!(config, InventoryConfig::default());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[database\nmax_connections = \"many\"\n");

        let err = InventoryConfig::load_with(Some(path), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }

    #[test]
    fn test_loaded_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[database]\nmax_connections = 0\n");

        let err = InventoryConfig::load_with(Some(path), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: InventoryConfig = toml::from_str("").unwrap();
        assert_eq!(config, InventoryConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = InventoryConfig::default();
        config
            .apply_overrides(env(&[
                ("INVENTORY_DB_PATH", "/tmp/override.db"),
                ("INVENTORY_DB_MAX_CONNECTIONS", "2"),
            ]))
            .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.database.max_connections, 2);
    }

    #[test]
    fn test_bad_env_value_rejected() {
        let mut config = InventoryConfig::default();
        let err = config
            .apply_overrides(env(&[("INVENTORY_DB_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = InventoryConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database.max_connections = 2;
        config.database.min_connections = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_db_config() {
        let mut config = InventoryConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/inv.db"));
        config.database.max_connections = 8;

        let db = config.to_db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/inv.db"));
        assert_eq!(db.max_connections, 8);
        assert_eq!(db.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_memory_path_selects_in_memory_preset() {
        let mut config = InventoryConfig::default();
        config.database.path = Some(PathBuf::from(":memory:"));

        assert_eq!(config.to_db_config().unwrap(), DbConfig::in_memory());
    }

    #[test]
    fn test_toml_serialization() {
        let config = InventoryConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
    }
}
