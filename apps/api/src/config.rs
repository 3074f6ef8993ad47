//! # API Configuration
//!
//! Layered configuration for the HTTP service.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SPLITBILL_PORT=9000                                                │
//! │     SPLITBILL_DATABASE_PATH=/var/lib/splitbill/splitbill.db            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SPLITBILL_CONFIG, else                                            │
//! │     ~/.config/splitbill/splitbill.toml (Linux)                         │
//! │     ~/Library/Application Support/com.splitbill.splitbill/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:8080, ./splitbill.db, log filter "info"                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [database]
//! path = "splitbill.db"
//! max_connections = 5
//!
//! [logging]
//! filter = "info,splitbill_db=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use splitbill_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Where the HTTP listener binds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// SQLite file and pool size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("splitbill.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `tracing-subscriber` filter directive used when `SPLITBILL_LOG` and
/// `RUST_LOG` are unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Rejects settings the service cannot start with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("port must be greater than 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database path is required".into()));
        }

        Ok(())
    }

    /// Applies `SPLITBILL_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SPLITBILL_HOST") {
            debug!(host = %host, "Overriding host from environment");
            self.server.host = host;
        }

        if let Some(port) = lookup("SPLITBILL_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(port = %port, "Ignoring invalid SPLITBILL_PORT"),
            }
        }

        if let Some(path) = lookup("SPLITBILL_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("SPLITBILL_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid SPLITBILL_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = lookup("SPLITBILL_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "splitbill", "splitbill")
            .map(|dirs| dirs.config_dir().join("splitbill.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Pool settings for [`splitbill_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ApiConfig = toml::from_str(
            r#"
            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("splitbill.db"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SPLITBILL_HOST", "127.0.0.1"),
            ("SPLITBILL_PORT", "3000"),
            ("SPLITBILL_DATABASE_PATH", "/tmp/bills.db"),
            ("SPLITBILL_DB_MAX_CONNECTIONS", "not-a-number"),
            ("SPLITBILL_LOG", "debug"),
        ]);

        let mut config = ApiConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.database.path, PathBuf::from("/tmp/bills.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_validation() {
        let mut config = ApiConfig::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.server.port = 8080;
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&ApiConfig::default()).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[database]"));
    }
}
