//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/getgoing/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/getgoing/` (~/.config/getgoing/)
//! - Data: `$XDG_DATA_HOME/getgoing/` (~/.local/share/getgoing/)
//! - State/Logs: `$XDG_STATE_HOME/getgoing/` (~/.local/state/getgoing/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the relational store inside the data directory.
pub const DATABASE_NAME: &str = "getgoing.db";

/// File name of the key-value preferences file inside the data directory.
pub const PREFERENCES_NAME: &str = "preferences.json";

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "GETGOING_API_URL";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote API client settings (reserved, unused by the core)
    #[serde(default)]
    pub api: ApiConfig,
}

/// Database configuration
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Explicit database file path; defaults to `$XDG_DATA_HOME/getgoing/getgoing.db`
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Remote API configuration
///
/// Declared for a future sync client. Nothing in this crate talks to the network.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the remote API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// HTTP request timeout in milliseconds
    #[serde(default = "default_api_timeout")]
    pub timeout_ms: u64,

    /// Max retry attempts for transient failures
    #[serde(default = "default_api_retry_attempts")]
    pub retry_attempts: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_ms: default_api_timeout(),
            retry_attempts: default_api_retry_attempts(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.getgoing.app".to_string()
}

fn default_api_timeout() -> u64 {
    10000
}

fn default_api_retry_attempts() -> usize {
    3
}

impl ApiConfig {
    /// Base URL after applying the `GETGOING_API_URL` override.
    pub fn effective_base_url(&self) -> String {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.is_empty() => url,
            _ => self.base_url.clone(),
        }
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Database file this configuration points at
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Preferences file, kept beside the database
    pub fn resolved_preferences_path(&self) -> PathBuf {
        match self.resolved_database_path().parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(PREFERENCES_NAME),
            _ => PathBuf::from(PREFERENCES_NAME),
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/getgoing/config.toml` (~/.config/getgoing/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("getgoing").join("config.toml")
    }

    /// Returns the data directory path (database and preferences)
    ///
    /// `$XDG_DATA_HOME/getgoing/` (~/.local/share/getgoing/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("getgoing")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/getgoing/` (~/.local/state/getgoing/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("getgoing")
    }

    /// Returns the default database file path
    pub fn database_path() -> PathBuf {
        Self::data_dir().join(DATABASE_NAME)
    }

    /// Returns the key-value preferences file path
    pub fn preferences_path() -> PathBuf {
        Self::data_dir().join(PREFERENCES_NAME)
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/getgoing/getgoing.log` (~/.local/state/getgoing/getgoing.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("getgoing.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.api.base_url, "https://api.getgoing.app");
        assert_eq!(config.api.timeout_ms, 10000);
        assert_eq!(config.api.retry_attempts, 3);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[database]
path = "/tmp/elsewhere.db"

[logging]
level = "debug"

[api]
base_url = "https://staging.getgoing.app"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(
            config.resolved_database_path(),
            PathBuf::from("/tmp/elsewhere.db")
        );
        assert_eq!(
            config.resolved_preferences_path(),
            PathBuf::from("/tmp/preferences.json")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.api.base_url, "https://staging.getgoing.app");
        assert_eq!(config.api.timeout_ms, 10000);
    }

    #[test]
    fn test_database_path_file_name() {
        assert!(Config::database_path().ends_with("getgoing/getgoing.db"));
        assert!(Config::preferences_path().ends_with("getgoing/preferences.json"));
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging\nlevel = ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_url_override() {
        let api = ApiConfig {
            base_url: "https://staging.getgoing.app".to_string(),
            ..ApiConfig::default()
        };

        // One test owns the variable; it is process-wide
        std::env::set_var(API_URL_ENV, "http://localhost:8080");
        assert_eq!(api.effective_base_url(), "http://localhost:8080");

        std::env::set_var(API_URL_ENV, "");
        assert_eq!(api.effective_base_url(), "https://staging.getgoing.app");

        std::env::remove_var(API_URL_ENV);
        assert_eq!(api.effective_base_url(), "https://staging.getgoing.app");
    }
}
