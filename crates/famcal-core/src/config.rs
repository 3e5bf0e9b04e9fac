//! Configuration management
//!
//! Configuration is read in this order of priority:
//! 1. Environment variables
//! 2. `famcal.toml` configuration file
//! 3. Defaults
//!
//! Inside the configuration file, `${VAR_NAME}` is replaced with the value of
//! the environment variable of that name.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Default conflict-scan lookahead: seven days
pub const DEFAULT_WINDOW_HOURS: i64 = 168;

/// Main configuration for famcal
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Conflict scanner configuration
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:8081"])
    /// If empty, any origin is allowed
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Lookahead used when a request does not name one
    #[serde(default = "default_window_hours")]
    pub default_window_hours: i64,

    /// Channel recorded on conflict notifications
    #[serde(default = "default_notification_channel")]
    pub notification_channel: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            default_window_hours: default_window_hours(),
            notification_channel: default_notification_channel(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled
    pub enabled: bool,

    /// Path to the schedule file
    pub config_path: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_path: None,
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "data/famcal.db".to_string()
}

fn default_window_hours() -> i64 {
    DEFAULT_WINDOW_HOURS
}

fn default_notification_channel() -> String {
    "push".to_string()
}

impl Config {
    /// Expand `${VAR_NAME}` references to environment variable values.
    ///
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables still take precedence over file values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Parse configuration from TOML text after `${VAR}` expansion
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self::from_toml_config(config))
    }

    /// Load configuration from the default location
    ///
    /// Uses `./famcal.toml` when present, otherwise environment variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("famcal.toml").exists() {
            return Self::from_toml_file("famcal.toml");
        }

        Self::from_env()
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let api = toml.api.unwrap_or_default();
        let database = toml.database.unwrap_or_default();
        let scanner = toml.scanner.unwrap_or_default();
        let scheduler = toml.scheduler.unwrap_or_default();

        Config {
            api: ApiConfig {
                port: api.port.unwrap_or_else(default_api_port),
                allowed_origins: api.allowed_origins,
            },
            database: DatabaseConfig {
                db_path: database.db_path.unwrap_or_else(default_db_path),
            },
            scanner: ScannerConfig {
                default_window_hours: scanner
                    .default_window_hours
                    .unwrap_or_else(default_window_hours),
                notification_channel: scanner
                    .notification_channel
                    .unwrap_or_else(default_notification_channel),
            },
            scheduler: SchedulerConfig {
                enabled: scheduler.enabled.unwrap_or(true),
                config_path: scheduler.config_path,
            },
        }
    }

    /// Override values from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            if !path.is_empty() {
                self.database.db_path = path;
            }
        }

        if let Ok(hours) = std::env::var("SCAN_WINDOW_HOURS") {
            if let Ok(h) = hours.parse() {
                self.scanner.default_window_hours = h;
            }
        }
        if let Ok(channel) = std::env::var("NOTIFICATION_CHANNEL") {
            if !channel.is_empty() {
                self.scanner.notification_channel = channel;
            }
        }

        if let Ok(enabled) = std::env::var("SCHEDULE_ENABLED") {
            self.scheduler.enabled = enabled.to_lowercase() != "false";
        }
        if let Ok(path) = std::env::var("SCHEDULE_CONFIG_PATH") {
            self.scheduler.config_path = Some(path);
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.scanner.default_window_hours <= 0 {
            return Err(Error::Config(format!(
                "scanner.default_window_hours must be positive, got {}",
                self.scanner.default_window_hours
            )));
        }
        if self.scanner.notification_channel.trim().is_empty() {
            return Err(Error::Config(
                "scanner.notification_channel must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    api: Option<TomlApiConfig>,
    database: Option<TomlDatabaseConfig>,
    scanner: Option<TomlScannerConfig>,
    scheduler: Option<TomlSchedulerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDatabaseConfig {
    #[serde(default)]
    db_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlScannerConfig {
    #[serde(default)]
    default_window_hours: Option<i64>,
    #[serde(default)]
    notification_channel: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlSchedulerConfig {
    enabled: Option<bool>,
    config_path: Option<String>,
}
