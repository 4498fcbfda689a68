//! Configuration System
//!
//! Loads server settings from a TOML file with `CHRONICLE_*` environment
//! variable overrides.

use crate::bucket::TimeframeTable;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bucket storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the `<Symbol>/<Timeframe>/<AttributeGroup>.csv` tree seeded at startup
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Timeframes storage materializes
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("chronicle-query").to_string_lossy().to_string())
        .unwrap_or_else(|| "./chronicle_data".to_string())
}

fn default_timeframes() -> Vec<String> {
    vec!["1Min".to_string(), "1H".to_string(), "1D".to_string()]
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timeframes: default_timeframes(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5993
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Query service settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `UTC` or a fixed `+HH:MM` / `-HH:MM` offset
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chronicle-query").join("config.toml")),
            Some(PathBuf::from("/etc/chronicle-query/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(data_dir) = var("CHRONICLE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Some(host) = var("CHRONICLE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("CHRONICLE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Some(timezone) = var("CHRONICLE_TIMEZONE") {
            self.server.timezone = timezone;
        }

        if let Some(level) = var("CHRONICLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("CHRONICLE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// The configured timezone as a fixed offset
    pub fn timezone(&self) -> Result<FixedOffset, ConfigError> {
        parse_timezone(&self.server.timezone)
    }

    /// The configured materialized timeframes
    pub fn timeframe_table(&self) -> Result<TimeframeTable, ConfigError> {
        TimeframeTable::from_names(self.storage.timeframes.as_slice())
            .map_err(|e| ConfigError::Timeframes(e.to_string()))
    }
}

/// Parse `UTC`/`Z` or a `+HH:MM` offset
pub fn parse_timezone(s: &str) -> Result<FixedOffset, ConfigError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s == "Z" {
        return Ok(Utc.fix());
    }

    let invalid = || ConfigError::Timezone(s.to_string());
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid timezone {0:?}, expected UTC or +HH:MM")]
    Timezone(String),

    #[error("Invalid storage timeframes: {0}")]
    Timeframes(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Chronicle Query Configuration
#
# Environment variables override these settings:
# - CHRONICLE_DATA_DIR
# - CHRONICLE_API_HOST
# - CHRONICLE_API_PORT
# - CHRONICLE_TIMEZONE
# - CHRONICLE_LOG_LEVEL
# - CHRONICLE_LOG_FORMAT

[storage]
# Bucket files laid out as <Symbol>/<Timeframe>/<AttributeGroup>.csv
data_dir = "~/.local/share/chronicle-query"

# Timeframes storage materializes; coarser requests are served from these
timeframes = ["1Min", "1H", "1D"]

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 5993

[server]
# Timezone used to interpret request time ranges: UTC or +HH:MM
timezone = "UTC"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/chronicle-query/server.log"
"#
    .to_string()
}
