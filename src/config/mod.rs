//! Service configuration
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional JSON file (`--config`)
//! 3. Environment variables
//! 4. CLI flags (applied by the caller)
//!
//! | Var | Default |
//! |---|---|
//! | `STORE_BACKEND` | `memory` |
//! | `REDIS_HOST` | `localhost` |
//! | `REDIS_PORT` | `6379` |
//! | `REDIS_PASSWORD` | unset |
//! | `REDIS_DB` | `0` |
//! | `APP_HOST` | `0.0.0.0` |
//! | `APP_PORT` | `8000` |
//! | `APP_DEBUG` | `true` |
//! | `LOG_FORMAT` | `compact` |

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {var}: '{value}' ({reason})")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVar {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process maps; data is lost on exit
    #[default]
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown store backend '{}', expected memory or redis", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Redis => write!(f, "redis"),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}', expected compact or json", other)),
        }
    }
}

/// Backing store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_store_host")]
    pub host: String,

    #[serde(default = "default_store_port")]
    pub port: u16,

    #[serde(default)]
    pub password: Option<String>,

    /// Database index on the Redis server
    #[serde(default)]
    pub db: i64,
}

fn default_store_host() -> String {
    "localhost".to_string()
}

fn default_store_port() -> u16 {
    6379
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: default_store_host(),
            port: default_store_port(),
            password: None,
            db: 0,
        }
    }
}

impl StoreConfig {
    /// Connection URL: `redis://[:password@]host:port/db`
    pub fn url(&self) -> String {
        match &self.password {
            Some(pw) => format!("redis://:{}@{}:{}/{}", pw, self.host, self.port, self.db),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }

    /// URL with the password masked, for logs
    pub fn redacted_url(&self) -> String {
        match self.password {
            Some(_) => format!("redis://:***@{}:{}/{}", self.host, self.port, self.db),
            None => self.url(),
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: HttpServerConfig,

    /// Raises the log level to debug
    #[serde(default = "default_debug")]
    pub debug: bool,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_debug() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            server: HttpServerConfig::default(),
            debug: default_debug(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads the optional file, then applies process environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Defaults plus process environment overrides
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// Reads a JSON config file; missing keys take their defaults
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("STORE_BACKEND") {
            self.store.backend = v
                .parse::<StoreBackend>()
                .map_err(|e| ConfigError::invalid("STORE_BACKEND", &v, e))?;
        }
        if let Some(v) = lookup("REDIS_HOST") {
            self.store.host = v;
        }
        if let Some(v) = lookup("REDIS_PORT") {
            self.store.port = parse_number("REDIS_PORT", &v)?;
        }
        if let Some(v) = lookup("REDIS_PASSWORD") {
            self.store.password = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("REDIS_DB") {
            self.store.db = parse_number("REDIS_DB", &v)?;
        }
        if let Some(v) = lookup("APP_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("APP_PORT") {
            self.server.port = parse_number("APP_PORT", &v)?;
        }
        if let Some(v) = lookup("APP_DEBUG") {
            self.debug = parse_bool("APP_DEBUG", &v)?;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.log_format = v
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", &v, e))?;
        }
        Ok(())
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(var, value, e.to_string()))
}

fn parse_bool(var: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, value, "expected a boolean")),
    }
}
