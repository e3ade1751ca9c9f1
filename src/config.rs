//! Configuration layer: typed settings with file and environment precedence.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const ENV_PREFIX: &str = "LESTO";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_DOC_LIMIT: usize = 1000;
const DEFAULT_CACHE_FIND_LIMIT: usize = 200;
const DEFAULT_CACHE_RESPONSE_LIMIT: usize = 200;
const DEFAULT_MONITOR_CAPACITY: usize = 1000;
const DEFAULT_SLOW_REQUEST_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be loaded: {0}")]
    Load(#[from] config::ConfigError),
}

/// Top-level settings for a process embedding lesto.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Development mode: failure detail reaches envelopes and logs.
    pub development: bool,
    pub cache: CacheSettings,
    pub monitor: MonitorSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from an optional file overlaid with `LESTO_*`
    /// environment variables (`LESTO_CACHE__TTL_SECS=60` style).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// Cache sizing and expiry settings; see [`crate::cache::CacheConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enable_query_cache: bool,
    pub enable_response_cache: bool,
    pub ttl_secs: u64,
    pub doc_limit: usize,
    pub find_limit: usize,
    pub response_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enable_query_cache: true,
            enable_response_cache: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            doc_limit: DEFAULT_CACHE_DOC_LIMIT,
            find_limit: DEFAULT_CACHE_FIND_LIMIT,
            response_limit: DEFAULT_CACHE_RESPONSE_LIMIT,
        }
    }
}

/// Performance-monitor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Retained request records; oldest are dropped past this.
    pub capacity: usize,
    /// Requests slower than this are flagged.
    pub slow_request_ms: u64,
}

impl MonitorSettings {
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_ms)
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MONITOR_CAPACITY,
            slow_request_ms: DEFAULT_SLOW_REQUEST_MS,
        }
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}
