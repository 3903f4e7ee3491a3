//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;
use crate::application::services::DEFAULT_CACHE_CAPACITY;
use crate::domain::narrow::RealmSettings;

pub(crate) const APP_NAME: &str = "chat-narrow";
pub(crate) const APP_QUALIFIER: &str = "org";
pub(crate) const APP_ORGANIZATION: &str = "chat-narrow";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level.
    #[default]
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Realm-wide matching settings.
    #[serde(default)]
    pub realm: RealmConfig,

    /// Message list cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fetch window settings.
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Realm-wide matching settings, layered over a snapshot's own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Treat `un`/`.d` stream and topic variants as one conversation.
    #[serde(default)]
    pub zephyr_mirror: bool,

    /// Stream the client is locked to.
    #[serde(default)]
    pub narrow_stream: Option<String>,
}

impl RealmConfig {
    #[must_use]
    pub fn to_settings(&self) -> RealmSettings {
        RealmSettings {
            zephyr_mirror: self.zephyr_mirror,
            narrow_stream: self.narrow_stream.clone(),
        }
    }
}

/// Message list cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of narrows kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

/// How many messages to request around the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_window")]
    pub num_before: usize,

    #[serde(default = "default_fetch_window")]
    pub num_after: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            num_before: default_fetch_window(),
            num_after: default_fetch_window(),
        }
    }
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

const fn default_fetch_window() -> usize {
    50
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(zephyr_mirror) = args.zephyr_mirror {
            self.realm.zephyr_mirror = zephyr_mirror;
        }
        if let Some(narrow_stream) = &args.narrow_stream {
            self.realm.narrow_stream = Some(narrow_stream.clone());
        }
        if let Some(capacity) = args.cache_capacity {
            self.cache.capacity = capacity;
        }
        if let Some(num_before) = args.num_before {
            self.fetch.num_before = num_before;
        }
        if let Some(num_after) = args.num_after {
            self.fetch.num_after = num_after;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }
}
