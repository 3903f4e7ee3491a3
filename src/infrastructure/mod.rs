//! Infrastructure layer with configuration and realm adapters.

/// Application configuration.
pub mod config;
/// Snapshot-backed realm directories and message source.
pub mod realm;

pub use config::{AppConfig, CliArgs, ConfigError, ConfigStore, LogLevel};
pub use realm::{
    InMemoryMutes, InMemoryPeople, InMemoryStreams, Realm, RealmSnapshot, SnapshotMessageSource,
};
