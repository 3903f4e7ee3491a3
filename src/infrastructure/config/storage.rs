//! Reading and writing the TOML configuration file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory on this platform")]
    ConfigDirNotFound,
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One configuration file on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the platform's default location.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigDirNotFound` if the platform has no config directory.
    pub fn new() -> Result<Self, ConfigError> {
        AppConfig::default_config_path()
            .map(Self::at)
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store for `--config` when given, the default one otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigStore::new`].
    pub fn resolve(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        path_override.map_or_else(Self::new, |path| Ok(Self::at(path)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration. A missing file is created with defaults; a
    /// malformed one is kept as is and defaults are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the defaults cannot be written.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = if self.path.exists() {
            let content =
                fs::read_to_string(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
            toml::from_str::<AppConfig>(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Malformed config file, using defaults");
                AppConfig::default()
            })
        } else {
            info!(path = %self.path.display(), "Writing default config file");
            let config = AppConfig::default();
            self.save(&config)?;
            config
        };
        debug!(path = %self.path.display(), level = %config.log_level, "Loaded config");
        config.config = Some(self.path.clone());
        Ok(config)
    }

    /// Writes the configuration, replacing the file atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization or the write fails.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;

        let mut temp_file =
            tempfile::NamedTempFile::new_in(parent).map_err(|e| ConfigError::io(parent, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| ConfigError::io(temp_file.path(), e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| ConfigError::io(&self.path, e.error))?;
        Ok(())
    }
}
