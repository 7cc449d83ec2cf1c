//! Configuration management for Lunchbox

pub mod schema;

pub use schema::{Config, DiskKeying};

use crate::error::{LunchboxError, LunchboxResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the disk tier directory inside the cache directory
pub const DISK_CACHE_DIR_NAME: &str = "DiskCache";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lunchbox")
            .join("config.toml")
    }

    /// Get the application cache directory
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lunchbox")
    }

    /// Resolve the disk tier directory, honouring `cache.disk_dir`
    pub fn disk_cache_dir(config: &Config) -> PathBuf {
        config
            .cache
            .disk_dir
            .clone()
            .unwrap_or_else(|| Self::cache_dir().join(DISK_CACHE_DIR_NAME))
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> LunchboxResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> LunchboxResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| LunchboxError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| LunchboxError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> LunchboxResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LunchboxError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            LunchboxError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
