//! Configuration schema for Lunchbox
//!
//! Configuration is stored at `~/.config/lunchbox/config.toml`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Image cache settings
    pub cache: CacheConfig,

    /// Network settings for image downloads and page loads
    pub network: NetworkConfig,

    /// Web content bridge settings
    pub web: WebConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Directory that bare `name.ext` resources resolve against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            resource_dir: None,
        }
    }
}

/// How the disk tier names the file for an identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskKeying {
    /// Every identifier shares the single `project_lunch.png` slot
    #[default]
    Fixed,
    /// One file per identifier, named by a SHA-256 prefix
    Hashed,
}

impl fmt::Display for DiskKeying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Hashed => write!(f, "hashed"),
        }
    }
}

/// Image cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of images held in memory
    pub memory_capacity: usize,

    /// Maximum summed payload size of images held in memory
    pub memory_max_bytes: usize,

    /// Persist downloaded images to disk
    pub disk_enabled: bool,

    /// Disk tier directory (default: `<cache dir>/lunchbox/DiskCache`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_dir: Option<PathBuf>,

    /// Disk tier file naming
    pub disk_keying: DiskKeying,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 100,
            memory_max_bytes: 50 * 1024 * 1024,
            disk_enabled: true,
            disk_dir: None,
            disk_keying: DiskKeying::Fixed,
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Share one download between concurrent loads of the same identifier
    pub coalesce_requests: bool,

    /// Largest response body accepted, in bytes
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("lunchbox/{}", env!("CARGO_PKG_VERSION")),
            coalesce_requests: true,
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Web content bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Name of the script handler pages post messages to
    pub script_handler: String,

    /// Purge cookies and cached responses before every load
    pub purge_before_load: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            script_handler: "scriptHandler".to_string(),
            purge_before_load: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("disk_keying = \"fixed\""));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.web.script_handler, "scriptHandler");
        assert_eq!(config.cache.disk_keying, DiskKeying::Fixed);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            disk_keying = "hashed"
            memory_capacity = 8
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.disk_keying, DiskKeying::Hashed);
        assert_eq!(config.cache.memory_capacity, 8);
        assert!(config.cache.disk_enabled); // default preserved
        assert!(config.network.coalesce_requests);
    }
}
