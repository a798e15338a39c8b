//! Configuration management for wumon.
//!
//! A small TOML file under the user config directory. Every field has a
//! default, so a missing file is not an error and a partial file fills in
//! the rest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::queue::Endianness;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

/// Artifact file names inside a monitored client directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_queue_file")]
    pub queue_file: String,
    #[serde(default = "default_unitinfo_file")]
    pub unitinfo_file: String,
}

fn default_log_file() -> String {
    "FAHlog.txt".to_string()
}

fn default_queue_file() -> String {
    "queue.dat".to_string()
}

fn default_unitinfo_file() -> String {
    "unitinfo.txt".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            queue_file: default_queue_file(),
            unitinfo_file: default_unitinfo_file(),
        }
    }
}

/// Queue snapshot decode policy
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QueueConfig {
    /// Byte order for multi-byte snapshot fields; explicit, never inferred
    #[serde(default)]
    pub endianness: Endianness,
}

impl Config {
    /// Get the config file path (~/.config/wumon/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the config directory path (~/.config/wumon)
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("wumon"))
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path, defaults when missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).with_context(|| format!("Failed to write config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_standard_artifacts() {
        let config = Config::default();
        assert_eq!(config.client.log_file, "FAHlog.txt");
        assert_eq!(config.client.queue_file, "queue.dat");
        assert_eq!(config.client.unitinfo_file, "unitinfo.txt");
        assert_eq!(config.queue.endianness, Endianness::Little);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("[queue]\nendianness = \"big\"\n").unwrap();
        assert_eq!(config.queue.endianness, Endianness::Big);
        assert_eq!(config.client.log_file, "FAHlog.txt");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn roundtrips_through_toml() {
        let mut config = Config::default();
        config.queue.endianness = Endianness::Big;
        config.client.log_file = "FAHlog-prev.txt".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
