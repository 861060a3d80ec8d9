//! Configuration system for templatefs
//!
//! Reads config from ~/.config/templatefs/config.toml

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;

use crate::coalescer::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_DEBOUNCE};

/// Adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Quiet period before change events are delivered
    pub debounce_ms: u64,
    /// Batches a subscriber may fall behind before it lags
    pub channel_capacity: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(10),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Template store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding template files
    pub root: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured root, or the platform data directory
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("templatefs")
                .join("templates")
        })
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub adapter: AdapterConfig,
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from default path, falling back to defaults
    pub fn load() -> Self {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Load from `path`; a missing or invalid file yields defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load_from_path(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
            Self::default()
        })
    }

    /// Get default config path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("templatefs")
            .join("config.toml")
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
