use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Endpoint written into a fresh config. Treated as "not configured yet".
pub const PLACEHOLDER_ENDPOINT: &str = "http://localhost:9999/graphql";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub stash: StashConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StashConfig {
    #[serde(default = "default_stash_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_stash_endpoint() -> String {
    PLACEHOLDER_ENDPOINT.to_string()
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            endpoint: default_stash_endpoint(),
            api_key: None,
        }
    }
}

impl StashConfig {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.trim().to_string(),
            // An empty key from the settings form means "no key"
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| k.to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        let endpoint = self.endpoint.trim();
        !endpoint.is_empty() && endpoint != PLACEHOLDER_ENDPOINT
    }
}

impl Config {
    /// Settings for the catalog client, or `Unconfigured` while the endpoint
    /// is empty or still the placeholder.
    pub fn require_stash(&self) -> std::result::Result<&StashConfig, Error> {
        if self.stash.is_configured() {
            Ok(&self.stash)
        } else {
            Err(Error::Unconfigured)
        }
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("STASH_DUPES_CONFIG") {
            return PathBuf::from(path);
        }

        Self::config_dir().join("config.toml")
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stash-dupes")
    }
}

/// Read the config at `path`. A missing file yields the default config
/// without writing anything.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("Config file not found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}
