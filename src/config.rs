//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, preferred page size, and the last
//! used email address.
//!
//! Configuration is stored at `~/.config/lumina-tui/config.json`. The
//! base URL can be overridden with the `LUMINA_API_BASE_URL` environment
//! variable (also honored from a `.env` file).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_PAGE_SIZE;

/// Application name used for config/data directory paths
const APP_NAME: &str = "lumina-tui";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Base URL used when neither the environment nor the config names one
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the configured base URL
const ENV_BASE_URL: &str = "LUMINA_API_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_email: Option<String>,
    pub page_size: Option<u32>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolved API base URL: environment override, then config, then the
    /// default.
    pub fn base_url(&self) -> String {
        resolve_base_url(std::env::var(ENV_BASE_URL).ok(), self.base_url.as_deref())
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Directory holding the persisted credential slots.
    pub fn credential_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("credentials"))
    }
}

fn resolve_base_url(env_value: Option<String>, configured: Option<&str>) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_prefers_env_then_config_then_default() {
        assert_eq!(
            resolve_base_url(Some("http://env:9000".to_string()), Some("http://cfg")),
            "http://env:9000"
        );
        assert_eq!(
            resolve_base_url(None, Some("http://cfg")),
            "http://cfg"
        );
        assert_eq!(resolve_base_url(Some("  ".to_string()), None), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(None, None), DEFAULT_BASE_URL);
    }
}
