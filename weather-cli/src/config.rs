use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use weather_core::DirectWeatherClient;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Env var that overrides the stored key for no-save lookups.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Client configuration stored on disk.
///
/// Example TOML:
/// api_base_url = "http://localhost:5000/api"
/// api_key = "..."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the weather-server API, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OpenWeather key used only for the direct (no-save) views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
        }
    }
}

impl ClientConfig {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Key for direct lookups; a non-empty `env_key` wins over the stored one.
    pub fn direct_api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn direct_client(&self) -> Option<DirectWeatherClient> {
        self.direct_api_key(std::env::var(API_KEY_ENV).ok())
            .map(DirectWeatherClient::new)
    }
}
