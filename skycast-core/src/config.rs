use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    client::{WeatherApiClient, weatherapi::DEFAULT_BASE_URL},
    controller::ControllerConfig,
};

/// WeatherAPI.com connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Per-request timeout; `0` disables it.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: DEFAULT_BASE_URL.to_string(), timeout_secs: 10 }
    }
}

/// Search-as-you-type tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000, min_query_len: 3 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// api_key = "..."
///
/// [search]
/// debounce_ms = 1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the last selected city is kept.
    pub fn state_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("state.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api.api_key = Some(api_key);
    }

    /// Returns the API key, or an error with a hint on how to set it.
    pub fn api_key(&self) -> Result<&str> {
        self.api.api_key.as_deref().filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No WeatherAPI key configured.\n\
                 Hint: run `skycast configure` and enter your API key, or pass --api-key."
            )
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.api.timeout_secs > 0).then(|| Duration::from_secs(self.api.timeout_secs))
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            debounce: Duration::from_millis(self.search.debounce_ms),
            min_query_len: self.search.min_query_len,
        }
    }

    /// Construct the HTTP client from the configured key, base URL and timeout.
    pub fn weather_client(&self) -> Result<WeatherApiClient> {
        let api_key = self.api_key()?.to_owned();

        WeatherApiClient::with_options(api_key, self.api.base_url.clone(), self.request_timeout())
            .context("Failed to build WeatherAPI client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No WeatherAPI key configured"));
        assert!(msg.contains("Hint: run `skycast configure`"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("  ".into());
        assert!(cfg.api_key().is_err());
    }

    #[test]
    fn set_api_key_makes_client_buildable() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        assert_eq!(cfg.api_key().expect("key must be set"), "KEY");
        assert!(cfg.weather_client().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str("[search]\ndebounce_ms = 250\n").expect("valid toml");

        assert_eq!(cfg.search.debounce_ms, 250);
        assert_eq!(cfg.search.min_query_len, 3);
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(10)));

        let controller = cfg.controller_config();
        assert_eq!(controller.debounce, Duration::from_millis(250));
        assert_eq!(controller.min_query_len, 3);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let cfg = Config::from_toml_str("[api]\ntimeout_secs = 0\n").expect("valid toml");
        assert_eq!(cfg.request_timeout(), None);
    }

    #[test]
    fn toml_round_trip_keeps_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("ABC".into());

        let text = toml::to_string_pretty(&cfg).expect("serializable");
        let parsed = Config::from_toml_str(&text).expect("parsable");
        assert_eq!(parsed.api.api_key.as_deref(), Some("ABC"));
    }
}
