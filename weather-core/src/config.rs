//! Client settings persisted as TOML in the platform config directory.
//!
//! ```toml
//! default_provider = "openweather"
//!
//! [server]
//! url = "http://localhost:3000"
//!
//! [providers.openweather]
//! api_key = "..."
//! ```

use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::provider::ProviderId;

/// Base URL of the weather API when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Credentials for one conditions provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Base URL without a trailing slash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    #[serde(default)]
    pub server: ServerSection,

    /// Keyed by provider short name.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Config {
    /// Load from the default location; a missing file is an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML and check that the named default provider exists.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        if let Some(name) = &cfg.default_provider {
            ProviderId::try_from(name.as_str())?;
        }
        Ok(cfg)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Write to `path`, creating parent directories as needed.
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-tracker", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn server_url(&self) -> &str {
        self.server.url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn set_server_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("Server URL must start with http:// or https://, got '{url}'");
        }
        self.server.url = Some(url.to_string());
        Ok(())
    }

    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let name = self.default_provider.as_deref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `weather configure <provider>` (e.g. `weather configure openweather`) first."
            )
        })?;

        ProviderId::try_from(name)
    }

    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.to_string());
    }

    /// Store the key for `id`. The first provider configured becomes the default.
    pub fn set_api_key(&mut self, id: ProviderId, api_key: String) {
        self.providers
            .insert(id.to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.set_default_provider(id);
        }
    }

    pub fn provider_api_key(&self, id: ProviderId) -> Option<&str> {
        self.providers
            .get(id.as_str())
            .map(|cfg| cfg.api_key.as_str())
    }

    /// Providers that have a key, in [`ProviderId::all`] order.
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::all()
            .iter()
            .copied()
            .filter(|id| self.provider_api_key(*id).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_no_default_provider() {
        let err = Config::default().default_provider_id().unwrap_err();
        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn first_key_sets_default_and_later_keys_do_not() {
        let mut cfg = Config::default();

        cfg.set_api_key(ProviderId::WeatherApi, "WEATHER_KEY".into());
        cfg.set_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::WeatherApi);
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OPEN_KEY"));
        assert_eq!(
            cfg.configured_providers(),
            vec![ProviderId::OpenWeather, ProviderId::WeatherApi]
        );

        cfg.set_default_provider(ProviderId::OpenWeather);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);
    }

    #[test]
    fn server_url_defaults_and_drops_trailing_slash() {
        let mut cfg = Config::default();
        assert_eq!(cfg.server_url(), DEFAULT_SERVER_URL);

        cfg.set_server_url(" http://weather.local:8080/ ").unwrap();
        assert_eq!(cfg.server_url(), "http://weather.local:8080");

        assert!(cfg.set_server_url("weather.local").is_err());
        assert_eq!(cfg.server_url(), "http://weather.local:8080");
    }

    #[test]
    fn parses_sections_and_rejects_unknown_default_provider() {
        let cfg = Config::from_toml(
            r#"
default_provider = "weatherapi"

[server]
url = "http://127.0.0.1:3000"

[providers.weatherapi]
api_key = "KEY"
"#,
        )
        .unwrap();
        assert_eq!(cfg.server_url(), "http://127.0.0.1:3000");
        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("KEY"));

        let err = Config::from_toml(r#"default_provider = "darksky""#).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = std::env::temp_dir().join(format!(
            "weather-config-test-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = dir.join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.set_server_url("https://api.example.com").unwrap();
        cfg.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), cfg);
        assert_eq!(
            Config::load_from(&dir.join("missing.toml")).unwrap(),
            Config::default()
        );

        fs::remove_dir_all(&dir).ok();
    }
}
