use anyhow::{Context, bail};
use std::fmt;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://weather.db?mode=rwc";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment mode, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    Development,
    #[default]
    Production,
}

impl AppMode {
    pub fn is_development(self) -> bool {
        self == AppMode::Development
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppMode::Development => "development",
            AppMode::Production => "production",
        })
    }
}

impl TryFrom<&str> for AppMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppMode::Development),
            "production" | "prod" => Ok(AppMode::Production),
            other => bail!("Unknown APP_ENV `{other}` (expected development or production)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub mode: AppMode,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
            mode: AppMode::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read the process environment, after loading `.env` when one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url.trim().to_string();
        }

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT `{port}`"))?;
        }

        if let Some(mode) = get("APP_ENV") {
            config.mode = AppMode::try_from(mode.as_str())?;
        }

        if let Some(level) = get("LOG_LEVEL") {
            config.log_level = level.trim().to_string();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.mode, AppMode::Production);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn reads_every_key() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "8080"),
            ("APP_ENV", "Development"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 8080);
        assert!(config.mode.is_development());
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "  "), ("APP_ENV", "")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.mode, AppMode::Production);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT"));

        assert!(ServerConfig::from_lookup(lookup(&[("APP_ENV", "staging")])).is_err());
    }
}
