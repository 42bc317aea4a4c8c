//! Third-party lookups: IP geolocation, geocoding and current conditions.

use crate::{
    Config,
    error::{Result, WeatherError},
    model::{CurrentConditions, GeoLocation},
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::Response;
use std::{fmt, str::FromStr};

pub mod ipapi;
pub mod openweather;
pub mod weatherapi;

/// Conditions providers the tracker can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }

    /// Instantiate this provider's client against its public endpoint.
    pub fn connect(self, api_key: impl Into<String>) -> Box<dyn ConditionsProvider> {
        match self {
            ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(api_key.into())),
            ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(api_key.into())),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(ProviderId::as_str).collect();
                anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    known.join(", ")
                )
            })
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Geocoding and current-conditions lookups backed by a third-party service.
#[async_trait]
pub trait ConditionsProvider: Send + Sync + fmt::Debug {
    /// Resolve a city name to its best-matching coordinate.
    async fn geocode(&self, city: &str) -> Result<GeoLocation>;

    /// Current conditions at a coordinate, in metric units.
    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions>;
}

/// Resolves the caller's own position from their public IP address.
#[async_trait]
pub trait Geolocator: Send + Sync + fmt::Debug {
    async fn locate(&self) -> Result<GeoLocation>;
}

/// Build the client for `id` with the key stored in `config`.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn ConditionsProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
        )
    })?;

    Ok(id.connect(api_key))
}

pub fn default_provider_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn ConditionsProvider>> {
    provider_from_config(config.default_provider_id()?, config)
}

/// Read a response body, turning transport failures and non-success
/// statuses into [`WeatherError::ExternalService`].
pub(crate) async fn read_body(
    service: &'static str,
    what: &str,
    res: reqwest::Result<Response>,
) -> Result<String> {
    let res = res.map_err(|e| {
        WeatherError::external(service, format!("failed to send {what} request: {e}"))
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| {
        WeatherError::external(service, format!("failed to read {what} response body: {e}"))
    })?;

    if !status.is_success() {
        return Err(WeatherError::external(
            service,
            format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body)
            ),
        ));
    }

    Ok(body)
}

pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    service: &'static str,
    what: &str,
    body: &str,
) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        WeatherError::external(service, format!("failed to parse {what} JSON: {e}"))
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!("OpenWeather".parse::<ProviderId>().unwrap(), ProviderId::OpenWeather);
        assert_eq!(ProviderId::try_from(" weatherapi ").unwrap(), ProviderId::WeatherApi);

        let err = ProviderId::try_from("darksky").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown provider 'darksky'. Supported providers: openweather, weatherapi."
        );
    }

    #[test]
    fn missing_key_points_at_configure_command() {
        let err = provider_from_config(ProviderId::OpenWeather, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("weather configure openweather"));

        let err = default_provider_from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn default_provider_is_built_from_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key(ProviderId::WeatherApi, "KEY".to_string());

        let provider = default_provider_from_config(&cfg).unwrap();
        assert!(format!("{provider:?}").contains("WeatherApiProvider"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert!(cut.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
