use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{Coordinates, CurrentConditions, GeoLocation},
    provider::{parse_body, read_body},
};

use super::ConditionsProvider;

const SERVICE: &str = "WeatherAPI";
const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct WaSearchEntry {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    lat: f64,
    lon: f64,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: f64,
    wind_kph: f64,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[async_trait]
impl ConditionsProvider for WeatherApiProvider {
    async fn geocode(&self, city: &str) -> Result<GeoLocation> {
        let url = format!("{}/v1/search.json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .send()
            .await;

        let body = read_body(SERVICE, "search", res).await?;
        let entries: Vec<WaSearchEntry> = parse_body(SERVICE, "search", &body)?;

        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(format!("City not found: {city}")))?;

        Ok(GeoLocation {
            lat: entry.lat,
            lon: entry.lon,
            name: entry.name,
            country: Some(entry.country),
        })
    }

    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let url = format!("{}/v1/current.json", self.base_url);
        let q = format!("{lat},{lon}");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str())])
            .send()
            .await;

        let body = read_body(SERVICE, "current", res).await?;
        let parsed: WaResponse = parse_body(SERVICE, "current", &body)?;

        let ts = parsed
            .current
            .last_updated_epoch
            .or(parsed.location.localtime_epoch);
        let observation_time = ts
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);

        let text = parsed.current.condition.text;

        Ok(CurrentConditions {
            provider: "weatherapi".to_string(),
            location_name: parsed.location.name,
            country: parsed.location.country,
            coordinates: Coordinates {
                lat: parsed.location.lat,
                lon: parsed.location.lon,
            },
            temperature_c: parsed.current.temp_c,
            humidity_pct: parsed.current.humidity,
            wind_speed_mps: parsed.current.wind_kph / 3.6,
            condition: text.clone(),
            description: text.to_lowercase(),
            observation_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn current_converts_wind_to_metres_per_second() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/current.json"))
            .and(query_param("key", "KEY"))
            .and(query_param("q", "51.5,-0.12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": "London", "country": "United Kingdom", "lat": 51.52, "lon": -0.11, "localtime_epoch": 1_700_000_000},
                "current": {"temp_c": 11.0, "humidity": 82, "wind_kph": 36.0, "condition": {"text": "Light rain"}}
            })))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        let cur = provider.current(51.5, -0.12).await.unwrap();

        assert_eq!(cur.display_name(), "London, United Kingdom");
        assert!((cur.wind_speed_mps - 10.0).abs() < 1e-9);
        assert_eq!(cur.condition, "Light rain");
        assert_eq!(cur.description, "light rain");
        assert_eq!(cur.observation_time.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn search_without_results_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        assert!(provider.geocode("nowhere").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn malformed_body_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
        let err = provider.geocode("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherError::ExternalService { service: "WeatherAPI", .. }));
    }
}
