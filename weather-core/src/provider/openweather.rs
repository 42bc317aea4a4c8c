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

const SERVICE: &str = "OpenWeather";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at another host (a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwGeocodeEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[async_trait]
impl ConditionsProvider for OpenWeatherProvider {
    async fn geocode(&self, city: &str) -> Result<GeoLocation> {
        let url = format!("{}/geo/1.0/direct", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await;

        let body = read_body(SERVICE, "geocoding", res).await?;
        let entries: Vec<OwGeocodeEntry> = parse_body(SERVICE, "geocoding", &body)?;

        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(format!("City not found: {city}")))?;

        Ok(GeoLocation {
            lat: entry.lat,
            lon: entry.lon,
            name: entry.name,
            country: entry.country,
        })
    }

    async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string().as_str()),
                ("lon", lon.to_string().as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await;

        let body = read_body(SERVICE, "current weather", res).await?;
        let parsed: OwCurrentResponse = parse_body(SERVICE, "current weather", &body)?;

        let observation_time = DateTime::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now);

        let (condition, description) = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| (w.main, w.description))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

        Ok(CurrentConditions {
            provider: "openweather".to_string(),
            location_name: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
            coordinates: Coordinates {
                lat: parsed.coord.lat,
                lon: parsed.coord.lon,
            },
            temperature_c: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            condition,
            description,
            observation_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new("KEY".into()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn geocode_takes_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "London"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "London", "lat": 51.5073, "lon": -0.1276, "country": "GB", "state": "England"}
            ])))
            .mount(&server)
            .await;

        let loc = provider(&server).await.geocode("London").await.unwrap();

        assert_eq!(loc.display_name(), "London, GB");
        assert!((loc.lat - 51.5073).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn geocode_without_match_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = provider(&server).await.geocode("Atlantis").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn current_maps_metric_fields() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .and(query_param("units", "metric"))
            .and(query_param("lat", "48.85"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "dt": 1_700_000_000,
                "coord": {"lat": 48.85, "lon": 2.35},
                "main": {"temp": 17.6, "feels_like": 17.0, "humidity": 60},
                "weather": [{"main": "Clouds", "description": "broken clouds"}],
                "wind": {"speed": 5.2},
                "sys": {"country": "FR"}
            })))
            .mount(&server)
            .await;

        let cur = provider(&server).await.current(48.85, 2.35).await.unwrap();

        assert_eq!(cur.display_name(), "Paris, FR");
        assert_eq!(cur.condition, "Clouds");
        assert_eq!(cur.description, "broken clouds");
        assert_eq!(cur.humidity_pct, 60.0);
        assert_eq!(cur.observation_time.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn non_success_status_is_external_error() {
        let server = MockServer::start().await;
        Mock::given(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = provider(&server).await.current(0.0, 0.0).await.unwrap_err();
        match err {
            WeatherError::ExternalService { service, message } => {
                assert_eq!(service, "OpenWeather");
                assert!(message.contains("401"));
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
