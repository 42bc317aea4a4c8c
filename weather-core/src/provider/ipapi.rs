//! IP-based geolocation through ipapi.co (no API key required).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::GeoLocation,
    provider::{parse_body, read_body},
};

use super::Geolocator;

const SERVICE: &str = "ipapi";
const DEFAULT_BASE_URL: &str = "https://ipapi.co";

#[derive(Debug, Clone)]
pub struct IpApiLocator {
    base_url: String,
    http: Client,
}

impl Default for IpApiLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IpApiLocator {
    pub fn new() -> Self {
        Self {
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
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country_name: Option<String>,
    // ipapi answers rate limits with 200 and `{"error": true, "reason": ...}`
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

#[async_trait]
impl Geolocator for IpApiLocator {
    async fn locate(&self) -> Result<GeoLocation> {
        let url = format!("{}/json/", self.base_url);
        let res = self.http.get(&url).send().await;

        let body = read_body(SERVICE, "geolocation", res).await?;
        let parsed: IpApiResponse = parse_body(SERVICE, "geolocation", &body)?;

        if parsed.error {
            return Err(WeatherError::external(
                SERVICE,
                parsed.reason.unwrap_or_else(|| "lookup rejected".to_string()),
            ));
        }

        let (Some(lat), Some(lon)) = (parsed.latitude, parsed.longitude) else {
            return Err(WeatherError::external(
                SERVICE,
                "response carried no coordinates",
            ));
        };

        tracing::debug!(lat, lon, city = ?parsed.city, "Located caller by IP");

        Ok(GeoLocation {
            lat,
            lon,
            name: parsed.city.unwrap_or_else(|| "Unknown location".to_string()),
            country: parsed.country_name,
        })
    }
}
