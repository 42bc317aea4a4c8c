//! HTTP client for the weather API server.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{Result, WeatherError},
    model::{ConditionSummary, NewWeatherRecord, Pagination, WeatherRecord},
};

const SERVICE: &str = "weather API";

/// The `{success, data|message, ...}` wrapper every endpoint answers with.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
    error: Option<String>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub records: Vec<WeatherRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn save(&self, record: &NewWeatherRecord) -> Result<WeatherRecord> {
        let res = self
            .http
            .post(format!("{}/api/weather", self.base_url))
            .json(record)
            .send()
            .await;
        let envelope = self.decode::<WeatherRecord>(res).await?;
        require_data(envelope)
    }

    pub async fn latest(&self) -> Result<WeatherRecord> {
        let res = self
            .http
            .get(format!("{}/api/weather/latest", self.base_url))
            .send()
            .await;
        require_data(self.decode(res).await?)
    }

    pub async fn by_city(&self, city: &str) -> Result<WeatherRecord> {
        let mut url = reqwest::Url::parse(&format!("{}/api/weather/city/", self.base_url))
            .map_err(|e| WeatherError::Unexpected(e.into()))?;
        url.path_segments_mut()
            .map_err(|()| WeatherError::Unexpected(anyhow::anyhow!("invalid base URL")))?
            .pop_if_empty()
            .push(city);

        let res = self.http.get(url).send().await;
        require_data(self.decode(res).await?)
    }

    pub async fn all(&self, page: u64, limit: u64) -> Result<RecordPage> {
        let res = self
            .http
            .get(format!("{}/api/weather/all", self.base_url))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await;
        let envelope = self.decode::<Vec<WeatherRecord>>(res).await?;

        let pagination = envelope
            .pagination
            .unwrap_or_else(|| Pagination::new(page, limit, 0));
        Ok(RecordPage {
            records: envelope.data.unwrap_or_default(),
            pagination,
        })
    }

    pub async fn summary(&self) -> Result<ConditionSummary> {
        let res = self
            .http
            .get(format!("{}/api/weather/summary", self.base_url))
            .send()
            .await;
        require_data(self.decode(res).await?)
    }

    /// Returns the server's confirmation message.
    pub async fn delete(&self, id: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&format!("{}/api/weather/", self.base_url))
            .map_err(|e| WeatherError::Unexpected(e.into()))?;
        url.path_segments_mut()
            .map_err(|()| WeatherError::Unexpected(anyhow::anyhow!("invalid base URL")))?
            .pop_if_empty()
            .push(id);

        let res = self.http.delete(url).send().await;
        let envelope = self.decode::<serde_json::Value>(res).await?;
        Ok(envelope.message.unwrap_or_default())
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        res: reqwest::Result<reqwest::Response>,
    ) -> Result<Envelope<T>> {
        let res = res.map_err(|e| {
            WeatherError::external(SERVICE, format!("could not reach {}: {e}", self.base_url))
        })?;
        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::external(SERVICE, format!("failed to read response body: {e}"))
        })?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            WeatherError::external(
                SERVICE,
                format!(
                    "unexpected response ({status}): {e}: {}",
                    crate::provider::truncate_body(&body)
                ),
            )
        })?;

        if status.is_success() && envelope.success {
            return Ok(envelope);
        }

        let message = envelope
            .message
            .unwrap_or_else(|| format!("request failed with status {status}"));
        let message = match envelope.error {
            Some(detail) => format!("{message}: {detail}"),
            None => message,
        };

        // Rejected saves come back as 500 with the reason in `error`.
        Err(match status {
            StatusCode::NOT_FOUND => WeatherError::NotFound(message),
            _ => WeatherError::Unexpected(anyhow::anyhow!(message)),
        })
    }
}

fn require_data<T>(envelope: Envelope<T>) -> Result<T> {
    envelope
        .data
        .ok_or_else(|| WeatherError::external(SERVICE, "response carried no data"))
}
