//! `/api/weather` handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use weather_core::model::{ConditionSummary, NewWeatherRecord, WeatherRecord};

use super::{ApiError, ApiResponse, AppState, ValidJson};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

const FETCH_FAILED: &str = "Error fetching weather data";

/// Raw paging parameters; anything unparsable falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<u64>().ok().filter(|n| *n >= 1)
}

pub async fn save_weather(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<NewWeatherRecord>,
) -> Result<(StatusCode, Json<ApiResponse<WeatherRecord>>), ApiError> {
    let record = state
        .store
        .save(input)
        .await
        .map_err(ApiError::from_store("Error saving weather data"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record).with_message("Weather data saved successfully")),
    ))
}

pub async fn latest_weather(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<WeatherRecord>>, ApiError> {
    let record = state
        .store
        .find_latest()
        .await
        .map_err(ApiError::from_store(FETCH_FAILED))?;

    Ok(Json(ApiResponse::success(record)))
}

pub async fn city_weather(
    State(state): State<Arc<AppState>>,
    Path(city_name): Path<String>,
) -> Result<Json<ApiResponse<WeatherRecord>>, ApiError> {
    let record = state
        .store
        .find_by_city(&city_name)
        .await
        .map_err(ApiError::from_store(FETCH_FAILED))?;

    Ok(Json(ApiResponse::success(record)))
}

pub async fn all_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<WeatherRecord>>>, ApiError> {
    let (records, pagination) = state
        .store
        .find_all(query.page(), query.limit())
        .await
        .map_err(ApiError::from_store(FETCH_FAILED))?;

    Ok(Json(ApiResponse::success(records).with_pagination(pagination)))
}

pub async fn weather_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ConditionSummary>>, ApiError> {
    let summary = state
        .store
        .condition_summary()
        .await
        .map_err(ApiError::from_store(FETCH_FAILED))?;

    Ok(Json(ApiResponse::success(summary)))
}

pub async fn delete_weather(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .store
        .delete_by_id(&id)
        .await
        .map_err(ApiError::from_store("Error deleting weather data"))?;

    Ok(Json(ApiResponse::message("Weather record deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn missing_or_bad_values_use_defaults() {
        let q = query(None, None);
        assert_eq!((q.page(), q.limit()), (1, 10));

        let q = query(Some("abc"), Some("0"));
        assert_eq!((q.page(), q.limit()), (1, 10));

        let q = query(Some("-2"), Some(""));
        assert_eq!((q.page(), q.limit()), (1, 10));
    }

    #[test]
    fn limit_is_capped() {
        let q = query(Some("3"), Some("5000"));
        assert_eq!((q.page(), q.limit()), (3, MAX_LIMIT));
    }
}
