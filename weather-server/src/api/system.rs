use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::AppState;

/// Service description and endpoint list.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Weather App API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/weather": "Save weather data",
            "GET /api/weather/latest": "Get latest weather data",
            "GET /api/weather/city/:cityName": "Get weather by city",
            "GET /api/weather/all": "Get all weather records",
            "GET /api/weather/summary": "Get condition counts across all records",
            "DELETE /api/weather/:id": "Delete weather record"
        }
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started.
    pub uptime: f64,
    pub database: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "Connected",
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "Disconnected"
        }
    };

    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        uptime: state.start_time.elapsed().as_secs_f64(),
        database,
    })
}
