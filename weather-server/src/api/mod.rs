use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppMode;
use crate::store::WeatherStore;

mod error;
mod extract;
mod system;
mod types;
pub mod weather;

pub use error::{ApiError, panic_response};
pub use extract::ValidJson;
pub use types::*;

pub struct AppState {
    pub store: WeatherStore,

    pub mode: AppMode,

    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: WeatherStore, mode: AppMode) -> Self {
        Self {
            store,
            mode,
            start_time: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let mode = state.mode;

    let routes = Router::new()
        .route("/api/weather", post(weather::save_weather))
        .route("/api/weather/latest", get(weather::latest_weather))
        .route("/api/weather/city/{cityName}", get(weather::city_weather))
        .route("/api/weather/all", get(weather::all_weather))
        .route("/api/weather/summary", get(weather::weather_summary))
        .route("/api/weather/{id}", delete(weather::delete_weather))
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .with_state(state);

    with_middleware(routes, mode)
}

/// CORS and request tracing, with the panic handler as the outermost stage.
pub fn with_middleware(routes: Router, mode: AppMode) -> Router {
    let expose_panics = mode.is_development();

    routes
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn std::any::Any + Send + 'static>| panic_response(err, expose_panics),
        ))
}

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}
