//! HTTP API and record store for the weather tracker.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod config;
pub mod store;

pub use config::{AppMode, ServerConfig};
pub use store::{StoreError, WeatherStore};

/// Install the global subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = WeatherStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to database at {}", config.database_url))?;

    let state = Arc::new(api::AppState::new(store.clone(), config.mode));
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server running on http://localhost:{}", config.port);
    info!("Environment: {}", config.mode);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    store.close().await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutting down gracefully..."),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
