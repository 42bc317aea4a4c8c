//! Core library for the weather tracker.
//!
//! This crate defines:
//! - Shared domain models (records, the save request shape, pagination)
//! - The error taxonomy used on both sides of the API
//! - Client configuration & credentials handling
//! - Clients for third-party lookups (IP geolocation, geocoding, current conditions)
//! - A client for the weather API server
//! - Dashboard data loading and the map view controller
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod map;
pub mod model;
pub mod provider;

pub use client::{RecordPage, WeatherApiClient};
pub use config::{Config, ProviderConfig};
pub use error::{Result, WeatherError};
pub use model::{
    ConditionCount, ConditionSummary, Coordinates, CurrentConditions, ForecastEntry, GeoLocation,
    NewWeatherRecord, Pagination, WeatherRecord,
};
pub use provider::{ConditionsProvider, Geolocator, ProviderId};
