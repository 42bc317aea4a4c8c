//! Map view controller.
//!
//! Initial load, city search and map clicks all end in the same step:
//! center the view, replace the main marker and show current conditions
//! for that coordinate. Drawing goes through a [`MapSurface`].

use crate::{
    model::{CurrentConditions, GeoLocation},
    provider::{ConditionsProvider, Geolocator},
};

/// A map position and zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

/// World view shown before anything is located.
pub const INITIAL_VIEW: MapView = MapView {
    lat: 20.0,
    lon: 0.0,
    zoom: 2,
};

/// Where the map settles when IP geolocation fails.
pub const FALLBACK_VIEW: MapView = MapView {
    lat: 51.505,
    lon: -0.09,
    zoom: 5,
};

pub const FOCUS_ZOOM: u8 = 10;

pub const LOADING_POPUP: &str = "Loading weather...";
pub const CLICKED_LOCATION_NAME: &str = "Selected Location";
pub const EMPTY_SEARCH_ALERT: &str = "Please enter a city name";
pub const CITY_NOT_FOUND_ALERT: &str = "City not found. Please try again.";
pub const WEATHER_UNAVAILABLE_ALERT: &str = "Unable to fetch weather data. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum MapStatus {
    Idle,
    Locating,
    Located(GeoLocation),
    Error(String),
}

/// Contents of the location info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPanel {
    pub location: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
}

impl InfoPanel {
    pub fn from_conditions(c: &CurrentConditions) -> Self {
        Self {
            location: c.display_name(),
            temperature: format!("{}°C", c.temperature_c.round() as i64),
            condition: c.description.clone(),
            humidity: format!("{}%", c.humidity_pct.round() as i64),
            wind: format!("{} m/s", c.wind_speed_mps.round() as i64),
        }
    }
}

/// Popup text for the main marker once conditions are known.
pub fn weather_popup(c: &CurrentConditions) -> String {
    format!(
        "{}\n{}°C\n{}",
        c.display_name(),
        c.temperature_c.round() as i64,
        c.description
    )
}

/// Drawing backend: the map widget plus the page around it.
pub trait MapSurface {
    type Marker;

    fn set_view(&mut self, view: MapView);

    fn add_marker(&mut self, lat: f64, lon: f64, popup: &str) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);

    fn set_popup(&mut self, marker: &Self::Marker, content: &str);

    fn show_info(&mut self, panel: &InfoPanel);

    fn hide_info(&mut self);

    fn set_loading(&mut self, loading: bool);

    fn alert(&mut self, message: &str);
}

/// Mutable view state owned by the controller.
#[derive(Debug)]
pub struct MapViewState<M> {
    pub status: MapStatus,
    pub main_marker: Option<M>,
}

impl<M> Default for MapViewState<M> {
    fn default() -> Self {
        Self {
            status: MapStatus::Idle,
            main_marker: None,
        }
    }
}

pub struct MapController<S: MapSurface> {
    locator: Box<dyn Geolocator>,
    provider: Box<dyn ConditionsProvider>,
    surface: S,
    state: MapViewState<S::Marker>,
}

impl<S: MapSurface> MapController<S> {
    /// Build a controller and show the initial world view.
    pub fn new(
        locator: Box<dyn Geolocator>,
        provider: Box<dyn ConditionsProvider>,
        mut surface: S,
    ) -> Self {
        surface.set_view(INITIAL_VIEW);
        Self {
            locator,
            provider,
            surface,
            state: MapViewState::default(),
        }
    }

    pub fn status(&self) -> &MapStatus {
        &self.state.status
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn has_main_marker(&self) -> bool {
        self.state.main_marker.is_some()
    }

    /// Locate the caller by IP and show the weather there.
    ///
    /// On failure the map falls back to [`FALLBACK_VIEW`].
    pub async fn load(&mut self) -> Option<CurrentConditions> {
        self.state.status = MapStatus::Locating;
        self.surface.set_loading(true);

        let located = self.locator.locate().await;
        self.surface.set_loading(false);

        match located {
            Ok(location) => {
                tracing::info!("Location detected: {}", location.display_name());
                self.focus(location).await
            }
            Err(e) => {
                tracing::warn!("Error getting user location: {e}");
                self.state.status = MapStatus::Error(e.to_string());
                self.surface.set_view(FALLBACK_VIEW);
                None
            }
        }
    }

    /// Geocode `city` and show the weather there.
    pub async fn search(&mut self, city: &str) -> Option<CurrentConditions> {
        let city = city.trim();
        if city.is_empty() {
            self.surface.alert(EMPTY_SEARCH_ALERT);
            return None;
        }

        self.state.status = MapStatus::Locating;
        self.surface.set_loading(true);

        let resolved = self.provider.geocode(city).await;
        self.surface.set_loading(false);

        match resolved {
            Ok(location) => self.focus(location).await,
            Err(e) => {
                tracing::warn!("Error searching location {city:?}: {e}");
                self.state.status = MapStatus::Error(e.to_string());
                self.surface.alert(CITY_NOT_FOUND_ALERT);
                None
            }
        }
    }

    /// Treat a clicked coordinate as the new target location.
    pub async fn click(&mut self, lat: f64, lon: f64) -> Option<CurrentConditions> {
        tracing::debug!(lat, lon, "Map clicked");
        self.focus(GeoLocation {
            lat,
            lon,
            name: CLICKED_LOCATION_NAME.to_string(),
            country: None,
        })
        .await
    }

    pub fn close_info(&mut self) {
        self.surface.hide_info();
    }

    async fn focus(&mut self, location: GeoLocation) -> Option<CurrentConditions> {
        self.surface.set_view(MapView {
            lat: location.lat,
            lon: location.lon,
            zoom: FOCUS_ZOOM,
        });
        self.place_main_marker(&location);
        let (lat, lon) = (location.lat, location.lon);
        self.state.status = MapStatus::Located(location);
        self.show_weather(lat, lon).await
    }

    fn place_main_marker(&mut self, location: &GeoLocation) {
        if let Some(previous) = self.state.main_marker.take() {
            self.surface.remove_marker(previous);
        }
        let popup = format!("{}\n{}", location.display_name(), LOADING_POPUP);
        let marker = self.surface.add_marker(location.lat, location.lon, &popup);
        self.state.main_marker = Some(marker);
    }

    /// Fetch current conditions and fill the info panel and marker popup.
    pub async fn show_weather(&mut self, lat: f64, lon: f64) -> Option<CurrentConditions> {
        match self.provider.current(lat, lon).await {
            Ok(conditions) => {
                self.surface
                    .show_info(&InfoPanel::from_conditions(&conditions));
                if let Some(marker) = &self.state.main_marker {
                    self.surface.set_popup(marker, &weather_popup(&conditions));
                }
                Some(conditions)
            }
            Err(e) => {
                tracing::warn!("Error fetching weather for ({lat}, {lon}): {e}");
                self.surface.alert(WEATHER_UNAVAILABLE_ALERT);
                None
            }
        }
    }
}
