//! Dashboard data loading and chart slot management.
//!
//! The loader turns the newest records from the API into chart series; the
//! view owns the three chart slots and hands series to a [`ChartRenderer`].

use chrono::{DateTime, Local, Utc};

use crate::{
    client::WeatherApiClient,
    model::{ConditionCount, WeatherRecord, tally_conditions},
};

/// How many records the dashboard asks for when not told otherwise.
pub const DEFAULT_RECORD_COUNT: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardState {
    /// Nothing to chart: the API failed or holds no records.
    Placeholder,
    Ready(DashboardData),
}

/// Series derived from a window of records, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    /// City of the newest record, shown as the dashboard header.
    pub city: String,
    pub labels: Vec<String>,
    pub temperatures: Vec<f64>,
    pub humidities: Vec<f64>,
    pub wind_speeds: Vec<f64>,
    pub conditions: Vec<ConditionCount>,
}

impl DashboardData {
    /// Build series from records ordered newest first, as the API returns them.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_records(newest_first: &[WeatherRecord]) -> Option<Self> {
        let newest = newest_first.first()?;
        let chronological: Vec<&WeatherRecord> = newest_first.iter().rev().collect();

        Some(Self {
            city: newest.city.clone(),
            labels: chronological
                .iter()
                .map(|r| time_label(r.created_at))
                .collect(),
            temperatures: chronological.iter().map(|r| r.temperature).collect(),
            humidities: chronological.iter().map(|r| r.humidity).collect(),
            wind_speeds: chronological.iter().map(|r| r.wind_speed).collect(),
            conditions: tally_conditions(chronological.iter().map(|r| r.condition.as_str())),
        })
    }
}

/// Local wall-clock `HH:MM` for a timestamp.
pub fn time_label(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

#[derive(Debug, Clone)]
pub struct DashboardLoader {
    client: WeatherApiClient,
    count: u64,
}

impl DashboardLoader {
    pub fn new(client: WeatherApiClient) -> Self {
        Self {
            client,
            count: DEFAULT_RECORD_COUNT,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count.max(1);
        self
    }

    /// Fetch the newest records and shape them for the charts.
    ///
    /// Never fails: API errors and an empty store both yield
    /// [`DashboardState::Placeholder`].
    pub async fn load(&self) -> DashboardState {
        match self.client.all(1, self.count).await {
            Ok(page) => match DashboardData::from_records(&page.records) {
                Some(data) => DashboardState::Ready(data),
                None => {
                    tracing::info!("No weather records found, showing placeholder dashboard");
                    DashboardState::Placeholder
                }
            },
            Err(e) => {
                tracing::warn!("Failed to load dashboard records: {e}");
                DashboardState::Placeholder
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Temperature trend line.
    Temperature,
    /// Doughnut of condition frequencies.
    ConditionDistribution,
    /// Humidity and wind speed bars.
    HumidityWind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSpec {
    pub fn temperature(data: &DashboardData) -> Self {
        Self {
            kind: ChartKind::Temperature,
            labels: data.labels.clone(),
            datasets: vec![Dataset {
                label: "Temperature (°C)".to_string(),
                values: data.temperatures.clone(),
            }],
        }
    }

    pub fn condition_distribution(data: &DashboardData) -> Self {
        Self {
            kind: ChartKind::ConditionDistribution,
            labels: data.conditions.iter().map(|c| c.condition.clone()).collect(),
            datasets: vec![Dataset {
                label: "Conditions".to_string(),
                values: data.conditions.iter().map(|c| c.count as f64).collect(),
            }],
        }
    }

    pub fn humidity_wind(data: &DashboardData) -> Self {
        Self {
            kind: ChartKind::HumidityWind,
            labels: data.labels.clone(),
            datasets: vec![
                Dataset {
                    label: "Humidity (%)".to_string(),
                    values: data.humidities.clone(),
                },
                Dataset {
                    label: "Wind Speed (m/s)".to_string(),
                    values: data.wind_speeds.clone(),
                },
            ],
        }
    }
}

/// Drawing backend for dashboard charts.
pub trait ChartRenderer {
    type Handle;

    fn render(&mut self, spec: &ChartSpec) -> Self::Handle;

    /// Release a chart previously returned by [`ChartRenderer::render`].
    fn dispose(&mut self, handle: Self::Handle);

    fn set_header(&mut self, city: &str);
}

/// Owns the dashboard's chart slots.
pub struct DashboardView<R: ChartRenderer> {
    renderer: R,
    temperature: Option<R::Handle>,
    distribution: Option<R::Handle>,
    humidity_wind: Option<R::Handle>,
}

impl<R: ChartRenderer> DashboardView<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            temperature: None,
            distribution: None,
            humidity_wind: None,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_rendered(&self) -> bool {
        self.temperature.is_some() || self.distribution.is_some() || self.humidity_wind.is_some()
    }

    /// Draw `state`. A placeholder leaves the current slots untouched.
    pub fn render(&mut self, state: &DashboardState) {
        let DashboardState::Ready(data) = state else {
            return;
        };

        self.renderer.set_header(&data.city);

        let specs = [
            ChartSpec::temperature(data),
            ChartSpec::condition_distribution(data),
            ChartSpec::humidity_wind(data),
        ];
        for spec in &specs {
            let slot = match spec.kind {
                ChartKind::Temperature => &mut self.temperature,
                ChartKind::ConditionDistribution => &mut self.distribution,
                ChartKind::HumidityWind => &mut self.humidity_wind,
            };
            if let Some(previous) = slot.take() {
                self.renderer.dispose(previous);
            }
            *slot = Some(self.renderer.render(spec));
        }
    }
}
