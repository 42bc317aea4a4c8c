//! Plain-text backends for the dashboard and the map, plus record formatting.

use chrono::Local;
use std::collections::BTreeMap;
use weather_core::{
    ConditionSummary, WeatherRecord,
    dashboard::{ChartKind, ChartRenderer, ChartSpec},
    map::{InfoPanel, MapSurface, MapView},
};

const BAR_WIDTH: f64 = 30.0;

/// Draws charts as horizontal bar blocks.
#[derive(Debug, Default)]
pub struct TextCharts {
    header: Option<String>,
    next_handle: usize,
    charts: BTreeMap<usize, (ChartKind, Vec<String>)>,
}

impl TextCharts {
    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    /// Header followed by every live chart, in drawing order.
    pub fn output(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
            out.push('\n');
        }
        for (kind, lines) in self.charts.values() {
            out.push('\n');
            out.push_str(chart_title(*kind));
            out.push('\n');
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

fn chart_title(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Temperature => "Temperature Trend",
        ChartKind::ConditionDistribution => "Weather Conditions",
        ChartKind::HumidityWind => "Humidity & Wind Speed",
    }
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || !value.is_finite() {
        return String::new();
    }
    let width = (value.max(0.0) / max * BAR_WIDTH).round() as usize;
    "#".repeat(width)
}

impl ChartRenderer for TextCharts {
    type Handle = usize;

    fn render(&mut self, spec: &ChartSpec) -> usize {
        let label_width = spec.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let mut lines = Vec::new();

        for dataset in &spec.datasets {
            if spec.datasets.len() > 1 {
                lines.push(format!("  {}", dataset.label));
            }
            let max = dataset.values.iter().copied().fold(0.0_f64, f64::max);
            for (label, value) in spec.labels.iter().zip(&dataset.values) {
                lines.push(format!(
                    "  {label:<label_width$}  {value:>7.1}  {}",
                    bar(*value, max)
                ));
            }
        }

        self.next_handle += 1;
        self.charts.insert(self.next_handle, (spec.kind, lines));
        self.next_handle
    }

    fn dispose(&mut self, handle: usize) {
        self.charts.remove(&handle);
    }

    fn set_header(&mut self, city: &str) {
        self.header = Some(format!("Weather Dashboard: {city}"));
    }
}

/// Records every map action as a line of text.
#[derive(Debug, Default)]
pub struct TextMap {
    next_marker: usize,
    markers: BTreeMap<usize, String>,
    lines: Vec<String>,
}

impl TextMap {
    pub fn transcript(&self) -> &[String] {
        &self.lines
    }

    /// Popup text of every marker still on the map.
    pub fn marker_popups(&self) -> Vec<&str> {
        self.markers.values().map(String::as_str).collect()
    }
}

impl MapSurface for TextMap {
    type Marker = usize;

    fn set_view(&mut self, view: MapView) {
        self.lines.push(format!(
            "Map centered at {:.4}, {:.4} (zoom {})",
            view.lat, view.lon, view.zoom
        ));
    }

    fn add_marker(&mut self, lat: f64, lon: f64, popup: &str) -> usize {
        self.next_marker += 1;
        self.markers.insert(self.next_marker, popup.to_string());
        self.lines.push(format!("Marker at {lat:.4}, {lon:.4}"));
        self.next_marker
    }

    fn remove_marker(&mut self, marker: usize) {
        self.markers.remove(&marker);
    }

    fn set_popup(&mut self, marker: &usize, content: &str) {
        if let Some(popup) = self.markers.get_mut(marker) {
            *popup = content.to_string();
        }
    }

    fn show_info(&mut self, panel: &InfoPanel) {
        self.lines.push(panel.location.clone());
        self.lines.push(format!("  Temperature: {}", panel.temperature));
        self.lines.push(format!("  Conditions:  {}", panel.condition));
        self.lines.push(format!("  Humidity:    {}", panel.humidity));
        self.lines.push(format!("  Wind:        {}", panel.wind));
    }

    fn hide_info(&mut self) {}

    fn set_loading(&mut self, loading: bool) {
        if loading {
            self.lines.push("Loading...".to_string());
        }
    }

    fn alert(&mut self, message: &str) {
        self.lines.push(format!("! {message}"));
    }
}

/// Multi-line, human-readable description of a stored record.
pub fn format_record(record: &WeatherRecord) -> String {
    let mut out = format!(
        "{}, {}  [{}]\n  {:.1}°C, {}",
        record.city,
        record.country,
        record.id,
        record.temperature,
        record.condition
    );
    if let Some(description) = &record.description {
        out.push_str(&format!(" ({description})"));
    }
    out.push_str(&format!(
        "\n  Humidity {:.0}%, wind {:.1} m/s\n  Recorded {}",
        record.humidity,
        record.wind_speed,
        record
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(c) = record.coordinates {
        out.push_str(&format!("\n  At {:.4}, {:.4}", c.lat, c.lon));
    }
    if !record.forecast.is_empty() {
        out.push_str(&format!("\n  Forecast entries: {}", record.forecast.len()));
    }
    out
}

/// One line per record, for listings.
pub fn format_record_row(record: &WeatherRecord) -> String {
    format!(
        "{}  {:<20} {:>6.1}°C  {:<12} {}",
        record
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M"),
        format!("{}, {}", record.city, record.country),
        record.temperature,
        record.condition,
        record.id
    )
}

/// Condition counts with their share of all records.
pub fn format_summary(summary: &ConditionSummary) -> String {
    if summary.total == 0 {
        return "No weather records found.".to_string();
    }

    let width = summary
        .conditions
        .iter()
        .map(|c| c.condition.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = format!("{} records", summary.total);
    for c in &summary.conditions {
        let share = c.count as f64 / summary.total as f64 * 100.0;
        out.push_str(&format!(
            "\n  {:<width$}  {:>5}  {:>5.1}%",
            c.condition, c.count, share
        ));
    }
    out
}
