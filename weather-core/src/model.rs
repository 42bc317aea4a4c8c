use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeatherError};

/// Label used for observations that arrive without a condition.
pub const UNKNOWN_CONDITION: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(WeatherError::validation(format!(
                "Invalid latitude: {}. Latitude must be between -90 and 90",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(WeatherError::validation(format!(
                "Invalid longitude: {}. Longitude must be between -180 and 180",
                self.lon
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForecastEntry {
    pub date: DateTime<Utc>,
    pub temperature: f64,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

/// Body of `POST /api/weather`.
///
/// Required fields are plain values so a payload missing any of them never
/// deserializes; unknown fields are rejected as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewWeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl NewWeatherRecord {
    /// Trims text fields and checks the values the type system can't.
    pub fn validate(mut self) -> Result<Self> {
        self.city = required_text("city", &self.city)?;
        self.country = required_text("country", &self.country)?;
        self.condition = required_text("condition", &self.condition)?;

        for (field, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("windSpeed", self.wind_speed),
        ] {
            if !value.is_finite() {
                return Err(WeatherError::validation(format!(
                    "Field `{field}` must be a finite number"
                )));
            }
        }

        if let Some(coordinates) = &self.coordinates {
            coordinates.validate()?;
        }

        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(self)
    }
}

fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WeatherError::validation(format!(
            "Field `{field}` is required"
        )));
    }
    Ok(trimmed.to_string())
}

/// A persisted observation as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    /// Number of records that precede this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionCount {
    pub condition: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub total: u64,
    pub conditions: Vec<ConditionCount>,
}

/// Counts condition labels in first-seen order; blank labels count as
/// [`UNKNOWN_CONDITION`].
pub fn tally_conditions<'a>(conditions: impl IntoIterator<Item = &'a str>) -> Vec<ConditionCount> {
    let mut tally: Vec<ConditionCount> = Vec::new();

    for raw in conditions {
        let label = match raw.trim() {
            "" => UNKNOWN_CONDITION,
            label => label,
        };

        match tally.iter_mut().find(|c| c.condition == label) {
            Some(entry) => entry.count += 1,
            None => tally.push(ConditionCount {
                condition: label.to_string(),
                count: 1,
            }),
        }
    }

    tally
}

/// A place resolved by IP geolocation or geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: Option<String>,
}

impl GeoLocation {
    /// "Name, Country", or just the name when the country is unknown.
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) if !country.is_empty() => format!("{}, {}", self.name, country),
            _ => self.name.clone(),
        }
    }
}

/// Current conditions at a coordinate, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub provider: String,
    pub location_name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub condition: String,
    pub description: String,
    pub observation_time: DateTime<Utc>,
}

impl CurrentConditions {
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country)
        }
    }

    /// Shape the observation as a record for the save endpoint.
    pub fn into_new_record(self) -> NewWeatherRecord {
        NewWeatherRecord {
            city: self.location_name,
            country: self.country,
            temperature: self.temperature_c,
            humidity: self.humidity_pct,
            wind_speed: self.wind_speed_mps,
            condition: self.condition,
            description: Some(self.description).filter(|d| !d.is_empty()),
            forecast: Vec::new(),
            coordinates: Some(self.coordinates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paris() -> serde_json::Value {
        json!({
            "city": "Paris",
            "country": "FR",
            "temperature": 18,
            "humidity": 60,
            "windSpeed": 5,
            "condition": "Cloudy"
        })
    }

    #[test]
    fn new_record_defaults_optional_fields() {
        let rec: NewWeatherRecord = serde_json::from_value(paris()).unwrap();

        assert_eq!(rec.city, "Paris");
        assert_eq!(rec.wind_speed, 5.0);
        assert!(rec.forecast.is_empty());
        assert!(rec.description.is_none());
        assert!(rec.coordinates.is_none());
    }

    #[test]
    fn new_record_rejects_missing_required_field() {
        let mut body = paris();
        body.as_object_mut().unwrap().remove("humidity");

        let err = serde_json::from_value::<NewWeatherRecord>(body).unwrap_err();
        assert!(err.to_string().contains("missing field `humidity`"));
    }

    #[test]
    fn new_record_rejects_unknown_and_mistyped_fields() {
        let mut body = paris();
        body["pressure"] = json!(1013);
        let err = serde_json::from_value::<NewWeatherRecord>(body).unwrap_err();
        assert!(err.to_string().contains("unknown field `pressure`"));

        let mut body = paris();
        body["temperature"] = json!("warm");
        assert!(serde_json::from_value::<NewWeatherRecord>(body).is_err());
    }

    #[test]
    fn validate_trims_and_rejects_blank_text() {
        let mut rec: NewWeatherRecord = serde_json::from_value(paris()).unwrap();
        rec.city = "  Paris ".into();
        rec.description = Some("   ".into());

        let rec = rec.validate().unwrap();
        assert_eq!(rec.city, "Paris");
        assert!(rec.description.is_none());

        let mut blank: NewWeatherRecord = serde_json::from_value(paris()).unwrap();
        blank.country = "  ".into();
        let err = blank.validate().unwrap_err();
        assert!(matches!(err, WeatherError::Validation(ref m) if m.contains("country")));
    }

    #[test]
    fn validate_checks_coordinate_ranges() {
        let mut rec: NewWeatherRecord = serde_json::from_value(paris()).unwrap();
        rec.coordinates = Some(Coordinates { lat: 91.0, lon: 2.35 });
        assert!(rec.clone().validate().is_err());

        rec.coordinates = Some(Coordinates { lat: 48.85, lon: 2.35 });
        assert!(rec.validate().is_ok());
    }

    #[test]
    fn pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).pages, 2);
        assert_eq!(Pagination::new(3, 7, 50).pages, 8);
        assert_eq!(Pagination::new(3, 7, 50).offset(), 14);
    }

    #[test]
    fn tally_keeps_first_seen_order_and_counts_blank_as_unknown() {
        let tally = tally_conditions(["Cloudy", "Rain", "", "Cloudy", "  "]);

        assert_eq!(
            tally,
            vec![
                ConditionCount { condition: "Cloudy".into(), count: 2 },
                ConditionCount { condition: "Rain".into(), count: 1 },
                ConditionCount { condition: UNKNOWN_CONDITION.into(), count: 2 },
            ]
        );
    }

    #[test]
    fn record_uses_underscore_id_and_camel_case() {
        let rec = WeatherRecord {
            id: "abc".into(),
            city: "Paris".into(),
            country: "FR".into(),
            temperature: 18.0,
            humidity: 60.0,
            wind_speed: 5.0,
            condition: "Cloudy".into(),
            description: None,
            forecast: vec![],
            coordinates: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["windSpeed"], 5.0);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("description").is_none());
    }
}
