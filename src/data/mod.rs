//! Core data models for the weather intelligence core
//!
//! This module contains the typed results handed to downstream consumers:
//! current-weather snapshots, forecast entries, provider alerts and the
//! forecast summary used by dashboards.

pub mod weather;

pub use weather::WeatherClient;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rejects coordinates outside the valid latitude/longitude ranges
///
/// # Errors
/// Returns `Error::InvalidArgument` for non-finite values, latitudes outside
/// [-90, 90] or longitudes outside [-180, 180].
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidArgument(format!(
            "latitude {lat} must be within [-90, 90]"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::InvalidArgument(format!(
            "longitude {lon} must be within [-180, 180]"
        )));
    }
    Ok(())
}

/// A single immutable observation of weather state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature in the configured unit system (°C for metric)
    pub temperature: f64,
    /// Apparent temperature
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: f64,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    /// Wind speed (m/s for metric)
    pub wind_speed: f64,
    /// Wind direction in degrees (0-360)
    pub wind_direction: f64,
    /// Precipitation amount in mm
    pub precipitation: f64,
    /// Provider's textual description, e.g. "clear sky"
    pub description: String,
    /// Provider icon code, e.g. "01d"
    pub icon: String,
    /// Location name reported by the provider
    pub location: String,
    /// ISO country code reported by the provider
    pub country: String,
    /// When the observation was captured (or is forecast for)
    pub captured_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Checks every numeric field for finiteness and physical range
    ///
    /// # Errors
    /// Returns `Error::InvalidData` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("temperature", self.temperature),
            ("feels_like", self.feels_like),
            ("humidity", self.humidity),
            ("pressure", self.pressure),
            ("wind_speed", self.wind_speed),
            ("wind_direction", self.wind_direction),
            ("precipitation", self.precipitation),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidData(format!("{name} is not a number: {value}")));
        }

        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(Error::InvalidData(format!(
                "humidity {} outside 0-100",
                self.humidity
            )));
        }
        if self.pressure <= 0.0 {
            return Err(Error::InvalidData(format!(
                "pressure {} must be positive",
                self.pressure
            )));
        }
        if self.wind_speed < 0.0 {
            return Err(Error::InvalidData(format!(
                "wind speed {} must not be negative",
                self.wind_speed
            )));
        }
        if !(0.0..=360.0).contains(&self.wind_direction) {
            return Err(Error::InvalidData(format!(
                "wind direction {} outside 0-360",
                self.wind_direction
            )));
        }
        if self.precipitation < 0.0 {
            return Err(Error::InvalidData(format!(
                "precipitation {} must not be negative",
                self.precipitation
            )));
        }
        Ok(())
    }
}

/// One daily or hourly forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Calendar date (UTC) the step belongs to
    pub date: NaiveDate,
    /// Weather expected for this step
    pub weather: WeatherSnapshot,
    /// Probability of precipitation as a percentage (0-100)
    pub precipitation_probability: f64,
}

/// Severity derived from an alert's wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// Keyword tiers in the order they are checked
const SEVERITY_TIERS: &[(AlertSeverity, &[&str])] = &[
    (
        AlertSeverity::High,
        &[
            "severe",
            "extreme",
            "danger",
            "warning",
            "emergency",
            "hurricane",
            "tornado",
        ],
    ),
    (AlertSeverity::Medium, &["watch", "advisory", "caution", "alert"]),
    (
        AlertSeverity::Low,
        &["statement", "outlook", "information", "update"],
    ),
];

impl AlertSeverity {
    /// Matches the event name and description against keyword tiers
    ///
    /// Tiers are checked high, then medium, then low; the first tier with a
    /// keyword in either text wins. No match is `Low`.
    pub fn classify(event: &str, description: &str) -> Self {
        let event = event.to_lowercase();
        let description = description.to_lowercase();

        SEVERITY_TIERS
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|k| event.contains(k) || description.contains(k))
            })
            .map(|(severity, _)| *severity)
            .unwrap_or(AlertSeverity::Low)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

/// A provider-issued weather alert annotated with derived severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub event: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub severity: AlertSeverity,
    /// Issuing agency
    pub sender: String,
    pub tags: Vec<String>,
}

/// Min/max/average of one quantity over a forecast
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl Range {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            min,
            max,
            avg: sum / count as f64,
        }
    }
}

/// Aggregate view over a list of forecast entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub temperature: Range,
    pub humidity: Range,
    /// Total precipitation in mm
    pub precipitation_total: f64,
    /// Entries with any precipitation
    pub entries_with_rain: usize,
}

impl ForecastSummary {
    /// Summarizes a forecast; an empty forecast yields all zeros
    pub fn from_entries(entries: &[ForecastEntry]) -> Self {
        Self {
            temperature: Range::over(entries.iter().map(|e| e.weather.temperature)),
            humidity: Range::over(entries.iter().map(|e| e.weather.humidity)),
            precipitation_total: entries.iter().map(|e| e.weather.precipitation).sum(),
            entries_with_rain: entries
                .iter()
                .filter(|e| e.weather.precipitation > 0.0)
                .count(),
        }
    }
}
