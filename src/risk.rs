//! Weather risk scoring
//!
//! Turns a weather snapshot into a bounded risk score. Each feature is
//! normalized against a fixed physical domain, combined with fixed weights,
//! and squashed through the logistic function. The result is a heuristic
//! hazard indicator, not a calibrated probability.

use serde::{Deserialize, Serialize};

use crate::data::{ForecastEntry, WeatherSnapshot};

/// Scores below this are `Low`
const LOW_THRESHOLD: f64 = 0.3;

/// Scores below this (and at least `LOW_THRESHOLD`) are `Moderate`
const MODERATE_THRESHOLD: f64 = 0.6;

/// Discrete risk level derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Maps a score to a level: `< 0.3` low, `< 0.6` moderate, else high
    pub fn from_score(score: f64) -> Self {
        if score < LOW_THRESHOLD {
            RiskLevel::Low
        } else if score < MODERATE_THRESHOLD {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Fixed per-feature weights for the weighted sum
#[derive(Debug, Clone, Copy, PartialEq)]
struct RiskWeights {
    temperature: f64,
    humidity: f64,
    wind_speed: f64,
    precipitation: f64,
    pressure: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            humidity: 0.2,
            wind_speed: 0.2,
            precipitation: 0.3,
            pressure: 0.1,
        }
    }
}

/// Snapshot features after normalization to roughly 0-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskFeatures {
    /// `(t + 20) / 60`, domain -20..40 °C
    pub temperature: f64,
    /// `h / 100`
    pub humidity: f64,
    /// `w / 50`, domain 0..50 m/s
    pub wind_speed: f64,
    /// `min(p / 100, 1)`, capped at 100 mm
    pub precipitation: f64,
    /// `(p - 950) / 100`, domain 950..1050 hPa
    pub pressure: f64,
}

impl RiskFeatures {
    /// Extracts and normalizes the five scored features
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        Self {
            temperature: (snapshot.temperature + 20.0) / 60.0,
            humidity: snapshot.humidity / 100.0,
            wind_speed: snapshot.wind_speed / 50.0,
            precipitation: (snapshot.precipitation / 100.0).min(1.0),
            pressure: (snapshot.pressure - 950.0) / 100.0,
        }
    }
}

/// Weighted logistic risk model
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer {
    weights: RiskWeights,
}

impl RiskScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weighted sum of the normalized features, before the logistic squash
    pub fn weighted_sum(&self, snapshot: &WeatherSnapshot) -> f64 {
        let f = RiskFeatures::from_snapshot(snapshot);
        let w = &self.weights;

        f.temperature * w.temperature
            + f.humidity * w.humidity
            + f.wind_speed * w.wind_speed
            + f.precipitation * w.precipitation
            + f.pressure * w.pressure
    }

    /// Risk score in [0, 1]
    ///
    /// Extreme inputs saturate at the bounds; a non-finite sum scores 0.5.
    pub fn score(&self, snapshot: &WeatherSnapshot) -> f64 {
        let x = self.weighted_sum(snapshot);
        if x.is_nan() {
            return 0.5;
        }
        (1.0 / (1.0 + (-x).exp())).clamp(0.0, 1.0)
    }

    /// Scores every forecast entry in order
    pub fn score_forecast(&self, forecast: &[ForecastEntry]) -> Vec<f64> {
        forecast.iter().map(|entry| self.score(&entry.weather)).collect()
    }
}
