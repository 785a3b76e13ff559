//! Composite risk assessment
//!
//! Combines current conditions and the daily forecast into a scored,
//! levelled and trend-annotated [`RiskAssessment`] with human-readable
//! recommendations for alerting and dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{ForecastEntry, ForecastSummary, WeatherClient, WeatherSnapshot};
use crate::error::Result;
use crate::risk::{RiskLevel, RiskScorer};
use crate::trend::{Trend, TrendAnalyzer, TrendReport};

/// Forecast horizon used for the score trend
pub const ASSESSMENT_FORECAST_DAYS: u32 = 7;

/// Result of one assessment; created fresh on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Score of the current snapshot, in [0, 1]
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    /// Direction of the forecast score series, absent without a forecast
    pub trend: Option<Trend>,
    /// Daily forecast scores the trend was derived from
    pub forecast_scores: Vec<f64>,
    pub assessed_at: DateTime<Utc>,
}

/// Temperature, humidity and precipitation trends over a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTrends {
    pub temperature: TrendReport,
    pub humidity: TrendReport,
    pub precipitation: TrendReport,
    pub summary: ForecastSummary,
}

/// Scores weather for a location and explains the result
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    client: WeatherClient,
    scorer: RiskScorer,
    analyzer: TrendAnalyzer,
}

impl RiskAssessor {
    pub fn new(client: WeatherClient) -> Self {
        Self {
            client,
            scorer: RiskScorer::new(),
            analyzer: TrendAnalyzer::risk(),
        }
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    /// Fetches current conditions and the 7-day forecast, then assesses them
    ///
    /// Both requests run concurrently and always run to completion, so each
    /// outcome is recorded; either failing fails the assessment.
    pub async fn assess(&self, lat: f64, lon: f64) -> Result<RiskAssessment> {
        let (current, forecast) = futures::future::join(
            self.client.get_current(lat, lon),
            self.client.get_forecast(lat, lon, ASSESSMENT_FORECAST_DAYS),
        )
        .await;
        let (current, forecast) = (current?, forecast?);

        let assessment = self.assess_snapshot(&current, &forecast);
        info!(
            "Risk at ({}, {}): {:.3} ({})",
            lat,
            lon,
            assessment.risk_score,
            assessment.risk_level.as_str()
        );
        Ok(assessment)
    }

    /// Assesses already-fetched data without any I/O
    ///
    /// An empty forecast yields no trend.
    pub fn assess_snapshot(
        &self,
        current: &WeatherSnapshot,
        forecast: &[ForecastEntry],
    ) -> RiskAssessment {
        let risk_score = self.scorer.score(current);
        let risk_level = RiskLevel::from_score(risk_score);
        let forecast_scores = self.scorer.score_forecast(forecast);
        let trend = (!forecast_scores.is_empty()).then(|| self.analyzer.classify(&forecast_scores));

        RiskAssessment {
            risk_score,
            risk_level,
            recommendations: recommendations(risk_level, trend),
            trend,
            forecast_scores,
            assessed_at: Utc::now(),
        }
    }

    /// Per-quantity trends and a summary over a forecast
    pub fn weather_trends(forecast: &[ForecastEntry]) -> WeatherTrends {
        WeatherTrends {
            temperature: TrendAnalyzer::temperature()
                .report(&series(forecast, |w| w.temperature)),
            humidity: TrendAnalyzer::humidity().report(&series(forecast, |w| w.humidity)),
            precipitation: TrendAnalyzer::precipitation_report(&series(forecast, |w| {
                w.precipitation
            })),
            summary: ForecastSummary::from_entries(forecast),
        }
    }
}

fn series(forecast: &[ForecastEntry], field: impl Fn(&WeatherSnapshot) -> f64) -> Vec<f64> {
    forecast.iter().map(|e| field(&e.weather)).collect()
}

/// Advice for a risk level, followed by a note on the trend if there is one
pub fn recommendations(level: RiskLevel, trend: Option<Trend>) -> Vec<String> {
    let advice: &[&str] = match level {
        RiskLevel::Low => &["Current conditions are generally safe."],
        RiskLevel::Moderate => &[
            "Take standard precautions.",
            "Stay informed about local weather updates.",
        ],
        RiskLevel::High => &[
            "High risk conditions detected.",
            "Take immediate safety measures.",
            "Stay indoors if possible.",
        ],
    };

    let trend_note = trend.map(|t| match t {
        Trend::Increasing => "Risk is increasing. Stay alert.",
        Trend::Decreasing => "Risk is decreasing. Monitor conditions.",
        Trend::Stable => "Risk levels are stable.",
    });

    advice
        .iter()
        .copied()
        .chain(trend_note)
        .map(str::to_string)
        .collect()
}
