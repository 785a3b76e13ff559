//! UK Safe weather intelligence core
//!
//! Rate-limited, cached OpenWeatherMap client plus the analytics built on it:
//! risk scoring, trend classification and accuracy tracking. The binary in
//! `main.rs` is a thin JSON front end over this library.

pub mod accuracy;
pub mod assessment;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod limiter;
pub mod risk;
pub mod trend;

pub use accuracy::{AccuracyReport, AccuracyTracker, MetricStats};
pub use assessment::{RiskAssessment, RiskAssessor, WeatherTrends};
pub use cache::{CacheStats, TtlCache};
pub use config::WeatherConfig;
pub use data::{
    AlertSeverity, ForecastEntry, ForecastSummary, WeatherAlert, WeatherClient, WeatherSnapshot,
};
pub use error::{Error, Result};
pub use limiter::RateLimiter;
pub use risk::{RiskLevel, RiskScorer};
pub use trend::{Trend, TrendAnalyzer, TrendReport};
