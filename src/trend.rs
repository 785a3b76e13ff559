//! Trend classification over numeric series
//!
//! A series is labelled by the mean of its consecutive differences compared
//! against a domain threshold. The same analyzer serves risk scores,
//! temperature and humidity; only the threshold changes.

use serde::{Deserialize, Serialize};

/// Share of steps one direction needs before [`TrendAnalyzer::majority`] reports it
const MAJORITY_SHARE: f64 = 0.6;

/// Direction of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }

    /// Labels one change against a threshold
    fn of_change(change: f64, threshold: f64) -> Self {
        if change > threshold {
            Trend::Increasing
        } else if change < -threshold {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

/// Overall and per-step view of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Label from the mean step change
    pub overall: Trend,
    /// Mean of consecutive differences, 0 for fewer than two points
    pub mean_change: f64,
    /// Label of every consecutive step
    pub steps: Vec<Trend>,
}

/// Threshold-based trend classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendAnalyzer {
    threshold: f64,
}

impl TrendAnalyzer {
    /// Custom threshold; negative values are treated as their magnitude
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
        }
    }

    /// Risk score series, ±0.1 per step
    pub fn risk() -> Self {
        Self::with_threshold(0.1)
    }

    /// Temperature series, ±2 °C per step
    pub fn temperature() -> Self {
        Self::with_threshold(2.0)
    }

    /// Humidity series, ±10 % per step
    pub fn humidity() -> Self {
        Self::with_threshold(10.0)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies a series by its mean step change
    ///
    /// Fewer than two points is `Stable`.
    pub fn classify(&self, series: &[f64]) -> Trend {
        match mean_change(series) {
            Some(change) => Trend::of_change(change, self.threshold),
            None => Trend::Stable,
        }
    }

    /// Labels every consecutive step of a series
    pub fn step_trends(&self, series: &[f64]) -> Vec<Trend> {
        series
            .windows(2)
            .map(|pair| Trend::of_change(pair[1] - pair[0], self.threshold))
            .collect()
    }

    /// Overall label, mean change and step labels in one pass
    pub fn report(&self, series: &[f64]) -> TrendReport {
        TrendReport {
            overall: self.classify(series),
            mean_change: mean_change(series).unwrap_or(0.0),
            steps: self.step_trends(series),
        }
    }

    /// Direction shared by more than 60 % of the steps, if any
    pub fn majority(steps: &[Trend]) -> Option<Trend> {
        if steps.is_empty() {
            return None;
        }

        let total = steps.len() as f64;
        [Trend::Increasing, Trend::Decreasing, Trend::Stable]
            .into_iter()
            .find(|trend| {
                let count = steps.iter().filter(|s| *s == trend).count();
                count as f64 / total > MAJORITY_SHARE
            })
    }

    /// Precipitation steps: rain appearing is increasing, rain stopping is decreasing
    pub fn precipitation_steps(series: &[f64]) -> Vec<Trend> {
        series
            .windows(2)
            .map(|pair| match (pair[0] > 0.0, pair[1] > 0.0) {
                (false, true) => Trend::Increasing,
                (true, false) => Trend::Decreasing,
                _ => Trend::Stable,
            })
            .collect()
    }

    /// Precipitation report built from [`precipitation_steps`](Self::precipitation_steps)
    ///
    /// The overall label is the step majority, falling back to `Stable`.
    pub fn precipitation_report(series: &[f64]) -> TrendReport {
        let steps = Self::precipitation_steps(series);
        TrendReport {
            overall: Self::majority(&steps).unwrap_or(Trend::Stable),
            mean_change: mean_change(series).unwrap_or(0.0),
            steps,
        }
    }
}

fn mean_change(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let total: f64 = series.windows(2).map(|pair| pair[1] - pair[0]).sum();
    Some(total / (series.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_risk_series_is_increasing() {
        assert_eq!(TrendAnalyzer::risk().classify(&[0.1, 0.3, 0.5]), Trend::Increasing);
    }

    #[test]
    fn test_small_drift_is_stable() {
        assert_eq!(TrendAnalyzer::risk().classify(&[0.5, 0.48, 0.47]), Trend::Stable);
    }

    #[test]
    fn test_falling_series_is_decreasing() {
        assert_eq!(TrendAnalyzer::risk().classify(&[0.9, 0.6, 0.4]), Trend::Decreasing);
    }

    #[test]
    fn test_short_series_is_stable() {
        let analyzer = TrendAnalyzer::risk();
        assert_eq!(analyzer.classify(&[]), Trend::Stable);
        assert_eq!(analyzer.classify(&[0.9]), Trend::Stable);
        assert!(analyzer.step_trends(&[0.9]).is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Mean step of exactly 2.0 does not exceed the temperature threshold
        assert_eq!(TrendAnalyzer::temperature().classify(&[20.0, 22.0, 24.0]), Trend::Stable);
        assert_eq!(TrendAnalyzer::temperature().classify(&[20.0, 23.0, 26.0]), Trend::Increasing);
        assert_eq!(TrendAnalyzer::humidity().classify(&[90.0, 75.0, 60.0]), Trend::Decreasing);
    }

    #[test]
    fn test_with_threshold_uses_magnitude() {
        let analyzer = TrendAnalyzer::with_threshold(-0.5);
        assert_eq!(analyzer.threshold(), 0.5);
        assert_eq!(analyzer.classify(&[0.0, 1.0]), Trend::Increasing);
    }

    #[test]
    fn test_report_has_step_labels() {
        let report = TrendAnalyzer::temperature().report(&[20.0, 25.0, 25.5, 21.0]);

        assert_eq!(
            report.steps,
            vec![Trend::Increasing, Trend::Stable, Trend::Decreasing]
        );
        assert!((report.mean_change - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.overall, Trend::Stable);
    }

    #[test]
    fn test_majority_needs_more_than_sixty_percent() {
        use Trend::*;
        assert_eq!(
            TrendAnalyzer::majority(&[Increasing, Increasing, Increasing, Increasing, Stable]),
            Some(Increasing)
        );
        // Exactly 60 % is not a majority
        assert_eq!(
            TrendAnalyzer::majority(&[Decreasing, Decreasing, Decreasing, Stable, Increasing]),
            None
        );
        assert_eq!(TrendAnalyzer::majority(&[]), None);
    }

    #[test]
    fn test_precipitation_steps_track_rain_onset() {
        use Trend::*;
        let steps = TrendAnalyzer::precipitation_steps(&[0.0, 2.5, 4.0, 0.0, 0.0]);
        assert_eq!(steps, vec![Increasing, Stable, Decreasing, Stable]);

        let report = TrendAnalyzer::precipitation_report(&[0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(report.overall, Stable);
        assert_eq!(report.steps.len(), 4);
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        let json = serde_json::to_string(&Trend::Increasing).expect("serialize");
        assert_eq!(json, "\"increasing\"");
        assert_eq!(Trend::Stable.as_str(), "stable");
    }
}
