//! Rolling accuracy statistics for the weather client
//!
//! Keeps the last [`WINDOW_CAPACITY`] observed values per metric plus
//! lifetime request and error counters. Statistics are computed on demand
//! and never fail: an empty or unknown metric reports zeros.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

/// Values retained per metric before the oldest is evicted
pub const WINDOW_CAPACITY: usize = 100;

/// Descriptive statistics over one metric's window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Number of values in the window
    pub count: usize,
}

impl MetricStats {
    fn from_values<'a>(values: impl ExactSizeIterator<Item = &'a f64> + Clone) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let mean = values.clone().sum::<f64>() / n;
        let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            mean,
            variance,
            count,
        }
    }
}

/// Snapshot of tracker state returned by [`AccuracyTracker::stats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// `error_count / total_requests`, or 0 before the first request
    pub error_rate: f64,
    /// Upstream requests attempted
    pub total_requests: u64,
    /// Requests that produced a valid result
    pub successful_requests: u64,
    /// Per-metric statistics, keyed by metric name
    pub metrics: BTreeMap<String, MetricStats>,
}

impl AccuracyReport {
    /// Statistics for one metric, zeroed if it was never recorded
    pub fn metric(&self, name: &str) -> MetricStats {
        self.metrics.get(name).copied().unwrap_or_default()
    }
}

/// Bounded per-metric windows plus request outcome counters
#[derive(Debug, Clone, Default)]
pub struct AccuracyTracker {
    windows: HashMap<String, VecDeque<f64>>,
    total_requests: u64,
    error_count: u64,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to a metric's window, evicting the oldest past capacity
    pub fn record(&mut self, metric: &str, value: f64) {
        let window = self
            .windows
            .entry(metric.to_string())
            .or_insert_with(|| VecDeque::with_capacity(WINDOW_CAPACITY));
        if window.len() == WINDOW_CAPACITY {
            window.pop_front();
        }
        window.push_back(value);
    }

    /// Counts one upstream request
    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    /// Counts one failed upstream request
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Statistics for a single metric
    pub fn metric(&self, name: &str) -> MetricStats {
        self.windows
            .get(name)
            .map(|w| MetricStats::from_values(w.iter()))
            .unwrap_or_default()
    }

    /// Computes mean and variance for every metric plus the global error rate
    pub fn stats(&self) -> AccuracyReport {
        let error_rate = if self.total_requests == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_requests as f64
        };

        let metrics = self
            .windows
            .iter()
            .map(|(name, window)| (name.clone(), MetricStats::from_values(window.iter())))
            .collect();

        AccuracyReport {
            error_rate,
            total_requests: self.total_requests,
            successful_requests: self.total_requests.saturating_sub(self.error_count),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_reports_zeros() {
        let tracker = AccuracyTracker::new();
        let report = tracker.stats();

        assert_eq!(report.error_rate, 0.0);
        assert_eq!(report.total_requests, 0);
        assert!(report.metrics.is_empty());
        assert_eq!(report.metric("temperature"), MetricStats::default());
    }

    #[test]
    fn test_mean_and_population_variance() {
        let mut tracker = AccuracyTracker::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            tracker.record("temperature", v);
        }

        let stats = tracker.metric("temperature");
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        assert!((stats.variance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_evicts_oldest_past_capacity() {
        let mut tracker = AccuracyTracker::new();
        for i in 0..150 {
            tracker.record("humidity", i as f64);
        }

        let stats = tracker.metric("humidity");
        assert_eq!(stats.count, WINDOW_CAPACITY);
        // Window holds 50..=149
        assert!((stats.mean - 99.5).abs() < 1e-9);
    }

    #[test]
    fn test_error_rate_is_a_fraction() {
        let mut tracker = AccuracyTracker::new();
        for _ in 0..4 {
            tracker.record_request();
        }
        tracker.record_error();

        let report = tracker.stats();
        assert!((report.error_rate - 0.25).abs() < 1e-9);
        assert_eq!(report.successful_requests, 3);
        assert_eq!(tracker.error_count(), 1);
        assert_eq!(tracker.total_requests(), 4);
    }

    #[test]
    fn test_metrics_are_independent() {
        let mut tracker = AccuracyTracker::new();
        tracker.record("temperature", 20.0);
        tracker.record("pressure", 1012.0);

        let report = tracker.stats();
        assert_eq!(report.metrics.len(), 2);
        assert_eq!(report.metric("temperature").mean, 20.0);
        assert_eq!(report.metric("pressure").variance, 0.0);
    }
}
