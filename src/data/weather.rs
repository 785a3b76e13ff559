//! OpenWeatherMap API client
//!
//! This module fetches current conditions, forecasts and alerts from the
//! OpenWeatherMap 2.5 API and parses them into typed weather structures.
//! Every upstream call passes through the rate limiter and lands in the TTL
//! cache; a response that fails validation is counted as an error and never
//! cached.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};

use super::{
    validate_coordinates, AlertSeverity, ForecastEntry, WeatherAlert, WeatherSnapshot,
};
use crate::accuracy::{AccuracyReport, AccuracyTracker};
use crate::cache::{CacheStats, TtlCache};
use crate::config::WeatherConfig;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;

/// Longest forecast horizon the provider serves, in days
pub const MAX_FORECAST_DAYS: u32 = 14;

/// Hourly steps kept from the hourly forecast
const HOURLY_FORECAST_STEPS: usize = 24;

/// Name used when the provider omits a location or country
const UNKNOWN: &str = "Unknown";

/// Metrics fed to the accuracy tracker for every fresh snapshot
const TRACKED_METRICS: [&str; 4] = ["temperature", "humidity", "wind_speed", "pressure"];

/// Any result the client caches
#[derive(Debug, Clone)]
enum CachedValue {
    Current(WeatherSnapshot),
    Forecast(Vec<ForecastEntry>),
    Alerts(Vec<WeatherAlert>),
}

/// Client for the OpenWeatherMap API
///
/// Cloning is cheap; clones share the cache, rate limiter and accuracy
/// tracker, so one budget applies to every clone.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    config: Arc<WeatherConfig>,
    cache: Arc<TtlCache<CachedValue>>,
    limiter: Arc<RateLimiter>,
    tracker: Arc<Mutex<AccuracyTracker>>,
}

impl WeatherClient {
    /// Create a new WeatherClient from configuration
    ///
    /// # Errors
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            cache: Arc::new(TtlCache::with_duration(config.cache_ttl)),
            limiter: Arc::new(RateLimiter::with_limits(
                config.rate_limit,
                config.rate_window,
            )),
            tracker: Arc::new(Mutex::new(AccuracyTracker::new())),
            config: Arc::new(config),
        })
    }

    /// Fetch current weather for the given coordinates
    ///
    /// # Arguments
    /// * `lat` - Latitude in [-90, 90]
    /// * `lon` - Longitude in [-180, 180]
    ///
    /// # Returns
    /// * `Ok(WeatherSnapshot)` - cached or freshly fetched conditions
    /// * `Err(Error)` - invalid coordinates, timeout, transport failure or invalid data
    pub async fn get_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        validate_coordinates(lat, lon)?;

        let key = cache_key("current", lat, lon, None);
        if let Some(CachedValue::Current(snapshot)) = self.cache.get(&key) {
            return Ok(snapshot);
        }

        let snapshot = self
            .fetch("weather", lat, lon, &[], |raw: CurrentResponse| {
                raw.into_snapshot(Utc::now())
            })
            .await?;

        self.track_snapshot(&snapshot);
        self.cache.put(key, CachedValue::Current(snapshot.clone()));
        Ok(snapshot)
    }

    /// Fetch the daily forecast for the next `days` calendar days
    ///
    /// # Arguments
    /// * `lat` - Latitude in [-90, 90]
    /// * `lon` - Longitude in [-180, 180]
    /// * `days` - Horizon in days, 1 to 14
    pub async fn get_forecast(&self, lat: f64, lon: f64, days: u32) -> Result<Vec<ForecastEntry>> {
        validate_coordinates(lat, lon)?;
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(Error::InvalidArgument(format!(
                "Days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"
            )));
        }

        let key = cache_key("forecast", lat, lon, Some(days));
        if let Some(CachedValue::Forecast(entries)) = self.cache.get(&key) {
            return Ok(entries);
        }

        let exclude = [("exclude", "current,minutely,hourly,alerts")];
        let entries = self
            .fetch("onecall", lat, lon, &exclude, |raw: OneCallResponse| {
                let entries = raw.into_daily()?;
                Ok(filter_horizon(entries, Utc::now().date_naive(), days))
            })
            .await?;

        self.cache.put(key, CachedValue::Forecast(entries.clone()));
        Ok(entries)
    }

    /// Fetch the next 24 hourly forecast steps
    pub async fn get_hourly_forecast(&self, lat: f64, lon: f64) -> Result<Vec<ForecastEntry>> {
        validate_coordinates(lat, lon)?;

        let key = cache_key("hourly", lat, lon, None);
        if let Some(CachedValue::Forecast(entries)) = self.cache.get(&key) {
            return Ok(entries);
        }

        let exclude = [("exclude", "current,daily,alerts")];
        let entries = self
            .fetch("onecall", lat, lon, &exclude, OneCallResponse::into_hourly)
            .await?;

        self.cache.put(key, CachedValue::Forecast(entries.clone()));
        Ok(entries)
    }

    /// Fetch provider alerts for the given coordinates
    ///
    /// A location without alerts yields an empty list, which is cached like
    /// any other result.
    pub async fn get_alerts(&self, lat: f64, lon: f64) -> Result<Vec<WeatherAlert>> {
        validate_coordinates(lat, lon)?;

        let key = cache_key("alerts", lat, lon, None);
        if let Some(CachedValue::Alerts(alerts)) = self.cache.get(&key) {
            return Ok(alerts);
        }

        let exclude = [("exclude", "current,minutely,hourly,daily")];
        let alerts = self
            .fetch("onecall", lat, lon, &exclude, OneCallResponse::into_alerts)
            .await?;

        self.cache.put(key, CachedValue::Alerts(alerts.clone()));
        Ok(alerts)
    }

    /// Error rate and per-metric statistics observed so far
    pub fn accuracy_report(&self) -> AccuracyReport {
        self.tracker.lock().stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Changes the cache TTL; must be at least one minute
    pub fn set_cache_duration(&self, duration: std::time::Duration) -> Result<()> {
        self.cache.set_duration(duration)
    }

    /// Admits, sends, decodes and maps one upstream request
    ///
    /// Counts the request, and counts it as an error if any step fails.
    async fn fetch<T, R, F>(
        &self,
        endpoint: &str,
        lat: f64,
        lon: f64,
        extra: &[(&str, &str)],
        map: F,
    ) -> Result<R>
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> Result<R>,
    {
        self.limiter.admit().await;
        let outcome = RequestOutcome::start(&self.tracker);

        let result = self
            .request::<T>(endpoint, lat, lon, extra)
            .await
            .and_then(map);

        if let Err(e) = &result {
            match e {
                Error::InvalidData(_) => error!("Data validation error from /{}: {}", endpoint, e),
                _ => error!("API request to /{} failed: {}", endpoint, e),
            }
        }
        outcome.finish(&result);
        result
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        lat: f64,
        lon: f64,
        extra: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        let timeout = self.config.timeout;

        debug!("Fetching {} lat={} lon={}", url, lat, lon);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.config.api_key.clone()),
                ("units", self.config.units.clone()),
            ])
            .query(extra)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?
            .error_for_status()
            .map_err(Error::RequestFailed)?;

        let text = response
            .text()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?;

        serde_json::from_str(&text).map_err(|e| Error::InvalidData(e.to_string()))
    }

    fn track_snapshot(&self, snapshot: &WeatherSnapshot) {
        let values = [
            snapshot.temperature,
            snapshot.humidity,
            snapshot.wind_speed,
            snapshot.pressure,
        ];

        let mut tracker = self.tracker.lock();
        for (metric, value) in TRACKED_METRICS.iter().zip(values) {
            tracker.record(metric, value);
        }
        debug!("Accuracy stats: {:?}", tracker.stats().metrics);
    }
}

/// Counts one upstream request and settles its outcome exactly once
///
/// A request dropped before [`finish`](Self::finish) is counted as an error,
/// so a cancelled fetch never shows up as a success.
struct RequestOutcome<'a> {
    tracker: &'a Mutex<AccuracyTracker>,
    settled: bool,
}

impl<'a> RequestOutcome<'a> {
    fn start(tracker: &'a Mutex<AccuracyTracker>) -> Self {
        tracker.lock().record_request();
        Self {
            tracker,
            settled: false,
        }
    }

    fn finish<R>(mut self, result: &Result<R>) {
        self.settled = true;
        if let Err(e) = result {
            if e.is_upstream() {
                self.tracker.lock().record_error();
            }
        }
    }
}

impl Drop for RequestOutcome<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Upstream request cancelled before completion");
            self.tracker.lock().record_error();
        }
    }
}

/// Builds a cache key from the operation, coordinates rounded to 4 decimal
/// places and an optional parameter
fn cache_key(operation: &str, lat: f64, lon: f64, param: Option<u32>) -> String {
    // Adding 0.0 folds -0.0 into 0.0 so both round to the same key
    let round = |v: f64| (v * 10_000.0).round() / 10_000.0 + 0.0;
    match param {
        Some(p) => format!("{}:{:.4}:{:.4}:{}", operation, round(lat), round(lon), p),
        None => format!("{}:{:.4}:{:.4}", operation, round(lat), round(lon)),
    }
}

/// Keeps entries whose date is fewer than `days` calendar days after `today`
fn filter_horizon(entries: Vec<ForecastEntry>, today: NaiveDate, days: u32) -> Vec<ForecastEntry> {
    entries
        .into_iter()
        .filter(|entry| (entry.date - today).num_days() < i64::from(days))
        .collect()
}

fn timestamp(dt: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(dt, 0)
        .ok_or_else(|| Error::InvalidData(format!("{field} timestamp {dt} out of range")))
}

fn first_condition(weather: Vec<Condition>) -> Result<Condition> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidData("weather[0] missing".to_string()))
}

/// `/weather` response
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    wind: WindBlock,
    weather: Vec<Condition>,
    #[serde(default)]
    rain: Option<RainBlock>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sys: Option<SysBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    #[serde(default)]
    country: Option<String>,
}

impl CurrentResponse {
    fn into_snapshot(self, captured_at: DateTime<Utc>) -> Result<WeatherSnapshot> {
        let condition = first_condition(self.weather)?;
        let snapshot = WeatherSnapshot {
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            wind_speed: self.wind.speed,
            wind_direction: self.wind.deg,
            precipitation: self.rain.map(|r| r.one_hour).unwrap_or(0.0),
            description: condition.description,
            icon: condition.icon,
            location: self.name.unwrap_or_else(|| UNKNOWN.to_string()),
            country: self
                .sys
                .and_then(|s| s.country)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            captured_at,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// `/onecall` response; which sections appear depends on `exclude`
#[derive(Debug, Deserialize)]
struct OneCallResponse {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    daily: Option<Vec<DailyEntry>>,
    #[serde(default)]
    hourly: Option<Vec<HourlyEntry>>,
    #[serde(default)]
    alerts: Option<Vec<AlertEntry>>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    dt: i64,
    temp: DailyTemp,
    feels_like: DailyFeelsLike,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    wind_deg: f64,
    weather: Vec<Condition>,
    #[serde(default)]
    pop: f64,
    /// Daily precipitation volume in mm
    #[serde(default)]
    rain: f64,
}

#[derive(Debug, Deserialize)]
struct DailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct DailyFeelsLike {
    day: f64,
}

#[derive(Debug, Deserialize)]
struct HourlyEntry {
    dt: i64,
    temp: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    wind_deg: f64,
    weather: Vec<Condition>,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct AlertEntry {
    event: String,
    #[serde(default)]
    description: String,
    start: i64,
    end: i64,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Fields shared by daily and hourly steps once flattened
struct Step {
    dt: i64,
    temperature: f64,
    feels_like: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    wind_deg: f64,
    precipitation: f64,
    pop: f64,
    weather: Vec<Condition>,
}

impl OneCallResponse {
    fn location(&self) -> String {
        self.timezone.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn into_daily(self) -> Result<Vec<ForecastEntry>> {
        let location = self.location();
        let daily = self
            .daily
            .ok_or_else(|| Error::InvalidData("No forecast data available".to_string()))?;

        daily
            .into_iter()
            .map(|day| {
                Step {
                    dt: day.dt,
                    temperature: (day.temp.min + day.temp.max) / 2.0,
                    feels_like: day.feels_like.day,
                    humidity: day.humidity,
                    pressure: day.pressure,
                    wind_speed: day.wind_speed,
                    wind_deg: day.wind_deg,
                    precipitation: day.rain,
                    pop: day.pop,
                    weather: day.weather,
                }
                .into_entry(&location)
            })
            .collect()
    }

    fn into_hourly(self) -> Result<Vec<ForecastEntry>> {
        let location = self.location();
        let hourly = self
            .hourly
            .ok_or_else(|| Error::InvalidData("No hourly forecast data available".to_string()))?;

        hourly
            .into_iter()
            .take(HOURLY_FORECAST_STEPS)
            .map(|hour| {
                Step {
                    dt: hour.dt,
                    temperature: hour.temp,
                    feels_like: hour.feels_like,
                    humidity: hour.humidity,
                    pressure: hour.pressure,
                    wind_speed: hour.wind_speed,
                    wind_deg: hour.wind_deg,
                    precipitation: hour.rain.map(|r| r.one_hour).unwrap_or(0.0),
                    pop: hour.pop,
                    weather: hour.weather,
                }
                .into_entry(&location)
            })
            .collect()
    }

    fn into_alerts(self) -> Result<Vec<WeatherAlert>> {
        self.alerts
            .unwrap_or_default()
            .into_iter()
            .map(|alert| {
                Ok(WeatherAlert {
                    severity: AlertSeverity::classify(&alert.event, &alert.description),
                    start: timestamp(alert.start, "alert start")?,
                    end: timestamp(alert.end, "alert end")?,
                    sender: alert.sender_name.unwrap_or_else(|| UNKNOWN.to_string()),
                    event: alert.event,
                    description: alert.description,
                    tags: alert.tags,
                })
            })
            .collect()
    }
}

impl Step {
    fn into_entry(self, location: &str) -> Result<ForecastEntry> {
        let captured_at = timestamp(self.dt, "dt")?;
        if !(0.0..=1.0).contains(&self.pop) {
            return Err(Error::InvalidData(format!(
                "pop {} outside 0-1",
                self.pop
            )));
        }
        let condition = first_condition(self.weather)?;

        let weather = WeatherSnapshot {
            temperature: self.temperature,
            feels_like: self.feels_like,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_deg,
            precipitation: self.precipitation,
            description: condition.description,
            icon: condition.icon,
            location: location.to_string(),
            country: UNKNOWN.to_string(),
            captured_at,
        };
        weather.validate()?;

        Ok(ForecastEntry {
            date: captured_at.date_naive(),
            weather,
            precipitation_probability: self.pop * 100.0,
        })
    }
}
