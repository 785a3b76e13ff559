//! Client configuration
//!
//! Defaults mirror the provider's free tier: 60 calls per rolling minute,
//! metric units, a 10 second request deadline and a 30 minute cache.

use std::time::Duration;

use crate::error::{Error, Result};

/// Base URL for the OpenWeatherMap 2.5 API
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Unit system requested from the provider
pub const DEFAULT_UNITS: &str = "metric";

/// Deadline applied to every upstream call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cache time-to-live (30 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Maximum upstream calls admitted per rate window
pub const DEFAULT_RATE_LIMIT: usize = 60;

/// Length of the rolling rate window
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
const BASE_URL_ENV: &str = "OPENWEATHER_BASE_URL";
const UNITS_ENV: &str = "OPENWEATHER_UNITS";
const CACHE_MINUTES_ENV: &str = "WEATHER_CACHE_MINUTES";
const RATE_LIMIT_ENV: &str = "WEATHER_RATE_LIMIT";

/// Settings for a [`WeatherClient`](crate::data::WeatherClient)
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// Provider API key, sent as `appid`
    pub api_key: String,
    /// Base URL without trailing slash (overridable for tests)
    pub base_url: String,
    /// Unit system (`metric`, `imperial`, `standard`)
    pub units: String,
    /// Per-request deadline
    pub timeout: Duration,
    /// Initial cache time-to-live
    pub cache_ttl: Duration,
    /// Calls admitted per window
    pub rate_limit: usize,
    /// Rolling window length
    pub rate_window: Duration,
}

impl WeatherConfig {
    /// Creates a configuration with default settings for the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            units: DEFAULT_UNITS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }

    /// Points the client at a different provider host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the rate budget
    pub fn with_rate_limit(mut self, limit: usize, window: Duration) -> Self {
        self.rate_limit = limit;
        self.rate_window = window;
        self
    }

    /// Loads configuration from the process environment
    ///
    /// `OPENWEATHER_API_KEY` is required. `OPENWEATHER_BASE_URL`,
    /// `OPENWEATHER_UNITS`, `WEATHER_CACHE_MINUTES` and `WEATHER_RATE_LIMIT`
    /// are optional overrides.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{API_KEY_ENV} must be set")))?;

        let mut config = Self::new(api_key);

        if let Some(url) = lookup(BASE_URL_ENV) {
            config = config.with_base_url(url.trim());
        }
        if let Some(units) = lookup(UNITS_ENV) {
            config.units = units.trim().to_string();
        }
        if let Some(raw) = lookup(CACHE_MINUTES_ENV) {
            let minutes = parse_positive(&raw, CACHE_MINUTES_ENV)?;
            config.cache_ttl = Duration::from_secs(minutes * 60);
        }
        if let Some(raw) = lookup(RATE_LIMIT_ENV) {
            config.rate_limit = parse_positive(&raw, RATE_LIMIT_ENV)? as usize;
        }

        Ok(config)
    }
}

fn parse_positive(raw: &str, env_name: &str) -> Result<u64> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 1")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer >= 1")));
    }
    Ok(parsed)
}
