//! Command-line interface parsing for the weather intelligence core
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`Query`] before any network access happens.

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::validate_coordinates;
use crate::data::weather::MAX_FORECAST_DAYS;

/// Default latitude (Dehradun, Uttarakhand)
pub const DEFAULT_LAT: f64 = 30.7333;

/// Default longitude (Dehradun, Uttarakhand)
pub const DEFAULT_LON: f64 = 79.0667;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Latitude or longitude outside the valid range
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

/// UK Safe weather - current conditions, forecasts, alerts and risk
#[derive(Parser, Debug)]
#[command(name = "uksafe-weather")]
#[command(about = "Weather intelligence for disaster management")]
#[command(version)]
pub struct Cli {
    /// Latitude in decimal degrees
    #[arg(long, default_value_t = DEFAULT_LAT, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, default_value_t = DEFAULT_LON, allow_negative_numbers = true)]
    pub lon: f64,

    #[command(subcommand)]
    pub command: Command,
}

/// What to fetch or compute
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Current conditions
    Current,
    /// Daily forecast with trends
    Forecast {
        /// Number of days, 1-14
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=MAX_FORECAST_DAYS as i64))]
        days: u32,
    },
    /// Next 24 hours
    Hourly,
    /// Active weather alerts with severity
    Alerts,
    /// Risk score, level, trend and recommendations
    Assess,
}

/// Validated request derived from CLI arguments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    pub lat: f64,
    pub lon: f64,
    pub command: Command,
}

impl Query {
    /// Creates a Query from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(Query)` when the coordinates are in range
    /// * `Err(CliError::InvalidCoordinates)` otherwise
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        validate_coordinates(cli.lat, cli.lon)
            .map_err(|e| CliError::InvalidCoordinates(e.to_string()))?;

        Ok(Query {
            lat: cli.lat,
            lon: cli.lon,
            command: cli.command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults_to_dehradun() {
        let cli = Cli::parse_from(["uksafe-weather", "current"]);
        assert_eq!(cli.lat, DEFAULT_LAT);
        assert_eq!(cli.lon, DEFAULT_LON);
        assert_eq!(cli.command, Command::Current);
    }

    #[test]
    fn test_cli_parse_negative_coordinates() {
        let cli = Cli::parse_from(["uksafe-weather", "--lat", "-33.87", "--lon", "-151.2", "alerts"]);
        assert_eq!(cli.lat, -33.87);
        assert_eq!(cli.lon, -151.2);
        assert_eq!(cli.command, Command::Alerts);
    }

    #[test]
    fn test_cli_parse_forecast_days() {
        let cli = Cli::parse_from(["uksafe-weather", "forecast", "--days", "3"]);
        assert_eq!(cli.command, Command::Forecast { days: 3 });

        let cli = Cli::parse_from(["uksafe-weather", "forecast"]);
        assert_eq!(cli.command, Command::Forecast { days: 7 });
    }

    #[test]
    fn test_cli_rejects_out_of_range_days() {
        assert!(Cli::try_parse_from(["uksafe-weather", "forecast", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["uksafe-weather", "forecast", "--days", "15"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["uksafe-weather"]).is_err());
    }

    #[test]
    fn test_query_from_cli_valid() {
        let cli = Cli::parse_from(["uksafe-weather", "--lat", "51.5", "--lon", "-0.12", "assess"]);
        let query = Query::from_cli(&cli).expect("coordinates are valid");
        assert_eq!(query.lat, 51.5);
        assert_eq!(query.command, Command::Assess);
    }

    #[test]
    fn test_query_from_cli_invalid_latitude() {
        let cli = Cli::parse_from(["uksafe-weather", "--lat", "999", "current"]);
        let err = Query::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("Invalid coordinates"));
        assert!(err.to_string().contains("latitude"));
    }
}
