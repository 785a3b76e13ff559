//! UK Safe weather CLI - query the weather intelligence core
//!
//! Fetches current conditions, forecasts, alerts or a composite risk
//! assessment for a coordinate and prints the result as JSON on stdout.
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use uksafe_weather::cli::{Cli, Command, Query};
use uksafe_weather::{RiskAssessor, WeatherClient, WeatherConfig};

/// Installs the stderr log subscriber
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one query against the client and shapes the output
async fn run(client: WeatherClient, query: Query) -> uksafe_weather::Result<Value> {
    let Query { lat, lon, command } = query;

    let value = match command {
        Command::Current => json!(client.get_current(lat, lon).await?),
        Command::Forecast { days } => {
            let entries = client.get_forecast(lat, lon, days).await?;
            json!({
                "entries": entries,
                "trends": RiskAssessor::weather_trends(&entries),
            })
        }
        Command::Hourly => json!(client.get_hourly_forecast(lat, lon).await?),
        Command::Alerts => json!(client.get_alerts(lat, lon).await?),
        Command::Assess => json!(RiskAssessor::new(client).assess(lat, lon).await?),
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    // Validated before configuration is read or any request is made
    let query = Query::from_cli(&cli)?;

    let config = WeatherConfig::from_env()?;
    let client = WeatherClient::new(config)?;

    let output = run(client, query).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
