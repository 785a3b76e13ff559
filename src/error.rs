//! Error taxonomy for the weather intelligence core
//!
//! Every public operation either returns a fully-populated result or one of
//! these errors. A cache miss is never an error; it is an `Option::None`.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or deriving weather data
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a bad coordinate, day count or cache duration.
    /// Raised before any cache or network access.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The upstream call exceeded its deadline
    #[error("Weather API request timed out after {0:?}")]
    Timeout(Duration),

    /// Transport failure or non-success HTTP status
    #[error("Weather API request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    /// The body was received but required fields are missing or out of range
    #[error("Invalid weather data: {0}")]
    InvalidData(String),

    /// Missing or malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classifies a transport error, separating deadline expiry from other failures
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout)
        } else {
            Error::RequestFailed(err)
        }
    }

    /// Whether this error counts against the upstream error rate
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::RequestFailed(_) | Error::InvalidData(_)
        )
    }
}
