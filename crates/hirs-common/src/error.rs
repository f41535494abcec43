//! Error types shared by the HIRS CTP crates.

use thiserror::Error;

/// Result type alias using HirsError.
pub type HirsResult<T> = Result<T, HirsError>;

/// Errors raised while building or parsing the common value types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HirsError {
    #[error("Unknown satellite: {0}")]
    UnknownSatellite(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid version identifier for '{field}': {message}")]
    InvalidVersion { field: &'static str, message: String },
}
