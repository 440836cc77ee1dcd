//! Configuration validation errors

use thiserror::Error;

/// A loaded configuration that cannot be run
///
/// Raised by [`crate::AppConfig::validate`]. Always fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No instruments configured")]
    EmptyInstruments,

    #[error("Invalid instrument symbol: {0:?}")]
    InvalidInstrument(String),

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("Minimum risk/reward {value} is below 1.0")]
    RiskRewardTooLow { value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
