//! Error types for risk, classification and cooldown stages

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlertingError {
    /// Input value is NaN or infinite
    #[error("Non-finite {field} for {symbol}: {value}")]
    NonFinite {
        symbol: String,
        field: &'static str,
        value: f64,
    },

    /// Price or distance basis is zero or negative
    #[error("Non-positive {field} for {symbol}: {value}")]
    NonPositive {
        symbol: String,
        field: &'static str,
        value: f64,
    },
}

pub type Result<T> = std::result::Result<T, AlertingError>;

pub(crate) fn ensure_finite(symbol: &str, field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AlertingError::NonFinite {
            symbol: symbol.to_string(),
            field,
            value,
        })
    }
}

pub(crate) fn ensure_positive(symbol: &str, field: &'static str, value: f64) -> Result<f64> {
    ensure_finite(symbol, field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(AlertingError::NonPositive {
            symbol: symbol.to_string(),
            field,
            value,
        })
    }
}
