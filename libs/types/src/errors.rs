//! Error types for domain value construction

use thiserror::Error;

/// Errors raised when a domain value would violate its invariants
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    /// Stop-loss is not strictly on the loss side of entry
    #[error("Stop-loss {stop} is on the wrong side of entry {entry} for {direction}")]
    StopOnWrongSide {
        entry: f64,
        stop: f64,
        direction: String,
    },

    /// A take-profit level is not strictly on the profit side of entry
    #[error("Take-profit {target} is on the wrong side of entry {entry} for {direction}")]
    TargetOnWrongSide {
        entry: f64,
        target: f64,
        direction: String,
    },

    /// Value is NaN or infinite
    #[error("Non-finite value for {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Net risk/reward would exceed the raw ratio
    #[error("Net risk/reward {net} exceeds raw risk/reward {raw}")]
    NetAboveRaw { net: f64, raw: f64 },
}

pub type Result<T> = std::result::Result<T, TypesError>;
