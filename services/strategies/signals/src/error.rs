//! Error types for candidate signal generation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    /// A candidate violated its own geometry while being built
    #[error("Candidate construction failed for {symbol}: {source}")]
    Candidate {
        symbol: String,
        #[source]
        source: types::TypesError,
    },

    #[error("Calculation error: {message}")]
    Calculation { message: String },

    #[error("Market data error: {message}")]
    MarketData { message: String },
}

pub type Result<T> = std::result::Result<T, SignalError>;
