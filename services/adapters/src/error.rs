//! Error types for the adapters module

use std::time::Duration;
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Main error type for adapter operations
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("HTTP request to {endpoint} failed: {reason}")]
    Http {
        /// Endpoint label, e.g. `ticker`
        endpoint: &'static str,
        /// Underlying error message
        reason: String,
    },

    /// Request did not complete within the client timeout
    #[error("Request to {endpoint} timed out after {timeout_ms}ms")]
    Timeout {
        /// Endpoint label
        endpoint: &'static str,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Non-success status other than a rate limit
    #[error("Exchange returned {status} for {endpoint}: {body}")]
    Status {
        /// Endpoint label
        endpoint: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Rate limit still in force after the single retry
    #[error("Rate limited on {endpoint}, retry after {retry_after:?}")]
    RateLimited {
        /// Endpoint label
        endpoint: &'static str,
        /// Provider-requested backoff, capped
        retry_after: Duration,
    },

    /// Response body could not be interpreted
    #[error("Failed to decode {endpoint} response: {reason}")]
    Decode {
        /// Endpoint label
        endpoint: &'static str,
        /// What was wrong with the payload
        reason: String,
    },

    /// Symbol rejected before any request was made
    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),

    /// Base URL or path could not be joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AdapterError {
    pub(crate) fn from_reqwest(endpoint: &'static str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout {
                endpoint,
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if err.is_decode() {
            AdapterError::Decode {
                endpoint,
                reason: err.to_string(),
            }
        } else {
            AdapterError::Http {
                endpoint,
                reason: err.to_string(),
            }
        }
    }

    /// Endpoint label the error was raised for, when known
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            AdapterError::Http { endpoint, .. }
            | AdapterError::Timeout { endpoint, .. }
            | AdapterError::Status { endpoint, .. }
            | AdapterError::RateLimited { endpoint, .. }
            | AdapterError::Decode { endpoint, .. } => Some(endpoint),
            AdapterError::InvalidInstrument(_) | AdapterError::InvalidUrl(_) => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AdapterError::RateLimited { .. })
    }
}
