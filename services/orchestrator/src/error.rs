//! Errors surfaced at the orchestrator boundary

use thiserror::Error;

/// A per-instrument stage failure; counted and skipped, never fatal to the cycle
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Signal generation failed: {0}")]
    Signal(#[from] signals::SignalError),

    #[error("Alert evaluation failed: {0}")]
    Alerting(#[from] alerting::AlertingError),

    #[error("Invalid operational setting: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
