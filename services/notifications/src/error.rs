//! Notification delivery errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Worker has stopped; nothing more can be queued
    #[error("Notification queue is closed")]
    QueueClosed,

    #[error("No recipients configured")]
    NoRecipients,

    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid email endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Transport error: {message}")]
    Transport { message: String },
}

pub type Result<T> = std::result::Result<T, NotifyError>;
