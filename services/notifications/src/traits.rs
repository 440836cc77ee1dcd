//! Downstream delivery seams

use crate::error::Result;
use async_trait::async_trait;
use types::BroadcastEvent;

/// Outbound email channel
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send_email(&self, to: &[String], subject: &str, html: &str) -> Result<()>;

    /// Whether the transport can currently reach its provider
    async fn test_connectivity(&self) -> bool;
}

/// Fan-out of pipeline events to live subscribers
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, event: &BroadcastEvent);

    async fn subscriber_count(&self) -> usize;
}
