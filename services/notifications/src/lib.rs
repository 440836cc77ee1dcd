//! # Sentinel Notifications - Alert Delivery
//!
//! ## Purpose
//!
//! Gets alerts that survived the cooler in front of people: queued email delivery with
//! pacing, plus a push channel for any live subscribers.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`types::ClassifiedAlert`] and [`types::BroadcastEvent`] from the
//!   cycle orchestrator
//! - **Output Destinations**: An [`EmailTransport`] (HTTP email API or log only) and a
//!   [`Broadcaster`]
//! - **Configuration**: [`config::NotificationConfig`]
//!
//! ## Architecture Role
//!
//! ```text
//! deliver(alert) ──→ unbounded FIFO ──→ worker ──→ format ──→ EmailTransport
//!                                         │
//!                                  sleep between sends
//!
//! broadcast(event) ──→ SubscriberHub ──→ per-subscriber channels
//! ```

pub mod broadcast;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod format;
pub mod traits;

pub use broadcast::SubscriberHub;
pub use dispatcher::{DispatchStats, DispatcherSettings, NotificationDispatcher};
pub use email::{HttpEmailTransport, LogOnlyTransport};
pub use error::{NotifyError, Result};
pub use traits::{Broadcaster, EmailTransport};
