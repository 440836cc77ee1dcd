//! # Sentinel Orchestrator
//!
//! Owns the monitoring schedule and the per-cycle flow that ties the market adapter,
//! signal generator, alerting stages, snapshot store and notification dispatcher
//! together. The `sentinel` binary in this crate is the service entry point.
//!
//! ## Operational Surface
//!
//! - [`CycleOrchestrator::health`]: `Healthy | Degraded | Critical` plus uptime
//! - [`CycleOrchestrator::metrics`]: cumulative pipeline counters
//! - [`CycleOrchestrator::set_instruments`] and [`CycleOrchestrator::set_interval`]:
//!   validated runtime changes picked up by the next cycle

pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod orchestrator;

pub use error::{PipelineError, Result};
pub use health::{HealthMonitor, HealthReport, HealthStatus};
pub use logging::{init_logging, LogEmoji};
pub use metrics::{MetricsCollector, PipelineMetrics};
pub use orchestrator::{CycleOrchestrator, OrchestratorParts};
