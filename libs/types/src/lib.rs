//! # Sentinel Types
//!
//! Domain values passed between the stages of the alerting pipeline.
//!
//! ## Design Philosophy
//!
//! - **Exact exchange values**: prices and quantities captured from the exchange are
//!   `rust_decimal::Decimal` so persisted snapshots reproduce the venue's numbers
//! - **f64 analytics**: indicator math, risk scores and ratios are `f64`
//! - **Single-pass values**: candidates, assessments and alerts are created once and
//!   handed downstream by value; the only late mutation is attaching a snapshot id
//! - **Construction enforces geometry**: a [`CandidateOpportunity`] cannot exist with a
//!   stop or take-profit on the wrong side of entry
//!
//! ## Pipeline Flow
//!
//! ```text
//! MarketSnapshot → TechnicalSummary → CandidateOpportunity → RiskAssessment
//!                                            ↓
//!                                     ClassifiedAlert → CooldownEntry
//!                                            ↓
//!                                  DataSnapshot + BroadcastEvent
//! ```

pub mod alert;
pub mod analysis;
pub mod errors;
pub mod event;
pub mod market;
pub mod opportunity;
pub mod report;
pub mod risk;
pub mod snapshot;

pub use alert::{AlertLevel, ClassifiedAlert, CooldownEntry, CooldownKey};
pub use analysis::{TechnicalSummary, Trend};
pub use errors::{Result, TypesError};
pub use event::{BroadcastEvent, EventType};
pub use market::{Candle, DataProvenance, DepthLevel, MarketSnapshot, OrderBookDepth};
pub use opportunity::{
    CandidateOpportunity, ConfidenceTier, Direction, EntryKind, OpportunityParams, StrategyTag,
};
pub use report::CycleReport;
pub use risk::{RiskAssessment, RiskChecks, RiskFactors};
pub use snapshot::{DataSnapshot, SnapshotStats};

/// Exchange instrument symbol, e.g. `BTCUSDT`
pub type Symbol = String;

pub use rust_decimal::Decimal;
