//! # Sentinel Alerting - Risk, Classification and Deduplication
//!
//! ## Purpose
//!
//! Everything between a candidate opportunity and a notification decision. Candidates
//! are risk-checked, classified by how close price is to entry, merged when they
//! describe the same setup, and finally filtered by the deduplication cooler so each
//! setup is notified once per window unless it escalates.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`types::CandidateOpportunity`] from `sentinel-signals`
//! - **Output Destinations**: Alerts allowed by [`DeduplicationCooler`] go to the
//!   snapshot store and the notification dispatcher
//! - **Configuration**: [`config::RiskConfig`], [`config::AlertConfig`],
//!   [`config::CooldownConfig`]
//!
//! ## Architecture Role
//!
//! ```text
//! CandidateOpportunity → [RiskFilter] → accepted → [AlertClassifier] → ClassifiedAlert
//!                                                                            ↓
//!                                Notify ← [DeduplicationCooler] ← merge_similar_signals
//! ```
//!
//! [`RiskFilter::detect_abnormal_market`] additionally feeds the orchestrator's
//! cycle-wide notification gate.

pub mod classifier;
pub mod cooldown;
pub mod error;
pub mod risk;

pub use classifier::{track_state_change, AlertClassifier};
pub use cooldown::{
    merge_similar_signals, AllowReason, CooldownStore, Decision, DeduplicationCooler,
    LevelThresholds, SuppressReason,
};
pub use error::{AlertingError, Result};
pub use risk::{directional_condition, neutral_condition, RiskContext, RiskFilter};
