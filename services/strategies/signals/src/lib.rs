//! # Sentinel Signals - Rule-Based Candidate Generation
//!
//! ## Purpose
//!
//! Turns one instrument's [`types::MarketSnapshot`] into zero or more
//! [`types::CandidateOpportunity`] values with entry, stop and two take-profit levels.
//! Every candidate's net risk/reward already accounts for fees and slippage, and anything
//! below the configured minimum is dropped here.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Snapshots from the market adapter, one per instrument per cycle
//! - **Output Destinations**: The risk filter in `sentinel-alerting`
//! - **Configuration**: [`config::SignalConfig`] (indicator periods, thresholds, costs)
//! - **Monitoring**: [`SignalStats`] per-strategy counters
//!
//! ## Architecture Role
//!
//! ```text
//! MarketSnapshot → [analyze] → TechnicalSummary → [breakout | pullback | trend_follow]
//!                                    ↓                            ↓
//!                             persisted with alert        geometry + CostModel
//!                                                                 ↓
//!                                                  CandidateOpportunity (net R:R ≥ min)
//! ```
//!
//! ## Strategy Components
//!
//! - **Breakout**: latest volume z-score above threshold, direction from the latest return
//! - **Pullback**: close deep in the trailing range against an established EMA trend
//! - **Trend follow**: wide EMA spread with the close on the trend side of the fast EMA

pub mod cost;
pub mod error;
pub mod indicators;
pub mod signals;
pub mod strategy;

pub use cost::CostModel;
pub use error::{Result, SignalError};
pub use signals::SignalStats;
pub use strategy::SignalGenerator;
