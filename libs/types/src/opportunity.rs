//! Candidate trade opportunities proposed by the signal generator

use crate::errors::{Result, TypesError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strategy family that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StrategyTag {
    Breakout,
    Pullback,
    TrendFollow,
}

impl StrategyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::Breakout => "breakout",
            StrategyTag::Pullback => "pullback",
            StrategyTag::TrendFollow => "trend_follow",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// Confidence tier, ordered `Low < Medium < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// How the entry would be filled; drives the transaction cost model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Market,
    Limit,
}

/// Inputs for constructing a [`CandidateOpportunity`]
#[derive(Debug, Clone)]
pub struct OpportunityParams {
    pub symbol: String,
    pub strategy: StrategyTag,
    pub direction: Direction,
    pub entry_kind: EntryKind,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    /// Round-trip transaction cost as a fraction of entry price
    pub transaction_cost: f64,
    pub confidence: ConfidenceTier,
    pub trigger: String,
    /// Market price when the candidate was generated
    pub reference_price: f64,
    /// Absolute average true range at generation time
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOpportunity {
    /// Unique per generation event
    pub id: Uuid,
    pub symbol: String,
    pub strategy: StrategyTag,
    pub direction: Direction,
    pub entry_kind: EntryKind,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub raw_risk_reward: f64,
    /// Reward after deducting the transaction cost estimate, divided by risk
    pub net_risk_reward: f64,
    pub confidence: ConfidenceTier,
    /// Human-readable trigger description
    pub trigger: String,
    pub generated_at: DateTime<Utc>,
    pub reference_price: f64,
    pub atr: f64,
    /// Attached once the market context has been persisted
    pub snapshot_id: Option<String>,
}

impl CandidateOpportunity {
    /// Build a candidate, deriving raw and net risk/reward
    ///
    /// Fails if any price is non-finite, the stop or either target sits on the wrong
    /// side of entry, or the cost model would push net risk/reward above raw.
    pub fn new(params: OpportunityParams) -> Result<Self> {
        for (field, value) in [
            ("entry", params.entry),
            ("stop_loss", params.stop_loss),
            ("take_profit_1", params.take_profit_1),
            ("take_profit_2", params.take_profit_2),
            ("transaction_cost", params.transaction_cost),
        ] {
            if !value.is_finite() {
                return Err(TypesError::NonFinite { field, value });
            }
        }

        let sign = params.direction.sign();
        if (params.entry - params.stop_loss) * sign <= 0.0 {
            return Err(TypesError::StopOnWrongSide {
                entry: params.entry,
                stop: params.stop_loss,
                direction: params.direction.to_string(),
            });
        }
        for target in [params.take_profit_1, params.take_profit_2] {
            if (target - params.entry) * sign <= 0.0 {
                return Err(TypesError::TargetOnWrongSide {
                    entry: params.entry,
                    target,
                    direction: params.direction.to_string(),
                });
            }
        }

        let risk = (params.entry - params.stop_loss).abs();
        let reward = (params.take_profit_1 - params.entry).abs();
        let raw_risk_reward = reward / risk;
        let net_risk_reward = (reward - params.transaction_cost * params.entry) / risk;
        if net_risk_reward > raw_risk_reward {
            return Err(TypesError::NetAboveRaw {
                net: net_risk_reward,
                raw: raw_risk_reward,
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            symbol: params.symbol,
            strategy: params.strategy,
            direction: params.direction,
            entry_kind: params.entry_kind,
            entry: params.entry,
            stop_loss: params.stop_loss,
            take_profit_1: params.take_profit_1,
            take_profit_2: params.take_profit_2,
            raw_risk_reward,
            net_risk_reward,
            confidence: params.confidence,
            trigger: params.trigger,
            generated_at: Utc::now(),
            reference_price: params.reference_price,
            atr: params.atr,
            snapshot_id: None,
        })
    }

    /// Absolute distance between entry and stop
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn attach_snapshot(&mut self, snapshot_id: impl Into<String>) {
        self.snapshot_id = Some(snapshot_id.into());
    }
}
