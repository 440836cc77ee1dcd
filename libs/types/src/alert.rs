//! Classified alerts and cooldown bookkeeping values

use crate::opportunity::{CandidateOpportunity, StrategyTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Alert urgency, ordered `Watch < Ready < Fired`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Watch,
    Ready,
    Fired,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Watch => "WATCH",
            AlertLevel::Ready => "READY",
            AlertLevel::Fired => "FIRED",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedAlert {
    pub opportunity: CandidateOpportunity,
    pub level: AlertLevel,
    /// `(entry - price) / price`, signed
    pub distance: f64,
    /// ATR as a fraction of price
    pub local_volatility: f64,
    pub time_to_trigger: Duration,
    pub classified_at: DateTime<Utc>,
}

impl ClassifiedAlert {
    pub fn symbol(&self) -> &str {
        &self.opportunity.symbol
    }

    pub fn cooldown_key(&self) -> CooldownKey {
        CooldownKey {
            symbol: self.opportunity.symbol.clone(),
            strategy: self.opportunity.strategy,
        }
    }
}

/// Cooldown grouping; the level is tracked in the entry, not the key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooldownKey {
    pub symbol: String,
    pub strategy: StrategyTag,
}

impl fmt::Display for CooldownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub last_notified: DateTime<Utc>,
    pub level: AlertLevel,
    /// `last_notified + cooldown window`
    pub expires_at: DateTime<Utc>,
}

impl CooldownEntry {
    pub fn new(last_notified: DateTime<Utc>, level: AlertLevel, window: chrono::Duration) -> Self {
        Self {
            last_notified,
            level,
            expires_at: last_notified + window,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
