//! Risk assessment of a candidate opportunity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Component factors, each normalized to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub risk_reward: f64,
    pub volatility: f64,
    pub liquidity: f64,
    pub market_condition: f64,
}

/// Outcome of each independent threshold check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskChecks {
    pub risk_reward_ok: bool,
    pub volatility_ok: bool,
    pub liquidity_ok: bool,
    pub market_condition_ok: bool,
}

impl RiskChecks {
    pub fn all_passed(&self) -> bool {
        self.risk_reward_ok && self.volatility_ok && self.liquidity_ok && self.market_condition_ok
    }

    /// Names of the checks that failed, for logs
    pub fn failures(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.risk_reward_ok {
            failed.push("risk_reward");
        }
        if !self.volatility_ok {
            failed.push("volatility");
        }
        if !self.liquidity_ok {
            failed.push("liquidity");
        }
        if !self.market_condition_ok {
            failed.push("market_condition");
        }
        failed
    }
}

/// Risk verdict for one candidate
///
/// `score` is informational. `accepted` is the AND of the four checks and is the only
/// gate; the two can disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub opportunity_id: Uuid,
    /// Composite score in [0, 100]
    pub score: f64,
    pub factors: RiskFactors,
    pub checks: RiskChecks,
    pub accepted: bool,
    pub volatility_pct: f64,
    pub liquidity_usd: f64,
    pub market_condition: f64,
    pub assessed_at: DateTime<Utc>,
}
