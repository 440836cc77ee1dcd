//! Signal generation statistics

use chrono::{DateTime, Utc};
use serde::Serialize;
use types::{CandidateOpportunity, Direction, StrategyTag};

/// Running counters over every candidate the generator has emitted
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SignalStats {
    pub total_signals: u64,
    pub breakout_signals: u64,
    pub pullback_signals: u64,
    pub trend_follow_signals: u64,
    pub long_signals: u64,
    pub short_signals: u64,
    /// Candidates dropped for net risk/reward below the minimum
    pub rejected_below_min: u64,
    pub avg_net_risk_reward: f64,
    pub last_signal_at: Option<DateTime<Utc>>,
}

impl SignalStats {
    /// Update stats with a new candidate
    pub fn record_signal(&mut self, candidate: &CandidateOpportunity) {
        self.total_signals += 1;

        match candidate.strategy {
            StrategyTag::Breakout => self.breakout_signals += 1,
            StrategyTag::Pullback => self.pullback_signals += 1,
            StrategyTag::TrendFollow => self.trend_follow_signals += 1,
            _ => {}
        }
        match candidate.direction {
            Direction::Long => self.long_signals += 1,
            Direction::Short => self.short_signals += 1,
        }

        // Update rolling average net risk/reward
        let total = self.avg_net_risk_reward * (self.total_signals - 1) as f64
            + candidate.net_risk_reward;
        self.avg_net_risk_reward = total / self.total_signals as f64;

        self.last_signal_at = Some(candidate.generated_at);
    }

    pub fn record_rejection(&mut self) {
        self.rejected_below_min += 1;
    }
}
