//! Per-cycle statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub duration: Duration,
    pub instruments_attempted: usize,
    pub instruments_succeeded: usize,
    pub instruments_failed: usize,
    /// Snapshots that came from the mock fallback
    pub synthetic_snapshots: usize,
    pub opportunities_found: usize,
    pub candidates_accepted: usize,
    pub alerts_classified: usize,
    pub alerts_suppressed: usize,
    pub alerts_emitted: usize,
    pub stage_errors: usize,
    pub snapshot_failures: usize,
    /// Abnormal-market gate tripped; notifications held for the whole cycle
    pub circuit_breaker_tripped: bool,
}

impl CycleReport {
    /// Fraction of attempted instruments whose data was fetched
    pub fn success_rate(&self) -> f64 {
        if self.instruments_attempted == 0 {
            0.0
        } else {
            self.instruments_succeeded as f64 / self.instruments_attempted as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let report = CycleReport {
            instruments_attempted: 5,
            instruments_succeeded: 4,
            ..Default::default()
        };
        assert_eq!(report.success_rate(), 0.8);
        assert_eq!(CycleReport::default().success_rate(), 0.0);
    }
}
