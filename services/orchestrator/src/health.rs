//! Service health derived from cycle outcomes
//!
//! Two signals feed the status: the cumulative instrument error rate and how long ago
//! the last cycle managed to fetch any data, measured in monitoring intervals.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use types::CycleReport;

const DEGRADED_ERROR_RATE: f64 = 0.2;
const CRITICAL_ERROR_RATE: f64 = 0.5;
const DEGRADED_STALE_INTERVALS: u32 = 3;
const CRITICAL_STALE_INTERVALS: u32 = 10;
const MAX_RECENT_ERRORS: usize = 20;

/// Ordered `Healthy < Degraded < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub uptime_secs: u64,
    pub cycles: u64,
    pub error_rate: f64,
    pub last_successful_cycle: Option<DateTime<Utc>>,
    pub recent_errors: Vec<String>,
}

#[derive(Debug, Default)]
struct HealthState {
    cycles: u64,
    instruments_attempted: u64,
    instruments_failed: u64,
    last_success: Option<(Instant, DateTime<Utc>)>,
    recent_errors: VecDeque<String>,
}

#[derive(Debug)]
pub struct HealthMonitor {
    started: Instant,
    state: Mutex<HealthState>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            state: Mutex::new(HealthState::default()),
        }
    }

    /// Fold one cycle in; a cycle counts as successful when any instrument was fetched
    pub fn record_cycle(&self, report: &CycleReport, errors: Vec<String>) {
        let mut state = self.state.lock();
        state.cycles += 1;
        state.instruments_attempted += report.instruments_attempted as u64;
        state.instruments_failed += report.instruments_failed as u64;
        if report.instruments_succeeded > 0 {
            state.last_success = Some((Instant::now(), Utc::now()));
        }

        for error in errors {
            if state.recent_errors.len() == MAX_RECENT_ERRORS {
                state.recent_errors.pop_front();
            }
            state.recent_errors.push_back(error);
        }
    }

    pub fn report(&self, interval: Duration) -> HealthReport {
        self.report_at(Instant::now(), interval)
    }

    pub fn report_at(&self, now: Instant, interval: Duration) -> HealthReport {
        let state = self.state.lock();

        let error_rate = if state.instruments_attempted == 0 {
            0.0
        } else {
            state.instruments_failed as f64 / state.instruments_attempted as f64
        };

        let reference = state.last_success.map(|(at, _)| at).unwrap_or(self.started);
        let staleness = now.saturating_duration_since(reference);

        let status = if error_rate > CRITICAL_ERROR_RATE
            || staleness > interval * CRITICAL_STALE_INTERVALS
        {
            HealthStatus::Critical
        } else if error_rate > DEGRADED_ERROR_RATE
            || staleness > interval * DEGRADED_STALE_INTERVALS
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthReport {
            status,
            uptime_secs: now.saturating_duration_since(self.started).as_secs(),
            cycles: state.cycles,
            error_rate,
            last_successful_cycle: state.last_success.map(|(_, at)| at),
            recent_errors: state.recent_errors.iter().cloned().collect(),
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
