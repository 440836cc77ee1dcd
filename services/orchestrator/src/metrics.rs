//! Pipeline metrics collection

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use types::CycleReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub synthetic_snapshots: u64,
    pub stage_errors: u64,
    pub alerts_emitted: u64,
    pub alerts_suppressed: u64,
    pub snapshot_failures: u64,
    pub gated_cycles: u64,
    pub uptime_secs: u64,
}

/// Thread-safe cumulative counters across cycles
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    cycles: AtomicU64,
    fetch_failures: AtomicU64,
    synthetic_snapshots: AtomicU64,
    stage_errors: AtomicU64,
    alerts_emitted: AtomicU64,
    alerts_suppressed: AtomicU64,
    snapshot_failures: AtomicU64,
    gated_cycles: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            synthetic_snapshots: AtomicU64::new(0),
            stage_errors: AtomicU64::new(0),
            alerts_emitted: AtomicU64::new(0),
            alerts_suppressed: AtomicU64::new(0),
            snapshot_failures: AtomicU64::new(0),
            gated_cycles: AtomicU64::new(0),
        }
    }

    pub fn record_cycle(&self, report: &CycleReport) {
        let add = |counter: &AtomicU64, n: usize| {
            counter.fetch_add(n as u64, Ordering::Relaxed);
        };
        self.cycles.fetch_add(1, Ordering::Relaxed);
        add(&self.fetch_failures, report.instruments_failed);
        add(&self.synthetic_snapshots, report.synthetic_snapshots);
        add(&self.stage_errors, report.stage_errors);
        add(&self.alerts_emitted, report.alerts_emitted);
        add(&self.alerts_suppressed, report.alerts_suppressed);
        add(&self.snapshot_failures, report.snapshot_failures);
        if report.circuit_breaker_tripped {
            self.gated_cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_metrics(&self) -> PipelineMetrics {
        PipelineMetrics {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            synthetic_snapshots: self.synthetic_snapshots.load(Ordering::Relaxed),
            stage_errors: self.stage_errors.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            snapshot_failures: self.snapshot_failures.load(Ordering::Relaxed),
            gated_cycles: self.gated_cycles.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
