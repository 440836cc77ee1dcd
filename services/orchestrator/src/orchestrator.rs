//! # Cycle Orchestrator
//!
//! ## Purpose
//!
//! Runs the monitoring loop: every interval it fetches all configured instruments,
//! pushes each snapshot through signal generation, risk filtering, classification and
//! deduplication, then persists and delivers whatever survives.
//!
//! ## Architecture Role
//!
//! ```text
//!  tick ──→ fetch (batches, join_all) ──→ analyze ──→ abnormal-market gate
//!                                                         │
//!     ┌───────────────────────────────────────────────────┘
//!     ↓ per instrument
//!  generate ──→ risk ──→ classify ──→ merge ──→ cooler ──→ save snapshot
//!                                                             ↓
//!                                                  dispatcher + broadcast
//! ```
//!
//! A failure for one instrument never aborts the cycle; it is counted in the
//! [`CycleReport`] and the instrument is skipped. Synthetic snapshots are analyzed
//! like live ones but never reach the cooler or the dispatcher.

use crate::error::Result;
use crate::health::{HealthMonitor, HealthReport};
use crate::logging::LogEmoji;
use crate::metrics::{MetricsCollector, PipelineMetrics};
use crate::{log_alert, log_breaker, log_cycle};
use alerting::{
    merge_similar_signals, AlertClassifier, Decision, DeduplicationCooler, RiskContext,
    RiskFilter,
};
use anyhow::Context;
use chrono::Utc;
use config::{validate_symbol, AppConfig, ConfigError};
use futures::future::join_all;
use market_adapter::{
    BinanceFuturesClient, FetcherConfig, MarketDataFetcher, MarketDataSource, RequestTotals,
    RequestTracker,
};
use notifications::{
    Broadcaster, DispatcherSettings, EmailTransport, HttpEmailTransport, LogOnlyTransport,
    NotificationDispatcher, SubscriberHub,
};
use parking_lot::RwLock;
use signals::SignalGenerator;
use state::SnapshotStore;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, info, warn};
use types::{BroadcastEvent, ClassifiedAlert, CycleReport, MarketSnapshot, TechnicalSummary};

/// Externally constructed collaborators
pub struct OrchestratorParts {
    pub source: Arc<dyn MarketDataSource>,
    pub store: SnapshotStore,
    pub dispatcher: NotificationDispatcher,
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Exchange request counters, when the source is the live client
    pub request_tracker: Option<Arc<RequestTracker>>,
}

pub struct CycleOrchestrator {
    source: Arc<dyn MarketDataSource>,
    generator: SignalGenerator,
    risk: RiskFilter,
    classifier: AlertClassifier,
    cooler: DeduplicationCooler,
    store: SnapshotStore,
    dispatcher: NotificationDispatcher,
    broadcaster: Arc<dyn Broadcaster>,
    request_tracker: Option<Arc<RequestTracker>>,
    metrics: MetricsCollector,
    health: HealthMonitor,
    instruments: RwLock<Vec<String>>,
    interval: RwLock<Duration>,
    batch_size: usize,
    batch_delay: Duration,
    merge_distance: f64,
    abnormal_gate: bool,
    cooldown_sweep_interval: Duration,
    cycle_counter: AtomicU64,
}

impl CycleOrchestrator {
    pub fn new(config: &AppConfig, parts: OrchestratorParts) -> Self {
        Self {
            source: parts.source,
            generator: SignalGenerator::new(config.signals.clone()),
            risk: RiskFilter::new(config.risk.clone()),
            classifier: AlertClassifier::new(config.alerts.clone()),
            cooler: DeduplicationCooler::new(config.cooldown.clone()),
            store: parts.store,
            dispatcher: parts.dispatcher,
            broadcaster: parts.broadcaster,
            request_tracker: parts.request_tracker,
            metrics: MetricsCollector::new(),
            health: HealthMonitor::new(),
            instruments: RwLock::new(config.monitoring.instruments.clone()),
            interval: RwLock::new(config.monitoring.interval()),
            batch_size: config.monitoring.batch_size.max(1),
            batch_delay: config.monitoring.batch_delay(),
            merge_distance: config.alerts.merge_distance,
            abnormal_gate: config.risk.abnormal_market_gate,
            cooldown_sweep_interval: config.cooldown.sweep_interval(),
            cycle_counter: AtomicU64::new(0),
        }
    }

    /// Wire the production collaborators from configuration
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = BinanceFuturesClient::new(&config.exchange)
            .context("Failed to build exchange client")?;
        let request_tracker = client.tracker();

        let mock_fallback = config.mock_fallback_allowed();
        if mock_fallback {
            warn!(
                "{} Synthetic fallback enabled; failed price checks yield mock data",
                LogEmoji::WARNING
            );
        }
        let fetcher = MarketDataFetcher::new(
            Arc::new(client),
            FetcherConfig::from_exchange(&config.exchange, mock_fallback),
        );

        let store = SnapshotStore::open(&config.snapshots)
            .await
            .context("Failed to open snapshot store")?;

        let notifications = &config.notifications;
        let transport: Arc<dyn EmailTransport> = match &notifications.email_api {
            Some(api) => Arc::new(
                HttpEmailTransport::new(api, notifications.from_address.clone())
                    .context("Failed to build email transport")?,
            ),
            None => {
                info!("No email API configured, notifications will be logged only");
                Arc::new(LogOnlyTransport)
            }
        };
        let dispatcher =
            NotificationDispatcher::start(DispatcherSettings::from(notifications), transport);

        Ok(Self::new(
            config,
            OrchestratorParts {
                source: Arc::new(fetcher),
                store,
                dispatcher,
                broadcaster: Arc::new(SubscriberHub::new()),
                request_tracker: Some(request_tracker),
            },
        ))
    }

    /// Run one full monitoring cycle over `symbols`
    pub async fn run_cycle(&self, symbols: &[String]) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport {
            cycle_id: self.cycle_counter.fetch_add(1, Ordering::Relaxed) + 1,
            started_at: Some(Utc::now()),
            instruments_attempted: symbols.len(),
            ..Default::default()
        };
        let mut errors = Vec::new();

        log_cycle!("Cycle {} started for {} instruments", report.cycle_id, symbols.len());

        let snapshots = self.fetch_all(symbols, &mut report, &mut errors).await;

        let analyzed: Vec<(MarketSnapshot, Option<TechnicalSummary>)> = snapshots
            .into_iter()
            .map(|snapshot| {
                let summary = self.generator.analyze(&snapshot);
                (snapshot, summary)
            })
            .collect();

        let abnormal: Vec<&str> = analyzed
            .iter()
            .filter(|(snapshot, _)| !snapshot.is_synthetic())
            .filter_map(|(snapshot, summary)| summary.as_ref().map(|s| (snapshot, s)))
            .filter(|(snapshot, summary)| self.risk.is_abnormal(snapshot, summary))
            .map(|(snapshot, _)| snapshot.symbol.as_str())
            .collect();
        if !abnormal.is_empty() {
            if self.abnormal_gate {
                report.circuit_breaker_tripped = true;
                log_breaker!("Abnormal market on {:?}, holding notifications this cycle", abnormal);
            } else {
                warn!(instruments = ?abnormal, "Abnormal market detected, gate disabled");
            }
        }

        for (snapshot, summary) in &analyzed {
            let Some(summary) = summary else {
                continue;
            };

            let alerts = match self.evaluate(snapshot, summary, &mut report) {
                Ok(alerts) => alerts,
                Err(e) => {
                    warn!(symbol = %snapshot.symbol, error = %e, "Stage failed, skipping instrument");
                    report.stage_errors += 1;
                    errors.push(format!("{}: {e}", snapshot.symbol));
                    continue;
                }
            };

            if snapshot.is_synthetic() {
                debug!(
                    symbol = %snapshot.symbol,
                    alerts = alerts.len(),
                    "Synthetic data, alerts not forwarded"
                );
                continue;
            }

            for alert in alerts {
                if report.circuit_breaker_tripped {
                    report.alerts_suppressed += 1;
                    continue;
                }
                match self.cooler.decide(&alert) {
                    Decision::Allow(reason) => {
                        debug!(symbol = alert.symbol(), ?reason, "Cooler allowed alert");
                        self.emit(snapshot, summary, alert, &mut report).await;
                    }
                    Decision::Suppress(reason) => {
                        debug!(symbol = alert.symbol(), ?reason, "Cooler suppressed alert");
                        report.alerts_suppressed += 1;
                    }
                }
            }
        }

        report.duration = started.elapsed();
        self.metrics.record_cycle(&report);
        self.health.record_cycle(&report, errors);
        self.broadcaster
            .broadcast(&BroadcastEvent::cycle_report(&report))
            .await;

        log_cycle!(
            "Cycle {} done in {:?}: {}/{} fetched, {} candidates, {} accepted, {} emitted, {} suppressed",
            report.cycle_id,
            report.duration,
            report.instruments_succeeded,
            report.instruments_attempted,
            report.opportunities_found,
            report.candidates_accepted,
            report.alerts_emitted,
            report.alerts_suppressed
        );
        report
    }

    async fn fetch_all(
        &self,
        symbols: &[String],
        report: &mut CycleReport,
        errors: &mut Vec<String>,
    ) -> Vec<MarketSnapshot> {
        let mut snapshots = Vec::with_capacity(symbols.len());

        for (index, batch) in symbols.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let results = join_all(batch.iter().map(|symbol| self.source.fetch(symbol))).await;
            for (symbol, result) in batch.iter().zip(results) {
                match result {
                    Ok(snapshot) => {
                        if snapshot.is_synthetic() {
                            report.synthetic_snapshots += 1;
                        }
                        snapshots.push(snapshot);
                    }
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "{} Fetch failed", LogEmoji::ERROR);
                        report.instruments_failed += 1;
                        errors.push(format!("{symbol}: {e}"));
                    }
                }
            }
        }

        report.instruments_succeeded = snapshots.len();
        snapshots
    }

    /// Generate, risk-filter, classify and merge for one instrument
    fn evaluate(
        &self,
        snapshot: &MarketSnapshot,
        summary: &TechnicalSummary,
        report: &mut CycleReport,
    ) -> Result<Vec<ClassifiedAlert>> {
        let candidates = self.generator.generate_from(snapshot, summary)?;
        report.opportunities_found += candidates.len();

        let mut classified = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let context = RiskContext::from_market(snapshot, summary, candidate.direction);
            let assessment = self.risk.assess(candidate, &context)?;
            if !assessment.accepted {
                continue;
            }
            report.candidates_accepted += 1;
            classified.push(self.classifier.classify(candidate)?);
        }

        report.alerts_classified += classified.len();
        Ok(merge_similar_signals(classified, self.merge_distance))
    }

    async fn emit(
        &self,
        snapshot: &MarketSnapshot,
        summary: &TechnicalSummary,
        mut alert: ClassifiedAlert,
        report: &mut CycleReport,
    ) {
        match self.store.save(&alert.opportunity, snapshot, summary).await {
            Ok(id) => alert.opportunity.attach_snapshot(id),
            Err(e) => {
                warn!(symbol = alert.symbol(), error = %e, "Snapshot save failed, sending without link");
                report.snapshot_failures += 1;
            }
        }

        log_alert!(
            "{} {} {} {} @ {:.4} (net R:R {:.2})",
            alert.level,
            alert.opportunity.symbol,
            alert.opportunity.strategy,
            alert.opportunity.direction,
            alert.opportunity.entry,
            alert.opportunity.net_risk_reward
        );

        self.broadcaster
            .broadcast(&BroadcastEvent::alert(&alert))
            .await;
        if let Err(e) = self.dispatcher.deliver(alert) {
            warn!(error = %e, "Notification not queued");
        }
        report.alerts_emitted += 1;
    }

    /// Fixed-interval loop until `shutdown` resolves, then drain the notification queue
    ///
    /// Ticks that come due while a cycle is still running are skipped.
    ///
    /// `run_cycle` is awaited inside the tick arm of the `select!`, so an
    /// in-flight cycle always runs to completion. Shutdown and the cooldown
    /// sweep are only serviced between cycles; a ctrl-c mid-cycle waits for
    /// that cycle's exchange calls and notifications to finish.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut period = self.interval();
        let mut ticker = interval_at(tokio::time::Instant::now(), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let sweep_every = self.cooldown_sweep_interval;
        let mut sweeper = interval_at(tokio::time::Instant::now() + sweep_every, sweep_every);
        sweeper.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = period.as_secs(),
            instruments = self.instruments.read().len(),
            "{} Monitoring loop started",
            LogEmoji::SUCCESS
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping monitoring loop");
                    break;
                }
                _ = ticker.tick() => {
                    let symbols = self.instruments();
                    self.run_cycle(&symbols).await;

                    let current = self.interval();
                    if current != period {
                        info!(from = ?period, to = ?current, "Monitoring interval changed");
                        period = current;
                        ticker = interval_at(tokio::time::Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    }
                }
                _ = sweeper.tick() => {
                    self.sweep_cooldowns();
                }
            }
        }

        self.shutdown().await;
    }

    /// Drain queued notifications
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        info!("{} Shutdown complete", LogEmoji::SUCCESS);
    }

    pub fn sweep_cooldowns(&self) -> usize {
        let removed = self.cooler.sweep_expired(Utc::now());
        info!(removed, "{} Cooldown sweep", LogEmoji::SWEEP);
        removed
    }

    pub fn health(&self) -> HealthReport {
        self.health.report(self.interval())
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.get_metrics()
    }

    pub fn request_totals(&self) -> Option<RequestTotals> {
        self.request_tracker.as_ref().map(|t| t.totals())
    }

    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    pub fn cooler(&self) -> &DeduplicationCooler {
        &self.cooler
    }

    pub fn instruments(&self) -> Vec<String> {
        self.instruments.read().clone()
    }

    /// Replace the instrument list; symbols are uppercased and deduplicated
    pub fn set_instruments(&self, symbols: Vec<String>) -> Result<()> {
        let mut normalized: Vec<String> = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.trim().to_ascii_uppercase();
            validate_symbol(&symbol)?;
            if !normalized.contains(&symbol) {
                normalized.push(symbol);
            }
        }
        if normalized.is_empty() {
            return Err(ConfigError::EmptyInstruments.into());
        }

        info!(instruments = ?normalized, "Instrument list updated");
        *self.instruments.write() = normalized;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        *self.interval.read()
    }

    /// Takes effect after the current cycle
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(ConfigError::NotPositive {
                field: "monitoring.interval_secs",
            }
            .into());
        }
        *self.interval.write() = interval;
        Ok(())
    }
}
