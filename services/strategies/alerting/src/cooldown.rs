//! Deduplication cooler
//!
//! Decides whether a classified alert is worth notifying. One cooldown entry is kept
//! per `(symbol, strategy)`; while it is live only a strict level upgrade gets
//! through. With no live entry the alert must clear the instrument's adaptive net
//! R:R threshold for its level.
//!
//! ```text
//! ClassifiedAlert ──→ live entry? ──yes──→ upgrade? ──yes──→ Allow(Upgrade)
//!                         │                   └──no───→ Suppress(Cooldown)
//!                         no
//!                         ↓
//!                  net ≥ threshold? ──yes──→ Allow(Threshold), count++, ratchet
//!                         └──no───→ Suppress(BelowThreshold)
//! ```

use crate::error::{ensure_finite, Result};
use chrono::{DateTime, Utc};
use config::CooldownConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use types::{AlertLevel, ClassifiedAlert, CooldownEntry, CooldownKey};

/// Per-instrument net R:R thresholds by alert level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    pub fired: f64,
    pub ready: f64,
    pub watch: f64,
}

impl LevelThresholds {
    pub fn base(config: &CooldownConfig) -> Self {
        Self {
            fired: config.fired_threshold,
            ready: config.ready_threshold,
            watch: config.watch_threshold,
        }
    }

    pub fn for_level(&self, level: AlertLevel) -> f64 {
        match level {
            AlertLevel::Fired => self.fired,
            AlertLevel::Ready => self.ready,
            AlertLevel::Watch => self.watch,
        }
    }

    fn raise(&mut self, factor: f64, cap: f64) {
        self.fired = (self.fired * factor).min(cap);
        self.ready = (self.ready * factor).min(cap);
        self.watch = (self.watch * factor).min(cap);
    }
}

#[derive(Debug, Clone)]
struct InstrumentState {
    thresholds: LevelThresholds,
    notifications: u64,
}

/// Cooldown entries plus per-instrument adaptive thresholds
///
/// In-memory only; a restart starts from base thresholds with no live cooldowns.
#[derive(Debug, Default)]
pub struct CooldownStore {
    entries: HashMap<CooldownKey, CooldownEntry>,
    instruments: HashMap<String, InstrumentState>,
}

impl CooldownStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllowReason {
    /// Live cooldown bypassed by a higher level
    Upgrade { previous: AlertLevel },
    /// No live cooldown and net R:R cleared the threshold
    Threshold { threshold: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuppressReason {
    Cooldown {
        level: AlertLevel,
        expires_at: DateTime<Utc>,
    },
    BelowThreshold {
        net_risk_reward: f64,
        threshold: f64,
    },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow(AllowReason),
    Suppress(SuppressReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

pub struct DeduplicationCooler {
    config: CooldownConfig,
    window: chrono::Duration,
    store: Mutex<CooldownStore>,
}

impl DeduplicationCooler {
    pub fn new(config: CooldownConfig) -> Self {
        let window = chrono::Duration::from_std(config.window())
            .unwrap_or_else(|_| chrono::Duration::weeks(52));
        Self {
            config,
            window,
            store: Mutex::new(CooldownStore::default()),
        }
    }

    pub fn config(&self) -> &CooldownConfig {
        &self.config
    }

    pub fn should_notify(&self, alert: &ClassifiedAlert) -> bool {
        self.should_notify_at(alert, Utc::now())
    }

    pub fn should_notify_at(&self, alert: &ClassifiedAlert, now: DateTime<Utc>) -> bool {
        self.decide_at(alert, now).is_allowed()
    }

    pub fn decide(&self, alert: &ClassifiedAlert) -> Decision {
        self.decide_at(alert, Utc::now())
    }

    /// Evaluate and record one alert; any error suppresses
    pub fn decide_at(&self, alert: &ClassifiedAlert, now: DateTime<Utc>) -> Decision {
        let mut store = self.store.lock();
        match self.evaluate(&mut store, alert, now) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(symbol = alert.symbol(), error = %e, "Cooldown check failed, suppressing");
                Decision::Suppress(SuppressReason::Error(e.to_string()))
            }
        }
    }

    fn evaluate(
        &self,
        store: &mut CooldownStore,
        alert: &ClassifiedAlert,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let symbol = alert.symbol();
        let net = ensure_finite(symbol, "net_risk_reward", alert.opportunity.net_risk_reward)?;
        let key = alert.cooldown_key();

        if let Some(entry) = store.entries.get(&key).filter(|e| e.is_live(now)) {
            if alert.level > entry.level {
                let previous = entry.level;
                store
                    .entries
                    .insert(key, CooldownEntry::new(now, alert.level, self.window));
                info!(symbol, from = %previous, to = %alert.level, "Level upgrade bypasses cooldown");
                return Ok(Decision::Allow(AllowReason::Upgrade { previous }));
            }

            debug!(
                symbol,
                level = %alert.level,
                live_level = %entry.level,
                "Suppressed by cooldown"
            );
            return Ok(Decision::Suppress(SuppressReason::Cooldown {
                level: entry.level,
                expires_at: entry.expires_at,
            }));
        }

        let base = LevelThresholds::base(&self.config);
        let instrument = store
            .instruments
            .entry(symbol.to_string())
            .or_insert_with(|| InstrumentState {
                thresholds: base,
                notifications: 0,
            });
        let threshold = instrument.thresholds.for_level(alert.level);

        if net < threshold {
            debug!(symbol, net, threshold, level = %alert.level, "Below adaptive threshold");
            return Ok(Decision::Suppress(SuppressReason::BelowThreshold {
                net_risk_reward: net,
                threshold,
            }));
        }

        instrument.notifications += 1;
        let count = instrument.notifications;
        if self.config.adjust_every > 0
            && count % self.config.adjust_every == 0
            && count > self.config.adjust_after
        {
            instrument
                .thresholds
                .raise(self.config.adjust_factor, self.config.max_threshold);
            info!(
                symbol,
                notifications = count,
                fired = instrument.thresholds.fired,
                ready = instrument.thresholds.ready,
                watch = instrument.thresholds.watch,
                "Raised adaptive thresholds"
            );
        }

        store
            .entries
            .insert(key, CooldownEntry::new(now, alert.level, self.window));
        Ok(Decision::Allow(AllowReason::Threshold { threshold }))
    }

    /// Drop expired cooldown entries, returning how many were removed
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut store = self.store.lock();
        let before = store.entries.len();
        store.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - store.entries.len();
        if removed > 0 {
            debug!(removed, remaining = store.entries.len(), "Swept expired cooldowns");
        }
        removed
    }

    pub fn thresholds_for(&self, symbol: &str) -> LevelThresholds {
        self.store
            .lock()
            .instruments
            .get(symbol)
            .map(|s| s.thresholds)
            .unwrap_or_else(|| LevelThresholds::base(&self.config))
    }

    pub fn notification_count(&self, symbol: &str) -> u64 {
        self.store
            .lock()
            .instruments
            .get(symbol)
            .map(|s| s.notifications)
            .unwrap_or(0)
    }

    pub fn active_entries(&self, now: DateTime<Utc>) -> usize {
        self.store
            .lock()
            .entries
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub fn entry(&self, key: &CooldownKey) -> Option<CooldownEntry> {
        self.store.lock().entries.get(key).cloned()
    }
}

/// Collapse near-identical alerts for the same symbol
///
/// Alerts join the first cluster of their symbol whose anchor distance is within
/// `merge_distance`. Each cluster keeps its highest-level alert (the earliest on
/// ties). Clusters come out in order of first appearance.
pub fn merge_similar_signals(
    alerts: Vec<ClassifiedAlert>,
    merge_distance: f64,
) -> Vec<ClassifiedAlert> {
    struct Cluster {
        anchor: f64,
        best: ClassifiedAlert,
    }

    let mut clusters: Vec<Cluster> = Vec::with_capacity(alerts.len());
    for alert in alerts {
        let existing = clusters.iter_mut().find(|c| {
            c.best.symbol() == alert.symbol() && (alert.distance - c.anchor).abs() <= merge_distance
        });
        match existing {
            Some(cluster) => {
                if alert.level > cluster.best.level {
                    cluster.best = alert;
                }
            }
            None => clusters.push(Cluster {
                anchor: alert.distance,
                best: alert,
            }),
        }
    }

    clusters.into_iter().map(|c| c.best).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use types::{
        CandidateOpportunity, ConfidenceTier, Direction, EntryKind, OpportunityParams, StrategyTag,
    };

    fn alert(symbol: &str, strategy: StrategyTag, level: AlertLevel, net: f64) -> ClassifiedAlert {
        // risk 1, zero cost: net = tp1 - entry
        let mut opportunity = CandidateOpportunity::new(OpportunityParams {
            symbol: symbol.to_string(),
            strategy,
            direction: Direction::Long,
            entry_kind: EntryKind::Market,
            entry: 100.0,
            stop_loss: 99.0,
            take_profit_1: 100.0 + net.max(0.01),
            take_profit_2: 110.0,
            transaction_cost: 0.0,
            confidence: ConfidenceTier::High,
            trigger: "test".to_string(),
            reference_price: 100.0,
            atr: 1.0,
        })
        .unwrap();
        opportunity.net_risk_reward = net;

        ClassifiedAlert {
            opportunity,
            level,
            distance: 0.0,
            local_volatility: 0.01,
            time_to_trigger: Duration::ZERO,
            classified_at: Utc::now(),
        }
    }

    fn with_distance(mut alert: ClassifiedAlert, distance: f64) -> ClassifiedAlert {
        alert.distance = distance;
        alert
    }

    #[test]
    fn test_threshold_by_level() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let now = Utc::now();

        let watch = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Watch, 2.9);
        assert!(matches!(
            cooler.decide_at(&watch, now),
            Decision::Suppress(SuppressReason::BelowThreshold { .. })
        ));

        let fired = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Fired, 2.0);
        assert_eq!(
            cooler.decide_at(&fired, now),
            Decision::Allow(AllowReason::Threshold { threshold: 2.0 })
        );
        assert_eq!(cooler.notification_count("BTCUSDT"), 1);
    }

    #[test]
    fn test_cooldown_suppresses_repeat_until_expiry() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let now = Utc::now();
        let ready = alert("ETHUSDT", StrategyTag::Pullback, AlertLevel::Ready, 3.0);

        assert!(cooler.should_notify_at(&ready, now));
        assert!(!cooler.should_notify_at(&ready, now + chrono::Duration::minutes(10)));
        assert!(cooler.should_notify_at(&ready, now + chrono::Duration::minutes(31)));
    }

    #[test]
    fn test_upgrade_bypasses_and_downgrade_suppressed() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let now = Utc::now();
        let key = CooldownKey {
            symbol: "SOLUSDT".to_string(),
            strategy: StrategyTag::Breakout,
        };

        let watch = alert("SOLUSDT", StrategyTag::Breakout, AlertLevel::Watch, 3.5);
        assert!(cooler.should_notify_at(&watch, now));

        // upgrade ignores the threshold
        let later = now + chrono::Duration::minutes(5);
        let fired = alert("SOLUSDT", StrategyTag::Breakout, AlertLevel::Fired, 1.0);
        assert_eq!(
            cooler.decide_at(&fired, later),
            Decision::Allow(AllowReason::Upgrade {
                previous: AlertLevel::Watch
            })
        );
        let entry = cooler.entry(&key).unwrap();
        assert_eq!(entry.level, AlertLevel::Fired);
        assert_eq!(entry.expires_at, later + chrono::Duration::minutes(30));

        let ready = alert("SOLUSDT", StrategyTag::Breakout, AlertLevel::Ready, 9.0);
        assert!(!cooler.should_notify_at(&ready, later + chrono::Duration::minutes(1)));

        // other strategy on the same symbol is independent
        let other = alert("SOLUSDT", StrategyTag::TrendFollow, AlertLevel::Ready, 3.0);
        assert!(cooler.should_notify_at(&other, later));
    }

    #[test]
    fn test_adaptive_threshold_ratchet() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let mut now = Utc::now();

        // step past each window so every alert takes the threshold path
        for n in 1..=60u64 {
            let fired = alert("BNBUSDT", StrategyTag::Breakout, AlertLevel::Fired, 10.0);
            assert!(cooler.should_notify_at(&fired, now));
            now += chrono::Duration::minutes(31);

            let thresholds = cooler.thresholds_for("BNBUSDT");
            match n {
                1..=59 => assert_eq!(thresholds.fired, 2.0, "at {n}"),
                _ => {
                    assert!((thresholds.fired - 2.2).abs() < 1e-9);
                    assert!((thresholds.ready - 2.75).abs() < 1e-9);
                    assert!((thresholds.watch - 3.3).abs() < 1e-9);
                }
            }
        }
        assert_eq!(cooler.notification_count("BNBUSDT"), 60);
        assert_eq!(cooler.thresholds_for("BTCUSDT").fired, 2.0);
    }

    #[test]
    fn test_threshold_capped() {
        let config = CooldownConfig {
            adjust_every: 1,
            adjust_after: 0,
            adjust_factor: 2.0,
            ..Default::default()
        };
        let cooler = DeduplicationCooler::new(config);
        let mut now = Utc::now();

        for _ in 0..3 {
            let fired = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Fired, 10.0);
            assert!(cooler.should_notify_at(&fired, now));
            now += chrono::Duration::hours(1);
        }
        let thresholds = cooler.thresholds_for("BTCUSDT");
        assert_eq!(thresholds.fired, 5.0);
        assert_eq!(thresholds.watch, 5.0);
    }

    #[test]
    fn test_non_finite_fails_closed() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let bad = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Fired, f64::NAN);

        assert!(matches!(
            cooler.decide(&bad),
            Decision::Suppress(SuppressReason::Error(_))
        ));
        assert_eq!(cooler.active_entries(Utc::now()), 0);
    }

    #[test]
    fn test_sweep_expired() {
        let cooler = DeduplicationCooler::new(CooldownConfig::default());
        let now = Utc::now();

        let a = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Fired, 3.0);
        let b = alert("ETHUSDT", StrategyTag::Breakout, AlertLevel::Fired, 3.0);
        assert!(cooler.should_notify_at(&a, now));
        assert!(cooler.should_notify_at(&b, now + chrono::Duration::minutes(20)));

        assert_eq!(cooler.sweep_expired(now + chrono::Duration::minutes(40)), 1);
        assert_eq!(cooler.active_entries(now + chrono::Duration::minutes(40)), 1);
        assert_eq!(cooler.sweep_expired(now + chrono::Duration::hours(2)), 1);
    }

    #[test]
    fn test_merge_keeps_highest_level_per_cluster() {
        let btc_watch = with_distance(
            alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Watch, 3.0),
            0.0100,
        );
        let eth = with_distance(
            alert("ETHUSDT", StrategyTag::Breakout, AlertLevel::Watch, 3.0),
            0.0100,
        );
        let btc_ready = with_distance(
            alert("BTCUSDT", StrategyTag::Pullback, AlertLevel::Ready, 3.0),
            0.0105,
        );
        let btc_far = with_distance(
            alert("BTCUSDT", StrategyTag::TrendFollow, AlertLevel::Fired, 3.0),
            0.0200,
        );
        let ready_id = btc_ready.opportunity.id;

        let merged = merge_similar_signals(vec![btc_watch, eth, btc_ready, btc_far], 0.001);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].opportunity.id, ready_id);
        assert_eq!(merged[1].symbol(), "ETHUSDT");
        assert_eq!(merged[2].level, AlertLevel::Fired);
    }

    #[test]
    fn test_merge_ties_keep_first() {
        let first = alert("BTCUSDT", StrategyTag::Breakout, AlertLevel::Ready, 3.0);
        let second = alert("BTCUSDT", StrategyTag::Pullback, AlertLevel::Ready, 3.0);
        let first_id = first.opportunity.id;

        let merged = merge_similar_signals(vec![first, second], 0.001);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].opportunity.id, first_id);
        assert!(merge_similar_signals(Vec::new(), 0.001).is_empty());
    }
}
