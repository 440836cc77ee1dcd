//! Proximity classification of accepted candidates

use crate::error::{ensure_finite, ensure_positive, Result};
use chrono::Utc;
use config::AlertConfig;
use std::time::Duration;
use tracing::debug;
use types::{AlertLevel, CandidateOpportunity, ClassifiedAlert};

/// Floor for the volatility used in time-to-trigger estimates
const MIN_ATR_PCT: f64 = 1e-4;

/// Assigns WATCH / READY / FIRED from the distance between price and entry
///
/// Output depends only on the candidate's entry, ATR and the price it is measured
/// against, so re-classifying the same inputs always gives the same level.
pub struct AlertClassifier {
    config: AlertConfig,
}

impl AlertClassifier {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Classify against the price the candidate was generated at
    pub fn classify(&self, candidate: &CandidateOpportunity) -> Result<ClassifiedAlert> {
        self.classify_at(candidate, candidate.reference_price)
    }

    /// Classify against a newer market price
    pub fn classify_at(
        &self,
        candidate: &CandidateOpportunity,
        price: f64,
    ) -> Result<ClassifiedAlert> {
        let symbol = candidate.symbol.as_str();
        let price = ensure_positive(symbol, "price", price)?;
        let entry = ensure_finite(symbol, "entry", candidate.entry)?;
        let atr = ensure_finite(symbol, "atr", candidate.atr)?;

        let distance = (entry - price) / price;
        let atr_pct = atr.abs() / price;
        let level = self.level_for(distance, atr_pct);

        if distance.abs() > self.config.watch_distance {
            debug!(
                symbol,
                distance,
                watch_distance = self.config.watch_distance,
                "Entry beyond watch band"
            );
        }

        Ok(ClassifiedAlert {
            opportunity: candidate.clone(),
            level,
            distance,
            local_volatility: atr_pct,
            time_to_trigger: self.time_to_trigger(level, distance, atr_pct),
            classified_at: Utc::now(),
        })
    }

    pub fn level_for(&self, distance: f64, atr_pct: f64) -> AlertLevel {
        let abs = distance.abs();
        if abs <= self.config.fired_distance {
            AlertLevel::Fired
        } else if abs <= self.config.ready_atr_multiple * atr_pct {
            AlertLevel::Ready
        } else {
            AlertLevel::Watch
        }
    }

    /// Bars needed to cover the distance at one ATR per bar
    fn time_to_trigger(&self, level: AlertLevel, distance: f64, atr_pct: f64) -> Duration {
        if level == AlertLevel::Fired {
            return Duration::ZERO;
        }
        let bars = distance.abs() / atr_pct.max(MIN_ATR_PCT);
        let secs = bars * self.config.bar_interval_secs as f64;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// True when there is no previous level or the new one strictly outranks it
pub fn track_state_change(previous: Option<AlertLevel>, current: AlertLevel) -> bool {
    match previous {
        None => true,
        Some(previous) => current > previous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ConfidenceTier, Direction, EntryKind, OpportunityParams, StrategyTag};

    fn candidate(entry: f64, reference_price: f64, atr: f64) -> CandidateOpportunity {
        CandidateOpportunity::new(OpportunityParams {
            symbol: "ETHUSDT".to_string(),
            strategy: StrategyTag::Pullback,
            direction: Direction::Long,
            entry_kind: EntryKind::Limit,
            entry,
            stop_loss: entry - 10.0,
            take_profit_1: entry + 30.0,
            take_profit_2: entry + 40.0,
            transaction_cost: 0.0,
            confidence: ConfidenceTier::Medium,
            trigger: "test".to_string(),
            reference_price,
            atr,
        })
        .unwrap()
    }

    #[test]
    fn test_level_bands() {
        let classifier = AlertClassifier::new(AlertConfig::default());

        // 0.4 % away
        let fired = classifier.classify(&candidate(1004.0, 1000.0, 10.0)).unwrap();
        assert_eq!(fired.level, AlertLevel::Fired);
        assert_eq!(fired.time_to_trigger, Duration::ZERO);

        // 1.2 % away, READY band 1.5 × 1 %
        let ready = classifier.classify(&candidate(988.0, 1000.0, 10.0)).unwrap();
        assert_eq!(ready.level, AlertLevel::Ready);
        assert!((ready.distance + 0.012).abs() < 1e-12);
        // 1.2 bars of 900 s
        assert!((ready.time_to_trigger.as_secs_f64() - 1080.0).abs() < 1e-6);

        // 1.8 % away
        let watch = classifier.classify(&candidate(1018.0, 1000.0, 10.0)).unwrap();
        assert_eq!(watch.level, AlertLevel::Watch);

        // beyond the watch band still classifies as WATCH
        let far = classifier.classify(&candidate(1050.0, 1000.0, 10.0)).unwrap();
        assert_eq!(far.level, AlertLevel::Watch);
    }

    #[test]
    fn test_fired_boundary_inclusive() {
        let classifier = AlertClassifier::new(AlertConfig::default());
        assert_eq!(classifier.level_for(0.005, 0.0), AlertLevel::Fired);
        assert_eq!(classifier.level_for(-0.005, 0.0), AlertLevel::Fired);
        assert_eq!(classifier.level_for(0.0051, 0.0), AlertLevel::Watch);
    }

    #[test]
    fn test_classification_is_pure() {
        let classifier = AlertClassifier::new(AlertConfig::default());
        let candidate = candidate(988.0, 1000.0, 10.0);

        let a = classifier.classify(&candidate).unwrap();
        let b = classifier.classify(&candidate).unwrap();
        assert_eq!(a.level, b.level);
        assert_eq!(a.distance, b.distance);
        assert_eq!(a.time_to_trigger, b.time_to_trigger);
    }

    #[test]
    fn test_reclassify_against_new_price() {
        let classifier = AlertClassifier::new(AlertConfig::default());
        let candidate = candidate(990.0, 1000.0, 10.0);

        assert_eq!(classifier.classify(&candidate).unwrap().level, AlertLevel::Ready);
        let closer = classifier.classify_at(&candidate, 992.0).unwrap();
        assert_eq!(closer.level, AlertLevel::Fired);
        assert!(classifier.classify_at(&candidate, 0.0).is_err());
    }

    #[test]
    fn test_zero_atr_uses_floor() {
        let classifier = AlertClassifier::new(AlertConfig::default());
        let alert = classifier.classify(&candidate(1010.0, 1000.0, 0.0)).unwrap();

        assert_eq!(alert.level, AlertLevel::Watch);
        // 0.01 / 1e-4 bars
        assert!((alert.time_to_trigger.as_secs_f64() - 90_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_state_change_tracking() {
        assert!(track_state_change(None, AlertLevel::Watch));
        assert!(track_state_change(Some(AlertLevel::Watch), AlertLevel::Ready));
        assert!(!track_state_change(Some(AlertLevel::Ready), AlertLevel::Ready));
        assert!(!track_state_change(Some(AlertLevel::Fired), AlertLevel::Ready));
    }
}
