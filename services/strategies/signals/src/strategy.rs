//! Main signal generator implementation
//!
//! One pass per instrument per cycle: summarize the candle window once, then evaluate
//! each strategy family against the summary. Candidates below the minimum net
//! risk/reward never leave this module.

use crate::cost::CostModel;
use crate::error::{Result, SignalError};
use crate::indicators;
use crate::signals::SignalStats;
use config::SignalConfig;
use parking_lot::RwLock;
use std::cmp::Ordering;
use tracing::{debug, warn};
use types::{
    CandidateOpportunity, ConfidenceTier, Direction, EntryKind, MarketSnapshot,
    OpportunityParams, StrategyTag, TechnicalSummary, Trend,
};

/// Entry/stop/target geometry in multiples of the base stop distance
#[derive(Debug, Clone, Copy)]
struct Geometry {
    entry_kind: EntryKind,
    /// Limit entries sit this far into the move, market entries use 0
    entry_offset: f64,
    stop: f64,
    take_profit_1: f64,
    take_profit_2: f64,
}

const BREAKOUT: Geometry = Geometry {
    entry_kind: EntryKind::Market,
    entry_offset: 0.0,
    stop: 1.0,
    take_profit_1: 2.0,
    take_profit_2: 3.0,
};

const PULLBACK: Geometry = Geometry {
    entry_kind: EntryKind::Limit,
    entry_offset: 0.3,
    stop: 1.0,
    take_profit_1: 2.5,
    take_profit_2: 4.0,
};

const TREND_FOLLOW: Geometry = Geometry {
    entry_kind: EntryKind::Market,
    entry_offset: 0.0,
    stop: 1.2,
    take_profit_1: 3.0,
    take_profit_2: 5.0,
};

/// Range position beyond which a pullback is considered deep
const DEEP_PULLBACK_LOW: f64 = 0.15;
const DEEP_PULLBACK_HIGH: f64 = 0.85;

/// EMA spread at which a trend-follow candidate is high confidence
const STRONG_TREND_SPREAD: f64 = 0.01;

/// A strategy family's decision before geometry is applied
struct Trigger {
    strategy: StrategyTag,
    direction: Direction,
    confidence: ConfidenceTier,
    geometry: Geometry,
    description: String,
}

/// Rule-based candidate generator
///
/// Stateless apart from [`SignalStats`]; safe to share across tasks.
pub struct SignalGenerator {
    config: SignalConfig,
    costs: CostModel,
    stats: RwLock<SignalStats>,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        let costs = CostModel::from(&config.costs);
        Self {
            config,
            costs,
            stats: RwLock::new(SignalStats::default()),
        }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Get generator statistics
    pub fn get_stats(&self) -> SignalStats {
        self.stats.read().clone()
    }

    /// Summarize the snapshot's candle window
    ///
    /// `None` when there are fewer than `min_candles` candles, the last close is not
    /// positive, or the window is too short for any configured indicator period.
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Option<TechnicalSummary> {
        let candles = &snapshot.candles;
        let cfg = &self.config;

        if candles.len() < cfg.min_candles {
            warn!(
                symbol = %snapshot.symbol,
                candles = candles.len(),
                required = cfg.min_candles,
                "Insufficient candles for analysis"
            );
            return None;
        }

        let last_close = candles.last().map(|c| c.close_f64()).unwrap_or(0.0);
        if last_close <= 0.0 {
            warn!(symbol = %snapshot.symbol, last_close, "Non-positive last close, skipping");
            return None;
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close_f64()).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume_f64()).collect();

        let summary = (|| {
            let atr = indicators::atr(candles, cfg.atr_period)?;
            let ema_fast = indicators::ema(&closes, cfg.ema_fast_period)?;
            let ema_slow = indicators::ema(&closes, cfg.ema_slow_period)?;
            let volume_zscore = indicators::zscore_of_latest(&volumes, cfg.volume_window)?;
            let range_position = indicators::range_position(candles, cfg.range_window)?;
            let latest_return = indicators::latest_return(&closes)?;

            let price = match snapshot.price_f64() {
                p if p > 0.0 => p,
                _ => last_close,
            };
            let trend = match ema_fast.partial_cmp(&ema_slow) {
                Some(Ordering::Greater) => Trend::Up,
                Some(Ordering::Less) => Trend::Down,
                _ => Trend::Range,
            };

            Some(TechnicalSummary {
                price,
                atr,
                atr_pct: atr / price,
                ema_fast,
                ema_slow,
                trend,
                volume_zscore,
                range_position,
                latest_return,
                candle_count: candles.len(),
            })
        })();

        if summary.is_none() {
            warn!(
                symbol = %snapshot.symbol,
                candles = candles.len(),
                "Candle window too short for indicator periods"
            );
        }
        summary
    }

    /// Analyze and generate in one step
    pub fn generate(&self, snapshot: &MarketSnapshot) -> Result<Vec<CandidateOpportunity>> {
        match self.analyze(snapshot) {
            Some(summary) => self.generate_from(snapshot, &summary),
            None => Ok(Vec::new()),
        }
    }

    /// Generate candidates from an existing summary
    ///
    /// Output is sorted by confidence, then net risk/reward, both descending.
    pub fn generate_from(
        &self,
        snapshot: &MarketSnapshot,
        summary: &TechnicalSummary,
    ) -> Result<Vec<CandidateOpportunity>> {
        validate_summary(&snapshot.symbol, summary)?;

        let triggers = [
            self.breakout(summary),
            self.pullback(summary),
            self.trend_follow(summary),
        ];

        let base_distance = self.base_stop_distance(summary);
        let mut candidates = Vec::new();

        for trigger in triggers.into_iter().flatten() {
            let Some(candidate) = self.build(snapshot, summary, base_distance, trigger)? else {
                continue;
            };

            if candidate.net_risk_reward < self.config.min_net_risk_reward {
                debug!(
                    symbol = %candidate.symbol,
                    strategy = %candidate.strategy,
                    net_rr = candidate.net_risk_reward,
                    min = self.config.min_net_risk_reward,
                    "Candidate below minimum net risk/reward"
                );
                self.stats.write().record_rejection();
                continue;
            }

            self.stats.write().record_signal(&candidate);
            candidates.push(candidate);
        }

        candidates.sort_by(|a, b| {
            b.confidence.cmp(&a.confidence).then_with(|| {
                b.net_risk_reward
                    .partial_cmp(&a.net_risk_reward)
                    .unwrap_or(Ordering::Equal)
            })
        });

        if !candidates.is_empty() {
            debug!(
                symbol = %snapshot.symbol,
                count = candidates.len(),
                trend = %summary.trend,
                "Generated candidates"
            );
        }
        Ok(candidates)
    }

    /// `max(ATR × multiplier, price × min_stop_pct, price × floor_stop_pct)`
    fn base_stop_distance(&self, summary: &TechnicalSummary) -> f64 {
        (summary.atr * self.config.atr_stop_multiplier)
            .max(summary.price * self.config.min_stop_pct)
            .max(summary.price * self.config.floor_stop_pct)
    }

    fn breakout(&self, summary: &TechnicalSummary) -> Option<Trigger> {
        let threshold = self.config.volume_zscore_threshold;
        if summary.volume_zscore <= threshold || summary.latest_return == 0.0 {
            return None;
        }

        let direction = if summary.latest_return > 0.0 {
            Direction::Long
        } else {
            Direction::Short
        };
        let strong_volume = summary.volume_zscore >= 2.0 * threshold;
        let with_trend = matches!(
            (direction, summary.trend),
            (Direction::Long, Trend::Up) | (Direction::Short, Trend::Down)
        );
        let confidence = match (strong_volume, with_trend) {
            (true, true) => ConfidenceTier::High,
            (true, false) | (false, true) => ConfidenceTier::Medium,
            (false, false) => ConfidenceTier::Low,
        };

        Some(Trigger {
            strategy: StrategyTag::Breakout,
            direction,
            confidence,
            geometry: BREAKOUT,
            description: format!(
                "Volume spike z={:.2} with {:+.2}% move, trend {}",
                summary.volume_zscore,
                summary.latest_return * 100.0,
                summary.trend
            ),
        })
    }

    fn pullback(&self, summary: &TechnicalSummary) -> Option<Trigger> {
        let position = summary.range_position;
        let direction = match summary.trend {
            Trend::Up if position < self.config.pullback_low => Direction::Long,
            Trend::Down if position > self.config.pullback_high => Direction::Short,
            _ => return None,
        };

        let deep = position < DEEP_PULLBACK_LOW || position > DEEP_PULLBACK_HIGH;
        Some(Trigger {
            strategy: StrategyTag::Pullback,
            direction,
            confidence: if deep {
                ConfidenceTier::High
            } else {
                ConfidenceTier::Medium
            },
            geometry: PULLBACK,
            description: format!(
                "Pullback to {:.0}% of range in {} trend",
                position * 100.0,
                summary.trend
            ),
        })
    }

    fn trend_follow(&self, summary: &TechnicalSummary) -> Option<Trigger> {
        let spread = summary.ema_spread();
        if spread < self.config.trend_min_spread {
            return None;
        }

        let direction = match summary.trend {
            Trend::Up if summary.price > summary.ema_fast => Direction::Long,
            Trend::Down if summary.price < summary.ema_fast => Direction::Short,
            _ => return None,
        };

        Some(Trigger {
            strategy: StrategyTag::TrendFollow,
            direction,
            confidence: if spread >= STRONG_TREND_SPREAD {
                ConfidenceTier::High
            } else {
                ConfidenceTier::Medium
            },
            geometry: TREND_FOLLOW,
            description: format!(
                "EMA{}/{} spread {:.2}% in {} trend",
                self.config.ema_fast_period,
                self.config.ema_slow_period,
                spread * 100.0,
                summary.trend
            ),
        })
    }

    fn build(
        &self,
        snapshot: &MarketSnapshot,
        summary: &TechnicalSummary,
        base_distance: f64,
        trigger: Trigger,
    ) -> Result<Option<CandidateOpportunity>> {
        let sign = trigger.direction.sign();
        let geometry = trigger.geometry;

        // Limit entries wait for price to come further into the pullback
        let entry = summary.price - sign * geometry.entry_offset * base_distance;
        let stop_loss = entry - sign * geometry.stop * base_distance;
        let take_profit_1 = entry + sign * geometry.take_profit_1 * base_distance;
        let take_profit_2 = entry + sign * geometry.take_profit_2 * base_distance;

        // Distances wider than price itself put a level below zero
        if [entry, stop_loss, take_profit_1, take_profit_2]
            .iter()
            .any(|level| *level <= 0.0)
        {
            debug!(
                symbol = %snapshot.symbol,
                strategy = %trigger.strategy,
                base_distance,
                "Skipping candidate with non-positive price level"
            );
            return Ok(None);
        }

        CandidateOpportunity::new(OpportunityParams {
            symbol: snapshot.symbol.clone(),
            strategy: trigger.strategy,
            direction: trigger.direction,
            entry_kind: geometry.entry_kind,
            entry,
            stop_loss,
            take_profit_1,
            take_profit_2,
            transaction_cost: self.costs.round_trip(geometry.entry_kind),
            confidence: trigger.confidence,
            trigger: trigger.description,
            reference_price: summary.price,
            atr: summary.atr,
        })
        .map(Some)
        .map_err(|source| SignalError::Candidate {
            symbol: snapshot.symbol.clone(),
            source,
        })
    }
}

fn validate_summary(symbol: &str, summary: &TechnicalSummary) -> Result<()> {
    let fields = [
        ("price", summary.price),
        ("atr", summary.atr),
        ("ema_fast", summary.ema_fast),
        ("ema_slow", summary.ema_slow),
        ("volume_zscore", summary.volume_zscore),
        ("range_position", summary.range_position),
        ("latest_return", summary.latest_return),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(SignalError::Calculation {
                message: format!("{symbol}: non-finite {name} ({value})"),
            });
        }
    }
    if summary.price <= 0.0 {
        return Err(SignalError::MarketData {
            message: format!("{symbol}: non-positive price {}", summary.price),
        });
    }
    Ok(())
}
