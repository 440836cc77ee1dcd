//! Risk filter gating candidates before classification
//!
//! Four independent checks decide acceptance. The composite score is reported for
//! context only and never overrides a failed check.

use crate::error::{ensure_finite, Result};
use chrono::Utc;
use config::RiskConfig;
use tracing::debug;
use types::{
    CandidateOpportunity, Direction, MarketSnapshot, RiskAssessment, RiskChecks, RiskFactors,
    TechnicalSummary, Trend,
};

const RISK_REWARD_WEIGHT: f64 = 40.0;
const VOLATILITY_WEIGHT: f64 = 25.0;
const LIQUIDITY_WEIGHT: f64 = 20.0;
const MARKET_CONDITION_WEIGHT: f64 = 15.0;

const TREND_WEIGHT: f64 = 0.5;
const IMBALANCE_WEIGHT: f64 = 0.3;
const FUNDING_WEIGHT: f64 = 0.2;
/// Funding rate at which the funding component bottoms out
const FUNDING_SATURATION: f64 = 0.0005;

/// Below this neutral market-condition score the market is treated as abnormal
const ABNORMAL_MARKET_CONDITION: f64 = 0.3;
const ABNORMAL_VOLATILITY_MULTIPLE: f64 = 2.0;

/// Market context for one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskContext {
    /// ATR / price × 100
    pub volatility_pct: f64,
    /// 24h quote volume
    pub liquidity_usd: f64,
    /// Composite in [0, 1]
    pub market_condition: f64,
}

impl RiskContext {
    pub fn from_market(
        snapshot: &MarketSnapshot,
        summary: &TechnicalSummary,
        direction: Direction,
    ) -> Self {
        Self {
            volatility_pct: summary.volatility_pct(),
            liquidity_usd: snapshot.liquidity_usd(),
            market_condition: directional_condition(snapshot, summary, direction),
        }
    }
}

/// Market condition as seen from one trade direction
///
/// Trend alignment, order-book imbalance toward the trade and funding that does not
/// charge the position all raise the score.
pub fn directional_condition(
    snapshot: &MarketSnapshot,
    summary: &TechnicalSummary,
    direction: Direction,
) -> f64 {
    let sign = direction.sign();
    let alignment = match (summary.trend, direction) {
        (Trend::Range, _) => 0.5,
        (Trend::Up, Direction::Long) | (Trend::Down, Direction::Short) => 1.0,
        _ => 0.0,
    };
    let imbalance = (1.0 + sign * snapshot.depth.imbalance()) / 2.0;
    let funding = 1.0 - (sign * snapshot.funding_rate / FUNDING_SATURATION).clamp(0.0, 1.0);

    finite_or_zero(
        TREND_WEIGHT * alignment + IMBALANCE_WEIGHT * imbalance + FUNDING_WEIGHT * funding,
    )
}

/// Direction-free market condition used by the abnormal-market gate
///
/// Lopsided books and extreme funding in either direction pull the score down.
pub fn neutral_condition(snapshot: &MarketSnapshot) -> f64 {
    let balance = 1.0 - snapshot.depth.imbalance().abs();
    let funding = 1.0 - (snapshot.funding_rate.abs() / FUNDING_SATURATION).clamp(0.0, 1.0);

    finite_or_zero(TREND_WEIGHT * 0.5 + IMBALANCE_WEIGHT * balance + FUNDING_WEIGHT * funding)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub struct RiskFilter {
    config: RiskConfig,
}

impl RiskFilter {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn assess(
        &self,
        candidate: &CandidateOpportunity,
        context: &RiskContext,
    ) -> Result<RiskAssessment> {
        let symbol = candidate.symbol.as_str();
        let net = ensure_finite(symbol, "net_risk_reward", candidate.net_risk_reward)?;
        let volatility_pct = ensure_finite(symbol, "volatility_pct", context.volatility_pct)?;
        let liquidity_usd = ensure_finite(symbol, "liquidity_usd", context.liquidity_usd)?;
        let market_condition =
            ensure_finite(symbol, "market_condition", context.market_condition)?;

        let cfg = &self.config;
        let factors = RiskFactors {
            risk_reward: unit(net / (2.0 * cfg.min_risk_reward)),
            volatility: unit(1.0 - volatility_pct / cfg.max_volatility_pct),
            liquidity: if cfg.min_liquidity_usd > 0.0 {
                unit(liquidity_usd / (2.0 * cfg.min_liquidity_usd))
            } else {
                1.0
            },
            market_condition: unit(market_condition),
        };

        let score = (RISK_REWARD_WEIGHT * factors.risk_reward).min(RISK_REWARD_WEIGHT)
            + (VOLATILITY_WEIGHT * factors.volatility).min(VOLATILITY_WEIGHT)
            + (LIQUIDITY_WEIGHT * factors.liquidity).min(LIQUIDITY_WEIGHT)
            + (MARKET_CONDITION_WEIGHT * factors.market_condition).min(MARKET_CONDITION_WEIGHT);

        let checks = RiskChecks {
            risk_reward_ok: net >= cfg.min_risk_reward,
            volatility_ok: volatility_pct <= cfg.max_volatility_pct,
            liquidity_ok: liquidity_usd >= cfg.min_liquidity_usd,
            market_condition_ok: market_condition >= cfg.min_market_condition,
        };
        let accepted = checks.all_passed();

        if !accepted {
            debug!(
                symbol,
                strategy = %candidate.strategy,
                score,
                failed = ?checks.failures(),
                "Candidate rejected by risk filter"
            );
        }

        Ok(RiskAssessment {
            opportunity_id: candidate.id,
            score,
            factors,
            checks,
            accepted,
            volatility_pct,
            liquidity_usd,
            market_condition,
            assessed_at: Utc::now(),
        })
    }

    /// Extreme volatility or a hostile market for either side
    pub fn detect_abnormal_market(&self, volatility_pct: f64, market_condition: f64) -> bool {
        !volatility_pct.is_finite()
            || !market_condition.is_finite()
            || volatility_pct > ABNORMAL_VOLATILITY_MULTIPLE * self.config.max_volatility_pct
            || market_condition < ABNORMAL_MARKET_CONDITION
    }

    pub fn is_abnormal(&self, snapshot: &MarketSnapshot, summary: &TechnicalSummary) -> bool {
        self.detect_abnormal_market(summary.volatility_pct(), neutral_condition(snapshot))
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use types::{
        ConfidenceTier, DataProvenance, Decimal, DepthLevel, EntryKind, OpportunityParams,
        OrderBookDepth, StrategyTag,
    };

    fn candidate(entry: f64, stop: f64, tp1: f64) -> CandidateOpportunity {
        CandidateOpportunity::new(OpportunityParams {
            symbol: "BTCUSDT".to_string(),
            strategy: StrategyTag::Breakout,
            direction: Direction::Long,
            entry_kind: EntryKind::Market,
            entry,
            stop_loss: stop,
            take_profit_1: tp1,
            take_profit_2: tp1 + 1.0,
            transaction_cost: 0.0,
            confidence: ConfidenceTier::High,
            trigger: "test".to_string(),
            reference_price: entry,
            atr: 1.0,
        })
        .unwrap()
    }

    fn healthy() -> RiskContext {
        RiskContext {
            volatility_pct: 1.0,
            liquidity_usd: 5_000_000.0,
            market_condition: 0.8,
        }
    }

    fn snapshot(bid_qty: Decimal, ask_qty: Decimal, funding: f64) -> MarketSnapshot {
        let now = Utc::now();
        MarketSnapshot {
            symbol: "BTCUSDT".to_string(),
            captured_at: now,
            last_price: dec!(100),
            volume_24h: dec!(1000),
            quote_volume_24h: dec!(2000000),
            candles: Vec::new(),
            depth: OrderBookDepth {
                bids: vec![DepthLevel {
                    price: dec!(100),
                    quantity: bid_qty,
                }],
                asks: vec![DepthLevel {
                    price: dec!(100),
                    quantity: ask_qty,
                }],
                captured_at: now,
            },
            funding_rate: funding,
            open_interest: dec!(0),
            provenance: DataProvenance::Live,
        }
    }

    fn summary(trend: Trend, atr_pct: f64) -> TechnicalSummary {
        TechnicalSummary {
            price: 100.0,
            atr: atr_pct * 100.0,
            atr_pct,
            ema_fast: 101.0,
            ema_slow: 100.0,
            trend,
            volume_zscore: 0.0,
            range_position: 0.5,
            latest_return: 0.0,
            candle_count: 60,
        }
    }

    #[test]
    fn test_accepts_when_all_checks_pass() {
        let filter = RiskFilter::new(RiskConfig::default());
        let assessment = filter.assess(&candidate(100.0, 98.0, 106.0), &healthy()).unwrap();

        assert!(assessment.accepted);
        // rr 3/3 capped, vol 1 - 1/5, liq capped, mc 0.8
        let expected = 40.0 + 25.0 * 0.8 + 20.0 + 15.0 * 0.8;
        assert!((assessment.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_high_score_does_not_override_failed_check() {
        let filter = RiskFilter::new(RiskConfig::default());
        let context = RiskContext {
            volatility_pct: 0.1,
            liquidity_usd: 900_000.0,
            market_condition: 1.0,
        };

        let assessment = filter.assess(&candidate(100.0, 98.0, 110.0), &context).unwrap();
        // 40 + 24.5 + 9 + 15
        assert!((assessment.score - 88.5).abs() < 1e-9);
        assert!(!assessment.accepted);
        assert!(!assessment.checks.liquidity_ok);
        assert_eq!(assessment.checks.failures(), vec!["liquidity"]);
    }

    #[test]
    fn test_threshold_boundaries() {
        let filter = RiskFilter::new(RiskConfig::default());

        // net exactly 1.5, volatility exactly 5 %, condition exactly 0.5
        let context = RiskContext {
            volatility_pct: 5.0,
            liquidity_usd: 1_000_000.0,
            market_condition: 0.5,
        };
        let assessment = filter.assess(&candidate(100.0, 98.0, 103.0), &context).unwrap();
        assert!(assessment.accepted);

        let low = filter.assess(&candidate(100.0, 98.0, 102.9), &context).unwrap();
        assert!(!low.checks.risk_reward_ok);
        assert!(!low.accepted);
    }

    #[test]
    fn test_non_finite_context_is_error() {
        let filter = RiskFilter::new(RiskConfig::default());
        let context = RiskContext {
            volatility_pct: f64::NAN,
            ..healthy()
        };
        assert!(filter.assess(&candidate(100.0, 98.0, 106.0), &context).is_err());
    }

    #[test]
    fn test_directional_condition() {
        // bid-heavy book, no funding
        let market = snapshot(dec!(3), dec!(1), 0.0);
        let up = summary(Trend::Up, 0.01);

        let long = directional_condition(&market, &up, Direction::Long);
        // 0.5 + 0.3 * 0.75 + 0.2
        assert!((long - 0.925).abs() < 1e-9);

        let short = directional_condition(&market, &up, Direction::Short);
        // 0 + 0.3 * 0.25 + 0.2
        assert!((short - 0.275).abs() < 1e-9);

        let context = RiskContext::from_market(&market, &up, Direction::Long);
        assert_eq!(context.liquidity_usd, 2_000_000.0);
        assert!((context.volatility_pct - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_abnormal_market_detection() {
        let filter = RiskFilter::new(RiskConfig::default());

        assert!(filter.detect_abnormal_market(10.5, 0.8));
        assert!(filter.detect_abnormal_market(1.0, 0.29));
        assert!(!filter.detect_abnormal_market(10.0, 0.3));

        let calm = snapshot(dec!(1), dec!(1), 0.0001);
        assert!(!filter.is_abnormal(&calm, &summary(Trend::Up, 0.01)));

        // one-sided book with extreme funding
        let hostile = snapshot(dec!(1), dec!(0), 0.001);
        assert!(filter.is_abnormal(&hostile, &summary(Trend::Up, 0.01)));

        assert!(filter.is_abnormal(&calm, &summary(Trend::Up, 0.11)));
    }
}
