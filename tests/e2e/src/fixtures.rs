//! Market data fixtures

use chrono::{Duration, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use types::{Candle, DataProvenance, MarketSnapshot, OrderBookDepth};

fn dec(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or_default().round_dp(8)
}

/// Builds 15m candle series with a fixed ±wick around each close
pub struct SnapshotBuilder {
    symbol: String,
    closes: Vec<f64>,
    volumes: Vec<f64>,
    wick: f64,
    quote_volume: f64,
}

impl SnapshotBuilder {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            closes: Vec::new(),
            volumes: Vec::new(),
            wick: 0.5,
            quote_volume: 100_000_000.0,
        }
    }

    pub fn closes(mut self, closes: Vec<f64>) -> Self {
        self.closes = closes;
        self
    }

    pub fn volumes(mut self, volumes: Vec<f64>) -> Self {
        self.volumes = volumes;
        self
    }

    pub fn build(self) -> MarketSnapshot {
        let now = Utc::now();
        let n = self.closes.len();
        let candles = self
            .closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: now - Duration::minutes(15 * (n - i) as i64),
                open: dec(close),
                high: dec(close + self.wick),
                low: dec(close - self.wick),
                close: dec(close),
                volume: dec(self.volumes.get(i).copied().unwrap_or(50.0)),
            })
            .collect();

        MarketSnapshot {
            symbol: self.symbol,
            captured_at: now,
            last_price: dec(self.closes.last().copied().unwrap_or(0.0)),
            volume_24h: dec(1_000_000.0),
            quote_volume_24h: dec(self.quote_volume),
            candles,
            depth: OrderBookDepth::empty(now),
            funding_rate: 0.0,
            open_interest: dec(0.0),
            provenance: DataProvenance::Live,
        }
    }
}

/// Steady climb of 0.5 per bar with flat volume; yields one trend-follow LONG
pub fn uptrend_snapshot(symbol: &str, candles: usize) -> MarketSnapshot {
    SnapshotBuilder::new(symbol)
        .closes((0..candles).map(|i| 100.0 + 0.5 * i as f64).collect())
        .build()
}

/// 60-bar uptrend whose last bar closes higher on a volume spike
pub fn breakout_snapshot(symbol: &str) -> MarketSnapshot {
    let closes = (0..60).map(|i| 100.0 + 0.3 * i as f64).collect();
    let mut volumes: Vec<f64> = (0..59)
        .map(|i| if i % 2 == 0 { 100.0 } else { 110.0 })
        .collect();
    volumes.push(1_000.0);

    SnapshotBuilder::new(symbol)
        .closes(closes)
        .volumes(volumes)
        .build()
}

/// Too little history for any indicator window
pub fn short_history_snapshot(symbol: &str) -> MarketSnapshot {
    uptrend_snapshot(symbol, 40)
}
