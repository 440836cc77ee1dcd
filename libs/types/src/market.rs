//! Market data captured from the exchange for one instrument in one cycle

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
}

impl Candle {
    pub fn high_f64(&self) -> f64 {
        self.high.to_f64().unwrap_or(0.0)
    }

    pub fn low_f64(&self) -> f64 {
        self.low.to_f64().unwrap_or(0.0)
    }

    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(0.0)
    }

    pub fn volume_f64(&self) -> f64 {
        self.volume.to_f64().unwrap_or(0.0)
    }
}

/// One price level of the order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
}

impl DepthLevel {
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Order book depth sample; both sides share one capture timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookDepth {
    /// Sorted by price descending
    pub bids: Vec<DepthLevel>,
    /// Sorted by price ascending
    pub asks: Vec<DepthLevel>,
    pub captured_at: DateTime<Utc>,
}

impl OrderBookDepth {
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            bids: Vec::new(),
            asks: Vec::new(),
            captured_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn bid_notional(&self) -> f64 {
        self.bids
            .iter()
            .map(DepthLevel::notional)
            .sum::<Decimal>()
            .to_f64()
            .unwrap_or(0.0)
    }

    pub fn ask_notional(&self) -> f64 {
        self.asks
            .iter()
            .map(DepthLevel::notional)
            .sum::<Decimal>()
            .to_f64()
            .unwrap_or(0.0)
    }

    /// Bid/ask notional imbalance in [-1, 1]; positive means bid-heavy, 0 when empty
    pub fn imbalance(&self) -> f64 {
        let bids = self.bid_notional();
        let asks = self.ask_notional();
        let total = bids + asks;
        if total <= 0.0 {
            0.0
        } else {
            (bids - asks) / total
        }
    }
}

/// Where a snapshot's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataProvenance {
    /// Fetched from the exchange
    Live,
    /// Fabricated after the exchange was unreachable; never alerted on
    Synthetic,
}

/// Everything the pipeline knows about one instrument in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub captured_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    /// Trailing 24h volume in base units
    #[serde(with = "rust_decimal::serde::str")]
    pub volume_24h: Decimal,
    /// Trailing 24h volume in quote units
    #[serde(with = "rust_decimal::serde::str")]
    pub quote_volume_24h: Decimal,
    /// Oldest to newest
    pub candles: Vec<Candle>,
    pub depth: OrderBookDepth,
    pub funding_rate: f64,
    #[serde(with = "rust_decimal::serde::str")]
    pub open_interest: Decimal,
    pub provenance: DataProvenance,
}

impl MarketSnapshot {
    pub fn is_synthetic(&self) -> bool {
        self.provenance == DataProvenance::Synthetic
    }

    pub fn price_f64(&self) -> f64 {
        self.last_price.to_f64().unwrap_or(0.0)
    }

    /// Notional 24h liquidity in quote currency
    ///
    /// Uses the exchange's quote volume when reported, otherwise base volume × last price.
    pub fn liquidity_usd(&self) -> f64 {
        let quote = self.quote_volume_24h.to_f64().unwrap_or(0.0);
        if quote > 0.0 {
            quote
        } else {
            (self.volume_24h * self.last_price).to_f64().unwrap_or(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, quantity: Decimal) -> DepthLevel {
        DepthLevel { price, quantity }
    }

    #[test]
    fn test_depth_imbalance() {
        let depth = OrderBookDepth {
            bids: vec![level(dec!(100), dec!(3))],
            asks: vec![level(dec!(101), dec!(1))],
            captured_at: Utc::now(),
        };
        let imbalance = depth.imbalance();
        assert!(imbalance > 0.49 && imbalance < 0.5);

        assert_eq!(OrderBookDepth::empty(Utc::now()).imbalance(), 0.0);
    }

    #[test]
    fn test_candle_prices_persist_as_exact_strings() {
        let candle = Candle {
            open_time: Utc::now(),
            open: dec!(65000.10),
            high: dec!(65010.25),
            low: dec!(64990.00),
            close: dec!(65005.5),
            volume: dec!(12.345),
        };

        let json = serde_json::to_value(&candle).unwrap();
        assert_eq!(json["open"], "65000.10");
        assert_eq!(json["volume"], "12.345");

        let back: Candle = serde_json::from_value(json).unwrap();
        assert_eq!(back, candle);
    }

    #[test]
    fn test_liquidity_falls_back_to_base_volume() {
        let snapshot = MarketSnapshot {
            symbol: "BTCUSDT".to_string(),
            captured_at: Utc::now(),
            last_price: dec!(50000),
            volume_24h: dec!(100),
            quote_volume_24h: dec!(0),
            candles: Vec::new(),
            depth: OrderBookDepth::empty(Utc::now()),
            funding_rate: 0.0,
            open_interest: dec!(0),
            provenance: DataProvenance::Live,
        };
        assert_eq!(snapshot.liquidity_usd(), 5_000_000.0);
        assert!(!snapshot.is_synthetic());
    }
}
