//! Technical summary computed from a snapshot's candle window

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trend direction from the fast/slow EMA pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Range,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => f.write_str("UP"),
            Trend::Down => f.write_str("DOWN"),
            Trend::Range => f.write_str("RANGE"),
        }
    }
}

/// Denormalized analysis block stored alongside every persisted snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSummary {
    pub price: f64,
    /// Absolute average true range
    pub atr: f64,
    /// ATR as a fraction of price
    pub atr_pct: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub trend: Trend,
    pub volume_zscore: f64,
    /// Close position inside the trailing high/low range, in [0, 1]
    pub range_position: f64,
    /// Latest close-to-close return
    pub latest_return: f64,
    pub candle_count: usize,
}

impl TechnicalSummary {
    /// ATR expressed as a percentage of price
    pub fn volatility_pct(&self) -> f64 {
        self.atr_pct * 100.0
    }

    /// Relative EMA spread `|fast - slow| / slow`
    pub fn ema_spread(&self) -> f64 {
        if self.ema_slow == 0.0 {
            0.0
        } else {
            (self.ema_fast - self.ema_slow).abs() / self.ema_slow
        }
    }
}
