//! Service configuration defaults
//!
//! Default values used across Sentinel services for consistency. The
//! `Default` impls in [`crate::service_config`] read from here.

/// Orchestrator defaults
pub mod monitoring {
    /// Polling interval between cycles (seconds)
    pub const INTERVAL_SECS: u64 = 30;

    /// Instruments fetched concurrently per batch
    pub const BATCH_SIZE: usize = 5;

    /// Pause between fetch batches (milliseconds)
    pub const BATCH_DELAY_MS: u64 = 200;

    pub const DEFAULT_INSTRUMENTS: &[&str] = &["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT"];
}

/// Exchange adapter defaults
pub mod exchange {
    pub const BASE_URL: &str = "https://fapi.binance.com";

    /// Request timeout (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

    /// Minimum spacing between any two exchange requests, process-wide (milliseconds)
    pub const MIN_REQUEST_SPACING_MS: u64 = 100;

    /// Backoff used when a rate-limit response carries no Retry-After (milliseconds)
    pub const DEFAULT_RETRY_AFTER_MS: u64 = 1_000;

    /// Upper bound on a provider-specified backoff (milliseconds)
    pub const MAX_RETRY_AFTER_MS: u64 = 60_000;

    pub const CANDLE_INTERVAL: &str = "15m";
    pub const CANDLE_LIMIT: u32 = 100;
    pub const DEPTH_LIMIT: u32 = 20;
}

/// Signal generator defaults
pub mod signals {
    pub const MIN_CANDLES: usize = 50;
    pub const ATR_PERIOD: usize = 20;
    pub const EMA_FAST_PERIOD: usize = 20;
    pub const EMA_SLOW_PERIOD: usize = 50;
    pub const VOLUME_WINDOW: usize = 20;
    pub const VOLUME_ZSCORE_THRESHOLD: f64 = 1.5;
    pub const RANGE_WINDOW: usize = 20;
    pub const PULLBACK_LOW: f64 = 0.3;
    pub const PULLBACK_HIGH: f64 = 0.7;

    /// Minimum relative EMA spread for a trend-follow candidate
    pub const TREND_MIN_SPREAD: f64 = 0.002;

    pub const ATR_STOP_MULTIPLIER: f64 = 1.5;

    /// Stop distance floors as a fraction of price
    pub const MIN_STOP_PCT: f64 = 0.0012;
    pub const FLOOR_STOP_PCT: f64 = 0.0010;

    pub const MIN_NET_RISK_REWARD: f64 = 1.5;

    pub const MAKER_FEE: f64 = 0.0002;
    pub const TAKER_FEE: f64 = 0.0004;
    pub const SLIPPAGE: f64 = 0.0005;
}

/// Risk filter defaults
pub mod risk {
    pub const MIN_RISK_REWARD: f64 = 1.5;
    pub const MAX_VOLATILITY_PCT: f64 = 5.0;
    pub const MIN_LIQUIDITY_USD: f64 = 1_000_000.0;
    pub const MIN_MARKET_CONDITION: f64 = 0.5;
}

/// Alert classifier defaults
pub mod alerts {
    /// Distance to entry at or below which an alert is FIRED (fraction of price)
    pub const FIRED_DISTANCE: f64 = 0.005;
    pub const READY_ATR_MULTIPLE: f64 = 1.5;
    pub const WATCH_DISTANCE: f64 = 0.02;

    /// Bar length used to turn distance into an expected time-to-trigger (seconds)
    pub const BAR_INTERVAL_SECS: u64 = 900;

    /// Distances closer than this collapse when merging (fraction of price)
    pub const MERGE_DISTANCE: f64 = 0.001;
}

/// Deduplication cooler defaults
pub mod cooldown {
    pub const WINDOW_SECS: u64 = 30 * 60;
    pub const SWEEP_INTERVAL_SECS: u64 = 6 * 60 * 60;
    pub const FIRED_THRESHOLD: f64 = 2.0;
    pub const READY_THRESHOLD: f64 = 2.5;
    pub const WATCH_THRESHOLD: f64 = 3.0;
    pub const ADJUST_EVERY: u64 = 10;
    pub const ADJUST_AFTER: u64 = 50;
    pub const ADJUST_FACTOR: f64 = 1.1;
    pub const MAX_THRESHOLD: f64 = 5.0;
}

/// Snapshot store defaults
pub mod snapshots {
    pub const DIR: &str = "./data/snapshots";
    pub const MAX_COUNT: usize = 100;
    pub const MAX_AGE_SECS: u64 = 24 * 60 * 60;
}

/// Notification dispatcher defaults
pub mod notifications {
    /// Delay after each delivered message (milliseconds)
    pub const INTER_MESSAGE_DELAY_MS: u64 = 1_000;

    pub const FROM_ADDRESS: &str = "alerts@sentinel.local";
}
