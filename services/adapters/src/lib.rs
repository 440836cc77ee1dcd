//! # Sentinel Market Adapter - Exchange Data Collection
//!
//! ## Purpose
//!
//! Collects everything the alerting pipeline needs to know about one instrument in one
//! cycle and hands it over as a single [`types::MarketSnapshot`]. Remote failures are
//! absorbed here: a missing order book or funding rate degrades that field instead of
//! failing the instrument.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Binance USD-M futures REST (`/fapi/v1/*`) via [`ExchangeClient`]
//! - **Output Destinations**: The cycle orchestrator, through [`MarketDataSource`]
//! - **Rate Limiting**: Process-wide [`RequestSpacer`] plus single retry on 429/418
//! - **Monitoring**: [`RequestTracker`] per-endpoint success/failure/rate-limit counters
//!
//! ## Architecture Role
//!
//! ```text
//! Exchange REST ──→ BinanceFuturesClient ──→ MarketDataFetcher ──→ MarketSnapshot
//!                        │ (spacer, retry)         │
//!                        ↓                         ↓ price check failed
//!                  RequestTracker            synthetic_snapshot (tagged Synthetic)
//! ```
//!
//! Adapters are stateless transformers: no analysis or alerting decisions live here.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod mock;
pub mod rate_limit;

pub use client::{BinanceFuturesClient, ExchangeClient, Ticker};
pub use error::{AdapterError, Result};
pub use fetcher::{FetcherConfig, MarketDataFetcher, MarketDataSource};
pub use mock::synthetic_snapshot;
pub use rate_limit::{
    parse_retry_after, RequestOutcome, RequestSpacer, RequestStats, RequestTotals, RequestTracker,
};
