//! Per-instrument market snapshot assembly

use crate::client::ExchangeClient;
use crate::error::Result;
use crate::mock::synthetic_snapshot;
use async_trait::async_trait;
use chrono::Utc;
use config::ExchangeConfig;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};
use types::{DataProvenance, MarketSnapshot, OrderBookDepth};

/// Source of market snapshots consumed by the orchestrator
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot>;

    /// Liveness check against the upstream
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub candle_interval: String,
    pub candle_limit: u32,
    pub depth_limit: u32,
    /// Serve a synthetic snapshot when the price check fails
    pub mock_fallback: bool,
}

impl FetcherConfig {
    pub fn from_exchange(config: &ExchangeConfig, mock_fallback: bool) -> Self {
        Self {
            candle_interval: config.candle_interval.clone(),
            candle_limit: config.candle_limit,
            depth_limit: config.depth_limit,
            mock_fallback,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::from_exchange(&ExchangeConfig::default(), false)
    }
}

/// Builds a [`MarketSnapshot`] for one instrument
///
/// The 24h ticker is fetched first and is the only hard requirement. Candles, depth,
/// funding and open interest are fetched concurrently and each degrades to its empty
/// default on failure.
pub struct MarketDataFetcher {
    client: Arc<dyn ExchangeClient>,
    config: FetcherConfig,
}

impl MarketDataFetcher {
    pub fn new(client: Arc<dyn ExchangeClient>, config: FetcherConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }
}

#[async_trait]
impl MarketDataSource for MarketDataFetcher {
    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot> {
        let ticker = match self.client.ticker(symbol).await {
            Ok(ticker) => ticker,
            Err(e) if self.config.mock_fallback => {
                warn!(symbol, error = %e, "Price check failed, serving synthetic snapshot");
                return Ok(synthetic_snapshot(
                    symbol,
                    self.config.candle_limit as usize,
                    Utc::now(),
                ));
            }
            Err(e) => return Err(e),
        };

        let (candles, depth, funding, open_interest) = tokio::join!(
            self.client
                .recent_candles(symbol, &self.config.candle_interval, self.config.candle_limit),
            self.client.order_book_depth(symbol, self.config.depth_limit),
            self.client.funding_rate(symbol),
            self.client.open_interest(symbol),
        );

        let now = Utc::now();
        let candles = candles.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Candles unavailable, continuing without");
            Vec::new()
        });
        let depth = depth.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Order book unavailable, continuing without");
            OrderBookDepth::empty(now)
        });
        let funding_rate = funding.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Funding rate unavailable, using 0");
            0.0
        });
        let open_interest = open_interest.unwrap_or_else(|e| {
            warn!(symbol, error = %e, "Open interest unavailable, using 0");
            Decimal::ZERO
        });

        debug!(
            symbol,
            price = %ticker.last_price,
            candles = candles.len(),
            depth_levels = depth.bids.len() + depth.asks.len(),
            "Snapshot assembled"
        );

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            captured_at: now,
            last_price: ticker.last_price,
            volume_24h: ticker.volume,
            quote_volume_24h: ticker.quote_volume,
            candles,
            depth,
            funding_rate,
            open_interest,
            provenance: DataProvenance::Live,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Ticker;
    use crate::error::AdapterError;
    use rust_decimal_macros::dec;
    use types::Candle;

    /// Client whose individual endpoints can be switched off
    #[derive(Default)]
    struct StubClient {
        ticker_down: bool,
        candles_down: bool,
        depth_down: bool,
    }

    fn unavailable(endpoint: &'static str) -> AdapterError {
        AdapterError::Status {
            endpoint,
            status: 503,
            body: String::new(),
        }
    }

    #[async_trait]
    impl ExchangeClient for StubClient {
        async fn recent_candles(&self, _: &str, _: &str, limit: u32) -> Result<Vec<Candle>> {
            if self.candles_down {
                return Err(unavailable("klines"));
            }
            Ok((0..limit)
                .map(|i| Candle {
                    open_time: Utc::now() - chrono::Duration::minutes(15 * (limit - i) as i64),
                    open: dec!(100),
                    high: dec!(101),
                    low: dec!(99),
                    close: dec!(100),
                    volume: dec!(10),
                })
                .collect())
        }

        async fn order_book_depth(&self, _: &str, _: u32) -> Result<OrderBookDepth> {
            if self.depth_down {
                return Err(unavailable("depth"));
            }
            Ok(OrderBookDepth::empty(Utc::now()))
        }

        async fn ticker(&self, _: &str) -> Result<Ticker> {
            if self.ticker_down {
                return Err(unavailable("ticker"));
            }
            Ok(Ticker {
                last_price: dec!(100),
                volume: dec!(50000),
                quote_volume: dec!(5000000),
            })
        }

        async fn funding_rate(&self, _: &str) -> Result<f64> {
            Err(unavailable("premium_index"))
        }

        async fn open_interest(&self, _: &str) -> Result<Decimal> {
            Ok(dec!(1234))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn fetcher(client: StubClient, mock_fallback: bool) -> MarketDataFetcher {
        let config = FetcherConfig {
            candle_limit: 60,
            mock_fallback,
            ..Default::default()
        };
        MarketDataFetcher::new(Arc::new(client), config)
    }

    #[tokio::test]
    async fn test_partial_failures_degrade_to_defaults() {
        let fetcher = fetcher(
            StubClient {
                depth_down: true,
                ..Default::default()
            },
            false,
        );

        let snapshot = fetcher.fetch("BTCUSDT").await.unwrap();
        assert_eq!(snapshot.candles.len(), 60);
        assert!(snapshot.depth.is_empty());
        assert_eq!(snapshot.funding_rate, 0.0);
        assert_eq!(snapshot.open_interest, dec!(1234));
        assert_eq!(snapshot.provenance, DataProvenance::Live);
    }

    #[tokio::test]
    async fn test_missing_candles_still_yield_snapshot() {
        let fetcher = fetcher(
            StubClient {
                candles_down: true,
                ..Default::default()
            },
            false,
        );

        let snapshot = fetcher.fetch("BTCUSDT").await.unwrap();
        assert!(snapshot.candles.is_empty());
        assert_eq!(snapshot.last_price, dec!(100));
    }

    #[tokio::test]
    async fn test_price_failure_uses_synthetic_when_allowed() {
        let fetcher = fetcher(
            StubClient {
                ticker_down: true,
                ..Default::default()
            },
            true,
        );

        let snapshot = fetcher.fetch("ETHUSDT").await.unwrap();
        assert!(snapshot.is_synthetic());
        assert_eq!(snapshot.candles.len(), 60);
    }

    #[tokio::test]
    async fn test_price_failure_errors_without_fallback() {
        let fetcher = fetcher(
            StubClient {
                ticker_down: true,
                ..Default::default()
            },
            false,
        );

        let err = fetcher.fetch("ETHUSDT").await.unwrap_err();
        assert_eq!(err.endpoint(), Some("ticker"));
    }
}
