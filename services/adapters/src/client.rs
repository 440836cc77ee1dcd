//! Exchange REST client
//!
//! [`ExchangeClient`] is the upstream seam: the fetcher only talks to this trait.
//! [`BinanceFuturesClient`] implements it against the Binance USD-M futures REST API.

use crate::error::{AdapterError, Result};
use crate::rate_limit::{parse_retry_after, RequestOutcome, RequestSpacer, RequestTracker};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use config::ExchangeConfig;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use types::{Candle, DepthLevel, OrderBookDepth};
use url::Url;

/// Error bodies kept on [`AdapterError::Status`], in characters
const MAX_ERROR_BODY: usize = 256;

/// 24h rolling ticker
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub last_price: Decimal,
    /// Base-asset volume
    pub volume: Decimal,
    /// Quote-asset volume
    pub quote_volume: Decimal,
}

/// Market data operations the pipeline needs from an exchange
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Most recent closed and open candles, oldest first
    async fn recent_candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>>;

    async fn order_book_depth(&self, symbol: &str, limit: u32) -> Result<OrderBookDepth>;

    async fn ticker(&self, symbol: &str) -> Result<Ticker>;

    /// Last settled funding rate, as a fraction
    async fn funding_rate(&self, symbol: &str) -> Result<f64>;

    /// Open interest in contracts
    async fn open_interest(&self, symbol: &str) -> Result<Decimal>;

    async fn ping(&self) -> Result<()>;
}

/// Binance USD-M futures REST client
///
/// Every request waits on the shared [`RequestSpacer`]. A 429/418 response is retried
/// exactly once after the provider's `Retry-After`.
pub struct BinanceFuturesClient {
    http: Client,
    base_url: Url,
    spacer: RequestSpacer,
    tracker: Arc<RequestTracker>,
    timeout: Duration,
    default_retry_after: Duration,
    max_retry_after: Duration,
}

impl BinanceFuturesClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AdapterError::Http {
                endpoint: "client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            spacer: RequestSpacer::new(config.min_request_spacing()),
            tracker: Arc::new(RequestTracker::new()),
            timeout: config.request_timeout(),
            default_retry_after: config.default_retry_after(),
            max_retry_after: config.max_retry_after(),
        })
    }

    /// Share an existing spacer, e.g. across several clients in one process
    pub fn with_spacer(mut self, spacer: RequestSpacer) -> Self {
        self.spacer = spacer;
        self
    }

    pub fn tracker(&self) -> Arc<RequestTracker> {
        Arc::clone(&self.tracker)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        match self.send_once(endpoint, &url).await {
            Err(AdapterError::RateLimited { retry_after, .. }) => {
                warn!(endpoint, ?retry_after, "Rate limited by exchange, retrying once");
                tokio::time::sleep(retry_after).await;
                self.send_once(endpoint, &url).await
            }
            other => other,
        }
    }

    async fn send_once<T: DeserializeOwned>(&self, endpoint: &'static str, url: &Url) -> Result<T> {
        self.spacer.wait().await;
        debug!(endpoint, %url, "GET");

        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                self.tracker.record(endpoint, RequestOutcome::Failure);
                return Err(AdapterError::from_reqwest(endpoint, e, self.timeout));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            self.tracker.record(endpoint, RequestOutcome::RateLimited);
            let header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok());
            return Err(AdapterError::RateLimited {
                endpoint,
                retry_after: parse_retry_after(header, self.default_retry_after, self.max_retry_after),
            });
        }

        if !status.is_success() {
            self.tracker.record(endpoint, RequestOutcome::Failure);
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(AdapterError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<T>().await {
            Ok(parsed) => {
                self.tracker.record(endpoint, RequestOutcome::Success);
                Ok(parsed)
            }
            Err(e) => {
                self.tracker.record(endpoint, RequestOutcome::Failure);
                Err(AdapterError::Decode {
                    endpoint,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerResponse {
    last_price: String,
    volume: String,
    quote_volume: String,
}

#[derive(Deserialize)]
struct DepthResponse {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
    /// Transaction time, milliseconds
    #[serde(rename = "T")]
    transaction_time: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndexResponse {
    last_funding_rate: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestResponse {
    open_interest: String,
}

fn parse_decimal(endpoint: &'static str, field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| AdapterError::Decode {
        endpoint,
        reason: format!("{field} {raw:?}: {e}"),
    })
}

fn ms_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Kline rows are `[openTime, open, high, low, close, volume, closeTime, ...]`
fn parse_kline(row: &Value) -> Option<Candle> {
    let arr = row.as_array()?;
    if arr.len() < 6 {
        return None;
    }
    let field = |i: usize| -> Option<Decimal> { Decimal::from_str(arr[i].as_str()?).ok() };

    Some(Candle {
        open_time: ms_to_utc(arr[0].as_i64()?)?,
        open: field(1)?,
        high: field(2)?,
        low: field(3)?,
        close: field(4)?,
        volume: field(5)?,
    })
}

fn parse_levels(endpoint: &'static str, rows: &[[String; 2]]) -> Result<Vec<DepthLevel>> {
    rows.iter()
        .map(|[price, quantity]| {
            Ok(DepthLevel {
                price: parse_decimal(endpoint, "price", price)?,
                quantity: parse_decimal(endpoint, "quantity", quantity)?,
            })
        })
        .collect()
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn recent_candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
        let rows: Vec<Value> = self
            .get_json(
                "klines",
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let total = rows.len();
        let candles: Vec<Candle> = rows.iter().filter_map(parse_kline).collect();
        if candles.len() < total {
            warn!(symbol, skipped = total - candles.len(), "Skipped malformed kline rows");
        }
        Ok(candles)
    }

    async fn order_book_depth(&self, symbol: &str, limit: u32) -> Result<OrderBookDepth> {
        let raw: DepthResponse = self
            .get_json(
                "depth",
                "/fapi/v1/depth",
                &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        Ok(OrderBookDepth {
            bids: parse_levels("depth", &raw.bids)?,
            asks: parse_levels("depth", &raw.asks)?,
            captured_at: raw
                .transaction_time
                .and_then(ms_to_utc)
                .unwrap_or_else(Utc::now),
        })
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        let raw: TickerResponse = self
            .get_json("ticker", "/fapi/v1/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;

        Ok(Ticker {
            last_price: parse_decimal("ticker", "lastPrice", &raw.last_price)?,
            volume: parse_decimal("ticker", "volume", &raw.volume)?,
            quote_volume: parse_decimal("ticker", "quoteVolume", &raw.quote_volume)?,
        })
    }

    async fn funding_rate(&self, symbol: &str) -> Result<f64> {
        let raw: PremiumIndexResponse = self
            .get_json(
                "premium_index",
                "/fapi/v1/premiumIndex",
                &[("symbol", symbol.to_string())],
            )
            .await?;

        raw.last_funding_rate
            .parse::<f64>()
            .map_err(|e| AdapterError::Decode {
                endpoint: "premium_index",
                reason: format!("lastFundingRate {:?}: {e}", raw.last_funding_rate),
            })
    }

    async fn open_interest(&self, symbol: &str) -> Result<Decimal> {
        let raw: OpenInterestResponse = self
            .get_json(
                "open_interest",
                "/fapi/v1/openInterest",
                &[("symbol", symbol.to_string())],
            )
            .await?;

        parse_decimal("open_interest", "openInterest", &raw.open_interest)
    }

    async fn ping(&self) -> Result<()> {
        let _: Value = self.get_json("ping", "/fapi/v1/ping", &[]).await?;
        Ok(())
    }
}
