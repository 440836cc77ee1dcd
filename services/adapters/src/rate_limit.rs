//! Rate limiting for exchange API requests

use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide minimum spacing between exchange requests
///
/// One permit per `spacing`, no burst. Clone to share; all clones draw from the same
/// limiter.
#[derive(Clone)]
pub struct RequestSpacer {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    spacing: Duration,
}

impl RequestSpacer {
    /// A zero spacing disables limiting
    pub fn new(spacing: Duration) -> Self {
        let limiter = Quota::with_period(spacing)
            .map(|quota| Arc::new(DefaultDirectRateLimiter::direct(quota.allow_burst(nonzero!(1u32)))));

        if limiter.is_none() {
            tracing::warn!("Request spacing is zero; exchange requests are not rate limited");
        }

        Self { limiter, spacing }
    }

    /// Wait until the next request is allowed
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Check if a request is allowed right now (non-blocking, consumes the permit)
    pub fn check(&self) -> bool {
        self.limiter
            .as_ref()
            .map(|limiter| limiter.check().is_ok())
            .unwrap_or(true)
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

/// Parse a `Retry-After` header value in seconds
///
/// Missing or unparseable values fall back to `default`; the result never exceeds `cap`.
pub fn parse_retry_after(header: Option<&str>, default: Duration, cap: Duration) -> Duration {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
        .min(cap)
}

/// Per-endpoint request outcome tracker for health reporting
#[derive(Default)]
pub struct RequestTracker {
    requests: DashMap<&'static str, RequestStats>,
}

impl RequestTracker {
    /// Create a new tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, endpoint: &'static str, outcome: RequestOutcome) {
        let now = Instant::now();
        let mut stats = self.requests.entry(endpoint).or_insert_with(|| RequestStats {
            total: 0,
            successful: 0,
            failed: 0,
            rate_limited: 0,
            last_request: now,
        });
        stats.total += 1;
        match outcome {
            RequestOutcome::Success => stats.successful += 1,
            RequestOutcome::Failure => stats.failed += 1,
            RequestOutcome::RateLimited => stats.rate_limited += 1,
        }
        stats.last_request = now;
    }

    /// Get statistics for all endpoints
    pub fn get_stats(&self) -> HashMap<&'static str, RequestStats> {
        self.requests
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Totals across all endpoints
    pub fn totals(&self) -> RequestTotals {
        self.requests.iter().fold(RequestTotals::default(), |mut acc, entry| {
            acc.total += entry.total;
            acc.successful += entry.successful;
            acc.failed += entry.failed;
            acc.rate_limited += entry.rate_limited;
            acc
        })
    }

    /// Reset statistics
    pub fn reset(&self) {
        self.requests.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    Failure,
    RateLimited,
}

/// Request statistics for monitoring
#[derive(Debug, Clone)]
pub struct RequestStats {
    /// Total requests attempted
    pub total: u64,
    /// Successful requests
    pub successful: u64,
    /// Failed requests, excluding rate limits
    pub failed: u64,
    /// Rate-limited requests
    pub rate_limited: u64,
    /// Time of last request
    pub last_request: Instant,
}

impl RequestStats {
    /// Calculate success rate
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }

    /// Check if we're being rate limited heavily
    pub fn is_heavily_limited(&self) -> bool {
        self.rate_limited > self.successful
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestTotals {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub rate_limited: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_after_parsing() {
        let default = Duration::from_secs(1);
        let cap = Duration::from_secs(60);

        assert_eq!(parse_retry_after(Some("5"), default, cap), Duration::from_secs(5));
        assert_eq!(parse_retry_after(None, default, cap), default);
        assert_eq!(parse_retry_after(Some("soon"), default, cap), default);
        assert_eq!(parse_retry_after(Some("3600"), default, cap), cap);
    }

    #[test]
    fn test_spacer_blocks_second_immediate_request() {
        let spacer = RequestSpacer::new(Duration::from_secs(60));
        assert!(spacer.check());
        assert!(!spacer.check());

        let unlimited = RequestSpacer::new(Duration::ZERO);
        assert!(unlimited.check());
        assert!(unlimited.check());
    }

    #[tokio::test]
    async fn test_spacer_enforces_minimum_gap() {
        let spacer = RequestSpacer::new(Duration::from_millis(50));
        let start = Instant::now();
        spacer.wait().await;
        spacer.wait().await;
        spacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_tracker_counts_outcomes() {
        let tracker = RequestTracker::new();
        tracker.record("ticker", RequestOutcome::Success);
        tracker.record("ticker", RequestOutcome::RateLimited);
        tracker.record("ticker", RequestOutcome::RateLimited);
        tracker.record("depth", RequestOutcome::Failure);

        let stats = tracker.get_stats();
        let ticker = &stats["ticker"];
        assert_eq!(ticker.total, 3);
        assert!(ticker.is_heavily_limited());
        assert!((ticker.success_rate() - 1.0 / 3.0).abs() < 1e-9);

        let totals = tracker.totals();
        assert_eq!(totals.total, 4);
        assert_eq!(totals.failed, 1);

        tracker.reset();
        assert_eq!(tracker.totals(), RequestTotals::default());
    }
}
