//! Persisted snapshot records

use crate::analysis::TechnicalSummary;
use crate::market::MarketSnapshot;
use crate::opportunity::CandidateOpportunity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of the market context behind one alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub symbol: String,
    pub market: MarketSnapshot,
    pub analysis: TechnicalSummary,
    /// In practice exactly one
    pub opportunities: Vec<CandidateOpportunity>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub count: usize,
    pub total_bytes: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}
