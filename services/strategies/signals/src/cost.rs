//! Transaction cost model applied to net risk/reward

use config::CostConfig;
use types::EntryKind;

/// Round-trip cost estimate as a fraction of entry price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub maker_fee: f64,
    pub taker_fee: f64,
    pub slippage: f64,
}

impl CostModel {
    /// Market entry pays taker on both legs plus full slippage; a resting limit entry
    /// pays maker in, taker out and half the slippage.
    pub fn round_trip(&self, entry_kind: EntryKind) -> f64 {
        match entry_kind {
            EntryKind::Market => 2.0 * self.taker_fee + self.slippage,
            EntryKind::Limit => self.maker_fee + self.taker_fee + self.slippage / 2.0,
        }
    }
}

impl From<&CostConfig> for CostModel {
    fn from(config: &CostConfig) -> Self {
        Self {
            maker_fee: config.maker_fee,
            taker_fee: config.taker_fee,
            slippage: config.slippage,
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::from(&CostConfig::default())
    }
}
