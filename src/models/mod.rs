use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time market stats for one token pair. Snapshots for the same
/// address supersede earlier ones; there is no merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub price_change_24h: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub market_cap: f64,
    pub fdv: f64,
    pub chain: String,
    pub pair_address: String,
    /// Pair creation time; None when the source omits it or it fails to parse.
    pub created_at: Option<DateTime<Utc>>,
}

impl TokenSnapshot {
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.created_at
            .map(|created| (now - created).num_seconds() as f64 / 3600.0)
    }

    pub fn volume_to_mcap_ratio(&self) -> f64 {
        self.volume_24h / (self.market_cap + 1.0)
    }

    pub fn liquidity_to_mcap_ratio(&self) -> f64 {
        self.liquidity / (self.market_cap + 1.0)
    }
}
