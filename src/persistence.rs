use crate::error::Result;
use crate::portfolio::{Portfolio, PortfolioSummary, Position, Trade};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trades retained in a snapshot.
const RECENT_TRADE_LIMIT: usize = 20;

/// Full serializable portfolio state for write-out. There is no read path
/// back; a restart starts from a fresh portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub timestamp: DateTime<Utc>,
    pub summary: PortfolioSummary,
    pub positions: Vec<Position>,
    pub recent_trades: Vec<Trade>,
}

impl PortfolioSnapshot {
    pub fn capture(portfolio: &Portfolio) -> Self {
        let mut positions: Vec<Position> = portfolio.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.address.cmp(&b.address));

        let recent_trades = portfolio
            .trade_history
            .iter()
            .rev()
            .take(RECENT_TRADE_LIMIT)
            .rev()
            .cloned()
            .collect();

        Self {
            timestamp: Utc::now(),
            summary: portfolio.summary(),
            positions,
            recent_trades,
        }
    }
}

/// Write a portfolio snapshot as pretty JSON.
pub async fn save_snapshot(path: &Path, portfolio: &Portfolio) -> Result<()> {
    let snapshot = PortfolioSnapshot::capture(portfolio);
    let payload = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write(path, payload).await?;
    info!("Portfolio snapshot saved to {}", path.display());
    Ok(())
}
