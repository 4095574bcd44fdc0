use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Agent configuration. Every field has a documented default so a missing
/// config file (or a partial one) still yields a fully specified agent.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub trading: TradingConfig,
    pub intervals: IntervalsConfig,
    pub notifications: NotificationsConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TradingConfig {
    /// Paper-trading starting balance in USD.
    pub starting_balance: f64,
    /// Portion of total portfolio value never counted as tradeable capital.
    pub reserve_capital: f64,
    /// Upper bound on a single position as a fraction of available capital.
    pub max_position_fraction: f64,
    /// Maximum concurrent open positions.
    pub max_positions: usize,
    /// Minimum analysis confidence (0-100) required to consider an entry.
    pub min_confidence: f64,
    /// Minimum available capital (USD) required to open any position.
    pub min_position_value: f64,
    /// Stop loss trigger, percent loss on a position.
    pub stop_loss_percent: f64,
    pub take_profit: TakeProfitConfig,
}

/// Take-profit targets in percent, per holding strategy.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TakeProfitConfig {
    pub scalping: f64,
    pub swing: f64,
    pub position: f64,
}

/// Polling intervals in seconds for the cooperative loops.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct IntervalsConfig {
    pub market_scan_secs: u64,
    pub position_check_secs: u64,
    pub deep_analysis_secs: u64,
    pub status_report_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    pub console: bool,
    /// Directory for file notifications; disabled when absent.
    pub file_dir: Option<String>,
    /// Webhook endpoint; disabled when absent.
    pub webhook_url: Option<String>,
    /// Minimum opportunity score for high-opportunity alerts.
    pub min_opportunity_score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where the periodic portfolio snapshot is written.
    pub snapshot_path: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            trading: TradingConfig::default(),
            intervals: IntervalsConfig::default(),
            notifications: NotificationsConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1000.0,
            reserve_capital: 500.0,
            max_position_fraction: 0.2,
            max_positions: 5,
            min_confidence: 65.0,
            min_position_value: 50.0,
            stop_loss_percent: 15.0,
            take_profit: TakeProfitConfig::default(),
        }
    }
}

impl Default for TakeProfitConfig {
    fn default() -> Self {
        Self {
            scalping: 25.0,
            swing: 50.0,
            position: 100.0,
        }
    }
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            market_scan_secs: 300,
            position_check_secs: 60,
            deep_analysis_secs: 900,
            status_report_secs: 600,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            console: true,
            file_dir: None,
            webhook_url: None,
            min_opportunity_score: 70.0,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "portfolio_state.json".to_string(),
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }
}
