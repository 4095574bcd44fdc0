use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Holding strategy chosen at entry; drives the position's take-profit
/// target and the scalping time-limit exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingStrategy {
    /// 1-4h holds.
    Scalping,
    /// 4-24h holds.
    Swing,
    /// 1-3d holds.
    Position,
}

impl TradingStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            TradingStrategy::Scalping => "scalping",
            TradingStrategy::Swing => "swing",
            TradingStrategy::Position => "position",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// One executed paper trade, append-only history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub symbol: String,
    pub address: String,
    pub price: f64,
    pub quantity: f64,
    pub value: f64,
    pub reason: String,
}

/// An open holding. Mutated only through `update_price`; owned exclusively
/// by the Portfolio that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub address: String,
    pub entry_price: f64,
    pub current_price: f64,
    pub quantity: f64,
    pub entry_time: DateTime<Utc>,
    pub strategy: TradingStrategy,
    pub position_value: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
}

impl Position {
    pub fn new(
        symbol: String,
        address: String,
        entry_price: f64,
        quantity: f64,
        entry_time: DateTime<Utc>,
        strategy: TradingStrategy,
    ) -> Self {
        let mut position = Self {
            symbol,
            address,
            entry_price,
            current_price: entry_price,
            quantity,
            entry_time,
            strategy,
            position_value: 0.0,
            pnl: 0.0,
            pnl_percent: 0.0,
        };
        position.update_price(entry_price);
        position
    }

    /// Reprice the position and recompute its derived fields. Pure in
    /// (price, quantity, entry_price): repeating the same price is a no-op.
    pub fn update_price(&mut self, new_price: f64) {
        self.current_price = new_price;
        self.position_value = self.quantity * self.current_price;
        let cost_basis = self.quantity * self.entry_price;
        self.pnl = self.position_value - cost_basis;
        self.pnl_percent = if cost_basis > 0.0 {
            self.pnl / cost_basis * 100.0
        } else {
            0.0
        };
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn hours_held(&self, now: DateTime<Utc>) -> f64 {
        (now - self.entry_time).num_seconds() as f64 / 3600.0
    }
}

/// Paper-trading portfolio: cash, open positions keyed by token address,
/// realized/unrealized P&L and the trade log.
///
/// Invariant maintained across every operation:
/// `current_balance + sum(position values) == starting_balance +
/// realized_pnl + unrealized_pnl` (up to float tolerance, provided callers
/// refresh prices via `update_all_prices` before reading aggregates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub starting_balance: f64,
    pub current_balance: f64,
    pub positions: HashMap<String, Position>,
    pub trade_history: Vec<Trade>,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub win_count: u32,
    pub loss_count: u32,
}

/// Serializable aggregate view for reporting and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub starting_balance: f64,
    pub current_balance: f64,
    pub total_pnl: f64,
    pub roi_percent: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub open_positions: usize,
    pub win_rate: f64,
    pub wins: u32,
    pub losses: u32,
}

impl Portfolio {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            starting_balance,
            current_balance: starting_balance,
            positions: HashMap::new(),
            trade_history: Vec::new(),
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            win_count: 0,
            loss_count: 0,
        }
    }

    /// Open a position: deduct cost from cash, log the buy, insert into the
    /// open map. Refuses (returns false) when the address already has an
    /// open position; capital sufficiency is the caller's check.
    pub fn open(&mut self, position: Position, reason: &str) -> bool {
        if self.positions.contains_key(&position.address) {
            return false;
        }

        let cost = position.cost_basis();
        self.current_balance -= cost;

        self.trade_history.push(Trade {
            timestamp: position.entry_time,
            action: TradeAction::Buy,
            symbol: position.symbol.clone(),
            address: position.address.clone(),
            price: position.entry_price,
            quantity: position.quantity,
            value: cost,
            reason: reason.to_string(),
        });

        info!(
            "BUY {} qty {:.4} @ ${:.8} (${:.2})",
            position.symbol, position.quantity, position.entry_price, cost
        );
        self.positions.insert(position.address.clone(), position);
        true
    }

    /// Close a position at `exit_price`: credit cash, realize P&L, bump the
    /// win/loss counter, log the sell, remove from the open map. Returns
    /// false when the address is not open.
    pub fn close(&mut self, address: &str, exit_price: f64, reason: &str) -> bool {
        let mut position = match self.positions.remove(address) {
            Some(position) => position,
            None => return false,
        };

        position.update_price(exit_price);

        self.current_balance += position.position_value;
        self.realized_pnl += position.pnl;
        // Closed value moved to cash; what remains open defines unrealized.
        self.unrealized_pnl = self.positions.values().map(|p| p.pnl).sum();

        if position.pnl > 0.0 {
            self.win_count += 1;
        } else {
            self.loss_count += 1;
        }

        self.trade_history.push(Trade {
            timestamp: Utc::now(),
            action: TradeAction::Sell,
            symbol: position.symbol.clone(),
            address: position.address.clone(),
            price: exit_price,
            quantity: position.quantity,
            value: position.position_value,
            reason: reason.to_string(),
        });

        info!(
            "SELL {} @ ${:.8} pnl ${:.2} ({:+.1}%): {}",
            position.symbol, exit_price, position.pnl, position.pnl_percent, reason
        );
        true
    }

    /// Reprice open positions and recompute unrealized P&L from scratch.
    /// Addresses missing from the map keep their last known price and still
    /// contribute to the total.
    pub fn update_all_prices(&mut self, price_updates: &HashMap<String, f64>) {
        self.unrealized_pnl = 0.0;
        for (address, position) in self.positions.iter_mut() {
            if let Some(&price) = price_updates.get(address) {
                position.update_price(price);
            }
            self.unrealized_pnl += position.pnl;
        }
    }

    pub fn total_value(&self) -> f64 {
        let positions_value: f64 = self.positions.values().map(|p| p.position_value).sum();
        self.current_balance + positions_value
    }

    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    pub fn roi_percent(&self) -> f64 {
        if self.starting_balance == 0.0 {
            return 0.0;
        }
        (self.total_value() - self.starting_balance) / self.starting_balance * 100.0
    }

    pub fn win_rate(&self) -> f64 {
        let total = self.win_count + self.loss_count;
        if total == 0 {
            return 0.0;
        }
        self.win_count as f64 / total as f64 * 100.0
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary {
            total_value: self.total_value(),
            starting_balance: self.starting_balance,
            current_balance: self.current_balance,
            total_pnl: self.total_pnl(),
            roi_percent: self.roi_percent(),
            realized_pnl: self.realized_pnl,
            unrealized_pnl: self.unrealized_pnl,
            open_positions: self.positions.len(),
            win_rate: self.win_rate(),
            wins: self.win_count,
            losses: self.loss_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn position(address: &str, entry: f64, quantity: f64) -> Position {
        Position::new(
            "TKN".to_string(),
            address.to_string(),
            entry,
            quantity,
            Utc::now(),
            TradingStrategy::Swing,
        )
    }

    fn assert_reconciled(portfolio: &Portfolio) {
        let lhs = portfolio.total_value();
        let rhs = portfolio.starting_balance + portfolio.realized_pnl + portfolio.unrealized_pnl;
        assert!(
            (lhs - rhs).abs() < TOLERANCE,
            "reconciliation broken: total {} vs {}",
            lhs,
            rhs
        );
    }

    #[test]
    fn open_deducts_cost_and_logs_buy() {
        let mut portfolio = Portfolio::new(1000.0);
        assert!(portfolio.open(position("0xa", 0.5, 400.0), "test entry"));

        assert!((portfolio.current_balance - 800.0).abs() < TOLERANCE);
        assert_eq!(portfolio.positions.len(), 1);
        assert_eq!(portfolio.trade_history.len(), 1);
        assert_eq!(portfolio.trade_history[0].action, TradeAction::Buy);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn duplicate_open_is_refused() {
        let mut portfolio = Portfolio::new(1000.0);
        assert!(portfolio.open(position("0xa", 0.5, 400.0), "first"));
        assert!(!portfolio.open(position("0xa", 0.6, 100.0), "second"));

        assert_eq!(portfolio.positions.len(), 1);
        assert_eq!(portfolio.trade_history.len(), 1);
        assert!((portfolio.current_balance - 800.0).abs() < TOLERANCE);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn close_removes_position_and_logs_one_sell() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.open(position("0xa", 1.0, 100.0), "entry");
        assert!(portfolio.close("0xa", 1.5, "take profit"));

        assert!(!portfolio.positions.contains_key("0xa"));
        let sells: Vec<&Trade> = portfolio
            .trade_history
            .iter()
            .filter(|t| t.action == TradeAction::Sell && t.address == "0xa")
            .collect();
        assert_eq!(sells.len(), 1);
        assert!((portfolio.realized_pnl - 50.0).abs() < TOLERANCE);
        assert!((portfolio.current_balance - 1050.0).abs() < TOLERANCE);
        assert_eq!(portfolio.win_count, 1);
        assert_eq!(portfolio.loss_count, 0);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn close_of_unknown_address_fails() {
        let mut portfolio = Portfolio::new(1000.0);
        assert!(!portfolio.close("0xmissing", 1.0, "nothing here"));
        assert!(portfolio.trade_history.is_empty());
        assert_reconciled(&portfolio);
    }

    #[test]
    fn losing_close_bumps_loss_count() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.open(position("0xa", 1.0, 100.0), "entry");
        portfolio.close("0xa", 0.8, "stop loss");

        assert_eq!(portfolio.loss_count, 1);
        assert!((portfolio.realized_pnl + 20.0).abs() < TOLERANCE);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn update_price_is_idempotent() {
        let mut p = position("0xa", 1.0, 100.0);
        p.update_price(1.2);
        let (value, pnl, pct) = (p.position_value, p.pnl, p.pnl_percent);

        p.update_price(1.2);
        assert_eq!(p.position_value, value);
        assert_eq!(p.pnl, pnl);
        assert_eq!(p.pnl_percent, pct);
        assert!((pnl - 20.0).abs() < TOLERANCE);
        assert!((pct - 20.0).abs() < TOLERANCE);
    }

    #[test]
    fn update_all_prices_recomputes_from_scratch() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.open(position("0xa", 1.0, 100.0), "entry");
        portfolio.open(position("0xb", 2.0, 50.0), "entry");

        let mut prices = HashMap::new();
        prices.insert("0xa".to_string(), 1.5);
        prices.insert("0xb".to_string(), 1.0);
        portfolio.update_all_prices(&prices);
        // +50 on 0xa, -50 on 0xb.
        assert!((portfolio.unrealized_pnl - 0.0).abs() < TOLERANCE);
        assert_reconciled(&portfolio);

        // Partial map: 0xb keeps its last price and still counts.
        let mut partial = HashMap::new();
        partial.insert("0xa".to_string(), 2.0);
        portfolio.update_all_prices(&partial);
        assert!((portfolio.unrealized_pnl - 50.0).abs() < TOLERANCE);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn reconciliation_holds_across_a_trading_sequence() {
        let mut portfolio = Portfolio::new(1000.0);

        portfolio.open(position("0xa", 0.002, 100_000.0), "entry");
        assert_reconciled(&portfolio);

        let mut prices = HashMap::new();
        prices.insert("0xa".to_string(), 0.0026);
        portfolio.update_all_prices(&prices);
        assert_reconciled(&portfolio);

        portfolio.open(position("0xb", 0.5, 500.0), "entry");
        assert_reconciled(&portfolio);

        prices.insert("0xa".to_string(), 0.0018);
        prices.insert("0xb".to_string(), 0.65);
        portfolio.update_all_prices(&prices);
        assert_reconciled(&portfolio);

        assert!(portfolio.close("0xa", 0.0018, "stop loss"));
        assert_reconciled(&portfolio);

        assert!(portfolio.close("0xb", 0.7, "take profit"));
        assert_reconciled(&portfolio);

        assert_eq!(portfolio.positions.len(), 0);
        assert_eq!(portfolio.win_count + portfolio.loss_count, 2);
        // All closed: total value is pure cash and unrealized is zero.
        assert!(portfolio.unrealized_pnl.abs() < TOLERANCE);
        assert!((portfolio.total_value() - portfolio.current_balance).abs() < TOLERANCE);
    }

    #[test]
    fn rebuy_after_close_starts_fresh() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.open(position("0xa", 1.0, 100.0), "entry");
        portfolio.close("0xa", 1.2, "take profit");

        assert!(portfolio.open(position("0xa", 1.3, 50.0), "re-entry"));
        let reopened = &portfolio.positions["0xa"];
        assert_eq!(reopened.entry_price, 1.3);
        assert_eq!(reopened.pnl, 0.0);
        assert_reconciled(&portfolio);
    }

    #[test]
    fn summary_reflects_state() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.open(position("0xa", 1.0, 100.0), "entry");
        portfolio.close("0xa", 1.5, "take profit");

        let summary = portfolio.summary();
        assert!((summary.total_value - 1050.0).abs() < TOLERANCE);
        assert!((summary.roi_percent - 5.0).abs() < TOLERANCE);
        assert_eq!(summary.wins, 1);
        assert!((summary.win_rate - 100.0).abs() < TOLERANCE);
        assert_eq!(summary.open_positions, 0);
    }
}
