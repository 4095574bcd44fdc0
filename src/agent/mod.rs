use crate::analysis::{
    EntryTiming, Momentum, MultiTimeframeAnalysis, OpportunityScorer, ProfileMatch,
    TimeframeAnalyzer,
};
use crate::api::{fetch_price_map, MarketDataProvider};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::models::TokenSnapshot;
use crate::portfolio::{Portfolio, Position, TradingStrategy};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hours a scalping position may run before the time-limit exit applies.
const SCALPING_TIME_LIMIT_HOURS: f64 = 4.0;
/// Minimum profit (percent) the trend-reversal exit protects.
const TREND_REVERSAL_MIN_PROFIT: f64 = 10.0;
/// Minimum profit (percent) worth taking on a scalping time exit.
const SCALPING_EXIT_MIN_PROFIT: f64 = 5.0;
/// Exits are emitted with this fixed confidence.
const EXIT_CONFIDENCE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Buy,
    Sell,
}

/// One actionable recommendation for one token. Ephemeral: produced per scan
/// cycle and consumed immediately by the executor, never stored.
#[derive(Debug, Clone)]
pub struct TradingDecision {
    pub action: DecisionAction,
    pub token: TokenSnapshot,
    pub reason: String,
    pub confidence: f64,
    pub suggested_amount: f64,
    pub strategy: TradingStrategy,
    pub analysis: MultiTimeframeAnalysis,
}

/// Result of one full market sweep: actionable decisions plus the
/// profile-gated candidate lists for reporting.
#[derive(Debug, Default)]
pub struct MarketScan {
    pub decisions: Vec<TradingDecision>,
    pub dust_like: Vec<ProfileMatch>,
    pub priceless_like: Vec<ProfileMatch>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct AgentState {
    pub total_trades: u32,
    pub successful_trades: u32,
    pub failed_trades: u32,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStats {
    pub total_value: f64,
    pub total_profit: f64,
    pub roi_percent: f64,
    pub total_trades: u32,
    pub successful_trades: u32,
    pub failed_trades: u32,
    pub win_rate: f64,
    pub positions_open: usize,
    pub available_capital: f64,
    pub tokens_analyzed: usize,
    pub watchlist_size: usize,
}

/// The decision engine: composes the timeframe analyzer, the opportunity
/// scorer and the shared portfolio into per-token buy/sell decisions, and
/// executes accepted decisions against the portfolio.
///
/// Decision and execution are separated in time; execution re-validates the
/// capital and position-count gates at mutation point and refuses a trade
/// whose assumptions went stale. All portfolio mutations pass through one
/// RwLock so concurrent loops never interleave mid-mutation.
pub struct TradingAgent<M: MarketDataProvider> {
    provider: Arc<M>,
    config: Arc<AgentConfig>,
    analyzer: TimeframeAnalyzer,
    scorer: OpportunityScorer,
    portfolio: Arc<RwLock<Portfolio>>,
    analyzed_tokens: RwLock<HashMap<String, MultiTimeframeAnalysis>>,
    watchlist: RwLock<Vec<String>>,
    state: RwLock<AgentState>,
}

impl<M: MarketDataProvider> TradingAgent<M> {
    pub fn new(provider: Arc<M>, config: Arc<AgentConfig>) -> Self {
        let portfolio = Portfolio::new(config.trading.starting_balance);
        Self {
            provider,
            config,
            analyzer: TimeframeAnalyzer::new(),
            scorer: OpportunityScorer::new(),
            portfolio: Arc::new(RwLock::new(portfolio)),
            analyzed_tokens: RwLock::new(HashMap::new()),
            watchlist: RwLock::new(Vec::new()),
            state: RwLock::new(AgentState::default()),
        }
    }

    pub fn portfolio(&self) -> Arc<RwLock<Portfolio>> {
        Arc::clone(&self.portfolio)
    }

    /// Capital available for new positions: total portfolio value minus the
    /// configured reserve. Note this counts value tied up in open positions;
    /// spendable cash is checked separately at execution time.
    pub async fn available_capital(&self) -> f64 {
        let portfolio = self.portfolio.read().await;
        (portfolio.total_value() - self.config.trading.reserve_capital).max(0.0)
    }

    pub async fn can_open_position(&self) -> bool {
        let open_count = self.portfolio.read().await.positions.len();
        open_count < self.config.trading.max_positions
            && self.available_capital().await > self.config.trading.min_position_value
    }

    /// Quantity to buy: 10% of available capital at confidence 50, scaling
    /// linearly to 20% at confidence 100.
    pub fn position_size(&self, available_capital: f64, price: f64, confidence: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        let confidence_factor = ((confidence - 50.0) / 50.0).clamp(0.0, 1.0);
        let fraction = 0.1 + 0.1 * confidence_factor;
        let fraction = fraction.min(self.config.trading.max_position_fraction);
        available_capital * fraction / price
    }

    pub fn select_strategy(&self, analysis: &MultiTimeframeAnalysis) -> TradingStrategy {
        if analysis.average_volatility() > 15.0 {
            return TradingStrategy::Scalping;
        }
        if analysis.overall_trend == Momentum::StrongBullish && analysis.risk_reward_ratio > 2.0 {
            return TradingStrategy::Position;
        }
        TradingStrategy::Swing
    }

    fn take_profit_target(&self, strategy: TradingStrategy) -> f64 {
        match strategy {
            TradingStrategy::Scalping => self.config.trading.take_profit.scalping,
            TradingStrategy::Swing => self.config.trading.take_profit.swing,
            TradingStrategy::Position => self.config.trading.take_profit.position,
        }
    }

    /// Evaluate one candidate token: exit rules when a position is open for
    /// it, entry rules otherwise. None means hold/skip.
    pub async fn evaluate_token(&self, token: &TokenSnapshot) -> Option<TradingDecision> {
        let has_position = self
            .portfolio
            .read()
            .await
            .positions
            .contains_key(&token.address);
        if has_position {
            return self.evaluate_existing_position(token).await;
        }
        self.evaluate_entry(token).await
    }

    async fn evaluate_entry(&self, token: &TokenSnapshot) -> Option<TradingDecision> {
        let analysis = self.analyzer.analyze(token, None, None);
        self.analyzed_tokens
            .write()
            .await
            .insert(token.address.clone(), analysis.clone());

        if analysis.confidence_level < self.config.trading.min_confidence {
            debug!(
                "{}: confidence {:.0} below minimum, skipping",
                token.symbol, analysis.confidence_level
            );
            return None;
        }
        if analysis.entry_timing == EntryTiming::Avoid {
            return None;
        }

        if analysis.overall_score >= 80.0 && analysis.entry_timing == EntryTiming::Immediate {
            let strategy = self.select_strategy(&analysis);
            let available = self.available_capital().await;
            let amount = self.position_size(available, token.price, analysis.confidence_level);
            if amount <= 0.0 {
                return None;
            }
            let reason = format!(
                "High score ({:.0}), {} trend, good entry",
                analysis.overall_score,
                analysis.overall_trend.label()
            );
            return Some(TradingDecision {
                action: DecisionAction::Buy,
                token: token.clone(),
                reason,
                confidence: analysis.confidence_level,
                suggested_amount: amount,
                strategy,
                analysis,
            });
        }

        if analysis.overall_score >= 70.0 && analysis.entry_timing == EntryTiming::WaitDip {
            let mut watchlist = self.watchlist.write().await;
            if !watchlist.contains(&token.address) {
                info!("{}: watching for a dip entry", token.symbol);
                watchlist.push(token.address.clone());
            }
        }

        None
    }

    async fn evaluate_existing_position(&self, token: &TokenSnapshot) -> Option<TradingDecision> {
        let position = {
            let mut portfolio = self.portfolio.write().await;
            let position = portfolio.positions.get_mut(&token.address)?;
            position.update_price(token.price);
            position.clone()
        };

        let analysis = self.analyzer.analyze(token, None, None);
        self.evaluate_exit(&position, token, &analysis)
    }

    /// Apply the exit rules in fixed priority order; the first match wins.
    pub fn evaluate_exit(
        &self,
        position: &Position,
        token: &TokenSnapshot,
        analysis: &MultiTimeframeAnalysis,
    ) -> Option<TradingDecision> {
        let pnl_percent = position.pnl_percent;
        let take_profit = self.take_profit_target(position.strategy);

        let reason = if pnl_percent <= -self.config.trading.stop_loss_percent {
            Some(format!("Stop loss triggered ({:.1}%)", pnl_percent))
        } else if pnl_percent >= take_profit {
            Some(format!("Take profit target reached ({:.1}%)", pnl_percent))
        } else if analysis.overall_trend.is_bearish() && pnl_percent > TREND_REVERSAL_MIN_PROFIT {
            Some(format!(
                "Trend reversal detected, securing {:.1}% profit",
                pnl_percent
            ))
        } else if position.strategy == TradingStrategy::Scalping
            && position.hours_held(Utc::now()) > SCALPING_TIME_LIMIT_HOURS
            && pnl_percent > SCALPING_EXIT_MIN_PROFIT
        {
            Some(format!(
                "Scalping time limit reached with {:.1}% profit",
                pnl_percent
            ))
        } else {
            None
        };

        reason.map(|reason| TradingDecision {
            action: DecisionAction::Sell,
            token: token.clone(),
            reason,
            confidence: EXIT_CONFIDENCE,
            suggested_amount: position.quantity,
            strategy: position.strategy,
            analysis: analysis.clone(),
        })
    }

    /// Execute a decision against the portfolio. Buys re-validate the gates
    /// and spendable cash at mutation point; a stale decision is refused,
    /// never an error. Returns whether the trade went through.
    pub async fn execute_decision(&self, decision: &TradingDecision) -> bool {
        match decision.action {
            DecisionAction::Buy => {
                if !self.can_open_position().await {
                    info!(
                        "{}: position limit or capital gate refused the buy",
                        decision.token.symbol
                    );
                    return false;
                }

                let position = Position::new(
                    decision.token.symbol.clone(),
                    decision.token.address.clone(),
                    decision.token.price,
                    decision.suggested_amount,
                    Utc::now(),
                    decision.strategy,
                );

                let mut portfolio = self.portfolio.write().await;
                let cost = position.cost_basis();
                if cost > portfolio.current_balance {
                    info!(
                        "{}: insufficient cash (${:.2} needed, ${:.2} available)",
                        decision.token.symbol, cost, portfolio.current_balance
                    );
                    return false;
                }
                if !portfolio.open(position, &decision.reason) {
                    return false;
                }
                self.state.write().await.total_trades += 1;
                true
            }
            DecisionAction::Sell => {
                let pnl = {
                    let mut portfolio = self.portfolio.write().await;
                    let pnl = match portfolio.positions.get_mut(&decision.token.address) {
                        Some(position) => {
                            position.update_price(decision.token.price);
                            position.pnl
                        }
                        None => return false,
                    };
                    if !portfolio.close(&decision.token.address, decision.token.price, &decision.reason)
                    {
                        return false;
                    }
                    pnl
                };

                let mut state = self.state.write().await;
                if pnl > 0.0 {
                    state.successful_trades += 1;
                } else {
                    state.failed_trades += 1;
                }
                state.total_profit += pnl;
                true
            }
        }
    }

    /// One full market sweep: gather candidates from every feed, match them
    /// against the reference profiles, evaluate entries, then re-check open
    /// positions. Feed failures degrade to empty lists. Decisions come back
    /// sorted by confidence descending.
    pub async fn scan_market(&self) -> MarketScan {
        let mut candidates = Vec::new();

        match self.provider.get_trending_tokens(None).await {
            Ok(tokens) => candidates.extend(tokens),
            Err(e) => warn!("Trending feed unavailable: {}", e),
        }
        match self.provider.get_new_pairs(None, 4).await {
            Ok(tokens) => candidates.extend(tokens),
            Err(e) => warn!("New-pairs feed unavailable: {}", e),
        }
        match self.provider.get_gainers_losers(None).await {
            Ok(result) => candidates.extend(result.gainers),
            Err(e) => warn!("Gainers feed unavailable: {}", e),
        }
        for query in ["DUST", "PRICELESS"] {
            match self.provider.search_pairs(query).await {
                Ok(tokens) => candidates.extend(tokens.into_iter().take(1)),
                Err(e) => warn!("Search for {} unavailable: {}", query, e),
            }
        }

        let now = Utc::now();
        let dust_like = self.scorer.find_dust_like(&candidates, now);
        let priceless_like = self.scorer.find_priceless_like(&candidates, now);
        if !dust_like.is_empty() || !priceless_like.is_empty() {
            info!(
                "Profile matches this sweep: {} DUST-like, {} PRICELESS-like",
                dust_like.len(),
                priceless_like.len()
            );
        }

        let mut decisions = Vec::new();
        for token in &candidates {
            if let Some(decision) = self.evaluate_token(token).await {
                decisions.push(decision);
            }
        }

        // Open positions not in this sweep still need their exit check.
        let held: Vec<String> = {
            let portfolio = self.portfolio.read().await;
            portfolio.positions.keys().cloned().collect()
        };
        for address in held {
            if candidates.iter().any(|t| t.address == address) {
                continue;
            }
            match self.provider.get_token_pairs(&address).await {
                Ok(pairs) => {
                    if let Some(snapshot) = pairs.first() {
                        if let Some(decision) = self.evaluate_existing_position(snapshot).await {
                            decisions.push(decision);
                        }
                    }
                }
                Err(e) => warn!("No data for held token {}: {}", address, e),
            }
        }

        decisions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        MarketScan {
            decisions,
            dust_like,
            priceless_like,
        }
    }

    /// Refresh prices for all open positions from the provider and recompute
    /// unrealized P&L. Tokens the provider has nothing for keep their last
    /// known price.
    pub async fn refresh_position_prices(&self) -> Result<()> {
        let addresses: Vec<String> = {
            let portfolio = self.portfolio.read().await;
            portfolio.positions.keys().cloned().collect()
        };
        if addresses.is_empty() {
            return Ok(());
        }

        let prices = fetch_price_map(self.provider.as_ref(), &addresses).await;
        self.portfolio.write().await.update_all_prices(&prices);
        Ok(())
    }

    /// Re-evaluate watchlist tokens for a ripened dip entry. Returns the buy
    /// decisions that are now actionable.
    pub async fn review_watchlist(&self, limit: usize) -> Vec<TradingDecision> {
        let watched: Vec<String> = {
            let watchlist = self.watchlist.read().await;
            watchlist.iter().take(limit).cloned().collect()
        };

        let mut decisions = Vec::new();
        for address in watched {
            match self.provider.get_token_pairs(&address).await {
                Ok(pairs) => {
                    if let Some(snapshot) = pairs.first() {
                        if let Some(decision) = self.evaluate_token(snapshot).await {
                            if decision.action == DecisionAction::Buy {
                                info!("{}: watchlist token ready to buy", decision.token.symbol);
                                // A ripened entry leaves the watchlist.
                                self.watchlist.write().await.retain(|a| a != &address);
                                decisions.push(decision);
                            }
                        }
                    }
                }
                Err(e) => warn!("No data for watchlist token {}: {}", address, e),
            }
        }
        decisions
    }

    pub async fn watchlist_len(&self) -> usize {
        self.watchlist.read().await.len()
    }

    pub async fn stats(&self) -> AgentStats {
        let portfolio = self.portfolio.read().await;
        let state = self.state.read().await;
        let total_value = portfolio.total_value();
        let starting = portfolio.starting_balance;
        let win_rate = if state.total_trades > 0 {
            state.successful_trades as f64 / state.total_trades as f64 * 100.0
        } else {
            0.0
        };

        AgentStats {
            total_value,
            total_profit: state.total_profit,
            roi_percent: if starting > 0.0 {
                (total_value - starting) / starting * 100.0
            } else {
                0.0
            },
            total_trades: state.total_trades,
            successful_trades: state.successful_trades,
            failed_trades: state.failed_trades,
            win_rate,
            positions_open: portfolio.positions.len(),
            available_capital: (total_value - self.config.trading.reserve_capital).max(0.0),
            tokens_analyzed: self.analyzed_tokens.read().await.len(),
            watchlist_size: self.watchlist.read().await.len(),
        }
    }

    /// Human-readable status block for the report loop; rendering beyond
    /// plain text is an external concern.
    pub async fn format_status_report(&self) -> String {
        let stats = self.stats().await;
        let mut lines = Vec::new();
        lines.push("TRADING AGENT STATUS".to_string());
        lines.push(format!(
            "Total value: ${:.2} ({:+.1}% ROI)",
            stats.total_value, stats.roi_percent
        ));
        lines.push(format!("Available capital: ${:.2}", stats.available_capital));
        lines.push(format!(
            "Open positions: {}/{}",
            stats.positions_open, self.config.trading.max_positions
        ));
        lines.push(format!(
            "Trades: {} (win rate {:.1}%)",
            stats.total_trades, stats.win_rate
        ));
        lines.push(format!("Tokens analyzed: {}", stats.tokens_analyzed));
        lines.push(format!("Watchlist: {} tokens", stats.watchlist_size));
        lines.join("\n")
    }
}
