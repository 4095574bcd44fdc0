use crate::agent::{DecisionAction, TradingAgent, TradingDecision};
use crate::analysis::ProfileMatch;
use crate::api::MarketDataProvider;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::notify::{Notification, NotificationKind, Notifier, Priority};
use crate::persistence::save_snapshot;
use crate::tracker::PriceTracker;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Buy decisions executed per scan cycle, best-confidence first.
const MAX_BUYS_PER_SCAN: usize = 3;
/// Watchlist entries re-analyzed per deep-analysis cycle.
const WATCHLIST_REVIEW_LIMIT: usize = 5;

/// The cooperative loop set: market scan, position check, deep watchlist
/// analysis and status reporting, all sharing one agent. Each iteration is
/// error-isolated; a bad cycle logs and the loop sleeps until its next
/// interval. Shutdown flips a watch flag observed at every wake-up, and all
/// portfolio mutations go through the agent's lock, so stopping mid-cycle
/// never leaves the portfolio half-updated.
pub struct AgentRuntime<M: MarketDataProvider + 'static> {
    agent: Arc<TradingAgent<M>>,
    provider: Arc<M>,
    config: Arc<AgentConfig>,
    tracker: Arc<RwLock<PriceTracker>>,
    notifier: Arc<Notifier>,
    shutdown: watch::Receiver<bool>,
}

fn make_ticker(secs: u64) -> Interval {
    let mut ticker = interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl<M: MarketDataProvider + 'static> AgentRuntime<M> {
    pub fn new(
        agent: Arc<TradingAgent<M>>,
        provider: Arc<M>,
        config: Arc<AgentConfig>,
        notifier: Arc<Notifier>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            agent,
            provider,
            config,
            tracker: Arc::new(RwLock::new(PriceTracker::new())),
            notifier,
            shutdown,
        }
    }

    /// Run all loops until shutdown is signalled.
    pub async fn run(self: Arc<Self>) {
        let tasks = vec![
            tokio::spawn({
                let runtime = Arc::clone(&self);
                async move { runtime.market_scan_loop().await }
            }),
            tokio::spawn({
                let runtime = Arc::clone(&self);
                async move { runtime.position_check_loop().await }
            }),
            tokio::spawn({
                let runtime = Arc::clone(&self);
                async move { runtime.deep_analysis_loop().await }
            }),
            tokio::spawn({
                let runtime = Arc::clone(&self);
                async move { runtime.status_report_loop().await }
            }),
        ];

        for task in tasks {
            if let Err(e) = task.await {
                error!("Loop task panicked: {}", e);
            }
        }
        info!("All trading loops stopped");
    }

    /// True when the loop should exit instead of running another iteration.
    async fn wait_for_tick(&self, ticker: &mut Interval, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = ticker.tick() => *shutdown.borrow(),
            changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
        }
    }

    async fn market_scan_loop(&self) {
        let mut ticker = make_ticker(self.config.intervals.market_scan_secs);
        let mut shutdown = self.shutdown.clone();
        info!(
            "Started market scan loop ({}s interval)",
            self.config.intervals.market_scan_secs
        );
        loop {
            if self.wait_for_tick(&mut ticker, &mut shutdown).await {
                break;
            }
            if let Err(e) = self.scan_once().await {
                error!("Market scan error: {}", e);
            }
        }
        info!("Stopped market scan loop");
    }

    async fn position_check_loop(&self) {
        let mut ticker = make_ticker(self.config.intervals.position_check_secs);
        let mut shutdown = self.shutdown.clone();
        info!(
            "Started position check loop ({}s interval)",
            self.config.intervals.position_check_secs
        );
        loop {
            if self.wait_for_tick(&mut ticker, &mut shutdown).await {
                break;
            }
            if let Err(e) = self.check_positions_once().await {
                error!("Position check error: {}", e);
            }
        }
        info!("Stopped position check loop");
    }

    async fn deep_analysis_loop(&self) {
        let mut ticker = make_ticker(self.config.intervals.deep_analysis_secs);
        let mut shutdown = self.shutdown.clone();
        info!(
            "Started deep analysis loop ({}s interval)",
            self.config.intervals.deep_analysis_secs
        );
        loop {
            if self.wait_for_tick(&mut ticker, &mut shutdown).await {
                break;
            }
            if let Err(e) = self.deep_analysis_once().await {
                error!("Deep analysis error: {}", e);
            }
        }
        info!("Stopped deep analysis loop");
    }

    async fn status_report_loop(&self) {
        let mut ticker = make_ticker(self.config.intervals.status_report_secs);
        let mut shutdown = self.shutdown.clone();
        info!(
            "Started status report loop ({}s interval)",
            self.config.intervals.status_report_secs
        );
        loop {
            if self.wait_for_tick(&mut ticker, &mut shutdown).await {
                break;
            }
            if let Err(e) = self.status_report_once().await {
                error!("Status report error: {}", e);
            }
        }
        info!("Stopped status report loop");
    }

    /// Scan the market, surface profile matches and execute the best buys.
    async fn scan_once(&self) -> Result<()> {
        info!("Scanning market for opportunities...");
        let scan = self.agent.scan_market().await;

        for profile_match in scan
            .dust_like
            .iter()
            .chain(scan.priceless_like.iter())
            .filter(|m| {
                m.classification.opportunity_score
                    >= self.config.notifications.min_opportunity_score
            })
        {
            self.notify_high_opportunity(profile_match).await;
        }

        let mut executed = 0;
        for decision in scan
            .decisions
            .iter()
            .filter(|d| d.action == DecisionAction::Buy)
            .take(MAX_BUYS_PER_SCAN)
        {
            if self.agent.can_open_position().await && self.execute_and_notify(decision).await {
                executed += 1;
            }
        }

        if executed > 0 {
            info!("Executed {} new trades", executed);
        } else {
            info!("No new opportunities met criteria");
        }
        Ok(())
    }

    /// Reprice open positions, record their history and execute exits.
    async fn check_positions_once(&self) -> Result<()> {
        let addresses: Vec<String> = {
            let portfolio = self.agent.portfolio();
            let positions = portfolio.read().await;
            positions.positions.keys().cloned().collect()
        };
        if addresses.is_empty() {
            return Ok(());
        }

        let mut prices = HashMap::new();
        for address in &addresses {
            let snapshot = match self.provider.get_token_pairs(address).await {
                Ok(pairs) => pairs.into_iter().next(),
                Err(e) => {
                    warn!("No data for position {}: {}", address, e);
                    continue;
                }
            };
            let snapshot = match snapshot {
                Some(snapshot) => snapshot,
                None => continue,
            };

            prices.insert(address.clone(), snapshot.price);
            {
                let mut tracker = self.tracker.write().await;
                tracker.track(&snapshot);
                tracker.record(&snapshot, Utc::now());
            }

            if let Some(decision) = self.agent.evaluate_token(&snapshot).await {
                if decision.action == DecisionAction::Sell
                    && self.execute_and_notify(&decision).await
                {
                    info!("Closed position: {}", decision.token.symbol);
                }
            }
        }

        let portfolio = self.agent.portfolio();
        portfolio.write().await.update_all_prices(&prices);
        Ok(())
    }

    /// Re-analyze watchlist tokens for ripened dip entries.
    async fn deep_analysis_once(&self) -> Result<()> {
        let watching = self.agent.watchlist_len().await;
        if watching == 0 {
            return Ok(());
        }
        info!("Deep analysis of {} watchlist tokens...", watching);

        let decisions = self.agent.review_watchlist(WATCHLIST_REVIEW_LIMIT).await;
        for decision in &decisions {
            if self.agent.can_open_position().await {
                self.execute_and_notify(decision).await;
            }
        }
        Ok(())
    }

    /// Log the status report, surface tracker alerts and persist a snapshot.
    async fn status_report_once(&self) -> Result<()> {
        self.agent.refresh_position_prices().await?;

        let report = self.agent.format_status_report().await;
        info!("\n{}", report);

        let alerts = self.tracker.read().await.alerts(Utc::now());
        for alert in alerts {
            let direction = format!("{:?}", alert.kind).to_uppercase();
            self.notifier
                .notify(&Notification::new(
                    NotificationKind::PriceAlert,
                    Priority::Medium,
                    format!(
                        "{}: {} {:+.1}%",
                        direction, alert.token.symbol, alert.change_1h
                    ),
                    format!(
                        "{} moved {:+.1}% in the last hour (price ${:.8})",
                        alert.token.symbol, alert.change_1h, alert.token.price
                    ),
                ))
                .await;
        }

        let snapshot_path = PathBuf::from(&self.config.persistence.snapshot_path);
        let portfolio = self.agent.portfolio();
        let portfolio = portfolio.read().await;
        save_snapshot(&snapshot_path, &portfolio).await?;
        Ok(())
    }

    async fn execute_and_notify(&self, decision: &TradingDecision) -> bool {
        let executed = self.agent.execute_decision(decision).await;
        if executed {
            let title = match decision.action {
                DecisionAction::Buy => format!("BUY {}", decision.token.symbol),
                DecisionAction::Sell => format!("SELL {}", decision.token.symbol),
            };
            let message = format!(
                "{} @ ${:.8}\nQuantity: {:.4}\nConfidence: {:.0}%\nReason: {}",
                decision.token.symbol,
                decision.token.price,
                decision.suggested_amount,
                decision.confidence,
                decision.reason
            );
            self.notifier
                .notify(&Notification::new(
                    NotificationKind::Trade,
                    Priority::High,
                    title,
                    message,
                ))
                .await;
        }
        executed
    }

    async fn notify_high_opportunity(&self, profile_match: &ProfileMatch) {
        let classification = &profile_match.classification;
        self.notifier
            .notify(&Notification::new(
                NotificationKind::HighOpportunity,
                Priority::High,
                format!("High opportunity: {}", profile_match.token.symbol),
                format!(
                    "Score: {:.0}/100\nRisk: {}\n24h change: {:+.1}%\nMarket cap: ${:.0}\nPrice: ${:.8}",
                    classification.opportunity_score,
                    classification.risk_level,
                    profile_match.token.price_change_24h,
                    profile_match.token.market_cap,
                    profile_match.token.price
                ),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DemoProvider;

    fn runtime_with_shutdown() -> (Arc<AgentRuntime<DemoProvider>>, watch::Sender<bool>) {
        let provider = Arc::new(DemoProvider::new());
        let mut config = AgentConfig::default();
        config.persistence.snapshot_path = std::env::temp_dir()
            .join("dex-agent-runtime-test.json")
            .to_string_lossy()
            .into_owned();
        let config = Arc::new(config);
        let agent = Arc::new(TradingAgent::new(Arc::clone(&provider), Arc::clone(&config)));
        let (tx, rx) = watch::channel(false);
        let runtime = Arc::new(AgentRuntime::new(
            agent,
            provider,
            config,
            Arc::new(Notifier::new()),
            rx,
        ));
        (runtime, tx)
    }

    #[tokio::test]
    async fn scan_iteration_completes_without_error() {
        let (runtime, _tx) = runtime_with_shutdown();
        runtime.scan_once().await.unwrap();
    }

    #[tokio::test]
    async fn position_check_handles_empty_portfolio() {
        let (runtime, _tx) = runtime_with_shutdown();
        runtime.check_positions_once().await.unwrap();
    }

    #[tokio::test]
    async fn deep_analysis_handles_empty_watchlist() {
        let (runtime, _tx) = runtime_with_shutdown();
        runtime.deep_analysis_once().await.unwrap();
    }

    #[tokio::test]
    async fn status_report_writes_a_snapshot() {
        let (runtime, _tx) = runtime_with_shutdown();
        runtime.status_report_once().await.unwrap();
        let path = PathBuf::from(&runtime.config.persistence.snapshot_path);
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn shutdown_stops_all_loops() {
        let (runtime, tx) = runtime_with_shutdown();
        let handle = tokio::spawn(Arc::clone(&runtime).run());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("loops must stop after shutdown")
            .unwrap();
    }
}
