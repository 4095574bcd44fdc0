use anyhow::Result;
use clap::Parser;
use log::{error, info, LevelFilter};
use std::sync::Arc;
use tokio::sync::watch;

use dex_agent::agent::TradingAgent;
use dex_agent::api::{DemoProvider, DexScreenerClient, MarketDataProvider};
use dex_agent::cli::Cli;
use dex_agent::config::AgentConfig;
use dex_agent::notify::{ConsoleChannel, FileChannel, Notifier, WebhookChannel};
use dex_agent::runtime::AgentRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    // A missing --config means defaults; a broken file is a hard error.
    let config = match &cli.config {
        Some(path) => match AgentConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration from {:?}: {}", path, e);
                return Err(anyhow::anyhow!("Configuration loading failed: {}", e));
            }
        },
        None => AgentConfig::default(),
    };
    let config = Arc::new(config);
    info!("Configuration loaded");

    let mut notifier = Notifier::new();
    if config.notifications.console {
        notifier.add_channel(Box::new(ConsoleChannel));
    }
    if let Some(dir) = &config.notifications.file_dir {
        notifier.add_channel(Box::new(FileChannel::new(dir)));
    }
    if let Some(url) = &config.notifications.webhook_url {
        notifier.add_channel(Box::new(WebhookChannel::new(url.clone())));
    }
    let notifier = Arc::new(notifier);

    info!(
        "Starting trading agent (balance ${:.2}, {} mode)",
        config.trading.starting_balance,
        if cli.demo { "demo" } else { "live" }
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received, stopping loops...");
        let _ = shutdown_tx.send(true);
    });

    if cli.demo {
        run_agent(Arc::new(DemoProvider::new()), config, notifier, shutdown_rx).await
    } else {
        run_agent(
            Arc::new(DexScreenerClient::new()),
            config,
            notifier,
            shutdown_rx,
        )
        .await
    }
}

async fn run_agent<M: MarketDataProvider + 'static>(
    provider: Arc<M>,
    config: Arc<AgentConfig>,
    notifier: Arc<Notifier>,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let agent = Arc::new(TradingAgent::new(Arc::clone(&provider), Arc::clone(&config)));

    let runtime = Arc::new(AgentRuntime::new(
        Arc::clone(&agent),
        provider,
        config,
        notifier,
        shutdown,
    ));
    runtime.run().await;

    // Final report once the loops have drained.
    println!("\nFINAL REPORT:");
    println!("{}", agent.format_status_report().await);
    Ok(())
}
