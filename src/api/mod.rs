use crate::error::Result;
use crate::models::TokenSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;

pub mod demo;
pub mod dexscreener;

pub use demo::DemoProvider;
pub use dexscreener::DexScreenerClient;

/// Top gainers and losers, as returned by the data source.
#[derive(Debug, Default, Clone)]
pub struct GainersLosers {
    pub gainers: Vec<TokenSnapshot>,
    pub losers: Vec<TokenSnapshot>,
}

/// Market-data source consumed by the agent. The core never issues raw
/// network calls; callers treat an Err from any method as "no data this
/// cycle" and move on.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn search_pairs(&self, query: &str) -> Result<Vec<TokenSnapshot>>;

    async fn get_token_pairs(&self, address: &str) -> Result<Vec<TokenSnapshot>>;

    async fn get_trending_tokens(&self, chain: Option<&str>) -> Result<Vec<TokenSnapshot>>;

    /// Pairs created within the last `hours` hours.
    async fn get_new_pairs(&self, chain: Option<&str>, hours: u32) -> Result<Vec<TokenSnapshot>>;

    async fn get_gainers_losers(&self, chain: Option<&str>) -> Result<GainersLosers>;
}

/// Latest price per token address, from one provider round trip per address.
/// Tokens the provider has nothing for are simply absent from the map.
pub async fn fetch_price_map<M: MarketDataProvider + ?Sized>(
    provider: &M,
    addresses: &[String],
) -> HashMap<String, f64> {
    let mut prices = HashMap::new();
    for address in addresses {
        match provider.get_token_pairs(address).await {
            Ok(pairs) => {
                if let Some(pair) = pairs.first() {
                    prices.insert(address.clone(), pair.price);
                }
            }
            Err(e) => {
                log::warn!("No price data for {}: {}", address, e);
            }
        }
    }
    prices
}
