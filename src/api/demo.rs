use crate::api::{GainersLosers, MarketDataProvider};
use crate::error::Result;
use crate::models::TokenSnapshot;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;

const TRENDING_SYMBOLS: &[&str] = &["WAGMI", "MOON", "ROCKET", "PUMP", "HODL"];
const NEW_PAIR_SYMBOLS: &[&str] = &["GEM", "ALPHA", "BETA"];
const GAINER_SYMBOLS: &[&str] = &["BULL", "PUMP", "MOON"];
const LOSER_SYMBOLS: &[&str] = &["BEAR", "DUMP", "REKT"];

/// Synthetic market-data source for offline runs and tests. Implements the
/// same provider contract as the live client so the agent cannot tell them
/// apart.
#[derive(Debug, Default, Clone)]
pub struct DemoProvider;

impl DemoProvider {
    pub fn new() -> Self {
        Self
    }

    fn random_hex_address() -> String {
        let mut rng = rand::thread_rng();
        let bytes: Vec<String> = (0..20).map(|_| format!("{:02x}", rng.gen::<u8>())).collect();
        format!("0x{}", bytes.concat())
    }

    pub fn generate_token(&self, symbol: &str, base_price: f64, base_mcap: f64) -> TokenSnapshot {
        let mut rng = rand::thread_rng();
        let variation = rng.gen_range(0.8..1.2);
        let price = base_price * variation;
        let market_cap = base_mcap * variation;
        let volume_ratio = rng.gen_range(0.5..3.0);
        let age_hours = rng.gen_range(1..168);

        TokenSnapshot {
            address: Self::random_hex_address(),
            symbol: symbol.to_string(),
            name: format!("{} Token", symbol),
            price,
            price_change_24h: rng.gen_range(-30.0..100.0),
            volume_24h: market_cap * volume_ratio,
            liquidity: market_cap * rng.gen_range(0.1..0.5),
            market_cap,
            fdv: market_cap * 1.2,
            chain: "ethereum".to_string(),
            pair_address: Self::random_hex_address(),
            created_at: Some(Utc::now() - Duration::hours(age_hours)),
        }
    }
}

#[async_trait]
impl MarketDataProvider for DemoProvider {
    async fn search_pairs(&self, query: &str) -> Result<Vec<TokenSnapshot>> {
        match query.to_uppercase().as_str() {
            "DUST" => Ok(vec![self.generate_token("DUST", 0.000312, 15_000_000.0)]),
            "PRICELESS" => Ok(vec![self.generate_token("PRICELESS", 0.00001156, 8_000_000.0)]),
            _ => Ok(Vec::new()),
        }
    }

    async fn get_token_pairs(&self, address: &str) -> Result<Vec<TokenSnapshot>> {
        let mut rng = rand::thread_rng();
        let mut token = self.generate_token(
            "HELD",
            rng.gen_range(0.00001..0.01),
            rng.gen_range(1_000_000.0..20_000_000.0),
        );
        token.address = address.to_string();
        Ok(vec![token])
    }

    async fn get_trending_tokens(&self, _chain: Option<&str>) -> Result<Vec<TokenSnapshot>> {
        let mut rng = rand::thread_rng();
        Ok(TRENDING_SYMBOLS
            .iter()
            .map(|symbol| {
                let base_price = rng.gen_range(0.00001..0.01);
                let base_mcap = rng.gen_range(1_000_000.0..50_000_000.0);
                self.generate_token(symbol, base_price, base_mcap)
            })
            .collect())
    }

    async fn get_new_pairs(&self, _chain: Option<&str>, hours: u32) -> Result<Vec<TokenSnapshot>> {
        let mut rng = rand::thread_rng();
        Ok(NEW_PAIR_SYMBOLS
            .iter()
            .map(|symbol| {
                let base_price = rng.gen_range(0.000001..0.001);
                let base_mcap = rng.gen_range(100_000.0..5_000_000.0);
                let mut token = self.generate_token(symbol, base_price, base_mcap);
                let age = rng.gen_range(0..hours.max(1) as i64);
                token.created_at = Some(Utc::now() - Duration::hours(age));
                token
            })
            .collect())
    }

    async fn get_gainers_losers(&self, _chain: Option<&str>) -> Result<GainersLosers> {
        let mut rng = rand::thread_rng();
        let gainers = GAINER_SYMBOLS
            .iter()
            .map(|symbol| {
                let mut token = self.generate_token(
                    symbol,
                    rng.gen_range(0.0001..0.01),
                    rng.gen_range(1_000_000.0..30_000_000.0),
                );
                token.price_change_24h = rng.gen_range(20.0..150.0);
                token
            })
            .collect();
        let losers = LOSER_SYMBOLS
            .iter()
            .map(|symbol| {
                let mut token = self.generate_token(
                    symbol,
                    rng.gen_range(0.0001..0.01),
                    rng.gen_range(1_000_000.0..30_000_000.0),
                );
                token.price_change_24h = rng.gen_range(-80.0..-20.0);
                token
            })
            .collect();
        Ok(GainersLosers { gainers, losers })
    }
}
