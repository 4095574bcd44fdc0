use crate::api::{GainersLosers, MarketDataProvider};
use crate::error::{Error, Result};
use crate::models::TokenSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{error, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const API_BASE_URL: &str = "https://api.dexscreener.com/latest";
const RATE_LIMIT: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Vec<PairDto>,
}

#[derive(Debug, Deserialize)]
struct GainersLosersResponse {
    #[serde(default)]
    gainers: Vec<PairDto>,
    #[serde(default)]
    losers: Vec<PairDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PairDto {
    #[serde(default)]
    base_token: BaseTokenDto,
    /// DexScreener serves the price as a decimal string.
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    price_change: ChangeDto,
    #[serde(default)]
    volume: VolumeDto,
    #[serde(default)]
    liquidity: LiquidityDto,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    fdv: Option<f64>,
    #[serde(default)]
    chain_id: String,
    #[serde(default)]
    pair_address: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pair_created_at: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct BaseTokenDto {
    #[serde(default)]
    address: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ChangeDto {
    #[serde(default)]
    h24: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct VolumeDto {
    #[serde(default)]
    h24: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct LiquidityDto {
    #[serde(default)]
    usd: Option<f64>,
}

impl PairDto {
    fn into_snapshot(self) -> TokenSnapshot {
        let price = self
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(0.0);

        TokenSnapshot {
            address: self.base_token.address,
            symbol: self.base_token.symbol,
            name: self.base_token.name,
            price,
            price_change_24h: self.price_change.h24.unwrap_or(0.0),
            volume_24h: self.volume.h24.unwrap_or(0.0),
            liquidity: self.liquidity.usd.unwrap_or(0.0),
            market_cap: self.market_cap.unwrap_or(0.0),
            fdv: self.fdv.unwrap_or(0.0),
            chain: self.chain_id,
            pair_address: self.pair_address,
            created_at: self
                .pair_created_at
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}

/// DexScreener REST client. Requires no API key; a shared minimum delay
/// between requests keeps us under the public rate limit.
pub struct DexScreenerClient {
    client: Client,
    base_url: String,
    last_request: Mutex<Instant>,
}

impl DexScreenerClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: API_BASE_URL.to_string(),
            last_request: Mutex::new(Instant::now() - RATE_LIMIT),
        }
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT {
            tokio::time::sleep(RATE_LIMIT - elapsed).await;
        }
        *last = Instant::now();
    }

    async fn make_request<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);

        for attempt in 0..=MAX_RETRIES {
            self.wait_for_rate_limit().await;

            let response = self.client.get(&url).send().await?;
            match response.status() {
                status if status.is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        error!("Failed to parse response from {}: {}", endpoint, e);
                        Error::ApiInvalidData(format!("malformed response: {}", e))
                    });
                }
                StatusCode::TOO_MANY_REQUESTS if attempt < MAX_RETRIES => {
                    let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                    warn!(
                        "DexScreener rate limit hit, backing off {}s",
                        backoff.as_secs()
                    );
                    tokio::time::sleep(backoff).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(Error::RateLimitExceeded(
                        "DexScreener API rate limit exceeded".to_string(),
                    ));
                }
                status => {
                    return Err(Error::ApiError(format!(
                        "request to {} failed with status {}",
                        endpoint, status
                    )));
                }
            }
        }

        Err(Error::ApiError(format!("request to {} exhausted retries", endpoint)))
    }
}

impl Default for DexScreenerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for DexScreenerClient {
    async fn search_pairs(&self, query: &str) -> Result<Vec<TokenSnapshot>> {
        let response: PairsResponse = self
            .make_request(&format!("dex/search?q={}", query))
            .await?;
        Ok(response
            .pairs
            .into_iter()
            .map(PairDto::into_snapshot)
            .collect())
    }

    async fn get_token_pairs(&self, address: &str) -> Result<Vec<TokenSnapshot>> {
        let response: PairsResponse = self
            .make_request(&format!("dex/tokens/{}", address))
            .await?;
        Ok(response
            .pairs
            .into_iter()
            .map(PairDto::into_snapshot)
            .collect())
    }

    async fn get_trending_tokens(&self, chain: Option<&str>) -> Result<Vec<TokenSnapshot>> {
        let endpoint = match chain {
            Some(chain) => format!("dex/tokens/trending/{}", chain),
            None => "dex/tokens/trending".to_string(),
        };
        let response: PairsResponse = self.make_request(&endpoint).await?;
        Ok(response
            .pairs
            .into_iter()
            .map(PairDto::into_snapshot)
            .collect())
    }

    async fn get_new_pairs(&self, chain: Option<&str>, hours: u32) -> Result<Vec<TokenSnapshot>> {
        let endpoint = match chain {
            Some(chain) => format!("dex/pairs/new/{}", chain),
            None => "dex/pairs/new".to_string(),
        };
        let response: PairsResponse = self.make_request(&endpoint).await?;

        let cutoff = Utc::now() - ChronoDuration::hours(hours as i64);
        Ok(response
            .pairs
            .into_iter()
            .map(PairDto::into_snapshot)
            .filter(|snap| snap.created_at.map(|t| t >= cutoff).unwrap_or(false))
            .collect())
    }

    async fn get_gainers_losers(&self, chain: Option<&str>) -> Result<GainersLosers> {
        let endpoint = match chain {
            Some(chain) => format!("dex/tokens/gainers-losers/{}", chain),
            None => "dex/tokens/gainers-losers".to_string(),
        };
        let response: GainersLosersResponse = self.make_request(&endpoint).await?;
        Ok(GainersLosers {
            gainers: response
                .gainers
                .into_iter()
                .map(PairDto::into_snapshot)
                .collect(),
            losers: response
                .losers
                .into_iter()
                .map(PairDto::into_snapshot)
                .collect(),
        })
    }
}
