//! DexScreener Market Data Client
//!
//! HTTP client for the DexScreener pair API. Resolves a ticker symbol to
//! its most liquid trading pair and maps it into a `MarketSnapshot`.
//!
//! Features:
//! - Per-symbol response cache with configurable TTL
//! - Retries with exponential backoff and jitter on transport errors,
//!   429 and 5xx
//! - Optional API key for higher rate limits

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::MarketSection;
use crate::ports::market_data::{MarketDataError, MarketDataSource, MarketSnapshot};

/// Base delay for exponential backoff between attempts
const RETRY_BASE_DELAY_MS: u64 = 500;
/// Upper bound of the random jitter added to each backoff
const RETRY_JITTER_MS: u64 = 250;

/// DexScreener pair API client
pub struct DexScreenerClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CachedSnapshot>>,
}

struct CachedSnapshot {
    snapshot: MarketSnapshot,
    fetched: Instant,
}

impl DexScreenerClient {
    pub fn new(cfg: &MarketSection) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| MarketDataError::Http {
                url: cfg.dexscreener_base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: cfg.dexscreener_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.dexscreener_api_key(),
            max_retries: cfg.max_retries,
            cache_ttl: Duration::from_secs(cfg.cache_ttl_secs),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Execute a GET with retry on transport errors, 429 and 5xx
    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, MarketDataError> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let backoff = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                let jitter = rand::thread_rng().gen_range(0..RETRY_JITTER_MS);
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }

            let mut request = self.http.get(url);
            if let Some(ref key) = self.api_key {
                request = request.header("X-API-KEY", key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        warn!(
                            url,
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            "Retrying after bad status"
                        );
                        last_error = Some(MarketDataError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                        continue;
                    }

                    return Err(MarketDataError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Err(err) => {
                    warn!(url, attempt = attempt + 1, "Request failed: {}", err);
                    last_error = Some(MarketDataError::Http {
                        url: url.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MarketDataError::Http {
            url: url.to_string(),
            message: "Max retries exceeded".to_string(),
        }))
    }

    async fn cached(&self, symbol: &str) -> Option<MarketSnapshot> {
        let cache = self.cache.lock().await;
        let entry = cache.get(symbol)?;
        if entry.fetched.elapsed() < self.cache_ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    async fn store(&self, symbol: &str, snapshot: MarketSnapshot) {
        let mut cache = self.cache.lock().await;
        cache.insert(
            symbol.to_string(),
            CachedSnapshot {
                snapshot,
                fetched: Instant::now(),
            },
        );
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

#[async_trait]
impl MarketDataSource for DexScreenerClient {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        if let Some(hit) = self.cached(symbol).await {
            debug!(symbol, "Market cache hit");
            return Ok(hit);
        }

        let url = format!("{}/tokens/{}", self.base_url, symbol);
        let response = self.get_with_retry(&url).await?;
        let body: PairsResponse = response.json().await.map_err(|e| MarketDataError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let pair = best_pair(body.pairs.unwrap_or_default())
            .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.to_string()))?;
        let snapshot = map_pair(symbol, pair)?;

        debug!(
            symbol,
            price = snapshot.price,
            volume = snapshot.volume_24h,
            "Fetched market snapshot"
        );
        self.store(symbol, snapshot.clone()).await;
        Ok(snapshot)
    }
}

/// A symbol can trade in many pools; the most liquid one is the least
/// manipulable price source
fn best_pair(pairs: Vec<PairData>) -> Option<PairData> {
    pairs.into_iter().max_by(|a, b| {
        let la = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
        let lb = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
        la.total_cmp(&lb)
    })
}

fn map_pair(requested: &str, pair: PairData) -> Result<MarketSnapshot, MarketDataError> {
    // priceUsd comes over the wire as a string
    let price = pair
        .price_usd
        .as_deref()
        .and_then(|p| p.parse::<f64>().ok())
        .ok_or_else(|| MarketDataError::MissingField {
            field: "priceUsd".to_string(),
        })?;
    let volume_24h = pair
        .volume
        .and_then(|v| v.h24)
        .ok_or_else(|| MarketDataError::MissingField {
            field: "volume.h24".to_string(),
        })?;
    let liquidity = pair
        .liquidity
        .and_then(|l| l.usd)
        .ok_or_else(|| MarketDataError::MissingField {
            field: "liquidity.usd".to_string(),
        })?;

    let (symbol, name, mint) = match pair.base_token {
        Some(token) => (token.symbol, token.name, Some(token.address)),
        None => (requested.to_string(), requested.to_string(), None),
    };

    Ok(MarketSnapshot {
        symbol,
        name,
        price,
        volume_24h,
        liquidity,
        price_change_24h_pct: pair.price_change.and_then(|c| c.h24),
        mint,
        fetched_at: Utc::now(),
    })
}

/// DexScreener token endpoint response
#[derive(Debug, Deserialize)]
struct PairsResponse {
    pairs: Option<Vec<PairData>>,
}

/// One trading pair as DexScreener reports it
#[derive(Debug, Clone, Deserialize)]
struct PairData {
    #[serde(rename = "baseToken")]
    base_token: Option<BaseToken>,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    volume: Option<VolumeData>,
    liquidity: Option<LiquidityData>,
    #[serde(rename = "priceChange")]
    price_change: Option<PriceChangeData>,
}

#[derive(Debug, Clone, Deserialize)]
struct BaseToken {
    address: String,
    name: String,
    symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VolumeData {
    h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LiquidityData {
    usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct PriceChangeData {
    h24: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS_BODY: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "solana",
                "dexId": "raydium",
                "baseToken": {
                    "address": "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm",
                    "name": "dogwifhat",
                    "symbol": "WIF"
                },
                "priceUsd": "2.45",
                "volume": { "h24": 1800000.0, "h6": 400000.0 },
                "priceChange": { "h24": 12.5 },
                "liquidity": { "usd": 950000.0, "base": 120000.0 }
            },
            {
                "chainId": "solana",
                "dexId": "orca",
                "baseToken": {
                    "address": "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm",
                    "name": "dogwifhat",
                    "symbol": "WIF"
                },
                "priceUsd": "2.47",
                "volume": { "h24": 90000.0 },
                "liquidity": { "usd": 40000.0 }
            }
        ]
    }"#;

    #[test]
    fn test_client_creation() {
        let client = DexScreenerClient::new(&MarketSection::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut cfg = MarketSection::default();
        cfg.dexscreener_base_url = "https://api.dexscreener.com/latest/dex/".to_string();
        let client = DexScreenerClient::new(&cfg).unwrap();
        assert_eq!(client.base_url, "https://api.dexscreener.com/latest/dex");
    }

    #[test]
    fn test_best_pair_picks_highest_liquidity() {
        let body: PairsResponse = serde_json::from_str(PAIRS_BODY).unwrap();
        let pair = best_pair(body.pairs.unwrap()).unwrap();
        assert_eq!(pair.price_usd.as_deref(), Some("2.45"));
    }

    #[test]
    fn test_map_pair_full_body() {
        let body: PairsResponse = serde_json::from_str(PAIRS_BODY).unwrap();
        let pair = best_pair(body.pairs.unwrap()).unwrap();
        let snapshot = map_pair("WIF", pair).unwrap();

        assert_eq!(snapshot.symbol, "WIF");
        assert_eq!(snapshot.name, "dogwifhat");
        assert_eq!(snapshot.price, 2.45);
        assert_eq!(snapshot.volume_24h, 1_800_000.0);
        assert_eq!(snapshot.liquidity, 950_000.0);
        assert_eq!(snapshot.price_change_24h_pct, Some(12.5));
        assert_eq!(
            snapshot.mint.as_deref(),
            Some("EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm")
        );
    }

    #[test]
    fn test_map_pair_missing_price_rejected() {
        let raw = r#"{ "volume": { "h24": 100.0 }, "liquidity": { "usd": 100.0 } }"#;
        let pair: PairData = serde_json::from_str(raw).unwrap();
        let err = map_pair("WIF", pair).unwrap_err();
        assert!(matches!(
            err,
            MarketDataError::MissingField { ref field } if field == "priceUsd"
        ));
    }

    #[test]
    fn test_map_pair_unparseable_price_rejected() {
        let raw = r#"{ "priceUsd": "n/a", "volume": { "h24": 100.0 }, "liquidity": { "usd": 100.0 } }"#;
        let pair: PairData = serde_json::from_str(raw).unwrap();
        assert!(map_pair("WIF", pair).is_err());
    }

    #[test]
    fn test_null_pairs_means_unknown_symbol() {
        let body: PairsResponse = serde_json::from_str(r#"{ "pairs": null }"#).unwrap();
        assert!(best_pair(body.pairs.unwrap_or_default()).is_none());
    }

    #[tokio::test]
    async fn test_cache_round_trip() {
        let client = DexScreenerClient::new(&MarketSection::default()).unwrap();
        assert!(client.cached("WIF").await.is_none());

        let body: PairsResponse = serde_json::from_str(PAIRS_BODY).unwrap();
        let snapshot = map_pair("WIF", best_pair(body.pairs.unwrap()).unwrap()).unwrap();
        client.store("WIF", snapshot.clone()).await;

        let hit = client.cached("WIF").await.unwrap();
        assert_eq!(hit.price, snapshot.price);

        client.clear_cache().await;
        assert!(client.cached("WIF").await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let mut cfg = MarketSection::default();
        cfg.cache_ttl_secs = 0;
        let client = DexScreenerClient::new(&cfg).unwrap();

        let body: PairsResponse = serde_json::from_str(PAIRS_BODY).unwrap();
        let snapshot = map_pair("WIF", best_pair(body.pairs.unwrap()).unwrap()).unwrap();
        client.store("WIF", snapshot).await;

        assert!(client.cached("WIF").await.is_none());
    }
}
