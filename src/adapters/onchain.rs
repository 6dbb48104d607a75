//! Onchain Indexer Client
//!
//! Fetches holder distribution and whale activity for a mint from an
//! indexer HTTP API. Mints are validated as base58 32-byte addresses
//! before any network call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::MarketSection;
use crate::ports::market_data::{MarketDataError, OnchainMetrics, OnchainSource};

/// Solana public keys decode to exactly this many bytes
const MINT_ADDRESS_LEN: usize = 32;

/// Indexer metrics client
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(cfg: &MarketSection) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| MarketDataError::Http {
                url: cfg.onchain_base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: cfg.onchain_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Reject anything that is not a plausible mint address
fn validate_mint(mint: &str) -> Result<(), MarketDataError> {
    let decoded = bs58::decode(mint)
        .into_vec()
        .map_err(|_| MarketDataError::InvalidMint(mint.to_string()))?;
    if decoded.len() != MINT_ADDRESS_LEN {
        return Err(MarketDataError::InvalidMint(mint.to_string()));
    }
    Ok(())
}

#[async_trait]
impl OnchainSource for IndexerClient {
    async fn metrics(&self, mint: &str) -> Result<OnchainMetrics, MarketDataError> {
        validate_mint(mint)?;

        let url = format!("{}/token/{}/metrics", self.base_url, mint);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: MetricsResponse = response.json().await.map_err(|e| MarketDataError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        debug!(mint, holders = body.holders, "Fetched onchain metrics");

        Ok(OnchainMetrics {
            mint: mint.to_string(),
            holders: body.holders,
            top10_holder_pct: body.top10_holder_pct,
            whale_tx_24h: body.whale_tx_24h,
        })
    }
}

/// Indexer token metrics response
#[derive(Debug, Deserialize)]
struct MetricsResponse {
    holders: u64,
    #[serde(rename = "top10HolderPct")]
    top10_holder_pct: f64,
    #[serde(rename = "whaleTx24h")]
    whale_tx_24h: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wrapped SOL mint, a well-formed 32-byte address
    const GOOD_MINT: &str = "So11111111111111111111111111111111111111112";

    #[test]
    fn test_client_creation() {
        let client = IndexerClient::new(&MarketSection::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_valid_mint_accepted() {
        assert!(validate_mint(GOOD_MINT).is_ok());
    }

    #[test]
    fn test_malformed_mint_rejected() {
        // 0, O, I and l are outside the base58 alphabet
        let err = validate_mint("not-a-mint-0OIl").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidMint(_)));
    }

    #[test]
    fn test_short_mint_rejected() {
        let err = validate_mint("abc").unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidMint(_)));
    }

    #[test]
    fn test_metrics_response_decoding() {
        let raw = r#"{ "holders": 15234, "top10HolderPct": 42.7, "whaleTx24h": 6 }"#;
        let body: MetricsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.holders, 15_234);
        assert_eq!(body.top10_holder_pct, 42.7);
        assert_eq!(body.whale_tx_24h, 6);
    }
}
