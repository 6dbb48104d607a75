//! Market Data Ports
//!
//! Trait seams for DEX market snapshots and onchain token metrics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market data error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarketDataError {
    /// Transport-level failure
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// Non-success status code
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response parsed but a required field was absent
    #[error("Response missing required field: {field}")]
    MissingField { field: String },

    /// No pairs listed for the symbol
    #[error("No market data found for symbol: {0}")]
    UnknownSymbol(String),

    /// Mint address failed base58 validation
    #[error("Invalid mint address: {0}")]
    InvalidMint(String),

    /// Body could not be decoded
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl MarketDataError {
    /// Whether this error indicates the feed itself is unhealthy.
    ///
    /// Bad input (unknown symbol, malformed mint) says nothing about the
    /// feed and must not count against its breaker.
    pub fn is_feed_fault(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Status { .. } | Self::Decode { .. }
        )
    }
}

/// One fetched market observation for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub name: String,
    /// Last traded price in USD
    pub price: f64,
    /// 24h volume in USD
    pub volume_24h: f64,
    /// Pool liquidity in USD
    pub liquidity: f64,
    /// 24h price change in percent, when the venue reports it
    pub price_change_24h_pct: Option<f64>,
    /// Base token mint address, when the venue reports it
    pub mint: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Derived onchain metrics for a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnchainMetrics {
    pub mint: String,
    /// Unique holder count
    pub holders: u64,
    /// Supply share of the ten largest holders, percent
    pub top10_holder_pct: f64,
    /// Transactions above the indexer's whale threshold in 24h
    pub whale_tx_24h: u32,
}

/// Source of market snapshots (DEX aggregators, price APIs)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;
}

/// Source of onchain token metrics (indexer APIs)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OnchainSource: Send + Sync {
    async fn metrics(&self, mint: &str) -> Result<OnchainMetrics, MarketDataError>;
}
