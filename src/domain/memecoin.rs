//! Memecoin Domain Model
//!
//! Snapshot of a monitored token: market figures fused with social signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default 24h volume considered "high" in USD
pub const DEFAULT_HIGH_VOLUME_USD: f64 = 1_000_000.0;

/// Default liquidity considered "high" in USD
pub const DEFAULT_HIGH_LIQUIDITY_USD: f64 = 500_000.0;

/// Default sentiment considered "high"
pub const DEFAULT_HIGH_SENTIMENT: f64 = 0.7;

/// One analyzed observation of a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memecoin {
    /// Ticker symbol, uppercase
    pub symbol: String,
    /// Human-readable token name
    pub name: String,
    /// Last traded price in USD
    pub price: f64,
    /// 24h trading volume in USD
    pub volume_24h: f64,
    /// Pool liquidity in USD
    pub liquidity: f64,
    /// Unique holder count
    pub holders: u64,
    /// Social posts seen in the latest collection pass
    pub social_mentions: u32,
    /// Mean compound sentiment, None when no feed delivered
    pub sentiment_score: Option<f64>,
}

impl Memecoin {
    pub fn is_high_volume(&self, threshold: f64) -> bool {
        self.volume_24h > threshold
    }

    pub fn is_high_liquidity(&self, threshold: f64) -> bool {
        self.liquidity > threshold
    }

    /// Sentiment above threshold; unknown sentiment is never high
    pub fn is_high_sentiment(&self, threshold: f64) -> bool {
        match self.sentiment_score {
            Some(score) => score > threshold,
            None => false,
        }
    }
}

impl fmt::Display for Memecoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - Price: ${:.4} | 24h Volume: ${} | Liquidity: ${} | Holders: {} | Mentions: {}",
            self.symbol,
            self.name,
            self.price,
            group_thousands(self.volume_24h),
            group_thousands(self.liquidity),
            self.holders,
            self.social_mentions
        )
    }
}

/// Format a USD amount with thousands separators and two decimals
fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, f),
        None => (formatted.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    let digits: Vec<char> = int_part.chars().collect();
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// In-memory set of tracked coins, latest snapshot per symbol
#[derive(Debug, Clone, Default)]
pub struct MemecoinRegistry {
    coins: Vec<Memecoin>,
}

impl MemecoinRegistry {
    pub fn new() -> Self {
        Self { coins: Vec::new() }
    }

    /// Insert a snapshot, replacing any previous one for the same symbol.
    /// First-seen insertion order is preserved.
    pub fn upsert(&mut self, coin: Memecoin) {
        match self.coins.iter().position(|c| c.symbol == coin.symbol) {
            Some(idx) => self.coins[idx] = coin,
            None => self.coins.push(coin),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Memecoin> {
        self.coins.iter().find(|c| c.symbol == symbol)
    }

    pub fn all(&self) -> &[Memecoin] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}
