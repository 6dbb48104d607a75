//! Hand-rolled port fakes that record calls and serve canned responses.
//!
//! Used by integration tests where the generated mocks are unavailable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::market_data::{
    MarketDataError, MarketDataSource, MarketSnapshot, OnchainMetrics, OnchainSource,
};
use super::notify::{AlertSink, NotifyError};
use super::social::{SocialError, SocialFeed, SocialPost, SocialSource};

/// Market data fake that records queried symbols
#[derive(Debug, Default)]
pub struct StaticMarketData {
    snapshots: Mutex<HashMap<String, MarketSnapshot>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve a snapshot for its symbol
    pub fn with_snapshot(self, snapshot: MarketSnapshot) -> Self {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.symbol.clone(), snapshot);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketData {
    async fn snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.snapshots
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::UnknownSymbol(symbol.to_string()))
    }
}

/// Onchain metrics fake keyed by mint
#[derive(Debug, Default)]
pub struct StaticOnchain {
    metrics: Mutex<HashMap<String, OnchainMetrics>>,
}

impl StaticOnchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(self, metrics: OnchainMetrics) -> Self {
        self.metrics
            .lock()
            .unwrap()
            .insert(metrics.mint.clone(), metrics);
        self
    }
}

#[async_trait]
impl OnchainSource for StaticOnchain {
    async fn metrics(&self, mint: &str) -> Result<OnchainMetrics, MarketDataError> {
        self.metrics
            .lock()
            .unwrap()
            .get(mint)
            .cloned()
            .ok_or_else(|| MarketDataError::UnknownSymbol(mint.to_string()))
    }
}

/// Social feed fake serving a fixed post list, optionally failing
#[derive(Debug)]
pub struct StaticSocialFeed {
    source: SocialSource,
    posts: Vec<SocialPost>,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticSocialFeed {
    pub fn new(source: SocialSource) -> Self {
        Self {
            source,
            posts: Vec::new(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builder method to serve posts with the given texts
    pub fn with_texts(mut self, texts: &[&str]) -> Self {
        self.posts = texts
            .iter()
            .enumerate()
            .map(|(i, text)| SocialPost {
                id: format!("{}-{}", self.source.as_str(), i),
                text: text.to_string(),
                author: format!("user{}", i),
                source: self.source,
                posted_at: Some(Utc::now()),
            })
            .collect();
        self
    }

    /// Builder method to make every call fail
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Get all recorded queries
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialFeed for StaticSocialFeed {
    async fn recent_posts(&self, query: &str, limit: u32) -> Result<Vec<SocialPost>, SocialError> {
        self.calls.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(SocialError::Status {
                url: format!("https://{}.example/search", self.source.as_str()),
                status: 503,
            });
        }
        Ok(self.posts.iter().take(limit as usize).cloned().collect())
    }

    fn source(&self) -> SocialSource {
        self.source
    }
}

/// Alert sink that records every delivered message.
///
/// Clones share the same delivery log, so a test can keep a handle
/// while the dispatcher owns the sink.
#[derive(Debug, Clone, Default)]
pub struct RecordingAlertSink {
    delivered: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every delivery fails
    pub fn failing() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Get all (subject, body) pairs delivered so far
    pub fn get_delivered(&self) -> Vec<(String, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Status {
                url: "https://sink.example/deliver".to_string(),
                status: 502,
            });
        }
        self.delivered
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }

    fn channel(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price,
            volume_24h: 2_000_000.0,
            liquidity: 1_000_000.0,
            price_change_24h_pct: None,
            mint: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_static_market_data_records_calls() {
        let fake = StaticMarketData::new().with_snapshot(snapshot("WIF", 2.4));

        let result = fake.snapshot("WIF").await.unwrap();
        assert_eq!(result.price, 2.4);

        let missing = fake.snapshot("BONK").await;
        assert!(matches!(missing, Err(MarketDataError::UnknownSymbol(_))));

        assert_eq!(fake.get_calls(), vec!["WIF".to_string(), "BONK".to_string()]);
    }

    #[tokio::test]
    async fn test_static_social_feed_limit_and_failure() {
        let feed = StaticSocialFeed::new(SocialSource::Twitter)
            .with_texts(&["to the moon", "pump it", "lfg"]);

        let posts = feed.recent_posts("WIF", 2).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(feed.get_calls(), vec!["WIF".to_string()]);

        let failing = StaticSocialFeed::new(SocialSource::Reddit).failing();
        let result = failing.recent_posts("WIF", 10).await;
        assert!(matches!(result, Err(SocialError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_recording_sink_captures_messages() {
        let sink = RecordingAlertSink::new();
        sink.deliver("WIF", "buy signal").await.unwrap();

        let delivered = sink.get_delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "WIF");
        assert_eq!(sink.channel(), "recording");
    }
}
