//! Market Analyzer
//!
//! The per-symbol pipeline: fetch market and social data in parallel, score
//! sentiment, track price history, compute indicators once enough history
//! exists, and evaluate the trading rules.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::analysis::indicators::{self, IndicatorError, IndicatorSummary};
use crate::analysis::sentiment::SentimentAnalyzer;
use crate::config::{AnalysisSection, SocialSection};
use crate::domain::memecoin::Memecoin;
use crate::domain::risk::FeedBreaker;
use crate::domain::signal::{Opportunity, TradeAction};
use crate::ports::market_data::{MarketDataSource, MarketSnapshot, OnchainMetrics, OnchainSource};
use crate::ports::social::{SocialFeed, SocialPost, SocialSource};

/// Breaker key for the market data feed
pub const MARKET_FEED: &str = "dexscreener";

/// Breaker key for the onchain indexer
pub const INDEXER_FEED: &str = "indexer";

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Nothing to monitor
    #[error("Watchlist is empty")]
    EmptyWatchlist,

    /// Evaluation needs a sentiment score
    #[error("No sentiment available for {symbol}")]
    MissingSentiment { symbol: String },

    /// Indicator calculation failed
    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    /// A pipeline stage failed for one symbol
    #[error("Processing {symbol} failed at {stage}: {message}")]
    Processing {
        symbol: String,
        stage: String,
        message: String,
    },
}

/// Everything the analyzer learned about one symbol in one pass
#[derive(Debug, Clone)]
pub struct SymbolReport {
    pub symbol: String,
    pub coin: Option<Memecoin>,
    pub onchain: Option<OnchainMetrics>,
    pub indicators: Option<IndicatorSummary>,
    pub action: Option<TradeAction>,
    pub opportunity: Option<Opportunity>,
    pub error: Option<String>,
}

impl SymbolReport {
    fn failed(symbol: &str, error: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            coin: None,
            onchain: None,
            indicators: None,
            action: None,
            opportunity: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// One-line summary for CLI output
    pub fn summary_line(&self) -> String {
        if let Some(error) = &self.error {
            return format!("{}: FAILED ({})", self.symbol, error);
        }
        let action = self
            .action
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        match &self.coin {
            Some(coin) => format!("{} | Action: {}", coin, action),
            None => format!("{}: no data", self.symbol),
        }
    }
}

/// Bounded close-price history for one symbol
#[derive(Debug, Clone)]
pub struct PriceSeries {
    closes: VecDeque<f64>,
    capacity: usize,
}

impl PriceSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, price: f64) {
        if self.closes.len() == self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(price);
    }

    pub fn closes(&self) -> Vec<f64> {
        self.closes.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Fuses market data, social sentiment and indicators into symbol reports
#[derive(Clone)]
pub struct MarketAnalyzer {
    market: Arc<dyn MarketDataSource>,
    onchain: Option<Arc<dyn OnchainSource>>,
    feeds: Vec<Arc<dyn SocialFeed>>,
    sentiment: Arc<SentimentAnalyzer>,
    cfg: AnalysisSection,
    social_cfg: SocialSection,
    breaker: Arc<RwLock<FeedBreaker>>,
    histories: Arc<RwLock<HashMap<String, PriceSeries>>>,
}

impl MarketAnalyzer {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        onchain: Option<Arc<dyn OnchainSource>>,
        feeds: Vec<Arc<dyn SocialFeed>>,
        sentiment: SentimentAnalyzer,
        cfg: AnalysisSection,
        social_cfg: SocialSection,
        breaker: Arc<RwLock<FeedBreaker>>,
    ) -> Self {
        Self {
            market,
            onchain,
            feeds,
            sentiment: Arc::new(sentiment),
            cfg,
            social_cfg,
            breaker,
            histories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Analyze every symbol concurrently.
    ///
    /// Duplicates are dropped keeping first-seen order; one symbol failing
    /// never aborts the others. Reports come back in input order, failures
    /// included with their error message.
    pub async fn monitor_symbols(
        &self,
        symbols: &[String],
    ) -> Result<Vec<SymbolReport>, AnalyzerError> {
        if symbols.is_empty() {
            return Err(AnalyzerError::EmptyWatchlist);
        }

        let mut seen = HashSet::new();
        let unique: Vec<String> = symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect();

        info!(count = unique.len(), "Monitoring watchlist");

        let mut set = JoinSet::new();
        for (idx, symbol) in unique.iter().enumerate() {
            let analyzer = self.clone();
            let symbol = symbol.clone();
            set.spawn(async move {
                let result = analyzer.process_symbol(&symbol).await;
                (idx, symbol, result)
            });
        }

        let mut reports: Vec<Option<SymbolReport>> = (0..unique.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, _, Ok(report))) => reports[idx] = Some(report),
                Ok((idx, symbol, Err(err))) => {
                    error!(symbol = %symbol, "Symbol processing failed: {}", err);
                    reports[idx] = Some(SymbolReport::failed(&symbol, err.to_string()));
                }
                Err(join_err) => error!("Analysis task panicked: {}", join_err),
            }
        }

        Ok(reports.into_iter().flatten().collect())
    }

    /// Run the full pipeline for one symbol
    pub async fn process_symbol(&self, symbol: &str) -> Result<SymbolReport, AnalyzerError> {
        debug!(symbol, "Processing symbol");

        let (market_result, posts) =
            tokio::join!(self.fetch_snapshot(symbol), self.collect_posts(symbol));
        let snapshot = market_result?;
        validate_snapshot(symbol, &snapshot)?;

        let sentiment_score = posts.as_ref().map(|p| self.sentiment.score_posts(p));
        let mentions = posts.as_ref().map(|p| p.len() as u32).unwrap_or(0);

        let onchain = self.fetch_onchain(symbol, snapshot.mint.as_deref()).await;

        let coin = Memecoin {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            price: snapshot.price,
            volume_24h: snapshot.volume_24h,
            liquidity: snapshot.liquidity,
            holders: onchain.as_ref().map(|m| m.holders).unwrap_or(0),
            social_mentions: mentions,
            sentiment_score,
        };

        let closes = {
            let mut histories = self.histories.write().await;
            let series = histories
                .entry(symbol.to_string())
                .or_insert_with(|| PriceSeries::new(self.cfg.history_capacity));
            series.push(snapshot.price);
            series.closes()
        };

        let summary = if closes.len() >= indicators::required_samples(&self.cfg) {
            match indicators::summarize(&closes, &self.cfg) {
                Ok(summary) => Some(summary),
                Err(err) => {
                    warn!(symbol, "Indicator calculation failed: {}", err);
                    None
                }
            }
        } else {
            None
        };

        let (action, opportunity) = match coin.sentiment_score {
            Some(sentiment) => {
                let action = self.evaluate(&coin)?;
                let opportunity = match action {
                    TradeAction::Buy => Some(Opportunity::new(
                        &coin.symbol,
                        action,
                        coin.price,
                        sentiment,
                        coin.volume_24h,
                        self.cfg.buy_sentiment_threshold,
                    )),
                    TradeAction::Sell => Some(Opportunity::new(
                        &coin.symbol,
                        action,
                        coin.price,
                        sentiment,
                        coin.volume_24h,
                        self.cfg.sell_sentiment_threshold,
                    )),
                    TradeAction::Hold => None,
                };
                (Some(action), opportunity)
            }
            None => {
                debug!(symbol, "No social data, skipping signal evaluation");
                (None, None)
            }
        };

        info!("Processed {}", coin);

        Ok(SymbolReport {
            symbol: symbol.to_string(),
            coin: Some(coin),
            onchain,
            indicators: summary,
            action,
            opportunity,
            error: None,
        })
    }

    /// Apply the trading rules to an analyzed coin.
    ///
    /// Buy on high sentiment with volume above the buy floor; sell on low
    /// sentiment with volume under the sell ceiling; hold otherwise.
    pub fn evaluate(&self, coin: &Memecoin) -> Result<TradeAction, AnalyzerError> {
        let sentiment = coin
            .sentiment_score
            .ok_or_else(|| AnalyzerError::MissingSentiment {
                symbol: coin.symbol.clone(),
            })?;

        let action = if sentiment > self.cfg.buy_sentiment_threshold
            && coin.volume_24h > self.cfg.buy_volume_threshold
        {
            TradeAction::Buy
        } else if sentiment < self.cfg.sell_sentiment_threshold
            && coin.volume_24h < self.cfg.sell_volume_threshold
        {
            TradeAction::Sell
        } else {
            TradeAction::Hold
        };

        Ok(action)
    }

    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, AnalyzerError> {
        match self.market.snapshot(symbol).await {
            Ok(snapshot) => {
                self.breaker.write().await.record_success(MARKET_FEED);
                Ok(snapshot)
            }
            Err(err) => {
                if err.is_feed_fault() {
                    let now = chrono::Utc::now();
                    if self.breaker.write().await.record_failure(MARKET_FEED, now) {
                        warn!("Market data feed benched after repeated failures");
                    }
                }
                Err(AnalyzerError::Processing {
                    symbol: symbol.to_string(),
                    stage: "market_data".to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Collect posts from every healthy feed concurrently.
    ///
    /// Returns None when no feed delivered at all, which keeps "no data"
    /// distinct from "zero posts found".
    async fn collect_posts(&self, symbol: &str) -> Option<Vec<SocialPost>> {
        if !self.social_cfg.enabled || self.feeds.is_empty() {
            return None;
        }

        let now = chrono::Utc::now();
        let mut set = JoinSet::new();
        {
            let breaker = self.breaker.read().await;
            for feed in &self.feeds {
                let source = feed.source();
                if breaker.is_benched(source.as_str(), now) {
                    warn!(feed = source.as_str(), "Feed benched, skipping collection");
                    continue;
                }
                let feed = Arc::clone(feed);
                let symbol = symbol.to_string();
                let limit = match source {
                    SocialSource::Twitter => self.social_cfg.twitter_max_results,
                    SocialSource::Reddit => self.social_cfg.reddit_limit,
                };
                set.spawn(async move { (source, feed.recent_posts(&symbol, limit).await) });
            }
        }

        let mut all = Vec::new();
        let mut any_ok = false;
        while let Some(joined) = set.join_next().await {
            let (source, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    error!("Social collection task panicked: {}", join_err);
                    continue;
                }
            };
            match result {
                Ok(posts) => {
                    debug!(feed = source.as_str(), count = posts.len(), "Collected posts");
                    self.breaker.write().await.record_success(source.as_str());
                    any_ok = true;
                    all.extend(posts);
                }
                Err(err) => {
                    warn!(feed = source.as_str(), "Social feed failed: {}", err);
                    if self
                        .breaker
                        .write()
                        .await
                        .record_failure(source.as_str(), now)
                    {
                        warn!(feed = source.as_str(), "Feed benched after repeated failures");
                    }
                }
            }
        }

        if any_ok {
            Some(all)
        } else {
            None
        }
    }

    async fn fetch_onchain(&self, symbol: &str, mint: Option<&str>) -> Option<OnchainMetrics> {
        let source = self.onchain.as_ref()?;
        let mint = mint?;

        let now = chrono::Utc::now();
        if self.breaker.read().await.is_benched(INDEXER_FEED, now) {
            return None;
        }

        match source.metrics(mint).await {
            Ok(metrics) => {
                self.breaker.write().await.record_success(INDEXER_FEED);
                Some(metrics)
            }
            Err(err) => {
                warn!(symbol, "Onchain metrics unavailable: {}", err);
                if err.is_feed_fault() {
                    self.breaker.write().await.record_failure(INDEXER_FEED, now);
                }
                None
            }
        }
    }
}

fn validate_snapshot(symbol: &str, snapshot: &MarketSnapshot) -> Result<(), AnalyzerError> {
    let mut problem = None;
    if !snapshot.price.is_finite() || snapshot.price <= 0.0 {
        problem = Some(format!("price {} out of range", snapshot.price));
    } else if !snapshot.volume_24h.is_finite() || snapshot.volume_24h < 0.0 {
        problem = Some(format!("volume {} out of range", snapshot.volume_24h));
    } else if !snapshot.liquidity.is_finite() || snapshot.liquidity < 0.0 {
        problem = Some(format!("liquidity {} out of range", snapshot.liquidity));
    }

    match problem {
        Some(message) => Err(AnalyzerError::Processing {
            symbol: symbol.to_string(),
            stage: "validation".to_string(),
            message,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::market_data::{MarketDataError, MockMarketDataSource};
    use crate::ports::social::MockSocialFeed;
    use chrono::Utc;

    fn snapshot(symbol: &str, price: f64, volume: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: symbol.to_string(),
            name: format!("{} Coin", symbol),
            price,
            volume_24h: volume,
            liquidity: 1_000_000.0,
            price_change_24h_pct: Some(4.2),
            mint: None,
            fetched_at: Utc::now(),
        }
    }

    fn posts(texts: &[&str]) -> Vec<SocialPost> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| SocialPost {
                id: i.to_string(),
                text: text.to_string(),
                author: "user".to_string(),
                source: SocialSource::Twitter,
                posted_at: None,
            })
            .collect()
    }

    fn coin(sentiment: Option<f64>, volume: f64) -> Memecoin {
        Memecoin {
            symbol: "TEST".to_string(),
            name: "Test Coin".to_string(),
            price: 150.0,
            volume_24h: volume,
            liquidity: 1_000_000.0,
            holders: 10_000,
            social_mentions: 2,
            sentiment_score: sentiment,
        }
    }

    fn breaker() -> Arc<RwLock<FeedBreaker>> {
        Arc::new(RwLock::new(FeedBreaker::new(5, 600)))
    }

    fn analyzer_with(market: MockMarketDataSource, feeds: Vec<Arc<dyn SocialFeed>>) -> MarketAnalyzer {
        MarketAnalyzer::new(
            Arc::new(market),
            None,
            feeds,
            SentimentAnalyzer::new(),
            AnalysisSection::default(),
            SocialSection::default(),
            breaker(),
        )
    }

    #[test]
    fn test_evaluate_threshold_grid() {
        let market = MockMarketDataSource::new();
        let analyzer = analyzer_with(market, vec![]);

        // (sentiment, volume) -> expected action
        let cases = [
            (0.75, 1_500_000.0, TradeAction::Buy),
            (0.25, 400_000.0, TradeAction::Sell),
            (0.5, 750_000.0, TradeAction::Hold),
            (0.8, 900_000.0, TradeAction::Hold),
            (0.4, 1_100_000.0, TradeAction::Hold),
        ];
        for (sentiment, volume, expected) in cases {
            let action = analyzer.evaluate(&coin(Some(sentiment), volume)).unwrap();
            assert_eq!(action, expected, "sentiment {} volume {}", sentiment, volume);
        }
    }

    #[test]
    fn test_evaluate_requires_sentiment() {
        let market = MockMarketDataSource::new();
        let analyzer = analyzer_with(market, vec![]);

        let err = analyzer.evaluate(&coin(None, 2_000_000.0)).unwrap_err();
        assert!(matches!(err, AnalyzerError::MissingSentiment { .. }));
    }

    #[tokio::test]
    async fn test_empty_watchlist_rejected() {
        let market = MockMarketDataSource::new();
        let analyzer = analyzer_with(market, vec![]);

        let err = analyzer.monitor_symbols(&[]).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyWatchlist));
    }

    #[tokio::test]
    async fn test_watchlist_dedup_preserves_order() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .times(2)
            .returning(|symbol| Ok(snapshot(symbol, 1.5, 2_000_000.0)));

        let mut feed = MockSocialFeed::new();
        feed.expect_source().return_const(SocialSource::Twitter);
        feed.expect_recent_posts()
            .times(2)
            .returning(|_, _| Ok(posts(&["to the moon", "bullish gem"])));

        let analyzer = analyzer_with(market, vec![Arc::new(feed)]);
        let symbols = vec!["WIF".to_string(), "BONK".to_string(), "WIF".to_string()];
        let reports = analyzer.monitor_symbols(&symbols).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].symbol, "WIF");
        assert_eq!(reports[1].symbol, "BONK");
        assert!(reports.iter().all(|r| r.succeeded()));
    }

    #[tokio::test]
    async fn test_market_failure_becomes_failed_report() {
        let mut market = MockMarketDataSource::new();
        market.expect_snapshot().returning(|_| {
            Err(MarketDataError::Status {
                url: "https://api.dexscreener.com/latest/dex/tokens/WIF".to_string(),
                status: 500,
            })
        });

        let analyzer = analyzer_with(market, vec![]);
        let reports = analyzer
            .monitor_symbols(&["WIF".to_string()])
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert!(!reports[0].succeeded());
        assert!(reports[0].error.as_ref().unwrap().contains("market_data"));

        // Transport failures count against the market feed breaker
        assert_eq!(
            analyzer.breaker.read().await.consecutive_failures(MARKET_FEED),
            1
        );
    }

    #[tokio::test]
    async fn test_social_failure_degrades_to_no_sentiment() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .returning(|symbol| Ok(snapshot(symbol, 1.5, 2_000_000.0)));

        let mut feed = MockSocialFeed::new();
        feed.expect_source().return_const(SocialSource::Twitter);
        feed.expect_recent_posts().returning(|_, _| {
            Err(crate::ports::social::SocialError::Status {
                url: "https://api.twitter.com/2/tweets/search/recent".to_string(),
                status: 503,
            })
        });

        let analyzer = analyzer_with(market, vec![Arc::new(feed)]);
        let report = analyzer.process_symbol("WIF").await.unwrap();

        let coin = report.coin.unwrap();
        assert_eq!(coin.sentiment_score, None);
        assert_eq!(report.action, None);
        assert_eq!(report.opportunity, None);
    }

    #[tokio::test]
    async fn test_zero_posts_scores_neutral_not_missing() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .returning(|symbol| Ok(snapshot(symbol, 1.5, 2_000_000.0)));

        let mut feed = MockSocialFeed::new();
        feed.expect_source().return_const(SocialSource::Twitter);
        feed.expect_recent_posts().returning(|_, _| Ok(vec![]));

        let analyzer = analyzer_with(market, vec![Arc::new(feed)]);
        let report = analyzer.process_symbol("WIF").await.unwrap();

        let coin = report.coin.unwrap();
        assert_eq!(coin.sentiment_score, Some(0.0));
        assert_eq!(report.action, Some(TradeAction::Hold));
    }

    #[tokio::test]
    async fn test_buy_opportunity_produced() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .returning(|symbol| Ok(snapshot(symbol, 2.45, 1_800_000.0)));

        let mut feed = MockSocialFeed::new();
        feed.expect_source().return_const(SocialSource::Twitter);
        feed.expect_recent_posts()
            .returning(|_, _| Ok(posts(&["mooning hard", "absolutely bullish gem", "lfg rocket!!"])));

        let analyzer = analyzer_with(market, vec![Arc::new(feed)]);
        let report = analyzer.process_symbol("WIF").await.unwrap();

        assert_eq!(report.action, Some(TradeAction::Buy));
        let opp = report.opportunity.unwrap();
        assert_eq!(opp.action, TradeAction::Buy);
        assert!(opp.sentiment > 0.7);
        assert!(opp.confidence > 0.5);
        assert!(opp.validate().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_snapshot_rejected() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .returning(|symbol| Ok(snapshot(symbol, f64::NAN, 2_000_000.0)));

        let analyzer = analyzer_with(market, vec![]);
        let err = analyzer.process_symbol("WIF").await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Processing { ref stage, .. } if stage == "validation"
        ));
    }

    #[tokio::test]
    async fn test_indicators_appear_after_enough_cycles() {
        let cfg = AnalysisSection::default();
        let needed = indicators::required_samples(&cfg);

        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .times(needed)
            .returning(|symbol| Ok(snapshot(symbol, 1.5, 2_000_000.0)));

        let analyzer = analyzer_with(market, vec![]);

        let mut last = None;
        for _ in 0..needed {
            last = Some(analyzer.process_symbol("WIF").await.unwrap());
        }
        let report = last.unwrap();
        assert!(report.indicators.is_some());
        // Flat price history reads as neutral RSI
        assert_eq!(report.indicators.unwrap().rsi, 50.0);
    }

    #[tokio::test]
    async fn test_benched_feed_is_skipped() {
        let mut market = MockMarketDataSource::new();
        market
            .expect_snapshot()
            .returning(|symbol| Ok(snapshot(symbol, 1.5, 2_000_000.0)));

        let mut feed = MockSocialFeed::new();
        feed.expect_source().return_const(SocialSource::Twitter);
        feed.expect_recent_posts().times(0);

        let analyzer = analyzer_with(market, vec![Arc::new(feed)]);
        {
            let mut breaker = analyzer.breaker.write().await;
            let now = chrono::Utc::now();
            for _ in 0..5 {
                breaker.record_failure("twitter", now);
            }
        }

        let report = analyzer.process_symbol("WIF").await.unwrap();
        // Benched feed means no social data at all
        assert_eq!(report.coin.unwrap().sentiment_score, None);
    }

    #[test]
    fn test_price_series_is_bounded() {
        let mut series = PriceSeries::new(3);
        for price in [1.0, 2.0, 3.0, 4.0] {
            series.push(price);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_summary_line_formats() {
        let failed = SymbolReport::failed("WIF", "boom".to_string());
        assert!(failed.summary_line().contains("FAILED"));

        let report = SymbolReport {
            symbol: "TEST".to_string(),
            coin: Some(coin(Some(0.8), 2_000_000.0)),
            onchain: None,
            indicators: None,
            action: Some(TradeAction::Buy),
            opportunity: None,
            error: None,
        };
        let line = report.summary_line();
        assert!(line.contains("TEST"));
        assert!(line.contains("Action: BUY"));
    }
}
