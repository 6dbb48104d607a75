//! Insider Bot Orchestrator
//!
//! Wires the analyzer, registry, risk gates and alert channels into the
//! monitoring loop. State survives restarts through a JSON file so alert
//! cooldowns and feed health carry over.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, info, warn};

use crate::adapters::dexscreener::DexScreenerClient;
use crate::adapters::notify::AlertDispatcher;
use crate::adapters::onchain::IndexerClient;
use crate::adapters::reddit::RedditFeed;
use crate::adapters::twitter::TwitterFeed;
use crate::analysis::analyzer::{AnalyzerError, MarketAnalyzer, SymbolReport, MARKET_FEED};
use crate::analysis::sentiment::SentimentAnalyzer;
use crate::config::BotConfig;
use crate::domain::memecoin::{Memecoin, MemecoinRegistry};
use crate::domain::risk::{AlertGovernor, AlertSuppressed, FeedBreaker, RiskPolicy};
use crate::domain::signal::Opportunity;
use crate::ports::market_data::{MarketDataSource, OnchainMetrics, OnchainSource};
use crate::ports::social::SocialFeed;

/// Bot lifecycle errors
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalyzerError),

    #[error("State persistence failed: {0}")]
    Persistence(String),

    #[error("Component startup failed: {0}")]
    Startup(String),
}

/// Persisted state for crash recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotState {
    /// Symbols being watched when the state was saved
    pub watchlist: Vec<String>,
    /// Alert cooldowns and the daily budget
    pub governor: AlertGovernor,
    /// Feed health bookkeeping
    pub breaker: FeedBreaker,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
}

impl BotState {
    /// Load from file
    pub fn load(path: &Path) -> Result<Option<Self>, BotError> {
        if !path.exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| BotError::Persistence(e.to_string()))?;
        let state: Self =
            serde_json::from_str(&content).map_err(|e| BotError::Persistence(e.to_string()))?;
        Ok(Some(state))
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> Result<(), BotError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BotError::Persistence(e.to_string()))?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| BotError::Persistence(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| BotError::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Delete file
    pub fn delete(path: &Path) -> Result<(), BotError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| BotError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}

/// Status snapshot
#[derive(Debug, Clone)]
pub struct BotStatus {
    pub is_running: bool,
    pub symbols_watched: usize,
    pub coins_tracked: usize,
    pub alerts_today: u32,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

/// The monitoring bot
#[derive(Clone)]
pub struct InsiderBot {
    config: Arc<BotConfig>,
    analyzer: MarketAnalyzer,
    dispatcher: Arc<AlertDispatcher>,
    policy: RiskPolicy,
    registry: Arc<RwLock<MemecoinRegistry>>,
    governor: Arc<RwLock<AlertGovernor>>,
    breaker: Arc<RwLock<FeedBreaker>>,
    is_running: Arc<RwLock<bool>>,
    shutdown_requested: Arc<RwLock<bool>>,
    shutdown_notify: Arc<Notify>,
    last_cycle_at: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl InsiderBot {
    pub fn new(
        config: BotConfig,
        analyzer: MarketAnalyzer,
        dispatcher: AlertDispatcher,
        governor: AlertGovernor,
        breaker: Arc<RwLock<FeedBreaker>>,
    ) -> Self {
        let policy = RiskPolicy {
            min_holders: config.risk.min_holders,
            max_top10_holder_pct: config.risk.max_top10_holder_pct,
            min_liquidity_usd: config.risk.min_liquidity_usd,
        };

        Self {
            config: Arc::new(config),
            analyzer,
            dispatcher: Arc::new(dispatcher),
            policy,
            registry: Arc::new(RwLock::new(MemecoinRegistry::new())),
            governor: Arc::new(RwLock::new(governor)),
            breaker,
            is_running: Arc::new(RwLock::new(false)),
            shutdown_requested: Arc::new(RwLock::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            last_cycle_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the bot with live adapters from config
    pub fn from_config(config: BotConfig) -> Result<Self, BotError> {
        let breaker = Arc::new(RwLock::new(FeedBreaker::new(
            config.risk.max_consecutive_feed_failures,
            config.risk.feed_cooldown_secs,
        )));

        let market: Arc<dyn MarketDataSource> = Arc::new(
            DexScreenerClient::new(&config.market).map_err(|e| BotError::Startup(e.to_string()))?,
        );
        let onchain: Option<Arc<dyn OnchainSource>> = Some(Arc::new(
            IndexerClient::new(&config.market).map_err(|e| BotError::Startup(e.to_string()))?,
        ));

        let mut feeds: Vec<Arc<dyn SocialFeed>> = Vec::new();
        if config.social.enabled {
            feeds.push(Arc::new(
                TwitterFeed::new(&config.social).map_err(|e| BotError::Startup(e.to_string()))?,
            ));
            feeds.push(Arc::new(
                RedditFeed::new(&config.social).map_err(|e| BotError::Startup(e.to_string()))?,
            ));
        } else {
            info!("Social collection disabled, sentiment will be unavailable");
        }

        let analyzer = MarketAnalyzer::new(
            market,
            onchain,
            feeds,
            SentimentAnalyzer::new(),
            config.analysis.clone(),
            config.social.clone(),
            Arc::clone(&breaker),
        );
        let dispatcher = AlertDispatcher::from_config(&config.alerts);
        let governor = AlertGovernor::new(
            config.risk.alert_cooldown_secs,
            config.risk.max_alerts_per_day,
        );

        Ok(Self::new(config, analyzer, dispatcher, governor, breaker))
    }

    /// Run the monitoring loop until shutdown
    pub async fn run(&self) -> Result<(), BotError> {
        *self.is_running.write().await = true;

        info!(
            symbols = self.config.general.symbols.len(),
            interval_secs = self.config.general.monitor_interval_secs,
            "Starting insider bot"
        );

        self.restore_state().await?;

        let interval = Duration::from_secs(self.config.general.monitor_interval_secs);
        while !*self.shutdown_requested.read().await {
            if let Err(e) = self.cycle().await {
                error!("Cycle error: {}", e);
                // Keep running, the next cycle may recover
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.shutdown_notify.notified() => {}
            }
        }

        self.persist_state().await?;
        *self.is_running.write().await = false;
        info!("Insider bot stopped");
        Ok(())
    }

    /// Execute a single monitoring cycle and persist state
    pub async fn run_once(&self) -> Result<(), BotError> {
        self.restore_state().await?;
        self.cycle().await
    }

    /// Analyze symbols without alerting or persisting anything
    pub async fn scan(&self, symbols: &[String]) -> Result<Vec<SymbolReport>, BotError> {
        Ok(self.analyzer.monitor_symbols(symbols).await?)
    }

    /// One pass over the watchlist
    pub async fn cycle(&self) -> Result<(), BotError> {
        let now = Utc::now();
        {
            let breaker = self.breaker.read().await;
            if breaker.is_benched(MARKET_FEED, now) {
                let remaining = breaker.benched_remaining(MARKET_FEED, now).unwrap_or(0);
                warn!(
                    remaining_secs = remaining,
                    "Market data feed benched, skipping cycle"
                );
                return Ok(());
            }
        }

        let reports = self
            .analyzer
            .monitor_symbols(&self.config.general.symbols)
            .await?;

        let mut opportunities = Vec::new();
        {
            let mut registry = self.registry.write().await;
            for report in &reports {
                if let Some(coin) = &report.coin {
                    registry.upsert(coin.clone());
                }
                if let Some(opportunity) = &report.opportunity {
                    opportunities.push((
                        opportunity.clone(),
                        report.coin.clone(),
                        report.onchain.clone(),
                    ));
                }
            }
        }

        let succeeded = reports.iter().filter(|r| r.succeeded()).count();
        info!(
            total = reports.len(),
            succeeded,
            opportunities = opportunities.len(),
            "Cycle analysis complete"
        );

        for (opportunity, coin, onchain) in &opportunities {
            self.consider_alert(opportunity, coin.as_ref(), onchain.as_ref())
                .await;
        }

        *self.last_cycle_at.write().await = Some(Utc::now());
        self.persist_state().await?;
        Ok(())
    }

    /// Risk-gate one opportunity and deliver it if it passes
    async fn consider_alert(
        &self,
        opportunity: &Opportunity,
        coin: Option<&Memecoin>,
        onchain: Option<&OnchainMetrics>,
    ) {
        if let Err(err) = opportunity.validate() {
            warn!(symbol = %opportunity.symbol, "Dropping malformed opportunity: {}", err);
            return;
        }

        let coin = match coin {
            Some(coin) => coin,
            None => return,
        };

        let report = self.policy.assess(
            coin,
            onchain.map(|m| m.top10_holder_pct),
            onchain.map(|m| m.whale_tx_24h),
        );

        if report.is_critical() {
            warn!(
                symbol = %opportunity.symbol,
                warnings = report.warnings.len(),
                "Suppressing alert for critical-risk token"
            );
            return;
        }

        let decision = self
            .governor
            .write()
            .await
            .try_acquire(&opportunity.symbol, Utc::now());
        match decision {
            Ok(()) => self.dispatcher.dispatch(opportunity, &report).await,
            Err(err @ AlertSuppressed::BudgetExhausted { .. }) => {
                warn!(symbol = %opportunity.symbol, "Alert suppressed: {}", err);
            }
            Err(err) => {
                debug!(symbol = %opportunity.symbol, "Alert suppressed: {}", err);
            }
        }
    }

    /// Request graceful shutdown
    pub async fn shutdown(&self) {
        info!("Shutdown requested");
        *self.shutdown_requested.write().await = true;
        self.shutdown_notify.notify_waiters();
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get current status
    pub async fn status(&self) -> BotStatus {
        BotStatus {
            is_running: *self.is_running.read().await,
            symbols_watched: self.config.general.symbols.len(),
            coins_tracked: self.registry.read().await.len(),
            alerts_today: self.governor.read().await.alerts_today(),
            last_cycle_at: *self.last_cycle_at.read().await,
        }
    }

    fn state_path(&self) -> PathBuf {
        PathBuf::from(self.config.general.expanded_state_path())
    }

    async fn persist_state(&self) -> Result<(), BotError> {
        let state = BotState {
            watchlist: self.config.general.symbols.clone(),
            governor: self.governor.read().await.clone(),
            breaker: self.breaker.read().await.clone(),
            last_cycle_at: *self.last_cycle_at.read().await,
            saved_at: Utc::now(),
        };
        let path = self.state_path();
        state.save(&path)?;
        debug!(path = %path.display(), "State persisted");
        Ok(())
    }

    async fn restore_state(&self) -> Result<(), BotError> {
        let path = self.state_path();
        match BotState::load(&path)? {
            Some(state) => {
                info!(path = %path.display(), saved_at = %state.saved_at, "Restoring persisted state");
                *self.governor.write().await = state.governor;
                *self.breaker.write().await = state.breaker;
                *self.last_cycle_at.write().await = state.last_cycle_at;
            }
            None => debug!("No persisted state found, starting fresh"),
        }
        Ok(())
    }
}
