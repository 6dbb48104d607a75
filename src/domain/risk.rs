//! Risk Gate
//!
//! Token risk heuristics plus the throttles that keep alerting sane:
//! a per-symbol alert governor and a circuit breaker over data feeds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::memecoin::Memecoin;

/// Default minimum holder count for safety
pub const DEFAULT_MIN_HOLDERS: u64 = 100;

/// Default maximum percentage held by top 10 holders
pub const DEFAULT_MAX_TOP10_HOLDER_PCT: f64 = 70.0;

/// Default minimum liquidity in USD
pub const DEFAULT_MIN_LIQUIDITY_USD: f64 = 10_000.0;

/// Whale transactions in 24h that flag distribution risk
pub const WHALE_TX_WARNING_COUNT: u32 = 10;

/// Risk level for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Returns a numeric score for the risk level (0-100)
    pub fn score(&self) -> u8 {
        match self {
            RiskLevel::Low => 10,
            RiskLevel::Medium => 40,
            RiskLevel::High => 70,
            RiskLevel::Critical => 100,
        }
    }

    /// Returns a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Token metrics look healthy",
            RiskLevel::Medium => "Minor risk factors detected, proceed with caution",
            RiskLevel::High => "Significant risk factors, alert carries warnings",
            RiskLevel::Critical => "Critical risk - alerting suppressed",
        }
    }
}

/// A single triggered risk heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskWarning {
    LowHolderCount { holders: u64, minimum: u64 },
    ConcentratedSupply { top10_pct: f64, maximum: f64 },
    ThinLiquidity { liquidity_usd: f64, minimum: f64 },
    WhaleActivity { tx_count: u32 },
}

impl fmt::Display for RiskWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskWarning::LowHolderCount { holders, minimum } => {
                write!(f, "only {} holders (minimum {})", holders, minimum)
            }
            RiskWarning::ConcentratedSupply { top10_pct, maximum } => {
                write!(
                    f,
                    "top 10 holders own {:.1}% (maximum {:.1}%)",
                    top10_pct, maximum
                )
            }
            RiskWarning::ThinLiquidity {
                liquidity_usd,
                minimum,
            } => {
                write!(f, "liquidity ${:.0} below ${:.0} floor", liquidity_usd, minimum)
            }
            RiskWarning::WhaleActivity { tx_count } => {
                write!(f, "{} whale transactions in 24h", tx_count)
            }
        }
    }
}

/// Outcome of assessing one token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRiskReport {
    pub symbol: String,
    pub level: RiskLevel,
    pub warnings: Vec<RiskWarning>,
    pub assessed_at: DateTime<Utc>,
}

impl TokenRiskReport {
    pub fn is_critical(&self) -> bool {
        self.level == RiskLevel::Critical
    }

    /// One line per warning, for embedding into alert messages
    pub fn warning_lines(&self) -> Vec<String> {
        self.warnings.iter().map(|w| format!("⚠ {}", w)).collect()
    }
}

/// Thresholds driving the token heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub min_holders: u64,
    pub max_top10_holder_pct: f64,
    pub min_liquidity_usd: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            min_holders: DEFAULT_MIN_HOLDERS,
            max_top10_holder_pct: DEFAULT_MAX_TOP10_HOLDER_PCT,
            min_liquidity_usd: DEFAULT_MIN_LIQUIDITY_USD,
        }
    }
}

impl RiskPolicy {
    /// Assess a token snapshot. Onchain figures are optional because the
    /// indexer may be unavailable; absent data triggers no warning.
    ///
    /// Escalation: 0 warnings -> Low, 1 -> Medium, 2 -> High, 3+ -> Critical.
    pub fn assess(
        &self,
        coin: &Memecoin,
        top10_holder_pct: Option<f64>,
        whale_tx_24h: Option<u32>,
    ) -> TokenRiskReport {
        let mut warnings = Vec::new();

        if coin.holders < self.min_holders {
            warnings.push(RiskWarning::LowHolderCount {
                holders: coin.holders,
                minimum: self.min_holders,
            });
        }

        if let Some(pct) = top10_holder_pct {
            if pct > self.max_top10_holder_pct {
                warnings.push(RiskWarning::ConcentratedSupply {
                    top10_pct: pct,
                    maximum: self.max_top10_holder_pct,
                });
            }
        }

        if coin.liquidity < self.min_liquidity_usd {
            warnings.push(RiskWarning::ThinLiquidity {
                liquidity_usd: coin.liquidity,
                minimum: self.min_liquidity_usd,
            });
        }

        if let Some(count) = whale_tx_24h {
            if count > WHALE_TX_WARNING_COUNT {
                warnings.push(RiskWarning::WhaleActivity { tx_count: count });
            }
        }

        let level = match warnings.len() {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            2 => RiskLevel::High,
            _ => RiskLevel::Critical,
        };

        TokenRiskReport {
            symbol: coin.symbol.clone(),
            level,
            warnings,
            assessed_at: Utc::now(),
        }
    }
}

/// Why an alert was not sent
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlertSuppressed {
    #[error("cooldown active for {symbol}: {remaining_secs}s remaining")]
    Cooldown { symbol: String, remaining_secs: i64 },

    #[error("daily alert budget exhausted ({limit} per day)")]
    BudgetExhausted { limit: u32 },
}

/// Per-symbol cooldown plus a daily alert budget.
///
/// Serializable so the bot can persist it across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertGovernor {
    cooldown_secs: u64,
    max_per_day: u32,

    // State
    last_alert: HashMap<String, DateTime<Utc>>,
    alerts_today: u32,
    day_stamp: NaiveDate,
}

impl AlertGovernor {
    pub fn new(cooldown_secs: u64, max_per_day: u32) -> Self {
        Self {
            cooldown_secs,
            max_per_day,
            last_alert: HashMap::new(),
            alerts_today: 0,
            day_stamp: Utc::now().date_naive(),
        }
    }

    /// Try to take an alert slot for a symbol. On success the slot is
    /// consumed immediately.
    pub fn try_acquire(&mut self, symbol: &str, now: DateTime<Utc>) -> Result<(), AlertSuppressed> {
        self.roll_day(now);

        if self.alerts_today >= self.max_per_day {
            return Err(AlertSuppressed::BudgetExhausted {
                limit: self.max_per_day,
            });
        }

        if let Some(last) = self.last_alert.get(symbol) {
            let elapsed = (now - *last).num_seconds();
            let remaining = self.cooldown_secs as i64 - elapsed;
            if remaining > 0 {
                return Err(AlertSuppressed::Cooldown {
                    symbol: symbol.to_string(),
                    remaining_secs: remaining,
                });
            }
        }

        self.last_alert.insert(symbol.to_string(), now);
        self.alerts_today += 1;
        Ok(())
    }

    pub fn alerts_today(&self) -> u32 {
        self.alerts_today
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day_stamp {
            self.day_stamp = today;
            self.alerts_today = 0;
        }
    }
}

/// Health record for one external feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FeedHealth {
    consecutive_failures: u32,
    benched_until: Option<DateTime<Utc>>,
}

/// Circuit breaker over external data feeds.
///
/// A feed that fails too many times in a row gets benched for a cooldown
/// period; a single success puts it back in rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedBreaker {
    max_consecutive_failures: u32,
    cooldown_secs: u64,
    feeds: HashMap<String, FeedHealth>,
}

impl FeedBreaker {
    pub fn new(max_consecutive_failures: u32, cooldown_secs: u64) -> Self {
        Self {
            max_consecutive_failures,
            cooldown_secs,
            feeds: HashMap::new(),
        }
    }

    /// Whether the feed is currently benched
    pub fn is_benched(&self, feed: &str, now: DateTime<Utc>) -> bool {
        match self.feeds.get(feed).and_then(|h| h.benched_until) {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Seconds until the feed returns, if benched
    pub fn benched_remaining(&self, feed: &str, now: DateTime<Utc>) -> Option<i64> {
        let until = self.feeds.get(feed)?.benched_until?;
        let remaining = (until - now).num_seconds();
        if remaining > 0 {
            Some(remaining)
        } else {
            None
        }
    }

    pub fn record_success(&mut self, feed: &str) {
        let health = self.feeds.entry(feed.to_string()).or_default();
        health.consecutive_failures = 0;
        health.benched_until = None;
    }

    /// Record a failure. Returns true when this failure benched the feed.
    pub fn record_failure(&mut self, feed: &str, now: DateTime<Utc>) -> bool {
        let max = self.max_consecutive_failures;
        let cooldown = self.cooldown_secs;
        let health = self.feeds.entry(feed.to_string()).or_default();

        // An expired bench starts a fresh streak
        if let Some(until) = health.benched_until {
            if now >= until {
                health.benched_until = None;
                health.consecutive_failures = 0;
            }
        }

        health.consecutive_failures += 1;
        if health.consecutive_failures >= max && health.benched_until.is_none() {
            health.benched_until = Some(now + chrono::Duration::seconds(cooldown as i64));
            return true;
        }
        false
    }

    pub fn consecutive_failures(&self, feed: &str) -> u32 {
        self.feeds
            .get(feed)
            .map(|h| h.consecutive_failures)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coin(holders: u64, liquidity: f64) -> Memecoin {
        Memecoin {
            symbol: "WIF".to_string(),
            name: "dogwifhat".to_string(),
            price: 2.4,
            volume_24h: 1_500_000.0,
            liquidity,
            holders,
            social_mentions: 12,
            sentiment_score: Some(0.8),
        }
    }

    #[test]
    fn test_clean_token_is_low_risk() {
        let policy = RiskPolicy::default();
        let report = policy.assess(&coin(5_000, 250_000.0), Some(35.0), Some(2));
        assert_eq!(report.level, RiskLevel::Low);
        assert!(report.warnings.is_empty());
        assert!(!report.is_critical());
    }

    #[test]
    fn test_warning_escalation_ladder() {
        let policy = RiskPolicy::default();

        // One warning: low holders
        let report = policy.assess(&coin(50, 250_000.0), Some(35.0), Some(2));
        assert_eq!(report.level, RiskLevel::Medium);
        assert_eq!(report.warnings.len(), 1);

        // Two warnings: low holders + concentration
        let report = policy.assess(&coin(50, 250_000.0), Some(92.0), Some(2));
        assert_eq!(report.level, RiskLevel::High);
        assert_eq!(report.warnings.len(), 2);

        // Three warnings: add thin liquidity
        let report = policy.assess(&coin(50, 4_000.0), Some(92.0), Some(2));
        assert_eq!(report.level, RiskLevel::Critical);
        assert!(report.is_critical());
    }

    #[test]
    fn test_missing_onchain_data_triggers_nothing() {
        let policy = RiskPolicy::default();
        let report = policy.assess(&coin(5_000, 250_000.0), None, None);
        assert_eq!(report.level, RiskLevel::Low);
    }

    #[test]
    fn test_whale_activity_warning() {
        let policy = RiskPolicy::default();
        let report = policy.assess(&coin(5_000, 250_000.0), Some(30.0), Some(25));
        assert_eq!(report.level, RiskLevel::Medium);
        assert!(matches!(
            report.warnings[0],
            RiskWarning::WhaleActivity { tx_count: 25 }
        ));
        assert!(report.warning_lines()[0].contains("25 whale transactions"));
    }

    #[test]
    fn test_risk_level_ordering_and_scores() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(RiskLevel::Critical.score(), 100);
        assert!(RiskLevel::Low.score() < RiskLevel::Medium.score());
    }

    #[test]
    fn test_governor_consumes_slot_and_enforces_cooldown() {
        let mut governor = AlertGovernor::new(900, 20);
        let t0 = Utc::now();

        assert!(governor.try_acquire("WIF", t0).is_ok());
        assert_eq!(governor.alerts_today(), 1);

        // Same symbol inside the cooldown window
        let denied = governor.try_acquire("WIF", t0 + Duration::seconds(60));
        assert!(matches!(denied, Err(AlertSuppressed::Cooldown { .. })));

        // Other symbols are unaffected
        assert!(governor
            .try_acquire("BONK", t0 + Duration::seconds(60))
            .is_ok());

        // Past the cooldown the symbol frees up again
        assert!(governor
            .try_acquire("WIF", t0 + Duration::seconds(901))
            .is_ok());
        assert_eq!(governor.alerts_today(), 3);
    }

    #[test]
    fn test_governor_daily_budget() {
        let mut governor = AlertGovernor::new(0, 2);
        let t0 = Utc::now();

        assert!(governor.try_acquire("A", t0).is_ok());
        assert!(governor.try_acquire("B", t0).is_ok());

        let denied = governor.try_acquire("C", t0);
        assert_eq!(denied, Err(AlertSuppressed::BudgetExhausted { limit: 2 }));

        // Budget resets on the next UTC day
        assert!(governor.try_acquire("C", t0 + Duration::days(1)).is_ok());
        assert_eq!(governor.alerts_today(), 1);
    }

    #[test]
    fn test_breaker_benches_after_max_failures() {
        let mut breaker = FeedBreaker::new(3, 600);
        let t0 = Utc::now();

        assert!(!breaker.record_failure("twitter", t0));
        assert!(!breaker.record_failure("twitter", t0));
        assert!(!breaker.is_benched("twitter", t0));

        // Third consecutive failure trips it
        assert!(breaker.record_failure("twitter", t0));
        assert!(breaker.is_benched("twitter", t0));
        assert!(breaker.benched_remaining("twitter", t0).unwrap() <= 600);

        // Cooldown expiry puts it back
        assert!(!breaker.is_benched("twitter", t0 + Duration::seconds(601)));
    }

    #[test]
    fn test_breaker_rebenches_after_cooldown_expiry() {
        let mut breaker = FeedBreaker::new(2, 600);
        let t0 = Utc::now();

        breaker.record_failure("indexer", t0);
        assert!(breaker.record_failure("indexer", t0));
        assert!(breaker.is_benched("indexer", t0));

        // Post-expiry failures count toward a fresh streak
        let later = t0 + Duration::seconds(700);
        assert!(!breaker.record_failure("indexer", later));
        assert!(!breaker.is_benched("indexer", later));

        assert!(breaker.record_failure("indexer", later));
        assert!(breaker.is_benched("indexer", later));
    }

    #[test]
    fn test_breaker_success_resets_streak() {
        let mut breaker = FeedBreaker::new(3, 600);
        let t0 = Utc::now();

        breaker.record_failure("reddit", t0);
        breaker.record_failure("reddit", t0);
        breaker.record_success("reddit");
        assert_eq!(breaker.consecutive_failures("reddit"), 0);

        // Streak starts over
        assert!(!breaker.record_failure("reddit", t0));
        assert!(!breaker.is_benched("reddit", t0));
    }

    #[test]
    fn test_governor_survives_serde_round_trip() {
        let mut governor = AlertGovernor::new(900, 20);
        let t0 = Utc::now();
        governor.try_acquire("WIF", t0).unwrap();

        let json = serde_json::to_string(&governor).unwrap();
        let mut restored: AlertGovernor = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.alerts_today(), 1);
        let denied = restored.try_acquire("WIF", t0 + Duration::seconds(10));
        assert!(matches!(denied, Err(AlertSuppressed::Cooldown { .. })));
    }
}
