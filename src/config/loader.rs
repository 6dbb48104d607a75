//! Configuration Loader
//!
//! Loads and validates bot configuration from TOML files. Secrets never live
//! in the file; they come from the environment (see the accessor methods).

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub general: GeneralSection,
    pub market: MarketSection,
    pub social: SocialSection,
    pub analysis: AnalysisSection,
    pub risk: RiskSection,
    pub alerts: AlertsSection,
    pub logging: LoggingSection,
}

/// General bot behavior section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// Symbols to monitor each cycle
    pub symbols: Vec<String>,
    /// Seconds between monitoring cycles
    pub monitor_interval_secs: u64,
    /// Where bot state is persisted between runs
    pub state_path: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            symbols: vec!["BONK".to_string(), "WIF".to_string()],
            monitor_interval_secs: 300,
            state_path: "data/bot_state.json".to_string(),
        }
    }
}

impl GeneralSection {
    /// State path with `~` expanded
    pub fn expanded_state_path(&self) -> String {
        shellexpand::tilde(&self.state_path).to_string()
    }
}

/// Market data sources section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketSection {
    /// DexScreener API base URL
    pub dexscreener_base_url: String,
    /// Indexer base URL for onchain token metrics
    pub onchain_base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// How long a cached snapshot stays fresh
    pub cache_ttl_secs: u64,
    /// Retries on transport errors and 429/5xx responses
    pub max_retries: u32,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self {
            dexscreener_base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            onchain_base_url: "https://indexer.insider.dev/v1".to_string(),
            request_timeout_secs: 10,
            cache_ttl_secs: 60,
            max_retries: 3,
        }
    }
}

impl MarketSection {
    /// Optional DexScreener API key from DEXSCREENER_API_KEY
    pub fn dexscreener_api_key(&self) -> Option<String> {
        env_secret("DEXSCREENER_API_KEY")
    }
}

/// Social feeds section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SocialSection {
    /// Twitter API v2 base URL
    pub twitter_base_url: String,
    /// Reddit base URL
    pub reddit_base_url: String,
    /// Tweets requested per symbol (API caps this at 100)
    pub twitter_max_results: u32,
    /// Reddit posts requested per symbol
    pub reddit_limit: u32,
    /// Disable to run on market data alone
    pub enabled: bool,
}

impl Default for SocialSection {
    fn default() -> Self {
        Self {
            twitter_base_url: "https://api.twitter.com/2".to_string(),
            reddit_base_url: "https://www.reddit.com".to_string(),
            twitter_max_results: 100,
            reddit_limit: 50,
            enabled: true,
        }
    }
}

impl SocialSection {
    /// Twitter bearer token from TWITTER_API_KEY
    pub fn twitter_bearer_token(&self) -> Option<String> {
        env_secret("TWITTER_API_KEY")
    }

    /// Reddit client token from REDDIT_API_KEY (search works without it)
    pub fn reddit_client_token(&self) -> Option<String> {
        env_secret("REDDIT_API_KEY")
    }
}

/// Analysis thresholds and indicator parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// Buy when sentiment exceeds this and volume confirms
    pub buy_sentiment_threshold: f64,
    /// 24h volume floor for a buy signal (USD)
    pub buy_volume_threshold: f64,
    /// Sell when sentiment drops below this and volume confirms
    pub sell_sentiment_threshold: f64,
    /// 24h volume ceiling for a sell signal (USD)
    pub sell_volume_threshold: f64,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    /// Price samples kept per symbol for indicators
    pub history_capacity: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            buy_sentiment_threshold: 0.7,
            buy_volume_threshold: 1_000_000.0,
            sell_sentiment_threshold: 0.3,
            sell_volume_threshold: 500_000.0,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            history_capacity: 500,
        }
    }
}

/// Risk gating section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    /// Minimum holder count before a token is considered established
    pub min_holders: u64,
    /// Maximum supply share of the top 10 holders (percent)
    pub max_top10_holder_pct: f64,
    /// Liquidity floor in USD
    pub min_liquidity_usd: f64,
    /// Per-symbol cooldown between alerts
    pub alert_cooldown_secs: u64,
    /// Hard cap on alerts per UTC day
    pub max_alerts_per_day: u32,
    /// Consecutive failures before a feed is benched
    pub max_consecutive_feed_failures: u32,
    /// How long a benched feed stays out
    pub feed_cooldown_secs: u64,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            min_holders: 100,
            max_top10_holder_pct: 70.0,
            min_liquidity_usd: 10_000.0,
            alert_cooldown_secs: 900,
            max_alerts_per_day: 20,
            max_consecutive_feed_failures: 5,
            feed_cooldown_secs: 600,
        }
    }
}

/// Alert delivery section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AlertsSection {
    /// Enable Telegram notifications
    pub telegram_enabled: bool,
    /// Telegram chat ID
    pub telegram_chat_id: String,
    /// Enable Discord webhook notifications
    pub discord_enabled: bool,
    /// Discord webhook URL
    pub discord_webhook_url: String,
}

impl AlertsSection {
    /// Telegram bot token from TELEGRAM_API_KEY
    pub fn telegram_bot_token(&self) -> Option<String> {
        env_secret("TELEGRAM_API_KEY")
    }
}

/// Logging section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Directory for rolling log files
    pub dir: String,
    /// Alert-only log file name inside `dir`
    pub alert_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            dir: "logs".to_string(),
            alert_file: "alerts.log".to_string(),
        }
    }
}

impl LoggingSection {
    /// Effective log level, INSIDER_LOG env var wins over the config value
    pub fn effective_level(&self) -> String {
        std::env::var("INSIDER_LOG").unwrap_or_else(|_| self.level.clone())
    }

    /// Log directory with `~` expanded
    pub fn expanded_dir(&self) -> String {
        shellexpand::tilde(&self.dir).to_string()
    }
}

/// Read a secret from the environment, ignoring empty and placeholder values
fn env_secret(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("changeme") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: BotConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl BotConfig {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate general section
        if self.general.symbols.is_empty() {
            return Err(ConfigError::ValidationError(
                "symbols cannot be empty".to_string(),
            ));
        }

        if self.general.monitor_interval_secs < 10 {
            return Err(ConfigError::ValidationError(format!(
                "monitor_interval_secs must be >= 10, got {}",
                self.general.monitor_interval_secs
            )));
        }

        // Validate analysis section
        if self.analysis.buy_sentiment_threshold <= 0.0
            || self.analysis.buy_sentiment_threshold > 1.0
        {
            return Err(ConfigError::ValidationError(format!(
                "buy_sentiment_threshold must be in (0, 1], got {}",
                self.analysis.buy_sentiment_threshold
            )));
        }

        if self.analysis.sell_sentiment_threshold >= self.analysis.buy_sentiment_threshold {
            return Err(ConfigError::ValidationError(format!(
                "sell_sentiment_threshold must be below buy_sentiment_threshold, got {} >= {}",
                self.analysis.sell_sentiment_threshold, self.analysis.buy_sentiment_threshold
            )));
        }

        if self.analysis.buy_volume_threshold <= 0.0 || self.analysis.sell_volume_threshold <= 0.0
        {
            return Err(ConfigError::ValidationError(format!(
                "volume thresholds must be > 0, got buy {} / sell {}",
                self.analysis.buy_volume_threshold, self.analysis.sell_volume_threshold
            )));
        }

        if self.analysis.rsi_period < 2 || self.analysis.bollinger_period < 2 {
            return Err(ConfigError::ValidationError(format!(
                "indicator periods must be >= 2, got rsi {} / bollinger {}",
                self.analysis.rsi_period, self.analysis.bollinger_period
            )));
        }

        if self.analysis.macd_fast >= self.analysis.macd_slow {
            return Err(ConfigError::ValidationError(format!(
                "macd_fast must be below macd_slow, got {} >= {}",
                self.analysis.macd_fast, self.analysis.macd_slow
            )));
        }

        if self.analysis.bollinger_std_dev <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "bollinger_std_dev must be > 0, got {}",
                self.analysis.bollinger_std_dev
            )));
        }

        if self.analysis.history_capacity < self.analysis.bollinger_period {
            return Err(ConfigError::ValidationError(format!(
                "history_capacity must hold at least one bollinger window, got {} < {}",
                self.analysis.history_capacity, self.analysis.bollinger_period
            )));
        }

        // Validate risk section
        if self.risk.max_top10_holder_pct <= 0.0 || self.risk.max_top10_holder_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_top10_holder_pct must be 0-100, got {}",
                self.risk.max_top10_holder_pct
            )));
        }

        if self.risk.max_alerts_per_day == 0 {
            return Err(ConfigError::ValidationError(
                "max_alerts_per_day must be > 0".to_string(),
            ));
        }

        if self.risk.max_consecutive_feed_failures == 0 {
            return Err(ConfigError::ValidationError(
                "max_consecutive_feed_failures must be > 0".to_string(),
            ));
        }

        // Validate market section
        if self.market.dexscreener_base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "dexscreener_base_url cannot be empty".to_string(),
            ));
        }

        if self.market.onchain_base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "onchain_base_url cannot be empty".to_string(),
            ));
        }

        // Validate logging
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "level must be one of {:?}, got {}",
                VALID_LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[general]
symbols = ["BONK", "WIF", "POPCAT"]
monitor_interval_secs = 300
state_path = "data/bot_state.json"

[market]
dexscreener_base_url = "https://api.dexscreener.com/latest/dex"
onchain_base_url = "https://indexer.insider.dev/v1"
request_timeout_secs = 10
cache_ttl_secs = 60
max_retries = 3

[social]
twitter_base_url = "https://api.twitter.com/2"
reddit_base_url = "https://www.reddit.com"
twitter_max_results = 100
reddit_limit = 50
enabled = true

[analysis]
buy_sentiment_threshold = 0.7
buy_volume_threshold = 1000000.0
sell_sentiment_threshold = 0.3
sell_volume_threshold = 500000.0
rsi_period = 14
macd_fast = 12
macd_slow = 26
macd_signal = 9
bollinger_period = 20
bollinger_std_dev = 2.0
history_capacity = 500

[risk]
min_holders = 100
max_top10_holder_pct = 70.0
min_liquidity_usd = 10000.0
alert_cooldown_secs = 900
max_alerts_per_day = 20
max_consecutive_feed_failures = 5
feed_cooldown_secs = 600

[alerts]
telegram_enabled = false
telegram_chat_id = ""
discord_enabled = false
discord_webhook_url = ""

[logging]
level = "debug"
dir = "logs"
alert_file = "alerts.log"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.general.symbols.len(), 3);
        assert_eq!(config.general.monitor_interval_secs, 300);
        assert_eq!(config.analysis.buy_sentiment_threshold, 0.7);
        assert_eq!(config.analysis.sell_volume_threshold, 500_000.0);
        assert_eq!(config.risk.min_holders, 100);
        assert_eq!(config.logging.alert_file, "alerts.log");
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = BotConfig::default();
        assert_eq!(config.general.monitor_interval_secs, 300);
        assert_eq!(config.analysis.buy_sentiment_threshold, 0.7);
        assert_eq!(config.analysis.buy_volume_threshold, 1_000_000.0);
        assert_eq!(config.analysis.sell_sentiment_threshold, 0.3);
        assert_eq!(config.analysis.sell_volume_threshold, 500_000.0);
        assert_eq!(config.analysis.rsi_period, 14);
        assert_eq!(config.analysis.bollinger_period, 20);
        assert_eq!(config.risk.max_top10_holder_pct, 70.0);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let partial = r#"
[general]
symbols = ["BONK"]

[analysis]
buy_sentiment_threshold = 0.8
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(partial.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.general.symbols, vec!["BONK".to_string()]);
        assert_eq!(config.general.monitor_interval_secs, 300);
        assert_eq!(config.analysis.buy_sentiment_threshold, 0.8);
        assert_eq!(config.analysis.macd_slow, 26);
    }

    #[test]
    fn test_empty_symbols_rejected() {
        let invalid = create_valid_config().replace(
            r#"symbols = ["BONK", "WIF", "POPCAT"]"#,
            "symbols = []",
        );
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_inverted_sentiment_thresholds_rejected() {
        let invalid = create_valid_config()
            .replace("sell_sentiment_threshold = 0.3", "sell_sentiment_threshold = 0.9");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let invalid = create_valid_config().replace(r#"level = "debug""#, r#"level = "loud""#);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_macd_periods_rejected() {
        let invalid = create_valid_config().replace("macd_fast = 12", "macd_fast = 30");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(invalid.as_bytes()).unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_env_secret_ignores_placeholders() {
        std::env::set_var("INSIDER_TEST_SECRET_A", "  ");
        assert!(env_secret("INSIDER_TEST_SECRET_A").is_none());

        std::env::set_var("INSIDER_TEST_SECRET_B", "changeme");
        assert!(env_secret("INSIDER_TEST_SECRET_B").is_none());

        std::env::set_var("INSIDER_TEST_SECRET_C", "abc123");
        assert_eq!(env_secret("INSIDER_TEST_SECRET_C"), Some("abc123".to_string()));

        std::env::remove_var("INSIDER_TEST_SECRET_A");
        std::env::remove_var("INSIDER_TEST_SECRET_B");
        std::env::remove_var("INSIDER_TEST_SECRET_C");
    }

    #[test]
    fn test_effective_level_env_override() {
        let logging = LoggingSection::default();
        std::env::remove_var("INSIDER_LOG");
        assert_eq!(logging.effective_level(), "debug");

        std::env::set_var("INSIDER_LOG", "warn");
        assert_eq!(logging.effective_level(), "warn");
        std::env::remove_var("INSIDER_LOG");
    }
}
