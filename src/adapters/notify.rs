//! Alert Delivery
//!
//! Telegram and Discord sinks plus the dispatcher that fans one alert
//! out to every configured channel. Every dispatched alert also lands
//! in the alert log via a `target: "alert"` record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::config::AlertsSection;
use crate::domain::risk::{RiskLevel, TokenRiskReport};
use crate::domain::signal::{render_alert, Opportunity};
use crate::ports::notify::{AlertSink, NotifyError};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Telegram bot sendMessage sink
pub struct TelegramSink {
    http: Client,
    token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(token: String, chat_id: String) -> Result<Self, NotifyError> {
        let http = client()?;
        Ok(Self {
            http,
            token,
            chat_id,
        })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn deliver(&self, _subject: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, self.token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": body,
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http {
                // Never log the URL with the bot token in it
                url: format!("{}/bot<redacted>/sendMessage", TELEGRAM_API_BASE),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: format!("{}/bot<redacted>/sendMessage", TELEGRAM_API_BASE),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn channel(&self) -> &str {
        "telegram"
    }
}

/// Discord webhook sink
pub struct DiscordSink {
    http: Client,
    webhook_url: String,
}

impl DiscordSink {
    pub fn new(webhook_url: String) -> Result<Self, NotifyError> {
        let http = client()?;
        Ok(Self { http, webhook_url })
    }
}

#[async_trait]
impl AlertSink for DiscordSink {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "content": format!("**{}**\n{}", subject, body),
        });

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http {
                url: self.webhook_url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: self.webhook_url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn channel(&self) -> &str {
        "discord"
    }
}

fn client() -> Result<Client, NotifyError> {
    Client::builder()
        .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
        .build()
        .map_err(|e| NotifyError::Http {
            url: String::new(),
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Fans one alert out to every configured channel
pub struct AlertDispatcher {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl AlertDispatcher {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    /// Build sinks from config. A channel needs both its enable flag and
    /// its credentials; anything else is skipped with a log line.
    pub fn from_config(cfg: &AlertsSection) -> Self {
        let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();

        if cfg.telegram_enabled {
            match (cfg.telegram_bot_token(), cfg.telegram_chat_id.is_empty()) {
                (Some(token), false) => match TelegramSink::new(token, cfg.telegram_chat_id.clone()) {
                    Ok(sink) => sinks.push(Box::new(sink)),
                    Err(err) => warn!("Telegram sink unavailable: {}", err),
                },
                _ => warn!("Telegram enabled but token or chat_id missing, skipping"),
            }
        }

        if cfg.discord_enabled {
            if cfg.discord_webhook_url.is_empty() {
                warn!("Discord enabled but webhook URL missing, skipping");
            } else {
                match DiscordSink::new(cfg.discord_webhook_url.clone()) {
                    Ok(sink) => sinks.push(Box::new(sink)),
                    Err(err) => warn!("Discord sink unavailable: {}", err),
                }
            }
        }

        if sinks.is_empty() {
            info!("No alert channels configured, alerts go to the log only");
        }

        Self { sinks }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Render and deliver one opportunity alert.
    ///
    /// High-risk warnings ride along in the message body. Sink failures
    /// are logged and never abort the remaining sinks.
    pub async fn dispatch(&self, opportunity: &Opportunity, risk: &TokenRiskReport) {
        let subject = format!(
            "{} {} @ ${:.4}",
            opportunity.action, opportunity.symbol, opportunity.price
        );
        let body = compose_body(opportunity, risk);

        warn!(
            target: "alert",
            symbol = %opportunity.symbol,
            action = %opportunity.action,
            confidence = opportunity.confidence,
            risk = ?risk.level,
            "{}",
            body
        );

        for sink in &self.sinks {
            match sink.deliver(&subject, &body).await {
                Ok(()) => info!(channel = sink.channel(), "Alert delivered"),
                Err(err) => warn!(channel = sink.channel(), "Alert delivery failed: {}", err),
            }
        }
    }
}

fn compose_body(opportunity: &Opportunity, risk: &TokenRiskReport) -> String {
    let mut body = render_alert(opportunity);
    if risk.level >= RiskLevel::High {
        for line in risk.warning_lines() {
            body.push('\n');
            body.push_str(&line);
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memecoin::Memecoin;
    use crate::domain::risk::RiskPolicy;
    use crate::domain::signal::TradeAction;
    use crate::ports::mocks::RecordingAlertSink;

    fn opportunity() -> Opportunity {
        Opportunity::new("WIF", TradeAction::Buy, 2.45, 0.82, 1_800_000.0, 0.7)
    }

    fn coin(holders: u64, liquidity: f64) -> Memecoin {
        Memecoin {
            symbol: "WIF".to_string(),
            name: "dogwifhat".to_string(),
            price: 2.45,
            volume_24h: 1_800_000.0,
            liquidity,
            holders,
            social_mentions: 12,
            sentiment_score: Some(0.82),
        }
    }

    #[test]
    fn test_low_risk_body_has_no_warnings() {
        let report = RiskPolicy::default().assess(&coin(50_000, 900_000.0), Some(20.0), Some(0));
        let body = compose_body(&opportunity(), &report);
        assert!(body.starts_with("🚨 TRADING ALERT 🚨"));
        assert!(!body.contains('⚠'));
    }

    #[test]
    fn test_high_risk_body_appends_warnings() {
        // Two triggered heuristics escalate to High
        let report = RiskPolicy::default().assess(&coin(10, 2_000.0), Some(20.0), Some(0));
        assert_eq!(report.level, RiskLevel::High);

        let body = compose_body(&opportunity(), &report);
        assert!(body.contains('⚠'));
        assert!(body.contains("holders"));
    }

    #[tokio::test]
    async fn test_dispatch_fans_out_to_all_sinks() {
        let first = RecordingAlertSink::new();
        let second = RecordingAlertSink::new();
        let dispatcher =
            AlertDispatcher::new(vec![Box::new(first.clone()), Box::new(second.clone())]);

        let report = RiskPolicy::default().assess(&coin(50_000, 900_000.0), Some(20.0), Some(0));
        dispatcher.dispatch(&opportunity(), &report).await;

        assert_eq!(first.get_delivered().len(), 1);
        assert_eq!(second.get_delivered().len(), 1);

        let (subject, body) = first.get_delivered()[0].clone();
        assert_eq!(subject, "BUY WIF @ $2.4500");
        assert!(body.contains("Symbol: WIF"));
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let healthy = RecordingAlertSink::new();
        let dispatcher = AlertDispatcher::new(vec![
            Box::new(RecordingAlertSink::failing()),
            Box::new(healthy.clone()),
        ]);

        let report = RiskPolicy::default().assess(&coin(50_000, 900_000.0), Some(20.0), Some(0));
        dispatcher.dispatch(&opportunity(), &report).await;

        assert_eq!(healthy.get_delivered().len(), 1);
    }

    #[test]
    fn test_from_config_with_nothing_enabled() {
        let dispatcher = AlertDispatcher::from_config(&AlertsSection::default());
        assert_eq!(dispatcher.sink_count(), 0);
    }

    #[test]
    fn test_telegram_sink_channel() {
        let sink = TelegramSink::new("123:abc".to_string(), "-100200300".to_string()).unwrap();
        assert_eq!(sink.channel(), "telegram");
    }

    #[test]
    fn test_discord_sink_channel() {
        let sink =
            DiscordSink::new("https://discord.com/api/webhooks/1/abc".to_string()).unwrap();
        assert_eq!(sink.channel(), "discord");
    }
}
