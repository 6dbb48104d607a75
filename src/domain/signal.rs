//! Trading Signals
//!
//! Actions produced by the analyzer and the alert payload built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment distance treated as one standard deviation when scoring
/// how decisively a threshold was crossed
const CONFIDENCE_SPREAD: f64 = 0.15;

/// Action recommended for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

impl TradeAction {
    /// Hold produces no alert
    pub fn is_actionable(&self) -> bool {
        !matches!(self, TradeAction::Hold)
    }
}

/// A non-hold signal with everything an alert needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub sentiment: f64,
    pub volume_24h: f64,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Creates an opportunity, deriving confidence from how far sentiment
    /// sits beyond the threshold that triggered the action
    pub fn new(
        symbol: impl Into<String>,
        action: TradeAction,
        price: f64,
        sentiment: f64,
        volume_24h: f64,
        sentiment_threshold: f64,
    ) -> Self {
        let confidence = Self::calculate_confidence(action, sentiment, sentiment_threshold);
        Self {
            symbol: symbol.into(),
            action,
            price,
            sentiment,
            volume_24h,
            confidence,
            generated_at: Utc::now(),
        }
    }

    /// Confidence from the signed threshold distance using the standard
    /// normal CDF: Φ(z) = 0.5 * (1 + erf(z / sqrt(2)))
    ///
    /// Buy measures how far sentiment rose above its threshold, sell how far
    /// it fell below. At the threshold itself confidence is 0.5; hold is 0.
    pub fn calculate_confidence(action: TradeAction, sentiment: f64, threshold: f64) -> f64 {
        use statrs::function::erf::erf;

        let z = match action {
            TradeAction::Buy => (sentiment - threshold) / CONFIDENCE_SPREAD,
            TradeAction::Sell => (threshold - sentiment) / CONFIDENCE_SPREAD,
            TradeAction::Hold => return 0.0,
        };
        let phi = 0.5 * (1.0 + erf(z / f64::sqrt(2.0)));
        phi.clamp(0.0, 1.0)
    }

    /// Validates the opportunity meets basic criteria
    pub fn validate(&self) -> Result<(), String> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(format!("Invalid price: {}", self.price));
        }

        if !self.sentiment.is_finite() {
            return Err("Sentiment cannot be NaN or infinite".to_string());
        }

        if self.confidence.is_nan() || self.confidence < 0.0 || self.confidence > 1.0 {
            return Err(format!("Invalid confidence value: {}", self.confidence));
        }

        Ok(())
    }
}

/// Render the alert message body for an opportunity
pub fn render_alert(opportunity: &Opportunity) -> String {
    format!(
        "🚨 TRADING ALERT 🚨\n\
         Symbol: {}\n\
         Action: {}\n\
         Price: ${:.4}\n\
         Sentiment: {:.4}\n\
         Confidence: {:.1}%\n\
         Time: {}",
        opportunity.symbol,
        opportunity.action,
        opportunity.price,
        opportunity.sentiment,
        opportunity.confidence * 100.0,
        opportunity.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
