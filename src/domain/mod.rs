//! Domain Layer - Core business logic for the analysis bot
//!
//! This module contains pure domain types and logic with no external dependencies.
//! All external interactions happen through the ports layer.
//!
//! - `memecoin`: Token snapshot model and the tracked-coin registry
//! - `signal`: Trade actions, opportunities and alert rendering
//! - `risk`: Token risk heuristics, alert governor and feed circuit breaker

pub mod memecoin;
pub mod risk;
pub mod signal;

pub use memecoin::{Memecoin, MemecoinRegistry};
pub use risk::{
    AlertGovernor, AlertSuppressed, FeedBreaker, RiskLevel, RiskPolicy, RiskWarning,
    TokenRiskReport,
};
pub use signal::{render_alert, Opportunity, TradeAction};
