//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, AlertsSection, AnalysisSection, BotConfig, ConfigError, GeneralSection,
    LoggingSection, MarketSection, RiskSection, SocialSection,
};
