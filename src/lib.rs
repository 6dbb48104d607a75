#![allow(dead_code, unused_imports, unused_variables)]
//! Insider Bot - Memecoin Monitoring and Alerting Library
//!
//! Watches memecoin markets and social chatter on Solana and raises
//! risk-gated trading alerts.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Memecoin, Opportunity, RiskPolicy, FeedBreaker)
//! - `ports`: Trait abstractions (MarketDataSource, SocialFeed, AlertSink)
//! - `analysis`: Signal generation (indicators, sentiment, the analyzer)
//! - `adapters`: External implementations (DexScreener, Twitter, Reddit, Telegram, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: The monitoring bot and its persisted state
//! - `logging`: Console and file subscriber setup

pub mod domain;
pub mod ports;
pub mod analysis;
pub mod adapters;
pub mod config;
pub mod application;
pub mod logging;
