//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (DEX snapshots, onchain metrics)
//! - Social media feeds (recent posts per symbol)
//! - Alert delivery channels

pub mod market_data;
pub mod mocks;
pub mod notify;
pub mod social;

pub use market_data::{
    MarketDataError, MarketDataSource, MarketSnapshot, OnchainMetrics, OnchainSource,
};
pub use notify::{AlertSink, NotifyError};
pub use social::{SocialError, SocialFeed, SocialPost, SocialSource};
