//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - DexScreener: market snapshots from DEX pair data
//! - Onchain: holder and whale metrics from a token indexer
//! - Twitter / Reddit: social post collection
//! - Notify: Telegram and Discord alert delivery
//! - CLI: command-line argument definitions

pub mod cli;
pub mod dexscreener;
pub mod notify;
pub mod onchain;
pub mod reddit;
pub mod twitter;

pub use cli::CliApp;
pub use dexscreener::DexScreenerClient;
pub use notify::{AlertDispatcher, DiscordSink, TelegramSink};
pub use onchain::IndexerClient;
pub use reddit::RedditFeed;
pub use twitter::TwitterFeed;
