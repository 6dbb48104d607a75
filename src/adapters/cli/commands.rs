//! CLI Argument Definitions
//!
//! Command-line surface for the insider bot. Uses clap derive macros;
//! the handlers live in main.rs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Insider Bot - Memecoin Monitoring and Alerting for Solana
#[derive(Parser, Debug)]
#[command(
    name = "insider-bot",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Memecoin monitoring and alerting bot for Solana",
    long_about = "Insider Bot watches memecoin market data and social chatter, scores \
                  sentiment against volume thresholds, and raises risk-gated alerts \
                  when a trading opportunity appears."
)]
pub struct CliApp {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Raise console logging to info
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Raise console logging to debug
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the monitoring loop
    Run(RunCmd),

    /// Analyze symbols once and print the reports
    Scan(ScanCmd),

    /// Score a piece of text with the sentiment engine
    Sentiment(SentimentCmd),

    /// Show the persisted bot state
    Status(StatusCmd),
}

/// Start monitoring loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Run a single monitoring cycle and exit
    #[arg(long)]
    pub once: bool,
}

/// One-shot analysis
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Symbols to analyze (e.g. BONK WIF)
    #[arg(value_name = "SYMBOL", required = true)]
    pub symbols: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}

/// Score text sentiment
#[derive(Parser, Debug)]
pub struct SentimentCmd {
    /// Text to score
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Show persisted state
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,
}
