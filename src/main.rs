//! Insider Bot - Memecoin Monitoring and Alerting for Solana
//!
//! Watches DEX market data and social chatter, scores sentiment against
//! volume, and raises risk-gated alerts when an opportunity appears.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use insider_bot::adapters::cli::{CliApp, Command, RunCmd, ScanCmd, SentimentCmd, StatusCmd};
use insider_bot::analysis::SentimentAnalyzer;
use insider_bot::application::{BotState, InsiderBot};
use insider_bot::config::load_config;
use insider_bot::domain::signal::render_alert;
use insider_bot::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Scan(cmd) => scan_command(cmd, app.verbose, app.debug).await,
        Command::Sentiment(cmd) => sentiment_command(cmd),
        Command::Status(cmd) => status_command(cmd),
    }
}

/// Handle run command
async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let _guards = init_logging(&config.logging, verbose, debug)
        .context("Failed to initialize logging")?;

    tracing::info!("Starting insider bot...");
    tracing::info!("Config: {}", cmd.config.display());

    let bot = InsiderBot::from_config(config).context("Failed to build bot")?;

    // Ctrl+C requests a graceful shutdown; state is persisted on the way out
    let handle = bot.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.shutdown().await;
    });

    if cmd.once {
        bot.run_once().await?;
    } else {
        bot.run().await?;
    }

    tracing::info!("Insider bot stopped");
    Ok(())
}

/// Handle scan command
async fn scan_command(cmd: ScanCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let _guards = init_logging(&config.logging, verbose, debug)
        .context("Failed to initialize logging")?;

    let bot = InsiderBot::from_config(config).context("Failed to build bot")?;
    let reports = bot.scan(&cmd.symbols).await?;

    println!("Scan results:");
    for report in &reports {
        println!("  {}", report.summary_line());
    }

    for report in &reports {
        if let Some(opportunity) = &report.opportunity {
            println!();
            println!("{}", render_alert(opportunity));
        }
    }

    Ok(())
}

/// Handle sentiment command
fn sentiment_command(cmd: SentimentCmd) -> Result<()> {
    let analyzer = SentimentAnalyzer::new();
    let score = analyzer
        .score_text(&cmd.text)
        .context("Failed to score text")?;

    println!("Text:     {}", cmd.text);
    println!("Compound: {:.4}", score.compound);
    println!("Label:    {:?}", score.label);

    Ok(())
}

/// Handle status command
fn status_command(cmd: StatusCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let path_str = config.general.expanded_state_path();
    let path = Path::new(&path_str);

    match BotState::load(path)? {
        Some(state) => {
            println!("Insider Bot - Persisted State");
            println!("  Watchlist:    {}", state.watchlist.join(", "));
            println!("  Alerts today: {}", state.governor.alerts_today());
            match state.last_cycle_at {
                Some(at) => println!("  Last cycle:   {}", at),
                None => println!("  Last cycle:   never"),
            }
            println!("  Saved at:     {}", state.saved_at);
        }
        None => {
            println!("No persisted state at {}", path.display());
            println!("The bot has not completed a cycle with this configuration yet.");
        }
    }

    Ok(())
}
