//! Logging Setup
//!
//! Console output for the operator plus two files under the configured log
//! directory: a daily-rolling full bot log and an alert-only audit file fed
//! by events with `target = "alert"`.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSection;

/// Events with this target land in the alert audit file
pub const ALERT_TARGET: &str = "alert";

/// File name of the daily-rolling bot log
pub const BOT_LOG_PREFIX: &str = "insider-bot.log";

/// Keeps the non-blocking file writers flushing. Hold until process exit.
pub struct LogGuards {
    _bot: WorkerGuard,
    _alerts: WorkerGuard,
}

/// Install the global subscriber. Console verbosity follows the CLI flags,
/// file verbosity follows the config (INSIDER_LOG overrides it).
pub fn init_logging(
    cfg: &LoggingSection,
    verbose: bool,
    debug: bool,
) -> io::Result<LogGuards> {
    let dir = cfg.expanded_dir();
    std::fs::create_dir_all(&dir)?;

    let console_filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    let console = fmt::layer()
        .with_target(false)
        .with_filter(console_filter);

    let file_filter = EnvFilter::try_new(cfg.effective_level())
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    let bot_file = tracing_appender::rolling::daily(&dir, BOT_LOG_PREFIX);
    let (bot_writer, bot_guard) = tracing_appender::non_blocking(bot_file);
    let bot_layer = fmt::layer()
        .with_writer(bot_writer)
        .with_ansi(false)
        .with_filter(file_filter);

    // Alerts land in their own file regardless of the configured level
    let alert_file = tracing_appender::rolling::never(&dir, &cfg.alert_file);
    let (alert_writer, alert_guard) = tracing_appender::non_blocking(alert_file);
    let alert_layer = fmt::layer()
        .with_writer(alert_writer)
        .with_ansi(false)
        .with_filter(filter_fn(|meta| meta.target() == ALERT_TARGET));

    tracing_subscriber::registry()
        .with(console)
        .with(bot_layer)
        .with(alert_layer)
        .init();

    Ok(LogGuards {
        _bot: bot_guard,
        _alerts: alert_guard,
    })
}
