//! CLI Adapter
//!
//! Command-line interface for the insider bot.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, RunCmd, ScanCmd, SentimentCmd, StatusCmd};
