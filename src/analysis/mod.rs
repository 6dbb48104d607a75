//! Analysis layer: sentiment scoring, technical indicators and the
//! per-symbol market analyzer that fuses them.

pub mod analyzer;
pub mod indicators;
pub mod sentiment;

pub use analyzer::{AnalyzerError, MarketAnalyzer, PriceSeries, SymbolReport};
pub use indicators::{
    required_samples, summarize, BollingerBands, IndicatorError, IndicatorSummary, MacdOutput,
};
pub use sentiment::{SentimentAnalyzer, SentimentError, SentimentLabel, SentimentScore};
