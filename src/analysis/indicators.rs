//! Technical Indicators
//!
//! RSI (Wilder smoothing), EMA, MACD and Bollinger bands over close prices.
//! Series too short for an indicator produce a typed error instead of NaN.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AnalysisSection;

/// Errors that can occur during indicator calculation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    /// Series too short for the requested indicator
    #[error("Insufficient price data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Series contains no usable values
    #[error("Price series contains no finite values")]
    NonFinite,
}

/// MACD line values at the end of the series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

/// Bollinger band values at the end of the series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// All indicators computed for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub rsi: f64,
    pub macd: MacdOutput,
    pub bollinger: BollingerBands,
}

/// Relative Strength Index with Wilder smoothing.
///
/// Needs `period + 1` closes (one extra for the first delta). A window of
/// pure gains reads 100, pure losses 0, a flat series 50.
pub fn rsi(closes: &[f64], period: usize) -> Result<f64, IndicatorError> {
    let required = period + 1;
    if closes.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: closes.len(),
        });
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for window in closes[..=period].windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss += -delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    // Wilder smoothing over the remainder of the series
    for window in closes[period..].windows(2) {
        let delta = window[1] - window[0];
        let (gain, loss) = if delta > 0.0 {
            (delta, 0.0)
        } else {
            (0.0, -delta)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 && avg_gain == 0.0 {
        return Ok(50.0);
    }
    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

/// Exponential moving average series, seeded with the first value.
///
/// Each element i holds the EMA of the series up to i.
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut current = values[0];
    out.push(current);
    for value in &values[1..] {
        current = value * k + current * (1.0 - k);
        out.push(current);
    }
    out
}

/// Final EMA value of the series
pub fn ema(values: &[f64], period: usize) -> Result<f64, IndicatorError> {
    let required = period.max(1);
    if values.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: values.len(),
        });
    }
    Ok(*ema_series(values, period).last().unwrap_or(&f64::NAN))
}

/// MACD: fast EMA minus slow EMA, with a signal EMA over the MACD line.
///
/// Needs at least `slow` closes so the slow EMA has settled.
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdOutput, IndicatorError> {
    if closes.len() < slow {
        return Err(IndicatorError::InsufficientData {
            required: slow,
            available: closes.len(),
        });
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_series = ema_series(&macd_line, signal);

    let macd_last = macd_line[macd_line.len() - 1];
    let signal_last = signal_series[signal_series.len() - 1];

    Ok(MacdOutput {
        macd_line: macd_last,
        signal_line: signal_last,
        histogram: macd_last - signal_last,
    })
}

/// Bollinger bands over the last `period` closes using population
/// standard deviation.
pub fn bollinger(
    closes: &[f64],
    period: usize,
    std_dev: f64,
) -> Result<BollingerBands, IndicatorError> {
    if closes.len() < period {
        return Err(IndicatorError::InsufficientData {
            required: period,
            available: closes.len(),
        });
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|c| (c - middle).powi(2))
        .sum::<f64>()
        / period as f64;
    let band = std_dev * variance.sqrt();

    Ok(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

/// Replace non-finite samples by carrying the previous value forward,
/// then back-filling anything left at the head.
pub fn fill_gaps(series: &mut [f64]) -> Result<(), IndicatorError> {
    if !series.iter().any(|v| v.is_finite()) {
        return Err(IndicatorError::NonFinite);
    }

    let mut last_finite: Option<f64> = None;
    for value in series.iter_mut() {
        if value.is_finite() {
            last_finite = Some(*value);
        } else if let Some(fill) = last_finite {
            *value = fill;
        }
    }

    let mut next_finite: Option<f64> = None;
    for value in series.iter_mut().rev() {
        if value.is_finite() {
            next_finite = Some(*value);
        } else if let Some(fill) = next_finite {
            *value = fill;
        }
    }

    Ok(())
}

/// Smallest series length that lets every configured indicator settle
pub fn required_samples(cfg: &AnalysisSection) -> usize {
    (cfg.rsi_period + 1)
        .max(cfg.macd_slow)
        .max(cfg.bollinger_period)
}

/// Compute every configured indicator over the series
pub fn summarize(closes: &[f64], cfg: &AnalysisSection) -> Result<IndicatorSummary, IndicatorError> {
    let mut series = closes.to_vec();
    fill_gaps(&mut series)?;

    Ok(IndicatorSummary {
        rsi: rsi(&series, cfg.rsi_period)?,
        macd: macd(&series, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal)?,
        bollinger: bollinger(&series, cfg.bollinger_period, cfg.bollinger_std_dev)?,
    })
}
