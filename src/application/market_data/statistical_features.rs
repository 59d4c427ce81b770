//! Rolling statistics over price and volume series
//!
//! This module provides the window primitives the indicator engine is built from:
//! - Trailing means and sample standard deviations
//! - Percent changes and the simple-average RSI
//! - Relative volatility of a recent window
//! - Descriptive statistics of a whole series

use crate::domain::market::indicator_frame::Column;
use crate::domain::market::series::OhlcvSeries;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Trailing arithmetic mean over `window` observations.
///
/// # Returns
/// One entry per input; `None` for the first `window - 1` rows.
pub fn rolling_mean(values: &[f64], window: usize) -> Column {
    let Ok(mut sma) = SimpleMovingAverage::new(window) else {
        return vec![None; values.len()];
    };
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let avg = sma.next(v);
            (i + 1 >= window).then_some(avg)
        })
        .collect()
}

/// Trailing sample standard deviation (n - 1 denominator).
///
/// # Returns
/// One entry per input; `None` for the first `window - 1` rows and for windows below 2.
pub fn rolling_sample_std(values: &[f64], window: usize) -> Column {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if window < 2 || i + 1 < window {
                return None;
            }
            let std = values[i + 1 - window..=i].iter().std_dev();
            std.is_finite().then_some(std.max(0.0))
        })
        .collect()
}

/// Percent change against the value `periods` rows earlier.
///
/// Undefined when the base value is zero or not yet available.
pub fn percent_change(values: &[f64], periods: usize) -> Column {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if periods == 0 || i < periods {
                return None;
            }
            let base = values[i - periods];
            (base != 0.0).then(|| (v - base) / base)
        })
        .collect()
}

/// Relative Strength Index with simple averages of gains and losses.
///
/// Uses the last `window` close-to-close deltas, so the first defined row is
/// `window`. A window without losses saturates at 100, flat windows included.
pub fn rolling_rsi(closes: &[f64], window: usize) -> Column {
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    (0..closes.len())
        .map(|i| {
            if window == 0 || i < window {
                return None;
            }
            let recent = &deltas[i - window..i];
            let gain = recent.iter().map(|d| d.max(0.0)).sum::<f64>() / window as f64;
            let loss = recent.iter().map(|d| (-d).max(0.0)).sum::<f64>() / window as f64;

            if loss == 0.0 {
                return Some(100.0);
            }
            let rs = gain / loss;
            Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
        })
        .collect()
}

/// Population standard deviation of `closes` divided by their mean.
///
/// Saturates to 1.0 when the window is empty, the mean is not positive, or
/// the result is not finite.
pub fn volatility_ratio(closes: &[f64]) -> f64 {
    if closes.is_empty() {
        return 1.0;
    }
    let mean = closes.iter().mean();
    if !(mean.is_finite() && mean > 0.0) {
        return 1.0;
    }
    let ratio = closes.iter().population_std_dev() / mean;
    if ratio.is_finite() { ratio } else { 1.0 }
}

/// Descriptive statistics of a daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub total_days: usize,
    pub current_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    pub average_price: f64,
    /// Sample standard deviation of close; absent below two rows.
    pub price_volatility: Option<f64>,
    pub total_volume: u64,
    pub average_volume: f64,
    pub price_change_1d: Option<f64>,
    pub price_change_1w: Option<f64>,
    pub price_change_1m: Option<f64>,
}

/// Summarizes a series; `None` when it is empty.
pub fn summarize(series: &OhlcvSeries) -> Option<SeriesStatistics> {
    let last = series.last()?;
    let closes = series.closes();
    let bars = series.bars();

    let highest_price = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest_price = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let total_volume: u64 = bars.iter().map(|b| b.volume).sum();
    let volatility = closes.iter().std_dev();
    let latest_change = |periods: usize| percent_change(&closes, periods).last().copied().flatten();

    Some(SeriesStatistics {
        total_days: bars.len(),
        current_price: last.close,
        highest_price,
        lowest_price,
        average_price: closes.iter().mean(),
        price_volatility: volatility.is_finite().then_some(volatility),
        total_volume,
        average_volume: total_volume as f64 / bars.len() as f64,
        price_change_1d: latest_change(1),
        price_change_1w: latest_change(7),
        price_change_1m: latest_change(30),
    })
}
