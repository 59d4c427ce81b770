use super::statistical_features::{
    percent_change, rolling_mean, rolling_rsi, rolling_sample_std,
};
use crate::config::IndicatorEnvConfig;
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::indicator_frame::{Column, IndicatorFrame};
use crate::domain::market::series::OhlcvSeries;
use crate::domain::ml::feature_registry::REGRESSION_MA_WINDOWS;
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::MovingAverageConvergenceDivergence;

/// Longest lookback of the five-period price change feature.
const PRICE_CHANGE_LONG: usize = 5;

/// Computes every indicator column for a series.
///
/// Pure: the input series is never modified and no state survives between calls,
/// so one engine can serve any number of series concurrently.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorEnvConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorEnvConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IndicatorEnvConfig {
        &self.config
    }

    /// Rows excluded from training and prediction: the longest window minus one.
    pub fn warmup(&self) -> usize {
        let c = &self.config;
        let ma_longest = self
            .ma_windows()
            .into_iter()
            .max()
            .unwrap_or(1);
        [
            ma_longest - 1,
            c.rsi_window,
            c.bb_window - 1,
            c.volatility_window - 1,
            c.volume_window - 1,
            PRICE_CHANGE_LONG,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub fn compute(&self, series: &OhlcvSeries) -> Result<IndicatorFrame> {
        let c = &self.config;
        let closes = series.closes();
        let volumes = series.volumes();

        let moving_averages: BTreeMap<usize, Column> = self
            .ma_windows()
            .into_iter()
            .map(|w| (w, rolling_mean(&closes, w)))
            .collect();

        let bb_middle = rolling_mean(&closes, c.bb_window);
        let bb_std = rolling_sample_std(&closes, c.bb_window);
        let (bb_upper, bb_lower): (Column, Column) = bb_middle
            .iter()
            .zip(&bb_std)
            .map(|(mid, std)| match (mid, std) {
                (Some(m), Some(s)) => (
                    Some(m + c.bb_multiplier * s),
                    Some(m - c.bb_multiplier * s),
                ),
                _ => (None, None),
            })
            .unzip();

        let (macd, signal) = self.macd(&closes)?;

        let volume_ma = rolling_mean(&volumes, c.volume_window);
        let volume_ratio = volumes
            .iter()
            .zip(&volume_ma)
            .map(|(v, ma)| {
                ma.map(|ma| if ma > 0.0 { v / ma } else { 1.0 })
            })
            .collect();

        let hl_ratio = series
            .bars()
            .iter()
            .map(|b| (b.low > 0.0).then(|| b.high / b.low))
            .collect();

        Ok(IndicatorFrame {
            bars: series.bars().to_vec(),
            moving_averages,
            reported_windows: c.ma_windows.clone(),
            rsi: rolling_rsi(&closes, c.rsi_window),
            bb_upper,
            bb_lower,
            macd,
            signal,
            volatility: rolling_sample_std(&closes, c.volatility_window),
            volume_ma,
            volume_ratio,
            hl_ratio,
            price_change: percent_change(&closes, 1),
            price_change_5: percent_change(&closes, PRICE_CHANGE_LONG),
            warmup: self.warmup(),
        })
    }

    /// MACD line and its signal, recursive EMAs seeded with the first close.
    fn macd(&self, closes: &[f64]) -> Result<(Column, Column)> {
        let c = &self.config;
        let mut indicator =
            MovingAverageConvergenceDivergence::new(c.macd_fast, c.macd_slow, c.macd_signal)
                .map_err(|e| PredictionError::invalid_config(format!("MACD: {:?}", e)))?;

        Ok(closes
            .iter()
            .map(|&close| {
                let out = indicator.next(close);
                (Some(out.macd), Some(out.signal))
            })
            .unzip())
    }

    /// Reported windows plus the ones regression features depend on.
    fn ma_windows(&self) -> Vec<usize> {
        let mut windows: Vec<usize> = self
            .config
            .ma_windows
            .iter()
            .copied()
            .chain(REGRESSION_MA_WINDOWS)
            .collect();
        windows.sort_unstable();
        windows.dedup();
        windows
    }
}
