//! Indicator configuration parsing from environment variables.
//!
//! This module handles loading the windows and spans used by the indicator engine.

use super::{parse_f64, parse_usize};
use crate::domain::errors::{PredictionError, Result as PredictionResult};
use anyhow::{Context, Result};
use std::env;

/// Indicator environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorEnvConfig {
    // Moving averages reported in the snapshot
    pub ma_windows: Vec<usize>,

    // RSI
    pub rsi_window: usize,

    // Bollinger Bands
    pub bb_window: usize,
    pub bb_multiplier: f64,

    // MACD
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,

    // Close volatility and volume average
    pub volatility_window: usize,
    pub volume_window: usize,
}

impl Default for IndicatorEnvConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20, 50],
            rsi_window: 14,
            bb_window: 20,
            bb_multiplier: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            volatility_window: 20,
            volume_window: 20,
        }
    }
}

impl IndicatorEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let ma_windows = match env::var("INDICATOR_MA_WINDOWS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to parse INDICATOR_MA_WINDOWS")?,
            Err(_) => defaults.ma_windows,
        };

        Ok(Self {
            ma_windows,
            rsi_window: parse_usize("INDICATOR_RSI_WINDOW", defaults.rsi_window)?,
            bb_window: parse_usize("INDICATOR_BB_WINDOW", defaults.bb_window)?,
            bb_multiplier: parse_f64("INDICATOR_BB_MULTIPLIER", defaults.bb_multiplier)?,
            macd_fast: parse_usize("INDICATOR_MACD_FAST", defaults.macd_fast)?,
            macd_slow: parse_usize("INDICATOR_MACD_SLOW", defaults.macd_slow)?,
            macd_signal: parse_usize("INDICATOR_MACD_SIGNAL", defaults.macd_signal)?,
            volatility_window: parse_usize(
                "INDICATOR_VOLATILITY_WINDOW",
                defaults.volatility_window,
            )?,
            volume_window: parse_usize("INDICATOR_VOLUME_WINDOW", defaults.volume_window)?,
        })
    }

    pub fn validate(&self) -> PredictionResult<()> {
        if self.ma_windows.is_empty() {
            return Err(PredictionError::invalid_config(
                "at least one moving-average window is required",
            ));
        }
        let windows = self.ma_windows.iter().copied().chain([
            self.rsi_window,
            self.bb_window,
            self.macd_fast,
            self.macd_slow,
            self.macd_signal,
            self.volatility_window,
            self.volume_window,
        ]);
        for window in windows {
            if window == 0 {
                return Err(PredictionError::invalid_config(
                    "indicator windows must be positive",
                ));
            }
        }
        // Sample standard deviation needs two observations.
        if self.bb_window < 2 || self.volatility_window < 2 {
            return Err(PredictionError::invalid_config(
                "Bollinger and volatility windows must be at least 2",
            ));
        }
        if !(self.bb_multiplier.is_finite() && self.bb_multiplier >= 0.0) {
            return Err(PredictionError::invalid_config(format!(
                "Bollinger multiplier must be a non-negative number, got {}",
                self.bb_multiplier
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_config_defaults() {
        let config = IndicatorEnvConfig::from_env().expect("Should parse with defaults");
        assert_eq!(config.ma_windows, vec![5, 10, 20, 50]);
        assert_eq!(config.rsi_window, 14);
        assert_eq!((config.macd_fast, config.macd_slow, config.macd_signal), (12, 26, 9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = IndicatorEnvConfig {
            rsi_window: 0,
            ..IndicatorEnvConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PredictionError::InvalidConfig { .. })
        ));
    }
}
