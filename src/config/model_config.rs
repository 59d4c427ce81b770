//! Model configuration parsing from environment variables.
//!
//! Lookback, split ratio, confidence bounds and sequence-model training knobs.

use super::{parse_f64, parse_usize};
use crate::domain::errors::{PredictionError, Result as PredictionResult};
use anyhow::Result;

/// Model environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub lookback: usize,
    pub train_split: f64,

    // Confidence scoring
    pub confidence_floor: f64,
    pub regression_confidence_cap: f64,
    pub sequence_confidence_cap: f64,
    pub confidence_window: usize,

    // Sequence model training
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            lookback: 60,
            train_split: 0.8,
            confidence_floor: 0.5,
            regression_confidence_cap: 0.95,
            sequence_confidence_cap: 1.0,
            confidence_window: 30,
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.01,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            lookback: parse_usize("MODEL_LOOKBACK", defaults.lookback)?,
            train_split: parse_f64("MODEL_TRAIN_SPLIT", defaults.train_split)?,
            confidence_floor: parse_f64("MODEL_CONFIDENCE_FLOOR", defaults.confidence_floor)?,
            regression_confidence_cap: parse_f64(
                "MODEL_REGRESSION_CONFIDENCE_CAP",
                defaults.regression_confidence_cap,
            )?,
            sequence_confidence_cap: parse_f64(
                "MODEL_SEQUENCE_CONFIDENCE_CAP",
                defaults.sequence_confidence_cap,
            )?,
            confidence_window: parse_usize("MODEL_CONFIDENCE_WINDOW", defaults.confidence_window)?,
            epochs: parse_usize("MODEL_EPOCHS", defaults.epochs)?,
            batch_size: parse_usize("MODEL_BATCH_SIZE", defaults.batch_size)?,
            learning_rate: parse_f64("MODEL_LEARNING_RATE", defaults.learning_rate)?,
        })
    }

    pub fn validate(&self) -> PredictionResult<()> {
        if self.lookback == 0 {
            return Err(PredictionError::invalid_config("lookback must be positive"));
        }
        if !(self.train_split > 0.0 && self.train_split < 1.0) {
            return Err(PredictionError::invalid_config(format!(
                "train split must lie in (0, 1), got {}",
                self.train_split
            )));
        }
        let bounds = [
            self.confidence_floor,
            self.regression_confidence_cap,
            self.sequence_confidence_cap,
        ];
        if bounds.iter().any(|b| !(0.0..=1.0).contains(b)) {
            return Err(PredictionError::invalid_config(
                "confidence bounds must lie in [0, 1]",
            ));
        }
        if self.regression_confidence_cap < self.confidence_floor
            || self.sequence_confidence_cap < self.confidence_floor
        {
            return Err(PredictionError::invalid_config(
                "confidence caps must not be below the floor",
            ));
        }
        if self.confidence_window == 0 || self.batch_size == 0 {
            return Err(PredictionError::invalid_config(
                "confidence window and batch size must be positive",
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PredictionError::invalid_config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}
