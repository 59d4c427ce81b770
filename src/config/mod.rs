//! Configuration module for stockcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Indicators, Model and Validation.

mod indicator_config;
mod model_config;
mod validation_config;

pub use indicator_config::IndicatorEnvConfig;
pub use model_config::ModelEnvConfig;
pub use validation_config::ValidationEnvConfig;

use crate::domain::errors::Result as PredictionResult;
use anyhow::{Context, Result};
use std::env;

/// Main configuration, aggregating the per-concern sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub indicators: IndicatorEnvConfig,
    pub model: ModelEnvConfig,
    pub validation: ValidationEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            indicators: IndicatorEnvConfig::from_env()?,
            model: ModelEnvConfig::from_env()?,
            validation: ValidationEnvConfig::from_env()?,
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> PredictionResult<()> {
        self.indicators.validate()?;
        self.model.validate()
    }
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}
