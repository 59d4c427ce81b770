use thiserror::Error;

/// Errors raised by the indicator and forecasting pipeline.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("Found {count} rows with negative prices (allowed: {allowed})")]
    Integrity { count: usize, allowed: usize },

    #[error("Insufficient data: need at least {required} eligible rows, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Numeric error in {context}: {reason}")]
    Numeric { context: String, reason: String },

    #[error("Model training failed: {reason}")]
    Training { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PredictionError {
    pub fn training(reason: impl std::fmt::Display) -> Self {
        PredictionError::Training {
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        PredictionError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;
