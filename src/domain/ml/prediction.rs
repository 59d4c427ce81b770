use crate::domain::errors::PredictionError;
use crate::domain::market::snapshot::IndicatorSnapshot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Predictor variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Regression,
    Sequence,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Regression => "Linear Regression",
            ModelKind::Sequence => "Sequence Window",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Regression => write!(f, "regression"),
            ModelKind::Sequence => write!(f, "sequence"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regression" | "linear" => Ok(ModelKind::Regression),
            "sequence" | "lstm" => Ok(ModelKind::Sequence),
            _ => Err(PredictionError::invalid_config(format!(
                "Invalid model: {}. Must be 'regression' or 'sequence'",
                s
            ))),
        }
    }
}

/// Next-period forecast with its confidence and the indicator state it was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub confidence: f64,
    pub current_price: f64,
    /// Day the prediction was produced.
    pub prediction_date: NaiveDate,
    /// Date of the last bar the prediction used.
    pub last_observation: NaiveDate,
    pub indicator_snapshot: IndicatorSnapshot,
    pub model_label: String,
    pub model_kind: ModelKind,
    /// In-sample fit quality, regression only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_score: Option<f64>,
}
