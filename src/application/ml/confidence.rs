use crate::application::market_data::statistical_features::volatility_ratio;
use crate::config::ModelEnvConfig;
use crate::domain::ml::prediction::ModelKind;

/// Bounds and lookback of the confidence heuristic for one model kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
    pub floor: f64,
    pub cap: f64,
    pub window: usize,
}

impl ConfidencePolicy {
    pub fn for_kind(kind: ModelKind, config: &ModelEnvConfig) -> Self {
        let cap = match kind {
            ModelKind::Regression => config.regression_confidence_cap,
            ModelKind::Sequence => config.sequence_confidence_cap,
        };
        Self {
            floor: config.confidence_floor,
            cap,
            window: config.confidence_window,
        }
    }

    /// Volatility ratio of the last `window` closes.
    pub fn recent_volatility(&self, closes: &[f64]) -> f64 {
        let start = closes.len().saturating_sub(self.window);
        volatility_ratio(&closes[start..])
    }

    pub fn clamp(&self, base: f64) -> f64 {
        clamp_confidence(base, self.floor, self.cap)
    }
}

/// `max(floor, min(cap, base))`; a non-finite base maps to the floor.
pub fn clamp_confidence(base: f64, floor: f64, cap: f64) -> f64 {
    if !base.is_finite() {
        return floor;
    }
    base.min(cap).max(floor)
}
