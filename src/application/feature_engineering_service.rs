use crate::config::ModelEnvConfig;
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::indicator_frame::IndicatorFrame;
use crate::domain::ml::feature_registry::feature_row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Relative threshold below which a column is treated as constant.
const ZERO_SCALE_TOLERANCE: f64 = 1e-12;

/// Regression design matrix: one row per eligible date, target = that date's close.
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sliding windows of scaled closes, each paired with the next scaled close.
#[derive(Debug, Clone)]
pub struct SequenceSet {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub scaler: MinMaxScaler,
}

/// Per-column z-score statistics (population standard deviation).
///
/// A constant column scales by 1 so it maps to zeros instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let (means, scales) = (0..width)
            .map(|j| {
                let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
                let mean = column.iter().mean();
                let std = column.iter().population_std_dev();
                let scale = if std.is_finite() && std > ZERO_SCALE_TOLERANCE * mean.abs().max(1.0)
                {
                    std
                } else {
                    1.0
                };
                (mean, scale)
            })
            .unzip();
        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((x, mean), scale)| (x - mean) / scale)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Min-max statistics mapping closes onto `[0, 1]`. A zero range scales by 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    pub fn fit(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        Self {
            min: if min.is_finite() { min } else { 0.0 },
            range: if range.is_finite() && range > 0.0 { range } else { 1.0 },
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range + self.min
    }
}

/// Turns an indicator frame into model inputs.
#[derive(Debug, Clone)]
pub struct FeatureEngineeringService {
    lookback: usize,
    train_split: f64,
}

impl FeatureEngineeringService {
    pub fn new(config: &ModelEnvConfig) -> Self {
        Self {
            lookback: config.lookback,
            train_split: config.train_split,
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Fails unless the frame has at least `lookback` eligible rows.
    pub fn ensure_eligible(&self, frame: &IndicatorFrame) -> Result<()> {
        let available = frame.eligible_rows();
        if available < self.lookback {
            return Err(PredictionError::InsufficientData {
                required: self.lookback,
                available,
            });
        }
        Ok(())
    }

    /// Boundary of the chronological train/test split: `floor(len * ratio)`.
    pub fn split_index(&self, len: usize) -> usize {
        ((len as f64 * self.train_split).floor() as usize).min(len)
    }

    /// Chronological split, earlier rows train, later rows test. Never shuffles.
    pub fn split<'a, T>(&self, items: &'a [T]) -> (&'a [T], &'a [T]) {
        items.split_at(self.split_index(items.len()))
    }

    pub fn regression_features(&self, frame: &IndicatorFrame) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::default();
        for i in frame.warmup()..frame.len() {
            if let Some(row) = feature_row(frame, i) {
                let bar = &frame.bars()[i];
                matrix.dates.push(bar.date);
                matrix.rows.push(row);
                matrix.targets.push(bar.close);
            }
        }
        matrix
    }

    /// Windows over closes scaled with statistics of the whole series.
    pub fn sequence_windows(&self, closes: &[f64]) -> SequenceSet {
        let scaler = MinMaxScaler::fit(closes);
        let scaled: Vec<f64> = closes.iter().map(|c| scaler.transform(*c)).collect();

        let mut inputs = Vec::new();
        let mut targets = Vec::new();
        for i in self.lookback..scaled.len() {
            inputs.push(scaled[i - self.lookback..i].to_vec());
            targets.push(scaled[i]);
        }
        SequenceSet {
            inputs,
            targets,
            scaler,
        }
    }

    /// The last `lookback` closes, scaled with previously fitted statistics.
    pub fn latest_window(&self, closes: &[f64], scaler: &MinMaxScaler) -> Option<Vec<f64>> {
        let start = closes.len().checked_sub(self.lookback)?;
        Some(closes[start..].iter().map(|c| scaler.transform(*c)).collect())
    }
}
