use super::predictor::{Estimator, Forecast, Predictor};
use crate::application::feature_engineering_service::{FeatureEngineeringService, MinMaxScaler};
use crate::config::{Config, ModelEnvConfig};
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::indicator_frame::IndicatorFrame;
use crate::domain::ml::metrics::{FitMetrics, mean_squared_error};
use crate::domain::ml::prediction::ModelKind;
use ndarray::{Array1, Array2, ArrayView2, s};
use tracing::debug;

/// Linear model over a window of `lookback` scaled closes, fit by mini-batch
/// gradient descent.
///
/// Weights start as a persistence forecast (next close = last close) and
/// batches are visited in chronological order.
pub struct SequenceEstimator {
    features: FeatureEngineeringService,
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
}

/// Window weights plus the scaler fitted at training time.
pub struct FittedSequence {
    scaler: MinMaxScaler,
    weights: Array1<f64>,
    bias: f64,
}

impl FittedSequence {
    fn predict_scaled(&self, inputs: ArrayView2<f64>) -> Array1<f64> {
        inputs.dot(&self.weights) + self.bias
    }
}

impl SequenceEstimator {
    pub fn new(config: &ModelEnvConfig) -> Self {
        Self {
            features: FeatureEngineeringService::new(config),
            epochs: config.epochs,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
        }
    }

    fn to_matrix(&self, rows: &[Vec<f64>]) -> Result<Array2<f64>> {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((rows.len(), self.features.lookback()), flat)
            .map_err(PredictionError::training)
    }

    fn descend(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array1<f64>, f64)> {
        let lookback = self.features.lookback();
        let mut weights = Array1::<f64>::zeros(lookback);
        weights[lookback - 1] = 1.0;
        let mut bias = 0.0;

        let n = x.nrows();
        for epoch in 0..self.epochs {
            for start in (0..n).step_by(self.batch_size) {
                let end = (start + self.batch_size).min(n);
                let xb = x.slice(s![start..end, ..]);
                let yb = y.slice(s![start..end]);
                let m = (end - start) as f64;

                let err = xb.dot(&weights) + bias - &yb;
                let grad_w = xb.t().dot(&err) * (2.0 / m);
                let grad_b = err.sum() * 2.0 / m;

                weights.scaled_add(-self.learning_rate, &grad_w);
                bias -= self.learning_rate * grad_b;
            }

            if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                return Err(PredictionError::training(format!(
                    "weights diverged at epoch {}",
                    epoch + 1
                )));
            }
            if (epoch + 1) % 10 == 0 {
                let loss = (x.dot(&weights) + bias - y).mapv(|e| e * e).mean().unwrap_or(0.0);
                debug!("Sequence epoch {}/{}: loss={:.6}", epoch + 1, self.epochs, loss);
            }
        }
        Ok((weights, bias))
    }
}

impl Estimator for SequenceEstimator {
    type Fitted = FittedSequence;

    fn kind(&self) -> ModelKind {
        ModelKind::Sequence
    }

    fn fit(&self, frame: &IndicatorFrame) -> Result<(FittedSequence, FitMetrics)> {
        let closes = frame.closes();
        let set = self.features.sequence_windows(&closes);
        let (train_x, test_x) = self.features.split(&set.inputs);
        let (train_y, test_y) = self.features.split(&set.targets);
        if train_x.is_empty() {
            return Err(PredictionError::training(format!(
                "{} closes give no training window of length {}",
                closes.len(),
                self.features.lookback()
            )));
        }

        let x = self.to_matrix(train_x)?;
        let y = Array1::from(train_y.to_vec());
        let (weights, bias) = self.descend(&x, &y)?;
        let fitted = FittedSequence {
            scaler: set.scaler,
            weights,
            bias,
        };

        let (eval_x, eval_y) = if test_x.is_empty() {
            (train_x, train_y)
        } else {
            (test_x, test_y)
        };
        let predictions = fitted.predict_scaled(self.to_matrix(eval_x)?.view());
        let mse = mean_squared_error(eval_y, &predictions.to_vec());

        let metrics = FitMetrics {
            mse,
            rmse: mse.sqrt(),
            r2: None,
            train_rows: train_x.len(),
            test_rows: test_x.len(),
        };
        Ok((fitted, metrics))
    }

    fn forecast(&self, model: &FittedSequence, frame: &IndicatorFrame) -> Result<Forecast> {
        let closes = frame.closes();
        let window = self
            .features
            .latest_window(&closes, &model.scaler)
            .ok_or(PredictionError::InsufficientData {
                required: self.features.lookback(),
                available: closes.len(),
            })?;

        let scaled = Array1::from(window).dot(&model.weights) + model.bias;
        Ok(Forecast {
            price: model.scaler.inverse(scaled),
            fit_quality: None,
        })
    }

    fn confidence_base(&self, _fit_quality: Option<f64>, volatility_ratio: f64) -> f64 {
        1.0 - volatility_ratio
    }
}

pub type SequencePredictor = Predictor<SequenceEstimator>;

impl Predictor<SequenceEstimator> {
    pub fn sequence(config: &Config) -> Result<Self> {
        Predictor::new(SequenceEstimator::new(&config.model), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::market_data::indicators::IndicatorEngine;
    use crate::application::ml::predictor::PricePredictor;
    use crate::config::IndicatorEnvConfig;
    use crate::domain::market::series::{Bar, OhlcvSeries};
    use chrono::{Duration, NaiveDate};

    fn series(len: usize, close_at: impl Fn(usize) -> f64) -> OhlcvSeries {
        let start = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        OhlcvSeries::from_bars(
            (0..len)
                .map(|i| {
                    let c = close_at(i);
                    Bar::new(start + Duration::days(i as i64), c, c * 1.01, c * 0.99, c, 10_000)
                })
                .collect(),
        )
    }

    fn frame(series: &OhlcvSeries) -> IndicatorFrame {
        IndicatorEngine::new(IndicatorEnvConfig::default())
            .unwrap()
            .compute(series)
            .unwrap()
    }

    #[test]
    fn test_fit_splits_windows_chronologically() {
        let data = series(200, |i| 100.0 + (i as f64 * 0.1).sin() * 10.0);
        let estimator = SequenceEstimator::new(&ModelEnvConfig::default());
        let (_, metrics) = estimator.fit(&frame(&data)).unwrap();

        // 140 windows -> 112 / 28
        assert_eq!(metrics.train_rows, 112);
        assert_eq!(metrics.test_rows, 28);
        assert!(metrics.r2.is_none());
        assert!(metrics.mse.is_finite());
    }

    #[test]
    fn test_constant_series_predicts_the_constant() {
        let data = series(120, |_| 75.0);
        let predictor = SequencePredictor::sequence(&Config::default()).unwrap();
        let result = predictor.predict(&data).unwrap();

        assert!((result.predicted_price - 75.0).abs() < 1e-9);
        assert_eq!(result.confidence, 1.0);
        assert!(result.r2_score.is_none());
    }

    #[test]
    fn test_smooth_series_stays_near_last_close() {
        let data = series(250, |i| 100.0 + (i as f64 * 0.05).sin() * 5.0);
        let predictor = SequencePredictor::sequence(&Config::default()).unwrap();
        let result = predictor.predict(&data).unwrap();

        assert!((result.predicted_price - result.current_price).abs() < 2.0);
        assert!(result.confidence >= 0.5 && result.confidence <= 1.0);
    }

    #[test]
    fn test_divergent_learning_rate_is_a_training_error() {
        let config = ModelEnvConfig {
            learning_rate: 1e6,
            ..ModelEnvConfig::default()
        };
        let data = series(200, |i| 100.0 + (i as f64 * 0.3).sin() * 10.0);
        let estimator = SequenceEstimator::new(&config);

        assert!(matches!(
            estimator.fit(&frame(&data)),
            Err(PredictionError::Training { .. })
        ));
    }
}
