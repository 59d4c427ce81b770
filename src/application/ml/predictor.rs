use super::confidence::ConfidencePolicy;
use crate::application::feature_engineering_service::FeatureEngineeringService;
use crate::application::market_data::indicators::IndicatorEngine;
use crate::config::Config;
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::indicator_frame::IndicatorFrame;
use crate::domain::market::series::OhlcvSeries;
use crate::domain::ml::metrics::{FitMetrics, round_to};
use crate::domain::ml::prediction::{ModelKind, PredictionResult};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Smallest price a forecast is clamped to.
const MIN_PREDICTED_PRICE: f64 = 0.01;

/// Interface shared by every forecasting model.
pub trait PricePredictor: Send + Sync {
    /// Fits (or refits) the model on `series`.
    fn train(&self, series: &OhlcvSeries) -> Result<FitMetrics>;

    /// Forecasts the next close, training first if no model exists yet.
    fn predict(&self, series: &OhlcvSeries) -> Result<PredictionResult>;

    fn is_trained(&self) -> bool;

    fn kind(&self) -> ModelKind;

    /// Human readable model name
    fn name(&self) -> &str;
}

/// Raw output of a fitted model for the latest row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub price: f64,
    /// In-sample fit quality, when the model reports one.
    pub fit_quality: Option<f64>,
}

/// A learning algorithm plugged into [`Predictor`].
///
/// The fitted value carries everything prediction needs, scaler statistics
/// included, so nothing is recomputed from the prediction-time series.
pub trait Estimator: Send + Sync {
    type Fitted: Send + Sync;

    fn kind(&self) -> ModelKind;

    fn fit(&self, frame: &IndicatorFrame) -> Result<(Self::Fitted, FitMetrics)>;

    fn forecast(&self, model: &Self::Fitted, frame: &IndicatorFrame) -> Result<Forecast>;

    /// Unclamped confidence from fit quality and recent volatility ratio.
    fn confidence_base(&self, fit_quality: Option<f64>, volatility_ratio: f64) -> f64;
}

enum ModelState<F> {
    Untrained,
    Trained { model: Arc<F>, metrics: FitMetrics },
}

/// Lazily trained predictor over an [`Estimator`].
pub struct Predictor<E: Estimator> {
    estimator: E,
    engine: IndicatorEngine,
    features: FeatureEngineeringService,
    policy: ConfidencePolicy,
    state: Mutex<ModelState<E::Fitted>>,
}

impl<E: Estimator> Predictor<E> {
    pub fn new(estimator: E, config: &Config) -> Result<Self> {
        config.validate()?;
        let policy = ConfidencePolicy::for_kind(estimator.kind(), &config.model);
        Ok(Self {
            estimator,
            engine: IndicatorEngine::new(config.indicators.clone())?,
            features: FeatureEngineeringService::new(&config.model),
            policy,
            state: Mutex::new(ModelState::Untrained),
        })
    }

    /// Metrics of the current model, if trained.
    pub fn metrics(&self) -> Option<FitMetrics> {
        match &*self.lock_state() {
            ModelState::Trained { metrics, .. } => Some(*metrics),
            ModelState::Untrained => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ModelState<E::Fitted>> {
        // A panic mid-update leaves either the old or the new state, both valid.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn prepare(&self, series: &OhlcvSeries) -> Result<IndicatorFrame> {
        let frame = self.engine.compute(series)?;
        self.features.ensure_eligible(&frame)?;
        Ok(frame)
    }

    fn fit(&self, frame: &IndicatorFrame) -> Result<(Arc<E::Fitted>, FitMetrics)> {
        let (model, metrics) = self.estimator.fit(frame)?;
        info!(
            "{} trained on {} rows ({} held out): mse={:.6}, rmse={:.6}, r2={:?}",
            self.name(),
            metrics.train_rows,
            metrics.test_rows,
            metrics.mse,
            metrics.rmse,
            metrics.r2
        );
        Ok((Arc::new(model), metrics))
    }

    fn build_result(&self, frame: &IndicatorFrame, forecast: Forecast) -> Result<PredictionResult> {
        let Some(last) = frame.bars().last() else {
            return Err(PredictionError::InsufficientData {
                required: 1,
                available: 0,
            });
        };

        if !forecast.price.is_finite() {
            return Err(PredictionError::Numeric {
                context: "forecast".to_string(),
                reason: format!("{} produced {}", self.name(), forecast.price),
            });
        }
        let predicted_price = if forecast.price <= 0.0 {
            warn!(
                "{} forecast {:.6} is not positive; clamping to {}",
                self.name(),
                forecast.price,
                MIN_PREDICTED_PRICE
            );
            MIN_PREDICTED_PRICE
        } else {
            forecast.price
        };

        let closes = frame.closes();
        let volatility = self.policy.recent_volatility(&closes);
        let base = self.estimator.confidence_base(forecast.fit_quality, volatility);
        let confidence = self.policy.clamp(base);
        debug!(
            "Confidence base {:.4} (volatility ratio {:.4}) -> {:.4}",
            base, volatility, confidence
        );

        Ok(PredictionResult {
            predicted_price: round_to(predicted_price, 2),
            confidence: round_to(confidence, 3),
            current_price: last.close,
            prediction_date: Utc::now().date_naive(),
            last_observation: last.date,
            indicator_snapshot: frame.snapshot(),
            model_label: self.name().to_string(),
            model_kind: self.kind(),
            r2_score: forecast.fit_quality.map(|r2| round_to(r2, 4)),
        })
    }
}

impl<E: Estimator> PricePredictor for Predictor<E> {
    fn train(&self, series: &OhlcvSeries) -> Result<FitMetrics> {
        let frame = self.prepare(series)?;
        let mut state = self.lock_state();
        let (model, metrics) = self.fit(&frame)?;
        *state = ModelState::Trained { model, metrics };
        Ok(metrics)
    }

    fn predict(&self, series: &OhlcvSeries) -> Result<PredictionResult> {
        let frame = self.prepare(series)?;

        // Held until the forecast is done so concurrent callers train once.
        let mut state = self.lock_state();
        let cached = match &*state {
            ModelState::Trained { model, .. } => Some(Arc::clone(model)),
            ModelState::Untrained => None,
        };
        let model = match cached {
            Some(model) => model,
            None => {
                info!("{} is untrained, training on first prediction", self.name());
                let (model, metrics) = self.fit(&frame)?;
                *state = ModelState::Trained {
                    model: Arc::clone(&model),
                    metrics,
                };
                model
            }
        };
        let forecast = self.estimator.forecast(&model, &frame)?;
        drop(state);

        self.build_result(&frame, forecast)
    }

    fn is_trained(&self) -> bool {
        matches!(&*self.lock_state(), ModelState::Trained { .. })
    }

    fn kind(&self) -> ModelKind {
        self.estimator.kind()
    }

    fn name(&self) -> &str {
        self.estimator.kind().label()
    }
}
