use super::predictor::{Estimator, Forecast, Predictor};
use crate::application::feature_engineering_service::{FeatureEngineeringService, StandardScaler};
use crate::config::{Config, ModelEnvConfig};
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::indicator_frame::IndicatorFrame;
use crate::domain::ml::feature_registry::REGRESSION_FEATURE_NAMES;
use crate::domain::ml::metrics::{FitMetrics, mean_squared_error, r_squared};
use crate::domain::ml::prediction::ModelKind;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};

type OlsModel = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Ordinary least squares over the standardised indicator features.
pub struct RegressionEstimator {
    features: FeatureEngineeringService,
}

/// A fitted linear model and the scaler statistics of its training split.
pub struct FittedRegression {
    scaler: StandardScaler,
    model: OlsModel,
}

impl FittedRegression {
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let x = DenseMatrix::from_2d_vec(&self.scaler.transform(rows))
            .map_err(|e| PredictionError::training(format!("Matrix error: {}", e)))?;
        self.model.predict(&x).map_err(|e| PredictionError::Numeric {
            context: "regression predict".to_string(),
            reason: e.to_string(),
        })
    }
}

impl RegressionEstimator {
    pub fn new(config: &ModelEnvConfig) -> Self {
        Self {
            features: FeatureEngineeringService::new(config),
        }
    }
}

impl Estimator for RegressionEstimator {
    type Fitted = FittedRegression;

    fn kind(&self) -> ModelKind {
        ModelKind::Regression
    }

    fn fit(&self, frame: &IndicatorFrame) -> Result<(FittedRegression, FitMetrics)> {
        let matrix = self.features.regression_features(frame);
        let (train_x, test_x) = self.features.split(&matrix.rows);
        let (train_y, test_y) = self.features.split(&matrix.targets);
        // The SVD solve needs more rows than coefficients (features plus intercept).
        if train_x.len() <= REGRESSION_FEATURE_NAMES.len() {
            return Err(PredictionError::InsufficientData {
                required: REGRESSION_FEATURE_NAMES.len() + 1,
                available: train_x.len(),
            });
        }

        let scaler = StandardScaler::fit(train_x);
        let x = DenseMatrix::from_2d_vec(&scaler.transform(train_x))
            .map_err(|e| PredictionError::training(format!("Matrix error: {}", e)))?;
        let parameters =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let model = LinearRegression::fit(&x, &train_y.to_vec(), parameters)
            .map_err(PredictionError::training)?;
        let fitted = FittedRegression { scaler, model };

        let (eval_x, eval_y) = if test_x.is_empty() {
            (train_x, train_y)
        } else {
            (test_x, test_y)
        };
        let predictions = fitted.predict_rows(eval_x)?;
        let mse = mean_squared_error(eval_y, &predictions);

        let metrics = FitMetrics {
            mse,
            rmse: mse.sqrt(),
            r2: Some(r_squared(eval_y, &predictions)),
            train_rows: train_x.len(),
            test_rows: test_x.len(),
        };
        Ok((fitted, metrics))
    }

    fn forecast(&self, model: &FittedRegression, frame: &IndicatorFrame) -> Result<Forecast> {
        let matrix = self.features.regression_features(frame);
        if matrix.is_empty() {
            return Err(PredictionError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let predictions = model.predict_rows(&matrix.rows)?;
        let price = predictions.last().copied().unwrap_or(f64::NAN);
        Ok(Forecast {
            price,
            fit_quality: Some(r_squared(&matrix.targets, &predictions)),
        })
    }

    fn confidence_base(&self, fit_quality: Option<f64>, volatility_ratio: f64) -> f64 {
        fit_quality.unwrap_or(0.0) * (1.0 - volatility_ratio)
    }
}

pub type RegressionPredictor = Predictor<RegressionEstimator>;

impl Predictor<RegressionEstimator> {
    pub fn regression(config: &Config) -> Result<Self> {
        Predictor::new(RegressionEstimator::new(&config.model), config)
    }
}
