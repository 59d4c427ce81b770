use crate::application::market_data::indicators::IndicatorEngine;
use crate::application::market_data::statistical_features::{SeriesStatistics, summarize};
use crate::application::ml::predictor::PricePredictor;
use crate::application::ml::regression_predictor::RegressionPredictor;
use crate::application::ml::sequence_predictor::SequencePredictor;
use crate::config::Config;
use crate::domain::errors::Result;
use crate::domain::market::price_table::PriceTable;
use crate::domain::market::series::OhlcvSeries;
use crate::domain::market::snapshot::IndicatorSnapshot;
use crate::domain::ml::metrics::FitMetrics;
use crate::domain::ml::prediction::{ModelKind, PredictionResult};
use crate::domain::validation::data_quality::{SeriesValidator, ValidationReport};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

/// A prediction together with everything noteworthy about its input.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub result: PredictionResult,
    /// Validation warnings and cleaning notes.
    pub warnings: Vec<String>,
    pub statistics: Option<SeriesStatistics>,
}

/// Result of a single symbol in a batch
#[derive(Debug, Clone)]
pub struct BatchPrediction {
    pub symbol: String,
    pub result: std::result::Result<PredictionReport, String>,
}

/// Orchestrates validation, indicator computation and prediction.
///
/// Owns one predictor per model kind; each trains lazily on its first request
/// and is reused afterwards.
pub struct PredictionService {
    config: Config,
    validator: SeriesValidator,
    engine: IndicatorEngine,
    regression: RegressionPredictor,
    sequence: SequencePredictor,
}

impl PredictionService {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: SeriesValidator::new(&config.validation),
            engine: IndicatorEngine::new(config.indicators.clone())?,
            regression: RegressionPredictor::regression(&config)?,
            sequence: SequencePredictor::sequence(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn predictor(&self, kind: ModelKind) -> &dyn PricePredictor {
        match kind {
            ModelKind::Regression => &self.regression,
            ModelKind::Sequence => &self.sequence,
        }
    }

    pub fn validate(&self, series: &OhlcvSeries) -> Result<ValidationReport> {
        self.validator.validate_series(series)
    }

    /// Latest indicator values of the complete rows of `series`.
    pub fn indicators(&self, series: &OhlcvSeries) -> Result<IndicatorSnapshot> {
        let (clean, _) = series.without_incomplete();
        Ok(self.engine.compute(&clean)?.snapshot())
    }

    pub fn statistics(&self, series: &OhlcvSeries) -> Option<SeriesStatistics> {
        summarize(series)
    }

    /// Explicitly (re)trains the predictor for `kind`.
    pub fn train(&self, series: &OhlcvSeries, kind: ModelKind) -> Result<FitMetrics> {
        let (clean, warnings) = self.prepare(series)?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        self.predictor(kind).train(&clean)
    }

    pub fn predict(&self, series: &OhlcvSeries, kind: ModelKind) -> Result<PredictionReport> {
        let (clean, warnings) = self.prepare(series)?;
        self.predict_with(self.predictor(kind), &clean, warnings)
    }

    /// Validates the table, cleans it into a series and predicts.
    ///
    /// The table is validated once; the cleaned series only holds complete rows.
    pub fn predict_table(&self, table: PriceTable, kind: ModelKind) -> Result<PredictionReport> {
        let report = self.validator.validate_table(&table)?;
        let prepared = table.into_series();

        let mut warnings = report.warnings;
        warnings.extend(prepared.notes);
        self.predict_with(self.predictor(kind), &prepared.series, warnings)
    }

    /// Predicts independent series in parallel, each with a fresh predictor.
    ///
    /// Failures are reported per symbol and do not abort the batch.
    pub fn predict_many(
        &self,
        series: &[(String, OhlcvSeries)],
        kind: ModelKind,
    ) -> Vec<BatchPrediction> {
        series
            .par_iter()
            .map(|(symbol, data)| {
                let result = self.fresh_predictor(kind).and_then(|predictor| {
                    let (clean, warnings) = self.prepare(data)?;
                    self.predict_with(predictor.as_ref(), &clean, warnings)
                });
                if let Err(e) = &result {
                    warn!("Prediction for {} failed: {}", symbol, e);
                }
                BatchPrediction {
                    symbol: symbol.clone(),
                    result: result.map_err(|e| e.to_string()),
                }
            })
            .collect()
    }

    fn fresh_predictor(&self, kind: ModelKind) -> Result<Box<dyn PricePredictor>> {
        Ok(match kind {
            ModelKind::Regression => Box::new(RegressionPredictor::regression(&self.config)?),
            ModelKind::Sequence => Box::new(SequencePredictor::sequence(&self.config)?),
        })
    }

    /// Validation warnings plus the complete rows of `series`.
    fn prepare(&self, series: &OhlcvSeries) -> Result<(OhlcvSeries, Vec<String>)> {
        let mut warnings = self.validator.validate_series(series)?.warnings;
        let (clean, dropped) = series.without_incomplete();
        if dropped > 0 {
            warnings.push(format!("Dropped {} rows with missing price values", dropped));
        }
        Ok((clean, warnings))
    }

    /// Predicts on an already validated and cleaned series.
    fn predict_with(
        &self,
        predictor: &dyn PricePredictor,
        clean: &OhlcvSeries,
        warnings: Vec<String>,
    ) -> Result<PredictionReport> {
        for warning in &warnings {
            warn!("{}", warning);
        }

        let result = predictor.predict(clean)?;
        info!(
            "{} predicted {:.2} (current {:.2}, confidence {:.3})",
            predictor.name(),
            result.predicted_price,
            result.current_price,
            result.confidence
        );

        Ok(PredictionReport {
            result,
            warnings,
            statistics: summarize(clean),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictionError;
    use crate::domain::market::price_table::{RawBar, REQUIRED_COLUMNS};
    use crate::domain::market::series::Bar;
    use chrono::{Duration, NaiveDate};

    fn series(len: usize, price: f64) -> OhlcvSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        OhlcvSeries::from_bars(
            (0..len)
                .map(|i| {
                    let c = price + (i as f64 * 0.4).sin();
                    Bar::new(start + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 20_000)
                })
                .collect(),
        )
    }

    fn service() -> PredictionService {
        PredictionService::new(Config::default()).unwrap()
    }

    #[test]
    fn test_predictors_train_lazily_and_independently() {
        let svc = service();
        assert!(!svc.predictor(ModelKind::Regression).is_trained());

        svc.predict(&series(150, 80.0), ModelKind::Regression).unwrap();

        assert!(svc.predictor(ModelKind::Regression).is_trained());
        assert!(!svc.predictor(ModelKind::Sequence).is_trained());
    }

    #[test]
    fn test_report_carries_statistics() {
        let report = service()
            .predict(&series(150, 80.0), ModelKind::Sequence)
            .unwrap();

        let stats = report.statistics.unwrap();
        assert_eq!(stats.total_days, 150);
        assert_eq!(stats.current_price, report.result.current_price);
        assert!(report.warnings.is_empty());
    }

    fn inconsistency_warnings(report: &PredictionReport) -> usize {
        report
            .warnings
            .iter()
            .filter(|w| w.contains("1 logical inconsistencies"))
            .count()
    }

    #[test]
    fn test_inconsistent_rows_surface_as_warnings() {
        let mut bars = series(150, 80.0).bars().to_vec();
        bars[10].high = bars[10].low - 1.0;
        let report = service()
            .predict(&OhlcvSeries::from_bars(bars), ModelKind::Regression)
            .unwrap();

        assert_eq!(inconsistency_warnings(&report), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_table_warnings_are_reported_once() {
        let rows = series(150, 80.0)
            .bars()
            .iter()
            .enumerate()
            .map(|(i, b)| RawBar {
                date: Some(b.date),
                open: Some(b.open),
                high: Some(if i == 10 { b.low - 1.0 } else { b.high }),
                low: Some(b.low),
                close: Some(b.close),
                volume: Some(b.volume as f64),
            })
            .collect();
        let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();

        let report = service()
            .predict_table(PriceTable::new(columns, rows), ModelKind::Regression)
            .unwrap();

        assert_eq!(inconsistency_warnings(&report), 1);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut bars = series(150, 80.0).bars().to_vec();
        bars[3].open = -1.0;

        let err = service()
            .predict(&OhlcvSeries::from_bars(bars), ModelKind::Regression)
            .unwrap_err();
        assert!(matches!(err, PredictionError::Integrity { count: 1, allowed: 0 }));
    }

    #[test]
    fn test_explicit_train_marks_predictor_trained() {
        let svc = service();
        let metrics = svc.train(&series(150, 80.0), ModelKind::Sequence).unwrap();

        assert!(metrics.train_rows > 0);
        assert!(svc.predictor(ModelKind::Sequence).is_trained());
    }

    #[test]
    fn test_indicators_snapshot() {
        let snapshot = service().indicators(&series(30, 50.0)).unwrap();
        assert!(snapshot.get("RSI").is_some());
        assert_eq!(snapshot.get("MA_50"), None);
    }
}
