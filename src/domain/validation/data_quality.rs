use crate::config::ValidationEnvConfig;
use crate::domain::errors::{PredictionError, Result};
use crate::domain::market::price_table::PriceTable;
use crate::domain::market::series::OhlcvSeries;
use serde::{Deserialize, Serialize};

/// Outcome of a successful validation pass.
///
/// Hard failures come back as errors; everything here is advisory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Always true on a returned report: warnings never fail validation.
    pub ok: bool,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn passed(warnings: Vec<String>) -> Self {
        Self { ok: true, warnings }
    }
}

/// Centralized validator for daily price data.
///
/// Rejects data with missing columns or too many negative prices; reports
/// missing values and OHLC inconsistencies without rejecting them.
#[derive(Debug, Clone, Default)]
pub struct SeriesValidator {
    max_negative_price_rows: usize,
}

impl SeriesValidator {
    pub fn new(config: &ValidationEnvConfig) -> Self {
        Self {
            max_negative_price_rows: config.max_negative_price_rows,
        }
    }

    /// Validates a raw table: schema first, then row contents.
    pub fn validate_table(&self, table: &PriceTable) -> Result<ValidationReport> {
        let missing = table.missing_columns();
        if !missing.is_empty() {
            return Err(PredictionError::Schema { missing });
        }

        let mut warnings = Vec::new();
        let missing_values = table.missing_value_counts();
        if !missing_values.is_empty() {
            warnings.push(format!("Found missing values: {:?}", missing_values));
        }

        let dates: Vec<_> = table.rows().iter().filter_map(|r| r.date).collect();
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            warnings.push("Rows are not in strictly increasing date order".to_string());
        }

        let rows = table
            .rows()
            .iter()
            .map(|r| (r.has_negative_price(), r.is_consistent() == Some(false)));
        self.audit_prices(rows, &mut warnings)?;
        Ok(ValidationReport::passed(warnings))
    }

    /// Validates an already-typed series. Non-finite prices count as missing values.
    pub fn validate_series(&self, series: &OhlcvSeries) -> Result<ValidationReport> {
        let mut warnings = Vec::new();

        let incomplete = series.bars().iter().filter(|b| !b.is_complete()).count();
        if incomplete > 0 {
            warnings.push(format!("Found {} rows with missing price values", incomplete));
        }

        let rows = series
            .bars()
            .iter()
            .map(|b| (b.has_negative_price(), b.is_complete() && !b.is_consistent()));
        self.audit_prices(rows, &mut warnings)?;
        Ok(ValidationReport::passed(warnings))
    }

    /// Negative prices (hard, past the threshold) and OHLC logic (advisory).
    /// Each row arrives as `(has_negative_price, is_inconsistent)`; logic
    /// checks only flag rows with all four prices present.
    fn audit_prices(
        &self,
        rows: impl Iterator<Item = (bool, bool)>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let (mut negative, mut inconsistent) = (0, 0);
        for (has_negative, is_inconsistent) in rows {
            negative += usize::from(has_negative);
            inconsistent += usize::from(is_inconsistent);
        }

        if negative > self.max_negative_price_rows {
            return Err(PredictionError::Integrity {
                count: negative,
                allowed: self.max_negative_price_rows,
            });
        }
        if negative > 0 {
            warnings.push(format!("Found {} rows with negative prices", negative));
        }
        if inconsistent > 0 {
            warnings.push(format!(
                "Found {} logical inconsistencies in price data",
                inconsistent
            ));
        }
        Ok(())
    }
}
