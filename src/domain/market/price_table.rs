use crate::domain::market::series::{Bar, OhlcvSeries, ohlc_consistent};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Columns every incoming price table must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// A row as it arrived, before any cleaning. Missing or unparsable cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBar {
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawBar {
    pub fn prices(&self) -> [Option<f64>; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// Missing cells are ignored.
    pub fn has_negative_price(&self) -> bool {
        self.prices().iter().flatten().any(|p| *p < 0.0)
    }

    /// `None` unless all four prices are present.
    pub fn is_consistent(&self) -> Option<bool> {
        let [Some(open), Some(high), Some(low), Some(close)] = self.prices() else {
            return None;
        };
        Some(ohlc_consistent([open, high, low, close]))
    }

    fn to_bar(&self) -> Option<Bar> {
        let volume = self.volume.filter(|v| v.is_finite() && *v >= 0.0)?;
        Some(Bar::new(
            self.date?,
            self.open?,
            self.high?,
            self.low?,
            self.close?,
            volume.round() as u64,
        ))
    }
}

/// Tabular OHLCV input keyed by column name, the shape external loaders produce.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    columns: Vec<String>,
    rows: Vec<RawBar>,
}

/// Series derived from a table plus notes on what cleaning removed.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub series: OhlcvSeries,
    pub notes: Vec<String>,
}

impl PriceTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawBar>) -> Self {
        Self { columns, rows }
    }

    pub fn rows(&self) -> &[RawBar] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|required| !self.columns.iter().any(|c| c == *required))
            .map(|c| c.to_string())
            .collect()
    }

    /// Count of missing cells per required column; columns with none are omitted.
    pub fn missing_value_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            let cells = [
                ("Date", row.date.is_none()),
                ("Open", row.open.is_none()),
                ("High", row.high.is_none()),
                ("Low", row.low.is_none()),
                ("Close", row.close.is_none()),
                ("Volume", row.volume.is_none()),
            ];
            for (name, missing) in cells {
                if missing {
                    *counts.entry(name).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Drops incomplete rows, sorts by date and collapses duplicate dates.
    pub fn into_series(self) -> PreparedSeries {
        let total = self.rows.len();
        let bars: Vec<Bar> = self.rows.iter().filter_map(RawBar::to_bar).collect();
        let incomplete = total - bars.len();
        let (series, duplicates) = OhlcvSeries::normalize(bars);

        let mut notes = Vec::new();
        if incomplete > 0 {
            notes.push(format!("Dropped {} rows with missing or invalid values", incomplete));
        }
        if duplicates > 0 {
            notes.push(format!("Dropped {} rows with duplicate dates", duplicates));
        }

        PreparedSeries { series, notes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_row(day: u32, close: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day),
            open: Some(close),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close: Some(close),
            volume: Some(500.0),
        }
    }

    fn columns() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_missing_columns() {
        let table = PriceTable::new(vec!["Date".into(), "Close".into()], vec![]);
        assert_eq!(table.missing_columns(), vec!["Open", "High", "Low", "Volume"]);

        let complete = PriceTable::new(columns(), vec![]);
        assert!(complete.missing_columns().is_empty());
    }

    #[test]
    fn test_raw_bar_price_checks_skip_missing_cells() {
        let mut row = full_row(1, 10.0);
        assert_eq!(row.is_consistent(), Some(true));

        row.high = None;
        row.low = Some(-2.0);
        assert_eq!(row.is_consistent(), None);
        assert!(row.has_negative_price());

        row.high = Some(1.0); // Low > High
        row.low = Some(3.0);
        assert_eq!(row.is_consistent(), Some(false));
        assert!(!row.has_negative_price());
    }

    #[test]
    fn test_into_series_drops_incomplete_and_duplicates() {
        let mut gap = full_row(2, 11.0);
        gap.close = None;
        let table = PriceTable::new(
            columns(),
            vec![full_row(3, 12.0), gap, full_row(1, 10.0), full_row(3, 13.0)],
        );

        assert_eq!(table.missing_value_counts().get("Close"), Some(&1));

        let prepared = table.into_series();
        assert_eq!(prepared.series.closes(), vec![10.0, 13.0]);
        assert_eq!(prepared.notes.len(), 2);
    }
}
