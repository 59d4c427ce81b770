use crate::domain::errors::{PredictionError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// True when every price component is a finite number.
    pub fn is_complete(&self) -> bool {
        self.prices().iter().all(|p| p.is_finite())
    }

    pub fn has_negative_price(&self) -> bool {
        self.prices().iter().any(|p| *p < 0.0)
    }

    pub fn is_consistent(&self) -> bool {
        ohlc_consistent(self.prices())
    }
}

/// `low <= min(open, close) <= max(open, close) <= high`
pub(crate) fn ohlc_consistent([open, high, low, close]: [f64; 4]) -> bool {
    !(high < low || open > high || close > high || open < low || close < low)
}

/// Daily series ordered by strictly increasing date.
///
/// Construction sorts the bars and collapses duplicate dates (the last record
/// for a date wins), so every consumer can rely on the ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self::normalize(bars).0
    }

    /// Sorts by date and drops duplicate dates, returning how many were dropped.
    pub(crate) fn normalize(mut bars: Vec<Bar>) -> (Self, usize) {
        bars.sort_by_key(|bar| bar.date);
        let before = bars.len();
        bars.dedup_by(|later, earlier| {
            if later.date == earlier.date {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        let dropped = before - bars.len();
        (Self { bars }, dropped)
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Copy of the series without rows carrying non-finite prices.
    pub fn without_incomplete(&self) -> (Self, usize) {
        let bars: Vec<Bar> = self.bars.iter().filter(|b| b.is_complete()).copied().collect();
        let dropped = self.bars.len() - bars.len();
        (Self { bars }, dropped)
    }

    /// The last `days` bars (the whole series when shorter).
    pub fn recent(&self, days: usize) -> Self {
        let start = self.bars.len().saturating_sub(days);
        Self {
            bars: self.bars[start..].to_vec(),
        }
    }

    /// The last `lookback` bars, failing when the series is shorter.
    pub fn prediction_window(&self, lookback: usize) -> Result<Self> {
        if self.bars.len() < lookback {
            return Err(PredictionError::InsufficientData {
                required: lookback,
                available: self.bars.len(),
            });
        }
        Ok(self.recent(lookback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        Bar::new(date, close, close + 1.0, close - 1.0, close, 1_000)
    }

    #[test]
    fn test_from_bars_sorts_and_dedups() {
        let (series, dropped) =
            OhlcvSeries::normalize(vec![bar(3, 30.0), bar(1, 10.0), bar(3, 33.0), bar(2, 20.0)]);

        assert_eq!(dropped, 1);
        assert_eq!(series.closes(), vec![10.0, 20.0, 33.0]);
    }

    #[test]
    fn test_bar_consistency() {
        let mut b = bar(1, 10.0);
        assert!(b.is_consistent());

        b.low = 12.0; // Low > High
        assert!(!b.is_consistent());
        assert!(!b.has_negative_price());

        b.open = -0.5;
        assert!(b.has_negative_price());
    }

    #[test]
    fn test_prediction_window_too_short() {
        let series = OhlcvSeries::from_bars((1..=5).map(|d| bar(d, d as f64)).collect());

        match series.prediction_window(10) {
            Err(PredictionError::InsufficientData {
                required,
                available,
            }) => {
                assert_eq!(required, 10);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }

        let window = series.prediction_window(3).unwrap();
        assert_eq!(window.closes(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_without_incomplete_drops_nan_rows() {
        let mut broken = bar(2, 20.0);
        broken.close = f64::NAN;
        let series = OhlcvSeries::from_bars(vec![bar(1, 10.0), broken, bar(3, 30.0)]);

        let (clean, dropped) = series.without_incomplete();
        assert_eq!(dropped, 1);
        assert_eq!(clean.len(), 2);
    }
}
