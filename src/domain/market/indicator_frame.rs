use crate::domain::market::series::Bar;
use crate::domain::market::snapshot::IndicatorSnapshot;
use crate::domain::ml::metrics::round_to;
use std::collections::BTreeMap;

/// Indicator column: one value per bar, `None` while the window is unfilled
/// or when the value is undefined for that bar.
pub type Column = Vec<Option<f64>>;

/// A derived copy of a series enriched with indicator columns.
///
/// Every column has exactly one entry per bar and uses only the bar itself
/// and the bars before it.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub(crate) bars: Vec<Bar>,
    pub(crate) moving_averages: BTreeMap<usize, Column>,
    pub(crate) reported_windows: Vec<usize>,
    pub(crate) rsi: Column,
    pub(crate) bb_upper: Column,
    pub(crate) bb_lower: Column,
    pub(crate) macd: Column,
    pub(crate) signal: Column,
    pub(crate) volatility: Column,
    pub(crate) volume_ma: Column,
    pub(crate) volume_ratio: Column,
    pub(crate) hl_ratio: Column,
    pub(crate) price_change: Column,
    pub(crate) price_change_5: Column,
    pub(crate) warmup: usize,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn moving_average(&self, window: usize) -> Option<&[Option<f64>]> {
        self.moving_averages.get(&window).map(Vec::as_slice)
    }

    pub fn rsi(&self) -> &[Option<f64>] {
        &self.rsi
    }

    pub fn bollinger_upper(&self) -> &[Option<f64>] {
        &self.bb_upper
    }

    pub fn bollinger_lower(&self) -> &[Option<f64>] {
        &self.bb_lower
    }

    pub fn macd(&self) -> &[Option<f64>] {
        &self.macd
    }

    pub fn signal(&self) -> &[Option<f64>] {
        &self.signal
    }

    pub fn volatility(&self) -> &[Option<f64>] {
        &self.volatility
    }

    pub fn volume_ma(&self) -> &[Option<f64>] {
        &self.volume_ma
    }

    pub fn volume_ratio(&self) -> &[Option<f64>] {
        &self.volume_ratio
    }

    pub fn hl_ratio(&self) -> &[Option<f64>] {
        &self.hl_ratio
    }

    pub fn price_change(&self) -> &[Option<f64>] {
        &self.price_change
    }

    pub fn price_change_5(&self) -> &[Option<f64>] {
        &self.price_change_5
    }

    /// Number of leading rows whose longest rolling window is not yet filled.
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// Rows usable for training and prediction.
    pub fn eligible_rows(&self) -> usize {
        self.bars.len().saturating_sub(self.warmup)
    }

    /// Latest value of every reported indicator, rounded to four decimals.
    pub fn snapshot(&self) -> IndicatorSnapshot {
        let mut snapshot = IndicatorSnapshot::default();
        let latest = |column: &[Option<f64>]| column.last().copied().flatten().map(|v| round_to(v, 4));

        for window in &self.reported_windows {
            let value = self.moving_average(*window).and_then(|c| latest(c));
            snapshot.insert(format!("MA_{}", window), value);
        }
        let named: [(&str, &Column); 9] = [
            ("RSI", &self.rsi),
            ("BB_Upper", &self.bb_upper),
            ("BB_Lower", &self.bb_lower),
            ("MACD", &self.macd),
            ("Signal", &self.signal),
            ("Volatility", &self.volatility),
            ("Volume_MA", &self.volume_ma),
            ("Volume_Ratio", &self.volume_ratio),
            ("HL_Ratio", &self.hl_ratio),
        ];
        for (name, column) in named {
            snapshot.insert(name, latest(column.as_slice()));
        }
        snapshot
    }
}
