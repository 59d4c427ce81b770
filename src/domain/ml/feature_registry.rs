use crate::domain::market::indicator_frame::IndicatorFrame;

/// Ordered list of regression feature names.
/// Rows produced by [`feature_row`] follow exactly this order; scaler
/// statistics and fitted coefficients are positional, so any change here
/// invalidates trained models.
pub const REGRESSION_FEATURE_NAMES: &[&str] = &[
    "Open",
    "High",
    "Low",
    "Volume",
    "MA_5",
    "MA_10",
    "MA_20",
    "Price_Change",
    "Price_Change_5",
    "Volatility",
    "RSI",
    "Volume_MA",
    "Volume_Ratio",
    "HL_Ratio",
];

/// Moving averages the regression features need regardless of the reported set.
pub const REGRESSION_MA_WINDOWS: [usize; 3] = [5, 10, 20];

/// Feature vector for row `i`, or `None` when any feature is undefined there.
pub fn feature_row(frame: &IndicatorFrame, i: usize) -> Option<Vec<f64>> {
    let bar = frame.bars().get(i)?;
    let ma = |window: usize| frame.moving_average(window).and_then(|c| c[i]);

    Some(vec![
        bar.open,
        bar.high,
        bar.low,
        bar.volume as f64,
        ma(5)?,
        ma(10)?,
        ma(20)?,
        frame.price_change()[i]?,
        frame.price_change_5()[i]?,
        frame.volatility()[i]?,
        frame.rsi()[i]?,
        frame.volume_ma()[i]?,
        frame.volume_ratio()[i]?,
        frame.hl_ratio()[i]?,
    ])
}
