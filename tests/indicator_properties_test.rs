use chrono::{Duration, NaiveDate};
use stockcast::application::market_data::indicators::IndicatorEngine;
use stockcast::config::IndicatorEnvConfig;
use stockcast::domain::market::series::{Bar, OhlcvSeries};

fn series_from_closes(closes: &[f64]) -> OhlcvSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    OhlcvSeries::from_bars(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    start + Duration::days(i as i64),
                    c,
                    c * 1.02,
                    c * 0.98,
                    c,
                    5_000 + (i as u64 % 11) * 250,
                )
            })
            .collect(),
    )
}

fn engine() -> IndicatorEngine {
    IndicatorEngine::new(IndicatorEnvConfig::default()).unwrap()
}

#[test]
fn test_windows_longer_than_series_are_undefined() {
    let frame = engine().compute(&series_from_closes(&[20.0; 15])).unwrap();

    for window in [20, 50] {
        assert!(frame.moving_average(window).unwrap().iter().all(Option::is_none));
    }
    assert!(frame.bollinger_upper().iter().all(Option::is_none));
    assert!(frame.volatility().iter().all(Option::is_none));

    let snapshot = frame.snapshot();
    assert_eq!(snapshot.get("MA_20"), None);
    assert_eq!(snapshot.get("BB_Upper"), None);
    assert!(snapshot.get("MA_5").is_some());
}

#[test]
fn test_constant_price_has_flat_macd() {
    let frame = engine().compute(&series_from_closes(&[37.5; 120])).unwrap();

    for i in frame.warmup()..frame.len() {
        assert!(frame.macd()[i].unwrap().abs() < 1e-12);
        assert!(frame.signal()[i].unwrap().abs() < 1e-12);
    }
    // Flat window has no losses.
    assert_eq!(frame.rsi()[119], Some(100.0));
}

#[test]
fn test_strictly_increasing_price_saturates_rsi() {
    let closes: Vec<f64> = (0..100).map(|i| 10.0 + i as f64 * 0.37).collect();
    let frame = engine().compute(&series_from_closes(&closes)).unwrap();

    for value in frame.rsi().iter().flatten() {
        assert!(value.is_finite());
        assert!(*value <= 100.0);
        assert_eq!(*value, 100.0);
    }
    assert_eq!(frame.rsi()[13], None);
    assert_eq!(frame.rsi()[14], Some(100.0));
}

#[test]
fn test_bollinger_bands_bracket_the_mean() {
    let closes: Vec<f64> = (0..300)
        .map(|i| {
            let t = i as f64;
            100.0 + (t * 0.13).sin() * 8.0 + (t * 0.71).cos() * 3.0 + t * 0.05
        })
        .collect();
    let frame = engine().compute(&series_from_closes(&closes)).unwrap();
    let ma_20 = frame.moving_average(20).unwrap();

    let mut checked = 0;
    for i in 0..frame.len() {
        if let (Some(upper), Some(mid), Some(lower)) =
            (frame.bollinger_upper()[i], ma_20[i], frame.bollinger_lower()[i])
        {
            assert!(upper >= mid);
            assert!(mid >= lower);
            checked += 1;
        }
    }
    assert_eq!(checked, 300 - 19);
}

#[test]
fn test_indicators_never_look_ahead() {
    let closes: Vec<f64> = (0..150).map(|i| 50.0 + (i as f64 * 0.2).sin() * 4.0).collect();
    let full = engine().compute(&series_from_closes(&closes)).unwrap();
    let prefix = engine().compute(&series_from_closes(&closes[..100])).unwrap();

    for i in 0..100 {
        assert_eq!(full.rsi()[i], prefix.rsi()[i]);
        assert_eq!(full.macd()[i], prefix.macd()[i]);
        assert_eq!(full.moving_average(50).unwrap()[i], prefix.moving_average(50).unwrap()[i]);
    }
}

#[test]
fn test_snapshot_keys() {
    let frame = engine().compute(&series_from_closes(&[10.0; 60])).unwrap();
    let snapshot = frame.snapshot();
    let keys: Vec<&str> = snapshot.iter().map(|(k, _)| k).collect();
    assert_eq!(snapshot.len(), 13);
    assert!(!snapshot.is_empty());

    for key in [
        "MA_5",
        "MA_10",
        "MA_20",
        "MA_50",
        "RSI",
        "BB_Upper",
        "BB_Lower",
        "MACD",
        "Signal",
        "Volatility",
        "Volume_MA",
        "Volume_Ratio",
        "HL_Ratio",
    ] {
        assert!(keys.contains(&key), "missing {}", key);
    }
}
