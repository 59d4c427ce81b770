use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Fit quality measured on the held-out split after training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitMetrics {
    pub mse: f64,
    pub rmse: f64,
    /// Coefficient of determination; the sequence model does not report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64
}

/// Coefficient of determination.
///
/// A target with no variance scores 1.0 when it is reproduced and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }

    let mean = actual.iter().mean();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    let tolerance = f64::EPSILON * actual.len() as f64 * (1.0 + mean * mean);
    if ss_tot <= tolerance {
        return if ss_res <= tolerance { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mse() {
        let mse = mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0, 5.0]);
        assert!((mse - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_perfect_and_mean_model() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        assert!((r_squared(&actual, &actual) - 1.0).abs() < 1e-12);
        assert!(r_squared(&actual, &[2.5; 4]).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_constant_target() {
        assert_eq!(r_squared(&[5.0; 3], &[5.0; 3]), 1.0);
        assert_eq!(r_squared(&[5.0; 3], &[4.0, 5.0, 6.0]), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(101.23456, 2), 101.23);
        assert_eq!(round_to(0.8765, 3), 0.877);
    }
}
