//! Accuracy of test-segment forecasts against held-out values

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Mean squared error between held-out values and their forecasts.
///
/// Both slices must be non-empty and of equal length. NaN inputs propagate
/// into the result.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean absolute error between held-out values and their forecasts
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Accuracy figures for one station's test segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyReport {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
}

/// Score test-segment forecasts
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<AccuracyReport> {
    let mse = mean_squared_error(actual, predicted)?;
    Ok(AccuracyReport {
        mse,
        rmse: mse.sqrt(),
        mae: mean_absolute_error(actual, predicted)?,
    })
}

impl std::fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MSE {:.4}, RMSE {:.4}, MAE {:.4}",
            self.mse, self.rmse, self.mae
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_squared_error() {
        let mse = mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 3.0, 5.0]).unwrap();
        assert_relative_eq!(mse, 5.0 / 3.0);
    }

    #[test]
    fn test_perfect_forecast_scores_zero() {
        let report = evaluate(&[2.0, 4.0], &[2.0, 4.0]).unwrap();
        assert_eq!(report.mse, 0.0);
        assert_eq!(report.mae, 0.0);
    }

    #[test]
    fn test_report_fields() {
        let report = evaluate(&[0.0, 0.0], &[3.0, -1.0]).unwrap();
        assert_relative_eq!(report.mse, 5.0);
        assert_relative_eq!(report.rmse, 5.0_f64.sqrt());
        assert_relative_eq!(report.mae, 2.0);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(mean_squared_error(&[1.0], &[1.0, 2.0]).is_err());
        assert!(mean_squared_error(&[], &[]).is_err());
    }

    #[test]
    fn test_nan_propagates() {
        let mse = mean_squared_error(&[f64::NAN, 1.0], &[1.0, 1.0]).unwrap();
        assert!(mse.is_nan());
    }
}
