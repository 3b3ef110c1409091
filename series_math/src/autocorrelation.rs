//! Sample autocorrelation and partial autocorrelation
//!
//! The partial autocorrelations are the Yule-Walker estimates obtained from
//! the Durbin-Levinson recursion over the sample autocorrelations.

use crate::{MathError, Result};
use serde::Serialize;

/// Sample autocorrelation at a single lag.
///
/// Uses the biased (divide by `n`) autocovariance estimator. A series with
/// zero variance has autocorrelation 0 at every positive lag.
pub fn autocorrelation(series: &[f64], lag: usize) -> Result<f64> {
    if series.len() <= lag {
        return Err(MathError::InsufficientData(format!(
            "lag {} needs more than {} observations, got {}",
            lag,
            lag,
            series.len()
        )));
    }
    if lag == 0 {
        return Ok(1.0);
    }

    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let denominator: f64 = series.iter().map(|x| (x - mean).powi(2)).sum();
    if denominator < 1e-12 {
        return Ok(0.0);
    }

    let numerator: f64 = series
        .iter()
        .zip(&series[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum();

    Ok(numerator / denominator)
}

/// Partial autocorrelations for lags `1..=max_lag`.
pub fn partial_autocorrelation(series: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let acf = (0..=max_lag)
        .map(|lag| autocorrelation(series, lag))
        .collect::<Result<Vec<f64>>>()?;
    durbin_levinson(&acf)
}

/// Yule-Walker partial autocorrelations from autocorrelations `acf[0..=k]`
fn durbin_levinson(acf: &[f64]) -> Result<Vec<f64>> {
    let max_lag = acf.len().saturating_sub(1);
    let mut pacf = Vec::with_capacity(max_lag);
    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);
    let mut variance: f64 = 1.0;

    for k in 1..=max_lag {
        let mut numerator = acf[k];
        for (j, coeff) in phi.iter().enumerate() {
            numerator -= coeff * acf[k - 1 - j];
        }
        if variance.abs() < 1e-12 {
            return Err(MathError::CalculationError(format!(
                "Durbin-Levinson recursion is singular at lag {}",
                k
            )));
        }
        let reflection = numerator / variance;

        let previous = phi.clone();
        for (j, coeff) in phi.iter_mut().enumerate() {
            *coeff = previous[j] - reflection * previous[k - 2 - j];
        }
        phi.push(reflection);
        variance *= 1.0 - reflection * reflection;
        pacf.push(reflection);
    }

    Ok(pacf)
}

/// ACF and PACF of one series up to a common lag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correlogram {
    /// Autocorrelations for lags `0..=max_lag`
    pub acf: Vec<f64>,
    /// Partial autocorrelations for lags `1..=max_lag`
    pub pacf: Vec<f64>,
    /// Approximate 95% significance band, `1.96 / sqrt(n)`
    pub confidence_band: f64,
}

/// Compute a correlogram, capping `max_lag` at `len / 2 - 1` the way
/// partial autocorrelation estimators usually require.
pub fn correlogram(series: &[f64], max_lag: usize) -> Result<Correlogram> {
    if series.len() < 4 {
        return Err(MathError::InsufficientData(format!(
            "correlogram needs at least 4 observations, got {}",
            series.len()
        )));
    }
    let max_lag = max_lag.min(series.len() / 2 - 1).max(1);

    let acf = (0..=max_lag)
        .map(|lag| autocorrelation(series, lag))
        .collect::<Result<Vec<f64>>>()?;
    let pacf = durbin_levinson(&acf)?;

    Ok(Correlogram {
        acf,
        pacf,
        confidence_band: 1.96 / (series.len() as f64).sqrt(),
    })
}
