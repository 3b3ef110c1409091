//! ARIMA models for station series
//!
//! Parameters are estimated by conditional sum of squares (CSS) on the
//! `d`-times differenced series: the first `max(p, q)` differenced values
//! are taken as given, earlier shocks are zero, and the remaining one-step
//! residuals are squared and summed. The sum is minimized with a bounded
//! Nelder-Mead search.

use crate::error::{FitError, ForecastError, Result};
use crate::models::{FittedModel, ForecastModel, ForecastResult};
use serde::{Deserialize, Serialize};
use series_math::{difference, difference_tails, integrate, nelder_mead, NelderMeadConfig};
use statrs::distribution::{ContinuousCDF, Normal};

/// Coefficients are kept inside (-BOUND, BOUND)
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Training observations needed for a fit: `d` are consumed by
    /// differencing, `max(p, q)` condition the recursion, and at least two
    /// residuals must remain.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Model order
    order: ArimaOrder,
    /// Whether a constant (mean of the differenced series) is estimated
    include_constant: bool,
    /// Optimizer settings
    optimizer: NelderMeadConfig,
}

impl ArimaModel {
    /// Create a new ARIMA model.
    ///
    /// A constant is estimated only for undifferenced models (`d == 0`);
    /// use [`ArimaModel::with_constant`] to override.
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            name: order.to_string(),
            order,
            include_constant: order.d == 0,
            optimizer: NelderMeadConfig::default(),
        }
    }

    /// Force the constant term on or off
    pub fn with_constant(mut self, include_constant: bool) -> Result<Self> {
        let order = self.order;
        if !include_constant && order.p == 0 && order.q == 0 && order.d == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} without a constant has no parameters to estimate",
                order
            )));
        }
        self.include_constant = include_constant;
        Ok(self)
    }

    /// Replace the optimizer settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Result<Self> {
        if optimizer.max_iter == 0 {
            return Err(ForecastError::InvalidParameter(
                "optimizer max_iter must be at least 1".to_string(),
            ));
        }
        if !(optimizer.tolerance > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "optimizer tolerance must be positive, got {}",
                optimizer.tolerance
            )));
        }
        self.optimizer = optimizer;
        Ok(self)
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn includes_constant(&self) -> bool {
        self.include_constant
    }

    /// Split an optimizer parameter vector into (constant, ar, ma)
    fn unpack<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        let offset = usize::from(self.include_constant);
        let constant = if self.include_constant { params[0] } else { 0.0 };
        let ar = &params[offset..offset + self.order.p];
        let ma = &params[offset + self.order.p..];
        (constant, ar, ma)
    }
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new(ArimaOrder::default())
    }
}

/// One-step residuals of the differenced series under fixed parameters.
///
/// Returns the residual vector (zeros over the conditioning prefix) and the
/// conditional sum of squares.
fn css_residuals(diff: &[f64], constant: f64, ar: &[f64], ma: &[f64]) -> (Vec<f64>, f64) {
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; diff.len()];
    let mut css = 0.0;

    for t in start..diff.len() {
        let mut prediction = constant;
        for (i, phi) in ar.iter().enumerate() {
            prediction += phi * (diff[t - 1 - i] - constant);
        }
        for (j, theta) in ma.iter().enumerate() {
            prediction += theta * residuals[t - 1 - j];
        }
        let error = diff[t] - prediction;
        residuals[t] = error;
        css += error * error;
    }

    (residuals, css)
}

impl ForecastModel for ArimaModel {
    type Fitted = FittedArima;

    fn fit(&self, train: &[f64]) -> std::result::Result<FittedArima, FitError> {
        let needed = self.min_observations();
        if train.len() < needed {
            return Err(FitError::InsufficientData {
                needed,
                got: train.len(),
            });
        }
        if train.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Degenerate(
                "training segment contains non-finite values".to_string(),
            ));
        }

        let ArimaOrder { p, d, q } = self.order;
        let diff = difference(train, d);
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;

        let mut initial = Vec::with_capacity(p + q + 1);
        let mut bounds = Vec::with_capacity(p + q + 1);
        if self.include_constant {
            initial.push(mean);
            bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        }
        for i in 0..p + q {
            let lag = if i < p { i } else { i - p };
            initial.push(0.1 / (lag + 1) as f64);
            bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
        }

        let result = nelder_mead(
            |params| {
                let (constant, ar, ma) = self.unpack(params);
                css_residuals(&diff, constant, ar, ma).1
            },
            &initial,
            Some(&bounds),
            &self.optimizer,
        );

        if !result.converged {
            return Err(FitError::NonConvergence {
                iterations: result.iterations,
            });
        }
        if !result.value.is_finite() {
            return Err(FitError::Degenerate(
                "sum of squares is not finite at the optimum".to_string(),
            ));
        }

        let (constant, ar, ma) = self.unpack(&result.point);
        let (residuals, css) = css_residuals(&diff, constant, ar, ma);
        let effective = diff.len() - p.max(q);

        Ok(FittedArima {
            name: self.name.clone(),
            order: self.order,
            constant,
            ar_coefficients: ar.to_vec(),
            ma_coefficients: ma.to_vec(),
            residual_variance: css / effective as f64,
            iterations: result.iterations,
            history: train.to_vec(),
            differenced: diff,
            residuals,
        })
    }

    fn min_observations(&self) -> usize {
        self.order.min_observations()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// ARIMA state estimated from one training segment
#[derive(Debug, Clone, PartialEq)]
pub struct FittedArima {
    name: String,
    order: ArimaOrder,
    constant: f64,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    residual_variance: f64,
    iterations: usize,
    /// Observed levels the state currently ends with
    history: Vec<f64>,
    /// `history` differenced `d` times
    differenced: Vec<f64>,
    /// One-step residuals aligned with `differenced`
    residuals: Vec<f64>,
}

impl FittedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Constant of the differenced process (0 when not estimated)
    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// CSS residual variance on the training segment
    pub fn residual_variance(&self) -> f64 {
        self.residual_variance
    }

    /// Optimizer iterations used by the fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of observations the state has seen
    pub fn observations(&self) -> usize {
        self.history.len()
    }

    /// Run the residual filter forward through `observations` with the
    /// coefficients held fixed.
    ///
    /// The returned state forecasts from the end of `observations` instead
    /// of the end of the training segment. Estimates are unchanged.
    pub fn condition_on(&self, observations: &[f64]) -> std::result::Result<Self, FitError> {
        if observations.iter().any(|v| !v.is_finite()) {
            return Err(FitError::Degenerate(
                "conditioning observations contain non-finite values".to_string(),
            ));
        }

        let mut history = self.history.clone();
        history.extend_from_slice(observations);
        let differenced = difference(&history, self.order.d);
        let (residuals, _) = css_residuals(
            &differenced,
            self.constant,
            &self.ar_coefficients,
            &self.ma_coefficients,
        );

        Ok(Self {
            history,
            differenced,
            residuals,
            ..self.clone()
        })
    }

    /// Point forecasts with symmetric prediction intervals at `level`.
    ///
    /// Interval widths come from the psi-weights of the integrated model,
    /// so they widen with the horizon for `d > 0`.
    pub fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<ForecastResult> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {}",
                level
            )));
        }

        let point = self.forecast(horizon)?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ValidationError(e.to_string()))?;
        let z = normal.inverse_cdf((1.0 + level) / 2.0);

        let psi = self.psi_weights(horizon);
        let mut cumulative = 0.0;
        let intervals = point
            .values()
            .iter()
            .zip(&psi)
            .map(|(value, weight)| {
                cumulative += weight * weight;
                let margin = z * (self.residual_variance * cumulative).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        ForecastResult::new_with_intervals(point.values, horizon, intervals)
    }

    /// First `count` psi-weights of `(1 + theta(B)) / ((1 - phi(B)) (1 - B)^d)`
    fn psi_weights(&self, count: usize) -> Vec<f64> {
        // AR polynomial including the differencing factor, as 1 - sum(a_i B^i)
        let mut poly = vec![1.0];
        poly.extend(self.ar_coefficients.iter().map(|phi| -phi));
        for _ in 0..self.order.d {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }
        let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

        let mut psi = Vec::with_capacity(count);
        for j in 0..count {
            if j == 0 {
                psi.push(1.0);
                continue;
            }
            let mut weight = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            for (i, a) in phi_star.iter().enumerate().take(j) {
                weight += a * psi[j - 1 - i];
            }
            psi.push(weight);
        }
        psi
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".to_string(),
            ));
        }

        let p = self.ar_coefficients.len();
        let q = self.ma_coefficients.len();
        let mut extended = self.differenced.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut prediction = self.constant;
            for i in 0..p.min(t) {
                prediction += self.ar_coefficients[i] * (extended[t - 1 - i] - self.constant);
            }
            for j in 0..q.min(t) {
                prediction += self.ma_coefficients[j] * shocks[t - 1 - j];
            }
            extended.push(prediction);
            // Future shocks have zero expectation
            shocks.push(0.0);
        }

        let future = &extended[self.differenced.len()..];
        let tails = difference_tails(&self.history, self.order.d)?;
        let values = integrate(future, &tails);

        ForecastResult::new(values, horizon)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const S1: [f64; 10] = [10.0, 10.2, 10.1, 10.3, 10.5, 10.4, 10.6, 10.8, 10.7, 10.9];

    #[test]
    fn test_min_observations() {
        assert_eq!(ArimaOrder::new(1, 1, 1).min_observations(), 4);
        assert_eq!(ArimaOrder::new(2, 1, 0).min_observations(), 5);
        assert_eq!(ArimaOrder::new(0, 0, 0).min_observations(), 2);
    }

    #[test]
    fn test_insufficient_data() {
        let err = ArimaModel::default().fit(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, FitError::InsufficientData { needed: 4, got: 3 });
        assert!(err.to_string().starts_with("insufficient data"));
    }

    #[test]
    fn test_non_finite_training_data() {
        let err = ArimaModel::default()
            .fit(&[1.0, 2.0, f64::NAN, 3.0, 4.0])
            .unwrap_err();
        assert!(matches!(err, FitError::Degenerate(_)));
    }

    #[test]
    fn test_non_convergence() {
        let optimizer = NelderMeadConfig {
            max_iter: 1,
            ..Default::default()
        };
        let model = ArimaModel::default().with_optimizer(optimizer).unwrap();
        let err = model.fit(&S1).unwrap_err();
        assert_eq!(err, FitError::NonConvergence { iterations: 1 });
    }

    #[test]
    fn test_fit_and_forecast() {
        let fitted = ArimaModel::default().fit(&S1[..8]).unwrap();

        assert_eq!(fitted.ar_coefficients().len(), 1);
        assert_eq!(fitted.ma_coefficients().len(), 1);
        assert!(fitted.ar_coefficients()[0].abs() < 1.0);
        assert_eq!(fitted.constant(), 0.0);

        let forecast = fitted.forecast(5).unwrap();
        assert_eq!(forecast.horizons(), 5);
        assert!(forecast.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let fitted = ArimaModel::default().fit(&S1).unwrap();
        assert!(fitted.forecast(0).is_err());
    }

    #[test]
    fn test_refit_is_reproducible() {
        let model = ArimaModel::default();
        let first = model.fit(&S1).unwrap();
        let second = model.fit(&S1).unwrap();

        for (a, b) in first.ar_coefficients().iter().zip(second.ar_coefficients()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6);
        }
        for (a, b) in first.ma_coefficients().iter().zip(second.ma_coefficients()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_constant_series_forecasts_the_constant() {
        let fitted = ArimaModel::default().fit(&[4.0; 12]).unwrap();
        let forecast = fitted.forecast(3).unwrap();
        for value in forecast.values() {
            assert_relative_eq!(*value, 4.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_random_walk_forecast_is_last_value() {
        let model = ArimaModel::new(ArimaOrder::new(0, 1, 0));
        let fitted = model.fit(&[1.0, 3.0, 2.0, 5.0]).unwrap();
        let forecast = fitted.forecast(2).unwrap();
        assert_eq!(forecast.values(), &[5.0, 5.0]);
    }

    #[test]
    fn test_condition_on_moves_the_origin() {
        let fitted = ArimaModel::new(ArimaOrder::new(0, 1, 0))
            .fit(&S1[..8])
            .unwrap();
        let conditioned = fitted.condition_on(&S1[8..]).unwrap();

        assert_eq!(conditioned.observations(), 10);
        assert_eq!(conditioned.forecast(1).unwrap().values(), &[10.9]);
        // Original state is untouched
        assert_eq!(fitted.forecast(1).unwrap().values(), &[10.8]);
    }

    #[test]
    fn test_intervals_widen_with_horizon() {
        let fitted = ArimaModel::default().fit(&S1).unwrap();
        let forecast = fitted.forecast_with_intervals(4, 0.95).unwrap();
        let intervals = forecast.intervals().unwrap();

        assert_eq!(intervals.len(), 4);
        let widths: Vec<f64> = intervals.iter().map(|(lo, hi)| hi - lo).collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        for ((lo, hi), value) in intervals.iter().zip(forecast.values()) {
            assert!(lo <= value && value <= hi);
        }
    }

    #[test]
    fn test_constant_without_parameters_is_rejected() {
        let model = ArimaModel::new(ArimaOrder::new(0, 0, 0));
        assert!(model.includes_constant());
        assert!(model.with_constant(false).is_err());
    }
}
