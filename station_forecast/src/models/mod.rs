//! Forecasting models for station series

use crate::error::{FitError, ForecastError, Result};
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    pub(crate) values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Prediction intervals (optional)
    pub(crate) intervals: Option<Vec<(f64, f64)>>,
    /// Timestamps (optional)
    pub(crate) timestamps: Option<Vec<DateTime<Utc>>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
            timestamps: None,
        })
    }

    /// Create a new forecast result with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, horizons)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Attach one timestamp per forecast step
    pub fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Result<Self> {
        if timestamps.len() != self.horizons {
            return Err(ForecastError::ValidationError(format!(
                "Timestamps length ({}) doesn't match horizons ({})",
                timestamps.len(),
                self.horizons
            )));
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Get the timestamps, if available
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// `(timestamp, value)` pairs; empty until timestamps are attached
    pub fn points(&self) -> Vec<(DateTime<Utc>, f64)> {
        match &self.timestamps {
            Some(timestamps) => timestamps
                .iter()
                .copied()
                .zip(self.values.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Model state estimated from one training segment
pub trait FittedModel: Debug {
    /// Point forecasts for the next `horizon` steps after the fitted data
    fn forecast(&self, horizon: usize) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a training segment
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Estimate the model on `train`
    fn fit(&self, train: &[f64]) -> std::result::Result<Self::Fitted, FitError>;

    /// Smallest training segment `fit` accepts
    fn min_observations(&self) -> usize;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod arima;

pub use arima::{ArimaModel, ArimaOrder, FittedArima};
