//! Per-station forecasting
//!
//! One call walks a series through split, fit, optional scoring and the
//! future forecast. A failed fit ends the walk with no predictions; it is
//! reported, never propagated.

use crate::config::ForecastConfig;
use crate::data::Series;
use crate::diagnostics::{DiagnosticsHook, NoDiagnostics};
use crate::error::{FitError, ForecastError, Result};
use crate::format::Prediction;
use crate::metrics::{evaluate, AccuracyReport};
use crate::models::{ArimaModel, FittedModel, ForecastModel, ForecastResult};
use crate::split::{split, DEFAULT_TRAIN_RATIO};
use crate::utils::future_timestamps;
use chrono::Duration;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;

/// Steps of the per-station walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Splitting,
    Fitting,
    Evaluating,
    Forecasting,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Splitting => "splitting",
            Stage::Fitting => "fitting",
            Stage::Evaluating => "evaluating",
            Stage::Forecasting => "forecasting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a station produced no predictions
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The model could not be estimated
    Fit(FitError),
    /// A step after fitting broke its contract
    Forecast(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Fit(e) => write!(f, "{}", e),
            FailureReason::Forecast(detail) => write!(f, "forecast failed: {}", detail),
        }
    }
}

/// A station that reached [`Stage::Failed`]
#[derive(Debug, Clone, PartialEq)]
pub struct StationFailure {
    pub station_id: String,
    /// Stage the walk was in when it failed
    pub stage: Stage,
    pub reason: FailureReason,
}

/// Successful result for one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationForecast {
    pub station_id: String,
    /// Future values with their timestamps attached
    pub forecast: ForecastResult,
    /// Score on the test segment, when there was one
    pub accuracy: Option<AccuracyReport>,
    pub train_len: usize,
    pub test_len: usize,
}

impl StationForecast {
    /// Predictions tagged with this station
    pub fn predictions(&self) -> Vec<Prediction> {
        self.forecast
            .points()
            .into_iter()
            .map(|(timestamp, value)| Prediction::new(self.station_id.clone(), timestamp, value))
            .collect()
    }
}

/// Terminal state of one station's walk
#[derive(Debug, Clone, PartialEq)]
pub enum StationOutcome {
    Done(StationForecast),
    Failed(StationFailure),
}

/// Runs the split / fit / score / forecast walk for one series
#[derive(Clone)]
pub struct SeriesForecaster {
    model: ArimaModel,
    train_ratio: f64,
    horizon: usize,
    step: Duration,
    hook: Arc<dyn DiagnosticsHook>,
}

impl fmt::Debug for SeriesForecaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesForecaster")
            .field("model", &self.model)
            .field("train_ratio", &self.train_ratio)
            .field("horizon", &self.horizon)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl SeriesForecaster {
    /// Create a forecaster with the default 80/20 split and no diagnostics
    pub fn new(model: ArimaModel, horizon: usize, step: Duration) -> Result<Self> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if step <= Duration::zero() {
            return Err(ForecastError::InvalidParameter(format!(
                "forecast step must be positive, got {}",
                step
            )));
        }

        Ok(Self {
            model,
            train_ratio: DEFAULT_TRAIN_RATIO,
            horizon,
            step,
            hook: Arc::new(NoDiagnostics),
        })
    }

    /// Build a forecaster from a validated config
    pub fn from_config(config: &ForecastConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.model()?, config.horizon, config.step()?)?
            .with_train_ratio(config.train_ratio)
    }

    /// Use a different train share
    pub fn with_train_ratio(mut self, ratio: f64) -> Result<Self> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train ratio must be in (0, 1), got {}",
                ratio
            )));
        }
        self.train_ratio = ratio;
        Ok(self)
    }

    /// Install a diagnostics hook
    pub fn with_hook(mut self, hook: Arc<dyn DiagnosticsHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn model(&self) -> &ArimaModel {
        &self.model
    }

    /// Forecast one station.
    ///
    /// Never fails: problems end in [`StationOutcome::Failed`].
    pub fn forecast_series(&self, series: &Series) -> StationOutcome {
        let station_id = series.station_id();
        transition(station_id, Stage::Idle, Stage::Splitting);

        let parts = match split(series, self.train_ratio) {
            Ok(parts) => parts,
            Err(e) => {
                return failed(station_id, Stage::Splitting, FailureReason::Forecast(e.to_string()))
            }
        };
        let train = parts.train.values();
        let test = parts.test.values();

        self.hook.on_training_segment(station_id, train);
        transition(station_id, Stage::Splitting, Stage::Fitting);

        let fitted = match self.model.fit(train) {
            Ok(fitted) => fitted,
            Err(e) => return failed(station_id, Stage::Fitting, FailureReason::Fit(e)),
        };
        debug!(
            "station {}: {} fitted in {} iterations (ar {:?}, ma {:?})",
            station_id,
            fitted.name(),
            fitted.iterations(),
            fitted.ar_coefficients(),
            fitted.ma_coefficients()
        );

        let mut stage = Stage::Fitting;
        let accuracy = if test.is_empty() {
            info!("station {}: no test segment, skipping scoring", station_id);
            None
        } else {
            transition(station_id, stage, Stage::Evaluating);
            stage = Stage::Evaluating;
            let scored = fitted
                .forecast(test.len())
                .and_then(|predicted| evaluate(test, predicted.values()));
            match scored {
                Ok(report) => {
                    info!("station {}: test MSE {:.4}", station_id, report.mse);
                    self.hook.on_evaluation(station_id, &report);
                    Some(report)
                }
                Err(e) => {
                    warn!("station {}: could not score test segment: {}", station_id, e);
                    None
                }
            }
        };

        transition(station_id, stage, Stage::Forecasting);
        let origin = if test.is_empty() {
            fitted
        } else {
            match fitted.condition_on(test) {
                Ok(origin) => origin,
                Err(e) => {
                    warn!(
                        "station {}: forecasting from the training fit, test segment unusable: {}",
                        station_id, e
                    );
                    fitted
                }
            }
        };

        match self.future_forecast(series, &origin) {
            Ok(forecast) => {
                transition(station_id, Stage::Forecasting, Stage::Done);
                StationOutcome::Done(StationForecast {
                    station_id: station_id.to_string(),
                    forecast,
                    accuracy,
                    train_len: parts.train.len(),
                    test_len: parts.test.len(),
                })
            }
            Err(e) => failed(
                station_id,
                Stage::Forecasting,
                FailureReason::Forecast(e.to_string()),
            ),
        }
    }

    /// Forecast past the end of `series` and attach timestamps
    fn future_forecast<F: FittedModel>(
        &self,
        series: &Series,
        fitted: &F,
    ) -> Result<ForecastResult> {
        let last = series.last_timestamp().ok_or_else(|| {
            ForecastError::ValidationError("series has no observations".to_string())
        })?;
        let timestamps = future_timestamps(last, self.horizon, self.step)?;
        fitted.forecast(self.horizon)?.with_timestamps(timestamps)
    }
}

fn transition(station_id: &str, from: Stage, to: Stage) {
    debug!("station {}: {} -> {}", station_id, from, to);
}

fn failed(station_id: &str, stage: Stage, reason: FailureReason) -> StationOutcome {
    transition(station_id, stage, Stage::Failed);
    warn!("station {}: ARIMA failed while {}: {}", station_id, stage, reason);
    StationOutcome::Failed(StationFailure {
        station_id: station_id.to_string(),
        stage,
        reason,
    })
}
