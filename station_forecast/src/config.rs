//! Run configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::{ForecastError, Result};
use crate::models::{ArimaModel, ArimaOrder};
use crate::split::DEFAULT_TRAIN_RATIO;
use crate::utils::parse_frequency;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use series_math::NelderMeadConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Label written to every persisted prediction
pub const DEFAULT_MODEL_TYPE: &str = "ARIMA";

/// Whether computed predictions are written to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Compute and format predictions but skip the sink write
    #[default]
    DryRun,
    /// Write predictions to the sink
    Live,
}

/// Optimizer settings exposed in the config file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let defaults = NelderMeadConfig::default();
        Self {
            max_iter: defaults.max_iter,
            tolerance: defaults.tolerance,
        }
    }
}

/// Configuration for a forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// ARIMA order; the baseline is (1, 1, 1)
    pub order: ArimaOrder,
    /// Estimate a constant; `None` means "only when d == 0"
    pub include_constant: Option<bool>,
    /// Share of each series used for training
    pub train_ratio: f64,
    /// Future steps to forecast per station
    pub horizon: usize,
    /// Spacing of forecast timestamps, e.g. `"1d"`
    pub frequency: String,
    /// Label stored with each prediction
    pub model_type: String,
    pub mode: RunMode,
    /// Forecast stations on the rayon pool
    pub parallel: bool,
    /// Log correlograms of each training segment
    pub diagnostics: bool,
    pub diagnostic_lags: usize,
    pub optimizer: OptimizerConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            include_constant: None,
            train_ratio: DEFAULT_TRAIN_RATIO,
            horizon: 5,
            frequency: "1d".to_string(),
            model_type: DEFAULT_MODEL_TYPE.to_string(),
            mode: RunMode::DryRun,
            parallel: false,
            diagnostics: false,
            diagnostic_lags: 30,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(ForecastError::Config(format!(
                "train_ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        if self.horizon == 0 {
            return Err(ForecastError::Config(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.model_type.trim().is_empty() {
            return Err(ForecastError::Config(
                "model_type must not be empty".to_string(),
            ));
        }
        if self.optimizer.max_iter == 0 {
            return Err(ForecastError::Config(
                "optimizer.max_iter must be at least 1".to_string(),
            ));
        }
        self.step()?;
        self.model()?;
        Ok(())
    }

    /// Forecast step as a duration
    pub fn step(&self) -> Result<Duration> {
        parse_frequency(&self.frequency)
    }

    /// Build the configured model
    pub fn model(&self) -> Result<ArimaModel> {
        let optimizer = NelderMeadConfig {
            max_iter: self.optimizer.max_iter,
            tolerance: self.optimizer.tolerance,
            ..NelderMeadConfig::default()
        };
        let model = ArimaModel::new(self.order).with_optimizer(optimizer)?;
        match self.include_constant {
            Some(include) => model.with_constant(include),
            None => Ok(model),
        }
    }
}
