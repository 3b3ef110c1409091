//! # Station Forecast
//!
//! Per-station ARIMA forecasting of groundwater levels.
//!
//! ## Features
//!
//! - Grouping of raw `(station_id, timestamp, water_level)` rows into series
//! - Chronological train/test splitting (80/20 by default)
//! - ARIMA(p,d,q) fitted by conditional sum of squares
//! - Held-out accuracy scoring (MSE, RMSE, MAE)
//! - Failure isolation: one station that cannot be modelled never stops a batch
//! - Source and sink collaborators (CSV, JSON lines, in-memory)
//! - Dry-run and live modes
//!
//! ## Quick Start
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use station_forecast::data::Observation;
//! use station_forecast::pipeline::Pipeline;
//! use station_forecast::source::InMemorySource;
//! use station_forecast::ForecastConfig;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let levels = [10.0, 10.2, 10.1, 10.3, 10.5, 10.4, 10.6, 10.8, 10.7, 10.9];
//! let rows: Vec<Observation> = levels
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &level)| Observation::new("S1", start + Duration::days(i as i64), level))
//!     .collect();
//!
//! // Dry run: predictions are computed and formatted but not written
//! let pipeline = Pipeline::new(&ForecastConfig::default()).unwrap();
//! let summary = pipeline.run(&mut InMemorySource::new(rows), None).unwrap();
//!
//! assert_eq!(summary.records.len(), 5);
//! assert_eq!(summary.records[0].predicted_timestamp, "2024-01-11T00:00:00+00:00");
//! ```

pub mod batch;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod forecaster;
pub mod format;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod split;
pub mod utils;

// Re-export commonly used types
pub use crate::batch::{BatchOutcome, BatchRunner};
pub use crate::config::{ForecastConfig, RunMode};
pub use crate::data::{Observation, Series};
pub use crate::error::{FitError, ForecastError, Result, SinkError, SourceError};
pub use crate::forecaster::{SeriesForecaster, StationOutcome};
pub use crate::format::{PredictionRecord, ResultFormatter};
pub use crate::models::{ArimaModel, ArimaOrder, FittedModel, ForecastModel, ForecastResult};
pub use crate::pipeline::{Pipeline, PipelineSummary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
