//! Error types for the station_forecast crate
//!
//! Each collaborator boundary has its own enum so callers can tell a
//! recoverable per-station fit failure apart from a fatal source or sink
//! failure. [`ForecastError`] wraps them all for the pipeline.

use crate::format::PredictionRecord;
use thiserror::Error;

/// A model could not be estimated for one training segment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Fewer observations than the model order requires
    #[error("insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The optimizer ran out of iterations
    #[error("optimizer did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },

    /// The series cannot be modelled (non-finite values, non-finite objective)
    #[error("degenerate series: {0}")]
    Degenerate(String),
}

/// Fetching observations failed
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid timestamp '{value}' at row {row}")]
    InvalidTimestamp { value: String, row: usize },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Persisting predictions failed
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink serialization error: {0}")]
    Serialization(String),

    #[error("sink rejected insert: {detail}")]
    Rejected { detail: String },
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SinkError {
    fn from(err: csv::Error) -> Self {
        SinkError::Serialization(err.to_string())
    }
}

/// A prediction could not be mapped to the sink row schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("prediction has an empty station id")]
    EmptyStationId,

    #[error("prediction for station {station_id} has non-finite value {value}")]
    NonFiniteValue { station_id: String, value: f64 },
}

/// Umbrella error for the crate
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Fit error: {0}")]
    Fit(#[from] FitError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The sink failed; the formatted records are kept so they are not lost
    #[error("Sink error: {source}")]
    Sink {
        #[source]
        source: SinkError,
        records: Vec<PredictionRecord>,
    },

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Math error: {0}")]
    Math(#[from] series_math::MathError),
}

impl From<SinkError> for ForecastError {
    fn from(source: SinkError) -> Self {
        ForecastError::Sink {
            source,
            records: Vec::new(),
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
