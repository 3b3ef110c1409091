//! Mapping predictions to the sink row schema

use crate::config::DEFAULT_MODEL_TYPE;
use crate::error::FormatError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One forecast value for one station
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Prediction {
    pub fn new(station_id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp,
            value,
        }
    }
}

/// Row persisted to the prediction sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub station_id: String,
    /// RFC 3339, seconds precision, explicit UTC offset
    pub predicted_timestamp: String,
    pub predicted_water_level: f64,
    /// Forecasting method, for auditability
    pub model_type: String,
}

/// Converts predictions into [`PredictionRecord`] rows
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    model_type: String,
}

impl ResultFormatter {
    pub fn new(model_type: impl Into<String>) -> Self {
        Self {
            model_type: model_type.into(),
        }
    }

    /// Map every prediction, failing on the first one that cannot be stored
    pub fn format(&self, predictions: &[Prediction]) -> Result<Vec<PredictionRecord>, FormatError> {
        predictions.iter().map(|p| self.format_one(p)).collect()
    }

    fn format_one(&self, prediction: &Prediction) -> Result<PredictionRecord, FormatError> {
        if prediction.station_id.is_empty() {
            return Err(FormatError::EmptyStationId);
        }
        if !prediction.value.is_finite() {
            return Err(FormatError::NonFiniteValue {
                station_id: prediction.station_id.clone(),
                value: prediction.value,
            });
        }

        Ok(PredictionRecord {
            station_id: prediction.station_id.clone(),
            predicted_timestamp: prediction
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            predicted_water_level: prediction.value,
            model_type: self.model_type.clone(),
        })
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_TYPE)
    }
}
