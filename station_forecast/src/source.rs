//! Observation sources
//!
//! A source is constructed once at startup, acquires its underlying
//! resource for the duration of each `fetch`, and is closed at shutdown.

use crate::data::Observation;
use crate::error::SourceError;
use crate::utils::parse_timestamp;
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Anything that can produce station observations
pub trait ObservationSource {
    /// Fetch every available row. An empty vector is a valid result.
    fn fetch(&mut self) -> Result<Vec<Observation>, SourceError>;

    /// Release the source; later fetches fail
    fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Raw CSV row before timestamp parsing
#[derive(Debug, Deserialize)]
struct CsvRow {
    station_id: String,
    timestamp: String,
    water_level: f64,
}

/// Reads `station_id,timestamp,water_level` rows from a CSV file
#[derive(Debug)]
pub struct CsvSource {
    path: PathBuf,
    closed: bool,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            closed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationSource for CsvSource {
    fn fetch(&mut self) -> Result<Vec<Observation>, SourceError> {
        if self.closed {
            return Err(SourceError::Unavailable(format!(
                "{} has been closed",
                self.path.display()
            )));
        }

        let file = File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut observations = Vec::new();
        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row?;
            let timestamp =
                parse_timestamp(&row.timestamp).ok_or_else(|| SourceError::InvalidTimestamp {
                    value: row.timestamp.clone(),
                    row: index + 1,
                })?;
            observations.push(Observation::new(row.station_id, timestamp, row.water_level));
        }

        debug!("Read {} rows from {}", observations.len(), self.path.display());
        Ok(observations)
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed = true;
        info!("Closed source {}", self.path.display());
        Ok(())
    }
}

/// Serves a fixed set of rows
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<Observation>,
    closed: bool,
}

impl InMemorySource {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self {
            rows,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ObservationSource for InMemorySource {
    fn fetch(&mut self) -> Result<Vec<Observation>, SourceError> {
        if self.closed {
            return Err(SourceError::Unavailable(
                "in-memory source has been closed".to_string(),
            ));
        }
        Ok(self.rows.clone())
    }

    fn close(&mut self) -> Result<(), SourceError> {
        self.closed = true;
        Ok(())
    }
}
