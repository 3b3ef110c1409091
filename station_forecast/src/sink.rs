//! Prediction sinks
//!
//! An insert either stores every record or fails with a reason; there is
//! no partial success and no retry.

use crate::error::SinkError;
use crate::format::PredictionRecord;
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Acknowledgement of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReceipt {
    pub inserted: usize,
}

/// Anything that can persist prediction rows
pub trait PredictionSink {
    /// Store all `records` or none of them
    fn insert(&mut self, records: &[PredictionRecord]) -> Result<InsertReceipt, SinkError>;

    /// Flush and release the sink
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Appends one JSON object per record to a file
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PredictionSink for JsonLinesSink {
    fn insert(&mut self, records: &[PredictionRecord]) -> Result<InsertReceipt, SinkError> {
        // Serialize everything first so a bad record leaves the file untouched
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&buffer)?;
        writer.flush()?;

        info!("Inserted {} predictions into {}", records.len(), self.path.display());
        Ok(InsertReceipt {
            inserted: records.len(),
        })
    }
}

/// Writes records as CSV with a header row, replacing the file
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PredictionSink for CsvSink {
    fn insert(&mut self, records: &[PredictionRecord]) -> Result<InsertReceipt, SinkError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SinkError::Serialization(e.to_string()))?;

        let mut file = File::create(&self.path)?;
        file.write_all(&bytes)?;
        file.flush()?;

        info!("Inserted {} predictions into {}", records.len(), self.path.display());
        Ok(InsertReceipt {
            inserted: records.len(),
        })
    }
}

/// Keeps records in memory; can be set up to reject every insert
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    records: Vec<PredictionRecord>,
    rejection: Option<String>,
    inserts: usize,
    closed: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails every insert with `detail`
    pub fn rejecting(detail: impl Into<String>) -> Self {
        Self {
            rejection: Some(detail.into()),
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    /// Number of insert calls received, successful or not
    pub fn insert_calls(&self) -> usize {
        self.inserts
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl PredictionSink for InMemorySink {
    fn insert(&mut self, records: &[PredictionRecord]) -> Result<InsertReceipt, SinkError> {
        self.inserts += 1;
        if self.closed {
            return Err(SinkError::Rejected {
                detail: "sink has been closed".to_string(),
            });
        }
        if let Some(detail) = &self.rejection {
            return Err(SinkError::Rejected {
                detail: detail.clone(),
            });
        }
        self.records.extend_from_slice(records);
        Ok(InsertReceipt {
            inserted: records.len(),
        })
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn record(station_id: &str, level: f64) -> PredictionRecord {
        PredictionRecord {
            station_id: station_id.to_string(),
            predicted_timestamp: "2024-01-11T00:00:00+00:00".to_string(),
            predicted_water_level: level,
            model_type: "ARIMA".to_string(),
        }
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        sink.insert(&[record("S1", 1.0)]).unwrap();
        let receipt = sink.insert(&[record("S2", 2.0), record("S3", 3.0)]).unwrap();
        assert_eq!(receipt.inserted, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<PredictionRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows, vec![record("S1", 1.0), record("S2", 2.0), record("S3", 3.0)]);
    }

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predictions.csv");

        CsvSink::new(&path).insert(&[record("S1", 1.25)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "station_id,predicted_timestamp,predicted_water_level,model_type"
        );
        assert_eq!(
            lines.next().unwrap(),
            "S1,2024-01-11T00:00:00+00:00,1.25,ARIMA"
        );
    }

    #[test]
    fn test_rejecting_sink_reports_detail() {
        let mut sink = InMemorySink::rejecting("status 409: duplicate key");
        let err = sink.insert(&[record("S1", 1.0)]).unwrap_err();

        assert!(err.to_string().contains("status 409: duplicate key"));
        assert!(sink.records().is_empty());
        assert_eq!(sink.insert_calls(), 1);
    }

    #[test]
    fn test_unwritable_path_is_an_io_error() {
        let mut sink = JsonLinesSink::new("/nonexistent/dir/out.jsonl");
        let err = sink.insert(&[record("S1", 1.0)]).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
