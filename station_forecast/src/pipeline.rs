//! End-to-end run: fetch, forecast every station, format, insert

use crate::batch::{BatchOutcome, BatchRunner};
use crate::config::{ForecastConfig, RunMode};
use crate::diagnostics::CorrelogramLogger;
use crate::error::{ForecastError, Result};
use crate::forecaster::SeriesForecaster;
use crate::format::{PredictionRecord, ResultFormatter};
use crate::sink::PredictionSink;
use crate::source::ObservationSource;
use log::{error, info, warn};
use std::sync::Arc;

/// What a pipeline run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub mode: RunMode,
    pub batch: BatchOutcome,
    /// Formatted rows, whether or not they were written
    pub records: Vec<PredictionRecord>,
    /// Rows acknowledged by the sink; zero in dry-run mode
    pub inserted: usize,
}

impl PipelineSummary {
    pub fn station_count(&self) -> usize {
        self.batch.station_count()
    }

    pub fn failed_station_count(&self) -> usize {
        self.batch.failures.len()
    }
}

/// Wires a source, the batch runner and a sink together
#[derive(Debug, Clone)]
pub struct Pipeline {
    mode: RunMode,
    runner: BatchRunner,
    formatter: ResultFormatter,
}

impl Pipeline {
    /// Build a pipeline from a config, validating it first
    pub fn new(config: &ForecastConfig) -> Result<Self> {
        let mut forecaster = SeriesForecaster::from_config(config)?;
        if config.diagnostics {
            forecaster =
                forecaster.with_hook(Arc::new(CorrelogramLogger::new(config.diagnostic_lags)));
        }

        Ok(Self {
            mode: config.mode,
            runner: BatchRunner::new(forecaster).with_parallelism(config.parallel),
            formatter: ResultFormatter::new(config.model_type.clone()),
        })
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Run once, then close both collaborators.
    ///
    /// A sink is only required in live mode. If the sink fails, the
    /// formatted records travel back inside [`ForecastError::Sink`].
    pub fn run(
        &self,
        source: &mut dyn ObservationSource,
        mut sink: Option<&mut dyn PredictionSink>,
    ) -> Result<PipelineSummary> {
        let result = match sink.as_mut() {
            Some(sink) => self.execute(source, Some(&mut **sink)),
            None => self.execute(source, None),
        };

        let closed_source = source.close();
        if let Err(e) = &closed_source {
            error!("Failed to close source: {}", e);
        }
        let closed_sink = match sink {
            Some(sink) => sink.close(),
            None => Ok(()),
        };
        if let Err(e) = &closed_sink {
            error!("Failed to close sink: {}", e);
        }

        let summary = result?;
        closed_source?;
        if let Err(source) = closed_sink {
            return Err(ForecastError::Sink {
                source,
                records: summary.records,
            });
        }
        Ok(summary)
    }

    fn execute(
        &self,
        source: &mut dyn ObservationSource,
        sink: Option<&mut dyn PredictionSink>,
    ) -> Result<PipelineSummary> {
        let rows = source.fetch().map_err(|e| {
            error!("Failed to fetch observations: {}", e);
            ForecastError::from(e)
        })?;
        info!("Fetched {} observations", rows.len());

        let batch = self.runner.run(rows);
        let records = self.formatter.format(&batch.predictions).map_err(|e| {
            error!("Failed to format predictions: {}", e);
            ForecastError::from(e)
        })?;

        let inserted = match self.mode {
            RunMode::DryRun => {
                info!("Dry run: {} predictions not written", records.len());
                0
            }
            RunMode::Live => {
                let sink = sink.ok_or_else(|| {
                    ForecastError::Config("live mode requires a prediction sink".to_string())
                })?;
                insert(sink, &records)?
            }
        };

        Ok(PipelineSummary {
            mode: self.mode,
            batch,
            records,
            inserted,
        })
    }
}

fn insert(sink: &mut dyn PredictionSink, records: &[PredictionRecord]) -> Result<usize> {
    if records.is_empty() {
        warn!("No predictions to insert");
        return Ok(0);
    }

    match sink.insert(records) {
        Ok(receipt) => {
            info!("Inserted {} predictions", receipt.inserted);
            Ok(receipt.inserted)
        }
        Err(e) => {
            error!("Failed to insert {} predictions: {}", records.len(), e);
            Err(ForecastError::Sink {
                source: e,
                records: records.to_vec(),
            })
        }
    }
}
