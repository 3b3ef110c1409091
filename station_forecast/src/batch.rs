//! Forecasting every station in a batch

use crate::data::{group_by_station, Observation, Series};
use crate::forecaster::{SeriesForecaster, StationFailure, StationOutcome};
use crate::format::Prediction;
use crate::metrics::AccuracyReport;
use log::{info, warn};
use rayon::prelude::*;

/// How a successfully forecast station scored on its test segment
#[derive(Debug, Clone, PartialEq)]
pub struct StationEvaluation {
    pub station_id: String,
    pub train_len: usize,
    pub test_len: usize,
    /// `None` when the station had no test segment to score
    pub accuracy: Option<AccuracyReport>,
}

/// Everything a batch run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Predictions of every station that reached `Done`, in station order
    pub predictions: Vec<Prediction>,
    /// Stations that reached `Failed`
    pub failures: Vec<StationFailure>,
    /// Scores of stations that reached `Done`
    pub evaluations: Vec<StationEvaluation>,
}

impl BatchOutcome {
    /// Number of stations seen
    pub fn station_count(&self) -> usize {
        self.failures.len() + self.evaluations.len()
    }

    /// Predictions of one station
    pub fn predictions_for<'a>(
        &'a self,
        station_id: &'a str,
    ) -> impl Iterator<Item = &'a Prediction> + 'a {
        self.predictions
            .iter()
            .filter(move |p| p.station_id == station_id)
    }
}

/// Runs a [`SeriesForecaster`] over every station of a batch
#[derive(Debug, Clone)]
pub struct BatchRunner {
    forecaster: SeriesForecaster,
    parallel: bool,
}

impl BatchRunner {
    pub fn new(forecaster: SeriesForecaster) -> Self {
        Self {
            forecaster,
            parallel: false,
        }
    }

    /// Forecast stations on the rayon pool
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Group rows by station and forecast each group.
    ///
    /// A station whose model fails contributes no predictions; the failure
    /// is recorded and the batch carries on.
    pub fn run(&self, rows: Vec<Observation>) -> BatchOutcome {
        if rows.is_empty() {
            info!("No observations in batch, nothing to forecast");
            return BatchOutcome::default();
        }

        let groups = group_by_station(rows);
        info!("Forecasting {} stations", groups.len());
        self.run_series(&groups)
    }

    /// Forecast already grouped series
    pub fn run_series(&self, groups: &[Series]) -> BatchOutcome {
        let outcomes: Vec<StationOutcome> = if self.parallel {
            groups
                .par_iter()
                .map(|series| self.forecaster.forecast_series(series))
                .collect()
        } else {
            groups
                .iter()
                .map(|series| self.forecaster.forecast_series(series))
                .collect()
        };

        let mut batch = BatchOutcome::default();
        for outcome in outcomes {
            match outcome {
                StationOutcome::Done(result) => {
                    batch.predictions.extend(result.predictions());
                    batch.evaluations.push(StationEvaluation {
                        station_id: result.station_id,
                        train_len: result.train_len,
                        test_len: result.test_len,
                        accuracy: result.accuracy,
                    });
                }
                StationOutcome::Failed(failure) => batch.failures.push(failure),
            }
        }

        if !batch.failures.is_empty() {
            warn!(
                "{} of {} stations produced no forecast",
                batch.failures.len(),
                groups.len()
            );
        }
        info!(
            "Batch finished: {} predictions for {} stations",
            batch.predictions.len(),
            batch.evaluations.len()
        );
        batch
    }
}
