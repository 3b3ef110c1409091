//! Optional reporting hooks around model fitting
//!
//! Hooks observe a station's data; they never influence the fit or the
//! forecast. They must be `Send + Sync` because stations may be forecast
//! on the rayon pool.

use crate::metrics::AccuracyReport;
use log::debug;
use series_math::{correlogram, difference};

/// Observer of per-station forecasting steps
pub trait DiagnosticsHook: Send + Sync {
    /// Called with the training segment before the model is fitted
    fn on_training_segment(&self, _station_id: &str, _train: &[f64]) {}

    /// Called after the test segment has been scored
    fn on_evaluation(&self, _station_id: &str, _report: &AccuracyReport) {}
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticsHook for NoDiagnostics {}

/// Logs ACF and PACF of each first-differenced training segment at debug
/// level, as a guide for choosing `p` and `q` by hand.
#[derive(Debug, Clone, Copy)]
pub struct CorrelogramLogger {
    max_lag: usize,
}

impl CorrelogramLogger {
    pub fn new(max_lag: usize) -> Self {
        Self {
            max_lag: max_lag.max(1),
        }
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }
}

impl Default for CorrelogramLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl DiagnosticsHook for CorrelogramLogger {
    fn on_training_segment(&self, station_id: &str, train: &[f64]) {
        let diffs = difference(train, 1);
        match correlogram(&diffs, self.max_lag) {
            Ok(gram) => {
                debug!(
                    "station {}: ACF {:?} PACF {:?} (band ±{:.3})",
                    station_id,
                    rounded(&gram.acf),
                    rounded(&gram.pacf),
                    gram.confidence_band
                );
            }
            Err(e) => debug!("station {}: no correlogram ({})", station_id, e),
        }
    }

    fn on_evaluation(&self, station_id: &str, report: &AccuracyReport) {
        debug!("station {}: test accuracy {}", station_id, report);
    }
}

fn rounded(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| (v * 1000.0).round() / 1000.0).collect()
}
