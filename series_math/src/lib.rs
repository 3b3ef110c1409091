//! # Series Math
//!
//! Numeric building blocks for univariate time series models.
//! This crate has no notion of stations, timestamps or I/O; it works on
//! plain `f64` slices so the model crates can stay focused on estimation.

use thiserror::Error;

pub mod autocorrelation;
pub mod differencing;
pub mod optimization;

pub use autocorrelation::{autocorrelation, correlogram, partial_autocorrelation, Correlogram};
pub use differencing::{difference, difference_tails, integrate};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_their_detail() {
        let err = MathError::InsufficientData("need 3 values, got 1".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 3 values, got 1"
        );
    }
}
