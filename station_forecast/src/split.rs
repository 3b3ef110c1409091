//! Train/test partitioning of a series

use crate::data::Series;
use crate::error::{ForecastError, Result};

/// Default share of observations used for training
pub const DEFAULT_TRAIN_RATIO: f64 = 0.8;

/// Training prefix and held-out suffix of one series
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Series,
    pub test: Series,
}

/// Split `series` into a prefix of `floor(ratio * len)` observations and
/// the remaining suffix.
///
/// Series of length 0 or 1 produce an empty training prefix; that is left
/// for the model to reject.
pub fn split(series: &Series, ratio: f64) -> Result<Split> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "train ratio must be in (0, 1), got {}",
            ratio
        )));
    }

    let train_len = (series.len() as f64 * ratio).floor() as usize;
    Ok(Split {
        train: series.slice(0, train_len),
        test: series.slice(train_len, series.len()),
    })
}
