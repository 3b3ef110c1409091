//! Differencing and its inverse
//!
//! An order-`d` difference removes `d` observations from the front of the
//! series. Undoing it needs the last value seen at every intermediate level,
//! which [`difference_tails`] collects.

use crate::{MathError, Result};

/// Apply `d` rounds of first differencing.
///
/// Returns an empty vector when the series has `d` or fewer values.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Last value of the series at each differencing level `0..d`.
///
/// Element `k` is the final value of the `k`-times differenced series, so
/// element 0 is the last raw observation.
pub fn difference_tails(series: &[f64], d: usize) -> Result<Vec<f64>> {
    if series.len() <= d {
        return Err(MathError::InsufficientData(format!(
            "differencing of order {} needs more than {} values, got {}",
            d,
            d,
            series.len()
        )));
    }

    let mut tails = Vec::with_capacity(d);
    let mut level = series.to_vec();
    for _ in 0..d {
        // Non-empty by the length check above
        tails.push(level[level.len() - 1]);
        level = level.windows(2).map(|w| w[1] - w[0]).collect();
    }
    Ok(tails)
}

/// Integrate values produced on the differenced scale back to levels.
///
/// `tails` must come from [`difference_tails`] on the series that
/// `differenced` continues.
pub fn integrate(differenced: &[f64], tails: &[f64]) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for &last in tails.iter().rev() {
        let mut running = last;
        for value in result.iter_mut() {
            running += *value;
            *value = running;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_difference() {
        let diffs = difference(&[1.0, 3.0, 6.0, 10.0], 1);
        assert_eq!(diffs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_second_difference() {
        let diffs = difference(&[1.0, 3.0, 6.0, 10.0], 2);
        assert_eq!(diffs, vec![1.0, 1.0]);
    }

    #[test]
    fn test_difference_too_short() {
        assert!(difference(&[5.0], 1).is_empty());
        assert_eq!(difference(&[5.0], 0), vec![5.0]);
    }

    #[test]
    fn test_integrate_inverts_difference() {
        let series = [2.0, 4.0, 7.0, 11.0, 16.0, 22.0];
        let (head, tail) = series.split_at(4);

        for d in 0..=2 {
            let tails = difference_tails(head, d).unwrap();
            // Differences of the continuation, taken on the full series
            let full_diff = difference(&series, d);
            let continuation = &full_diff[full_diff.len() - tail.len()..];
            let restored = integrate(continuation, &tails);
            for (r, expected) in restored.iter().zip(tail) {
                assert_relative_eq!(*r, *expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_difference_tails_requires_data() {
        assert!(difference_tails(&[1.0], 1).is_err());
        assert_eq!(difference_tails(&[1.0, 4.0], 1).unwrap(), vec![4.0]);
    }
}
