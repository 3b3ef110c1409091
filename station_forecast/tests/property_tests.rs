//! Invariants that should hold for any generated series.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rstest::rstest;
use station_forecast::split::split;
use station_forecast::{
    ArimaModel, FittedModel, ForecastModel, Series, SeriesForecaster, StationOutcome,
};

fn make_series(values: &[f64]) -> Series {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..values.len())
        .map(|i| base + Duration::days(i as i64))
        .collect();
    Series::new("P", timestamps, values.to_vec()).unwrap()
}

fn forecaster() -> SeriesForecaster {
    SeriesForecaster::new(ArimaModel::default(), 5, Duration::days(1)).unwrap()
}

fn assert_scored(values: &[f64]) {
    match forecaster().forecast_series(&make_series(values)) {
        StationOutcome::Done(result) => {
            let mse = result.accuracy.expect("test segment is scored").mse;
            assert!(mse.is_finite());
            assert!(mse >= 0.0);
            assert_eq!(result.predictions().len(), 5);
        }
        StationOutcome::Failed(failure) => panic!("unexpected failure: {}", failure.reason),
    }
}

proptest! {
    #[test]
    fn split_is_total(
        values in prop::collection::vec(-100.0..100.0_f64, 0..60),
        ratio in 0.01..0.99_f64,
    ) {
        let series = make_series(&values);
        let parts = split(&series, ratio).unwrap();

        let mut joined = parts.train.values().to_vec();
        joined.extend_from_slice(parts.test.values());
        prop_assert_eq!(joined, values.clone());
        prop_assert_eq!(parts.train.len(), (values.len() as f64 * ratio).floor() as usize);
    }

    #[test]
    fn forecast_has_requested_length(
        values in prop::collection::vec(1.0..50.0_f64, 4..40),
        horizon in 1usize..20,
    ) {
        if let Ok(fitted) = ArimaModel::default().fit(&values) {
            let forecast = fitted.forecast(horizon).unwrap();
            prop_assert_eq!(forecast.values().len(), horizon);
            prop_assert_eq!(forecast.horizons(), horizon);
        }
    }

    #[test]
    fn constant_series_score_finite(level in -50.0..50.0_f64, len in 10usize..40) {
        let values = vec![level; len];
        assert_scored(&values);
    }
}

#[rstest]
#[case(0.0, 0.5, 12)]
#[case(10.0, 0.1, 10)]
#[case(-3.0, 1.5, 25)]
fn test_linear_trend_scores_finite(#[case] intercept: f64, #[case] slope: f64, #[case] len: usize) {
    let values: Vec<f64> = (0..len).map(|i| intercept + slope * i as f64).collect();
    assert_scored(&values);
}
