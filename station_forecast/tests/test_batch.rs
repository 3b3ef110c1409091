use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use station_forecast::batch::BatchRunner;
use station_forecast::forecaster::Stage;
use station_forecast::{ArimaModel, Observation, SeriesForecaster};
use std::collections::{BTreeMap, BTreeSet};

const REFERENCE: [f64; 10] = [10.0, 10.2, 10.1, 10.3, 10.5, 10.4, 10.6, 10.8, 10.7, 10.9];

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn station_rows(station_id: &str, values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Observation::new(station_id, start() + Duration::days(i as i64), v))
        .collect()
}

fn shifted(offset: f64) -> Vec<f64> {
    REFERENCE.iter().map(|v| v + offset).collect()
}

fn runner() -> BatchRunner {
    let forecaster =
        SeriesForecaster::new(ArimaModel::default(), 5, Duration::days(1)).unwrap();
    BatchRunner::new(forecaster)
}

#[test]
fn test_reference_and_single_point_stations() {
    let mut rows = station_rows("S1", &REFERENCE);
    rows.extend(station_rows("S2", &[4.2]));

    let outcome = runner().run(rows);

    assert_eq!(outcome.station_count(), 2);
    let s1: Vec<_> = outcome.predictions_for("S1").collect();
    assert_eq!(s1.len(), 5);
    let expected: Vec<DateTime<Utc>> = (11..=15)
        .map(|day| Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
        .collect();
    let actual: Vec<DateTime<Utc>> = s1.iter().map(|p| p.timestamp).collect();
    assert_eq!(actual, expected);
    assert!(s1.iter().all(|p| p.value.is_finite()));

    let evaluation = &outcome.evaluations[0];
    assert_eq!((evaluation.train_len, evaluation.test_len), (8, 2));
    let mse = evaluation.accuracy.unwrap().mse;
    assert!(mse.is_finite() && mse >= 0.0);

    assert_eq!(outcome.predictions_for("S2").count(), 0);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.station_id, "S2");
    assert_eq!(failure.stage, Stage::Fitting);
    assert!(failure.reason.to_string().contains("insufficient data"));
}

#[test]
fn test_one_short_station_does_not_sink_the_batch() {
    let mut rows = Vec::new();
    for k in 0..5 {
        let id = format!("W{}", k);
        if k == 2 {
            rows.extend(station_rows(&id, &[3.0]));
        } else {
            rows.extend(station_rows(&id, &shifted(k as f64)));
        }
    }

    let outcome = runner().run(rows);

    let mut per_station: BTreeMap<String, usize> = BTreeMap::new();
    for prediction in &outcome.predictions {
        *per_station.entry(prediction.station_id.clone()).or_default() += 1;
    }
    let expected: BTreeMap<String, usize> = ["W0", "W1", "W3", "W4"]
        .iter()
        .map(|id| (id.to_string(), 5))
        .collect();
    assert_eq!(per_station, expected);

    let failed: BTreeSet<&str> = outcome
        .failures
        .iter()
        .map(|f| f.station_id.as_str())
        .collect();
    assert_eq!(failed, BTreeSet::from(["W2"]));
}

#[test]
fn test_empty_batch() {
    let outcome = runner().run(Vec::new());
    assert!(outcome.predictions.is_empty());
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.station_count(), 0);
}

#[test]
fn test_rows_are_sorted_before_forecasting() {
    let ordered = runner().run(station_rows("S1", &REFERENCE));

    let mut shuffled = station_rows("S1", &REFERENCE);
    shuffled.reverse();
    shuffled.swap(2, 7);
    let unordered = runner().run(shuffled);

    assert_eq!(ordered, unordered);
}

#[test]
fn test_interleaved_stations_keep_first_appearance_order() {
    let a = station_rows("A", &REFERENCE);
    let b = station_rows("B", &shifted(1.0));
    let rows: Vec<Observation> = b
        .into_iter()
        .zip(a)
        .flat_map(|(x, y)| [x, y])
        .collect();

    let outcome = runner().run(rows);
    let order: Vec<&str> = outcome
        .evaluations
        .iter()
        .map(|e| e.station_id.as_str())
        .collect();
    assert_eq!(order, vec!["B", "A"]);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut rows = Vec::new();
    for k in 0..8 {
        let values = if k % 3 == 0 { vec![1.0] } else { shifted(k as f64 * 0.5) };
        rows.extend(station_rows(&format!("P{}", k), &values));
    }

    let sequential = runner().run(rows.clone());
    let parallel = runner().with_parallelism(true).run(rows);

    assert_eq!(sequential, parallel);
}
