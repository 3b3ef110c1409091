//! Station observations and per-station series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row from the observation source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Station the reading belongs to
    pub station_id: String,
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Measured water level
    pub water_level: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(station_id: impl Into<String>, timestamp: DateTime<Utc>, water_level: f64) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp,
            water_level,
        }
    }
}

/// Ordered readings of a single station
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    station_id: String,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series from parallel timestamp and value vectors.
    ///
    /// The caller is responsible for ordering; [`group_by_station`] sorts
    /// before constructing.
    pub fn new(
        station_id: impl Into<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> crate::Result<Self> {
        if timestamps.len() != values.len() {
            return Err(crate::ForecastError::ValidationError(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }

        Ok(Self {
            station_id: station_id.into(),
            timestamps,
            values,
        })
    }

    /// Station identifier
    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// Observation timestamps, ascending
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Observed values, aligned with [`Series::timestamps`]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of the final observation
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sub-series over `start..end`
    pub(crate) fn slice(&self, start: usize, end: usize) -> Self {
        Self {
            station_id: self.station_id.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        }
    }
}

/// Group rows into one series per station.
///
/// Stations come out in order of first appearance. Each group is sorted by
/// timestamp with a stable sort, so rows sharing a timestamp keep their
/// input order.
pub fn group_by_station(rows: Vec<Observation>) -> Vec<Series> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<(DateTime<Utc>, f64)>)> = Vec::new();

    for row in rows {
        let slot = match index.get(&row.station_id) {
            Some(&slot) => slot,
            None => {
                index.insert(row.station_id.clone(), groups.len());
                groups.push((row.station_id.clone(), Vec::new()));
                groups.len() - 1
            }
        };
        groups[slot].1.push((row.timestamp, row.water_level));
    }

    groups
        .into_iter()
        .map(|(station_id, mut points)| {
            points.sort_by_key(|(timestamp, _)| *timestamp);
            let (timestamps, values) = points.into_iter().unzip();
            Series {
                station_id,
                timestamps,
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_grouping_sorts_and_keeps_station_order() {
        let rows = vec![
            Observation::new("B", day(1), 2.0),
            Observation::new("A", day(2), 30.0),
            Observation::new("B", day(0), 1.0),
            Observation::new("A", day(0), 10.0),
        ];

        let series = group_by_station(rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].station_id(), "B");
        assert_eq!(series[0].values(), &[1.0, 2.0]);
        assert_eq!(series[1].station_id(), "A");
        assert_eq!(series[1].values(), &[10.0, 30.0]);
        assert_eq!(series[1].timestamps(), &[day(0), day(2)]);
    }

    #[test]
    fn test_grouping_is_stable_on_ties() {
        let rows = vec![
            Observation::new("A", day(1), 1.0),
            Observation::new("A", day(0), 0.0),
            Observation::new("A", day(1), 2.0),
        ];

        let series = group_by_station(rows);
        assert_eq!(series[0].values(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_empty_rows() {
        assert!(group_by_station(Vec::new()).is_empty());
    }

    #[test]
    fn test_series_length_mismatch() {
        let result = Series::new("A", vec![day(0)], vec![1.0, 2.0]);
        assert!(result.is_err());
    }
}
