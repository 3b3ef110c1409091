//! Timestamp helpers shared by the source and the forecaster

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Parse a step such as `"daily"`, `"1d"`, `"6h"` or `"15min"`
pub fn parse_frequency(frequency: &str) -> Result<Duration> {
    let normalized = frequency.trim().to_lowercase();
    let duration = match normalized.as_str() {
        "daily" | "d" | "1d" => Duration::days(1),
        "weekly" | "w" | "1w" => Duration::weeks(1),
        "hourly" | "h" | "1h" => Duration::hours(1),
        "minute" | "min" | "1min" => Duration::minutes(1),
        other => parse_counted_frequency(other).ok_or_else(|| {
            ForecastError::InvalidParameter(format!("Unsupported frequency: {}", frequency))
        })?,
    };

    Ok(duration)
}

/// `<N><unit>` with unit one of `w`, `d`, `h`, `min`/`m`
fn parse_counted_frequency(frequency: &str) -> Option<Duration> {
    let split = frequency.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = frequency.split_at(split);
    let count: i64 = count.parse().ok().filter(|n| *n > 0)?;

    match unit {
        "w" => Duration::try_weeks(count),
        "d" => Duration::try_days(count),
        "h" => Duration::try_hours(count),
        "m" | "min" => Duration::try_minutes(count),
        _ => None,
    }
}

/// Timestamps for `horizon` steps after `last_timestamp`.
///
/// Fails instead of wrapping when a step falls outside the representable
/// date range.
pub fn future_timestamps(
    last_timestamp: DateTime<Utc>,
    horizon: usize,
    step: Duration,
) -> Result<Vec<DateTime<Utc>>> {
    (1..=horizon)
        .map(|i| {
            i32::try_from(i)
                .ok()
                .and_then(|n| step.checked_mul(n))
                .and_then(|offset| last_timestamp.checked_add_signed(offset))
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "forecast step {} of {} past {} is out of range",
                        i, step, last_timestamp
                    ))
                })
        })
        .collect()
}

/// Parse a source timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
/// and bare dates; values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
