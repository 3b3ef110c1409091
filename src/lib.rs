//! # Groundwater Workspace
//!
//! Umbrella crate for the groundwater forecasting workspace.
//!
//! - [`series_math`]: differencing, simplex optimization, autocorrelation
//! - [`station_forecast`]: per-station ARIMA forecasting, collaborators and
//!   the `forecast_stations` binary
//!
//! ## Example
//!
//! ```
//! use groundwater_workspace::series_math::difference;
//!
//! assert_eq!(difference(&[1.0, 3.0, 6.0], 1), vec![2.0, 3.0]);
//! ```

pub use series_math;
pub use station_forecast;

/// Versions of the member crates
pub fn versions() -> [(&'static str, &'static str); 2] {
    [
        ("series_math", series_math::VERSION),
        (station_forecast::NAME, station_forecast::VERSION),
    ]
}
