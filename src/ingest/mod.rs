/// Input readers: tidal prediction tables, model output, and observed
/// water levels from the CHS and NOAA web services.
///
/// Submodules:
/// - `tides`: per-station tidal prediction CSV files.
/// - `series`: generic time series CSV files and CF time decoding.
/// - `chs`: Canadian Hydrographic Service IWLS API.
/// - `noaa`: NOAA CO-OPS API.
/// - `nemo`: NEMO NetCDF results (feature `netcdf`).

pub mod chs;
#[cfg(feature = "netcdf")]
pub mod nemo;
pub mod noaa;
pub mod series;
pub mod tides;

use chrono::{DateTime, Duration, Utc};

use crate::config::ApiConfig;
use crate::logging::{self, DataSource};
use crate::model::{SurgeError, TimeSeries};
use crate::stations::{Agency, Station};

/// Splits `[start, end]` into consecutive windows no longer than `span`.
/// Adjacent windows share their boundary instant. Empty if `end <= start`.
pub fn date_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    span: Duration,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows = Vec::new();
    if span <= Duration::zero() {
        return windows;
    }
    let mut from = start;
    while from < end {
        let to = (from + span).min(end);
        windows.push((from, to));
        from = to;
    }
    windows
}

/// Observed water levels for `station` from whichever agency runs its gauge,
/// in metres above chart datum.
pub fn fetch_observed_ssh(
    client: &reqwest::blocking::Client,
    apis: &ApiConfig,
    station: &Station,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<TimeSeries, SurgeError> {
    let gauge = station
        .tide_gauge
        .ok_or_else(|| SurgeError::NoTideGauge(station.name.clone()))?;

    let (source, result) = match gauge.agency {
        Agency::Chs => (
            DataSource::Chs,
            chs::fetch_observations(client, &apis.chs_base_url, &gauge.code(), start, end),
        ),
        Agency::Noaa => (
            DataSource::Noaa,
            noaa::fetch_water_levels(client, &apis.noaa_base_url, &gauge.code(), start, end),
        ),
    };

    match &result {
        Ok(series) => logging::info(
            source,
            Some(station.name.as_str()),
            &format!("fetched {} observations", series.len()),
        ),
        Err(err) => logging::log_fetch_failure(source, &station.name, "observation fetch", err),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_windows_cover_range_without_gaps() {
        let windows = date_windows(at(1, 0), at(16, 12), Duration::days(7));
        assert_eq!(
            windows,
            vec![
                (at(1, 0), at(8, 0)),
                (at(8, 0), at(15, 0)),
                (at(15, 0), at(16, 12)),
            ]
        );
    }

    #[test]
    fn test_short_range_is_single_window() {
        assert_eq!(
            date_windows(at(1, 0), at(2, 0), Duration::days(7)),
            vec![(at(1, 0), at(2, 0))]
        );
    }

    #[test]
    fn test_empty_or_reversed_range() {
        assert!(date_windows(at(2, 0), at(2, 0), Duration::days(1)).is_empty());
        assert!(date_windows(at(3, 0), at(2, 0), Duration::days(1)).is_empty());
        assert!(date_windows(at(1, 0), at(3, 0), Duration::zero()).is_empty());
    }

    #[test]
    fn test_station_without_gauge_cannot_be_fetched() {
        let station = Station {
            name: "Sandheads".to_string(),
            latitude: 49.10,
            longitude: -123.30,
            msl: 3.1,
            extreme_ssh: 5.6,
            tide_gauge: None,
        };
        let client = reqwest::blocking::Client::new();
        let result = fetch_observed_ssh(&client, &ApiConfig::default(), &station, at(1, 0), at(2, 0));
        assert!(matches!(result, Err(SurgeError::NoTideGauge(_))));
    }
}
