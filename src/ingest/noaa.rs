/// NOAA CO-OPS Data API client
///
/// Retrieves 6-minute observed water levels for the US tide gauges around
/// the Salish Sea (Cherry Point, Friday Harbor, Neah Bay).
///
/// API Documentation: https://api.tidesandcurrents.noaa.gov/api/prod/

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::ingest::date_windows;
use crate::logging::{self, DataSource};
use crate::model::{parse_timestamp, SurgeError, TimeSeries};

pub const COOPS_BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

/// Levels relative to mean lower low water, the US chart datum
const DATUM: &str = "MLLW";

/// 6-minute data is served at most 31 days per request
pub const MAX_REQUEST_DAYS: i64 = 30;

// ============================================================================
// CO-OPS API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CoopsResponse {
    pub metadata: Option<CoopsMetadata>,
    #[serde(default)]
    pub data: Vec<CoopsValue>,
    pub error: Option<CoopsError>,
}

#[derive(Debug, Deserialize)]
pub struct CoopsMetadata {
    pub id: String,
    pub name: String,
}

/// Single observation; every field arrives as a string
#[derive(Debug, Deserialize)]
pub struct CoopsValue {
    pub t: String, // "2024-01-01 00:00", GMT
    pub v: String, // water level, may be empty
    #[serde(default)]
    pub q: String, // quality: "p" preliminary, "v" verified
}

#[derive(Debug, Deserialize)]
pub struct CoopsError {
    pub message: String,
}

// ============================================================================
// URL construction
// ============================================================================

pub fn build_water_level_url(
    base_url: &str,
    station: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "{}?product=water_level&application=salish_surge&station={}\
         &begin_date={}&end_date={}&datum={}&time_zone=gmt&units=metric&format=json",
        base_url,
        station,
        start.format("%Y%m%d%%20%H:%M"),
        end.format("%Y%m%d%%20%H:%M"),
        DATUM,
    )
}

// ============================================================================
// Response parsing
// ============================================================================

/// Converts a CO-OPS JSON response into a time series.
///
/// Blank values become NaN. An `error` object in the body is reported as
/// `NoDataAvailable` carrying NOAA's message.
pub fn parse_water_levels(json: &str) -> Result<TimeSeries, SurgeError> {
    let response: CoopsResponse = serde_json::from_str(json)?;
    if let Some(err) = response.error {
        return Err(SurgeError::NoDataAvailable(err.message));
    }

    let mut pairs = Vec::with_capacity(response.data.len());
    for value in response.data {
        let time = parse_timestamp(&value.t)?;
        let level = if value.v.trim().is_empty() {
            f64::NAN
        } else {
            value
                .v
                .trim()
                .parse::<f64>()
                .map_err(|_| SurgeError::Parse(format!("CO-OPS value '{}'", value.v)))?
        };
        pairs.push((time, level));
    }
    Ok(TimeSeries::from_pairs(pairs))
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Stitches per-window results into one series.
///
/// A window NOAA reports as empty (`NoDataAvailable`) is skipped; any other
/// error stops the fetch. Fails with `NoDataAvailable` only if no window
/// returned data.
pub fn stitch_windows<I>(station: &str, windows: I) -> Result<TimeSeries, SurgeError>
where
    I: IntoIterator<Item = Result<TimeSeries, SurgeError>>,
{
    let mut series = TimeSeries::from_pairs([]);
    for window in windows {
        match window {
            Ok(chunk) => series.extend_after(chunk),
            Err(SurgeError::NoDataAvailable(msg)) => {
                logging::debug(DataSource::Noaa, Some(station), &format!("empty window: {}", msg));
            }
            Err(err) => return Err(err),
        }
    }

    if series.is_empty() {
        return Err(SurgeError::NoDataAvailable(format!(
            "No data was found for NOAA station {} in the requested range",
            station
        )));
    }
    Ok(series)
}

/// Fetch observed water levels between `start` and `end`
pub fn fetch_water_levels(
    client: &reqwest::blocking::Client,
    base_url: &str,
    station: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<TimeSeries, SurgeError> {
    let windows = date_windows(start, end, Duration::days(MAX_REQUEST_DAYS))
        .into_iter()
        .map(|(from, to)| -> Result<TimeSeries, SurgeError> {
            let url = build_water_level_url(base_url, station, from, to);
            let response = client.get(&url).send()?;
            if !response.status().is_success() {
                return Err(SurgeError::HttpStatus(response.status().as_u16()));
            }
            parse_water_levels(&response.text()?)
        });
    stitch_windows(station, windows)
}

// ============================================================================
// Tests
// ============================================================================
