/// CHS (Canadian Hydrographic Service) IWLS API client
///
/// Retrieves observed water levels for Canadian tide gauges from the
/// Integrated Water Level System. Levels are metres above chart datum.
///
/// API Documentation: https://api-iwls.dfo-mpo.gc.ca/swagger-ui/index.html
///
/// Stations are addressed by an opaque id, so each fetch first resolves the
/// 5-digit station code (e.g. "07795") to that id.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::ingest::date_windows;
use crate::logging::{self, DataSource};
use crate::model::{SurgeError, TimeSeries};

pub const IWLS_BASE_URL: &str = "https://api-iwls.dfo-mpo.gc.ca/api/v1";

/// Observed water level time series code
const TIME_SERIES_CODE: &str = "wlo";

/// Longest span the data endpoint serves in one request
pub const MAX_REQUEST_DAYS: i64 = 7;

// ============================================================================
// IWLS API Response Structures
// ============================================================================

/// Entry of the `/stations?code=` lookup response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IwlsStation {
    pub id: String,
    pub code: String,
    pub official_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Single water level observation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IwlsObservation {
    pub event_date: String, // ISO 8601, "2024-01-01T00:00:00Z"
    pub value: Option<f64>,
    pub qc_flag_code: Option<String>,
}

// ============================================================================
// URL construction
// ============================================================================

pub fn build_station_lookup_url(base_url: &str, code: &str) -> String {
    format!("{}/stations?code={}", base_url, code)
}

pub fn build_data_url(
    base_url: &str,
    station_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    format!(
        "{}/stations/{}/data?time-series-code={}&from={}&to={}",
        base_url,
        station_id,
        TIME_SERIES_CODE,
        start.format("%Y-%m-%dT%H:%M:%SZ"),
        end.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}

// ============================================================================
// Response parsing
// ============================================================================

/// Picks the station whose code matches exactly out of a lookup response.
pub fn parse_station_lookup(json: &str, code: &str) -> Result<IwlsStation, SurgeError> {
    let stations: Vec<IwlsStation> = serde_json::from_str(json)?;
    stations
        .into_iter()
        .find(|s| s.code == code)
        .ok_or_else(|| SurgeError::NoDataAvailable(format!("no IWLS station with code {}", code)))
}

/// Converts a data response to a time series; null values become NaN.
pub fn parse_observations(json: &str) -> Result<TimeSeries, SurgeError> {
    let observations: Vec<IwlsObservation> = serde_json::from_str(json)?;
    let mut pairs = Vec::with_capacity(observations.len());
    for obs in observations {
        let time = DateTime::parse_from_rfc3339(&obs.event_date)
            .map_err(|e| SurgeError::Parse(format!("IWLS eventDate '{}': {}", obs.event_date, e)))?
            .with_timezone(&Utc);
        pairs.push((time, obs.value.unwrap_or(f64::NAN)));
    }
    Ok(TimeSeries::from_pairs(pairs))
}

// ============================================================================
// API Client Functions
// ============================================================================

fn get_text(client: &reqwest::blocking::Client, url: &str) -> Result<String, SurgeError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(SurgeError::HttpStatus(response.status().as_u16()));
    }
    Ok(response.text()?)
}

/// Resolve a station code to its IWLS id
pub fn lookup_station(
    client: &reqwest::blocking::Client,
    base_url: &str,
    code: &str,
) -> Result<IwlsStation, SurgeError> {
    let body = get_text(client, &build_station_lookup_url(base_url, code))?;
    parse_station_lookup(&body, code)
}

/// Fetch observed water levels between `start` and `end`
///
/// Long ranges are split into `MAX_REQUEST_DAYS` windows and stitched
/// back together.
pub fn fetch_observations(
    client: &reqwest::blocking::Client,
    base_url: &str,
    code: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<TimeSeries, SurgeError> {
    let station = lookup_station(client, base_url, code)?;
    logging::debug(
        DataSource::Chs,
        Some(station.official_name.as_str()),
        &format!("resolved code {} to id {}", code, station.id),
    );

    let mut series = TimeSeries::from_pairs([]);
    for (from, to) in date_windows(start, end, Duration::days(MAX_REQUEST_DAYS)) {
        let body = get_text(client, &build_data_url(base_url, &station.id, from, to))?;
        series.extend_after(parse_observations(&body)?);
    }

    if series.is_empty() {
        return Err(SurgeError::NoDataAvailable(format!(
            "CHS station {} returned no observations",
            code
        )));
    }
    Ok(series)
}

// ============================================================================
// Tests
// ============================================================================
