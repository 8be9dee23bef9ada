/// Core data types for the Salish Sea storm surge service.
///
/// This module defines the shared domain model imported by all other modules:
/// time series, tidal prediction tables, the crate error type, and the
/// timestamp parsing shared by every file and API reader.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Timestamp formats
// ---------------------------------------------------------------------------

/// Naive timestamp layouts accepted in tidal prediction and series files.
/// All naive values are taken to be UTC.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%d-%b-%Y %H:%M:%S", // 01-Jan-2015 00:00:00 (tidal prediction files)
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",    // NOAA CO-OPS
];

/// Parses a timestamp from any of the accepted layouts, or RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, SurgeError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| SurgeError::Parse(format!("unrecognized timestamp '{}'", trimmed)))
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

/// An ordered sequence of (timestamp, value) samples, held as parallel arrays.
///
/// Timestamps are expected to be strictly increasing. That is the caller's
/// responsibility: nothing here sorts or de-duplicates, and the numeric
/// routines in `analysis` trust the order they are given.
/// `is_strictly_increasing` is available for callers that want to check.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Builds a series from parallel arrays, which must be the same length.
    pub fn new(times: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, SurgeError> {
        if times.len() != values.len() {
            return Err(SurgeError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        Ok(Self { times, values })
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let (times, values) = pairs.into_iter().unzip();
        Self { times, values }
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Same timestamps, new values. Used by the element-wise transforms.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, SurgeError> {
        Self::new(self.times.clone(), values)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        is_strictly_increasing(&self.times)
    }

    /// Concatenates chunked fetches, dropping samples that do not advance
    /// past the end of `self` (request windows share their boundary instant).
    pub fn extend_after(&mut self, other: TimeSeries) {
        for (t, v) in other.iter() {
            if self.times.last().map_or(true, |last| t > *last) {
                self.times.push(t);
                self.values.push(v);
            }
        }
    }
}

pub fn is_strictly_increasing(times: &[DateTime<Utc>]) -> bool {
    times.windows(2).all(|w| w[0] < w[1])
}

// ---------------------------------------------------------------------------
// Tidal predictions
// ---------------------------------------------------------------------------

/// Harmonic tidal predictions for one station, in metres about mean sea level.
///
/// - `pred_all`: every significant constituent
/// - `pred_8`: the 8 constituents the ocean model is forced with
/// - `pred_noshallow`: every constituent except the shallow-water ones
///
/// Loaded once per station per run by `ingest::tides` and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TidalPrediction {
    times: Vec<DateTime<Utc>>,
    pred_all: Vec<f64>,
    pred_8: Vec<f64>,
    pred_noshallow: Vec<f64>,
}

impl TidalPrediction {
    pub fn new(
        times: Vec<DateTime<Utc>>,
        pred_all: Vec<f64>,
        pred_8: Vec<f64>,
        pred_noshallow: Vec<f64>,
    ) -> Result<Self, SurgeError> {
        for column in [&pred_all, &pred_8, &pred_noshallow] {
            if column.len() != times.len() {
                return Err(SurgeError::LengthMismatch {
                    times: times.len(),
                    values: column.len(),
                });
            }
        }
        Ok(Self {
            times,
            pred_all,
            pred_8,
            pred_noshallow,
        })
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn pred_all(&self) -> &[f64] {
        &self.pred_all
    }

    pub fn pred_8(&self) -> &[f64] {
        &self.pred_8
    }

    pub fn pred_noshallow(&self) -> &[f64] {
        &self.pred_noshallow
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Highest full-constituent prediction over the whole horizon.
    /// NaN rows are ignored; `None` if there are no finite predictions.
    pub fn max_pred_all(&self) -> Option<f64> {
        self.pred_all
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// First and last prediction timestamps.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.times.first()?, *self.times.last()?))
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while loading inputs or fetching observations.
///
/// The numeric routines themselves never fail: out-of-range interpolation
/// and masked inputs propagate as NaN instead.
#[derive(Debug)]
pub enum SurgeError {
    /// The expected tidal prediction file does not exist.
    TidesNotFound(PathBuf),
    /// A required column is absent from a CSV header.
    MissingColumn { file: String, column: String },
    /// A value or timestamp could not be parsed.
    Parse(String),
    /// Parallel arrays that must match in length do not.
    LengthMismatch { times: usize, values: usize },
    /// Station name not present in the registry.
    UnknownStation(String),
    /// Station exists but has no tide gauge to fetch observations from.
    NoTideGauge(String),
    /// Invalid configuration or station table contents.
    Config(String),
    /// Non-2xx HTTP response from an observation API.
    HttpStatus(u16),
    /// The API answered but reported an error or returned no usable values.
    NoDataAvailable(String),
    /// Model output could not be read.
    ModelOutput(String),

    // Forwarded errors
    Io(std::io::Error),
    Csv(csv::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
}

impl std::fmt::Display for SurgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurgeError::TidesNotFound(path) => {
                write!(f, "Tidal prediction file not found: {}", path.display())
            }
            SurgeError::MissingColumn { file, column } => {
                write!(f, "Missing column '{}' in {}", column, file)
            }
            SurgeError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SurgeError::LengthMismatch { times, values } => write!(
                f,
                "Length mismatch: {} timestamps but {} values",
                times, values
            ),
            SurgeError::UnknownStation(name) => write!(f, "Unknown station: {}", name),
            SurgeError::NoTideGauge(name) => write!(f, "No tide gauge for station: {}", name),
            SurgeError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SurgeError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            SurgeError::NoDataAvailable(msg) => write!(f, "No data available: {}", msg),
            SurgeError::ModelOutput(msg) => write!(f, "Model output error: {}", msg),
            SurgeError::Io(err) => write!(f, "I/O error: {}", err),
            SurgeError::Csv(err) => write!(f, "CSV error: {}", err),
            SurgeError::Toml(err) => write!(f, "TOML error: {}", err),
            SurgeError::Json(err) => write!(f, "JSON error: {}", err),
            SurgeError::Http(err) => write!(f, "HTTP request failed: {}", err),
        }
    }
}

impl std::error::Error for SurgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SurgeError::Io(err) => Some(err),
            SurgeError::Csv(err) => Some(err),
            SurgeError::Toml(err) => Some(err),
            SurgeError::Json(err) => Some(err),
            SurgeError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SurgeError {
    fn from(err: std::io::Error) -> Self {
        SurgeError::Io(err)
    }
}

impl From<csv::Error> for SurgeError {
    fn from(err: csv::Error) -> Self {
        SurgeError::Csv(err)
    }
}

impl From<toml::de::Error> for SurgeError {
    fn from(err: toml::de::Error) -> Self {
        SurgeError::Toml(err)
    }
}

impl From<serde_json::Error> for SurgeError {
    fn from(err: serde_json::Error) -> Self {
        SurgeError::Json(err)
    }
}

impl From<reqwest::Error> for SurgeError {
    fn from(err: reqwest::Error) -> Self {
        SurgeError::Http(err)
    }
}
