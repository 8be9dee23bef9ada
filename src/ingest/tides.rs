/// Tidal prediction table loader.
///
/// Prediction files are produced offline by harmonic analysis, one per
/// station, and live in a single directory. Each file starts with three
/// metadata rows (harmonics source, datum, generation date), followed by a
/// CSV header and one row per prediction time:
///
/// ```text
/// Harmonics from: 7795harmo_constituents.csv
/// Mean: 3.09
/// Created: 2016-01-11
/// time , pred_8 , pred_all , pred_noshallow
/// 01-Jan-2015 00:00:00 , 0.8261 , 0.8572 , 0.8349
/// ```
///
/// Columns are located by header name, so their order does not matter.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::logging::{self, DataSource};
use crate::model::{parse_timestamp, SurgeError, TidalPrediction};

/// Metadata rows preceding the CSV header.
pub const METADATA_ROWS: usize = 3;

/// Date range covered by the current prediction files.
pub const PREDICTION_RANGE_SUFFIX: &str = "01-Jan-2015_01-Jan-2020";

const COLUMNS: [&str; 4] = ["time", "pred_all", "pred_8", "pred_noshallow"];

/// File name of a station's tidal prediction table.
pub fn tidal_prediction_filename(station: &str) -> String {
    format!("{}_tidal_prediction_{}.csv", station, PREDICTION_RANGE_SUFFIX)
}

pub fn tidal_prediction_path(station: &str, dir: &Path) -> PathBuf {
    dir.join(tidal_prediction_filename(station))
}

/// Loads the tidal predictions for `station` from `dir`.
///
/// A missing file is reported as `SurgeError::TidesNotFound`. There is no
/// retry and no fallback to another station.
pub fn get_tides(station: &str, dir: &Path) -> Result<TidalPrediction, SurgeError> {
    let path = tidal_prediction_path(station, dir);
    if !path.is_file() {
        logging::error(
            DataSource::Tides,
            Some(station),
            &format!("no prediction file at {}", path.display()),
        );
        return Err(SurgeError::TidesNotFound(path));
    }
    let tides = load_tidal_predictions(&path)?;
    logging::debug(
        DataSource::Tides,
        Some(station),
        &format!("loaded {} predictions from {}", tides.len(), path.display()),
    );
    Ok(tides)
}

/// Reads one tidal prediction file.
pub fn load_tidal_predictions(path: &Path) -> Result<TidalPrediction, SurgeError> {
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => SurgeError::TidesNotFound(path.to_path_buf()),
        _ => SurgeError::Io(err),
    })?;
    let tides = parse_tidal_predictions(&text, &path.display().to_string())?;
    if !crate::model::is_strictly_increasing(tides.times()) {
        logging::warn(
            DataSource::Tides,
            None,
            &format!("{}: prediction times are not strictly increasing", path.display()),
        );
    }
    Ok(tides)
}

/// Parses the text of a tidal prediction file. `source` names the file in
/// error messages.
pub fn parse_tidal_predictions(text: &str, source: &str) -> Result<TidalPrediction, SurgeError> {
    let body: String = text
        .lines()
        .skip(METADATA_ROWS)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let [time_idx, all_idx, eight_idx, noshallow_idx] = locate_columns(&headers, source)?;

    let mut times = Vec::new();
    let mut pred_all = Vec::new();
    let mut pred_8 = Vec::new();
    let mut pred_noshallow = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = row + METADATA_ROWS + 2;
        times.push(parse_timestamp(field(&record, time_idx, source, line)?).map_err(|e| {
            SurgeError::Parse(format!("{} line {}: {}", source, line, e))
        })?);
        pred_all.push(parse_value(&record, all_idx, source, line)?);
        pred_8.push(parse_value(&record, eight_idx, source, line)?);
        pred_noshallow.push(parse_value(&record, noshallow_idx, source, line)?);
    }

    TidalPrediction::new(times, pred_all, pred_8, pred_noshallow)
}

fn locate_columns(headers: &StringRecord, source: &str) -> Result<[usize; 4], SurgeError> {
    let mut indices = [0usize; 4];
    for (slot, name) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| SurgeError::MissingColumn {
                file: source.to_string(),
                column: name.to_string(),
            })?;
    }
    Ok(indices)
}

fn field<'r>(
    record: &'r StringRecord,
    idx: usize,
    source: &str,
    line: usize,
) -> Result<&'r str, SurgeError> {
    record
        .get(idx)
        .ok_or_else(|| SurgeError::Parse(format!("{} line {}: short row", source, line)))
}

/// Empty cells and "NaN" become NaN; anything else must be a number.
fn parse_value(record: &StringRecord, idx: usize, source: &str, line: usize) -> Result<f64, SurgeError> {
    let raw = field(record, idx, source, line)?;
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| {
        SurgeError::Parse(format!("{} line {}: bad number '{}'", source, line, raw))
    })
}
