/// Generic time series files and CF-convention time axes.
///
/// Model SSH extracted at a station, or archived gauge observations, are
/// exchanged as two-column CSV files (`time,ssh` by default). NEMO output
/// stores its time axis as offsets from a reference instant described by
/// a CF `units` attribute, decoded here so the NetCDF reader stays thin.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use csv::{ReaderBuilder, Trim, WriterBuilder};

use crate::model::{parse_timestamp, SurgeError, TimeSeries};

/// Reads `time_col` and `value_col` from a headed CSV file.
pub fn load_series_csv(path: &Path, time_col: &str, value_col: &str) -> Result<TimeSeries, SurgeError> {
    let text = std::fs::read_to_string(path)?;
    parse_series_csv(&text, time_col, value_col, &path.display().to_string())
}

pub fn parse_series_csv(
    text: &str,
    time_col: &str,
    value_col: &str,
    source: &str,
) -> Result<TimeSeries, SurgeError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SurgeError::MissingColumn {
                file: source.to_string(),
                column: name.to_string(),
            })
    };
    let (t_idx, v_idx) = (find(time_col)?, find(value_col)?);

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let t = parse_timestamp(record.get(t_idx).unwrap_or_default())?;
        let raw = record.get(v_idx).unwrap_or_default();
        let v = if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            f64::NAN
        } else {
            raw.parse::<f64>()
                .map_err(|_| SurgeError::Parse(format!("{}: bad number '{}'", source, raw)))?
        };
        pairs.push((t, v));
    }
    Ok(TimeSeries::from_pairs(pairs))
}

/// Writes one or more value columns sharing `times` as CSV with an RFC 3339
/// time column.
pub fn write_series_csv<W: std::io::Write>(
    out: W,
    times: &[DateTime<Utc>],
    columns: &[(&str, &[f64])],
) -> Result<(), SurgeError> {
    let mut writer = WriterBuilder::new().from_writer(out);
    let mut header = vec!["time"];
    header.extend(columns.iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for (row, t) in times.iter().enumerate() {
        let mut record = vec![t.to_rfc3339()];
        for (_, values) in columns {
            record.push(values.get(row).map_or_else(String::new, |v| format!("{:.4}", v)));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Decodes CF time offsets such as `"seconds since 1900-01-01 00:00:00"`.
///
/// Supported units are seconds, minutes, hours and days.
pub fn decode_cf_time(values: &[f64], units: &str) -> Result<Vec<DateTime<Utc>>, SurgeError> {
    let (unit, reference) = units
        .split_once(" since ")
        .ok_or_else(|| SurgeError::Parse(format!("not a CF time unit: '{}'", units)))?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "s" => 1.0,
        "minutes" | "minute" => 60.0,
        "hours" | "hour" | "h" => 3600.0,
        "days" | "day" | "d" => 86_400.0,
        other => return Err(SurgeError::Parse(format!("unsupported CF time unit '{}'", other))),
    };
    let epoch = parse_cf_reference(reference)?;

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return Err(SurgeError::Parse(format!("non-finite time offset {}", v)));
            }
            let millis = (v * seconds_per_unit * 1000.0).round();
            let out_of_range =
                || SurgeError::Parse(format!("time offset {} {} out of range", v, unit.trim()));
            if millis.abs() >= i64::MAX as f64 {
                return Err(out_of_range());
            }
            Duration::try_milliseconds(millis as i64)
                .and_then(|offset| epoch.checked_add_signed(offset))
                .ok_or_else(out_of_range)
        })
        .collect()
}

/// Replaces samples equal to a CF `_FillValue` / `missing_value` with NaN.
///
/// Fill values stored as `f32` widen inexactly, so matching allows one
/// `f32` ulp of relative difference.
pub fn mask_fill_values(values: &mut [f64], fill_values: &[f64]) {
    let is_fill = |v: f64| {
        fill_values
            .iter()
            .any(|&fill| v == fill || (v - fill).abs() <= f32::EPSILON as f64 * fill.abs())
    };
    for v in values.iter_mut() {
        if is_fill(*v) {
            *v = f64::NAN;
        }
    }
}

/// CF reference instants may be date-only or carry a trailing zone.
fn parse_cf_reference(reference: &str) -> Result<DateTime<Utc>, SurgeError> {
    let trimmed = reference.trim().trim_end_matches(" UTC").trim_end_matches('Z');
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    parse_timestamp(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_nemo_time_counter() {
        let t = decode_cf_time(&[3_660_595_200.0, 3_660_597_000.0], "seconds since 1900-01-01 00:00:00")
            .unwrap();
        assert_eq!(t[0], Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(t[1], Utc.with_ymd_and_hms(2016, 1, 1, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_decode_fractional_days_from_date_only_reference() {
        let t = decode_cf_time(&[1.5], "days since 2020-03-01").unwrap();
        assert_eq!(t[0], Utc.with_ymd_and_hms(2020, 3, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_decode_rejects_unknown_units() {
        assert!(decode_cf_time(&[1.0], "fortnights since 2020-01-01").is_err());
        assert!(decode_cf_time(&[1.0], "seconds").is_err());
        assert!(decode_cf_time(&[f64::NAN], "seconds since 2020-01-01").is_err());
    }

    #[test]
    fn test_decode_huge_offset_is_error_not_panic() {
        let result = decode_cf_time(&[1.0e18], "seconds since 1900-01-01 00:00:00");
        assert!(matches!(result, Err(SurgeError::Parse(_))));
        assert!(decode_cf_time(&[-1.0e15], "days since 1900-01-01").is_err());
    }

    #[test]
    fn test_fill_values_become_nan() {
        let mut ssh = vec![0.42, 1.0e20, f64::from(1.0e20_f32), -0.1, 0.0];
        mask_fill_values(&mut ssh, &[1.0e20]);
        assert_eq!(ssh[0], 0.42);
        assert!(ssh[1].is_nan());
        assert!(ssh[2].is_nan(), "f32-widened fill value should still match");
        assert_eq!(ssh[3], -0.1);
        assert_eq!(ssh[4], 0.0);

        let mut land = vec![0.0, 0.3];
        mask_fill_values(&mut land, &[0.0]);
        assert!(land[0].is_nan());
        assert_eq!(land[1], 0.3);
    }

    #[test]
    fn test_no_fill_values_leaves_data_alone() {
        let mut ssh = vec![1.0e20, 0.0];
        mask_fill_values(&mut ssh, &[]);
        assert_eq!(ssh, vec![1.0e20, 0.0]);
    }

    #[test]
    fn test_parse_series_csv_by_column_name() {
        let text = "ssh,time\n0.25,2016-01-01 00:00:00\n,2016-01-01 01:00:00\n";
        let s = parse_series_csv(text, "time", "ssh", "inline").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.values()[0], 0.25);
        assert!(s.values()[1].is_nan());
        assert_eq!(s.times()[1], Utc.with_ymd_and_hms(2016, 1, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_series_csv_missing_column() {
        let result = parse_series_csv("time,wlev\n", "time", "ssh", "inline");
        assert!(matches!(result, Err(SurgeError::MissingColumn { .. })));
    }

    #[test]
    fn test_write_series_csv_layout() {
        let t = [Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap()];
        let mut buf = Vec::new();
        write_series_csv(&mut buf, &t, &[("ssh", &[1.23456][..]), ("residual", &[f64::NAN][..])]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "time,ssh,residual\n2016-01-01T00:00:00+00:00,1.2346,NaN\n");
    }
}
