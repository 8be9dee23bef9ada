//! Linear interpolation of time series onto a reference time base.
//!
//! Timestamps are mapped to seconds elapsed since the first reference
//! timestamp, then interpolated with ordinary 1-D linear interpolation.
//! Requests outside the source range come back as NaN; there is no
//! extrapolation.
//!
//! Source timestamps are assumed sorted ascending. Unsorted input is not
//! detected and gives unspecified (but non-panicking) results.

use chrono::{DateTime, Utc};

/// Seconds elapsed from `epoch` for each timestamp (negative before it).
pub fn seconds_since(epoch: DateTime<Utc>, times: &[DateTime<Utc>]) -> Vec<f64> {
    times
        .iter()
        .map(|t| (*t - epoch).num_milliseconds() as f64 / 1000.0)
        .collect()
}

/// Interpolates `source_values` (sampled at `source_times`) onto `reference`.
///
/// Returns one value per reference timestamp.
pub fn interp_to_model_time(
    reference: &[DateTime<Utc>],
    source_times: &[DateTime<Utc>],
    source_values: &[f64],
) -> Vec<f64> {
    let Some(&epoch) = reference.first() else {
        return Vec::new();
    };
    let x = seconds_since(epoch, reference);
    let xp = seconds_since(epoch, source_times);
    interp_linear(&x, &xp, source_values)
}

/// 1-D linear interpolation of `(xp, fp)` at each `x`.
///
/// - `x` exactly on a sample point returns that sample's value unchanged
/// - `x` outside `[xp[0], xp[last]]`, or NaN, returns NaN
/// - empty `xp` returns all NaN
///
/// `xp` and `fp` are paired up to the shorter of the two.
pub fn interp_linear(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    let (xp, fp) = (&xp[..n], &fp[..n]);
    x.iter().map(|&xi| interp_one(xi, xp, fp)).collect()
}

fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (Some(&lo), Some(&hi)) = (xp.first(), xp.last()) else {
        return f64::NAN;
    };
    if x.is_nan() || x < lo || x > hi {
        return f64::NAN;
    }

    // index of the first sample strictly greater than x
    let upper = xp.partition_point(|&p| p <= x);
    if upper == 0 {
        return f64::NAN;
    }
    let j = upper - 1;
    if xp[j] == x || j + 1 >= xp.len() {
        return fp[j];
    }

    let (x0, x1) = (xp[j], xp[j + 1]);
    let (y0, y1) = (fp[j], fp[j + 1]);
    let frac = (x - x0) / (x1 - x0);
    y0 + (y1 - y0) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_half_hour_reference_on_hourly_source() {
        let src_t = [t0(), t0() + Duration::hours(1), t0() + Duration::hours(2)];
        let src_v = [1.0, 2.0, 3.0];
        let reference = [t0(), t0() + Duration::minutes(30), t0() + Duration::hours(2)];

        let out = interp_to_model_time(&reference, &src_t, &src_v);
        assert_eq!(out, vec![1.0, 1.5, 3.0]);
    }

    #[test]
    fn test_exact_source_timestamps_return_source_values() {
        let src_t: Vec<_> = (0..5).map(|h| t0() + Duration::hours(h)).collect();
        let src_v = [0.31, -1.7, 2.25, 0.0, 4.125];

        let out = interp_to_model_time(&src_t, &src_t, &src_v);
        assert_eq!(out, src_v.to_vec());
    }

    #[test]
    fn test_outside_source_range_is_nan() {
        let src_t = [t0() + Duration::hours(1), t0() + Duration::hours(3)];
        let src_v = [1.0, 2.0];
        let reference = [
            t0(),
            t0() + Duration::hours(2),
            t0() + Duration::hours(4),
        ];

        let out = interp_to_model_time(&reference, &src_t, &src_v);
        assert!(out[0].is_nan(), "before the source range should be NaN");
        assert!((out[1] - 1.5).abs() < 1e-12);
        assert!(out[2].is_nan(), "after the source range should be NaN");
    }

    #[test]
    fn test_interpolated_values_stay_within_source_bounds() {
        let src_t: Vec<_> = (0..24).map(|h| t0() + Duration::hours(h)).collect();
        let src_v: Vec<f64> = (0..24).map(|h| (h as f64 * 0.5).sin() * 2.0 + 3.0).collect();
        let reference: Vec<_> = (0..(23 * 6)).map(|m| t0() + Duration::minutes(m * 10)).collect();

        let lo = src_v.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = src_v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for v in interp_to_model_time(&reference, &src_t, &src_v) {
            assert!(v >= lo && v <= hi, "{} escaped [{}, {}]", v, lo, hi);
        }
    }

    #[test]
    fn test_empty_source_gives_all_nan() {
        let out = interp_to_model_time(&[t0(), t0() + Duration::hours(1)], &[], &[]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_empty_reference_gives_empty_output() {
        assert!(interp_to_model_time(&[], &[t0()], &[1.0]).is_empty());
    }

    #[test]
    fn test_single_sample_source_only_matches_exactly() {
        let out = interp_linear(&[0.0, 1.0], &[0.0], &[7.5]);
        assert_eq!(out[0], 7.5);
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_nan_source_value_propagates_to_neighbouring_interval() {
        let out = interp_linear(&[0.5, 1.5], &[0.0, 1.0, 2.0], &[1.0, f64::NAN, 3.0]);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
    }

    #[test]
    fn test_seconds_since_is_negative_before_epoch() {
        let s = seconds_since(t0(), &[t0() - Duration::minutes(1), t0() + Duration::seconds(90)]);
        assert_eq!(s, vec![-60.0, 90.0]);
    }
}
