//! Depth averaging of model water column profiles.

/// Trapezoidal depth average of one water column.
///
/// `values[k]` is the field at depth `depths[k]` (metres, increasing
/// downward). Land/seabed cells are NaN; only the leading run of finite
/// levels is integrated, and the integral is divided by the depth span it
/// covers. A single wet level returns that level's value; a dry column
/// returns NaN.
pub fn depth_average(values: &[f64], depths: &[f64]) -> f64 {
    let wet = values
        .iter()
        .zip(depths)
        .take_while(|(v, d)| v.is_finite() && d.is_finite())
        .count();

    match wet {
        0 => f64::NAN,
        1 => values[0],
        _ => {
            let integral: f64 = (1..wet)
                .map(|k| 0.5 * (values[k] + values[k - 1]) * (depths[k] - depths[k - 1]))
                .sum();
            let span = depths[wet - 1] - depths[0];
            if span == 0.0 { values[0] } else { integral / span }
        }
    }
}

/// Depth averages each column of a `[depth][column]` profile block.
pub fn depth_average_columns(profiles: &[Vec<f64>], depths: &[f64]) -> Vec<f64> {
    let ncols = profiles.first().map_or(0, Vec::len);
    (0..ncols)
        .map(|c| {
            let column: Vec<f64> = profiles
                .iter()
                .map(|level| level.get(c).copied().unwrap_or(f64::NAN))
                .collect();
            depth_average(&column, depths)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_column_averages_to_itself() {
        let avg = depth_average(&[2.0, 2.0, 2.0, 2.0], &[0.5, 1.5, 3.0, 10.0]);
        assert!((avg - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_profile_averages_to_midpoint() {
        // u = z on [0, 10]: mean is 5
        let depths = [0.0, 2.0, 5.0, 10.0];
        let avg = depth_average(&depths, &depths);
        assert!((avg - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_masked_levels_below_seabed_are_excluded() {
        let avg = depth_average(&[1.0, 3.0, f64::NAN, f64::NAN], &[0.0, 4.0, 8.0, 12.0]);
        assert!((avg - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_dry_and_single_level_columns() {
        assert!(depth_average(&[f64::NAN, 1.0], &[0.0, 1.0]).is_nan());
        assert_eq!(depth_average(&[0.7, f64::NAN], &[0.5, 1.5]), 0.7);
        assert!(depth_average(&[], &[]).is_nan());
    }

    #[test]
    fn test_columns_are_averaged_independently() {
        let profiles = vec![vec![1.0, 4.0], vec![3.0, f64::NAN]];
        let out = depth_average_columns(&profiles, &[0.0, 2.0]);
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert_eq!(out[1], 4.0);
    }
}
