//! Great-circle distances and inverse-distance-weighted interpolation
//! from model grid cells to arbitrary points (e.g. a tide gauge).

/// Earth radius used for grid distances, in km.
pub const EARTH_RADIUS_KM: f64 = 6367.0;

/// Haversine great-circle distance in km between two lon/lat points (degrees).
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (lon1, lat1, lon2, lat2) = (
        lon1.to_radians(),
        lat1.to_radians(),
        lon2.to_radians(),
        lat2.to_radians(),
    );
    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Inverse-distance-weighted mean of `values` located `distances` away.
///
/// A sample at zero distance is returned as-is. NaN samples (land cells)
/// carry no weight; if nothing finite remains the result is NaN.
pub fn interpolate_idw(values: &[f64], distances: &[f64]) -> f64 {
    let samples = values
        .iter()
        .zip(distances)
        .filter(|(v, d)| v.is_finite() && d.is_finite());

    let mut weighted = 0.0;
    let mut weights = 0.0;
    for (&v, &d) in samples {
        if d == 0.0 {
            return v;
        }
        weighted += v / d;
        weights += 1.0 / d;
    }
    if weights == 0.0 { f64::NAN } else { weighted / weights }
}

/// Curvilinear model grid: cell-centre coordinates stored row-major as
/// `[j * nx + i]`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
}

impl Grid {
    pub fn new(nx: usize, ny: usize, lons: Vec<f64>, lats: Vec<f64>) -> Option<Self> {
        if lons.len() != nx * ny || lats.len() != nx * ny {
            return None;
        }
        Some(Self { nx, ny, lons, lats })
    }

    fn index(&self, j: usize, i: usize) -> usize {
        j * self.nx + i
    }

    /// Grid indices `(j, i)` of the cell centre nearest the point.
    pub fn closest_point(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let mut best: Option<(usize, f64)> = None;
        for (k, (&glon, &glat)) in self.lons.iter().zip(&self.lats).enumerate() {
            if !(glon.is_finite() && glat.is_finite()) {
                continue;
            }
            let d = haversine(lon, lat, glon, glat);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((k, d));
            }
        }
        best.map(|(k, _)| (k / self.nx, k % self.nx))
    }

    /// IDW estimate of `field` at the point from the cells within `radius`
    /// index steps of the closest cell.
    pub fn idw_at(&self, lon: f64, lat: f64, field: &[f64], radius: usize) -> f64 {
        let Some((jc, ic)) = self.closest_point(lon, lat) else {
            return f64::NAN;
        };
        let j_range = jc.saturating_sub(radius)..=(jc + radius).min(self.ny - 1);
        let i_range = ic.saturating_sub(radius)..=(ic + radius).min(self.nx - 1);

        let mut values = Vec::new();
        let mut distances = Vec::new();
        for j in j_range {
            for i in i_range.clone() {
                let k = self.index(j, i);
                values.push(field.get(k).copied().unwrap_or(f64::NAN));
                distances.push(haversine(lon, lat, self.lons[k], self.lats[k]));
            }
        }
        interpolate_idw(&values, &distances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine(-123.0, 49.0, -123.0, 50.0);
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_is_symmetric_and_zero_on_self() {
        let a = haversine(-123.25, 49.33, -123.36, 48.41);
        let b = haversine(-123.36, 48.41, -123.25, 49.33);
        assert!((a - b).abs() < 1e-9);
        assert_eq!(haversine(-123.25, 49.33, -123.25, 49.33), 0.0);
        // Point Atkinson to Victoria is roughly 100 km
        assert!(a > 95.0 && a < 110.0, "got {} km", a);
    }

    #[test]
    fn test_idw_weights_nearer_samples_more() {
        let v = interpolate_idw(&[1.0, 4.0], &[1.0, 2.0]);
        // (1/1 + 4/2) / (1 + 1/2) = 2
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_idw_zero_distance_returns_sample() {
        assert_eq!(interpolate_idw(&[5.0, 1.0], &[2.0, 0.0]), 1.0);
    }

    #[test]
    fn test_idw_skips_land_cells() {
        assert_eq!(interpolate_idw(&[f64::NAN, 3.0], &[0.5, 1.0]), 3.0);
        assert!(interpolate_idw(&[f64::NAN], &[1.0]).is_nan());
        assert!(interpolate_idw(&[], &[]).is_nan());
    }

    fn small_grid() -> Grid {
        // 3 x 3 grid, 0.1 degree spacing
        let mut lons = Vec::new();
        let mut lats = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                lons.push(-123.3 + 0.1 * i as f64);
                lats.push(49.0 + 0.1 * j as f64);
            }
        }
        Grid::new(3, 3, lons, lats).unwrap()
    }

    #[test]
    fn test_closest_point_finds_cell() {
        let grid = small_grid();
        assert_eq!(grid.closest_point(-123.19, 49.21), Some((2, 1)));
        assert_eq!(grid.closest_point(-123.5, 48.0), Some((0, 0)));
    }

    #[test]
    fn test_idw_at_cell_centre_returns_cell_value() {
        let grid = small_grid();
        let field: Vec<f64> = (0..9).map(|k| k as f64).collect();
        let lon = grid.lons[4];
        let lat = grid.lats[4];
        assert_eq!(grid.idw_at(lon, lat, &field, 1), 4.0);
    }

    #[test]
    fn test_idw_at_uniform_field() {
        let grid = small_grid();
        let field = vec![0.25; 9];
        let v = grid.idw_at(-123.17, 49.13, &field, 1);
        assert!((v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_grid_rejects_bad_shapes() {
        assert!(Grid::new(2, 2, vec![0.0; 3], vec![0.0; 4]).is_none());
    }
}
