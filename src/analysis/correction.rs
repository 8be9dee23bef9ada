//! Tidal correction of model sea surface height and storm surge residuals.
//!
//! The model is forced with only 8 tidal constituents. Adding
//! `pred_noshallow - pred_8` estimates what the missing constituents would
//! have contributed, which makes model SSH comparable with observed water
//! levels. Subtracting the full-constituent prediction from either series
//! then leaves the storm surge residual.

use crate::analysis::interpolate::interp_to_model_time;
use crate::model::{TidalPrediction, TimeSeries};
use crate::stations::Station;

/// Full-constituent tidal prediction interpolated onto `times`.
pub fn tide_at(times: &[chrono::DateTime<chrono::Utc>], tides: &TidalPrediction) -> Vec<f64> {
    interp_to_model_time(times, tides.times(), tides.pred_all())
}

/// Correction for the constituents the model omits, at the model timestamps.
pub fn missing_constituents_at(
    times: &[chrono::DateTime<chrono::Utc>],
    tides: &TidalPrediction,
) -> Vec<f64> {
    let difference: Vec<f64> = tides
        .pred_noshallow()
        .iter()
        .zip(tides.pred_8())
        .map(|(noshallow, eight)| noshallow - eight)
        .collect();
    interp_to_model_time(times, tides.times(), &difference)
}

/// Adds the missing-constituent correction to raw model SSH.
///
/// The result has the model's timestamps. Samples outside the prediction
/// table's time range become NaN.
pub fn correct_model_ssh(ssh_model: &TimeSeries, tides: &TidalPrediction) -> TimeSeries {
    let correction = missing_constituents_at(ssh_model.times(), tides);
    TimeSeries::from_pairs(
        ssh_model
            .iter()
            .zip(correction)
            .map(|((t, ssh), c)| (t, ssh + c)),
    )
}

/// Storm surge residual: `ssh - pred_all` at the series' own timestamps.
///
/// Used unchanged for corrected model SSH and for observed water levels.
pub fn compute_residual(ssh: &TimeSeries, tides: &TidalPrediction) -> TimeSeries {
    let tide = tide_at(ssh.times(), tides);
    TimeSeries::from_pairs(
        ssh.iter()
            .zip(tide)
            .map(|((t, value), tide)| (t, value - tide)),
    )
}

/// Shifts observed gauge levels (chart datum) onto the mean sea level
/// reference used by the tidal predictions and the model.
pub fn relative_to_msl(observed: &TimeSeries, station: &Station) -> TimeSeries {
    TimeSeries::from_pairs(observed.iter().map(|(t, v)| (t, v - station.msl)))
}
