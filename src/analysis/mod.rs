/// Numeric post-processing of model output and observations.
///
/// Every routine here is a pure function of its inputs: no I/O, no logging,
/// no state carried between calls. Out-of-range or masked inputs propagate
/// as NaN rather than raising errors.
///
/// Submodules:
/// - `interpolate`: linear interpolation onto a reference time base.
/// - `correction`: tidal correction of model SSH and storm surge residuals.
/// - `depth`: trapezoidal depth averaging.
/// - `idw`: haversine distance and inverse-distance-weighted interpolation.

pub mod correction;
pub mod depth;
pub mod idw;
pub mod interpolate;
