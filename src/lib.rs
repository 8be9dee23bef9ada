//! Tidal correction and storm surge residuals for SalishSeaCast.
//!
//! Raw NEMO sea surface height is forced with only 8 tidal constituents.
//! This crate corrects it for the missing constituents, removes the full
//! tidal prediction to leave the storm surge residual, and classifies the
//! forecast maximum at each tide gauge into a risk band. Observed water
//! levels from CHS and NOAA gauges go through the same residual path.
//!
//! Modules:
//! - `model`: time series, tidal prediction tables, errors.
//! - `analysis`: interpolation, correction, depth averaging, IDW.
//! - `alert`: maximum SSH, risk classification, run report.
//! - `ingest`: tidal prediction files, model output, observation APIs.
//! - `stations`: station attribute table.
//! - `config`, `logging` and `theme`: runtime settings.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod stations;
pub mod theme;
