//! NEMO model output reader (feature `netcdf`).
//!
//! Reads the sea surface height time series at one grid point from a
//! SalishSeaCast `grid_T` results file.

use std::path::Path;

use netcdf::AttributeValue;

use crate::ingest::series::{decode_cf_time, mask_fill_values};
use crate::logging::{self, DataSource};
use crate::model::{SurgeError, TimeSeries};

pub const TIME_VAR: &str = "time_counter";
pub const SSH_VAR: &str = "sossheig";

fn nc_err(err: netcdf::Error) -> SurgeError {
    SurgeError::ModelOutput(err.to_string())
}

fn variable<'f>(file: &'f netcdf::File, name: &str) -> Result<netcdf::Variable<'f>, SurgeError> {
    file.variable(name)
        .ok_or_else(|| SurgeError::ModelOutput(format!("variable '{}' not found", name)))
}

/// Numeric value of a scalar attribute, if present.
fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().copied().map(f64::from),
        _ => None,
    }
}

/// SSH at grid cell `(j, i)` for every output time in the file.
///
/// Samples matching the variable's `_FillValue` or `missing_value` (land
/// cells) come back as NaN.
pub fn read_model_ssh(path: &Path, j: usize, i: usize) -> Result<TimeSeries, SurgeError> {
    let file = netcdf::open(path).map_err(nc_err)?;

    let time_var = variable(&file, TIME_VAR)?;
    let units = match time_var.attribute("units").map(|a| a.value()) {
        Some(Ok(AttributeValue::Str(units))) => units,
        _ => {
            return Err(SurgeError::ModelOutput(format!(
                "'{}' has no string units attribute",
                TIME_VAR
            )));
        }
    };
    let offsets: Vec<f64> = time_var.get_values::<f64, _>(..).map_err(nc_err)?;
    let times = decode_cf_time(&offsets, &units)?;

    let ssh_var = variable(&file, SSH_VAR)?;
    let mut ssh: Vec<f64> = ssh_var
        .get_values::<f32, _>((.., j, i))
        .map_err(nc_err)?
        .into_iter()
        .map(f64::from)
        .collect();
    let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| numeric_attribute(&ssh_var, name))
        .collect();
    mask_fill_values(&mut ssh, &fill_values);

    logging::debug(
        DataSource::Model,
        None,
        &format!("read {} SSH values at ({}, {}) from {}", ssh.len(), j, i, path.display()),
    );
    TimeSeries::new(times, ssh)
}
