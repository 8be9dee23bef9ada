use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use salish_surge::alert::report::build_report;
use salish_surge::analysis::correction::{
    compute_residual, correct_model_ssh, relative_to_msl, tide_at,
};
use salish_surge::config::SurgeConfig;
use salish_surge::ingest::{self, series, tides};
use salish_surge::logging::{self, DataSource};
use salish_surge::model::{parse_timestamp, SurgeError, TimeSeries};

#[derive(Parser)]
#[command(
    name = "salish_surge",
    version,
    about = "Storm surge residuals and risk for SalishSeaCast tide gauges"
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess model SSH at each station and print the JSON surge report
    Report {
        /// STATION=FILE pairs; FILE is a time,ssh CSV (or NEMO .nc with --grid-point)
        #[arg(long = "model", value_parser = parse_model_arg, required = true)]
        models: Vec<(String, PathBuf)>,
        /// J,I grid indices for NetCDF inputs
        #[arg(long, value_parser = parse_grid_point)]
        grid_point: Option<(usize, usize)>,
    },
    /// Print tide and residual for one series as CSV
    Residual {
        #[arg(long)]
        station: String,
        /// time,ssh CSV file
        #[arg(long)]
        series: PathBuf,
        /// Series is raw model SSH and gets the missing-constituent correction first
        #[arg(long)]
        model: bool,
    },
    /// Fetch observed water levels for a station and print its residual as CSV
    Observed {
        #[arg(long)]
        station: String,
        #[arg(long, value_parser = parse_time_arg)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_time_arg)]
        end: DateTime<Utc>,
    },
}

fn parse_model_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (station, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected STATION=FILE, got '{}'", raw))?;
    Ok((station.trim().to_string(), PathBuf::from(path.trim())))
}

fn parse_grid_point(raw: &str) -> Result<(usize, usize), String> {
    let (j, i) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected J,I, got '{}'", raw))?;
    let j = j.trim().parse().map_err(|e| format!("bad J '{}': {}", j, e))?;
    let i = i.trim().parse().map_err(|e| format!("bad I '{}': {}", i, e))?;
    Ok((j, i))
}

fn parse_time_arg(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

fn load_model_ssh(
    path: &Path,
    grid_point: Option<(usize, usize)>,
) -> Result<TimeSeries, SurgeError> {
    if path.extension().is_some_and(|ext| ext == "nc") {
        let (j, i) = grid_point
            .ok_or_else(|| SurgeError::Config("NetCDF input needs --grid-point J,I".to_string()))?;
        return read_netcdf(path, j, i);
    }
    series::load_series_csv(path, "time", "ssh")
}

#[cfg(feature = "netcdf")]
fn read_netcdf(path: &Path, j: usize, i: usize) -> Result<TimeSeries, SurgeError> {
    ingest::nemo::read_model_ssh(path, j, i)
}

#[cfg(not(feature = "netcdf"))]
fn read_netcdf(path: &Path, _j: usize, _i: usize) -> Result<TimeSeries, SurgeError> {
    Err(SurgeError::ModelOutput(format!(
        "{}: built without the `netcdf` feature",
        path.display()
    )))
}

fn write_residual_csv(
    ssh: &TimeSeries,
    tide: &[f64],
    residual: &TimeSeries,
) -> Result<(), SurgeError> {
    series::write_series_csv(
        io::stdout().lock(),
        ssh.times(),
        &[("ssh", ssh.values()), ("tide", tide), ("residual", residual.values())],
    )
}

fn run(cli: Cli) -> Result<(), SurgeError> {
    let config = SurgeConfig::load(cli.config.as_deref())?;
    logging::init_logger(
        config.log_level()?,
        config.log.file.as_deref().and_then(Path::to_str),
        config.log.timestamps,
    );
    let registry = config.station_registry()?;

    match cli.command {
        Command::Report { models, grid_point } => {
            let mut inputs = Vec::with_capacity(models.len());
            for (station, path) in models {
                match load_model_ssh(&path, grid_point) {
                    Ok(ssh) => inputs.push((station, ssh)),
                    Err(err) => {
                        logging::error(DataSource::Model, Some(station.as_str()), &err.to_string())
                    }
                }
            }
            let report = build_report(
                &registry,
                &config.tidal_predictions_dir,
                &config.theme,
                &inputs,
                Utc::now(),
            );
            println!("{}", report.to_json()?);
        }
        Command::Residual { station, series: path, model } => {
            let station = registry.get(&station)?;
            let tides = tides::get_tides(&station.name, &config.tidal_predictions_dir)?;
            let mut ssh = series::load_series_csv(&path, "time", "ssh")?;
            if model {
                ssh = correct_model_ssh(&ssh, &tides);
            }
            let residual = compute_residual(&ssh, &tides);
            write_residual_csv(&ssh, &tide_at(ssh.times(), &tides), &residual)?;
        }
        Command::Observed { station, start, end } => {
            let station = registry.get(&station)?;
            let tides = tides::get_tides(&station.name, &config.tidal_predictions_dir)?;
            let client = config.http_client()?;
            let observed = ingest::fetch_observed_ssh(&client, &config.apis, station, start, end)?;
            let ssh = relative_to_msl(&observed, station);
            let residual = compute_residual(&ssh, &tides);
            write_residual_csv(&ssh, &tide_at(ssh.times(), &tides), &residual)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logging::error(DataSource::System, None, &err.to_string());
            eprintln!("salish_surge: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_model_arg_splits_on_first_equals() {
        assert_eq!(
            parse_model_arg("Point Atkinson=/tmp/pa.csv"),
            Ok(("Point Atkinson".to_string(), PathBuf::from("/tmp/pa.csv")))
        );
        assert!(parse_model_arg("no-separator").is_err());
    }

    #[test]
    fn test_grid_point_arg() {
        assert_eq!(parse_grid_point("468, 328"), Ok((468, 328)));
        assert!(parse_grid_point("468").is_err());
        assert!(parse_grid_point("a,b").is_err());
    }

    #[test]
    fn test_netcdf_input_requires_grid_point() {
        let result = load_model_ssh(Path::new("SalishSea_1h_grid_T.nc"), None);
        assert!(matches!(result, Err(SurgeError::Config(_))));
    }
}
