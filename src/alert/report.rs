//! Per-station storm surge summary for a model run.
//!
//! This is the machine-readable hand-off to the figure and feed renderers:
//! one entry per station with the forecast maximum, when it happens, the
//! risk band, and the thresholds it was judged against.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::alert::risk::{storm_surge_risk, RiskLevel};
use crate::analysis::correction::compute_residual;
use crate::ingest::tides::get_tides;
use crate::logging::{self, DataSource};
use crate::model::{SurgeError, TidalPrediction, TimeSeries};
use crate::stations::{Station, StationRegistry};
use crate::theme::Theme;

/// Storm surge summary for one station. Levels are metres above chart datum
/// except the residual, which is metres about the tidal prediction.
/// Non-finite values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSurge {
    pub station: String,
    pub max_ssh_m: f64,
    pub max_ssh_time: DateTime<Utc>,
    pub risk_level: Option<RiskLevel>,
    pub colour: String,
    pub max_tides_m: f64,
    pub mid_threshold_m: f64,
    pub residual_at_max_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurgeReport {
    pub generated_at: DateTime<Utc>,
    pub stations: Vec<StationSurge>,
}

impl SurgeReport {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            stations: Vec::new(),
        }
    }

    /// Most severe risk across all stations.
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.stations.iter().filter_map(|s| s.risk_level).max()
    }

    pub fn to_json(&self) -> Result<String, SurgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Assesses one station's raw model SSH. `None` if the series is empty.
pub fn assess_station(
    station: &Station,
    ssh_model: &TimeSeries,
    tides: &TidalPrediction,
    theme: &Theme,
) -> Option<StationSurge> {
    let assessment = storm_surge_risk(ssh_model, tides, station)?;
    let residual = compute_residual(&assessment.corrected, tides);
    let residual_at_max = residual
        .iter()
        .find(|(t, _)| *t == assessment.max_time)
        .map_or(f64::NAN, |(_, r)| r);

    Some(StationSurge {
        station: station.name.clone(),
        max_ssh_m: assessment.max_ssh,
        max_ssh_time: assessment.max_time,
        risk_level: assessment.risk,
        colour: theme.risk_colour(assessment.risk).to_string(),
        max_tides_m: assessment.thresholds.max_tides,
        mid_threshold_m: assessment.thresholds.mid,
        residual_at_max_m: residual_at_max,
    })
}

/// Builds the report for every `(station name, raw model SSH)` input,
/// loading each station's tidal predictions from `tides_dir`.
///
/// A station that cannot be assessed (unknown name, missing predictions,
/// empty series) is logged and left out; the rest of the run continues.
pub fn build_report(
    registry: &StationRegistry,
    tides_dir: &Path,
    theme: &Theme,
    model_ssh: &[(String, TimeSeries)],
    generated_at: DateTime<Utc>,
) -> SurgeReport {
    let mut report = SurgeReport::new(generated_at);
    let mut failed = 0;

    for (name, ssh) in model_ssh {
        let outcome = registry.get(name).and_then(|station| {
            let tides = get_tides(&station.name, tides_dir)?;
            assess_station(station, ssh, &tides, theme)
                .ok_or_else(|| SurgeError::NoDataAvailable(format!("empty model series for {}", name)))
        });
        match outcome {
            Ok(surge) => {
                match surge.risk_level {
                    Some(level) => logging::warn(
                        DataSource::Model,
                        Some(name.as_str()),
                        &format!("{}: max {:.2} m at {}", level, surge.max_ssh_m, surge.max_ssh_time),
                    ),
                    None => logging::info(
                        DataSource::Model,
                        Some(name.as_str()),
                        &format!("max {:.2} m at {}", surge.max_ssh_m, surge.max_ssh_time),
                    ),
                }
                report.stations.push(surge);
            }
            Err(err) => {
                failed += 1;
                logging::error(DataSource::Model, Some(name.as_str()), &err.to_string());
            }
        }
    }

    logging::log_run_summary(DataSource::System, model_ssh.len(), report.stations.len(), failed);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2006, 2, 4, 0, 0, 0).unwrap()
    }

    fn station() -> Station {
        Station {
            name: "Point Atkinson".to_string(),
            latitude: 49.33,
            longitude: -123.25,
            msl: 3.0,
            extreme_ssh: 5.0,
            tide_gauge: None,
        }
    }

    fn tides() -> TidalPrediction {
        let times: Vec<_> = (0..4).map(|h| t0() + Duration::hours(h)).collect();
        TidalPrediction::new(times, vec![0.0, 0.5, 0.0, -0.5], vec![0.0; 4], vec![0.0; 4]).unwrap()
    }

    #[test]
    fn test_assess_station_extreme_surge() {
        let times: Vec<_> = (0..4).map(|h| t0() + Duration::hours(h)).collect();
        // msl 3.0, max pred_all 0.5 -> max_tides 3.5, mid 4.25
        let ssh = TimeSeries::new(times.clone(), vec![0.2, 1.6, 0.9, 0.1]).unwrap();

        let surge = assess_station(&station(), &ssh, &tides(), &Theme::default()).unwrap();
        assert!((surge.max_ssh_m - 4.6).abs() < 1e-12);
        assert_eq!(surge.max_ssh_time, times[1]);
        assert_eq!(surge.risk_level, Some(RiskLevel::Extreme));
        assert_eq!(surge.colour, "red");
        assert!((surge.residual_at_max_m - 1.1).abs() < 1e-12);
        assert!((surge.mid_threshold_m - 4.25).abs() < 1e-12);
    }

    #[test]
    fn test_assess_station_empty_series() {
        let empty = TimeSeries::from_pairs([]);
        assert!(assess_station(&station(), &empty, &tides(), &Theme::default()).is_none());
    }

    #[test]
    fn test_report_json_layout() {
        let mut report = SurgeReport::new(t0());
        report.stations.push(StationSurge {
            station: "Victoria".to_string(),
            max_ssh_m: 3.1,
            max_ssh_time: t0(),
            risk_level: Some(RiskLevel::Moderate),
            colour: "Gold".to_string(),
            max_tides_m: 3.0,
            mid_threshold_m: 3.38,
            residual_at_max_m: f64::NAN,
        });

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let entry = &json["stations"][0];
        assert_eq!(entry["station"], "Victoria");
        assert_eq!(entry["risk_level"], "moderate risk");
        assert!(entry["residual_at_max_m"].is_null());
        assert_eq!(json["generated_at"], "2006-02-04T00:00:00Z");
    }

    #[test]
    fn test_highest_risk_across_stations() {
        let mut report = SurgeReport::new(t0());
        assert_eq!(report.highest_risk(), None);
        for level in [None, Some(RiskLevel::Extreme), Some(RiskLevel::Moderate)] {
            report.stations.push(StationSurge {
                station: "x".to_string(),
                max_ssh_m: 0.0,
                max_ssh_time: t0(),
                risk_level: level,
                colour: String::new(),
                max_tides_m: 0.0,
                mid_threshold_m: 0.0,
                residual_at_max_m: 0.0,
            });
        }
        assert_eq!(report.highest_risk(), Some(RiskLevel::Extreme));
    }

    #[test]
    fn test_build_report_skips_stations_without_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let registry = StationRegistry::builtin().unwrap();
        let ssh = TimeSeries::from_pairs([(t0(), 0.0)]);
        let inputs = vec![
            ("Victoria".to_string(), ssh.clone()),
            ("Atlantis".to_string(), ssh),
        ];
        let report = build_report(&registry, dir.path(), &Theme::default(), &inputs, t0());
        assert!(report.stations.is_empty());
    }
}
