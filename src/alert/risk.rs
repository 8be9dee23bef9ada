//! Maximum water level and storm surge risk classification.
//!
//! Two thresholds are derived per station, both in metres above chart datum:
//!
//!   max_tides = highest full-constituent tide over the prediction horizon + msl
//!   mid       = halfway between max_tides and the station's record water level
//!
//! A forecast maximum below `max_tides` carries no risk, one above `mid` is
//! an extreme risk, and anything in between (bounds included) is moderate.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::analysis::correction::correct_model_ssh;
use crate::model::{TidalPrediction, TimeSeries};
use crate::stations::Station;

/// Storm surge risk levels, in ascending order of severity.
/// "No risk" is represented by `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Moderate,
    Extreme,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Moderate => write!(f, "moderate risk"),
            RiskLevel::Extreme => write!(f, "extreme risk"),
        }
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Risk thresholds for one station, metres above chart datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskThresholds {
    pub max_tides: f64,
    pub mid: f64,
}

impl RiskThresholds {
    pub fn from_levels(max_tides: f64, extreme_ssh: f64) -> Self {
        Self {
            max_tides,
            mid: max_tides + 0.5 * (extreme_ssh - max_tides),
        }
    }

    /// Thresholds from the station's tidal predictions and record level.
    /// A prediction table with no finite values gives NaN thresholds.
    pub fn for_station(tides: &TidalPrediction, station: &Station) -> Self {
        let max_tides = tides.max_pred_all().unwrap_or(f64::NAN) + station.msl;
        Self::from_levels(max_tides, station.extreme_ssh)
    }

    /// Classifies a maximum water level (already offset by msl).
    ///
    /// Equality with either threshold is moderate. NaN levels, or NaN
    /// thresholds, are treated as no risk. That is checked first: the bare
    /// `< max_tides` / `> mid` chain would let NaN fall through to moderate.
    pub fn classify(&self, max_ssh_plus_msl: f64) -> Option<RiskLevel> {
        if max_ssh_plus_msl.is_nan() || self.max_tides.is_nan() {
            return None;
        }
        if max_ssh_plus_msl < self.max_tides {
            None
        } else if max_ssh_plus_msl > self.mid {
            Some(RiskLevel::Extreme)
        } else {
            Some(RiskLevel::Moderate)
        }
    }
}

/// Largest value in a series and when it occurs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SshMax {
    pub value: f64,
    pub time: DateTime<Utc>,
}

/// Finds the maximum of a series, skipping NaN samples.
///
/// The first occurrence wins on ties. Returns `None` for an empty series;
/// a series that is entirely NaN gives a NaN maximum at its first timestamp.
pub fn find_ssh_max(ssh: &TimeSeries) -> Option<SshMax> {
    let first = ssh.times().first()?;
    let best = ssh
        .iter()
        .filter(|(_, v)| !v.is_nan())
        .fold(None::<SshMax>, |best, (time, value)| match best {
            Some(b) if b.value >= value => Some(b),
            _ => Some(SshMax { value, time }),
        });
    Some(best.unwrap_or(SshMax {
        value: f64::NAN,
        time: *first,
    }))
}

/// Outcome of assessing one station's model forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct SurgeAssessment {
    /// Maximum corrected model SSH, metres above chart datum.
    pub max_ssh: f64,
    pub max_time: DateTime<Utc>,
    pub risk: Option<RiskLevel>,
    pub thresholds: RiskThresholds,
    /// Tidally corrected model SSH (about mean sea level).
    pub corrected: TimeSeries,
}

/// Corrects raw model SSH, finds its maximum, and classifies the risk.
///
/// Returns `None` when the model series is empty.
pub fn storm_surge_risk(
    ssh_model: &TimeSeries,
    tides: &TidalPrediction,
    station: &Station,
) -> Option<SurgeAssessment> {
    let corrected = correct_model_ssh(ssh_model, tides);
    let peak = find_ssh_max(&corrected)?;
    let thresholds = RiskThresholds::for_station(tides, station);
    let max_ssh = peak.value + station.msl;
    Some(SurgeAssessment {
        max_ssh,
        max_time: peak.time,
        risk: thresholds.classify(max_ssh),
        thresholds,
        corrected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 12, 8, 0, 0, 0).unwrap()
    }

    fn station(msl: f64, extreme_ssh: f64) -> Station {
        Station {
            name: "Test Gauge".to_string(),
            latitude: 49.0,
            longitude: -123.0,
            msl,
            extreme_ssh,
            tide_gauge: None,
        }
    }

    // --- Classification -----------------------------------------------------

    #[test]
    fn test_mid_threshold_is_halfway_to_record() {
        let th = RiskThresholds::from_levels(3.0, 5.0);
        assert_eq!(th.mid, 4.0);
    }

    #[test]
    fn test_classification_bands() {
        let th = RiskThresholds::from_levels(3.0, 5.0);
        assert_eq!(th.classify(2.9), None);
        assert_eq!(th.classify(3.5), Some(RiskLevel::Moderate));
        assert_eq!(th.classify(4.5), Some(RiskLevel::Extreme));
    }

    #[test]
    fn test_classification_at_exact_thresholds_is_moderate() {
        let th = RiskThresholds::from_levels(3.0, 5.0);
        assert_eq!(th.classify(3.0), Some(RiskLevel::Moderate));
        assert_eq!(th.classify(4.0), Some(RiskLevel::Moderate));
    }

    #[test]
    fn test_nan_level_is_no_risk() {
        let th = RiskThresholds::from_levels(3.0, 5.0);
        assert_eq!(th.classify(f64::NAN), None);
        assert_eq!(RiskThresholds::from_levels(f64::NAN, 5.0).classify(10.0), None);
    }

    #[test]
    fn test_risk_level_labels() {
        assert_eq!(RiskLevel::Moderate.to_string(), "moderate risk");
        assert_eq!(RiskLevel::Extreme.to_string(), "extreme risk");
        assert!(RiskLevel::Moderate < RiskLevel::Extreme);
        assert_eq!(
            serde_json::to_string(&RiskLevel::Extreme).unwrap(),
            "\"extreme risk\""
        );
    }

    // --- Maximum ------------------------------------------------------------

    #[test]
    fn test_find_max_returns_value_and_time() {
        let ssh = TimeSeries::from_pairs([
            (t0(), 0.2),
            (t0() + Duration::hours(1), 1.4),
            (t0() + Duration::hours(2), 0.9),
        ]);
        let peak = find_ssh_max(&ssh).unwrap();
        assert_eq!(peak.value, 1.4);
        assert_eq!(peak.time, t0() + Duration::hours(1));
    }

    #[test]
    fn test_find_max_skips_nan_and_keeps_first_tie() {
        let ssh = TimeSeries::from_pairs([
            (t0(), f64::NAN),
            (t0() + Duration::hours(1), 0.8),
            (t0() + Duration::hours(2), 0.8),
        ]);
        let peak = find_ssh_max(&ssh).unwrap();
        assert_eq!(peak.value, 0.8);
        assert_eq!(peak.time, t0() + Duration::hours(1));
    }

    #[test]
    fn test_find_max_degenerate_inputs() {
        assert!(find_ssh_max(&TimeSeries::from_pairs([])).is_none());

        let all_nan = TimeSeries::from_pairs([(t0(), f64::NAN), (t0() + Duration::hours(1), f64::NAN)]);
        let peak = find_ssh_max(&all_nan).unwrap();
        assert!(peak.value.is_nan());
        assert_eq!(peak.time, t0());
    }

    // --- Full assessment ----------------------------------------------------

    #[test]
    fn test_storm_surge_risk_uses_corrected_ssh_plus_msl() {
        let times: Vec<_> = (0..3).map(|h| t0() + Duration::hours(h)).collect();
        // max pred_all 1.0, msl 2.0 -> max_tides 3.0; record 5.0 -> mid 4.0
        let tides = TidalPrediction::new(
            times.clone(),
            vec![0.5, 1.0, 0.5],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.5, 0.0],
        )
        .unwrap();
        let ssh = TimeSeries::new(times.clone(), vec![1.0, 1.0, 1.2]).unwrap();

        let a = storm_surge_risk(&ssh, &tides, &station(2.0, 5.0)).unwrap();
        // corrected: [1.0, 1.5, 1.2] -> max 1.5 at +1h -> 3.5 above datum
        assert!((a.max_ssh - 3.5).abs() < 1e-12);
        assert_eq!(a.max_time, times[1]);
        assert_eq!(a.risk, Some(RiskLevel::Moderate));
        assert_eq!(a.thresholds, RiskThresholds::from_levels(3.0, 5.0));
        assert_eq!(a.corrected.len(), 3);
    }

    #[test]
    fn test_storm_surge_risk_calm_day() {
        let times: Vec<_> = (0..3).map(|h| t0() + Duration::hours(h)).collect();
        let tides = TidalPrediction::new(times.clone(), vec![2.0; 3], vec![0.0; 3], vec![0.0; 3])
            .unwrap();
        let ssh = TimeSeries::new(times, vec![0.1, 0.3, 0.2]).unwrap();

        let a = storm_surge_risk(&ssh, &tides, &station(3.0, 6.0)).unwrap();
        assert_eq!(a.risk, None);
    }
}
