/// Station registry for the storm surge service.
///
/// Holds the static attributes of every tide gauge location we assess:
/// position, mean sea level offset, historical extreme water level, and
/// where its observations come from. The table is built once at startup
/// (from the embedded default or a user-supplied TOML file) and then passed
/// by reference to whatever needs it; it is never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::model::SurgeError;

/// Default station table compiled into the binary.
const BUILTIN_STATIONS: &str = include_str!("../data/stations.toml");

// ---------------------------------------------------------------------------
// Station metadata
// ---------------------------------------------------------------------------

/// Agency operating a tide gauge, which decides the observation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agency {
    /// Canadian Hydrographic Service (IWLS API)
    Chs,
    /// NOAA Center for Operational Oceanographic Products and Services
    Noaa,
}

impl fmt::Display for Agency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agency::Chs => write!(f, "CHS"),
            Agency::Noaa => write!(f, "NOAA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TideGauge {
    pub agency: Agency,
    pub number: u32,
}

impl TideGauge {
    /// Station code as the agency's API expects it.
    /// CHS codes are zero-padded to 5 digits ("07795").
    pub fn code(&self) -> String {
        match self.agency {
            Agency::Chs => format!("{:05}", self.number),
            Agency::Noaa => self.number.to_string(),
        }
    }
}

/// Static attributes of one station. Water levels are metres above chart datum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    /// WGS84 latitude.
    pub latitude: f64,
    /// WGS84 longitude.
    pub longitude: f64,
    /// Mean sea level above chart datum.
    pub msl: f64,
    /// Highest water level on record.
    pub extreme_ssh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tide_gauge: Option<TideGauge>,
}

#[derive(Deserialize)]
struct StationFile {
    station: Vec<Station>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// The SalishSeaCast tide gauge table shipped with the crate.
    pub fn builtin() -> Result<Self, SurgeError> {
        Self::from_toml_str(BUILTIN_STATIONS)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SurgeError> {
        let file: StationFile = toml::from_str(text)?;
        let registry = Self {
            stations: file.station,
        };
        registry.validate()?;
        Ok(registry)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, SurgeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Station names must be unique, coordinates on the globe, and the
    /// record water level above mean sea level.
    fn validate(&self) -> Result<(), SurgeError> {
        if self.stations.is_empty() {
            return Err(SurgeError::Config("station table is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for s in &self.stations {
            if !seen.insert(s.name.as_str()) {
                return Err(SurgeError::Config(format!("duplicate station '{}'", s.name)));
            }
            if !(-90.0..=90.0).contains(&s.latitude) || !(-180.0..=180.0).contains(&s.longitude) {
                return Err(SurgeError::Config(format!(
                    "station '{}' has invalid position ({}, {})",
                    s.name, s.latitude, s.longitude
                )));
            }
            if s.extreme_ssh <= s.msl {
                return Err(SurgeError::Config(format!(
                    "station '{}': extreme_ssh {} must exceed msl {}",
                    s.name, s.extreme_ssh, s.msl
                )));
            }
        }
        Ok(())
    }

    /// Looks up a station by name. Returns `None` if not found.
    pub fn find(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Like `find`, but an unknown name is an error.
    pub fn get(&self, name: &str) -> Result<&Station, SurgeError> {
        self.find(name)
            .ok_or_else(|| SurgeError::UnknownStation(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations whose observations come from the given agency.
    pub fn with_gauge(&self, agency: Agency) -> Vec<&Station> {
        self.stations
            .iter()
            .filter(|s| s.tide_gauge.map(|g| g.agency) == Some(agency))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
