//! Runtime configuration for the storm surge service.
//!
//! Settings come from an optional TOML file, then environment variables
//! (a `.env` file in the working directory is loaded first). Every key has
//! a default, so an empty or absent file is valid.
//!
//! ```toml
//! tidal_predictions_dir = "/results/tidal_predictions"
//! stations_file = "stations.toml"
//!
//! [log]
//! level = "info"
//! file = "/var/log/salish_surge.log"
//!
//! [apis]
//! timeout_secs = 30
//!
//! [theme.risk]
//! moderate = "Gold"
//! ```
//!
//! Environment overrides: `SURGE_TIDAL_PREDICTIONS_DIR`, `SURGE_STATIONS_FILE`,
//! `SURGE_LOG_FILE`, `SURGE_LOG_LEVEL`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::{chs, noaa};
use crate::logging::LogLevel;
use crate::model::SurgeError;
use crate::stations::StationRegistry;
use crate::theme::Theme;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SurgeConfig {
    pub tidal_predictions_dir: PathBuf,
    /// Station table to use instead of the built-in one.
    pub stations_file: Option<PathBuf>,
    pub log: LogConfig,
    pub apis: ApiConfig,
    pub theme: Theme,
}

impl Default for SurgeConfig {
    fn default() -> Self {
        Self {
            tidal_predictions_dir: PathBuf::from("tidal_predictions"),
            stations_file: None,
            log: LogConfig::default(),
            apis: ApiConfig::default(),
            theme: Theme::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    /// Timestamped console lines (for cron/daemon runs)
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub chs_base_url: String,
    pub noaa_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            chs_base_url: chs::IWLS_BASE_URL.to_string(),
            noaa_base_url: noaa::COOPS_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl SurgeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SurgeError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, SurgeError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SurgeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// File (if given) plus `.env` and process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SurgeError> {
        dotenv::dotenv().ok();
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `SURGE_*` overrides from `lookup` (the environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("SURGE_TIDAL_PREDICTIONS_DIR") {
            self.tidal_predictions_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("SURGE_STATIONS_FILE") {
            self.stations_file = Some(PathBuf::from(file));
        }
        if let Some(file) = lookup("SURGE_LOG_FILE") {
            self.log.file = Some(PathBuf::from(file));
        }
        if let Some(level) = lookup("SURGE_LOG_LEVEL") {
            self.log.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), SurgeError> {
        self.log_level()?;
        if self.apis.timeout_secs == 0 {
            return Err(SurgeError::Config("apis.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, SurgeError> {
        self.log.level.parse::<LogLevel>().map_err(SurgeError::Config)
    }

    /// The station table named by `stations_file`, or the built-in one.
    pub fn station_registry(&self) -> Result<StationRegistry, SurgeError> {
        match &self.stations_file {
            Some(path) => StationRegistry::from_toml_file(path),
            None => StationRegistry::builtin(),
        }
    }

    pub fn http_client(&self) -> Result<reqwest::blocking::Client, SurgeError> {
        Ok(reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.apis.timeout_secs))
            .build()?)
    }
}
