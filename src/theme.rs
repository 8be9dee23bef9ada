//! Named style values for the surge report.
//!
//! Renderers receive a `Theme` explicitly instead of reaching for module
//! level colour tables.

use serde::{Deserialize, Serialize};

use crate::alert::risk::RiskLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskColours {
    pub none: String,
    pub moderate: String,
    pub extreme: String,
}

impl Default for RiskColours {
    fn default() -> Self {
        Self {
            none: "green".to_string(),
            moderate: "Gold".to_string(),
            extreme: "red".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub risk: RiskColours,
}

impl Theme {
    pub fn risk_colour(&self, level: Option<RiskLevel>) -> &str {
        match level {
            None => &self.risk.none,
            Some(RiskLevel::Moderate) => &self.risk.moderate,
            Some(RiskLevel::Extreme) => &self.risk.extreme,
        }
    }
}
