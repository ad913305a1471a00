//! HUD tuning values.
//!
//! Every field has a default, so an empty JSON object (or an empty
//! string from the bridge) yields a usable config.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Remaining distance below which the trip counts as arriving.
    pub near_destination_distance_m: f64,
    /// Remaining duration below which the trip counts as arriving.
    pub near_destination_time_s: f64,
    /// Telemetry older than this is treated as having no speed reading.
    pub telemetry_stale_after_s: f64,
    /// Master switch for the regulatory speed-limit sign.
    pub show_speed_limit: bool,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            near_destination_distance_m: 50.0,
            near_destination_time_s: 30.0,
            telemetry_stale_after_s: 10.0,
            show_speed_limit: true,
        }
    }
}

impl HudConfig {
    /// Parse and validate a config from JSON. Blank input gives the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: HudConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("near_destination_distance_m", self.near_destination_distance_m),
            ("near_destination_time_s", self.near_destination_time_s),
            ("telemetry_stale_after_s", self.telemetry_stale_after_s),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
