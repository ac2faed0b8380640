//! Navigation configuration
//!
//! Tunables for proximity triggering and the simulated position replay.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Radius in meters inside which a waypoint counts as reached
pub const DEFAULT_PROXIMITY_THRESHOLD_M: f64 = 200.0;

/// Configuration for a navigation controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Proximity threshold in meters (strictly-less-than comparison)
    pub proximity_threshold_m: f64,

    /// Delay before the simulated replay emits its first position
    #[serde(with = "duration_secs")]
    pub simulation_start_delay: Duration,

    /// Delay between simulated positions
    #[serde(with = "duration_secs")]
    pub simulation_interval: Duration,

    /// Number of waypoints the simulated replay visits
    pub simulation_max_waypoints: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: DEFAULT_PROXIMITY_THRESHOLD_M,
            simulation_start_delay: Duration::from_secs(2),
            simulation_interval: Duration::from_secs(5),
            simulation_max_waypoints: 5,
        }
    }
}

impl NavigationConfig {
    /// Reject values the tracker or the replay driver cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.proximity_threshold_m.is_finite() || self.proximity_threshold_m <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "proximity threshold must be a positive number of meters, got {}",
                self.proximity_threshold_m
            )));
        }
        if self.simulation_max_waypoints == 0 {
            return Err(Error::InvalidInput(
                "simulation must visit at least one waypoint".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON configuration document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: NavigationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Durations are written as fractional seconds in config documents
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
