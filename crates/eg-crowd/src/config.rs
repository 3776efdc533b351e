//! Crowd and exposure parameters.

use crate::{CrowdError, CrowdResult};

/// Tunable parameters of the movement and exposure rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrowdConfig {
    /// Crowding kicks in when more than this many of the eight surrounding
    /// cells on the occupant's floor are occupied.
    pub density_threshold: u32,

    /// Progress multiplier while crowded, in `(0, 1]`.
    pub crowd_slowdown: f32,

    /// Intensity at or above which an occupant accumulates exposure.
    pub survivable_intensity: f32,

    /// Smoke density at or above which an occupant accumulates exposure.
    pub survivable_smoke: f32,

    /// Exposure beyond which an occupant is incapacitated.
    pub exposure_cap: f32,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            density_threshold:    4,
            crowd_slowdown:       0.5,
            survivable_intensity: 0.2,
            survivable_smoke:     0.4,
            exposure_cap:         15.0,
        }
    }
}

impl CrowdConfig {
    pub fn validate(&self) -> CrowdResult<()> {
        let slowdown = self.crowd_slowdown;
        if slowdown.is_nan() || slowdown <= 0.0 || slowdown > 1.0 {
            return Err(CrowdError::Config(format!(
                "crowd_slowdown must be in (0, 1], got {slowdown}"
            )));
        }
        for (name, v) in [
            ("survivable_intensity", self.survivable_intensity),
            ("survivable_smoke", self.survivable_smoke),
            ("exposure_cap", self.exposure_cap),
        ] {
            if v.is_nan() || v < 0.0 {
                return Err(CrowdError::Config(format!("{name} must be non-negative, got {v}")));
            }
        }
        Ok(())
    }
}
