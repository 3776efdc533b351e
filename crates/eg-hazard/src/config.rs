//! Hazard model parameters.
//!
//! All rates are per tick.  Intensity and smoke are dimensionless; with the
//! default caps of `1.0` they read as "fraction of fully developed fire" and
//! "fraction of opaque smoke".

use eg_core::{CellId, Tick};

use crate::{HazardError, HazardResult};

/// Tunable parameters of the fire and smoke rules.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardConfig {
    /// Upper bound on fire intensity.
    pub fire_cap: f32,

    /// Intensity gained per tick by a burning cell (scaled by
    /// `1 - fire_resistance`).
    pub growth_rate: f32,

    /// A cell spreads fire to its neighbours once its intensity reaches this.
    pub ignition_threshold: f32,

    /// Intensity pushed into an orthogonal neighbour per tick by a source at
    /// `fire_cap`.  Diagonal and stair neighbours receive proportionally less.
    pub spread_rate: f32,

    /// Upper bound on smoke density.
    pub smoke_cap: f32,

    /// Fraction of the gap to the neighbour mean closed per tick, in `[0, 1]`.
    pub diffusion_rate: f32,

    /// Smoke produced per tick next to a fire at `fire_cap`.
    pub smoke_source_rate: f32,

    /// Minimum change in intensity or smoke, since a cell was last
    /// reported, for it to count as a material change.
    pub material_delta: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            fire_cap:           1.0,
            growth_rate:        0.05,
            ignition_threshold: 0.3,
            spread_rate:        0.04,
            smoke_cap:          1.0,
            diffusion_rate:     0.25,
            smoke_source_rate:  0.1,
            material_delta:     0.05,
        }
    }
}

impl HazardConfig {
    pub fn validate(&self) -> HazardResult<()> {
        let non_negative = [
            ("growth_rate", self.growth_rate),
            ("spread_rate", self.spread_rate),
            ("smoke_source_rate", self.smoke_source_rate),
            ("ignition_threshold", self.ignition_threshold),
        ];
        for (name, v) in non_negative {
            if v.is_nan() || v < 0.0 {
                return Err(HazardError::Config(format!("{name} must be non-negative, got {v}")));
            }
        }
        for (name, cap) in [("fire_cap", self.fire_cap), ("smoke_cap", self.smoke_cap)] {
            if cap.is_nan() || cap <= 0.0 {
                return Err(HazardError::Config(format!("{name} must be positive, got {cap}")));
            }
        }
        if !(0.0..=1.0).contains(&self.diffusion_rate) {
            return Err(HazardError::Config(format!(
                "diffusion_rate must be in [0, 1], got {}",
                self.diffusion_rate
            )));
        }
        if self.material_delta.is_nan() || self.material_delta <= 0.0 {
            return Err(HazardError::Config("material_delta must be positive".into()));
        }
        Ok(())
    }
}

/// A fire ignition: `cell` starts burning at `intensity` on `ignite_tick`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FireSeed {
    pub cell:        CellId,
    pub ignite_tick: Tick,
    pub intensity:   f32,
}

impl FireSeed {
    pub fn new(cell: CellId, ignite_tick: Tick, intensity: f32) -> Self {
        Self { cell, ignite_tick, intensity }
    }
}
