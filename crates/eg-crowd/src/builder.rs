//! Fluent builder for [`AgentStore`].
//!
//! # Usage
//!
//! ```rust
//! use eg_crowd::AgentStoreBuilder;
//!
//! let store = AgentStoreBuilder::new(25, /*seed=*/ 7)
//!     .speed(0.8)
//!     .speed_jitter(0.25)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(store.count, 25);
//! assert!(store.speed.iter().all(|&s| (0.59..=1.01).contains(&s)));
//! ```

use eg_core::{AgentId, AgentRng};

use crate::{AgentStore, CrowdError, CrowdResult};

/// Fluent builder for [`AgentStore`].
///
/// Every occupant starts unplaced, with status `NeedsRoute`, zero progress
/// and zero exposure.  Positions are assigned by the engine.
pub struct AgentStoreBuilder {
    count:  usize,
    seed:   u64,
    speed:  f32,
    jitter: f32,
    speeds: Option<Vec<f32>>,
}

impl AgentStoreBuilder {
    /// Create a builder for `count` occupants using `seed` for speed jitter.
    pub fn new(count: usize, seed: u64) -> Self {
        Self { count, seed, speed: 1.0, jitter: 0.0, speeds: None }
    }

    /// Base walking speed in cells per tick.  Default `1.0`.
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Relative speed spread: each occupant's speed is drawn uniformly from
    /// `speed × [1 − jitter, 1 + jitter]` using its own `AgentRng`.
    pub fn speed_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter;
        self
    }

    /// Explicit per-occupant speeds.  Overrides `speed` and `speed_jitter`.
    pub fn speeds(mut self, speeds: Vec<f32>) -> Self {
        self.speeds = Some(speeds);
        self
    }

    /// # Errors
    ///
    /// A speed list of the wrong length, a jitter outside `[0, 1)`, or any
    /// resulting speed that is not positive.
    pub fn build(self) -> CrowdResult<AgentStore> {
        let speeds = match self.speeds {
            Some(s) => {
                if s.len() != self.count {
                    return Err(CrowdError::LengthMismatch {
                        expected: self.count,
                        got:      s.len(),
                        what:     "speeds",
                    });
                }
                s
            }
            None => {
                if self.jitter.is_nan() || !(0.0..1.0).contains(&self.jitter) {
                    return Err(CrowdError::Config(format!(
                        "speed_jitter must be in [0, 1), got {}",
                        self.jitter
                    )));
                }
                (0..self.count as u32)
                    .map(|i| {
                        if self.jitter == 0.0 {
                            return self.speed;
                        }
                        let mut rng = AgentRng::new(self.seed, AgentId(i));
                        let u: f32 = rng.gen_range(-1.0..=1.0);
                        self.speed * (1.0 + self.jitter * u)
                    })
                    .collect()
            }
        };

        for (i, &speed) in speeds.iter().enumerate() {
            if speed.is_nan() || speed <= 0.0 {
                return Err(CrowdError::BadSpeed { agent: AgentId(i as u32), speed });
            }
        }

        Ok(AgentStore::new(speeds))
    }
}
