//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  The mapping to
//! simulated seconds is held in `SimClock`:
//!
//!   elapsed_secs = tick * tick_duration_ms / 1000
//!
//! Every per-tick rule (hazard growth, movement progress, exposure) is
//! expressed in "per tick" units, so the tick duration only matters when
//! reporting evacuation times in seconds.  The default of 1,000 ms makes one
//! cell per tick a brisk walking pace on a 1 m grid.

use std::fmt;

use crate::{EgError, EgResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and converts tick counts to simulated seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated milliseconds one tick represents.
    pub tick_duration_ms: u32,
    /// The current tick: advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_duration_ms: u32) -> Self {
        Self {
            tick_duration_ms,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.secs_for_ticks(self.current_tick.0)
    }

    /// Simulated seconds spanned by `ticks` ticks.
    #[inline]
    pub fn secs_for_ticks(&self, ticks: u64) -> f64 {
        ticks as f64 * self.tick_duration_ms as f64 / 1000.0
    }

    /// How many ticks span `secs` seconds?  Rounds up.
    #[inline]
    pub fn ticks_for_secs(&self, secs: u64) -> u64 {
        (secs * 1000).div_ceil(self.tick_duration_ms.max(1) as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically loaded from a file by the application crate and passed to the
/// simulation builder.  Model parameters (hazard, routing costs, crowding)
/// live in their own crates' config structs.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Simulated milliseconds per tick.  Default: 1,000.
    pub tick_duration_ms: u32,

    /// Hard budget: the run stops after this many ticks even if occupants
    /// remain.  Default: 600 (ten simulated minutes).
    pub max_ticks: u64,

    /// Master RNG seed.  Only occupant placement and speed jitter consume
    /// randomness; the tick loop itself is deterministic.
    pub seed: u64,

    /// Worker threads for the parallel routing phase.  `None` uses Rayon's
    /// global pool.  Ignored without the `parallel` feature.
    pub num_threads: Option<usize>,

    /// Emit a snapshot every N ticks.  1 = every tick.  The final tick is
    /// always snapshotted.
    pub snapshot_interval_ticks: u64,
}

impl SimConfig {
    /// The tick at which the run stops (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.max_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_ms)
    }

    /// Reject settings the tick loop cannot run with.
    pub fn validate(&self) -> EgResult<()> {
        if self.tick_duration_ms == 0 {
            return Err(EgError::Config("tick_duration_ms must be positive".into()));
        }
        if self.snapshot_interval_ticks == 0 {
            return Err(EgError::Config("snapshot_interval_ticks must be positive".into()));
        }
        if self.num_threads == Some(0) {
            return Err(EgError::Config("num_threads must be positive when set".into()));
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration_ms:        1_000,
            max_ticks:               600,
            seed:                    0,
            num_threads:             None,
            snapshot_interval_ticks: 1,
        }
    }
}
