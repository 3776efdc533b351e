//! `eg-sim`: tick loop orchestrator for the rust_egress simulator.
//!
//! # Tick loop
//!
//! ```text
//! until every occupant is terminal or config.max_ticks is reached:
//!   ① Hazard    : HazardField::advance; fire grows and spreads, smoke
//!                  diffuses, material changes bump the hazard version.
//!   ② Invalidate: Moving occupants whose remaining route crosses a cell
//!                  changed since the route was planned drop the route.
//!   ③ Route     : Pathfinder::route for every NeedsRoute/Blocked occupant
//!                  (parallel with the `parallel` feature), applied in
//!                  ascending AgentId order.
//!   ④ Resolve   : CrowdResolver::resolve; progress, conflicts, escapes,
//!                  exposure and incapacitation.
//!   ⑤ Check     : at most one occupant per non-exit cell, nobody inside a
//!                  wall, occupancy counts agree.  A violation is fatal.
//!   ⑥ Snapshot  : every snapshot_interval_ticks and on the final tick.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Runs the routing phase on Rayon's thread pool.           |
//! | `fx-hash`  | Uses FxHash for the per-tick claimed-cell set.           |
//! | `serde`    | Derives `Serialize`/`Deserialize` on snapshots and stats. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use eg_core::SimConfig;
//! use eg_crowd::AgentStoreBuilder;
//! use eg_route::HazardAStar;
//! use eg_sim::{NoopObserver, SimBuilder};
//!
//! let agents = AgentStoreBuilder::new(40, 42).speed_jitter(0.2).build()?;
//! let mut sim = SimBuilder::new(SimConfig::default(), grid, agents, HazardAStar::default())
//!     .fire_seeds(seeds)
//!     .build()?;
//! let summary = sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, Snapshots};
pub use snapshot::{AgentSnapshot, EvacuationSummary, TickSnapshot, TickStats};
