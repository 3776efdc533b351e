//! `eg-core`: foundational types for the `rust_egress` evacuation simulator.
//!
//! This crate is a dependency of every other `eg-*` crate.  It has no `eg-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                               |
//! |-----------|--------------------------------------------------------|
//! | [`ids`]   | `AgentId`, `CellId`                                    |
//! | [`coord`] | `CellCoord` (floor, row, col)                          |
//! | [`time`]  | `Tick`, `SimClock`, `SimConfig`                        |
//! | [`rng`]   | `AgentRng` (per-agent), `SimRng` (global)              |
//! | [`error`] | `EgError`, `EgResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod coord;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use coord::CellCoord;
pub use error::{EgError, EgResult};
pub use ids::{AgentId, CellId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, Tick};
