//! `eg-route`: hazard-aware pathfinding.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`route`]      | `Route` (versioned step list)                            |
//! | [`pathfinder`] | `Pathfinder` trait, `HazardAStar`, `RouteCostConfig`     |
//! | [`error`]      | `RouteError`, `RouteResult<T>`                           |
//!
//! # Cost units
//!
//! Costs are fixed-point `u32` in `eg_grid::COST_SCALE` units per orthogonal
//! step, the same units as `GridMap::exit_distance`, which serves as the A*
//! heuristic toward the nearest exit.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `RouteCostConfig`.      |

pub mod error;
pub mod pathfinder;
pub mod route;


pub use error::{RouteError, RouteResult};
pub use pathfinder::{HazardAStar, Pathfinder, RouteCostConfig};
pub use route::Route;
