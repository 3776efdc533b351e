//! `eg-grid`: the building's navigable representation.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`cell`]    | `CellKind`, `Connectivity`, fixed-point cost constants      |
//! | [`grid`]    | `GridMap` (CSR adjacency + exit-distance field)             |
//! | [`builder`] | `GridMapBuilder` (ASCII plans, walls, doors, stairs)        |
//! | [`error`]   | `LayoutError`, `LayoutResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod builder;
pub mod cell;
pub mod error;
pub mod grid;

#[cfg(test)]
mod tests;

pub use builder::GridMapBuilder;
pub use cell::{CellKind, Connectivity, COST_SCALE, DIAGONAL_COST, ORTHOGONAL_COST};
pub use error::{LayoutError, LayoutResult};
pub use grid::GridMap;
