//! `eg-hazard`: fire and smoke as a discrete per-cell field.
//!
//! # Crate layout
//!
//! | Module     | Contents                                               |
//! |------------|--------------------------------------------------------|
//! | [`config`] | `HazardConfig`, `FireSeed`                             |
//! | [`field`]  | `HazardField`, `ChangedCells`                          |
//! | [`error`]  | `HazardError`, `HazardResult<T>`                       |
//!
//! # Update rule (one call to [`HazardField::advance`])
//!
//! ```text
//! ① ignite  : seeds whose ignite_tick has arrived set their cell's intensity
//! ② fire    : burning cells grow toward fire_cap; cells at or above the
//!              ignition threshold push intensity into walkable neighbours,
//!              attenuated by step distance and the receiver's resistance
//! ③ smoke   : each cell is nudged toward its neighbours' mean density plus
//!              a source term from the hottest cell around it
//! ④ report  : cells that moved by material_delta since they were last
//!              reported are stamped with a new field version
//! ```
//!
//! Steps ②–③ read only the previous state (double buffering), so the result
//! does not depend on cell visiting order, and no randomness is involved.
//! Both quantities are non-decreasing per cell and clamp at their caps.

pub mod config;
pub mod error;
pub mod field;


pub use config::{FireSeed, HazardConfig};
pub use error::{HazardError, HazardResult};
pub use field::{ChangedCells, HazardField};
