//! `eg-crowd`: occupants and per-tick movement resolution.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`status`]    | `AgentStatus` state machine                              |
//! | [`store`]     | `AgentStore` (SoA arrays)                                |
//! | [`builder`]   | `AgentStoreBuilder` (speeds, seeded jitter)              |
//! | [`occupancy`] | `Occupancy` (per-cell occupant counts)                   |
//! | [`config`]    | `CrowdConfig`                                            |
//! | [`resolver`]  | `CrowdResolver`, `ResolveStats`                          |
//! | [`error`]     | `CrowdError`, `CrowdResult<T>`                           |
//!
//! # Movement model
//!
//! Each occupant walks at most one cell per tick along its route.  Progress
//! accumulates at `speed` per tick until it covers the next step's length
//! (one cell orthogonally, about 1.414 diagonally, the stair cost across a
//! stair link); then the occupant proposes to enter its next cell.  The
//! lowest `AgentId` proposing a cell wins it and everybody else waits.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash for the per-tick claimed-cell set.                  |
//! | `serde`   | Derives `Serialize`/`Deserialize` on value types.          |

pub mod builder;
pub mod config;
pub mod error;
pub mod occupancy;
pub mod resolver;
pub mod status;
pub mod store;


pub use builder::AgentStoreBuilder;
pub use config::CrowdConfig;
pub use error::{CrowdError, CrowdResult};
pub use occupancy::Occupancy;
pub use resolver::{CrowdResolver, ResolveStats};
pub use status::AgentStatus;
pub use store::AgentStore;
