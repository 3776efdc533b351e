//! Occupant state machine.
//!
//! ```text
//! NeedsRoute ──▶ Moving ──▶ Escaped
//!    │   ▲         │
//!    ▼   └─────────┘  route stale, or next cell turned lethal
//! Blocked ──▶ Moving  once a later request succeeds
//! ```
//!
//! Any non-terminal status becomes `Incapacitated` when exposure passes the
//! cap.

use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentStatus {
    /// No route, or the previous one went stale.
    #[default]
    NeedsRoute,
    /// Following a valid route.
    Moving,
    /// The last route request found no passable path; retried every tick.
    Blocked,
    /// Hazard exposure exceeded the cap.  Terminal.
    Incapacitated,
    /// Reached an exit.  Terminal.
    Escaped,
}

impl AgentStatus {
    /// `true` for `Escaped` and `Incapacitated`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Escaped | AgentStatus::Incapacitated)
    }

    /// `true` if the engine should request a route this tick.
    #[inline]
    pub fn wants_route(self) -> bool {
        matches!(self, AgentStatus::NeedsRoute | AgentStatus::Blocked)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::NeedsRoute    => "needs_route",
            AgentStatus::Moving        => "moving",
            AgentStatus::Blocked       => "blocked",
            AgentStatus::Incapacitated => "incapacitated",
            AgentStatus::Escaped       => "escaped",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
