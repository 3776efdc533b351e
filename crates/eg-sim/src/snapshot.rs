//! Owned, read-only views of simulation state handed to collaborators.

use eg_core::{AgentId, CellCoord, CellId, Tick};
use eg_crowd::AgentStatus;

// ── TickStats ─────────────────────────────────────────────────────────────────

/// Counters for one processed tick.
///
/// Fields ending in `_total` and the status counts describe state after the
/// tick; the rest count events during it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickStats {
    pub tick: Tick,

    // ── Hazard ────────────────────────────────────────────────────────────
    /// Cells whose hazard changed materially this tick.
    pub hazard_changed: usize,
    pub hazard_version: u64,
    pub burning_cells:  usize,
    pub max_intensity:  f32,

    // ── Routing ───────────────────────────────────────────────────────────
    /// Routes dropped because a cell ahead changed.
    pub routes_invalidated: usize,
    /// Route requests issued (new, stale, or blocked occupants).
    pub routes_requested: usize,
    /// Requests that found no passable route.
    pub routes_failed: usize,

    // ── Movement ──────────────────────────────────────────────────────────
    pub moved:         usize,
    pub stalled:       usize,
    pub escaped:       usize,
    pub incapacitated: usize,

    // ── Population after the tick ─────────────────────────────────────────
    pub moving:              usize,
    pub blocked:             usize,
    pub needs_route:         usize,
    pub escaped_total:       usize,
    pub incapacitated_total: usize,
}

// ── TickSnapshot ──────────────────────────────────────────────────────────────

/// One occupant as seen at the end of a tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentSnapshot {
    pub id:       AgentId,
    pub cell:     CellId,
    pub coord:    CellCoord,
    pub status:   AgentStatus,
    pub exposure: f32,
}

/// Projection of every occupant and the hazard field at the end of `tick`.
///
/// Owns all of its data; holding one never pins engine state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickSnapshot {
    pub tick: Tick,
    /// Simulated seconds from the start of the run to the end of `tick`.
    pub elapsed_secs: f64,
    pub stats: TickStats,
    /// Indexed by `AgentId`.
    pub agents: Vec<AgentSnapshot>,
    pub hazard_version: u64,
    /// Fire intensity per cell, indexed by `CellId`.
    pub intensity: Vec<f32>,
    /// Smoke density per cell, indexed by `CellId`.
    pub smoke: Vec<f32>,
}

impl TickSnapshot {
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.get(id.index())
    }

    pub fn count_with(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }

    /// Cells of occupants still inside the building, in `AgentId` order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.agents
            .iter()
            .filter(|a| !a.status.is_terminal())
            .map(|a| a.cell)
    }
}

// ── EvacuationSummary ─────────────────────────────────────────────────────────

/// End-of-run record.
///
/// Evacuation time of an occupant is the number of ticks from the start of
/// the run to the end of the tick on which it stepped onto an exit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvacuationSummary {
    /// Ticks processed.
    pub ticks: u64,
    pub elapsed_secs: f64,
    pub total: usize,
    pub escaped: usize,
    pub incapacitated: usize,
    /// Occupants still inside whose last route request failed.
    pub blocked: usize,
    /// Occupants still inside, blocked ones included.
    pub remaining: usize,
    /// `None` when nobody escaped.
    pub average_evacuation_ticks: Option<f64>,
    pub average_evacuation_secs:  Option<f64>,
    pub max_evacuation_ticks:     Option<u64>,
}

impl EvacuationSummary {
    /// `true` if every occupant reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}
