//! Occupant storage.

use eg_core::{AgentId, CellId, Tick};
use eg_route::{Route, RouteResult};

use crate::AgentStatus;

/// Structure-of-Arrays storage for all occupant state.
///
/// Every `Vec` field has exactly `count` elements; the `AgentId` value is the
/// index into all of them:
///
/// ```ignore
/// let here = store.cell[agent.index()];
/// ```
///
/// Written only by the engine and the crowd resolver.  Snapshots copy out of
/// it; nothing else holds references across ticks.
pub struct AgentStore {
    /// Number of occupants.  Equals the length of every SoA `Vec`.
    pub count: usize,

    /// Current cell.  `CellId::INVALID` until placed.  Keeps the exit cell
    /// after escape and the last cell after incapacitation.
    pub cell: Vec<CellId>,

    pub status: Vec<AgentStatus>,

    /// Current route; `None` means "needs a path".
    pub route: Vec<Option<Route>>,

    /// Cells per tick.  Values above one are capped by the resolver.
    pub speed: Vec<f32>,

    /// Progress toward the next cell, in cell lengths, at most the length of
    /// the next step.
    pub progress: Vec<f32>,

    /// Accumulated hazard exposure.
    pub exposure: Vec<f32>,

    /// Tick on which the occupant stepped onto an exit.
    pub escaped_at: Vec<Option<Tick>>,

    /// Tick on which exposure passed the cap.
    pub incapacitated_at: Vec<Option<Tick>>,
}

impl AgentStore {
    pub(crate) fn new(speeds: Vec<f32>) -> Self {
        let count = speeds.len();
        Self {
            count,
            cell:             vec![CellId::INVALID; count],
            status:           vec![AgentStatus::NeedsRoute; count],
            route:            (0..count).map(|_| None).collect(),
            speed:            speeds,
            progress:         vec![0.0; count],
            exposure:         vec![0.0; count],
            escaped_at:       vec![None; count],
            incapacitated_at: vec![None; count],
        }
    }

    /// `true` if there are no occupants.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        agent.index() < self.count
    }

    /// Number of occupants currently in `status`.
    pub fn count_with(&self, status: AgentStatus) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }

    /// Number of occupants not yet Escaped or Incapacitated.
    pub fn active_count(&self) -> usize {
        self.status.iter().filter(|s| !s.is_terminal()).count()
    }

    /// `true` once every occupant has reached a terminal status.
    pub fn all_terminal(&self) -> bool {
        self.status.iter().all(|s| s.is_terminal())
    }

    /// Put an unplaced occupant on `cell`.  Occupancy is the caller's job.
    pub fn place(&mut self, agent: AgentId, cell: CellId) {
        self.cell[agent.index()] = cell;
    }

    /// Drop the current route and ask for a new one.  Terminal occupants are
    /// left alone.
    pub fn invalidate_route(&mut self, agent: AgentId) {
        let i = agent.index();
        if self.status[i].is_terminal() {
            return;
        }
        self.route[i] = None;
        self.status[i] = AgentStatus::NeedsRoute;
    }

    /// Install the outcome of a route request: a route makes the occupant
    /// `Moving`, a failure makes it `Blocked`.
    pub fn apply_route(&mut self, agent: AgentId, result: RouteResult<Route>) {
        let i = agent.index();
        if self.status[i].is_terminal() {
            return;
        }
        match result {
            Ok(route) => {
                self.route[i] = Some(route);
                self.status[i] = AgentStatus::Moving;
            }
            Err(_) => {
                self.route[i] = None;
                self.status[i] = AgentStatus::Blocked;
            }
        }
    }
}
