//! A computed route and its staleness check.

use eg_core::CellId;
use eg_hazard::HazardField;

/// An ordered list of cells from (but excluding) the agent's position to an
/// exit, tagged with the hazard-field version it was computed against.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Cells to enter in order; the last one is an exit.
    steps: Vec<CellId>,
    /// Index of the next cell to enter.
    cursor: usize,
    /// `HazardField::version()` at computation time.
    version: u64,
    /// Fixed-point cost including hazard penalties.
    total_cost: u32,
}

impl Route {
    pub fn new(steps: Vec<CellId>, version: u64, total_cost: u32) -> Self {
        Self { steps, cursor: 0, version, total_cost }
    }

    /// The cell the agent should enter next, or `None` once complete.
    #[inline]
    pub fn next_cell(&self) -> Option<CellId> {
        self.steps.get(self.cursor).copied()
    }

    /// Mark the next cell as entered.
    #[inline]
    pub fn advance(&mut self) {
        if self.cursor < self.steps.len() {
            self.cursor += 1;
        }
    }

    /// Cells not yet entered.
    pub fn remaining(&self) -> &[CellId] {
        &self.steps[self.cursor..]
    }

    /// Every cell of the route, traversed or not.
    pub fn steps(&self) -> &[CellId] {
        &self.steps
    }

    /// The exit this route leads to.  `None` for the empty route of an agent
    /// already standing on an exit.
    pub fn destination(&self) -> Option<CellId> {
        self.steps.last().copied()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn total_cost(&self) -> u32 {
        self.total_cost
    }

    /// `true` if any cell still ahead changed materially after this route was
    /// computed.  Already-traversed cells do not count.
    pub fn is_stale(&self, hazard: &HazardField) -> bool {
        self.remaining()
            .iter()
            .any(|&c| hazard.changed_since(c, self.version))
    }
}
