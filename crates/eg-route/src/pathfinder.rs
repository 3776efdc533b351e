//! Pathfinding trait and the default hazard-aware A* implementation.
//!
//! # Pluggability
//!
//! `eg-sim` calls routing through the [`Pathfinder`] trait, so a scenario can
//! swap in another algorithm (familiarity bias, exit preferences, herding)
//! without touching the engine.  [`HazardAStar`] is the default.
//!
//! # Search
//!
//! A single multi-target A*: every exit is a goal, and the heuristic is the
//! grid's precomputed hazard-free distance to the nearest exit.  Hazard
//! penalties are non-negative, so the heuristic stays consistent and the first
//! exit popped from the heap is optimal.
//!
//! # Ties
//!
//! Among routes of equal total cost, whichever exit they lead to, the one
//! whose cell sequence is lexicographically smallest by `CellId` wins.  The
//! search keeps settling cells until the heap's best `f` exceeds the optimal
//! cost, marks every settled cell that lies on some optimal route, then walks
//! from the start always taking the smallest such neighbour.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use eg_core::CellId;
use eg_grid::{GridMap, COST_SCALE};
use eg_hazard::HazardField;

use crate::{Route, RouteError, RouteResult};

// ── Pathfinder trait ──────────────────────────────────────────────────────────

/// Pluggable route planner.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so the engine can share one across
/// Rayon worker threads during the routing phase.
pub trait Pathfinder: Send + Sync {
    /// Plan a route from `from` to any exit under the current hazard.
    ///
    /// The returned route excludes `from` and is tagged with
    /// `hazard.version()`.
    fn route(&self, grid: &GridMap, hazard: &HazardField, from: CellId) -> RouteResult<Route>;

    /// `false` if `cell` may not be entered under the current hazard.
    fn passable(&self, hazard: &HazardField, cell: CellId) -> bool;
}

// ── RouteCostConfig ───────────────────────────────────────────────────────────

/// Hazard penalties applied on top of step costs.
///
/// The penalty for entering a cell is
/// `(intensity_weight × intensity + smoke_weight × smoke)` orthogonal steps.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteCostConfig {
    pub intensity_weight: f32,
    pub smoke_weight:     f32,
    /// Cells at or above this intensity are never entered.
    pub lethal_intensity: f32,
}

impl Default for RouteCostConfig {
    fn default() -> Self {
        Self {
            intensity_weight: 10.0,
            smoke_weight:     4.0,
            lethal_intensity: 0.6,
        }
    }
}

// ── HazardAStar ───────────────────────────────────────────────────────────────

/// A* over the grid's CSR adjacency with hazard-weighted entry costs.
#[derive(Clone, Debug, Default)]
pub struct HazardAStar {
    pub costs: RouteCostConfig,
}

impl HazardAStar {
    pub fn new(costs: RouteCostConfig) -> Self {
        Self { costs }
    }

    /// Fixed-point hazard penalty for entering `cell`.
    #[inline]
    fn penalty(&self, hazard: &HazardField, cell: CellId) -> u32 {
        let units = self.costs.intensity_weight * hazard.intensity(cell)
            + self.costs.smoke_weight * hazard.smoke(cell);
        (units.max(0.0) * COST_SCALE as f32).round() as u32
    }
}

impl Pathfinder for HazardAStar {
    fn route(&self, grid: &GridMap, hazard: &HazardField, from: CellId) -> RouteResult<Route> {
        let coord = grid
            .try_coord(from)
            .map_err(|_| RouteError::OutOfBounds(from))?;
        if !grid.is_walkable(from) {
            return Err(RouteError::NotWalkable(coord));
        }
        if grid.is_exit(from) {
            return Ok(Route::new(Vec::new(), hazard.version(), 0));
        }

        let n = grid.cell_count();
        // g[v] = best known cost from `from` to v.
        let mut g = vec![u32::MAX; n];
        // prev[v] = predecessor on the best path; INVALID for unreached cells.
        let mut prev = vec![CellId::INVALID; n];
        g[from.index()] = 0;

        let h = |c: CellId| grid.exit_distance(c).unwrap_or(0);

        let mut heap: BinaryHeap<Reverse<(u32, u32, CellId)>> = BinaryHeap::new();
        heap.push(Reverse((h(from), 0, from)));

        let mut settled = vec![false; n];
        // Exits reached at the optimal cost.
        let mut goals = Vec::new();
        let mut best: Option<u32> = None;

        while let Some(Reverse((f, cost, cell))) = heap.pop() {
            if best.is_some_and(|b| f > b) {
                break;
            }
            if cost > g[cell.index()] || settled[cell.index()] {
                continue;
            }
            settled[cell.index()] = true;
            if grid.is_exit(cell) {
                // h is zero on exits, so this exit costs exactly `best`.
                best.get_or_insert(cost);
                goals.push(cell);
                continue;
            }

            for (next, step) in grid.neighbors(cell) {
                if !self.passable(hazard, next) {
                    continue;
                }
                let new_cost = cost
                    .saturating_add(step)
                    .saturating_add(self.penalty(hazard, next));
                if new_cost < g[next.index()] {
                    g[next.index()] = new_cost;
                    prev[next.index()] = cell;
                    heap.push(Reverse((new_cost.saturating_add(h(next)), new_cost, next)));
                }
            }
        }

        let (Some(best), Some(&first)) = (best, goals.first()) else {
            return Err(RouteError::NoRoute { from: coord });
        };
        let steps = self
            .smallest_optimal_steps(grid, hazard, &g, &settled, &goals, from)
            .unwrap_or_else(|| reconstruct(&prev, first));
        Ok(Route::new(steps, hazard.version(), best))
    }

    #[inline]
    fn passable(&self, hazard: &HazardField, cell: CellId) -> bool {
        hazard.intensity(cell) < self.costs.lethal_intensity
    }
}

impl HazardAStar {
    /// `true` when stepping `from → to` lies on a cheapest path to `to`.
    #[inline]
    fn tight(&self, hazard: &HazardField, g: &[u32], from: CellId, to: CellId, step: u32) -> bool {
        g[from.index()] != u32::MAX
            && g[from.index()]
                .saturating_add(step)
                .saturating_add(self.penalty(hazard, to))
                == g[to.index()]
    }

    /// The lexicographically smallest optimal route from `start`, given the
    /// settled costs of a finished search.  `None` only if the walk runs into
    /// a loop of zero-cost steps.
    fn smallest_optimal_steps(
        &self,
        grid:    &GridMap,
        hazard:  &HazardField,
        g:       &[u32],
        settled: &[bool],
        goals:   &[CellId],
        start:   CellId,
    ) -> Option<Vec<CellId>> {
        // Mark every settled cell with a cheapest continuation to a goal.
        let mut useful = vec![false; g.len()];
        let mut stack = goals.to_vec();
        for &goal in goals {
            useful[goal.index()] = true;
        }
        while let Some(v) = stack.pop() {
            for (u, _) in grid.neighbors(v) {
                if useful[u.index()] || !settled[u.index()] || grid.is_exit(u) {
                    continue;
                }
                let Some(step) = grid.step_cost(u, v) else { continue };
                if self.tight(hazard, g, u, v, step) {
                    useful[u.index()] = true;
                    stack.push(u);
                }
            }
        }

        let mut visited = vec![false; g.len()];
        let mut steps = Vec::new();
        let mut cur = start;
        while !grid.is_exit(cur) {
            visited[cur.index()] = true;
            let next = grid
                .neighbors(cur)
                .filter(|&(v, step)| {
                    useful[v.index()] && !visited[v.index()] && self.tight(hazard, g, cur, v, step)
                })
                .map(|(v, _)| v)
                .min()?;
            steps.push(next);
            cur = next;
        }
        Some(steps)
    }
}

/// Walk `prev` back from `goal`; the start cell (whose `prev` is INVALID) is
/// not included.
fn reconstruct(prev: &[CellId], goal: CellId) -> Vec<CellId> {
    let mut steps = Vec::new();
    let mut cur = goal;
    while prev[cur.index()] != CellId::INVALID {
        steps.push(cur);
        cur = prev[cur.index()];
    }
    steps.reverse();
    steps
}
