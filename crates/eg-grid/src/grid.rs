//! Immutable grid map with CSR adjacency.
//!
//! # Data layout
//!
//! Cells are stored densely, indexed by `CellId`:
//!
//! ```text
//! id = floor * rows * cols + row * cols + col
//! ```
//!
//! Walkable adjacency uses **Compressed Sparse Row (CSR)** format.  The
//! neighbors of cell `c` occupy
//!
//! ```text
//! adj_to[ adj_start[c] .. adj_start[c+1] ]
//! ```
//!
//! with the matching step costs in `adj_cost`.  Wall cells have no entries
//! and never appear as a neighbor.  The per-cell neighbor order is fixed
//! (N, E, S, W, NE, SE, SW, NW, then stair links in declaration order), which
//! every search in the workspace relies on for reproducible tie-breaking.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use eg_core::{CellCoord, CellId, EgError, EgResult};

use crate::cell::OFFSETS;
use crate::{CellKind, Connectivity, DIAGONAL_COST, ORTHOGONAL_COST};

/// The building's navigable representation.  Immutable after construction;
/// build one with [`GridMapBuilder`](crate::GridMapBuilder).
pub struct GridMap {
    floors: u16,
    rows:   u16,
    cols:   u16,

    connectivity: Connectivity,

    /// Cost of one stair-link traversal, fixed-point.
    stair_cost: u32,

    /// Kind of each cell.  Indexed by `CellId`.
    pub kinds: Vec<CellKind>,

    /// Fire resistance of each cell in `[0, 1]`.  Indexed by `CellId`.
    pub fire_resistance: Vec<f32>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// Row pointer, length `cell_count + 1`.
    pub adj_start: Vec<u32>,
    /// Neighbor of each adjacency entry.
    pub adj_to: Vec<CellId>,
    /// Fixed-point cost of stepping along each adjacency entry.
    pub adj_cost: Vec<u32>,

    /// All exit cells in ascending id order.
    exits: Vec<CellId>,

    /// Hazard-free cost from each cell to its nearest exit.  `u32::MAX` for
    /// walls.
    exit_distance: Vec<u32>,
}

impl GridMap {
    /// Assemble a map from validated builder output.  Computes the CSR
    /// adjacency and the exit-distance field; reachability is checked by the
    /// builder afterwards.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble(
        floors:          u16,
        rows:            u16,
        cols:            u16,
        connectivity:    Connectivity,
        stair_cost:      u32,
        kinds:           Vec<CellKind>,
        fire_resistance: Vec<f32>,
        stair_links:     &[(CellId, CellId)],
    ) -> Self {
        let mut map = GridMap {
            floors,
            rows,
            cols,
            connectivity,
            stair_cost,
            kinds,
            fire_resistance,
            adj_start: Vec::new(),
            adj_to: Vec::new(),
            adj_cost: Vec::new(),
            exits: Vec::new(),
            exit_distance: Vec::new(),
        };
        map.build_adjacency(stair_links);
        map.exits = (0..map.cell_count() as u32)
            .map(CellId)
            .filter(|&c| map.is_exit(c))
            .collect();
        map.exit_distance = map.compute_exit_distance();
        map
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn floors(&self) -> u16 { self.floors }
    pub fn rows(&self) -> u16 { self.rows }
    pub fn cols(&self) -> u16 { self.cols }
    pub fn connectivity(&self) -> Connectivity { self.connectivity }

    /// Fixed-point cost of crossing one stair link.
    pub fn stair_cost(&self) -> u32 { self.stair_cost }

    pub fn cell_count(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    fn floor_area(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    // ── Coordinates ───────────────────────────────────────────────────────

    /// Dense id of `coord`, or `None` if it lies outside the grid.
    pub fn cell_at(&self, coord: CellCoord) -> Option<CellId> {
        if coord.floor >= self.floors || coord.row >= self.rows || coord.col >= self.cols {
            return None;
        }
        let id = coord.floor as usize * self.floor_area()
            + coord.row as usize * self.cols as usize
            + coord.col as usize;
        Some(CellId(id as u32))
    }

    /// Coordinate of an in-bounds cell.
    #[inline]
    pub fn coord(&self, cell: CellId) -> CellCoord {
        let i = cell.index();
        let area = self.floor_area();
        let floor = i / area;
        let rem = i % area;
        CellCoord {
            floor: floor as u16,
            row:   (rem / self.cols as usize) as u16,
            col:   (rem % self.cols as usize) as u16,
        }
    }

    /// Checked variant of [`coord`](Self::coord) for ids from outside the
    /// simulation.
    pub fn try_coord(&self, cell: CellId) -> EgResult<CellCoord> {
        if cell.index() >= self.cell_count() {
            return Err(EgError::CellOutOfBounds(cell));
        }
        Ok(self.coord(cell))
    }

    // ── Cell queries ──────────────────────────────────────────────────────

    #[inline]
    pub fn kind(&self, cell: CellId) -> CellKind {
        self.kinds[cell.index()]
    }

    #[inline]
    pub fn is_walkable(&self, cell: CellId) -> bool {
        self.kind(cell).is_walkable()
    }

    #[inline]
    pub fn is_exit(&self, cell: CellId) -> bool {
        self.kind(cell) == CellKind::Exit
    }

    #[inline]
    pub fn fire_resistance(&self, cell: CellId) -> f32 {
        self.fire_resistance[cell.index()]
    }

    /// All exit cells in ascending id order.
    pub fn exits(&self) -> &[CellId] {
        &self.exits
    }

    /// Iterator over every walkable cell in ascending id order.
    pub fn walkable_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.cell_count() as u32)
            .map(CellId)
            .filter(|&c| self.is_walkable(c))
    }

    // ── Adjacency ─────────────────────────────────────────────────────────

    /// Walkable neighbors of `cell` with the fixed-point cost of stepping to
    /// each, in the fixed neighbor order.  Empty for walls.
    #[inline]
    pub fn neighbors(&self, cell: CellId) -> impl Iterator<Item = (CellId, u32)> + '_ {
        let start = self.adj_start[cell.index()] as usize;
        let end   = self.adj_start[cell.index() + 1] as usize;
        self.adj_to[start..end]
            .iter()
            .copied()
            .zip(self.adj_cost[start..end].iter().copied())
    }

    /// Fixed-point cost of the single step `from → to`, or `None` when the
    /// two cells are not adjacent.
    pub fn step_cost(&self, from: CellId, to: CellId) -> Option<u32> {
        self.neighbors(from).find(|&(n, _)| n == to).map(|(_, cost)| cost)
    }

    /// Number of walkable neighbors of `cell`.
    #[inline]
    pub fn degree(&self, cell: CellId) -> usize {
        (self.adj_start[cell.index() + 1] - self.adj_start[cell.index()]) as usize
    }

    /// In-bounds cells of the 3×3 block centred on `cell` on the same floor,
    /// excluding `cell` itself.  Walls included.
    pub fn moore_neighborhood(&self, cell: CellId) -> impl Iterator<Item = CellId> + '_ {
        let c = self.coord(cell);
        OFFSETS.iter().filter_map(move |&(dr, dc)| self.offset(c, dr, dc))
    }

    fn offset(&self, c: CellCoord, dr: i32, dc: i32) -> Option<CellId> {
        let r = c.row as i32 + dr;
        let col = c.col as i32 + dc;
        if r < 0 || col < 0 {
            return None;
        }
        self.cell_at(CellCoord::new(c.floor, r as u16, col as u16))
    }

    // ── Distances ─────────────────────────────────────────────────────────

    /// Hazard-free fixed-point cost from `cell` to its nearest exit.
    ///
    /// Exact under the map's own step costs, so it is an admissible (and
    /// consistent) A* heuristic for any cost model that only adds
    /// non-negative penalties.  `None` for walls.
    #[inline]
    pub fn exit_distance(&self, cell: CellId) -> Option<u32> {
        match self.exit_distance[cell.index()] {
            u32::MAX => None,
            d => Some(d),
        }
    }

    /// Admissible estimate of the fixed-point cost between two cells.
    ///
    /// Same floor: octile distance (8-connected) or Manhattan distance
    /// (4-connected).  Different floors: one stair crossing per floor, since
    /// stair landings on different floors need not line up.
    pub fn distance_heuristic(&self, a: CellId, b: CellId) -> u32 {
        let (ca, cb) = (self.coord(a), self.coord(b));
        if ca.floor != cb.floor {
            return ca.floor.abs_diff(cb.floor) as u32 * self.stair_cost;
        }
        let dr = ca.row.abs_diff(cb.row) as u32;
        let dc = ca.col.abs_diff(cb.col) as u32;
        match self.connectivity {
            Connectivity::Four => (dr + dc) * ORTHOGONAL_COST,
            Connectivity::Eight => {
                let (lo, hi) = (dr.min(dc), dr.max(dc));
                lo * DIAGONAL_COST + (hi - lo) * ORTHOGONAL_COST
            }
        }
    }

    // ── Construction internals ────────────────────────────────────────────

    fn build_adjacency(&mut self, stair_links: &[(CellId, CellId)]) {
        let n = self.cell_count();
        let dirs = match self.connectivity {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        };

        let mut adj_start = Vec::with_capacity(n + 1);
        let mut adj_to = Vec::new();
        let mut adj_cost = Vec::new();
        adj_start.push(0u32);

        for i in 0..n {
            let cell = CellId(i as u32);
            if self.is_walkable(cell) {
                let c = self.coord(cell);
                for (k, &(dr, dc)) in OFFSETS[..dirs].iter().enumerate() {
                    let Some(next) = self.offset(c, dr, dc) else { continue };
                    if !self.is_walkable(next) {
                        continue;
                    }
                    let diagonal = k >= 4;
                    if diagonal && !self.corner_clear(c, dr, dc) {
                        continue;
                    }
                    adj_to.push(next);
                    adj_cost.push(if diagonal { DIAGONAL_COST } else { ORTHOGONAL_COST });
                }
                for &(a, b) in stair_links {
                    let other = if a == cell { b } else if b == cell { a } else { continue };
                    adj_to.push(other);
                    adj_cost.push(self.stair_cost);
                }
            }
            adj_start.push(adj_to.len() as u32);
        }

        self.adj_start = adj_start;
        self.adj_to = adj_to;
        self.adj_cost = adj_cost;
    }

    /// A diagonal step is allowed only when both orthogonal cells it passes
    /// between are walkable.
    fn corner_clear(&self, c: CellCoord, dr: i32, dc: i32) -> bool {
        let a = self.offset(c, dr, 0);
        let b = self.offset(c, 0, dc);
        matches!((a, b), (Some(a), Some(b)) if self.is_walkable(a) && self.is_walkable(b))
    }

    /// Multi-source Dijkstra from every exit.  Adjacency is symmetric, so
    /// forward edges double as reverse edges.
    fn compute_exit_distance(&self) -> Vec<u32> {
        let mut dist = vec![u32::MAX; self.cell_count()];
        let mut heap: BinaryHeap<Reverse<(u32, CellId)>> = BinaryHeap::new();
        for &exit in &self.exits {
            dist[exit.index()] = 0;
            heap.push(Reverse((0, exit)));
        }

        while let Some(Reverse((cost, cell))) = heap.pop() {
            if cost > dist[cell.index()] {
                continue;
            }
            for (next, step) in self.neighbors(cell) {
                let new_cost = cost.saturating_add(step);
                if new_cost < dist[next.index()] {
                    dist[next.index()] = new_cost;
                    heap.push(Reverse((new_cost, next)));
                }
            }
        }
        dist
    }
}
