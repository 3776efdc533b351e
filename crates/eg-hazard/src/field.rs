//! The hazard field and its per-tick update.

use eg_core::{CellId, Tick};
use eg_grid::{GridMap, COST_SCALE};
use tracing::{debug, info};

use crate::{FireSeed, HazardConfig, HazardError, HazardResult};

// ── ChangedCells ──────────────────────────────────────────────────────────────

/// Cells whose hazard changed materially during one [`HazardField::advance`],
/// in ascending id order, together with the field version they were stamped
/// with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangedCells {
    cells:   Vec<CellId>,
    version: u64,
}

impl ChangedCells {
    /// Field version after the advance that produced this set.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// O(log n) membership test.
    pub fn contains(&self, cell: CellId) -> bool {
        self.cells.binary_search(&cell).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    pub fn as_slice(&self) -> &[CellId] {
        &self.cells
    }
}

// ── HazardField ───────────────────────────────────────────────────────────────

/// Per-cell fire intensity and smoke density, co-indexed with the
/// [`GridMap`] by `CellId`.
///
/// Owned by the engine and advanced exactly once per tick; everything else
/// reads it through `&HazardField`.
pub struct HazardField {
    config: HazardConfig,

    seeds:   Vec<FireSeed>,
    ignited: Vec<bool>,

    /// Current fire intensity per cell.
    intensity: Vec<f32>,
    /// Current smoke density per cell.
    smoke: Vec<f32>,

    // Scratch buffers for the double-buffered update.
    next_intensity: Vec<f32>,
    next_smoke:     Vec<f32>,

    /// Values at the time each cell was last reported as changed.
    reported_intensity: Vec<f32>,
    reported_smoke:     Vec<f32>,

    /// Field version at which each cell last changed materially (0 = never).
    changed_at: Vec<u64>,

    /// Bumped on every advance that reports at least one changed cell.
    version: u64,
}

impl HazardField {
    /// Create a quiescent field (no fire, no smoke) for `grid`.
    ///
    /// # Errors
    ///
    /// An invalid config, or a seed outside the grid or on a wall.
    pub fn new(grid: &GridMap, config: HazardConfig, seeds: Vec<FireSeed>) -> HazardResult<Self> {
        config.validate()?;
        for seed in &seeds {
            let coord = grid
                .try_coord(seed.cell)
                .map_err(|_| HazardError::SeedOutOfBounds(seed.cell))?;
            if !grid.is_walkable(seed.cell) {
                return Err(HazardError::SeedOnWall(coord));
            }
        }

        let n = grid.cell_count();
        Ok(Self {
            config,
            ignited: vec![false; seeds.len()],
            seeds,
            intensity:          vec![0.0; n],
            smoke:              vec![0.0; n],
            next_intensity:     vec![0.0; n],
            next_smoke:         vec![0.0; n],
            reported_intensity: vec![0.0; n],
            reported_smoke:     vec![0.0; n],
            changed_at:         vec![0; n],
            version:            0,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &HazardConfig {
        &self.config
    }

    #[inline]
    pub fn intensity(&self, cell: CellId) -> f32 {
        self.intensity[cell.index()]
    }

    #[inline]
    pub fn smoke(&self, cell: CellId) -> f32 {
        self.smoke[cell.index()]
    }

    #[inline]
    pub fn is_burning(&self, cell: CellId) -> bool {
        self.intensity[cell.index()] > 0.0
    }

    /// All intensities, indexed by `CellId`.
    pub fn intensities(&self) -> &[f32] {
        &self.intensity
    }

    /// All smoke densities, indexed by `CellId`.
    pub fn smoke_densities(&self) -> &[f32] {
        &self.smoke
    }

    /// Current field version.  Routes are tagged with this when computed.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version at which `cell` last changed materially (0 = never).
    #[inline]
    pub fn changed_at(&self, cell: CellId) -> u64 {
        self.changed_at[cell.index()]
    }

    /// `true` if `cell` changed materially after field version `version`.
    #[inline]
    pub fn changed_since(&self, cell: CellId, version: u64) -> bool {
        self.changed_at[cell.index()] > version
    }

    pub fn burning_count(&self) -> usize {
        self.intensity.iter().filter(|&&i| i > 0.0).count()
    }

    pub fn max_intensity(&self) -> f32 {
        self.intensity.iter().copied().fold(0.0, f32::max)
    }

    pub fn max_smoke(&self) -> f32 {
        self.smoke.iter().copied().fold(0.0, f32::max)
    }

    // ── Update ────────────────────────────────────────────────────────────

    /// Advance the field by one tick and return the cells that changed
    /// materially.
    ///
    /// `grid` must be the map the field was created for.
    pub fn advance(&mut self, tick: Tick, grid: &GridMap) -> ChangedCells {
        self.ignite(tick);
        self.step_fire(grid);
        self.step_smoke(grid);
        std::mem::swap(&mut self.intensity, &mut self.next_intensity);
        std::mem::swap(&mut self.smoke, &mut self.next_smoke);
        let changed = self.collect_changes();

        debug!(
            %tick,
            version = self.version,
            changed = changed.len(),
            burning = self.burning_count(),
            "hazard advanced"
        );
        changed
    }

    fn ignite(&mut self, tick: Tick) {
        let cap = self.config.fire_cap;
        for (seed, done) in self.seeds.iter().zip(self.ignited.iter_mut()) {
            if *done || seed.ignite_tick > tick {
                continue;
            }
            *done = true;
            let cell = seed.cell.index();
            self.intensity[cell] = self.intensity[cell].max(seed.intensity.clamp(0.0, cap));
            info!(%tick, cell = %seed.cell, intensity = seed.intensity, "fire ignited");
        }
    }

    /// Growth plus spread, reading `intensity`, writing `next_intensity`.
    fn step_fire(&mut self, grid: &GridMap) {
        let cfg = &self.config;
        let cur = &self.intensity;
        for (i, next) in self.next_intensity.iter_mut().enumerate() {
            let cell = CellId(i as u32);
            let value = cur[i];
            if !grid.is_walkable(cell) {
                *next = value;
                continue;
            }
            let admit = 1.0 - grid.fire_resistance(cell);

            let growth = if value > 0.0 { cfg.growth_rate * admit } else { 0.0 };

            let mut spread = 0.0;
            for (from, step_cost) in grid.neighbors(cell) {
                let source = cur[from.index()];
                if source >= cfg.ignition_threshold {
                    let attenuation = COST_SCALE as f32 / step_cost as f32;
                    spread += cfg.spread_rate * (source / cfg.fire_cap) * attenuation;
                }
            }

            *next = (value + growth + spread * admit).min(cfg.fire_cap);
        }
    }

    /// Diffusion toward the neighbour mean plus a fire source term, reading
    /// `smoke` and `intensity`, writing `next_smoke`.
    fn step_smoke(&mut self, grid: &GridMap) {
        let cfg = &self.config;
        let (smoke, fire) = (&self.smoke, &self.intensity);
        for (i, next) in self.next_smoke.iter_mut().enumerate() {
            let cell = CellId(i as u32);
            let value = smoke[i];
            if !grid.is_walkable(cell) {
                *next = value;
                continue;
            }

            let mut sum = 0.0;
            let mut count = 0u32;
            let mut hottest = fire[i];
            for (from, _) in grid.neighbors(cell) {
                sum += smoke[from.index()];
                count += 1;
                hottest = hottest.max(fire[from.index()]);
            }
            let mean = if count > 0 { sum / count as f32 } else { value };
            let source = cfg.smoke_source_rate * hottest / cfg.fire_cap;
            let nudged = value + cfg.diffusion_rate * (mean - value) + source;

            *next = nudged.max(value).min(cfg.smoke_cap);
        }
    }

    fn collect_changes(&mut self) -> ChangedCells {
        let delta = self.config.material_delta;
        let mut cells = Vec::new();
        for i in 0..self.intensity.len() {
            let di = (self.intensity[i] - self.reported_intensity[i]).abs();
            let ds = (self.smoke[i] - self.reported_smoke[i]).abs();
            if di >= delta || ds >= delta {
                self.reported_intensity[i] = self.intensity[i];
                self.reported_smoke[i] = self.smoke[i];
                cells.push(CellId(i as u32));
            }
        }
        if !cells.is_empty() {
            self.version += 1;
            for &c in &cells {
                self.changed_at[c.index()] = self.version;
            }
        }
        ChangedCells { cells, version: self.version }
    }
}
