//! Fluent builder for constructing a [`Sim`].

use eg_core::{AgentId, CellId, SimConfig, SimRng};
use eg_crowd::{AgentStore, CrowdConfig, CrowdResolver, Occupancy};
use eg_grid::GridMap;
use eg_hazard::{FireSeed, HazardConfig, HazardField};
use eg_route::Pathfinder;
use tracing::info;

use crate::{Sim, SimError, SimResult, TickStats};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick duration, tick budget, seed, threads, snapshots
/// - [`GridMap`]: from [`eg_grid::GridMapBuilder`]
/// - [`AgentStore`]: from [`eg_crowd::AgentStoreBuilder`]
/// - `P: Pathfinder`: the routing algorithm (e.g. [`eg_route::HazardAStar`])
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                                      |
/// |--------------------------|----------------------------------------------|
/// | `.hazard_config(c)`      | `HazardConfig::default()`                    |
/// | `.fire_seeds(v)`         | No fire                                      |
/// | `.crowd_config(c)`       | `CrowdConfig::default()`                     |
/// | `.initial_positions(v)`  | Seeded random walkable, non-exit cells       |
///
/// # Example
///
/// ```rust,ignore
/// let agents = AgentStoreBuilder::new(n, seed).build()?;
/// let mut sim = SimBuilder::new(config, grid, agents, HazardAStar::default())
///     .fire_seeds(vec![FireSeed::new(cell, Tick(0), 0.8)])
///     .initial_positions(positions)
///     .build()?;
/// let summary = sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<P: Pathfinder> {
    config:        SimConfig,
    grid:          GridMap,
    agents:        AgentStore,
    pathfinder:    P,
    hazard_config: Option<HazardConfig>,
    seeds:         Vec<FireSeed>,
    crowd_config:  Option<CrowdConfig>,
    positions:     Option<Vec<CellId>>,
}

impl<P: Pathfinder> SimBuilder<P> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, grid: GridMap, agents: AgentStore, pathfinder: P) -> Self {
        Self {
            config,
            grid,
            agents,
            pathfinder,
            hazard_config: None,
            seeds:         Vec::new(),
            crowd_config:  None,
            positions:     None,
        }
    }

    pub fn hazard_config(mut self, config: HazardConfig) -> Self {
        self.hazard_config = Some(config);
        self
    }

    /// Fire ignitions.  Each must lie on a walkable cell.
    pub fn fire_seeds(mut self, seeds: Vec<FireSeed>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn crowd_config(mut self, config: CrowdConfig) -> Self {
        self.crowd_config = Some(config);
        self
    }

    /// Starting cell of each occupant (must be length `agent_count`).
    ///
    /// Every cell must be walkable, not an exit, and used at most once.  If
    /// not called, occupants are scattered over distinct walkable non-exit
    /// cells using `config.seed`.
    pub fn initial_positions(mut self, positions: Vec<CellId>) -> Self {
        self.positions = Some(positions);
        self
    }

    /// Validate inputs, place occupants, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<P>> {
        self.config.validate()?;
        let agent_count = self.agents.count;
        let grid = self.grid;

        // ── Resolve and validate positions ────────────────────────────────
        let positions = match self.positions {
            Some(p) => {
                if p.len() != agent_count {
                    return Err(SimError::AgentCountMismatch {
                        expected: agent_count,
                        got:      p.len(),
                        what:     "initial positions",
                    });
                }
                p
            }
            None => scatter(&grid, agent_count, self.config.seed)?,
        };

        let mut agents = self.agents;
        let mut occupancy = Occupancy::new(grid.cell_count());
        for (i, &cell) in positions.iter().enumerate() {
            let agent = AgentId(i as u32);
            let coord = grid.try_coord(cell)?;
            let reason = if !grid.is_walkable(cell) {
                Some("not walkable")
            } else if grid.is_exit(cell) {
                Some("cell is an exit")
            } else if occupancy.is_occupied(cell) {
                Some("cell already taken")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(SimError::InvalidPosition { agent, coord, reason });
            }
            agents.place(agent, cell);
            occupancy.enter(cell);
        }

        // ── Hazard, crowd, thread pool ────────────────────────────────────
        let seed_count = self.seeds.len();
        let hazard = HazardField::new(&grid, self.hazard_config.unwrap_or_default(), self.seeds)?;
        let resolver = CrowdResolver::new(self.crowd_config.unwrap_or_default())?;

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(e.to_string()))?,
            ),
            None => None,
        };

        info!(
            agents = agent_count,
            walkable = grid.walkable_cells().count(),
            exits = grid.exits().len(),
            fire_seeds = seed_count,
            max_ticks = self.config.max_ticks,
            "simulation built"
        );

        Ok(Sim {
            clock: self.config.make_clock(),
            config: self.config,
            grid,
            hazard,
            agents,
            occupancy,
            pathfinder: self.pathfinder,
            resolver,
            last_stats: TickStats::default(),
            ticks_run: 0,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}

/// Pick `count` distinct walkable non-exit cells, shuffled with `seed`.
fn scatter(grid: &GridMap, count: usize, seed: u64) -> SimResult<Vec<CellId>> {
    let mut free: Vec<CellId> = grid.walkable_cells().filter(|&c| !grid.is_exit(c)).collect();
    if free.len() < count {
        return Err(SimError::Config(format!(
            "{count} occupants do not fit on {} free cells",
            free.len()
        )));
    }
    SimRng::new(seed).shuffle(&mut free);
    free.truncate(count);
    Ok(free)
}
