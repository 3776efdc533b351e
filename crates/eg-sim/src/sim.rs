//! The `Sim` struct and its tick loop.

use eg_core::{AgentId, EgError, SimClock, SimConfig, Tick};
use eg_crowd::{AgentStatus, AgentStore, CrowdResolver, Occupancy};
use eg_grid::GridMap;
use eg_hazard::HazardField;
use eg_route::{Pathfinder, Route, RouteError, RouteResult};
use tracing::{debug, error, info};

use crate::{
    AgentSnapshot, EvacuationSummary, SimError, SimObserver, SimResult, TickSnapshot, TickStats,
};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<P>` holds all simulation state and drives the tick loop:
///
/// 1. **Hazard**: advance fire and smoke one tick.
/// 2. **Invalidate**: drop routes whose remaining cells changed materially.
/// 3. **Route** (optionally parallel with the `parallel` feature): plan for
///    every occupant without a route, applied in ascending `AgentId` order.
/// 4. **Resolve**: move occupants, settle conflicts, accrue exposure.
/// 5. **Check**: verify occupancy invariants; a violation halts the run.
/// 6. **Snapshot**: hand an owned projection to the caller or observer.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<P: Pathfinder> {
    pub(crate) config: SimConfig,
    pub(crate) clock:  SimClock,

    pub(crate) grid:      GridMap,
    pub(crate) hazard:    HazardField,
    pub(crate) agents:    AgentStore,
    pub(crate) occupancy: Occupancy,

    pub(crate) pathfinder: P,
    pub(crate) resolver:   CrowdResolver,

    /// Counters of the most recently processed tick.
    pub(crate) last_stats: TickStats,
    pub(crate) ticks_run:  u64,

    /// Dedicated routing pool when `config.num_threads` is set.
    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl<P: Pathfinder> Sim<P> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The next tick to be processed.
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    pub fn hazard(&self) -> &HazardField {
        &self.hazard
    }

    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn pathfinder(&self) -> &P {
        &self.pathfinder
    }

    /// Current view of one occupant.
    pub fn agent(&self, id: AgentId) -> SimResult<AgentSnapshot> {
        if !self.agents.contains(id) {
            return Err(EgError::AgentNotFound(id).into());
        }
        Ok(self.agent_snapshot(id))
    }

    /// `true` once every occupant is terminal or the tick budget is spent.
    pub fn is_finished(&self) -> bool {
        self.agents.all_terminal() || self.clock.current_tick >= self.config.end_tick()
    }

    // ── Driving the loop ──────────────────────────────────────────────────

    /// Process one tick and return its snapshot.
    ///
    /// Does not consult the tick budget; callers decide when to stop.
    pub fn step(&mut self) -> SimResult<TickSnapshot> {
        let now = self.clock.current_tick;
        self.process_tick(now)?;
        Ok(self.snapshot())
    }

    /// Run until every occupant is terminal or `config.max_ticks` is reached.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<EvacuationSummary> {
        while !self.is_finished() {
            self.observed_tick(observer, false)?;
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            escaped = summary.escaped,
            incapacitated = summary.incapacitated,
            remaining = summary.remaining,
            "simulation finished"
        );
        observer.on_sim_end(&summary);
        Ok(summary)
    }

    /// Run `n` more ticks, ignoring the tick budget but stopping early once
    /// every occupant is terminal.  The last tick run is always snapshotted.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for k in 0..n {
            if self.agents.all_terminal() {
                break;
            }
            self.observed_tick(observer, k + 1 == n)?;
        }
        Ok(())
    }

    /// Iterator that steps the simulation and yields one snapshot per tick
    /// until [`is_finished`](Self::is_finished).  An error is yielded once
    /// and ends the iteration.
    pub fn snapshots(&mut self) -> Snapshots<'_, P> {
        Snapshots { sim: self, failed: false }
    }

    /// Snapshot of the current state, labelled with the last processed tick.
    /// Never mutates the simulation.
    pub fn snapshot(&self) -> TickSnapshot {
        let tick = self.last_stats.tick;
        TickSnapshot {
            tick,
            elapsed_secs: self.clock.secs_for_ticks(self.ticks_run),
            stats: self.last_stats,
            agents: self.agents.agent_ids().map(|a| self.agent_snapshot(a)).collect(),
            hazard_version: self.hazard.version(),
            intensity: self.hazard.intensities().to_vec(),
            smoke: self.hazard.smoke_densities().to_vec(),
        }
    }

    /// End-of-run record for the state reached so far.
    pub fn summary(&self) -> EvacuationSummary {
        let times: Vec<u64> = self
            .agents
            .escaped_at
            .iter()
            .flatten()
            .map(|t| t.0 + 1)
            .collect();
        let average = (!times.is_empty())
            .then(|| times.iter().sum::<u64>() as f64 / times.len() as f64);

        EvacuationSummary {
            ticks:                    self.ticks_run,
            elapsed_secs:             self.clock.secs_for_ticks(self.ticks_run),
            total:                    self.agents.count,
            escaped:                  self.agents.count_with(AgentStatus::Escaped),
            incapacitated:            self.agents.count_with(AgentStatus::Incapacitated),
            blocked:                  self.agents.count_with(AgentStatus::Blocked),
            remaining:                self.agents.active_count(),
            average_evacuation_ticks: average,
            average_evacuation_secs:
                average.map(|t| t * self.config.tick_duration_ms as f64 / 1000.0),
            max_evacuation_ticks:     times.iter().copied().max(),
        }
    }

    fn observed_tick<O: SimObserver>(&mut self, observer: &mut O, force_snapshot: bool) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let stats = self.process_tick(now)?;
        observer.on_tick_end(now, &stats);
        if force_snapshot
            || self.is_finished()
            || now.0 % self.config.snapshot_interval_ticks == 0
        {
            observer.on_snapshot(&self.snapshot());
        }
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self, now: Tick) -> SimResult<TickStats> {
        // ── Phase 1: hazard ───────────────────────────────────────────────
        let changed = self.hazard.advance(now, &self.grid);

        // ── Phase 2: invalidate stale routes ──────────────────────────────
        //
        // Only Moving occupants hold routes.  Checking against the freshly
        // advanced field means nobody walks a route into a cell that changed
        // this very tick.
        let mut invalidated = 0;
        if !changed.is_empty() {
            for i in 0..self.agents.count {
                let stale = self.agents.status[i] == AgentStatus::Moving
                    && self.agents.route[i].as_ref().is_some_and(|r| r.is_stale(&self.hazard));
                if stale {
                    self.agents.invalidate_route(AgentId(i as u32));
                    invalidated += 1;
                }
            }
        }

        // ── Phase 3: routing (produce, then apply in ascending id) ────────
        let requests: Vec<AgentId> = self
            .agents
            .agent_ids()
            .filter(|a| self.agents.status[a.index()].wants_route())
            .collect();
        let results = self.compute_routes(&requests);

        let mut failed = 0;
        for (&agent, result) in requests.iter().zip(results) {
            match result {
                Err(RouteError::NoRoute { from }) => {
                    debug!(%now, %agent, %from, "no passable route");
                    failed += 1;
                    self.agents.apply_route(agent, Err(RouteError::NoRoute { from }));
                }
                Err(e) => return Err(e.into()),
                ok => self.agents.apply_route(agent, ok),
            }
        }

        // ── Phase 4: movement and exposure ────────────────────────────────
        let resolved = self.resolver.resolve(
            now,
            &self.grid,
            &self.hazard,
            &self.pathfinder,
            &mut self.agents,
            &mut self.occupancy,
        );

        // ── Phase 5: invariants ───────────────────────────────────────────
        self.check_invariants(now)?;

        let stats = TickStats {
            tick:                now,
            hazard_changed:      changed.len(),
            hazard_version:      self.hazard.version(),
            burning_cells:       self.hazard.burning_count(),
            max_intensity:       self.hazard.max_intensity(),
            routes_invalidated:  invalidated,
            routes_requested:    requests.len(),
            routes_failed:       failed,
            moved:               resolved.moved,
            stalled:             resolved.stalled,
            escaped:             resolved.escaped,
            incapacitated:       resolved.incapacitated,
            moving:              self.agents.count_with(AgentStatus::Moving),
            blocked:             self.agents.count_with(AgentStatus::Blocked),
            needs_route:         self.agents.count_with(AgentStatus::NeedsRoute),
            escaped_total:       self.agents.count_with(AgentStatus::Escaped),
            incapacitated_total: self.agents.count_with(AgentStatus::Incapacitated),
        };
        debug!(
            %now,
            moved = stats.moved,
            escaped = stats.escaped_total,
            burning = stats.burning_cells,
            "tick processed"
        );

        self.last_stats = stats;
        self.ticks_run += 1;
        self.clock.advance();
        Ok(stats)
    }

    /// Plan routes for `requests`, returning results in the same order.
    ///
    /// With the `parallel` Cargo feature the searches run on Rayon, inside
    /// the dedicated pool when one was configured.  The hazard field and grid
    /// are read-only for the whole phase.
    fn compute_routes(&self, requests: &[AgentId]) -> Vec<RouteResult<Route>> {
        // Explicit field borrows so the closure only captures shared refs.
        let grid       = &self.grid;
        let hazard     = &self.hazard;
        let pathfinder = &self.pathfinder;
        let cells      = self.agents.cell.as_slice();
        let plan = |agent: &AgentId| pathfinder.route(grid, hazard, cells[agent.index()]);

        #[cfg(not(feature = "parallel"))]
        {
            requests.iter().map(plan).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            match &self.pool {
                Some(pool) => pool.install(|| requests.par_iter().map(plan).collect()),
                None => requests.par_iter().map(plan).collect(),
            }
        }
    }

    /// Occupants inside the building stand on walkable cells, at most one per
    /// non-exit cell, and the occupancy counts agree with their positions.
    fn check_invariants(&self, now: Tick) -> SimResult<()> {
        let mut counts = vec![0u32; self.grid.cell_count()];
        for agent in self.agents.agent_ids() {
            let i = agent.index();
            if self.agents.status[i].is_terminal() {
                continue;
            }
            let cell = self.agents.cell[i];
            if !self.grid.is_walkable(cell) {
                return Err(self.violation(now, format!(
                    "{agent} stands on non-walkable {}",
                    self.grid.coord(cell)
                )));
            }
            counts[cell.index()] += 1;
            if counts[cell.index()] > 1 && !self.grid.is_exit(cell) {
                return Err(self.violation(now, format!(
                    "{agent} shares {} with another occupant",
                    self.grid.coord(cell)
                )));
            }
        }
        if counts.as_slice() != self.occupancy.counts() {
            return Err(self.violation(now, "occupancy counts disagree with positions".into()));
        }
        Ok(())
    }

    fn violation(&self, tick: Tick, detail: String) -> SimError {
        error!(%tick, %detail, "invariant violated");
        SimError::Invariant { tick, detail }
    }

    fn agent_snapshot(&self, id: AgentId) -> AgentSnapshot {
        let i = id.index();
        let cell = self.agents.cell[i];
        AgentSnapshot {
            id,
            cell,
            coord:    self.grid.coord(cell),
            status:   self.agents.status[i],
            exposure: self.agents.exposure[i],
        }
    }
}

// ── Snapshot iterator ─────────────────────────────────────────────────────────

/// Iterator returned by [`Sim::snapshots`].
pub struct Snapshots<'a, P: Pathfinder> {
    sim:    &'a mut Sim<P>,
    failed: bool,
}

impl<P: Pathfinder> Iterator for Snapshots<'_, P> {
    type Item = SimResult<TickSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.sim.is_finished() {
            return None;
        }
        let result = self.sim.step();
        self.failed = result.is_err();
        Some(result)
    }
}
