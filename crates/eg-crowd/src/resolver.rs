//! Per-tick movement, conflict, and exposure resolution.

use eg_core::{AgentId, CellId, Tick};
use eg_grid::{COST_SCALE, GridMap};
use eg_hazard::HazardField;
use eg_route::Pathfinder;
use tracing::{debug, trace};

use crate::{AgentStatus, AgentStore, CrowdConfig, CrowdResult, Occupancy};

#[cfg(feature = "fx-hash")]
type CellSet = rustc_hash::FxHashSet<CellId>;
#[cfg(not(feature = "fx-hash"))]
type CellSet = std::collections::HashSet<CellId>;

#[cfg(feature = "fx-hash")]
type CellMap<V> = rustc_hash::FxHashMap<CellId, V>;
#[cfg(not(feature = "fx-hash"))]
type CellMap<V> = std::collections::HashMap<CellId, V>;

/// One occupant asking to enter its next cell this tick.
#[derive(Copy, Clone, Debug)]
struct Proposal {
    agent:  AgentId,
    target: CellId,
    /// Progress the step consumes: its cost in cell lengths.
    length: f32,
}

/// Counts of what happened during one [`CrowdResolver::resolve`] call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolveStats {
    /// Occupants that entered a new cell (exits included).
    pub moved: usize,
    /// Occupants ready to move that stayed put: lost a conflict, faced an
    /// occupied cell, or found their next cell lethal.
    pub stalled: usize,
    /// Occupants that stepped onto an exit.
    pub escaped: usize,
    /// Occupants whose exposure passed the cap.
    pub incapacitated: usize,
}

/// Moves occupants along their routes, one tick at a time.
///
/// [`resolve`](Self::resolve) runs three steps, all in ascending `AgentId`
/// order:
///
/// 1. **Progress.**  Every `Moving` occupant gains `speed` progress (times
///    `crowd_slowdown` when crowded), capped at the length of its next step:
///    one for an orthogonal step, about 1.414 for a diagonal and the stair
///    cost for a stair crossing.  Those with a full step's progress propose
///    their route's next cell.  A proposal into a cell the pathfinder no
///    longer considers passable is dropped and the route is invalidated.
/// 2. **Conflicts.**  Each target goes to its lowest-id proposer; every
///    other proposer for that cell stalls, even if the winner cannot move
///    yet.  Winners are then granted in repeated passes: a winner moves when
///    its target is free or an exit, and occupants that move free their old
///    cell for later passes, so a queue shuffles forward together.  When a
///    pass grants nothing, winners waiting on each other in a closed loop
///    (two occupants head-on included) rotate together.  Passes stop when
///    neither happens.
/// 3. **Exposure.**  Occupants still inside on a cell at or above either
///    survivable threshold accumulate `intensity + smoke`; beyond the cap
///    they become `Incapacitated` and leave occupancy.
pub struct CrowdResolver {
    config: CrowdConfig,
}

impl CrowdResolver {
    pub fn new(config: CrowdConfig) -> CrowdResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CrowdConfig {
        &self.config
    }

    /// `true` when more than `density_threshold` cells around `cell` on its
    /// floor are occupied.
    pub fn crowded(&self, grid: &GridMap, occupancy: &Occupancy, cell: CellId) -> bool {
        let occupied = grid
            .moore_neighborhood(cell)
            .filter(|&c| occupancy.is_occupied(c))
            .count();
        occupied > self.config.density_threshold as usize
    }

    /// Resolve one tick of movement and exposure.
    pub fn resolve<P: Pathfinder + ?Sized>(
        &self,
        tick:       Tick,
        grid:       &GridMap,
        hazard:     &HazardField,
        pathfinder: &P,
        agents:     &mut AgentStore,
        occupancy:  &mut Occupancy,
    ) -> ResolveStats {
        let mut stats = ResolveStats::default();

        let proposals =
            self.collect_proposals(grid, hazard, pathfinder, agents, occupancy, &mut stats);
        self.grant_proposals(tick, grid, proposals, agents, occupancy, &mut stats);
        self.accrue_exposure(tick, hazard, agents, occupancy, &mut stats);

        stats
    }

    // ── Step 1: progress and proposals ────────────────────────────────────

    fn collect_proposals<P: Pathfinder + ?Sized>(
        &self,
        grid:       &GridMap,
        hazard:     &HazardField,
        pathfinder: &P,
        agents:     &mut AgentStore,
        occupancy:  &Occupancy,
        stats:      &mut ResolveStats,
    ) -> Vec<Proposal> {
        let mut proposals = Vec::new();
        for i in 0..agents.count {
            let agent = AgentId(i as u32);
            if agents.status[i] != AgentStatus::Moving {
                continue;
            }
            let Some(next) = agents.route[i].as_ref().and_then(|r| r.next_cell()) else {
                agents.invalidate_route(agent);
                continue;
            };

            let Some(cost) = grid.step_cost(agents.cell[i], next) else {
                agents.invalidate_route(agent);
                continue;
            };
            let length = cost as f32 / COST_SCALE as f32;

            let mut gain = agents.speed[i];
            if self.crowded(grid, occupancy, agents.cell[i]) {
                gain *= self.config.crowd_slowdown;
            }
            agents.progress[i] = (agents.progress[i] + gain).min(length);
            if agents.progress[i] < length {
                continue;
            }

            if !pathfinder.passable(hazard, next) {
                agents.invalidate_route(agent);
                stats.stalled += 1;
                continue;
            }
            proposals.push(Proposal { agent, target: next, length });
        }
        proposals
    }

    // ── Step 2: conflict resolution ───────────────────────────────────────

    fn grant_proposals(
        &self,
        tick:      Tick,
        grid:      &GridMap,
        proposals: Vec<Proposal>,
        agents:    &mut AgentStore,
        occupancy: &mut Occupancy,
        stats:     &mut ResolveStats,
    ) {
        // Proposals arrive in ascending id order.
        let mut claimed = CellSet::default();
        let mut pending = Vec::with_capacity(proposals.len());
        for p in proposals {
            if claimed.insert(p.target) {
                pending.push(p);
            } else {
                stats.stalled += 1;
            }
        }

        while !pending.is_empty() {
            let mut granted = false;
            let mut waiting = Vec::with_capacity(pending.len());

            for p in pending {
                if !grid.is_exit(p.target) && occupancy.is_occupied(p.target) {
                    waiting.push(p);
                    continue;
                }
                step(tick, grid, p, agents, occupancy, stats);
                granted = true;
            }

            if !granted {
                let before = waiting.len();
                waiting = rotate_cycles(tick, grid, waiting, agents, occupancy, stats);
                if waiting.len() == before {
                    stats.stalled += waiting.len();
                    break;
                }
            }
            pending = waiting;
        }
    }

    // ── Step 3: exposure ──────────────────────────────────────────────────

    fn accrue_exposure(
        &self,
        tick:      Tick,
        hazard:    &HazardField,
        agents:    &mut AgentStore,
        occupancy: &mut Occupancy,
        stats:     &mut ResolveStats,
    ) {
        let cfg = &self.config;
        for i in 0..agents.count {
            if agents.status[i].is_terminal() {
                continue;
            }
            let cell = agents.cell[i];
            let (fire, smoke) = (hazard.intensity(cell), hazard.smoke(cell));
            if fire < cfg.survivable_intensity && smoke < cfg.survivable_smoke {
                continue;
            }
            agents.exposure[i] += fire + smoke;
            if agents.exposure[i] > cfg.exposure_cap {
                agents.status[i] = AgentStatus::Incapacitated;
                agents.route[i] = None;
                agents.incapacitated_at[i] = Some(tick);
                occupancy.leave(cell);
                stats.incapacitated += 1;
                debug!(
                    %tick,
                    agent = %AgentId(i as u32),
                    %cell,
                    exposure = agents.exposure[i],
                    "occupant incapacitated"
                );
            }
        }
    }
}

/// Rotate every closed loop of waiting proposals: each member's target is
/// held by the next member.  Returns the proposals left waiting.
fn rotate_cycles(
    tick:      Tick,
    grid:      &GridMap,
    waiting:   Vec<Proposal>,
    agents:    &mut AgentStore,
    occupancy: &mut Occupancy,
    stats:     &mut ResolveStats,
) -> Vec<Proposal> {
    let holder: CellMap<usize> = waiting
        .iter()
        .enumerate()
        .map(|(w, p)| (agents.cell[p.agent.index()], w))
        .collect();

    // 0 = unvisited, 1 = on the current walk, 2 = done.
    let mut mark = vec![0u8; waiting.len()];
    let mut in_cycle = vec![false; waiting.len()];
    for start in 0..waiting.len() {
        let mut walk = Vec::new();
        let mut w = start;
        loop {
            if mark[w] != 0 {
                if mark[w] == 1 {
                    if let Some(pos) = walk.iter().position(|&x| x == w) {
                        for &m in &walk[pos..] {
                            in_cycle[m] = true;
                        }
                    }
                }
                break;
            }
            mark[w] = 1;
            walk.push(w);
            match holder.get(&waiting[w].target) {
                Some(&next) => w = next,
                None => break,
            }
        }
        for &m in &walk {
            mark[m] = 2;
        }
    }

    let mut left = Vec::with_capacity(waiting.len());
    let mut rotated = 0usize;
    for (w, p) in waiting.into_iter().enumerate() {
        if in_cycle[w] {
            step(tick, grid, p, agents, occupancy, stats);
            rotated += 1;
        } else {
            left.push(p);
        }
    }
    if rotated > 0 {
        trace!(%tick, rotated, "waiting occupants rotated through a loop");
    }
    left
}

/// Move the proposing occupant into its target, escaping if it is an exit.
fn step(
    tick:      Tick,
    grid:      &GridMap,
    p:         Proposal,
    agents:    &mut AgentStore,
    occupancy: &mut Occupancy,
    stats:     &mut ResolveStats,
) {
    let Proposal { agent, target, length } = p;
    let i = agent.index();
    occupancy.leave(agents.cell[i]);
    agents.cell[i] = target;
    agents.progress[i] = (agents.progress[i] - length).max(0.0);
    if let Some(route) = agents.route[i].as_mut() {
        route.advance();
    }
    stats.moved += 1;

    if grid.is_exit(target) {
        agents.status[i] = AgentStatus::Escaped;
        agents.escaped_at[i] = Some(tick);
        agents.route[i] = None;
        stats.escaped += 1;
        trace!(%tick, %agent, cell = %target, "occupant escaped");
    } else {
        occupancy.enter(target);
    }
}
