use crate::agent::Agent;
use crate::bridge;
use crate::path_table::PathTable;
use anyhow::Result;
use mapf_instance::{path_cost, GridMap, Path};
use rand::{rngs::SmallRng, seq::SliceRandom};
use std::time::Instant;

/// The neighbor working set of one iteration: the selected agent ids, a
/// snapshot of their pre-iteration paths and their aggregate cost. Created
/// when an iteration starts and discarded when it ends.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub agents: Vec<usize>,
    pub old_paths: Vec<Path>,
    pub old_cost: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// New paths are committed to the registry and the reservation table.
    Improved {
        new_cost: usize,
        /// Joint lower bound reported by an exact solver, if any.
        lower_bound: Option<usize>,
    },
    /// A complete but non-improving assignment; nothing was committed.
    Rejected,
    /// The backend could not produce a complete assignment within budget.
    Failed,
}

impl RepairOutcome {
    pub fn is_improved(&self) -> bool {
        matches!(self, RepairOutcome::Improved { .. })
    }
}

/// A repair backend re-plans exactly the neighbor subset under hard
/// constraints from all other agents' reservations. On entry the neighbor
/// paths have already been deleted from the table; on any non-`Improved`
/// outcome the backend must leave the table exactly as it received it (the
/// orchestration loop then restores the snapshot).
pub trait RepairBackend {
    fn name(&self) -> &'static str;

    fn attempt_repair(
        &mut self,
        map: &GridMap,
        agents: &mut [Agent],
        table: &mut PathTable,
        neighbor: &Neighbor,
        deadline: Instant,
        rng: &mut SmallRng,
    ) -> Result<RepairOutcome>;
}

/// Joint solution of an exact solver collaborator: one path per neighbor
/// agent, in neighbor order.
#[derive(Debug, Clone)]
pub struct JointSolution {
    pub paths: Vec<Path>,
    pub cost: usize,
    pub lower_bound: usize,
}

/// Exact joint solver collaborator. The search internals (branch-and-bound
/// conflict search) are outside this crate's scope; anything honoring this
/// contract plugs into the `ExactJoint` backend.
pub trait JointSolver {
    fn name(&self) -> &'static str;

    fn solve(
        &mut self,
        map: &GridMap,
        agents: &[Agent],
        neighbor: &[usize],
        table: &PathTable,
        deadline: Instant,
    ) -> Option<JointSolution>;
}

/// Sequential re-planning in a uniformly random priority order. Aborts when
/// an agent cannot be planned, the deadline passes, or the running cost
/// meets or exceeds the snapshot cost; partial insertions are removed on
/// abort.
pub struct PrioritizedPlanning;

impl RepairBackend for PrioritizedPlanning {
    fn name(&self) -> &'static str {
        "PP"
    }

    fn attempt_repair(
        &mut self,
        map: &GridMap,
        agents: &mut [Agent],
        table: &mut PathTable,
        neighbor: &Neighbor,
        deadline: Instant,
        rng: &mut SmallRng,
    ) -> Result<RepairOutcome> {
        let mut order = neighbor.agents.clone();
        order.shuffle(rng);

        let mut new_cost = 0;
        let mut inserted: Vec<usize> = Vec::with_capacity(order.len());
        let mut out_of_budget = false;
        for &id in &order {
            if Instant::now() >= deadline {
                out_of_budget = true;
                break;
            }
            let Some(path) = agents[id].planner.find_path(map, table, deadline) else {
                out_of_budget = true;
                break;
            };
            new_cost += path_cost(&path);
            if new_cost >= neighbor.old_cost {
                break;
            }
            table.insert_path(id, &path);
            agents[id].path = path;
            inserted.push(id);
        }

        if inserted.len() == order.len() && new_cost <= neighbor.old_cost {
            return Ok(RepairOutcome::Improved {
                new_cost,
                lower_bound: None,
            });
        }
        for &id in &inserted {
            table.delete_path(id, &agents[id].path);
        }
        if out_of_budget {
            Ok(RepairOutcome::Failed)
        } else {
            Ok(RepairOutcome::Rejected)
        }
    }
}

/// Dispatches to an exact joint solver and applies the per-backend
/// acceptance rule: strictly lower cost, or equal cost when
/// `accept_equal_cost` is set.
pub struct ExactJoint {
    solver: Box<dyn JointSolver>,
    accept_equal_cost: bool,
}

impl ExactJoint {
    pub fn new(solver: Box<dyn JointSolver>, accept_equal_cost: bool) -> Self {
        Self {
            solver,
            accept_equal_cost,
        }
    }
}

impl RepairBackend for ExactJoint {
    fn name(&self) -> &'static str {
        "ExactJoint"
    }

    fn attempt_repair(
        &mut self,
        map: &GridMap,
        agents: &mut [Agent],
        table: &mut PathTable,
        neighbor: &Neighbor,
        deadline: Instant,
        _rng: &mut SmallRng,
    ) -> Result<RepairOutcome> {
        let Some(solution) = self
            .solver
            .solve(map, agents, &neighbor.agents, table, deadline)
        else {
            return Ok(RepairOutcome::Failed);
        };
        let accept = if self.accept_equal_cost {
            solution.cost <= neighbor.old_cost
        } else {
            solution.cost < neighbor.old_cost
        };
        if !accept {
            return Ok(RepairOutcome::Rejected);
        }
        for (path, &id) in solution.paths.into_iter().zip(neighbor.agents.iter()) {
            table.insert_path(id, &path);
            agents[id].path = path;
        }
        Ok(RepairOutcome::Improved {
            new_cost: solution.cost,
            lower_bound: Some(solution.lower_bound),
        })
    }
}

/// Reference exact-joint collaborator: searches over priority orderings of
/// the neighbor subset, planning each ordering sequentially against a
/// scratch copy of the table, and keeps the cheapest complete assignment.
/// Enumerates all orderings for small subsets, otherwise samples random
/// ones until the deadline.
pub struct OrderingSolver {
    pub sampled_orderings: usize,
    rng: SmallRng,
}

const ENUMERATION_LIMIT: usize = 5;

impl OrderingSolver {
    pub fn new(rng: SmallRng) -> Self {
        Self {
            sampled_orderings: 24,
            rng,
        }
    }

    fn orderings(&mut self, neighbor: &[usize]) -> Vec<Vec<usize>> {
        if neighbor.len() <= ENUMERATION_LIMIT {
            permutations(neighbor)
        } else {
            (0..self.sampled_orderings)
                .map(|_| {
                    let mut order = neighbor.to_vec();
                    order.shuffle(&mut self.rng);
                    order
                })
                .collect()
        }
    }
}

impl JointSolver for OrderingSolver {
    fn name(&self) -> &'static str {
        "OrderingSolver"
    }

    fn solve(
        &mut self,
        map: &GridMap,
        agents: &[Agent],
        neighbor: &[usize],
        table: &PathTable,
        deadline: Instant,
    ) -> Option<JointSolution> {
        let lower_bound: usize = neighbor.iter().map(|&id| agents[id].distance()).sum();
        let mut best: Option<(usize, Vec<(usize, Path)>)> = None;
        for order in self.orderings(neighbor) {
            if Instant::now() >= deadline {
                break;
            }
            let mut scratch = table.clone();
            let mut cost = 0;
            let mut paths: Vec<(usize, Path)> = Vec::with_capacity(order.len());
            let mut complete = true;
            for &id in &order {
                let Some(path) = agents[id].planner.find_path(map, &scratch, deadline) else {
                    complete = false;
                    break;
                };
                cost += path_cost(&path);
                scratch.insert_path(id, &path);
                paths.push((id, path));
            }
            if complete && best.as_ref().map_or(true, |(c, _)| cost < *c) {
                let optimal = cost == lower_bound;
                best = Some((cost, paths));
                if optimal {
                    break;
                }
            }
        }
        let (cost, mut paths) = best?;
        // back into neighbor order
        paths.sort_by_key(|(id, _)| neighbor.iter().position(|&n| n == *id));
        Some(JointSolution {
            paths: paths.into_iter().map(|(_, p)| p).collect(),
            cost,
            lower_bound,
        })
    }
}

fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (i, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Priority-inheritance family backend: delegates to the bridge, then
/// checks the result against the untouched reservations of all
/// non-neighbor agents before committing.
pub struct PriorityInheritance {
    pub timestep_cap: usize,
    /// 0 for the single-step variant.
    pub window: usize,
}

impl RepairBackend for PriorityInheritance {
    fn name(&self) -> &'static str {
        if self.window > 0 {
            "winPIBT"
        } else {
            "PIBT"
        }
    }

    fn attempt_repair(
        &mut self,
        map: &GridMap,
        agents: &mut [Agent],
        table: &mut PathTable,
        neighbor: &Neighbor,
        deadline: Instant,
        rng: &mut SmallRng,
    ) -> Result<RepairOutcome> {
        let mut order = neighbor.agents.clone();
        order.shuffle(rng);
        let Some(paths) =
            bridge::solve_subproblem(map, agents, &order, self.timestep_cap, self.window, deadline, rng)
        else {
            return Ok(RepairOutcome::Failed);
        };

        // The stepping solver only sees the neighbor subset; when that is a
        // strict subset, reject any result colliding with the rest of the
        // fleet.
        for path in &paths {
            for t in 1..path.len() {
                if table.constrained(path[t - 1].location, path[t].location, t) {
                    return Ok(RepairOutcome::Failed);
                }
            }
            if table.occupant(path[0].location, 0).is_some()
                || !table.can_park(path[path.len() - 1].location, path.len() - 1)
            {
                return Ok(RepairOutcome::Failed);
            }
        }

        let new_cost: usize = paths.iter().map(path_cost).sum();
        if new_cost > neighbor.old_cost {
            return Ok(RepairOutcome::Rejected);
        }
        for (path, &id) in paths.into_iter().zip(order.iter()) {
            table.insert_path(id, &path);
            agents[id].path = path;
        }
        Ok(RepairOutcome::Improved {
            new_cost,
            lower_bound: None,
        })
    }
}
