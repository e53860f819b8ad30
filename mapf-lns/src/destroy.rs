use crate::agent::Agent;
use crate::path_table::PathTable;
use crate::HashSet;
use ahash::RandomState;
use anyhow::{bail, Result};
use mapf_instance::{path_cost, GridMap, Location, Timestep};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng};
use std::collections::VecDeque;

/// Retries of the random-walk heuristic before giving up on reaching the
/// requested neighborhood size.
const RANDOM_WALK_RETRIES: usize = 10;

/// Arm order of the adaptive selection, matching the reward vectors in the
/// bandit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyHeuristic {
    RandomWalk,
    Intersection,
    RandomAgents,
}

pub const DESTROY_COUNT: usize = 3;

impl DestroyHeuristic {
    pub fn from_arm(arm: usize) -> Self {
        match arm {
            0 => DestroyHeuristic::RandomWalk,
            1 => DestroyHeuristic::Intersection,
            _ => DestroyHeuristic::RandomAgents,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DestroyHeuristic::RandomWalk => "RandomWalk",
            DestroyHeuristic::Intersection => "Intersection",
            DestroyHeuristic::RandomAgents => "RandomAgents",
        }
    }
}

/// Owns the destroy heuristics' long-lived state: the random-walk tabu set
/// and the lazily cached intersection list.
pub struct NeighborSelector {
    hasher: RandomState,
    tabu: HashSet<usize>,
    intersections: Option<Vec<Location>>,
}

impl NeighborSelector {
    pub fn new(hasher: RandomState) -> Self {
        let tabu = HashSet::with_hasher(hasher.clone());
        Self {
            hasher,
            tabu,
            intersections: None,
        }
    }

    /// Produces a set of distinct agent ids of (at most) size `k`, or `None`
    /// when the heuristic cannot build a useful neighborhood this iteration
    /// (recoverable; the caller skips the iteration). Configuration
    /// preconditions surface as errors.
    pub fn generate(
        &mut self,
        heuristic: DestroyHeuristic,
        agents: &[Agent],
        table: &PathTable,
        map: &GridMap,
        k: usize,
        rng: &mut SmallRng,
    ) -> Result<Option<Vec<usize>>> {
        let neighbor = match heuristic {
            DestroyHeuristic::RandomAgents => Some(by_random_agents(agents.len(), k, rng)),
            DestroyHeuristic::RandomWalk => self.by_random_walk(agents, table, map, k, rng),
            DestroyHeuristic::Intersection => self.by_intersection(agents, table, map, k, rng)?,
        };
        Ok(neighbor.filter(|n| !n.is_empty()))
    }

    /// Most-delayed agent outside the tabu set, ties broken by first-found
    /// order. Fails (clearing the tabu set) when no agent is delayed.
    fn find_most_delayed_agent(&mut self, agents: &[Agent]) -> Option<usize> {
        let mut best = None;
        let mut max_delays = 0;
        for agent in agents {
            if self.tabu.contains(&agent.id) {
                continue;
            }
            let delays = agent.num_delays();
            if delays > max_delays {
                best = Some(agent.id);
                max_delays = delays;
            }
        }
        let Some(anchor) = best else {
            self.tabu.clear();
            return None;
        };
        self.tabu.insert(anchor);
        if self.tabu.len() == agents.len() {
            self.tabu.clear();
        }
        Some(anchor)
    }

    fn by_random_walk(
        &mut self,
        agents: &[Agent],
        table: &PathTable,
        map: &GridMap,
        k: usize,
        rng: &mut SmallRng,
    ) -> Option<Vec<usize>> {
        if k >= agents.len() {
            return Some((0..agents.len()).collect());
        }
        let anchor = self.find_most_delayed_agent(agents)?;

        let mut collected: HashSet<usize> = HashSet::with_hasher(self.hasher.clone());
        collected.insert(anchor);
        let mut current = anchor;
        let mut retries = 0;
        while collected.len() < k && retries < RANDOM_WALK_RETRIES {
            let path = &agents[current].path;
            let t = rng.gen_range(0..path.len());
            random_walk(
                &agents[current],
                path[t].location,
                t,
                table,
                map,
                path_cost(&agents[current].path),
                k,
                &mut collected,
                rng,
            );
            retries += 1;
            // re-anchor at a random collected agent
            let idx = rng.gen_range(0..collected.len());
            current = *collected.iter().nth(idx).unwrap();
        }
        if collected.len() < 2 {
            return None;
        }
        let mut neighbor: Vec<usize> = collected.into_iter().collect();
        neighbor.sort_unstable();
        Some(neighbor)
    }

    fn by_intersection(
        &mut self,
        agents: &[Agent],
        table: &PathTable,
        map: &GridMap,
        k: usize,
        rng: &mut SmallRng,
    ) -> Result<Option<Vec<usize>>> {
        let intersections = self.intersections.get_or_insert_with(|| {
            (0..map.size())
                .filter(|&loc| !map.is_obstacle(loc) && map.degree(loc) > 2)
                .collect()
        });
        if intersections.is_empty() {
            bail!("the map has no intersections; the Intersection destroy heuristic cannot run");
        }

        let location = intersections[rng.gen_range(0..intersections.len())];
        let mut collected: HashSet<usize> = HashSet::with_hasher(self.hasher.clone());
        table.agents_near(&mut collected, k, location);
        if collected.len() < k {
            // breadth-first expansion to further intersections
            let mut closed: HashSet<Location> = HashSet::with_hasher(self.hasher.clone());
            closed.insert(location);
            let mut open = VecDeque::new();
            open.push_back(location);
            'expand: while let Some(curr) = open.pop_front() {
                for next in map.neighbors(curr) {
                    if !closed.insert(next) {
                        continue;
                    }
                    open.push_back(next);
                    if map.degree(next) >= 3 {
                        table.agents_near(&mut collected, k, next);
                        if collected.len() == k {
                            break 'expand;
                        }
                    }
                }
            }
        }
        debug_assert!(collected.iter().all(|&a| a < agents.len()));
        let mut neighbor: Vec<usize> = collected.into_iter().collect();
        neighbor.sort_unstable();
        if neighbor.len() > k {
            neighbor.shuffle(rng);
            neighbor.truncate(k);
            neighbor.sort_unstable();
        }
        Ok(Some(neighbor))
    }
}

/// `min(k, n)` distinct ids, uniformly without replacement.
fn by_random_agents(population: usize, k: usize, rng: &mut SmallRng) -> Vec<usize> {
    let mut ids: Vec<usize> = (0..population).collect();
    if ids.len() > k {
        ids.shuffle(rng);
        ids.truncate(k);
        ids.sort_unstable();
    }
    ids
}

/// Random walk from `start` at `start_timestep`: each step moves to a
/// random neighboring cell (or waits) whose remaining heuristic distance
/// still permits reaching the walker's goal within `upper_bound` steps,
/// collecting every agent whose reservation conflicts with the stepped
/// edge. Stops when the neighborhood is full, no legal step remains, or
/// the walk reaches `upper_bound`.
#[allow(clippy::too_many_arguments)]
fn random_walk(
    walker: &Agent,
    start: Location,
    start_timestep: Timestep,
    table: &PathTable,
    map: &GridMap,
    upper_bound: usize,
    k: usize,
    collected: &mut HashSet<usize>,
    rng: &mut SmallRng,
) {
    debug_assert_eq!(upper_bound, path_cost(&walker.path));
    let mut loc = start;
    for t in start_timestep..upper_bound {
        let mut candidates = map.neighbors(loc);
        candidates.push(loc);
        let mut moved = false;
        while !candidates.is_empty() {
            let idx = rng.gen_range(0..candidates.len());
            let next = candidates.swap_remove(idx);
            let h = walker.planner.heuristic[next];
            if h != usize::MAX && t + 1 + h < upper_bound {
                table.conflicting_agents(walker.id, collected, loc, next, t + 1);
                loc = next;
                moved = true;
                break;
            }
        }
        if !moved || collected.len() >= k {
            break;
        }
    }
}
