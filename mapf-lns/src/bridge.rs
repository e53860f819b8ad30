use crate::agent::Agent;
use crate::pibt::{self, PibtProblem};
use mapf_instance::{GridMap, Path, PathEntry};
use rand::rngs::SmallRng;
use std::time::Instant;

/// Builds the ephemeral priority-inheritance sub-problem for a neighbor
/// subset, runs the stepping solver, and translates the per-step histories
/// back into paths. Paths come back in the order of `neighbor`.
///
/// Trailing "hold at goal" steps are trimmed: the true completion time is
/// the last timestep at which the agent transitions into its goal cell from
/// a different cell, so path cost reflects actual arrival rather than
/// idling. An agent that starts on its goal and never leaves yields a
/// length-1 path.
///
/// On failure nothing is written anywhere; the caller's reservation table
/// is untouched.
pub fn solve_subproblem(
    map: &GridMap,
    agents: &[Agent],
    neighbor: &[usize],
    timestep_cap: usize,
    window: usize,
    deadline: Instant,
    rng: &mut SmallRng,
) -> Option<Vec<Path>> {
    let problem = PibtProblem {
        map,
        starts: neighbor.iter().map(|&id| agents[id].start).collect(),
        goals: neighbor.iter().map(|&id| agents[id].goal).collect(),
        heuristics: neighbor
            .iter()
            .map(|&id| agents[id].planner.heuristic.as_slice())
            .collect(),
    };
    let histories = pibt::solve(&problem, timestep_cap, window, deadline, rng)?;

    let mut paths = Vec::with_capacity(neighbor.len());
    for (history, &goal) in histories.iter().zip(problem.goals.iter()) {
        let mut last_goal_visit = 0;
        for (t, &loc) in history.iter().enumerate() {
            if loc == goal && t > 0 && history[t - 1] != goal {
                last_goal_visit = t;
            }
        }
        let path: Path = history[..=last_goal_visit]
            .iter()
            .map(|&loc| PathEntry::new(loc))
            .collect();
        debug_assert_eq!(path[path.len() - 1].location, goal);
        paths.push(path);
    }
    Some(paths)
}
