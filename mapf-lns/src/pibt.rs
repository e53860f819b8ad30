use crate::HashMap;
use mapf_instance::{GridMap, Location};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng};
use std::time::Instant;

/// Ephemeral, index-addressed state of one priority-inheritance invocation.
/// All per-agent state lives in these vectors and is released wholesale when
/// the call returns.
pub struct PibtProblem<'a> {
    pub map: &'a GridMap,
    pub starts: Vec<Location>,
    pub goals: Vec<Location>,
    /// Distance-to-goal table per agent, indexed by cell.
    pub heuristics: Vec<&'a [usize]>,
}

struct StepState {
    positions: Vec<Location>,
    next: Vec<Option<Location>>,
    occupied_now: HashMap<Location, usize>,
    occupied_next: HashMap<Location, usize>,
}

/// Runs the single-step priority-inheritance rule until every agent sits on
/// its goal, bounded by `timestep_cap` and `deadline`. With `window > 0`
/// the random priority tie-breaks are refreshed every `window` steps (the
/// lookahead variant). Returns each agent's full per-step movement history,
/// including the start position.
pub fn solve(
    problem: &PibtProblem,
    timestep_cap: usize,
    window: usize,
    deadline: Instant,
    rng: &mut SmallRng,
) -> Option<Vec<Vec<Location>>> {
    let n = problem.starts.len();
    for i in 0..n {
        if problem.heuristics[i][problem.starts[i]] == usize::MAX {
            return None;
        }
    }

    let mut histories: Vec<Vec<Location>> =
        problem.starts.iter().map(|&s| vec![s]).collect();
    let mut positions = problem.starts.clone();
    // steps spent away from the goal since last reaching it, plus a random
    // tie-break in [0, 1)
    let mut elapsed: Vec<usize> = vec![0; n];
    let mut tie_breaks: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();

    for step in 0..timestep_cap {
        if positions
            .iter()
            .zip(problem.goals.iter())
            .all(|(p, g)| p == g)
        {
            return Some(histories);
        }
        if Instant::now() >= deadline {
            return None;
        }
        if window > 0 && step > 0 && step % window == 0 {
            for tb in &mut tie_breaks {
                *tb = rng.gen();
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let pa = elapsed[a] as f64 + tie_breaks[a];
            let pb = elapsed[b] as f64 + tie_breaks[b];
            pb.partial_cmp(&pa).unwrap()
        });

        let mut state = StepState {
            occupied_now: positions
                .iter()
                .enumerate()
                .map(|(i, &p)| (p, i))
                .collect(),
            occupied_next: HashMap::default(),
            positions,
            next: vec![None; n],
        };
        for &i in &order {
            if state.next[i].is_none() {
                plan_step(i, problem, &mut state, rng);
            }
        }

        positions = state
            .next
            .into_iter()
            .map(|n| n.expect("every agent is assigned a next cell"))
            .collect();
        for (i, &p) in positions.iter().enumerate() {
            histories[i].push(p);
            if p == problem.goals[i] {
                elapsed[i] = 0;
            } else {
                elapsed[i] += 1;
            }
        }
    }
    // the final step of the cap may be the one that completes the run
    if positions
        .iter()
        .zip(problem.goals.iter())
        .all(|(p, g)| p == g)
    {
        return Some(histories);
    }
    None
}

/// One agent's move decision, possibly pushing lower-priority occupants out
/// of the way (priority inheritance). Returns false when the agent cannot
/// vacate for its caller.
fn plan_step(i: usize, problem: &PibtProblem, state: &mut StepState, rng: &mut SmallRng) -> bool {
    let current = state.positions[i];
    let mut candidates = problem.map.neighbors(current);
    candidates.push(current);
    candidates.shuffle(rng);
    candidates.sort_by_key(|&c| problem.heuristics[i][c]);

    for candidate in candidates {
        if state.occupied_next.contains_key(&candidate) {
            continue;
        }
        // swap prevention: the occupant of the candidate cell must not be
        // moving into ours
        if let Some(&j) = state.occupied_now.get(&candidate) {
            if j != i && state.next[j] == Some(current) {
                continue;
            }
        }
        state.next[i] = Some(candidate);
        state.occupied_next.insert(candidate, i);
        if let Some(&j) = state.occupied_now.get(&candidate) {
            if j != i && state.next[j].is_none() && !plan_step(j, problem, state, rng) {
                // the blocked occupant fell back to staying put and now holds
                // the claim on this cell; release only a claim that is still
                // ours
                state.next[i] = None;
                if state.occupied_next.get(&candidate) == Some(&i) {
                    state.occupied_next.remove(&candidate);
                }
                continue;
            }
        }
        return true;
    }
    state.next[i] = Some(current);
    state.occupied_next.insert(current, i);
    false
}
