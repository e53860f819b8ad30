use crate::HashSet;
use mapf_instance::{Location, Path, Timestep};

pub const NO_AGENT: usize = usize::MAX;

/// Spacetime reservation table: for every (location, timestep) the agent
/// occupying it, plus, per location, the agent parked there forever after
/// completing its path. Between iterations it mirrors exactly the union of
/// all committed paths.
#[derive(Debug, Clone)]
pub struct PathTable {
    table: Vec<Vec<usize>>,
    parked: Vec<usize>,
    parked_from: Vec<Timestep>,
    makespan: Timestep,
}

impl PathTable {
    pub fn new(map_size: usize) -> Self {
        Self {
            table: vec![Vec::new(); map_size],
            parked: vec![NO_AGENT; map_size],
            parked_from: vec![usize::MAX; map_size],
            makespan: 0,
        }
    }

    pub fn reset(&mut self) {
        for timeline in &mut self.table {
            timeline.clear();
        }
        self.parked.fill(NO_AGENT);
        self.parked_from.fill(usize::MAX);
        self.makespan = 0;
    }

    /// Largest completion time of any inserted path. Monotone over the life
    /// of the table; deletions do not shrink it. Used only as a planning
    /// horizon, where an over-estimate is harmless.
    pub fn makespan(&self) -> Timestep {
        self.makespan
    }

    pub fn insert_path(&mut self, agent: usize, path: &Path) {
        if path.is_empty() {
            return;
        }
        for (t, entry) in path.iter().enumerate() {
            let timeline = &mut self.table[entry.location];
            if timeline.len() <= t {
                timeline.resize(t + 1, NO_AGENT);
            }
            debug_assert_eq!(timeline[t], NO_AGENT);
            timeline[t] = agent;
        }
        let goal = path[path.len() - 1].location;
        debug_assert_eq!(self.parked[goal], NO_AGENT);
        self.parked[goal] = agent;
        self.parked_from[goal] = path.len() - 1;
        self.makespan = self.makespan.max(path.len() - 1);
    }

    pub fn delete_path(&mut self, agent: usize, path: &Path) {
        if path.is_empty() {
            return;
        }
        for (t, entry) in path.iter().enumerate() {
            let timeline = &mut self.table[entry.location];
            debug_assert_eq!(timeline[t], agent);
            timeline[t] = NO_AGENT;
        }
        let goal = path[path.len() - 1].location;
        debug_assert_eq!(self.parked[goal], agent);
        self.parked[goal] = NO_AGENT;
        self.parked_from[goal] = usize::MAX;
    }

    pub fn occupant(&self, loc: Location, t: Timestep) -> Option<usize> {
        match self.table[loc].get(t) {
            Some(&a) if a != NO_AGENT => Some(a),
            _ => match self.parked[loc] {
                NO_AGENT => None,
                a if self.parked_from[loc] <= t => Some(a),
                _ => None,
            },
        }
    }

    /// Whether the move `from -> to` arriving at `to_time` collides with any
    /// reservation: a vertex hit, a swap, or a parked agent.
    pub fn constrained(&self, from: Location, to: Location, to_time: Timestep) -> bool {
        if self.parked[to] != NO_AGENT && to_time >= self.parked_from[to] {
            return true;
        }
        if matches!(self.table[to].get(to_time), Some(&a) if a != NO_AGENT) {
            return true;
        }
        if from != to && to_time > 0 {
            if let (Some(&a1), Some(&a2)) = (
                self.table[to].get(to_time - 1),
                self.table[from].get(to_time),
            ) {
                if a1 != NO_AGENT && a1 == a2 {
                    return true;
                }
            }
        }
        false
    }

    /// Whether an agent arriving at `goal` at `arrival` can sit there for
    /// the rest of time without being traversed.
    pub fn can_park(&self, goal: Location, arrival: Timestep) -> bool {
        if self.parked[goal] != NO_AGENT {
            return false;
        }
        self.table[goal]
            .iter()
            .skip(arrival + 1)
            .all(|&a| a == NO_AGENT)
    }

    /// Collects into `set` every agent (other than `agent`) whose
    /// reservation conflicts with the move `from -> to` arriving at
    /// `to_time`: the occupant of `to` at that time, a swapping agent, or
    /// an agent parked on `to`.
    pub fn conflicting_agents(
        &self,
        agent: usize,
        set: &mut HashSet<usize>,
        from: Location,
        to: Location,
        to_time: Timestep,
    ) {
        if let Some(&a) = self.table[to].get(to_time) {
            if a != NO_AGENT && a != agent {
                set.insert(a);
            }
        }
        if from != to && to_time > 0 {
            if let (Some(&a1), Some(&a2)) = (
                self.table[to].get(to_time - 1),
                self.table[from].get(to_time),
            ) {
                if a1 != NO_AGENT && a1 == a2 && a1 != agent {
                    set.insert(a1);
                }
            }
        }
        if self.parked[to] != NO_AGENT && to_time >= self.parked_from[to] && self.parked[to] != agent
        {
            set.insert(self.parked[to]);
        }
    }

    /// Collects into `set` agents whose reservations touch `loc` at any
    /// timestep, stopping once `set` holds `k` agents.
    pub fn agents_near(&self, set: &mut HashSet<usize>, k: usize, loc: Location) {
        for &a in &self.table[loc] {
            if set.len() >= k {
                return;
            }
            if a != NO_AGENT {
                set.insert(a);
            }
        }
        if set.len() < k && self.parked[loc] != NO_AGENT {
            set.insert(self.parked[loc]);
        }
    }
}
