use crate::planner::SpaceTimePlanner;
use mapf_instance::{path_cost, Instance, Location, Path};

/// Registry entry for one agent: immutable identity plus its committed path
/// and its single-agent planner handle. Created once from the instance;
/// only the orchestration loop mutates `path`.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: usize,
    pub start: Location,
    pub goal: Location,
    pub path: Path,
    pub planner: SpaceTimePlanner,
}

impl Agent {
    pub fn new(instance: &Instance, id: usize) -> Self {
        let start = instance.start(id);
        let goal = instance.goal(id);
        Self {
            id,
            start,
            goal,
            path: Path::new(),
            planner: SpaceTimePlanner::new(&instance.map, start, goal),
        }
    }

    /// Shortest-path lower bound for this agent.
    pub fn distance(&self) -> usize {
        self.planner.heuristic[self.start]
    }

    /// Delay of the committed path over the lower bound.
    pub fn num_delays(&self) -> usize {
        path_cost(&self.path).saturating_sub(self.distance())
    }
}

/// Builds the registry from instance data.
pub fn build_registry(instance: &Instance) -> Vec<Agent> {
    (0..instance.num_agents())
        .map(|id| Agent::new(instance, id))
        .collect()
}
