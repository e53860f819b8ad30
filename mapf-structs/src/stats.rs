use serde::{Deserialize, Serialize};

/// One row of the append-only iteration log. The first row records the
/// bootstrap phase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IterationStat {
    /// Neighborhood size of this iteration (all agents for the bootstrap).
    pub num_agents: usize,
    /// Committed sum of costs after this iteration.
    pub sum_of_costs: usize,
    /// Elapsed wall time in seconds since the run started.
    pub runtime: f64,
    /// Name of the backend that produced (or failed to produce) the repair.
    pub backend: String,
    pub success: bool,
}

/// Aggregate statistics of a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub success: bool,
    pub iterations: usize,
    pub final_cost: usize,
    pub initial_cost: usize,
    /// Max of any solver-reported joint lower bound and the sum of
    /// single-agent distances.
    pub lower_bound: usize,
    pub sum_of_distances: usize,
    pub average_neighborhood_size: f64,
    pub failed_iterations: usize,
    pub restarts: usize,
    /// Seconds spent finding the initial solution.
    pub initial_runtime: f64,
    /// Seconds spent building registries and heuristics before the run.
    pub preprocessing_time: f64,
    /// Total wall time of the run in seconds.
    pub runtime: f64,
}
