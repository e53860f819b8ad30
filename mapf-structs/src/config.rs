use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyStrategy {
    RandomAgents,
    RandomWalk,
    Intersection,
    /// Bandit-driven selection among the three heuristics.
    Adaptive,
}

impl std::fmt::Display for DestroyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestroyStrategy::RandomAgents => write!(f, "RandomAgents"),
            DestroyStrategy::RandomWalk => write!(f, "RandomWalk"),
            DestroyStrategy::Intersection => write!(f, "Intersection"),
            DestroyStrategy::Adaptive => write!(f, "Adaptive"),
        }
    }
}

impl std::str::FromStr for DestroyStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "randomagents" | "random" => Ok(DestroyStrategy::RandomAgents),
            "randomwalk" => Ok(DestroyStrategy::RandomWalk),
            "intersection" => Ok(DestroyStrategy::Intersection),
            "adaptive" => Ok(DestroyStrategy::Adaptive),
            _ => Err(anyhow::anyhow!("Invalid destroy strategy: {}", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Sequential re-planning in a random priority order.
    Prioritized,
    /// An exact joint solver collaborator behind the dispatcher.
    ExactJoint,
    /// Single-step priority inheritance.
    PriorityInheritance,
    /// Priority inheritance with a lookahead window.
    PriorityInheritanceWindowed,
}

impl std::fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepairStrategy::Prioritized => write!(f, "Prioritized"),
            RepairStrategy::ExactJoint => write!(f, "ExactJoint"),
            RepairStrategy::PriorityInheritance => write!(f, "PriorityInheritance"),
            RepairStrategy::PriorityInheritanceWindowed => {
                write!(f, "PriorityInheritanceWindowed")
            }
        }
    }
}

impl std::str::FromStr for RepairStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prioritized" | "pp" => Ok(RepairStrategy::Prioritized),
            "exactjoint" | "exact" => Ok(RepairStrategy::ExactJoint),
            "priorityinheritance" | "pibt" => Ok(RepairStrategy::PriorityInheritance),
            "priorityinheritancewindowed" | "winpibt" => {
                Ok(RepairStrategy::PriorityInheritanceWindowed)
            }
            _ => Err(anyhow::anyhow!("Invalid repair strategy: {}", s)),
        }
    }
}

/// How the neighborhood size is chosen each iteration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Always `neighborhood_size`.
    Fixed,
    /// Uniform draw from the candidate set {2, 4, 8, 16, 32}.
    Uniform,
    /// Bandit-selected candidate bucket.
    Bandit,
}

impl std::fmt::Display for SizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeMode::Fixed => write!(f, "Fixed"),
            SizeMode::Uniform => write!(f, "Uniform"),
            SizeMode::Bandit => write!(f, "Bandit"),
        }
    }
}

impl std::str::FromStr for SizeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(SizeMode::Fixed),
            "uniform" => Ok(SizeMode::Uniform),
            "bandit" => Ok(SizeMode::Bandit),
            _ => Err(anyhow::anyhow!("Invalid size mode: {}", s)),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Configuration surface of the LNS engine. Values only; parsing lives in
/// the runner binary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LnsConfig {
    /// Wall-clock budget in seconds.
    #[serde(default = "LnsConfig::default_time_limit")]
    pub time_limit: f64,
    /// Minimum number of iterations; the loop only stops once the time
    /// limit is exhausted and this floor is met.
    #[serde(default)]
    pub max_iterations: usize,
    #[serde(default = "LnsConfig::default_neighborhood_size")]
    pub neighborhood_size: usize,
    #[serde(default = "LnsConfig::default_size_mode")]
    pub size_mode: SizeMode,
    #[serde(default = "LnsConfig::default_destroy_strategy")]
    pub destroy_strategy: DestroyStrategy,
    #[serde(default = "LnsConfig::default_repair_strategy")]
    pub repair_strategy: RepairStrategy,
    /// Per-iteration replan budget in seconds.
    #[serde(default = "LnsConfig::default_replan_time_limit")]
    pub replan_time_limit: f64,
    /// Whether the exact-joint backend accepts an equal-cost result. The
    /// prioritized backend always does.
    #[serde(default)]
    pub accept_equal_cost: bool,
    /// Random restarts of the bootstrap phase while time remains.
    #[serde(default = "default_true")]
    pub random_restarts: bool,
    /// Timestep cap for the priority-inheritance stepping solver.
    #[serde(default = "LnsConfig::default_pibt_timestep_cap")]
    pub pibt_timestep_cap: usize,
    /// Lookahead window of the windowed priority-inheritance variant.
    #[serde(default = "LnsConfig::default_pibt_window")]
    pub pibt_window: usize,
    /// 0 = silent; 1 = per-iteration reporting plus solution validation;
    /// 2 = detailed.
    #[serde(default)]
    pub verbosity: u8,
}

impl LnsConfig {
    fn default_time_limit() -> f64 {
        60.0
    }

    fn default_neighborhood_size() -> usize {
        8
    }

    fn default_size_mode() -> SizeMode {
        SizeMode::Fixed
    }

    fn default_destroy_strategy() -> DestroyStrategy {
        DestroyStrategy::Adaptive
    }

    fn default_repair_strategy() -> RepairStrategy {
        RepairStrategy::Prioritized
    }

    fn default_replan_time_limit() -> f64 {
        0.6
    }

    fn default_pibt_timestep_cap() -> usize {
        1000
    }

    fn default_pibt_window() -> usize {
        5
    }
}

impl Default for LnsConfig {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}
