use ahash::RandomState;

/// Hash state derived from a run seed so that every hash-container
/// iteration order in the engine is reproducible.
pub fn seeded_hasher(seed: &[u8; 32]) -> RandomState {
    let seed1 = u64::from_be_bytes(seed[0..8].try_into().unwrap());
    let seed2 = u64::from_be_bytes(seed[8..16].try_into().unwrap());
    let seed3 = u64::from_be_bytes(seed[16..24].try_into().unwrap());
    let seed4 = u64::from_be_bytes(seed[24..32].try_into().unwrap());
    RandomState::with_seeds(seed1, seed2, seed3, seed4)
}

pub type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;
pub type HashSet<T> = std::collections::HashSet<T, RandomState>;

pub mod agent;
pub mod bandit;
pub mod bridge;
pub mod destroy;
pub mod lns;
pub mod path_table;
pub mod pibt;
pub mod planner;
pub mod repair;

pub use agent::Agent;
pub use lns::Lns;
pub use path_table::PathTable;
pub use repair::{JointSolution, JointSolver, RepairBackend, RepairOutcome};
