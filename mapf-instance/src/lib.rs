pub mod instance;
pub mod map;
pub mod path;
mod validate;

pub use instance::Instance;
pub use map::GridMap;
pub use path::{path_cost, path_from_locations, sum_of_costs, Path, PathEntry};

/// Linearized cell index: `row * cols + col`.
pub type Location = usize;
pub type Timestep = usize;
