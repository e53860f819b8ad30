use crate::Location;
use serde::{Deserialize, Serialize};

/// One timestep of an agent's path. The index into a [`Path`] is the
/// timestep at which the agent occupies `location`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEntry {
    pub location: Location,
}

impl PathEntry {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

pub type Path = Vec<PathEntry>;

/// Cost of a path is its number of moves, i.e. length minus one.
pub fn path_cost(path: &Path) -> usize {
    path.len().saturating_sub(1)
}

pub fn sum_of_costs(paths: &[Path]) -> usize {
    paths.iter().map(path_cost).sum()
}

pub fn path_from_locations(locations: impl IntoIterator<Item = Location>) -> Path {
    locations.into_iter().map(PathEntry::new).collect()
}
