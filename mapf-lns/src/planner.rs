use crate::path_table::PathTable;
use crate::HashSet;
use mapf_instance::{GridMap, Location, Path, PathEntry, Timestep};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

const DEADLINE_POLL_INTERVAL: usize = 512;

/// Single-agent space-time A* with a precomputed all-cells heuristic
/// (reverse BFS from the goal). Treats the reservation table as hard
/// constraints and allows waiting in place.
#[derive(Debug, Clone)]
pub struct SpaceTimePlanner {
    pub start: Location,
    pub goal: Location,
    /// BFS distance from every cell to the goal; `usize::MAX` if unreachable.
    pub heuristic: Vec<usize>,
}

#[derive(Clone, Copy)]
struct Node {
    location: Location,
    timestep: Timestep,
    parent: usize,
}

impl SpaceTimePlanner {
    pub fn new(map: &GridMap, start: Location, goal: Location) -> Self {
        Self {
            start,
            goal,
            heuristic: map.bfs_distances(goal),
        }
    }

    /// Shortest path from start (timestep 0) to an arrival at the goal from
    /// which the agent can park forever, or `None` if no such path exists
    /// within the horizon or the deadline expires.
    pub fn find_path(
        &self,
        map: &GridMap,
        table: &PathTable,
        deadline: Instant,
    ) -> Option<Path> {
        if self.heuristic[self.start] == usize::MAX {
            return None;
        }
        // Beyond the table's makespan the world is static, so any reachable
        // goal is reachable within makespan + map size extra steps.
        let horizon = table.makespan() + map.size();

        let mut nodes: Vec<Node> = vec![Node {
            location: self.start,
            timestep: 0,
            parent: usize::MAX,
        }];
        let mut open: BinaryHeap<Reverse<(usize, usize, usize)>> = BinaryHeap::new();
        open.push(Reverse((self.heuristic[self.start], self.heuristic[self.start], 0)));
        let mut visited: HashSet<(Location, Timestep)> = HashSet::default();
        visited.insert((self.start, 0));

        let mut expansions = 0;
        while let Some(Reverse((_, _, idx))) = open.pop() {
            expansions += 1;
            if expansions % DEADLINE_POLL_INTERVAL == 0 && Instant::now() >= deadline {
                return None;
            }
            let Node {
                location, timestep, ..
            } = nodes[idx];
            if location == self.goal && table.can_park(self.goal, timestep) {
                let mut locations = Vec::with_capacity(timestep + 1);
                let mut curr = idx;
                while curr != usize::MAX {
                    locations.push(nodes[curr].location);
                    curr = nodes[curr].parent;
                }
                locations.reverse();
                return Some(locations.into_iter().map(PathEntry::new).collect());
            }
            if timestep >= horizon {
                continue;
            }
            let mut successors = map.neighbors(location);
            successors.push(location);
            for next in successors {
                let next_t = timestep + 1;
                if self.heuristic[next] == usize::MAX {
                    continue;
                }
                if visited.contains(&(next, next_t)) {
                    continue;
                }
                if table.constrained(location, next, next_t) {
                    continue;
                }
                visited.insert((next, next_t));
                nodes.push(Node {
                    location: next,
                    timestep: next_t,
                    parent: idx,
                });
                let h = self.heuristic[next];
                open.push(Reverse((next_t + h, h, nodes.len() - 1)));
            }
        }
        None
    }
}
