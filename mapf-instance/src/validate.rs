use crate::instance::Instance;
use crate::path::Path;
use anyhow::{anyhow, Result};

impl Instance {
    /// Exhaustive post-hoc check of a committed joint solution: per-agent
    /// continuity and endpoints, then every ordered pair for vertex, edge
    /// and target conflicts. Returns the independently recomputed sum of
    /// costs on success.
    ///
    /// This is a diagnostic; any error it returns indicates a defect in a
    /// solver or the reservation table, not an expected operating condition.
    pub fn verify_solution(&self, paths: &[Path]) -> Result<usize> {
        if paths.len() != self.num_agents() {
            return Err(anyhow!(
                "solution has {} paths, instance has {} agents",
                paths.len(),
                self.num_agents()
            ));
        }
        let mut sum = 0;
        for (id, path) in paths.iter().enumerate() {
            if path.is_empty() {
                return Err(anyhow!("no solution for agent {}", id));
            }
            if path[0].location != self.start(id) {
                return Err(anyhow!(
                    "the path of agent {} starts from location {}, which is different from its start location {}",
                    id,
                    path[0].location,
                    self.start(id)
                ));
            }
            if path[path.len() - 1].location != self.goal(id) {
                return Err(anyhow!(
                    "the path of agent {} ends at location {}, which is different from its goal location {}",
                    id,
                    path[path.len() - 1].location,
                    self.goal(id)
                ));
            }
            for t in 1..path.len() {
                if !self.map.valid_move(path[t - 1].location, path[t].location) {
                    return Err(anyhow!(
                        "the path of agent {} jumps from {} to {} between timesteps {} and {}",
                        id,
                        path[t - 1].location,
                        path[t].location,
                        t - 1,
                        t
                    ));
                }
            }
            sum += path.len() - 1;
        }
        for i in 0..paths.len() {
            for j in i + 1..paths.len() {
                // a1 is the shorter of the two paths
                let (a1, a2) = if paths[i].len() <= paths[j].len() {
                    (i, j)
                } else {
                    (j, i)
                };
                let (p1, p2) = (&paths[a1], &paths[a2]);
                let mut t = 1;
                while t < p1.len() {
                    if p1[t].location == p2[t].location {
                        return Err(anyhow!(
                            "vertex conflict between agents {} and {} at location {} at timestep {}",
                            a1,
                            a2,
                            p1[t].location,
                            t
                        ));
                    }
                    if p1[t].location == p2[t - 1].location && p1[t - 1].location == p2[t].location
                    {
                        return Err(anyhow!(
                            "edge conflict between agents {} and {} at edge ({},{}) at timestep {}",
                            a1,
                            a2,
                            p1[t - 1].location,
                            p1[t].location,
                            t
                        ));
                    }
                    t += 1;
                }
                let target = p1[p1.len() - 1].location;
                while t < p2.len() {
                    if p2[t].location == target {
                        return Err(anyhow!(
                            "target conflict: agent {} (of length {}) traverses agent {} (of length {})'s target location {} at timestep {}",
                            a2,
                            p2.len() - 1,
                            a1,
                            p1.len() - 1,
                            target,
                            t
                        ));
                    }
                    t += 1;
                }
            }
        }
        Ok(sum)
    }
}
