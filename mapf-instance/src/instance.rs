use crate::map::GridMap;
use crate::path::{path_cost, path_from_locations, Path};
use crate::Location;
use anyhow::{anyhow, ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A MAPF instance: a grid map plus one start and one goal per agent.
#[derive(Debug, Clone)]
pub struct Instance {
    pub map: GridMap,
    starts: Vec<Location>,
    goals: Vec<Location>,
    name: String,
}

impl Instance {
    pub fn new(map: GridMap, starts: Vec<Location>, goals: Vec<Location>) -> Result<Self> {
        ensure!(!starts.is_empty(), "instance has no agents");
        ensure!(
            starts.len() == goals.len(),
            "instance has {} starts but {} goals",
            starts.len(),
            goals.len()
        );
        for (i, (&s, &g)) in starts.iter().zip(goals.iter()).enumerate() {
            ensure!(s < map.size() && g < map.size(), "agent {} is out of bounds", i);
            ensure!(
                !map.is_obstacle(s) && !map.is_obstacle(g),
                "agent {} starts or ends on an obstacle",
                i
            );
        }
        for i in 0..starts.len() {
            for j in i + 1..starts.len() {
                ensure!(starts[i] != starts[j], "agents {} and {} share a start", i, j);
                ensure!(goals[i] != goals[j], "agents {} and {} share a goal", i, j);
            }
        }
        Ok(Self {
            map,
            starts,
            goals,
            name: "unnamed".to_string(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_agents(&self) -> usize {
        self.starts.len()
    }

    pub fn start(&self, agent: usize) -> Location {
        self.starts[agent]
    }

    pub fn goal(&self, agent: usize) -> Location {
        self.goals[agent]
    }

    /// Parses the movingAI `.scen` format. Each line after the optional
    /// `version` header is `bucket map width height sx sy gx gy optimal`,
    /// with x = column and y = row. `limit` caps the number of agents.
    pub fn parse_scenario(map: GridMap, text: &str, limit: Option<usize>) -> Result<Self> {
        let mut starts = Vec::new();
        let mut goals = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("version") {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            ensure!(
                fields.len() >= 8,
                "scenario line has {} fields, expected at least 8: {:?}",
                fields.len(),
                line
            );
            let sx: usize = fields[4].parse()?;
            let sy: usize = fields[5].parse()?;
            let gx: usize = fields[6].parse()?;
            let gy: usize = fields[7].parse()?;
            ensure!(
                sy < map.rows() && sx < map.cols() && gy < map.rows() && gx < map.cols(),
                "scenario entry out of bounds: {:?}",
                line
            );
            starts.push(map.linearize(sy, sx));
            goals.push(map.linearize(gy, gx));
            if let Some(limit) = limit {
                if starts.len() == limit {
                    break;
                }
            }
        }
        Self::new(map, starts, goals)
    }

    /// Generates a random instance from a seed: a random map plus
    /// rejection-sampled start/goal pairs that are mutually reachable and
    /// pairwise distinct.
    pub fn generate(
        seed: &[u8; 32],
        rows: usize,
        cols: usize,
        obstacle_ratio: f64,
        num_agents: usize,
    ) -> Result<Self> {
        let mut rng = StdRng::from_seed(*seed);
        let map = GridMap::generate(&rng.gen(), rows, cols, obstacle_ratio);
        let free: Vec<Location> = (0..map.size()).filter(|&l| !map.is_obstacle(l)).collect();
        ensure!(
            free.len() >= 2 * num_agents,
            "map has {} free cells, not enough for {} agents",
            free.len(),
            num_agents
        );
        let mut starts: Vec<Location> = Vec::with_capacity(num_agents);
        let mut goals: Vec<Location> = Vec::with_capacity(num_agents);
        let mut attempts = 0;
        while starts.len() < num_agents {
            attempts += 1;
            ensure!(
                attempts < 100 * num_agents + 1000,
                "failed to sample {} reachable start/goal pairs",
                num_agents
            );
            let s = free[rng.gen_range(0..free.len())];
            let g = free[rng.gen_range(0..free.len())];
            if s == g || starts.contains(&s) || goals.contains(&g) {
                continue;
            }
            if map.bfs_distances(s)[g] == usize::MAX {
                continue;
            }
            starts.push(s);
            goals.push(g);
        }
        Ok(Self {
            map,
            starts,
            goals,
            name: format!("random-{}x{}-{}", rows, cols, num_agents),
        })
    }

    /// Serializes a joint solution in the snapshot schema: agent id (string)
    /// mapped to an ordered list of `[row, col]` pairs.
    pub fn snapshot_json(&self, paths: &[Path]) -> Value {
        let mut out = Map::new();
        for (id, path) in paths.iter().enumerate() {
            let coords: Vec<Value> = path
                .iter()
                .map(|e| {
                    Value::Array(vec![
                        Value::from(self.map.row_of(e.location)),
                        Value::from(self.map.col_of(e.location)),
                    ])
                })
                .collect();
            out.insert(id.to_string(), Value::Array(coords));
        }
        Value::Object(out)
    }

    /// Loads a snapshot produced by [`Instance::snapshot_json`]. Every agent
    /// must be present exactly once.
    pub fn load_snapshot(&self, value: &Value) -> Result<Vec<Path>> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow!("snapshot must be a JSON object"))?;
        let mut by_id: BTreeMap<usize, Path> = BTreeMap::new();
        for (key, coords) in obj {
            let id: usize = key
                .parse()
                .map_err(|_| anyhow!("snapshot key {:?} is not an agent id", key))?;
            ensure!(id < self.num_agents(), "snapshot agent {} does not exist", id);
            let coords = coords
                .as_array()
                .ok_or_else(|| anyhow!("snapshot path for agent {} must be an array", id))?;
            let mut locations = Vec::with_capacity(coords.len());
            for pair in coords {
                let pair = pair
                    .as_array()
                    .filter(|p| p.len() == 2)
                    .ok_or_else(|| anyhow!("agent {}: expected [row, col] pairs", id))?;
                let row = pair[0]
                    .as_u64()
                    .ok_or_else(|| anyhow!("agent {}: non-integer row", id))?
                    as usize;
                let col = pair[1]
                    .as_u64()
                    .ok_or_else(|| anyhow!("agent {}: non-integer col", id))?
                    as usize;
                ensure!(
                    row < self.map.rows() && col < self.map.cols(),
                    "agent {}: [{}, {}] is out of bounds",
                    id,
                    row,
                    col
                );
                locations.push(self.map.linearize(row, col));
            }
            by_id.insert(id, path_from_locations(locations));
        }
        ensure!(
            by_id.len() == self.num_agents(),
            "snapshot has {} agents, instance has {}",
            by_id.len(),
            self.num_agents()
        );
        Ok(by_id.into_values().collect())
    }

    /// Sum of single-agent shortest-path lengths, a lower bound on any
    /// feasible sum of costs.
    pub fn sum_of_distances(&self) -> usize {
        (0..self.num_agents())
            .map(|i| {
                let dist = self.map.bfs_distances(self.goals[i]);
                dist[self.starts[i]]
            })
            .sum()
    }

    pub fn solution_cost(&self, paths: &[Path]) -> usize {
        paths.iter().map(path_cost).sum()
    }
}
