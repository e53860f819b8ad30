use crate::Location;
use anyhow::{anyhow, ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A 4-connected grid. Cells are addressed by their linearized index
/// `row * cols + col`.
#[derive(Debug, Clone)]
pub struct GridMap {
    rows: usize,
    cols: usize,
    obstacles: Vec<bool>,
}

impl GridMap {
    pub fn new(rows: usize, cols: usize, obstacles: Vec<bool>) -> Result<Self> {
        ensure!(rows > 0 && cols > 0, "map must have positive dimensions");
        ensure!(
            obstacles.len() == rows * cols,
            "obstacle grid has {} cells, expected {}",
            obstacles.len(),
            rows * cols
        );
        Ok(Self {
            rows,
            cols,
            obstacles,
        })
    }

    /// An obstacle-free map, mostly useful in tests.
    pub fn open(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            obstacles: vec![false; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// Upper bound on the length of any shortest path in the map.
    pub fn span(&self) -> usize {
        self.rows + self.cols
    }

    pub fn linearize(&self, row: usize, col: usize) -> Location {
        row * self.cols + col
    }

    pub fn row_of(&self, loc: Location) -> usize {
        loc / self.cols
    }

    pub fn col_of(&self, loc: Location) -> usize {
        loc % self.cols
    }

    pub fn is_obstacle(&self, loc: Location) -> bool {
        self.obstacles[loc]
    }

    /// Orthogonal, in-bounds, non-obstacle neighbors of `loc`.
    pub fn neighbors(&self, loc: Location) -> Vec<Location> {
        let (row, col) = (self.row_of(loc), self.col_of(loc));
        let mut out = Vec::with_capacity(4);
        if row > 0 && !self.obstacles[loc - self.cols] {
            out.push(loc - self.cols);
        }
        if row + 1 < self.rows && !self.obstacles[loc + self.cols] {
            out.push(loc + self.cols);
        }
        if col > 0 && !self.obstacles[loc - 1] {
            out.push(loc - 1);
        }
        if col + 1 < self.cols && !self.obstacles[loc + 1] {
            out.push(loc + 1);
        }
        out
    }

    /// Branching degree of a free cell.
    pub fn degree(&self, loc: Location) -> usize {
        self.neighbors(loc).len()
    }

    /// A legal single-timestep move: wait in place or step to an orthogonal
    /// neighbor, both endpoints free.
    pub fn valid_move(&self, from: Location, to: Location) -> bool {
        if from >= self.size() || to >= self.size() {
            return false;
        }
        if self.obstacles[from] || self.obstacles[to] {
            return false;
        }
        if from == to {
            return true;
        }
        let (r1, c1) = (self.row_of(from), self.col_of(from));
        let (r2, c2) = (self.row_of(to), self.col_of(to));
        r1.abs_diff(r2) + c1.abs_diff(c2) == 1
    }

    /// Parses the movingAI `.map` format:
    ///
    /// ```text
    /// type octile
    /// height 4
    /// width 4
    /// map
    /// ....
    /// .@@.
    /// ...
    /// ```
    ///
    /// `.` and `G` are passable, every other glyph is an obstacle.
    pub fn parse(text: &str) -> Result<Self> {
        let mut height = None;
        let mut width = None;
        let mut lines = text.lines();
        loop {
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("map header ended before 'map' marker"))?;
            let line = line.trim();
            if line == "map" {
                break;
            }
            if let Some(v) = line.strip_prefix("height ") {
                height = Some(v.trim().parse::<usize>()?);
            } else if let Some(v) = line.strip_prefix("width ") {
                width = Some(v.trim().parse::<usize>()?);
            }
        }
        let rows = height.ok_or_else(|| anyhow!("map header is missing 'height'"))?;
        let cols = width.ok_or_else(|| anyhow!("map header is missing 'width'"))?;
        let mut obstacles = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("map body ended at row {} of {}", r, rows))?;
            let line = line.trim_end();
            ensure!(
                line.chars().count() >= cols,
                "map row {} has {} cells, expected {}",
                r,
                line.chars().count(),
                cols
            );
            for c in line.chars().take(cols) {
                obstacles.push(!matches!(c, '.' | 'G'));
            }
        }
        Self::new(rows, cols, obstacles)
    }

    /// Generates a random map from a seed. Obstacles are sampled i.i.d. with
    /// probability `obstacle_ratio`.
    pub fn generate(seed: &[u8; 32], rows: usize, cols: usize, obstacle_ratio: f64) -> Self {
        let mut rng = StdRng::from_seed(*seed);
        let obstacles = (0..rows * cols)
            .map(|_| rng.gen_bool(obstacle_ratio.clamp(0.0, 1.0)))
            .collect();
        Self {
            rows,
            cols,
            obstacles,
        }
    }

    /// BFS distances from `source` over free cells; unreachable cells get
    /// `usize::MAX`.
    pub fn bfs_distances(&self, source: Location) -> Vec<usize> {
        let mut dist = vec![usize::MAX; self.size()];
        if self.obstacles[source] {
            return dist;
        }
        dist[source] = 0;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(source);
        while let Some(curr) = queue.pop_front() {
            for next in self.neighbors(curr) {
                if dist[next] == usize::MAX {
                    dist[next] = dist[curr] + 1;
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Renders the map back into the movingAI format.
    pub fn to_text(&self) -> String {
        let mut out = format!("type octile\nheight {}\nwidth {}\nmap\n", self.rows, self.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.push(if self.obstacles[self.linearize(r, c)] {
                    '@'
                } else {
                    '.'
                });
            }
            out.push('\n');
        }
        out
    }
}
