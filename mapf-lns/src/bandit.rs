use rand::{rngs::SmallRng, Rng};

/// Candidate neighborhood sizes for the sampled and bandit-selected modes.
pub const SIZE_CANDIDATES: [usize; 5] = [2, 4, 8, 16, 32];

/// Fixed reaction factor for weight updates.
const REACTION_FACTOR: f64 = 0.1;
/// Scales the exploration bonus added to each arm's weight when sampling.
const EXPLORATION_COEF: f64 = 0.5;
const WEIGHT_FLOOR: f64 = 1e-3;

/// Running bandit state for one family of arms: a mean-reward weight, a
/// second-moment weight and a pull count per arm. Never reset except at
/// selector re-initialization.
#[derive(Debug, Clone)]
pub struct BanditStats {
    pub weights: Vec<f64>,
    pub weights_squared: Vec<f64>,
    pub counts: Vec<u64>,
}

impl BanditStats {
    pub fn new(arms: usize) -> Self {
        Self {
            weights: vec![1.0; arms],
            weights_squared: vec![1.0; arms],
            counts: vec![0; arms],
        }
    }

    pub fn arms(&self) -> usize {
        self.weights.len()
    }

    /// Weighted, exploration-biased draw. The score of an arm is its weight
    /// plus a bonus growing with its reward variance and shrinking with its
    /// pull count, so under-sampled arms keep a positive probability; never
    /// a pure argmax.
    pub fn sample(&self, rng: &mut SmallRng) -> usize {
        if self.arms() == 1 {
            return 0;
        }
        let scores: Vec<f64> = (0..self.arms())
            .map(|i| {
                let w = self.weights[i].max(WEIGHT_FLOOR);
                let variance = (self.weights_squared[i] - self.weights[i] * self.weights[i]).max(0.0);
                let bonus = EXPLORATION_COEF * (variance + 1.0 / (1.0 + self.counts[i] as f64)).sqrt();
                w + bonus
            })
            .collect();
        let total: f64 = scores.iter().sum();
        let mut pick = rng.gen_range(0.0..total);
        for (i, s) in scores.iter().enumerate() {
            if pick < *s {
                return i;
            }
            pick -= s;
        }
        self.arms() - 1
    }

    /// Exponential-smoothing update of the sampled arm with the observed
    /// reward.
    pub fn update(&mut self, arm: usize, reward: f64) {
        let r = REACTION_FACTOR;
        self.weights[arm] = (1.0 - r) * self.weights[arm] + r * reward;
        self.weights_squared[arm] = (1.0 - r) * self.weights_squared[arm] + r * reward * reward;
        self.counts[arm] += 1;
    }
}

/// Independent weight vectors for the destroy-heuristic choice and, per
/// heuristic, for the neighborhood-size bucket choice.
#[derive(Debug, Clone)]
pub struct AdaptiveBandit {
    heuristics: BanditStats,
    sizes: Vec<BanditStats>,
}

impl AdaptiveBandit {
    /// `num_heuristics` destroy arms; `num_size_buckets == 0` disables the
    /// size bandit.
    pub fn new(num_heuristics: usize, num_size_buckets: usize) -> Self {
        let sizes = if num_size_buckets > 0 {
            (0..num_heuristics)
                .map(|_| BanditStats::new(num_size_buckets))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            heuristics: BanditStats::new(num_heuristics),
            sizes,
        }
    }

    /// Samples a destroy arm and, when the size bandit is active, a size
    /// bucket for that arm.
    pub fn sample(&self, rng: &mut SmallRng) -> (usize, Option<usize>) {
        let heuristic = self.heuristics.sample(rng);
        let size = self.sizes.get(heuristic).map(|stats| stats.sample(rng));
        (heuristic, size)
    }

    /// Updates the sampled arms with the observed reward. Degenerate
    /// single-arm vectors are left untouched, which disables adaptivity
    /// when only one heuristic is configured.
    pub fn update(&mut self, heuristic: usize, size_bucket: Option<usize>, reward: f64) {
        if self.heuristics.arms() > 1 {
            self.heuristics.update(heuristic, reward);
        }
        if let (Some(bucket), Some(stats)) = (size_bucket, self.sizes.get_mut(heuristic)) {
            stats.update(bucket, reward);
        }
    }

    pub fn heuristic_stats(&self) -> &BanditStats {
        &self.heuristics
    }
}
