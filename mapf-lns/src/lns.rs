use crate::agent::{build_registry, Agent};
use crate::bandit::{AdaptiveBandit, SIZE_CANDIDATES};
use crate::destroy::{DestroyHeuristic, NeighborSelector, DESTROY_COUNT};
use crate::path_table::PathTable;
use crate::repair::{
    ExactJoint, Neighbor, OrderingSolver, PrioritizedPlanning, PriorityInheritance, RepairBackend,
    RepairOutcome,
};
use anyhow::{anyhow, ensure, Result};
use mapf_instance::{path_cost, Instance, Path};
use mapf_structs::{DestroyStrategy, IterationStat, LnsConfig, RepairStrategy, RunSummary, SizeMode};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::time::{Duration, Instant};

/// The adaptive LNS engine: owns the agent registry, the single reservation
/// table, the neighbor selector and the repair backend, and drives the
/// destroy-repair-accept cycle. Strictly single-flight: exactly one repair
/// attempt holds the table at any time.
pub struct Lns {
    pub instance: Instance,
    pub config: LnsConfig,
    agents: Vec<Agent>,
    table: PathTable,
    selector: NeighborSelector,
    bandit: AdaptiveBandit,
    backend: Box<dyn RepairBackend>,
    rng: SmallRng,
    pub iteration_stats: Vec<IterationStat>,
    sum_of_costs: usize,
    initial_cost: usize,
    cost_lower_bound: Option<usize>,
    num_failures: usize,
    restarts: usize,
    preprocessing_time: f64,
    initial_paths: Option<Vec<Path>>,
}

impl Lns {
    pub fn new(instance: Instance, config: LnsConfig, seed: [u8; 32]) -> Self {
        let preprocessing_start = Instant::now();
        let hasher = crate::seeded_hasher(&seed);
        let mut rng = SmallRng::from_seed(seed);
        let agents = build_registry(&instance);
        let table = PathTable::new(instance.map.size());
        let selector = NeighborSelector::new(hasher);

        let num_heuristics = match config.destroy_strategy {
            DestroyStrategy::Adaptive => DESTROY_COUNT,
            _ => 1,
        };
        let num_size_buckets = match config.size_mode {
            SizeMode::Bandit => SIZE_CANDIDATES.len(),
            _ => 0,
        };
        let bandit = AdaptiveBandit::new(num_heuristics, num_size_buckets);

        let backend: Box<dyn RepairBackend> = match config.repair_strategy {
            RepairStrategy::Prioritized => Box::new(PrioritizedPlanning),
            RepairStrategy::ExactJoint => Box::new(ExactJoint::new(
                Box::new(OrderingSolver::new(SmallRng::from_seed(rng.gen()))),
                config.accept_equal_cost,
            )),
            RepairStrategy::PriorityInheritance => Box::new(PriorityInheritance {
                timestep_cap: config.pibt_timestep_cap,
                window: 0,
            }),
            RepairStrategy::PriorityInheritanceWindowed => Box::new(PriorityInheritance {
                timestep_cap: config.pibt_timestep_cap,
                window: config.pibt_window,
            }),
        };

        let preprocessing_time = preprocessing_start.elapsed().as_secs_f64();
        Self {
            instance,
            config,
            agents,
            table,
            selector,
            bandit,
            backend,
            rng,
            iteration_stats: Vec::new(),
            sum_of_costs: 0,
            initial_cost: 0,
            cost_lower_bound: None,
            num_failures: 0,
            restarts: 0,
            preprocessing_time,
            initial_paths: None,
        }
    }

    /// Replaces the configured repair backend, e.g. to plug in an external
    /// exact joint solver.
    pub fn with_backend(mut self, backend: Box<dyn RepairBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Seeds the initial joint solution from a snapshot instead of running
    /// the bootstrap phase.
    pub fn with_initial_paths(mut self, paths: Vec<Path>) -> Self {
        self.initial_paths = Some(paths);
        self
    }

    pub fn sum_of_costs(&self) -> usize {
        self.sum_of_costs
    }

    /// Human-readable label of the run for reporting, destroy strategy plus
    /// repair backend.
    pub fn backend_label(&self) -> String {
        format!("LNS({}+{})", self.config.destroy_strategy, self.backend.name())
    }

    /// The committed joint solution, one path per agent.
    pub fn solution(&self) -> Vec<Path> {
        self.agents.iter().map(|a| a.path.clone()).collect()
    }

    /// Runs bootstrap then the destroy-repair-accept loop until the time
    /// budget is exhausted and the iteration floor is met. Returns
    /// `Ok(summary)` with `success == false` when no initial solution was
    /// found; validation failures under verbose mode are fatal errors.
    pub fn run(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let sum_of_distances: usize = self.agents.iter().map(|a| a.distance()).sum();

        let (bootstrapped, bootstrap_name) = self.bootstrap(start)?;
        let initial_runtime = start.elapsed().as_secs_f64();
        self.iteration_stats.push(IterationStat {
            num_agents: self.agents.len(),
            sum_of_costs: self.initial_cost,
            runtime: initial_runtime,
            backend: bootstrap_name,
            success: bootstrapped,
        });
        if !bootstrapped {
            if self.config.verbosity >= 1 {
                println!(
                    "Failed to find an initial solution in {:.3} seconds after {} restarts",
                    initial_runtime, self.restarts
                );
            }
            return Ok(self.summary(start, sum_of_distances, false));
        }
        if self.config.verbosity >= 1 {
            println!(
                "Initial solution cost = {}, runtime = {:.3}",
                self.initial_cost, initial_runtime
            );
        }

        while start.elapsed().as_secs_f64() < self.config.time_limit
            || self.iteration_stats.len() <= self.config.max_iterations
        {
            if self.config.verbosity >= 1 {
                self.validate()?;
            }

            let (heuristic_arm, size_bucket) = self.bandit.sample(&mut self.rng);
            let heuristic = match self.config.destroy_strategy {
                DestroyStrategy::Adaptive => DestroyHeuristic::from_arm(heuristic_arm),
                DestroyStrategy::RandomWalk => DestroyHeuristic::RandomWalk,
                DestroyStrategy::Intersection => DestroyHeuristic::Intersection,
                DestroyStrategy::RandomAgents => DestroyHeuristic::RandomAgents,
            };
            let neighborhood_size = match self.config.size_mode {
                SizeMode::Fixed => self.config.neighborhood_size,
                SizeMode::Uniform => {
                    SIZE_CANDIDATES[self.rng.gen_range(0..SIZE_CANDIDATES.len())]
                }
                SizeMode::Bandit => SIZE_CANDIDATES[size_bucket.unwrap_or(0)],
            };

            let generated = self.selector.generate(
                heuristic,
                &self.agents,
                &self.table,
                &self.instance.map,
                neighborhood_size,
                &mut self.rng,
            )?;
            let ids = match generated {
                Some(ids) if ids.len() >= 2 => ids,
                _ => {
                    if self.config.verbosity >= 2 {
                        println!("{} failed to generate a neighbor", heuristic.name());
                    }
                    continue;
                }
            };

            let old_paths: Vec<Path> = ids.iter().map(|&id| self.agents[id].path.clone()).collect();
            let old_cost: usize = old_paths.iter().map(path_cost).sum();
            for (&id, path) in ids.iter().zip(old_paths.iter()) {
                self.table.delete_path(id, path);
            }
            let neighbor = Neighbor {
                agents: ids,
                old_paths,
                old_cost,
            };

            let remaining = (self.config.time_limit - start.elapsed().as_secs_f64()).max(0.0);
            let budget = remaining.min(self.config.replan_time_limit);
            let deadline = Instant::now() + Duration::from_secs_f64(budget);

            let replan_start = Instant::now();
            let outcome = self.backend.attempt_repair(
                &self.instance.map,
                &mut self.agents,
                &mut self.table,
                &neighbor,
                deadline,
                &mut self.rng,
            )?;
            // overruns are clipped for bookkeeping only; the backend cannot
            // be preempted
            let replan_time = replan_start
                .elapsed()
                .as_secs_f64()
                .min(self.config.replan_time_limit);

            let new_cost = match outcome {
                RepairOutcome::Improved {
                    new_cost,
                    lower_bound,
                } => {
                    // a subset bound says nothing about the rest of the
                    // fleet; only a full-population solve may latch it
                    if let Some(lb) = lower_bound {
                        if self.cost_lower_bound.is_none()
                            && neighbor.agents.len() == self.agents.len()
                        {
                            self.cost_lower_bound = Some(lb);
                        }
                    }
                    new_cost
                }
                RepairOutcome::Rejected | RepairOutcome::Failed => {
                    for (&id, path) in neighbor.agents.iter().zip(neighbor.old_paths.iter()) {
                        self.agents[id].path = path.clone();
                        self.table.insert_path(id, path);
                    }
                    self.num_failures += 1;
                    old_cost
                }
            };
            self.sum_of_costs = self.sum_of_costs - old_cost + new_cost;

            let mut reward = (old_cost - new_cost) as f64;
            if !neighbor.agents.is_empty() {
                reward /= neighbor.agents.len() as f64;
            }
            self.bandit.update(heuristic_arm, size_bucket, reward);

            self.iteration_stats.push(IterationStat {
                num_agents: neighbor.agents.len(),
                sum_of_costs: self.sum_of_costs,
                runtime: start.elapsed().as_secs_f64(),
                backend: self.backend.name().to_string(),
                success: outcome.is_improved(),
            });
            if self.config.verbosity >= 1 {
                println!(
                    "Iteration {}, group size = {}, solution cost = {}, replan time = {:.3}, remaining time = {:.3}",
                    self.iteration_stats.len() - 1,
                    neighbor.agents.len(),
                    self.sum_of_costs,
                    replan_time,
                    self.config.time_limit - start.elapsed().as_secs_f64()
                );
            }
        }

        if self.config.verbosity >= 1 {
            self.validate()?;
        }
        Ok(self.summary(start, sum_of_distances, true))
    }

    /// Bootstrap: seed from a snapshot when provided, otherwise run the
    /// configured backend over the full agent set, with random restarts
    /// while time remains. No feasible initial solution is fatal for the
    /// run.
    fn bootstrap(&mut self, start: Instant) -> Result<(bool, String)> {
        if let Some(paths) = self.initial_paths.take() {
            let cost = self.instance.verify_solution(&paths)?;
            for (agent, path) in self.agents.iter_mut().zip(paths.into_iter()) {
                self.table.insert_path(agent.id, &path);
                agent.path = path;
            }
            self.sum_of_costs = cost;
            self.initial_cost = cost;
            return Ok((true, "snapshot".to_string()));
        }

        let all: Vec<usize> = (0..self.agents.len()).collect();
        loop {
            let neighbor = Neighbor {
                agents: all.clone(),
                old_paths: Vec::new(),
                old_cost: usize::MAX,
            };
            let remaining = (self.config.time_limit - start.elapsed().as_secs_f64()).max(0.0);
            let deadline = Instant::now() + Duration::from_secs_f64(remaining);
            let outcome = self.backend.attempt_repair(
                &self.instance.map,
                &mut self.agents,
                &mut self.table,
                &neighbor,
                deadline,
                &mut self.rng,
            )?;
            if let RepairOutcome::Improved { new_cost, lower_bound } = outcome {
                self.sum_of_costs = new_cost;
                self.initial_cost = new_cost;
                if let Some(lb) = lower_bound {
                    self.cost_lower_bound = Some(lb);
                }
                return Ok((true, self.backend.name().to_string()));
            }
            if !self.config.random_restarts
                || start.elapsed().as_secs_f64() >= self.config.time_limit
            {
                return Ok((false, self.backend.name().to_string()));
            }
            self.restarts += 1;
        }
    }

    /// Diagnostic validation of the committed solution; any violation is an
    /// implementation defect and aborts the run.
    fn validate(&self) -> Result<()> {
        let recomputed = self
            .instance
            .verify_solution(&self.solution())
            .map_err(|e| anyhow!("fatal validation error: {}", e))?;
        ensure!(
            recomputed == self.sum_of_costs,
            "fatal validation error: the maintained sum of costs {} differs from the recomputed sum {}",
            self.sum_of_costs,
            recomputed
        );
        Ok(())
    }

    fn summary(&self, start: Instant, sum_of_distances: usize, success: bool) -> RunSummary {
        let iterations = self.iteration_stats.len();
        let average_neighborhood_size = if iterations > 1 {
            self.iteration_stats[1..]
                .iter()
                .map(|s| s.num_agents)
                .sum::<usize>() as f64
                / (iterations - 1) as f64
        } else {
            0.0
        };
        RunSummary {
            success,
            iterations,
            final_cost: self.sum_of_costs,
            initial_cost: self.initial_cost,
            lower_bound: self
                .cost_lower_bound
                .map_or(sum_of_distances, |lb| lb.max(sum_of_distances)),
            sum_of_distances,
            average_neighborhood_size,
            failed_iterations: self.num_failures,
            restarts: self.restarts,
            initial_runtime: self
                .iteration_stats
                .first()
                .map_or(0.0, |s| s.runtime),
            preprocessing_time: self.preprocessing_time,
            runtime: start.elapsed().as_secs_f64(),
        }
    }
}
