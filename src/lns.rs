//! Large neighborhood search: repeatedly free a connected region of tiles,
//! re-solve it exactly with everything else fixed, and keep strict
//! improvements.

use crate::config::Config;
use crate::deadline::Deadline;
use crate::error::ModelError;
use crate::graph::{CoverageGraph, TileId};
use crate::local_search::{LocalOptimizer, IMPROVEMENT_EPS};
use crate::model::RefinementModel;
use crate::solution::Solution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeSet, VecDeque};
use std::time::{Duration, Instant};

/// Counters of an LNS run.
#[derive(Debug, Clone, Default)]
pub struct LnsStatistics {
    pub iterations: usize,
    pub improvements: usize,
    /// Iterations whose repair overran the per-iteration limit.
    pub abandoned: usize,
    /// Iterations whose region was solved to proven optimality.
    pub optimal_regions: usize,
}

/// Destroy/repair search over a coverage graph.
pub struct LnsOptimizer<'g> {
    graph: &'g CoverageGraph,
    current: Solution,
    current_cost: f64,
    best: Solution,
    best_cost: f64,
    neighborhood_size: usize,
    min_neighborhood_size: usize,
    growth: f64,
    rng: ChaCha8Rng,
    local: LocalOptimizer,
    pub stats: LnsStatistics,
}

impl<'g> LnsOptimizer<'g> {
    /// Start from a feasible solution.
    pub fn new(graph: &'g CoverageGraph, initial: Solution, config: &Config) -> Self {
        let cost = graph.objective(&initial);
        let min_neighborhood_size = config.min_neighborhood_size.max(1);
        LnsOptimizer {
            graph,
            best: initial.clone(),
            best_cost: cost,
            current: initial,
            current_cost: cost,
            neighborhood_size: config.initial_neighborhood_size.max(min_neighborhood_size),
            min_neighborhood_size,
            growth: config.neighborhood_growth.max(1.0),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            local: LocalOptimizer::new(config.local_max_passes),
            stats: LnsStatistics::default(),
        }
    }

    pub fn best(&self) -> &Solution {
        &self.best
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn into_best(self) -> Solution {
        self.best
    }

    pub fn neighborhood_size(&self) -> usize {
        self.neighborhood_size
    }

    /// Run up to `iterations` destroy/repair steps.
    ///
    /// Returns `true` if the last repaired region spanned the whole graph and
    /// was solved to proven optimality.
    pub fn optimize(
        &mut self,
        iterations: usize,
        iteration_time_limit: Duration,
        deadline: Deadline,
    ) -> Result<bool, ModelError> {
        for _ in 0..iterations {
            if deadline.expired() {
                break;
            }
            self.stats.iterations += 1;
            let started = Instant::now();
            let (free, fixed) = self.select_neighborhood();
            let limit = Deadline::after(iteration_time_limit).min(deadline);

            let mut model =
                RefinementModel::new(self.graph, Some(self.current.clone()), Some(&fixed))?;
            let bounds = model.optimize(limit)?;
            let candidate = model.extract_solution()?;
            let candidate = self.local.improve(self.graph, candidate);

            let region_optimal = bounds.is_optimal();
            if started.elapsed() > iteration_time_limit {
                self.stats.abandoned += 1;
                log::debug!(
                    "lns iteration {} abandoned after {:?}",
                    self.stats.iterations,
                    started.elapsed()
                );
                self.adapt(false);
                continue;
            }

            let cost = self.graph.objective(&candidate);
            if cost < self.current_cost - IMPROVEMENT_EPS && candidate.is_feasible(self.graph) {
                self.stats.improvements += 1;
                self.current = candidate;
                self.current_cost = cost;
                if cost < self.best_cost {
                    self.best = self.current.clone();
                    self.best_cost = cost;
                }
            }
            log::debug!(
                "lns iteration {}: {} free tiles, bounds [{:.4}, {:.4}], current {:.4}",
                self.stats.iterations,
                free.len(),
                bounds.lb,
                bounds.ub,
                self.current_cost
            );

            if region_optimal {
                self.stats.optimal_regions += 1;
                if fixed.is_empty() {
                    log::info!("lns proved optimality at cost {:.4}", self.best_cost);
                    return Ok(true);
                }
            }
            self.adapt(region_optimal);
        }
        Ok(false)
    }

    /// Grow the neighborhood after a region was solved to optimality,
    /// otherwise shrink it.
    fn adapt(&mut self, region_optimal: bool) {
        let n = self.neighborhood_size as f64;
        self.neighborhood_size = if region_optimal {
            ((n * self.growth).ceil() as usize).min(self.graph.tile_count())
        } else {
            ((n / self.growth).floor() as usize).max(self.min_neighborhood_size)
        };
    }

    /// Breadth-first region around the tile of a random visit. Returns the
    /// free and the fixed tiles.
    fn select_neighborhood(&mut self) -> (BTreeSet<TileId>, BTreeSet<TileId>) {
        let visits = self.current.visits();
        let root = if visits.is_empty() {
            TileId(0)
        } else {
            visits[self.rng.gen_range(0..visits.len())].tile
        };

        let size = self.neighborhood_size.min(self.graph.tile_count());
        let mut free = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        free.insert(root);
        while let Some(tile) = queue.pop_front() {
            if free.len() >= size {
                break;
            }
            for &n in self.graph.neighbors(tile) {
                if free.len() >= size {
                    break;
                }
                if free.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        let fixed = self
            .graph
            .tiles()
            .iter()
            .map(|t| t.id)
            .filter(|id| !free.contains(id))
            .collect();
        (free, fixed)
    }
}
