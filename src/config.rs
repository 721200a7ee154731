//! Configuration parameters for the coverage-tour pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for [`crate::PuzzleTourSolver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Overall time limit of the pipeline (`None` runs every stage to completion)
    pub time_limit: Option<Duration>,
    /// Share of the overall budget given to the initial tour search
    pub tour_share: f64,
    /// Maximum number of LNS iterations
    pub lns_iterations: usize,
    /// Time limit for a single LNS repair
    pub lns_iteration_time_limit: Duration,
    /// Share of the budget left after the tour stage given to LNS
    pub lns_share: f64,
    /// Number of free tiles in the first LNS neighborhood
    pub initial_neighborhood_size: usize,
    /// Factor by which the neighborhood grows or shrinks
    pub neighborhood_growth: f64,
    /// Lower bound on the neighborhood size
    pub min_neighborhood_size: usize,
    /// Maximum number of passes of the local optimizer
    pub local_max_passes: usize,
    /// Seed of the LNS random number generator
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_limit: Some(Duration::from_secs(60)),
            tour_share: 1.0 / 3.0,
            lns_iterations: 1000,
            lns_iteration_time_limit: Duration::from_secs(5),
            lns_share: 1.0 / 3.0,
            initial_neighborhood_size: 10,
            neighborhood_growth: 1.25,
            min_neighborhood_size: 2,
            local_max_passes: 100,
            seed: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the overall time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Remove the overall time limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit = None;
        self
    }

    /// Set the budget share of the tour search.
    pub fn with_tour_share(mut self, share: f64) -> Self {
        self.tour_share = share;
        self
    }

    /// Set the maximum number of LNS iterations.
    pub fn with_lns_iterations(mut self, iterations: usize) -> Self {
        self.lns_iterations = iterations;
        self
    }

    /// Set the time limit of a single LNS iteration.
    pub fn with_lns_iteration_time_limit(mut self, duration: Duration) -> Self {
        self.lns_iteration_time_limit = duration;
        self
    }

    /// Set the budget share of LNS.
    pub fn with_lns_share(mut self, share: f64) -> Self {
        self.lns_share = share;
        self
    }

    /// Set the initial LNS neighborhood size.
    pub fn with_initial_neighborhood_size(mut self, size: usize) -> Self {
        self.initial_neighborhood_size = size;
        self
    }

    /// Set the neighborhood growth factor.
    pub fn with_neighborhood_growth(mut self, factor: f64) -> Self {
        self.neighborhood_growth = factor;
        self
    }

    /// Set the minimum LNS neighborhood size.
    pub fn with_min_neighborhood_size(mut self, size: usize) -> Self {
        self.min_neighborhood_size = size;
        self
    }

    /// Set the pass limit of the local optimizer.
    pub fn with_local_max_passes(mut self, passes: usize) -> Self {
        self.local_max_passes = passes;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
