//! # puzzle_tour
//!
//! Short closed coverage tours over grid decompositions of a polygon.
//!
//! Every tile of the grid has a catalogue of precomputed "puzzle pieces":
//! trajectories that cover the tile (or merely pass through it) between the
//! transition points it shares with two neighbors. A tour is a cyclic chain of
//! pieces in which every tile inside the polygon is covered exactly once.
//!
//! The pipeline builds an initial tour from a tour search over tile centers,
//! improves it with a deterministic local optimizer, a large neighborhood
//! search and finally an integer-programming refinement that also reports a
//! lower bound.

pub mod config;
pub mod deadline;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod lns;
pub mod local_search;
pub mod model;
pub mod solution;
pub mod square;
pub mod tour;
pub mod utils;

use crate::config::Config;
use crate::deadline::Deadline;
use crate::error::{Error, TourError};
use crate::graph::CoverageGraph;
use crate::grid::{Grid, PieceCatalogue};
use crate::lns::{LnsOptimizer, LnsStatistics};
use crate::local_search::LocalOptimizer;
use crate::model::RefinementModel;
use crate::solution::Solution;
use crate::tour::TourWithCoverageSolver;

use std::time::{Duration, Instant};

/// Objective after each pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageCost {
    pub stage: &'static str,
    pub cost: f64,
    pub elapsed: Duration,
}

/// The pipeline driver: tour search, local optimizer, LNS and refinement.
pub struct PuzzleTourSolver {
    pub graph: CoverageGraph,
    pub config: Config,
    pub best_solution: Option<Solution>,
    pub lower_bound: f64,
    pub run_time: Duration,
    pub stages: Vec<StageCost>,
    pub lns_statistics: LnsStatistics,
    pub start_time: Instant,
}

impl PuzzleTourSolver {
    /// Create a solver for a validated coverage graph.
    pub fn new(graph: CoverageGraph, config: Config) -> Self {
        PuzzleTourSolver {
            graph,
            config,
            best_solution: None,
            lower_bound: f64::NEG_INFINITY,
            run_time: Duration::from_secs(0),
            stages: Vec::new(),
            lns_statistics: LnsStatistics::default(),
            start_time: Instant::now(),
        }
    }

    /// Build and validate the coverage graph, then create a solver.
    pub fn from_grid(
        grid: &Grid,
        catalogue: &PieceCatalogue,
        config: Config,
    ) -> Result<Self, Error> {
        let graph = CoverageGraph::build(grid, catalogue)?;
        Ok(PuzzleTourSolver::new(graph, config))
    }

    /// Run every stage within the configured time limit.
    ///
    /// Returns `(lower bound, upper bound, solution)`. The lower bound is
    /// `-inf` when the refinement stage did not get to run.
    pub fn run(&mut self) -> Result<(f64, f64, Solution), Error> {
        self.start_time = Instant::now();
        self.stages.clear();
        let deadline = Deadline::from_limit(self.config.time_limit);
        let graph = &self.graph;
        let mut local = LocalOptimizer::new(self.config.local_max_passes);
        let mut lb = f64::NEG_INFINITY;

        // Initial tour
        let mut tour_solver = TourWithCoverageSolver::new();
        let tour = match tour_solver.solve(graph, deadline.share(self.config.tour_share)) {
            Ok(tour) => tour,
            Err(TourError::Infeasible) => {
                log::warn!("falling back to the greedy tour");
                TourWithCoverageSolver::greedy(graph)?
            }
            Err(e) => return Err(e.into()),
        };
        let mut solution = local.improve(graph, tour.solution);
        record(&mut self.stages, "tour", graph.objective(&solution), self.start_time);

        // Large neighborhood search
        if !deadline.expired() {
            let mut lns = LnsOptimizer::new(graph, solution, &self.config);
            let proven = lns.optimize(
                self.config.lns_iterations,
                self.config.lns_iteration_time_limit,
                deadline.share(self.config.lns_share),
            )?;
            self.lns_statistics = lns.stats.clone();
            let lns_cost = lns.best_cost();
            solution = local.improve(graph, lns.into_best());
            if proven {
                lb = lns_cost;
            }
            record(&mut self.stages, "lns", graph.objective(&solution), self.start_time);
        }

        // Refinement
        if !deadline.expired() {
            let mut model = RefinementModel::new(graph, Some(solution.clone()), None)?;
            let bounds = model.optimize(deadline)?;
            let refined = local.improve(graph, model.extract_solution()?);
            if graph.objective(&refined) <= graph.objective(&solution) {
                solution = refined;
            }
            lb = lb.max(bounds.lb);
            let cost = graph.objective(&solution);
            record(&mut self.stages, "refinement", cost, self.start_time);
        }

        let ub = graph.objective(&solution);
        lb = lb.min(ub);
        log::info!("final tour: cost {:.4}, lower bound {:.4}", ub, lb);

        self.lower_bound = lb;
        self.best_solution = Some(solution.clone());
        self.run_time = self.start_time.elapsed();
        Ok((lb, ub, solution))
    }
}

fn record(stages: &mut Vec<StageCost>, stage: &'static str, cost: f64, start: Instant) {
    log::info!("{} stage: cost {:.4}", stage, cost);
    stages.push(StageCost {
        stage,
        cost,
        elapsed: start.elapsed(),
    });
}
