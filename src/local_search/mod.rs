//! Local optimizer: fast, deterministic and monotone improvement of a tour.

pub mod reselect;
pub mod reverse;
pub mod shortcut;

use crate::graph::CoverageGraph;
use crate::solution::{Solution, Visit};

/// Minimum decrease that counts as an improvement.
pub const IMPROVEMENT_EPS: f64 = 1e-6;

/// Runs the piece re-selection, spike shortcut and window reversal
/// neighborhoods until a pass brings no strict improvement.
#[derive(Debug, Clone)]
pub struct LocalOptimizer {
    pub max_passes: usize,
    /// Moves applied during the last call to [`LocalOptimizer::improve`].
    pub moves: usize,
}

impl Default for LocalOptimizer {
    fn default() -> Self {
        LocalOptimizer::new(100)
    }
}

impl LocalOptimizer {
    pub fn new(max_passes: usize) -> Self {
        LocalOptimizer {
            max_passes,
            moves: 0,
        }
    }

    /// Improve a tour. The result never costs more than the input.
    pub fn improve(&mut self, graph: &CoverageGraph, solution: Solution) -> Solution {
        self.moves = 0;
        let initial = graph.objective(&solution);
        let mut visits = solution.into_visits();
        let mut cost = initial;

        for _ in 0..self.max_passes {
            let before = cost;

            self.reselect_neighborhood(graph, &mut visits);
            while self.shortcut_neighborhood(graph, &mut visits) {}
            while self.reverse_neighborhood(graph, &mut visits) {}

            cost = cost_of(graph, &visits);
            if cost >= before - IMPROVEMENT_EPS {
                break;
            }
        }

        log::debug!(
            "local optimizer: {:.4} -> {:.4} ({} moves)",
            initial,
            cost,
            self.moves
        );
        Solution::new(visits)
    }
}

pub(crate) fn cost_of(graph: &CoverageGraph, visits: &[Visit]) -> f64 {
    visits.iter().map(|v| graph.cost(&v.key())).sum()
}
