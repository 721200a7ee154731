//! Piece re-selection: move each full flag to the cheapest visit of its tile.

use super::{cost_of, LocalOptimizer, IMPROVEMENT_EPS};
use crate::graph::CoverageGraph;
use crate::solution::{assign_coverage, Visit};

impl LocalOptimizer {
    /// Reassign full flags for a fixed walk. Returns `true` on a strict improvement.
    pub fn reselect_neighborhood(
        &mut self,
        graph: &CoverageGraph,
        visits: &mut [Visit],
    ) -> bool {
        let before = cost_of(graph, visits);
        let mut candidate = visits.to_vec();
        assign_coverage(graph, &mut candidate);
        let after = cost_of(graph, &candidate);

        if after > before {
            return false;
        }
        let improved = after < before - IMPROVEMENT_EPS;
        if improved {
            self.moves += 1;
        }
        visits.copy_from_slice(&candidate);
        improved
    }
}
