//! Spike shortcut: drop a passing U-turn `x -> y -> x` and merge the two
//! visits of `x` around it.

use super::{LocalOptimizer, IMPROVEMENT_EPS};
use crate::graph::CoverageGraph;
use crate::solution::Visit;

impl LocalOptimizer {
    /// Apply the first improving shortcut. Returns `true` if one was applied.
    pub fn shortcut_neighborhood(
        &mut self,
        graph: &CoverageGraph,
        visits: &mut Vec<Visit>,
    ) -> bool {
        let n = visits.len();
        if n <= 3 {
            return false;
        }

        for i in 0..n {
            let spike = visits[i];
            if spike.full || !spike.is_u_turn() {
                continue;
            }
            let before = visits[(i + n - 1) % n];
            let after = visits[(i + 1) % n];
            if before.full && after.full {
                continue;
            }

            let merged = Visit::new(
                before.entry,
                before.tile,
                after.exit,
                before.full || after.full,
            );
            let delta = graph.cost(&merged.key())
                - graph.cost(&before.key())
                - graph.cost(&spike.key())
                - graph.cost(&after.key());
            if !(delta < -IMPROVEMENT_EPS) {
                continue;
            }

            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            visits[prev] = merged;
            // Remove the higher index first so the lower one stays valid.
            let (first, second) = if i > next { (i, next) } else { (next, i) };
            visits.remove(first);
            visits.remove(second);
            self.moves += 1;
            return true;
        }
        false
    }
}
