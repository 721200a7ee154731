//! Window reversal: reverse the tile order of two or three consecutive visits.

use super::{LocalOptimizer, IMPROVEMENT_EPS};
use crate::graph::{CoverageGraph, TileId};
use crate::solution::Visit;

impl LocalOptimizer {
    /// Apply the first improving reversal. Returns `true` if one was applied.
    pub fn reverse_neighborhood(&mut self, graph: &CoverageGraph, visits: &mut [Visit]) -> bool {
        let n = visits.len();
        for width in 2..=3 {
            if n < width + 2 {
                continue;
            }
            for start in 0..n {
                if let Some(delta) = self.evaluate_reversal(graph, visits, start, width) {
                    if delta < -IMPROVEMENT_EPS {
                        self.apply_reversal(visits, start, width);
                        self.moves += 1;
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Cost change of reversing `width` visits starting at `start`, or `None`
    /// if the reversed walk would break adjacency.
    fn evaluate_reversal(
        &self,
        graph: &CoverageGraph,
        visits: &[Visit],
        start: usize,
        width: usize,
    ) -> Option<f64> {
        let n = visits.len();
        let first = visits[start];
        let last = visits[(start + width - 1) % n];
        if !graph.are_neighbors(first.entry, last.tile)
            || !graph.are_neighbors(first.tile, last.exit)
        {
            return None;
        }

        let old = reversal_span(visits, start, width);
        let new = reversed_span(visits, start, width);
        let old_cost: f64 = old.iter().map(|v| graph.cost(&v.key())).sum();
        let new_cost: f64 = new.iter().map(|v| graph.cost(&v.key())).sum();
        if !new_cost.is_finite() {
            return None;
        }
        Some(new_cost - old_cost)
    }

    fn apply_reversal(&self, visits: &mut [Visit], start: usize, width: usize) {
        let n = visits.len();
        let new = reversed_span(visits, start, width);
        for (offset, visit) in new.into_iter().enumerate() {
            visits[(start + n - 1 + offset) % n] = visit;
        }
    }
}

/// The visits touched by a reversal: the window plus one visit on each side.
fn reversal_span(visits: &[Visit], start: usize, width: usize) -> Vec<Visit> {
    let n = visits.len();
    (0..width + 2)
        .map(|offset| visits[(start + n - 1 + offset) % n])
        .collect()
}

/// The span after reversing the window. Full flags stay with their tiles.
fn reversed_span(visits: &[Visit], start: usize, width: usize) -> Vec<Visit> {
    let span = reversal_span(visits, start, width);
    let mut tiles: Vec<(TileId, bool)> = span.iter().map(|v| (v.tile, v.full)).collect();
    tiles[1..=width].reverse();

    let before = span[0].entry;
    let after = span[width + 1].exit;
    (0..tiles.len())
        .map(|k| {
            let entry = if k == 0 { before } else { tiles[k - 1].0 };
            let exit = if k + 1 == tiles.len() { after } else { tiles[k + 1].0 };
            Visit::new(entry, tiles[k].0, exit, tiles[k].1)
        })
        .collect()
}
