//! Piece-count variables of the refinement model.

use super::program::{IntegerProgram, LinearExpr, VarId, VarKind, VarSpec};
use crate::graph::{CoverageGraph, PieceKey, TileId};
use crate::solution::Solution;
use std::collections::{BTreeMap, BTreeSet};

/// Maps each admissible key to either a variable (free tile) or a constant
/// count taken from the warm start (fixed tile).
#[derive(Debug, Clone, Default)]
pub struct PieceVariables {
    vars: BTreeMap<PieceKey, VarId>,
    fixed: BTreeMap<PieceKey, usize>,
}

/// Number of times each key is used by a solution.
pub fn key_counts(solution: &Solution) -> BTreeMap<PieceKey, usize> {
    let mut counts = BTreeMap::new();
    for visit in solution.visits() {
        *counts.entry(visit.key()).or_insert(0) += 1;
    }
    counts
}

impl PieceVariables {
    /// Add one variable per key at each free tile. Keys at other tiles take
    /// their count in `warm_start`.
    pub fn build(
        graph: &CoverageGraph,
        program: &mut IntegerProgram,
        free: &BTreeSet<TileId>,
        warm_start: Option<&Solution>,
    ) -> Self {
        let counts = warm_start.map(key_counts).unwrap_or_default();
        let mut vars = BTreeMap::new();
        let mut fixed = BTreeMap::new();
        let passing_ub = graph.tile_count() as f64;

        for tile in graph.tiles() {
            if !free.contains(&tile.id) {
                for key in graph.pieces_at(tile.id) {
                    if let Some(&count) = counts.get(&key) {
                        fixed.insert(key, count);
                    }
                }
                continue;
            }
            for key in graph.pieces_at(tile.id) {
                if !graph.cost(&key).is_finite() {
                    continue;
                }
                let (kind, ub) = if key.full {
                    (VarKind::Binary, 1.0)
                } else {
                    (VarKind::Integer, passing_ub)
                };
                let id = program.add_variable(VarSpec {
                    name: format!(
                        "x_{}_{}_{}_{}",
                        key.tile.0,
                        key.a.0,
                        key.b.0,
                        if key.full { "f" } else { "p" }
                    ),
                    kind,
                    lb: 0.0,
                    ub,
                    start: warm_start.map(|_| counts.get(&key).copied().unwrap_or(0) as f64),
                });
                vars.insert(key, id);
            }
        }

        PieceVariables { vars, fixed }
    }

    pub fn var(&self, key: &PieceKey) -> Option<VarId> {
        self.vars.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Usage count of a key as an expression.
    pub fn count(&self, key: &PieceKey) -> LinearExpr {
        match self.vars.get(key) {
            Some(&id) => {
                let mut expr = LinearExpr::new();
                expr.add_term(id, 1.0);
                expr
            }
            None => LinearExpr::constant(self.fixed.get(key).copied().unwrap_or(0) as f64),
        }
    }

    /// Sum of usage counts, each weighted.
    pub fn weighted_sum<I>(&self, weighted: I) -> LinearExpr
    where
        I: IntoIterator<Item = (PieceKey, f64)>,
    {
        let mut expr = LinearExpr::new();
        for (key, weight) in weighted {
            expr.add_scaled(&self.count(&key), weight);
        }
        expr
    }

    /// Every key used by a value vector, repeated by its count, fixed keys included.
    pub fn used_keys(&self, values: &[f64]) -> Vec<PieceKey> {
        let mut keys = Vec::new();
        for (key, &count) in &self.fixed {
            keys.extend(std::iter::repeat(*key).take(count));
        }
        for (key, id) in &self.vars {
            let count = values.get(id.0).map_or(0.0, |v| v.round()).max(0.0) as usize;
            keys.extend(std::iter::repeat(*key).take(count));
        }
        keys
    }

    /// Objective constant contributed by the fixed keys.
    pub fn fixed_cost(&self, graph: &CoverageGraph) -> f64 {
        self.fixed
            .iter()
            .map(|(key, &count)| graph.cost(key) * count as f64)
            .sum()
    }

    pub fn vars(&self) -> impl Iterator<Item = (&PieceKey, &VarId)> {
        self.vars.iter()
    }
}
