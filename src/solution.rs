//! Solution representation: a closed sequence of puzzle-piece visits.

use crate::error::SolutionError;
use crate::geometry::{Path, Point};
use crate::graph::{ordered, CoverageGraph, PieceKey, TileId};
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Traversal of `tile`, entered from `entry` and left towards `exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Visit {
    pub entry: TileId,
    pub tile: TileId,
    pub exit: TileId,
    /// Whether this visit covers the tile.
    pub full: bool,
}

impl Visit {
    pub fn new(entry: TileId, tile: TileId, exit: TileId, full: bool) -> Self {
        Visit {
            entry,
            tile,
            exit,
            full,
        }
    }

    /// Key of the piece used by this visit.
    pub fn key(&self) -> PieceKey {
        PieceKey::new(self.entry, self.tile, self.exit, self.full)
    }

    pub fn is_u_turn(&self) -> bool {
        self.entry == self.exit
    }
}

/// A closed tour. Consecutive visits (cyclically) satisfy
/// `visits[i].tile == visits[i + 1].entry` and `visits[i].exit == visits[i + 1].tile`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    visits: Vec<Visit>,
}

impl Solution {
    /// Wrap a sequence of visits without checking it.
    pub fn new(visits: Vec<Visit>) -> Self {
        Solution { visits }
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn into_visits(self) -> Vec<Visit> {
        self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// The visited tiles in tour order.
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.visits.iter().map(|v| v.tile)
    }

    /// Check that the visits form a feasible coverage tour of `graph`.
    pub fn validate(&self, graph: &CoverageGraph) -> Result<(), SolutionError> {
        let n = self.visits.len();
        if n < 2 {
            return Err(SolutionError::TooShort(n));
        }

        for (index, visit) in self.visits.iter().enumerate() {
            let next = &self.visits[(index + 1) % n];
            if visit.tile != next.entry || visit.exit != next.tile {
                return Err(SolutionError::Broken { index });
            }
            if visit.tile.index() >= graph.tile_count() {
                return Err(SolutionError::UnknownPiece { index });
            }
            if visit.full && !graph.is_mandatory(visit.tile) {
                return Err(SolutionError::PhantomCovered { tile: visit.tile });
            }
            let known = graph.are_neighbors(visit.tile, visit.entry)
                && graph.are_neighbors(visit.tile, visit.exit)
                && graph.cost(&visit.key()).is_finite();
            if !known {
                return Err(SolutionError::UnknownPiece { index });
            }
        }

        let mut covered: HashMap<TileId, usize> = HashMap::new();
        for visit in self.visits.iter().filter(|v| v.full) {
            *covered.entry(visit.tile).or_insert(0) += 1;
        }
        for tile in graph.mandatory() {
            let count = covered.get(&tile).copied().unwrap_or(0);
            if count != 1 {
                return Err(SolutionError::CoverageCount { tile, count });
            }
        }
        Ok(())
    }

    pub fn is_feasible(&self, graph: &CoverageGraph) -> bool {
        self.validate(graph).is_ok()
    }

    /// Total cost under `graph`.
    pub fn cost(&self, graph: &CoverageGraph) -> f64 {
        graph.objective(self)
    }

    /// Build a tour from a closed walk of adjacent tiles (the first tile is
    /// not repeated at the end) and choose which visit covers each tile.
    pub fn from_walk(graph: &CoverageGraph, walk: &[TileId]) -> Self {
        let n = walk.len();
        let mut visits: Vec<Visit> = (0..n)
            .map(|i| Visit::new(walk[(i + n - 1) % n], walk[i], walk[(i + 1) % n], false))
            .collect();
        assign_coverage(graph, &mut visits);
        Solution { visits }
    }

    /// Concatenated trajectory of all pieces.
    pub fn path(&self, graph: &CoverageGraph) -> Path {
        let mut points = Vec::new();
        for visit in &self.visits {
            let piece_points = match graph.piece(&visit.key()) {
                Some(piece) => piece.path_from(visit.entry).points,
                None => graph
                    .transition(visit.tile, visit.entry)
                    .map(|t| vec![t.position])
                    .unwrap_or_default(),
            };
            for p in piece_points {
                if points.last().map_or(true, |q: &Point| !q.approx_eq(&p)) {
                    points.push(p);
                }
            }
        }
        Path::new(points)
    }

    /// Total number of turns over all pieces.
    pub fn turn_count(&self, graph: &CoverageGraph) -> usize {
        self.visits.iter().map(|v| graph.turns(&v.key())).sum()
    }
}

/// Mark exactly one visit per mandatory tile as full: the one with the
/// smallest extra cost over passing, then fewer turns, then the
/// lexicographically smaller entry transition point, then the earlier visit.
pub fn assign_coverage(graph: &CoverageGraph, visits: &mut [Visit]) {
    for visit in visits.iter_mut() {
        visit.full = false;
    }

    let mut best: BTreeMap<TileId, usize> = BTreeMap::new();
    for (i, visit) in visits.iter().enumerate() {
        if !graph.is_mandatory(visit.tile) {
            continue;
        }
        match best.get(&visit.tile) {
            Some(&j) if compare_coverage(graph, &visits[j], visit) != Ordering::Greater => {}
            _ => {
                best.insert(visit.tile, i);
            }
        }
    }
    for i in best.into_values() {
        visits[i].full = true;
    }
}

fn compare_coverage(graph: &CoverageGraph, a: &Visit, b: &Visit) -> Ordering {
    let rel_a = graph.relative_cost(a.entry, a.tile, a.exit);
    let rel_b = graph.relative_cost(b.entry, b.tile, b.exit);
    rel_a
        .total_cmp(&rel_b)
        .then_with(|| {
            graph
                .turns(&a.key().with_full(true))
                .cmp(&graph.turns(&b.key().with_full(true)))
        })
        .then_with(|| {
            match (
                graph.transition(a.tile, a.entry),
                graph.transition(b.tile, b.entry),
            ) {
                (Some(pa), Some(pb)) => pa.position.lex_cmp(&pb.position),
                _ => Ordering::Equal,
            }
        })
}

/// Split a multiset of piece keys into closed tours.
///
/// At every transition point the ends from both sides are paired; cycles
/// meeting at a common transition point are spliced together, so each
/// connected group of pieces yields exactly one tour. Keys whose ends cannot
/// be paired are dropped.
pub fn cycles_from_pieces(keys: &[PieceKey]) -> Vec<Vec<Visit>> {
    let mut keys = keys.to_vec();
    keys.sort();

    // End 0 faces `key.a`, end 1 faces `key.b`.
    let mut ends: BTreeMap<(TileId, TileId), (Vec<(usize, usize)>, Vec<(usize, usize)>)> =
        BTreeMap::new();
    for (k, key) in keys.iter().enumerate() {
        for (end, towards) in [(0, key.a), (1, key.b)] {
            let slot = ends
                .entry(ordered(key.tile, towards))
                .or_default();
            if key.tile < towards {
                slot.0.push((k, end));
            } else {
                slot.1.push((k, end));
            }
        }
    }

    let mut partner: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    let mut pairs_at = Vec::with_capacity(ends.len());
    for (low, high) in ends.into_values() {
        let pairs: Vec<_> = low.into_iter().zip(high).collect();
        for &(u, v) in &pairs {
            partner.insert(u, v);
            partner.insert(v, u);
        }
        pairs_at.push(pairs);
    }

    let mut cycles = UnionFind::<usize>::new(keys.len());
    for (&(k, _), &(other, _)) in &partner {
        cycles.union(k, other);
    }

    // Splice distinct cycles meeting at the same transition point by
    // exchanging partners with the first pair there.
    for pairs in &pairs_at {
        let Some(&(anchor_u, mut anchor_v)) = pairs.first() else {
            continue;
        };
        for &(u, v) in pairs.iter().skip(1) {
            if cycles.find_mut(anchor_u.0) == cycles.find_mut(u.0) {
                continue;
            }
            partner.insert(anchor_u, v);
            partner.insert(v, anchor_u);
            partner.insert(u, anchor_v);
            partner.insert(anchor_v, u);
            cycles.union(anchor_u.0, u.0);
            anchor_v = v;
        }
    }

    let mut seen = vec![false; keys.len()];
    let mut tours = Vec::new();
    for start in 0..keys.len() {
        if seen[start] || !partner.contains_key(&(start, 0)) || !partner.contains_key(&(start, 1))
        {
            continue;
        }
        let mut visits = Vec::new();
        let (mut k, mut from_end) = (start, 0);
        loop {
            if seen[k] {
                break;
            }
            seen[k] = true;
            let key = keys[k];
            let (entry, exit) = if from_end == 0 {
                (key.a, key.b)
            } else {
                (key.b, key.a)
            };
            visits.push(Visit::new(entry, key.tile, exit, key.full));
            match partner.get(&(k, 1 - from_end)) {
                Some(&(next, next_end)) => {
                    k = next;
                    from_end = next_end;
                }
                None => break,
            }
        }
        let closed = k == start && from_end == 0;
        if closed && visits.len() >= 2 {
            tours.push(visits);
        }
    }
    tours
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Visits: {}", self.visits.len())?;
        writeln!(
            f,
            "  Covering: {}",
            self.visits.iter().filter(|v| v.full).count()
        )?;
        for (i, visit) in self.visits.iter().enumerate() {
            writeln!(
                f,
                "  Visit {}: {} -> {} -> {}{}",
                i,
                visit.entry,
                visit.tile,
                visit.exit,
                if visit.full { " (full)" } else { "" }
            )?;
        }
        Ok(())
    }
}
