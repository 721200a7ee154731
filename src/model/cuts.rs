//! Lazy subtour elimination.
//!
//! Used pieces are grouped into components by the transition points they
//! share. A component without full pieces is dropped. If exactly one
//! component carries full pieces it is a tour; otherwise each full-carrying
//! component that misses some mandatory tile is cut off.

use super::program::{LinearConstraint, LinearExpr, Sense};
use super::variables::PieceVariables;
use crate::graph::{CoverageGraph, PieceKey, TileId};
use crate::solution::{cycles_from_pieces, Visit};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// The component shares no tile with other components: some piece must
    /// leave its tile set.
    SeparateComponents,
    /// The component crosses tiles of other components: some piece must use
    /// exactly one of its transition points, or the reference tile must be
    /// covered by a piece outside of it.
    IntersectingComponents,
}

#[derive(Debug, Clone)]
pub struct Cut {
    pub kind: CutKind,
    /// Cut reads `expr >= 1`.
    pub expr: LinearExpr,
}

impl Cut {
    pub fn into_constraint(self, index: usize) -> LinearConstraint {
        let prefix = match self.kind {
            CutKind::SeparateComponents => "separate",
            CutKind::IntersectingComponents => "intersecting",
        };
        LinearConstraint {
            name: format!("{}_{}", prefix, index),
            expr: self.expr,
            sense: Sense::Ge,
            rhs: 1.0,
        }
    }
}

/// Outcome of separating an integral piece selection.
#[derive(Debug, Clone, Default)]
pub struct Separation {
    pub cuts: Vec<Cut>,
    /// The closed tour, when the full pieces form a single component.
    pub tour: Option<Vec<Visit>>,
    /// Components carrying full pieces.
    pub components: usize,
}

struct Component {
    keys: Vec<PieceKey>,
    tiles: BTreeSet<TileId>,
    edges: BTreeSet<(TileId, TileId)>,
}

impl Component {
    fn has_full(&self) -> bool {
        self.keys.iter().any(|k| k.full)
    }
}

/// Split the used keys into components of shared transition points.
fn components(keys: &[PieceKey]) -> Vec<Component> {
    let mut edge_index: BTreeMap<(TileId, TileId), usize> = BTreeMap::new();
    for key in keys {
        for edge in key.edges() {
            let next = edge_index.len();
            edge_index.entry(edge).or_insert(next);
        }
    }

    let mut sets = UnionFind::<usize>::new(edge_index.len());
    for key in keys {
        let [e1, e2] = key.edges();
        sets.union(edge_index[&e1], edge_index[&e2]);
    }

    let mut by_root: BTreeMap<usize, usize> = BTreeMap::new();
    let mut groups: Vec<Component> = Vec::new();
    for key in keys {
        let root = sets.find(edge_index[&key.edges()[0]]);
        let slot = *by_root.entry(root).or_insert_with(|| {
            groups.push(Component {
                keys: Vec::new(),
                tiles: BTreeSet::new(),
                edges: BTreeSet::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.keys.push(*key);
        group.tiles.insert(key.tile);
        group.edges.extend(key.edges());
    }
    groups
}

/// Find violated subtour cuts for the used keys, or the tour they form.
pub fn separate(graph: &CoverageGraph, vars: &PieceVariables, used: &[PieceKey]) -> Separation {
    let groups = components(used);
    let full: Vec<&Component> = groups.iter().filter(|c| c.has_full()).collect();

    if full.len() == 1 {
        let tour = cycles_from_pieces(&full[0].keys).into_iter().next();
        return Separation {
            cuts: Vec::new(),
            tour,
            components: 1,
        };
    }

    let mandatory: BTreeSet<TileId> = graph.mandatory().collect();
    let mut cuts = Vec::new();
    for (index, component) in full.iter().enumerate() {
        if mandatory.is_subset(&component.tiles) {
            continue;
        }
        // The component itself is among the groups.
        let intersects = groups
            .iter()
            .filter(|c| !c.tiles.is_disjoint(&component.tiles))
            .count()
            > 1;

        let cut = if intersects {
            intersecting_cut(graph, vars, component)
        } else {
            separate_cut(graph, vars, component)
        };
        if cut.expr.has_terms() {
            cuts.push(cut);
        } else {
            log::warn!("skipping subtour cut {} without free pieces", index);
        }
    }

    Separation {
        cuts,
        tour: None,
        components: full.len(),
    }
}

fn separate_cut(graph: &CoverageGraph, vars: &PieceVariables, component: &Component) -> Cut {
    let leaving = graph.leaving(&component.tiles);
    Cut {
        kind: CutKind::SeparateComponents,
        expr: vars.weighted_sum(leaving.into_iter().map(|k| (k, 1.0))),
    }
}

fn intersecting_cut(graph: &CoverageGraph, vars: &PieceVariables, component: &Component) -> Cut {
    let inside = |key: &PieceKey| {
        key.edges()
            .iter()
            .filter(|e| component.edges.contains(*e))
            .count()
    };

    let mut keys: BTreeSet<PieceKey> = component
        .tiles
        .iter()
        .flat_map(|&t| graph.pieces_at(t))
        .filter(|k| inside(k) == 1)
        .collect();

    let reference = component.keys.iter().filter(|k| k.full).map(|k| k.tile).min();
    if let Some(reference) = reference {
        keys.extend(
            graph
                .pieces_at(reference)
                .filter(|k| k.full && inside(k) < 2),
        );
    }

    Cut {
        kind: CutKind::IntersectingComponents,
        expr: vars.weighted_sum(keys.into_iter().map(|k| (k, 1.0))),
    }
}
