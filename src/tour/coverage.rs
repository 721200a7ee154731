//! Tour-with-coverage construction: order the tiles that need coverage, close
//! the order into a walk over the dual graph, then pick pieces.

use super::{TourOutcome, TourSearch, TwoOptTourSearch};
use crate::deadline::Deadline;
use crate::error::TourError;
use crate::graph::{CoverageGraph, TileId};
use crate::solution::Solution;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};

/// An initial covering tour.
#[derive(Debug, Clone)]
pub struct CoverageTour {
    /// Objective of `solution`.
    pub ub: f64,
    /// The tour-search engine proved its city order optimal.
    pub engine_optimal: bool,
    /// Order of the tiles that need coverage.
    pub order: Vec<TileId>,
    /// Closed walk over adjacent tiles, first tile not repeated.
    pub walk: Vec<TileId>,
    pub solution: Solution,
}

/// Builds an initial tour from a tour-search engine.
pub struct TourWithCoverageSolver<S: TourSearch = TwoOptTourSearch> {
    engine: S,
}

impl TourWithCoverageSolver<TwoOptTourSearch> {
    pub fn new() -> Self {
        TourWithCoverageSolver {
            engine: TwoOptTourSearch::new(),
        }
    }

    /// Build a tour from the greedy nearest-neighbor order, without the engine.
    pub fn greedy(graph: &CoverageGraph) -> Result<CoverageTour, TourError> {
        if graph.mandatory_count() == 0 {
            return Err(TourError::EmptyInstance);
        }
        Self::from_order(graph, greedy_order(graph), false)
    }
}

impl Default for TourWithCoverageSolver<TwoOptTourSearch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TourSearch> TourWithCoverageSolver<S> {
    pub fn with_engine(engine: S) -> Self {
        TourWithCoverageSolver { engine }
    }

    pub fn engine(&self) -> &S {
        &self.engine
    }

    /// Run the engine on the tiles that need coverage and build a tour.
    ///
    /// An engine timeout falls back to [`greedy_order`]; a proof of
    /// infeasibility is returned as [`TourError::Infeasible`].
    pub fn solve(
        &mut self,
        graph: &CoverageGraph,
        deadline: Deadline,
    ) -> Result<CoverageTour, TourError> {
        let cities: Vec<TileId> = graph.mandatory().collect();
        if cities.is_empty() {
            return Err(TourError::EmptyInstance);
        }

        let weights: Vec<Vec<f64>> = cities
            .iter()
            .map(|&a| {
                cities
                    .iter()
                    .map(|&b| graph.center_distance(a, b))
                    .collect()
            })
            .collect();

        let (order, engine_optimal) = match self.engine.search(&weights, deadline) {
            TourOutcome::Found { order, optimal } if is_permutation(&order, cities.len()) => {
                (order.into_iter().map(|c| cities[c]).collect(), optimal)
            }
            TourOutcome::Found { .. } => {
                log::warn!("tour search returned an invalid order, using greedy order");
                (greedy_order(graph), false)
            }
            TourOutcome::Infeasible => {
                log::warn!("tour search reported the instance infeasible");
                return Err(TourError::Infeasible);
            }
            TourOutcome::TimedOut => {
                log::warn!("tour search timed out, using greedy order");
                (greedy_order(graph), false)
            }
        };

        Self::from_order(graph, order, engine_optimal)
    }

    fn from_order(
        graph: &CoverageGraph,
        order: Vec<TileId>,
        engine_optimal: bool,
    ) -> Result<CoverageTour, TourError> {
        let walk = close_walk(graph, &order)?;
        let solution = Solution::from_walk(graph, &walk);
        let ub = graph.objective(&solution);
        log::info!(
            "initial tour: {} cities, {} visits, cost {:.4}",
            order.len(),
            walk.len(),
            ub
        );
        Ok(CoverageTour {
            ub,
            engine_optimal,
            order,
            walk,
            solution,
        })
    }
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    let mut seen = vec![false; n];
    order.len() == n
        && order
            .iter()
            .all(|&c| c < n && !std::mem::replace(&mut seen[c], true))
}

/// Nearest-unvisited-neighbor order over the tiles that need coverage,
/// starting at the smallest id. Ties go to the smaller id.
pub fn greedy_order(graph: &CoverageGraph) -> Vec<TileId> {
    let mut remaining: Vec<TileId> = graph.mandatory().collect();
    let mut order = Vec::with_capacity(remaining.len());
    if remaining.is_empty() {
        return order;
    }
    let mut current = remaining.remove(0);
    order.push(current);

    while !remaining.is_empty() {
        let mut best = 0;
        for (i, &candidate) in remaining.iter().enumerate().skip(1) {
            let d = graph.center_distance(current, candidate);
            if d < graph.center_distance(current, remaining[best]) {
                best = i;
            }
        }
        current = remaining.remove(best);
        order.push(current);
    }
    order
}

/// Close a city order into a walk over adjacent tiles. Non-adjacent
/// consecutive cities are joined by shortest paths.
fn close_walk(graph: &CoverageGraph, order: &[TileId]) -> Result<Vec<TileId>, TourError> {
    if let [single] = order {
        let back = graph
            .neighbors(*single)
            .first()
            .copied()
            .ok_or(TourError::Infeasible)?;
        return Ok(vec![*single, back]);
    }

    let dual = dual_graph(graph);
    let mut walk = Vec::with_capacity(order.len());
    for (i, &from) in order.iter().enumerate() {
        let to = order[(i + 1) % order.len()];
        walk.push(from);
        if graph.are_neighbors(from, to) {
            continue;
        }
        let goal = NodeIndex::new(to.index());
        let target = graph.tile(to).center;
        let (_, path) = astar(
            &dual,
            NodeIndex::new(from.index()),
            |n| n == goal,
            |e| *e.weight(),
            |n| graph.tiles()[n.index()].center.manhattan(&target),
        )
        .ok_or(TourError::Infeasible)?;
        walk.extend(
            path[1..path.len() - 1]
                .iter()
                .map(|n| TileId(n.index())),
        );
    }
    Ok(walk)
}

/// The adjacency graph with Manhattan edge weights; node `i` is tile `i`.
fn dual_graph(graph: &CoverageGraph) -> UnGraph<TileId, f64> {
    let mut dual = UnGraph::with_capacity(graph.tile_count(), graph.tile_count() * 2);
    for tile in graph.tiles() {
        dual.add_node(tile.id);
    }
    for (a, b) in graph.edges() {
        dual.add_edge(
            NodeIndex::new(a.index()),
            NodeIndex::new(b.index()),
            graph.center_distance(a, b),
        );
    }
    dual
}
