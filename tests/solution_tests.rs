//! Tests for tour validation, coverage assignment and cycle extraction.

use puzzle_tour::error::SolutionError;
use puzzle_tour::graph::{CoverageGraph, PieceKey, TileId};
use puzzle_tour::solution::{cycles_from_pieces, Solution, Visit};
use puzzle_tour::square::SquareGrid;

const R: f64 = 0.5;
const TURN: f64 = 2.651308592 * R;
const U_TURN: f64 = 3.222365414 * R;

fn create_test_graph(layout: &str) -> CoverageGraph {
    let square = SquareGrid::parse(layout, 1.0);
    CoverageGraph::build(&square.grid, &square.catalogue).expect("valid grid")
}

fn walk(ids: &[usize]) -> Vec<TileId> {
    ids.iter().map(|&i| TileId(i)).collect()
}

/// The ring around the hole of "###\n# #\n###".
fn create_ring_solution(graph: &CoverageGraph) -> Solution {
    Solution::from_walk(graph, &walk(&[0, 1, 2, 4, 7, 6, 5, 3]))
}

/// The 3x3 boundary ring with a U-turn into the center from the left.
fn create_spike_solution(graph: &CoverageGraph) -> Solution {
    Solution::from_walk(graph, &walk(&[0, 1, 2, 5, 8, 7, 6, 3, 4, 3]))
}

#[test]
fn test_ring_from_walk_is_feasible() {
    let graph = create_test_graph("###\n# #\n###");
    let solution = create_ring_solution(&graph);

    assert_eq!(solution.validate(&graph), Ok(()));
    assert_eq!(solution.len(), 8);
    assert!(solution.visits().iter().all(|v| v.full));
    assert!((graph.objective(&solution) - (4.0 * TURN + 4.0)).abs() < 1e-6);
    assert_eq!(solution.turn_count(&graph), 4);
}

#[test]
fn test_spike_covers_each_tile_once() {
    let graph = create_test_graph("###\n###\n###");
    let solution = create_spike_solution(&graph);

    assert!(solution.is_feasible(&graph));
    assert_eq!(solution.len(), 10);
    assert_eq!(solution.visits().iter().filter(|v| v.full).count(), 9);

    let expected = 5.0 * TURN + 3.0 + 0.5_f64.sqrt() + U_TURN;
    assert!((solution.cost(&graph) - expected).abs() < 1e-6);
}

#[test]
fn test_coverage_tie_goes_to_smaller_entry_point() {
    let graph = create_test_graph("###\n###\n###");
    let solution = create_spike_solution(&graph);

    // Both visits of tile 3 are turns; the one entered from below enters at
    // the smaller transition point.
    let visits: Vec<&Visit> = solution
        .visits()
        .iter()
        .filter(|v| v.tile == TileId(3))
        .collect();
    assert_eq!(visits.len(), 2);
    let full: Vec<&&Visit> = visits.iter().filter(|v| v.full).collect();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].entry, TileId(6));
    assert_eq!(full[0].exit, TileId(4));
}

#[test]
fn test_too_short_solution() {
    let graph = create_test_graph("###\n###\n###");

    let empty = Solution::new(Vec::new());
    assert_eq!(empty.validate(&graph), Err(SolutionError::TooShort(0)));
    assert!(empty.is_empty());
}

#[test]
fn test_broken_chain_is_rejected() {
    let graph = create_test_graph("###\n# #\n###");
    let mut visits = create_ring_solution(&graph).into_visits();
    visits.swap(2, 3);

    let result = Solution::new(visits).validate(&graph);
    assert!(matches!(result, Err(SolutionError::Broken { .. })));
}

#[test]
fn test_non_adjacent_jump_is_unknown_piece() {
    let graph = create_test_graph("###\n###\n###");
    let visits = vec![
        Visit::new(TileId(4), TileId(0), TileId(4), true),
        Visit::new(TileId(0), TileId(4), TileId(0), true),
    ];

    let result = Solution::new(visits).validate(&graph);
    assert_eq!(result, Err(SolutionError::UnknownPiece { index: 0 }));
}

#[test]
fn test_uncovered_tile_is_rejected() {
    let graph = create_test_graph("###\n# #\n###");
    let mut visits = create_ring_solution(&graph).into_visits();
    visits[1].full = false;

    let result = Solution::new(visits).validate(&graph);
    assert_eq!(
        result,
        Err(SolutionError::CoverageCount {
            tile: TileId(1),
            count: 0
        })
    );
}

#[test]
fn test_phantom_tile_is_never_covered() {
    // Tile 1 lies outside the polygon.
    let graph = create_test_graph("#.\n##");
    let solution = Solution::from_walk(&graph, &walk(&[0, 1, 3, 2]));
    assert!(solution.is_feasible(&graph));
    assert!(!solution.visits()[1].full);

    let mut visits = solution.into_visits();
    visits[1].full = true;
    let result = Solution::new(visits).validate(&graph);
    assert_eq!(
        result,
        Err(SolutionError::PhantomCovered { tile: TileId(1) })
    );
}

#[test]
fn test_cycles_from_pieces_rebuilds_tour() {
    let graph = create_test_graph("###\n###\n###");
    let solution = create_spike_solution(&graph);
    let mut keys: Vec<PieceKey> = solution.visits().iter().map(|v| v.key()).collect();
    keys.reverse();

    let cycles = cycles_from_pieces(&keys);
    assert_eq!(cycles.len(), 1);

    let rebuilt = Solution::new(cycles.into_iter().next().expect("one cycle"));
    assert!(rebuilt.is_feasible(&graph));
    assert_eq!(rebuilt.len(), solution.len());
    assert!((graph.objective(&rebuilt) - graph.objective(&solution)).abs() < 1e-9);
}

#[test]
fn test_cycles_from_pieces_splits_disjoint_rings() {
    let graph = create_test_graph("##.##\n##.##");
    // Two 2x2 blocks joined only through the phantom middle column.
    let left = Solution::from_walk(&graph, &walk(&[0, 1, 6, 5]));
    let right = Solution::from_walk(&graph, &walk(&[3, 4, 9, 8]));
    let keys: Vec<PieceKey> = left
        .visits()
        .iter()
        .chain(right.visits())
        .map(|v| v.key())
        .collect();

    let cycles = cycles_from_pieces(&keys);
    assert_eq!(cycles.len(), 2);
    assert!(cycles.iter().all(|c| c.len() == 4));
}

#[test]
fn test_cycles_meeting_at_a_point_are_spliced() {
    let graph = create_test_graph("###");
    let t = TileId;
    let keys = vec![
        // Back and forth between tiles 0 and 1.
        PieceKey::new(t(1), t(0), t(1), true),
        PieceKey::new(t(0), t(1), t(0), false),
        // Out to tile 2 and back, crossing the same transition point.
        PieceKey::new(t(1), t(0), t(1), false),
        PieceKey::new(t(0), t(1), t(2), true),
        PieceKey::new(t(1), t(2), t(1), true),
        PieceKey::new(t(2), t(1), t(0), false),
    ];

    let cycles = cycles_from_pieces(&keys);
    assert_eq!(cycles.len(), 1);

    let tour = Solution::new(cycles.into_iter().next().expect("one cycle"));
    assert_eq!(tour.len(), 6);
    assert_eq!(tour.validate(&graph), Ok(()));
}

#[test]
fn test_path_is_closed_and_matches_cost() {
    let graph = create_test_graph("###\n###\n###");
    let solution = create_spike_solution(&graph);
    let path = solution.path(&graph);

    let first = path.first().expect("non-empty path");
    let last = path.last().expect("non-empty path");
    assert!(first.approx_eq(last));
    assert!((path.length() - graph.objective(&solution)).abs() < 1e-6);
}

#[test]
fn test_objective_is_deterministic() {
    let graph = create_test_graph("###\n###\n###");
    let solution = create_spike_solution(&graph);

    let first = graph.objective(&solution);
    let second = graph.objective(&solution.clone());
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_solution_serde_roundtrip() {
    let graph = create_test_graph("###\n# #\n###");
    let solution = create_ring_solution(&graph);

    let json = serde_json::to_string(&solution).expect("serializable");
    let restored: Solution = serde_json::from_str(&json).expect("deserializable");
    assert_eq!(restored, solution);
}

#[test]
fn test_debug_lists_visits() {
    let graph = create_test_graph("###\n# #\n###");
    let solution = create_ring_solution(&graph);

    let text = format!("{:?}", solution);
    assert!(text.starts_with("Solution:"));
}
