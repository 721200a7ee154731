//! Tests for coverage-graph construction and validation.

use puzzle_tour::error::GraphError;
use puzzle_tour::geometry::{Path, Point};
use puzzle_tour::graph::{CoverageGraph, PieceKey, TileId};
use puzzle_tour::grid::PieceSpec;
use puzzle_tour::square::{square_catalogue, SquareGrid};
use std::collections::BTreeSet;

const R: f64 = 0.5;
const TURN: f64 = 2.651308592 * R;
const U_TURN: f64 = 3.222365414 * R;

/// Creates a full 3x3 square grid with unit tiles.
fn create_test_grid() -> SquareGrid {
    SquareGrid::parse("###\n###\n###", 1.0)
}

fn create_test_graph() -> CoverageGraph {
    let square = create_test_grid();
    CoverageGraph::build(&square.grid, &square.catalogue).expect("valid grid")
}

#[test]
fn test_connected_grid_checks() {
    let graph = create_test_graph();

    assert!(graph.check());
    assert_eq!(graph.tile_count(), 9);
    assert_eq!(graph.mandatory_count(), 9);
    assert_eq!(graph.edges().count(), 12);
}

#[test]
fn test_isolated_tile_fails_check() {
    let mut square = create_test_grid();
    square.grid.isolate(4);
    let catalogue = square_catalogue(&square.grid, 1.0);

    let graph = CoverageGraph::assemble(&square.grid, &catalogue).expect("structurally valid");
    assert!(!graph.check());
    match graph.validate() {
        Err(GraphError::InconsistentGrid { tile, .. }) => assert_eq!(tile, Some(TileId(4))),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_disjoint_blocks_are_disconnected() {
    let square = SquareGrid::parse("## ##", 1.0);

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    assert_eq!(
        result.err(),
        Some(GraphError::Disconnected { components: 2 })
    );
}

#[test]
fn test_asymmetric_adjacency_is_rejected() {
    let mut square = SquareGrid::parse("##\n##", 1.0);
    // Tile 3 claims tile 0 as neighbor, but not the other way round.
    let point = square.grid.tiles[0].center.midpoint(&square.grid.tiles[3].center);
    square.grid.tiles[3].transitions.push((0, point));

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    assert!(matches!(result, Err(GraphError::InconsistentGrid { .. })));
}

#[test]
fn test_missing_piece_is_rejected() {
    let mut square = create_test_grid();
    let index = square
        .catalogue
        .pieces
        .iter()
        .position(|p| p.tile == 4 && p.full && p.entry != p.exit)
        .expect("center has turning pieces");
    square.catalogue.pieces.remove(index);

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    match result {
        Err(GraphError::InconsistentGrid { tile, reason }) => {
            assert_eq!(tile, Some(TileId(4)));
            assert!(reason.contains("missing piece"));
        }
        other => panic!("unexpected result: {:?}", other.map(|g| g.tile_count())),
    }
}

#[test]
fn test_full_piece_on_phantom_tile_is_rejected() {
    let mut square = SquareGrid::parse("#.", 1.0);
    let transition = square.grid.tiles[1].transitions[0].1;
    square.catalogue.add(PieceSpec {
        tile: 1,
        entry: 0,
        exit: 0,
        full: true,
        path: Path::new(vec![transition, transition]),
        cost: 1.0,
    });

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    assert!(matches!(result, Err(GraphError::InconsistentGrid { .. })));
}

#[test]
fn test_piece_endpoints_must_match_transitions() {
    let mut square = SquareGrid::parse("##", 1.0);
    for piece in square.catalogue.pieces.iter_mut().filter(|p| p.tile == 0) {
        piece.path = Path::new(vec![Point::new(-3.0, -3.0), Point::new(-3.0, -3.0)]);
    }

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    assert!(matches!(result, Err(GraphError::InconsistentGrid { .. })));
}

#[test]
fn test_no_mandatory_tile_is_rejected() {
    let square = SquareGrid::parse("..", 1.0);

    let result = CoverageGraph::build(&square.grid, &square.catalogue);
    assert!(matches!(
        result,
        Err(GraphError::InconsistentGrid { tile: None, .. })
    ));
}

#[test]
fn test_pieces_at_tile() {
    let graph = create_test_graph();

    // Corner: two neighbors give three pairs, each passing and full.
    assert_eq!(graph.pieces_at(TileId(0)).count(), 6);
    // Center: four neighbors give ten pairs.
    assert_eq!(graph.pieces_at(TileId(4)).count(), 20);

    for key in graph.pieces_at(TileId(4)) {
        assert!(key.a <= key.b);
        assert!(graph.piece(&key).is_some(), "missing {}", key);
    }
}

#[test]
fn test_phantom_tiles_only_have_passing_pieces() {
    let square = SquareGrid::parse("#.\n##", 1.0);
    let graph = CoverageGraph::build(&square.grid, &square.catalogue).expect("valid grid");

    let phantom = graph
        .tiles()
        .iter()
        .find(|t| !t.mandatory)
        .expect("one phantom tile");
    assert!(graph.pieces_at(phantom.id).all(|k| !k.full));
    assert_eq!(graph.mandatory_count(), 3);
}

#[test]
fn test_piece_costs() {
    let graph = create_test_graph();
    let (left, center, right, up) = (TileId(3), TileId(4), TileId(5), TileId(1));

    let straight = PieceKey::new(left, center, right, true);
    assert!((graph.cost(&straight) - 1.0).abs() < 1e-9);

    let turn = PieceKey::new(left, center, up, true);
    assert!((graph.cost(&turn) - TURN).abs() < 1e-9);
    assert_eq!(graph.turns(&turn), 1);
    assert_eq!(graph.turns(&PieceKey::new(left, center, left, true)), 2);

    let u_turn = PieceKey::new(left, center, left, true);
    assert!((graph.cost(&u_turn) - U_TURN).abs() < 1e-9);

    let passing_turn = PieceKey::new(left, center, up, false);
    assert!((graph.cost(&passing_turn) - 0.5f64.sqrt()).abs() < 1e-9);

    let passing_u_turn = PieceKey::new(left, center, left, false);
    assert_eq!(graph.cost(&passing_u_turn), 0.0);

    // Not adjacent: no such piece.
    let bogus = PieceKey::new(TileId(0), center, right, true);
    assert!(graph.cost(&bogus).is_infinite());
}

#[test]
fn test_full_pieces_run_between_transition_points() {
    let graph = create_test_graph();

    for tile in graph.tiles() {
        for key in graph.pieces_at(tile.id) {
            let piece = graph.piece(&key).expect("complete catalogue");
            let start = graph.transition(key.tile, key.a).expect("adjacent");
            let end = graph.transition(key.tile, key.b).expect("adjacent");
            assert!(piece.path.first().unwrap().approx_eq(&start.position));
            assert!(piece.path.last().unwrap().approx_eq(&end.position));
        }
    }
}

#[test]
fn test_transition_point_is_shared() {
    let graph = create_test_graph();

    let ab = graph.transition(TileId(0), TileId(1)).expect("adjacent");
    let ba = graph.transition(TileId(1), TileId(0)).expect("adjacent");
    assert_eq!(ab, ba);
    assert!(ab.position.approx_eq(&Point::new(1.0, 2.5)));
    assert!(graph.transition(TileId(0), TileId(4)).is_none());
}

#[test]
fn test_leaving_keys() {
    let graph = create_test_graph();
    let set: BTreeSet<TileId> = [TileId(0), TileId(1)].into_iter().collect();

    let leaving = graph.leaving(&set);
    assert!(!leaving.is_empty());
    for key in &leaving {
        assert!(set.contains(&key.tile));
        assert!(!set.contains(&key.a) || !set.contains(&key.b));
    }
    // Tile 0 only borders tiles 1 and 3, so its pieces leave iff they touch 3.
    let from_corner = leaving.iter().filter(|k| k.tile == TileId(0)).count();
    assert_eq!(from_corner, 4);
}

#[test]
fn test_neighbors_are_sorted_and_symmetric() {
    let graph = create_test_graph();

    for tile in graph.tiles() {
        let neighbors = graph.neighbors(tile.id);
        assert!(neighbors.windows(2).all(|w| w[0] < w[1]));
        for &n in neighbors {
            assert!(graph.are_neighbors(n, tile.id));
        }
    }
    assert_eq!(graph.neighbors(TileId(4)).len(), 4);
}
