//! The coverage graph: the dual graph over grid tiles together with the
//! catalogue of precomputed puzzle pieces.
//!
//! A piece is addressed by a [`PieceKey`]: the tile it lies in, the two
//! neighbor tiles whose shared transition points it connects, and whether it
//! fully covers the tile or only passes through. The graph owns every piece in
//! an arena; solutions only ever hold keys.

use crate::error::GraphError;
use crate::geometry::{Path, Point};
use crate::grid::{Grid, PieceCatalogue};
use crate::solution::Solution;
use itertools::Itertools;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Dense index of a tile in the coverage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub usize);

impl TileId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A grid cell of the dual graph.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub coord: (i32, i32),
    pub center: Point,
    /// Inside the polygon, hence must be covered exactly once.
    pub mandatory: bool,
    neighbors: Vec<TileId>,
    /// Transition points as declared by the provider for this tile.
    gates: Vec<(TileId, Point)>,
}

impl Tile {
    /// Adjacent tiles in ascending order.
    pub fn neighbors(&self) -> &[TileId] {
        &self.neighbors
    }
}

/// A boundary position shared by two adjacent tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionPoint {
    /// The two tiles, smaller id first.
    pub tiles: (TileId, TileId),
    pub position: Point,
}

/// Address of a puzzle piece: tile `tile`, entered/left through the
/// transition points shared with `a` and `b` (`a <= b`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceKey {
    pub tile: TileId,
    pub a: TileId,
    pub b: TileId,
    pub full: bool,
}

impl PieceKey {
    /// Key of the piece used when travelling `entry -> tile -> exit`.
    pub fn new(entry: TileId, tile: TileId, exit: TileId, full: bool) -> Self {
        let (a, b) = if entry <= exit {
            (entry, exit)
        } else {
            (exit, entry)
        };
        PieceKey { tile, a, b, full }
    }

    /// Entry and exit are the same transition point.
    pub fn is_u_turn(&self) -> bool {
        self.a == self.b
    }

    pub fn with_full(self, full: bool) -> Self {
        PieceKey { full, ..self }
    }

    pub fn touches(&self, tile: TileId) -> bool {
        self.a == tile || self.b == tile
    }

    /// The opposite end of the piece when entering from `from`.
    pub fn other(&self, from: TileId) -> TileId {
        if from == self.a {
            self.b
        } else {
            self.a
        }
    }

    /// Number of piece ends at the transition point towards `neighbor`.
    pub fn ends_towards(&self, neighbor: TileId) -> usize {
        usize::from(self.a == neighbor) + usize::from(self.b == neighbor)
    }

    /// The two dual-graph edges the piece uses, each with the smaller id first.
    pub fn edges(&self) -> [(TileId, TileId); 2] {
        [ordered(self.a, self.tile), ordered(self.tile, self.b)]
    }
}

impl fmt::Display for PieceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} <- {} -> {})", self.a, self.tile, self.b)?;
        if self.full {
            write!(f, "[full]")?;
        }
        Ok(())
    }
}

/// Index into the piece arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PieceId(u32);

/// A precomputed trajectory through one tile. Immutable once built.
#[derive(Debug, Clone)]
pub struct PuzzlePiece {
    pub key: PieceKey,
    /// Trajectory from the transition point towards `key.a` to the one towards `key.b`.
    pub path: Path,
    pub cost: f64,
    pub turns: usize,
}

impl PuzzlePiece {
    /// The trajectory oriented for a traversal that enters from `entry`.
    pub fn path_from(&self, entry: TileId) -> Path {
        if entry == self.key.a {
            self.path.clone()
        } else {
            self.path.reversed()
        }
    }
}

pub(crate) fn ordered(a: TileId, b: TileId) -> (TileId, TileId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Dual graph over grid tiles plus the puzzle-piece catalogue.
#[derive(Debug, Clone)]
pub struct CoverageGraph {
    tiles: Vec<Tile>,
    transitions: HashMap<(TileId, TileId), TransitionPoint>,
    pieces: Vec<PuzzlePiece>,
    index: HashMap<PieceKey, PieceId>,
}

impl CoverageGraph {
    /// Assemble and validate a coverage graph.
    pub fn build(grid: &Grid, catalogue: &PieceCatalogue) -> Result<Self, GraphError> {
        let graph = Self::assemble(grid, catalogue)?;
        graph.validate()?;
        log::debug!(
            "coverage graph: {} tiles ({} mandatory), {} pieces",
            graph.tiles.len(),
            graph.mandatory_count(),
            graph.pieces.len()
        );
        Ok(graph)
    }

    /// Assemble the graph without the consistency checks of [`Self::validate`].
    ///
    /// Only structural problems (indices out of range, duplicate entries) are
    /// rejected here.
    pub fn assemble(grid: &Grid, catalogue: &PieceCatalogue) -> Result<Self, GraphError> {
        let n = grid.tiles.len();
        let mut tiles = Vec::with_capacity(n);
        let mut transitions = HashMap::new();

        for (i, grid_tile) in grid.tiles.iter().enumerate() {
            let id = TileId(i);
            let mut gates = Vec::with_capacity(grid_tile.transitions.len());
            for &(j, point) in &grid_tile.transitions {
                if j >= n || j == i {
                    return Err(GraphError::inconsistent(
                        Some(id),
                        format!("invalid neighbor index {}", j),
                    ));
                }
                if gates.iter().any(|&(t, _)| t == TileId(j)) {
                    return Err(GraphError::inconsistent(
                        Some(id),
                        format!("duplicate adjacency with #{}", j),
                    ));
                }
                gates.push((TileId(j), point));
                transitions
                    .entry(ordered(id, TileId(j)))
                    .or_insert(TransitionPoint {
                        tiles: ordered(id, TileId(j)),
                        position: point,
                    });
            }
            gates.sort_by_key(|&(t, _)| t);
            let neighbors = gates.iter().map(|&(t, _)| t).collect();

            tiles.push(Tile {
                id,
                coord: grid_tile.coord,
                center: grid_tile.center,
                mandatory: grid_tile.in_polygon,
                neighbors,
                gates,
            });
        }

        let mut pieces = Vec::with_capacity(catalogue.pieces.len());
        let mut index = HashMap::with_capacity(catalogue.pieces.len());
        for spec in &catalogue.pieces {
            if spec.tile >= n || spec.entry >= n || spec.exit >= n {
                return Err(GraphError::inconsistent(
                    None,
                    format!(
                        "piece ({} <- {} -> {}) refers to an unknown tile",
                        spec.entry, spec.tile, spec.exit
                    ),
                ));
            }
            let key = PieceKey::new(
                TileId(spec.entry),
                TileId(spec.tile),
                TileId(spec.exit),
                spec.full,
            );
            let path = if spec.entry <= spec.exit {
                spec.path.clone()
            } else {
                spec.path.reversed()
            };
            let id = PieceId(pieces.len() as u32);
            if index.insert(key, id).is_some() {
                return Err(GraphError::inconsistent(
                    Some(key.tile),
                    format!("duplicate piece {}", key),
                ));
            }
            let turns = path.turn_count();
            pieces.push(PuzzlePiece {
                key,
                path,
                cost: spec.cost,
                turns,
            });
        }

        Ok(CoverageGraph {
            tiles,
            transitions,
            pieces,
            index,
        })
    }

    /// Verify adjacency symmetry, catalogue completeness and connectivity.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.mandatory_count() == 0 {
            return Err(GraphError::inconsistent(None, "no tile requires coverage"));
        }
        self.validate_adjacency()?;
        self.validate_catalogue()?;
        self.validate_connectivity()
    }

    /// `true` iff [`Self::validate`] passes.
    pub fn check(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate_adjacency(&self) -> Result<(), GraphError> {
        for tile in &self.tiles {
            for &(n, point) in &tile.gates {
                let back = self.tiles[n.0].gates.iter().find(|&&(t, _)| t == tile.id);
                match back {
                    None => {
                        return Err(GraphError::inconsistent(
                            Some(tile.id),
                            format!("adjacency with {} is not symmetric", n),
                        ))
                    }
                    Some((_, other)) if !other.approx_eq(&point) => {
                        return Err(GraphError::inconsistent(
                            Some(tile.id),
                            format!("transition point shared with {} disagrees", n),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn validate_catalogue(&self) -> Result<(), GraphError> {
        for tile in &self.tiles {
            if tile.neighbors.is_empty() {
                return Err(GraphError::inconsistent(
                    Some(tile.id),
                    "no admissible piece: tile has no neighbors",
                ));
            }
            for key in self.pieces_at(tile.id) {
                if self.index.contains_key(&key) || (key.is_u_turn() && !key.full) {
                    continue;
                }
                return Err(GraphError::inconsistent(
                    Some(tile.id),
                    format!("missing piece {}", key),
                ));
            }
        }

        for piece in &self.pieces {
            let key = piece.key;
            let tile = &self.tiles[key.tile.0];
            if key.full && !tile.mandatory {
                return Err(GraphError::inconsistent(
                    Some(key.tile),
                    format!("full piece {} on a tile outside the polygon", key),
                ));
            }
            let (Some(start), Some(end)) = (
                self.transition(key.tile, key.a),
                self.transition(key.tile, key.b),
            ) else {
                return Err(GraphError::inconsistent(
                    Some(key.tile),
                    format!("piece {} connects non-adjacent tiles", key),
                ));
            };
            let endpoints_match = match (piece.path.first(), piece.path.last()) {
                (Some(first), Some(last)) => {
                    first.approx_eq(&start.position) && last.approx_eq(&end.position)
                }
                _ => false,
            };
            if !endpoints_match {
                return Err(GraphError::inconsistent(
                    Some(key.tile),
                    format!("piece {} does not end on its transition points", key),
                ));
            }
        }
        Ok(())
    }

    fn validate_connectivity(&self) -> Result<(), GraphError> {
        let components = self.component_count();
        if components > 1 {
            return Err(GraphError::Disconnected { components });
        }
        Ok(())
    }

    fn component_count(&self) -> usize {
        let mut sets = UnionFind::<usize>::new(self.tiles.len());
        for (a, b) in self.edges() {
            sets.union(a.0, b.0);
        }
        let roots: HashSet<usize> = (0..self.tiles.len()).map(|i| sets.find(i)).collect();
        roots.len()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.0]
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn neighbors(&self, id: TileId) -> &[TileId] {
        &self.tiles[id.0].neighbors
    }

    pub fn are_neighbors(&self, a: TileId, b: TileId) -> bool {
        self.tiles[a.0].neighbors.binary_search(&b).is_ok()
    }

    pub fn is_mandatory(&self, id: TileId) -> bool {
        self.tiles[id.0].mandatory
    }

    /// Tiles that must be covered.
    pub fn mandatory(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().filter(|t| t.mandatory).map(|t| t.id)
    }

    pub fn mandatory_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.mandatory).count()
    }

    /// Every adjacency once, smaller id first.
    pub fn edges(&self) -> impl Iterator<Item = (TileId, TileId)> + '_ {
        self.tiles.iter().flat_map(|t| {
            t.neighbors
                .iter()
                .filter(move |&&n| t.id < n)
                .map(move |&n| (t.id, n))
        })
    }

    /// The transition point between two adjacent tiles.
    pub fn transition(&self, a: TileId, b: TileId) -> Option<&TransitionPoint> {
        self.transitions.get(&ordered(a, b))
    }

    pub fn piece(&self, key: &PieceKey) -> Option<&PuzzlePiece> {
        self.index.get(key).map(|id| &self.pieces[id.0 as usize])
    }

    /// Every admissible piece key at a tile: for each unordered pair of
    /// neighbors (equal pairs included) one passing key and, on tiles inside
    /// the polygon, one full key.
    pub fn pieces_at(&self, tile: TileId) -> impl Iterator<Item = PieceKey> + '_ {
        let mandatory = self.tiles[tile.0].mandatory;
        self.tiles[tile.0]
            .neighbors
            .iter()
            .combinations_with_replacement(2)
            .flat_map(move |pair| {
                let passing = PieceKey::new(*pair[0], tile, *pair[1], false);
                let full = mandatory.then(|| passing.with_full(true));
                std::iter::once(passing).chain(full)
            })
    }

    /// Keys at tiles of `set` that touch a tile outside of it.
    pub fn leaving(&self, set: &BTreeSet<TileId>) -> Vec<PieceKey> {
        set.iter()
            .flat_map(|&v| self.pieces_at(v))
            .filter(|key| !set.contains(&key.a) || !set.contains(&key.b))
            .collect()
    }

    /// Cost of a piece. A passing U-turn without catalogue entry is free;
    /// any other missing piece is unusable.
    pub fn cost(&self, key: &PieceKey) -> f64 {
        match self.piece(key) {
            Some(piece) => piece.cost,
            None if key.is_u_turn() && !key.full => 0.0,
            None => f64::INFINITY,
        }
    }

    /// Turn count of a piece (zero for implicit passing U-turns).
    pub fn turns(&self, key: &PieceKey) -> usize {
        self.piece(key).map_or(0, |p| p.turns)
    }

    /// Extra cost of covering the tile on this traversal instead of passing it.
    pub fn relative_cost(&self, entry: TileId, tile: TileId, exit: TileId) -> f64 {
        let passing = PieceKey::new(entry, tile, exit, false);
        self.cost(&passing.with_full(true)) - self.cost(&passing)
    }

    /// Manhattan distance between tile centers.
    pub fn center_distance(&self, a: TileId, b: TileId) -> f64 {
        self.tiles[a.0].center.manhattan(&self.tiles[b.0].center)
    }

    /// Total tour cost: the sum of its piece costs. Pieces end on the shared
    /// transition points, so connectors add nothing.
    pub fn objective(&self, solution: &Solution) -> f64 {
        solution
            .visits()
            .iter()
            .map(|visit| self.cost(&visit.key()))
            .sum()
    }
}
