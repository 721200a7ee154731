//! Input supplied by a grid/geometry provider.
//!
//! A [`Grid`] lists tiles with their adjacency and the transition points
//! shared with each neighbor. A [`PieceCatalogue`] lists the precomputed
//! puzzle pieces. Neither is checked here; [`crate::graph::CoverageGraph::build`]
//! does the validation.

use crate::geometry::{Path, Point};
use serde::{Deserialize, Serialize};

/// One tile of the provider's grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridTile {
    /// Integer grid coordinates.
    pub coord: (i32, i32),
    pub center: Point,
    /// Tiles inside the polygon must be covered; the others may only be passed.
    pub in_polygon: bool,
    /// `(neighbor index, shared transition point)` for each adjacent tile.
    pub transitions: Vec<(usize, Point)>,
}

impl GridTile {
    pub fn new(coord: (i32, i32), center: Point, in_polygon: bool) -> Self {
        GridTile {
            coord,
            center,
            in_polygon,
            transitions: Vec::new(),
        }
    }
}

/// The tile set with adjacency and polygon membership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grid {
    pub tiles: Vec<GridTile>,
}

impl Grid {
    pub fn new() -> Self {
        Grid { tiles: Vec::new() }
    }

    /// Add a tile and return its index.
    pub fn add_tile(&mut self, tile: GridTile) -> usize {
        self.tiles.push(tile);
        self.tiles.len() - 1
    }

    /// Connect two tiles through a shared transition point (both directions).
    pub fn connect(&mut self, a: usize, b: usize, point: Point) {
        self.tiles[a].transitions.push((b, point));
        self.tiles[b].transitions.push((a, point));
    }

    /// Remove every adjacency of a tile (both directions).
    pub fn isolate(&mut self, tile: usize) {
        self.tiles[tile].transitions.clear();
        for other in &mut self.tiles {
            other.transitions.retain(|&(n, _)| n != tile);
        }
    }

    /// Index of the tile at the given grid coordinates.
    pub fn find(&self, coord: (i32, i32)) -> Option<usize> {
        self.tiles.iter().position(|t| t.coord == coord)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// A precomputed piece for one tile between the transition points it shares
/// with `entry` and `exit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceSpec {
    pub tile: usize,
    pub entry: usize,
    pub exit: usize,
    /// Full coverage of the tile, as opposed to just passing through.
    pub full: bool,
    /// Trajectory from the entry transition point to the exit transition point.
    pub path: Path,
    pub cost: f64,
}

/// All pieces known for a grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PieceCatalogue {
    pub pieces: Vec<PieceSpec>,
}

impl PieceCatalogue {
    pub fn new() -> Self {
        PieceCatalogue { pieces: Vec::new() }
    }

    pub fn add(&mut self, piece: PieceSpec) {
        self.pieces.push(piece);
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}
