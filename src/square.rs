//! A square-cell grid provider.
//!
//! Builds a [`Grid`] and a complete [`PieceCatalogue`] from a character
//! layout. Full pieces follow a fixed set of shapes (straight, left/right turn,
//! U-turn) expressed in a local frame where the tile is entered from the
//! bottom; passing pieces run straight between the two transition points.

use crate::geometry::{Path, Point, COORD_EPS};
use crate::grid::{Grid, GridTile, PieceCatalogue, PieceSpec};
use itertools::Itertools;

/// Length of a full straight piece, in multiples of half the side length.
const STRAIGHT_COST: f64 = 2.0;
/// Length of a full turn piece, in multiples of half the side length.
const TURN_COST: f64 = 2.651308592;
/// Length of a full U-turn piece, in multiples of half the side length.
const U_TURN_COST: f64 = 3.222365414;

const TURN_BEND: (f64, f64) = (0.7071067812 - 1.0, 1.292893219);
const U_TURN_BEND: (f64, f64) = (0.234920168, 1.356064560);

/// A square-cell grid together with its piece catalogue.
#[derive(Debug, Clone)]
pub struct SquareGrid {
    pub side: f64,
    pub grid: Grid,
    pub catalogue: PieceCatalogue,
}

impl SquareGrid {
    /// Parse a layout: one text line per row, the first line on top.
    ///
    /// `#` marks a cell inside the polygon, `.` a cell outside of it that may
    /// still be passed, anything else is not part of the grid.
    pub fn parse(layout: &str, side: f64) -> Self {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let height = rows.len() as i32;

        let mut grid = Grid::new();
        for (r, row) in rows.iter().enumerate() {
            let j = height - 1 - r as i32;
            for (i, c) in row.chars().enumerate() {
                let in_polygon = match c {
                    '#' => true,
                    '.' => false,
                    _ => continue,
                };
                let i = i as i32;
                let center = Point::new((i as f64 + 0.5) * side, (j as f64 + 0.5) * side);
                grid.add_tile(GridTile::new((i, j), center, in_polygon));
            }
        }

        for a in 0..grid.len() {
            let (i, j) = grid.tiles[a].coord;
            for coord in [(i + 1, j), (i, j + 1)] {
                if let Some(b) = grid.find(coord) {
                    let point = grid.tiles[a].center.midpoint(&grid.tiles[b].center);
                    grid.connect(a, b, point);
                }
            }
        }

        let catalogue = square_catalogue(&grid, side);
        log::debug!(
            "parsed square grid: {} tiles, {} pieces",
            grid.len(),
            catalogue.len()
        );

        SquareGrid {
            side,
            grid,
            catalogue,
        }
    }
}

/// All pieces for every tile and every unordered pair of its neighbors.
pub fn square_catalogue(grid: &Grid, side: f64) -> PieceCatalogue {
    let r = 0.5 * side;
    let mut catalogue = PieceCatalogue::new();

    for (t, tile) in grid.tiles.iter().enumerate() {
        let mut gates = tile.transitions.clone();
        gates.sort_by_key(|&(n, _)| n);

        for pair in gates.iter().combinations_with_replacement(2) {
            let (entry, p) = *pair[0];
            let (exit, q) = *pair[1];

            catalogue.add(PieceSpec {
                tile: t,
                entry,
                exit,
                full: false,
                path: Path::new(vec![p, q]),
                cost: p.distance(&q),
            });

            if tile.in_polygon {
                let (path, cost) = full_piece(tile.center, p, q, r);
                catalogue.add(PieceSpec {
                    tile: t,
                    entry,
                    exit,
                    full: true,
                    path,
                    cost,
                });
            }
        }
    }
    catalogue
}

/// Shape of a full piece entering at `entry` and leaving at `exit`.
fn full_piece(center: Point, entry: Point, exit: Point, r: f64) -> (Path, f64) {
    // Local frame: y points from the entry towards the center, x to the right.
    let forward = ((center.x - entry.x) / r, (center.y - entry.y) / r);
    let right = (forward.1, -forward.0);
    let to_world = |lx: f64, ly: f64| {
        Point::new(
            entry.x + (lx * right.0 + ly * forward.0) * r,
            entry.y + (lx * right.1 + ly * forward.1) * r,
        )
    };

    if entry.approx_eq(&exit) {
        let path = vec![
            entry,
            to_world(-U_TURN_BEND.0, U_TURN_BEND.1),
            to_world(U_TURN_BEND.0, U_TURN_BEND.1),
            exit,
        ];
        return (Path::new(path), U_TURN_COST * r);
    }

    let out = ((exit.x - center.x) / r, (exit.y - center.y) / r);
    let side = out.0 * right.0 + out.1 * right.1;
    if side.abs() < COORD_EPS {
        return (Path::new(vec![entry, exit]), STRAIGHT_COST * r);
    }

    // Left turns mirror the right-turn shape.
    let mirror = side.signum();
    let path = vec![
        entry,
        to_world(mirror * TURN_BEND.0, TURN_BEND.1),
        exit,
    ];
    (Path::new(path), TURN_COST * r)
}
