//! Planar points and polyline paths used by tiles and puzzle pieces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for comparing coordinates.
pub const COORD_EPS: f64 = 1e-6;

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Calculate the Euclidean distance between two points.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Calculate the Manhattan distance between two points.
    pub fn manhattan(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Midpoint of the segment between two points.
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new(0.5 * (self.x + other.x), 0.5 * (self.y + other.y))
    }

    /// Check whether two points coincide up to [`COORD_EPS`].
    pub fn approx_eq(&self, other: &Point) -> bool {
        self.distance(other) <= COORD_EPS
    }

    /// Lexicographic comparison by `x`, then `y`.
    pub fn lex_cmp(&self, other: &Point) -> std::cmp::Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// An ordered sequence of points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point>,
}

impl Path {
    pub fn new(points: Vec<Point>) -> Self {
        Path { points }
    }

    /// The same path walked in the opposite direction.
    pub fn reversed(&self) -> Path {
        let mut points = self.points.clone();
        points.reverse();
        Path { points }
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Length of the polyline through all points.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum()
    }

    /// Number of interior vertices where the direction changes.
    pub fn turn_count(&self) -> usize {
        // Repeated points carry no direction.
        let mut distinct: Vec<Point> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if distinct.last().map_or(true, |q| !q.approx_eq(p)) {
                distinct.push(*p);
            }
        }

        distinct
            .windows(3)
            .filter(|w| {
                let (ax, ay) = (w[1].x - w[0].x, w[1].y - w[0].y);
                let (bx, by) = (w[2].x - w[1].x, w[2].y - w[1].y);
                let cross = ax * by - ay * bx;
                let dot = ax * bx + ay * by;
                cross.abs() > COORD_EPS || dot < 0.0
            })
            .count()
    }
}
