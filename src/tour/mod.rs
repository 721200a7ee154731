//! Initial tour construction.
//!
//! A tour-search engine orders the tiles that need coverage; the order is then
//! closed into a walk over the dual graph and dressed with puzzle pieces.

pub mod coverage;
pub mod two_opt;

pub use coverage::{greedy_order, CoverageTour, TourWithCoverageSolver};
pub use two_opt::TwoOptTourSearch;

use crate::deadline::Deadline;

/// Result of a tour-search call.
#[derive(Debug, Clone, PartialEq)]
pub enum TourOutcome {
    /// A permutation of the city indices.
    Found { order: Vec<usize>, optimal: bool },
    /// The engine proved that no tour exists.
    Infeasible,
    /// The deadline expired before any tour was found.
    TimedOut,
}

/// A symmetric traveling-salesman engine over a full weight matrix.
pub trait TourSearch {
    fn search(&mut self, weights: &[Vec<f64>], deadline: Deadline) -> TourOutcome;
}
