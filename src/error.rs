//! Error types.
//!
//! Construction-time violations are fatal and surface immediately. Timeouts
//! are never errors: every bounded operation hands back its best result.

use crate::graph::TileId;
use thiserror::Error;

/// The grid or piece catalogue cannot form a coverage graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("inconsistent grid at tile {tile:?}: {reason}")]
    InconsistentGrid { tile: Option<TileId>, reason: String },
    #[error("dual graph is disconnected ({components} components)")]
    Disconnected { components: usize },
}

impl GraphError {
    pub(crate) fn inconsistent(tile: Option<TileId>, reason: impl Into<String>) -> Self {
        GraphError::InconsistentGrid {
            tile,
            reason: reason.into(),
        }
    }
}

/// Tour construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourError {
    /// The tour-search engine declared the instance infeasible.
    #[error("tour search reported the instance infeasible")]
    Infeasible,
    #[error("no tile requires coverage")]
    EmptyInstance,
}

/// Refinement model failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// No feasible solution is known yet.
    #[error("no feasible solution available")]
    NoFeasibleSolution,
    /// The exact engine proved the model infeasible. For a connected graph
    /// this indicates a broken formulation.
    #[error("refinement model reported infeasible")]
    Infeasible,
    #[error("fixing tiles requires a warm-start solution")]
    FixingWithoutSolution,
    #[error("exact engine failure: {0}")]
    Engine(String),
}

/// A sequence of visits that is not a feasible coverage tour.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolutionError {
    #[error("a tour needs at least two visits, got {0}")]
    TooShort(usize),
    #[error("visit {index} does not connect to its successor")]
    Broken { index: usize },
    #[error("visit {index} uses a piece missing from the catalogue")]
    UnknownPiece { index: usize },
    #[error("tile {tile:?} is covered {count} times")]
    CoverageCount { tile: TileId, count: usize },
    #[error("tile {tile:?} lies outside the polygon but is covered")]
    PhantomCovered { tile: TileId },
}

/// Umbrella error for the full pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Tour(#[from] TourError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Solution(#[from] SolutionError),
}
