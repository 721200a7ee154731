//! Exact refinement of a tour through an integer program over piece counts.
//!
//! The program has one variable per admissible piece at each free tile:
//! coverage constraints pick one full piece per mandatory tile and flow
//! constraints balance the piece ends at every transition point. Subtours are
//! removed lazily by [`cuts::separate`] in a solve/separate loop.

pub mod cuts;
pub mod engine;
pub mod program;
pub mod variables;

pub use engine::GoodLpEngine;
pub use program::{
    EngineOutcome, EngineStatus, ExactEngine, IntegerProgram, LinearConstraint, LinearExpr, Sense,
    VarId, VarKind, VarSpec,
};

use crate::deadline::Deadline;
use crate::error::ModelError;
use crate::graph::{CoverageGraph, TileId};
use crate::solution::Solution;
use std::collections::BTreeSet;
use variables::PieceVariables;

/// Tolerance of the optimality test `lb >= ub - OPTIMALITY_EPS`.
pub const OPTIMALITY_EPS: f64 = 1e-6;

/// Best known objective (`ub`) and proven lower bound (`lb`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub ub: f64,
    pub lb: f64,
}

impl Bounds {
    pub fn unknown() -> Self {
        Bounds {
            ub: f64::INFINITY,
            lb: f64::NEG_INFINITY,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.ub.is_finite() && self.lb >= self.ub - OPTIMALITY_EPS
    }

    pub fn gap(&self) -> f64 {
        self.ub - self.lb
    }

    fn clamp(&mut self) {
        if self.lb > self.ub {
            self.lb = self.ub;
        }
    }
}

/// The refinement model over the whole graph or a free region of it.
pub struct RefinementModel<'g, E: ExactEngine = GoodLpEngine> {
    graph: &'g CoverageGraph,
    engine: E,
    program: IntegerProgram,
    vars: PieceVariables,
    free: BTreeSet<TileId>,
    incumbent: Option<Solution>,
    bounds: Bounds,
    optimized: bool,
    /// Solve/separate rounds performed.
    pub rounds: usize,
    /// Cuts added so far.
    pub cuts: usize,
}

impl<'g> RefinementModel<'g, GoodLpEngine> {
    /// Build the model with the default engine.
    ///
    /// With `fixed`, only the remaining tiles get variables; pieces at fixed
    /// tiles keep their counts in `warm_start`, which is then required.
    pub fn new(
        graph: &'g CoverageGraph,
        warm_start: Option<Solution>,
        fixed: Option<&BTreeSet<TileId>>,
    ) -> Result<Self, ModelError> {
        Self::with_engine(graph, warm_start, fixed, GoodLpEngine::new())
    }
}

impl<'g, E: ExactEngine> RefinementModel<'g, E> {
    pub fn with_engine(
        graph: &'g CoverageGraph,
        warm_start: Option<Solution>,
        fixed: Option<&BTreeSet<TileId>>,
        engine: E,
    ) -> Result<Self, ModelError> {
        let warm_start = match warm_start {
            Some(solution) if solution.is_feasible(graph) => Some(solution),
            Some(_) => {
                log::warn!("ignoring infeasible warm start");
                None
            }
            None => None,
        };
        let fixed_tiles = fixed.cloned().unwrap_or_default();
        if !fixed_tiles.is_empty() && warm_start.is_none() {
            return Err(ModelError::FixingWithoutSolution);
        }

        let free: BTreeSet<TileId> = graph
            .tiles()
            .iter()
            .map(|t| t.id)
            .filter(|id| !fixed_tiles.contains(id))
            .collect();

        let mut program = IntegerProgram::new();
        let vars = PieceVariables::build(graph, &mut program, &free, warm_start.as_ref());

        let mut objective =
            vars.weighted_sum(vars.vars().map(|(key, _)| (*key, graph.cost(key))));
        objective.add_constant(vars.fixed_cost(graph));
        program.set_objective(objective);

        add_coverage_constraints(graph, &vars, &free, &mut program);
        add_flow_constraints(graph, &vars, &free, &mut program);

        let mut bounds = Bounds::unknown();
        if let Some(solution) = &warm_start {
            bounds.ub = graph.objective(solution);
        }
        log::debug!(
            "refinement model: {} free tiles, {} variables, {} constraints",
            free.len(),
            program.variables().len(),
            program.constraints().len()
        );

        Ok(RefinementModel {
            graph,
            engine,
            program,
            vars,
            free,
            incumbent: warm_start,
            bounds,
            optimized: false,
            rounds: 0,
            cuts: 0,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn free_tiles(&self) -> &BTreeSet<TileId> {
        &self.free
    }

    /// All tiles are free.
    pub fn is_global(&self) -> bool {
        self.free.len() == self.graph.tile_count()
    }

    pub fn program(&self) -> &IntegerProgram {
        &self.program
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the solve/separate loop until optimality is proven or the deadline
    /// passes.
    pub fn optimize(&mut self, deadline: Deadline) -> Result<Bounds, ModelError> {
        self.optimized = true;

        while !self.bounds.is_optimal() {
            if deadline.expired() {
                log::debug!(
                    "refinement stopped at the deadline after {} rounds",
                    self.rounds
                );
                break;
            }

            let outcome = self.engine.solve(&self.program, deadline);
            self.rounds += 1;
            match &outcome.status {
                EngineStatus::Infeasible => {
                    log::error!("refinement model is infeasible");
                    return Err(ModelError::Infeasible);
                }
                EngineStatus::Failed(reason) => {
                    log::error!("exact engine failed: {}", reason);
                    return Err(ModelError::Engine(reason.clone()));
                }
                EngineStatus::TimedOut => break,
                EngineStatus::Optimal | EngineStatus::Feasible => {}
            }
            self.bounds.lb = self.bounds.lb.max(outcome.bound);

            let used = self.vars.used_keys(&outcome.values);
            let separation = cuts::separate(self.graph, &self.vars, &used);
            log::debug!(
                "round {}: relaxation {:.4}, {} full components, {} cuts",
                self.rounds,
                outcome.objective,
                separation.components,
                separation.cuts.len()
            );

            if let Some(visits) = separation.tour {
                // Without violated cuts another solve returns the same selection.
                self.offer(Solution::new(visits));
                break;
            }

            if separation.cuts.is_empty() {
                log::warn!("no violated cut found for a disconnected selection");
                break;
            }
            for cut in separation.cuts {
                self.program.add_constraint(cut.into_constraint(self.cuts));
                self.cuts += 1;
            }
        }

        self.bounds.clamp();
        log::debug!(
            "refinement bounds: ub {:.4}, lb {:.4}",
            self.bounds.ub,
            self.bounds.lb
        );
        Ok(self.bounds)
    }

    /// Keep `candidate` if it is feasible and strictly better.
    fn offer(&mut self, candidate: Solution) {
        if let Err(e) = candidate.validate(self.graph) {
            log::warn!("discarding extracted tour: {}", e);
            return;
        }
        let cost = self.graph.objective(&candidate);
        if cost < self.bounds.ub - OPTIMALITY_EPS || self.incumbent.is_none() {
            self.bounds.ub = cost;
            self.incumbent = Some(candidate);
        }
    }

    /// The incumbent. Requires a previous call to [`Self::optimize`].
    pub fn extract_solution(&self) -> Result<Solution, ModelError> {
        if !self.optimized {
            return Err(ModelError::NoFeasibleSolution);
        }
        self.incumbent.clone().ok_or_else(|| {
            log::warn!("refinement model has no incumbent");
            ModelError::NoFeasibleSolution
        })
    }
}

fn add_coverage_constraints(
    graph: &CoverageGraph,
    vars: &PieceVariables,
    free: &BTreeSet<TileId>,
    program: &mut IntegerProgram,
) {
    for &tile in free.iter().filter(|&&t| graph.is_mandatory(t)) {
        let full = graph.pieces_at(tile).filter(|k| k.full).map(|k| (k, 1.0));
        let expr = vars.weighted_sum(full);
        program.add_constraint(LinearConstraint {
            name: format!("cover_{}", tile.0),
            expr,
            sense: Sense::Eq,
            rhs: 1.0,
        });
    }
}

fn add_flow_constraints(
    graph: &CoverageGraph,
    vars: &PieceVariables,
    free: &BTreeSet<TileId>,
    program: &mut IntegerProgram,
) {
    for (v, w) in graph.edges() {
        if !free.contains(&v) && !free.contains(&w) {
            continue;
        }
        let ends = |at: TileId, towards: TileId| {
            graph
                .pieces_at(at)
                .filter(move |k| k.touches(towards))
                .map(move |k| (k, k.ends_towards(towards) as f64))
        };
        let mut expr = vars.weighted_sum(ends(v, w));
        expr.add_scaled(&vars.weighted_sum(ends(w, v)), -1.0);
        program.add_constraint(LinearConstraint {
            name: format!("flow_{}_{}", v.0, w.0),
            expr,
            sense: Sense::Eq,
            rhs: 0.0,
        });
    }
}
