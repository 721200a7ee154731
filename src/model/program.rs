//! A solver-neutral integer program and the exact-engine interface.

use crate::deadline::Deadline;

/// Tolerance used when checking constraints against a value vector.
pub const FEASIBILITY_TOL: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

/// Index of a variable in an [`IntegerProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

#[derive(Debug, Clone)]
pub struct VarSpec {
    pub name: String,
    pub kind: VarKind,
    pub lb: f64,
    pub ub: f64,
    /// Warm-start value, if any.
    pub start: Option<f64>,
}

/// `sum(coef * var) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr::default()
    }

    pub fn constant(value: f64) -> Self {
        LinearExpr {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Append another expression scaled by `factor`.
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: f64) {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * factor)));
        self.constant += other.constant * factor;
    }

    pub fn has_terms(&self) -> bool {
        self.terms.iter().any(|&(_, c)| c != 0.0)
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(v, c)| c * values.get(v.0).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// `expr <sense> rhs`.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + FEASIBILITY_TOL,
            Sense::Ge => lhs >= self.rhs - FEASIBILITY_TOL,
            Sense::Eq => (lhs - self.rhs).abs() <= FEASIBILITY_TOL,
        }
    }
}

/// Minimize an affine objective subject to linear constraints.
#[derive(Debug, Clone, Default)]
pub struct IntegerProgram {
    variables: Vec<VarSpec>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl IntegerProgram {
    pub fn new() -> Self {
        IntegerProgram::default()
    }

    pub fn add_variable(&mut self, spec: VarSpec) -> VarId {
        self.variables.push(spec);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[VarSpec] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Check bounds, integrality and every constraint.
    pub fn is_feasible(&self, values: &[f64]) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within = self.variables.iter().zip(values).all(|(spec, &x)| {
            let integral = spec.kind == VarKind::Continuous
                || (x - x.round()).abs() <= FEASIBILITY_TOL;
            integral && x >= spec.lb - FEASIBILITY_TOL && x <= spec.ub + FEASIBILITY_TOL
        });
        within && self.constraints.iter().all(|c| c.is_satisfied(values))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    /// Proven optimal.
    Optimal,
    /// Feasible, optimality not proven.
    Feasible,
    Infeasible,
    /// Deadline reached without a solution.
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub status: EngineStatus,
    /// One value per variable, empty without a solution.
    pub values: Vec<f64>,
    /// Objective of `values`, `+inf` without a solution.
    pub objective: f64,
    /// Proven lower bound, `-inf` if none.
    pub bound: f64,
}

impl EngineOutcome {
    /// An outcome without solution.
    pub fn without_solution(status: EngineStatus) -> Self {
        EngineOutcome {
            status,
            values: Vec::new(),
            objective: f64::INFINITY,
            bound: f64::NEG_INFINITY,
        }
    }

    pub fn has_solution(&self) -> bool {
        matches!(self.status, EngineStatus::Optimal | EngineStatus::Feasible)
    }
}

/// An exact mixed-integer engine.
pub trait ExactEngine {
    fn solve(&mut self, program: &IntegerProgram, deadline: Deadline) -> EngineOutcome;
}
