//! Default exact engine backed by `good_lp` and the HiGHS solver.
//!
//! The remaining time of the deadline becomes the HiGHS time limit, and
//! start values are handed over as the initial solution.

use super::program::{
    EngineOutcome, EngineStatus, ExactEngine, IntegerProgram, LinearExpr, Sense, VarKind,
};
use crate::deadline::Deadline;
use good_lp::solvers::highs::{highs, HighsProblem};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithInitialSolution, WithMipGap, WithTimeLimit,
};

#[derive(Debug, Clone, Default)]
pub struct GoodLpEngine {
    /// Number of solver invocations so far.
    pub calls: usize,
}

impl GoodLpEngine {
    pub fn new() -> Self {
        GoodLpEngine::default()
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    expr.terms
        .iter()
        .fold(Expression::from(expr.constant), |acc, &(v, coef)| {
            acc + coef * vars[v.0]
        })
}

/// Applies the time limit, the zero relative gap and the start values.
fn configure(
    problem: HighsProblem,
    program: &IntegerProgram,
    vars: &[Variable],
    deadline: Deadline,
) -> Result<HighsProblem, String> {
    let mut problem = problem.with_mip_gap(0.0).map_err(|e| e.to_string())?;
    if let Some(left) = deadline.remaining() {
        problem = problem.with_time_limit(left.as_secs_f64());
    }

    let start: Vec<(Variable, f64)> = program
        .variables()
        .iter()
        .zip(vars)
        .filter_map(|(spec, &var)| spec.start.map(|value| (var, value)))
        .collect();
    if !start.is_empty() {
        problem = problem.with_initial_solution(start);
    }
    Ok(problem)
}

impl ExactEngine for GoodLpEngine {
    fn solve(&mut self, program: &IntegerProgram, deadline: Deadline) -> EngineOutcome {
        if deadline.expired() {
            return EngineOutcome::without_solution(EngineStatus::TimedOut);
        }

        if program.variables().is_empty() {
            let values = Vec::new();
            if !program.is_feasible(&values) {
                return EngineOutcome::without_solution(EngineStatus::Infeasible);
            }
            let objective = program.objective().evaluate(&values);
            return EngineOutcome {
                status: EngineStatus::Optimal,
                values,
                objective,
                bound: objective,
            };
        }

        self.calls += 1;
        let mut problem_vars = ProblemVariables::new();
        let vars: Vec<Variable> = program
            .variables()
            .iter()
            .map(|spec| {
                let definition = match spec.kind {
                    VarKind::Binary => variable()
                        .integer()
                        .min(spec.lb.max(0.0))
                        .max(spec.ub.min(1.0)),
                    VarKind::Integer => variable().integer().min(spec.lb).max(spec.ub),
                    VarKind::Continuous => variable().min(spec.lb).max(spec.ub),
                };
                problem_vars.add(definition.name(spec.name.clone()))
            })
            .collect();

        let objective = to_expression(program.objective(), &vars);
        let mut problem = problem_vars.minimise(objective).using(highs);
        for c in program.constraints() {
            let lhs = to_expression(&c.expr, &vars);
            let rhs = c.rhs;
            problem = problem.with(match c.sense {
                Sense::Le => constraint!(lhs <= rhs),
                Sense::Ge => constraint!(lhs >= rhs),
                Sense::Eq => constraint!(lhs == rhs),
            });
        }
        let problem = match configure(problem, program, &vars, deadline) {
            Ok(problem) => problem,
            Err(message) => return EngineOutcome::without_solution(EngineStatus::Failed(message)),
        };

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = vars.iter().map(|&v| solution.value(v)).collect();
                let objective = program.objective().evaluate(&values);
                match solution.status() {
                    SolutionStatus::Optimal => EngineOutcome {
                        status: EngineStatus::Optimal,
                        values,
                        objective,
                        bound: objective,
                    },
                    SolutionStatus::TimeLimit | SolutionStatus::GapLimit => {
                        if !program.is_feasible(&values) {
                            return EngineOutcome::without_solution(EngineStatus::TimedOut);
                        }
                        log::debug!("HiGHS stopped early with incumbent {:.4}", objective);
                        EngineOutcome {
                            status: EngineStatus::Feasible,
                            values,
                            objective,
                            bound: f64::NEG_INFINITY,
                        }
                    }
                }
            }
            Err(ResolutionError::Infeasible) => {
                EngineOutcome::without_solution(EngineStatus::Infeasible)
            }
            // HiGHS stopped on its limit before finding any incumbent.
            Err(ResolutionError::Other("NoSolutionFound")) => {
                EngineOutcome::without_solution(EngineStatus::TimedOut)
            }
            Err(e) => EngineOutcome::without_solution(EngineStatus::Failed(e.to_string())),
        }
    }
}
