//! Tests for the integer-programming refinement model.

use puzzle_tour::deadline::Deadline;
use puzzle_tour::error::ModelError;
use puzzle_tour::graph::{CoverageGraph, TileId};
use puzzle_tour::model::{
    EngineOutcome, EngineStatus, ExactEngine, GoodLpEngine, IntegerProgram, RefinementModel,
};
use puzzle_tour::solution::Solution;
use puzzle_tour::square::SquareGrid;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

const R: f64 = 0.5;
const TURN: f64 = 2.651308592 * R;

fn create_test_graph(layout: &str) -> CoverageGraph {
    let square = SquareGrid::parse(layout, 1.0);
    CoverageGraph::build(&square.grid, &square.catalogue).expect("valid grid")
}

fn walk(ids: &[usize]) -> Vec<TileId> {
    ids.iter().map(|&i| TileId(i)).collect()
}

/// A feasible but suboptimal tour of the 3x3 grid: the boundary ring with a
/// U-turn spike into the center.
fn create_spike_solution(graph: &CoverageGraph) -> Solution {
    Solution::from_walk(graph, &walk(&[0, 1, 2, 5, 8, 7, 6, 3, 4, 3]))
}

/// An engine that reports the same status on every call.
struct FixedStatus {
    status: EngineStatus,
    calls: usize,
}

impl FixedStatus {
    fn new(status: EngineStatus) -> Self {
        FixedStatus { status, calls: 0 }
    }
}

impl ExactEngine for FixedStatus {
    fn solve(&mut self, _program: &IntegerProgram, _deadline: Deadline) -> EngineOutcome {
        self.calls += 1;
        EngineOutcome::without_solution(self.status.clone())
    }
}

#[test]
fn test_extract_before_optimize() {
    let graph = create_test_graph("###\n###\n###");
    let model = RefinementModel::new(&graph, Some(create_spike_solution(&graph)), None)
        .expect("model");

    assert_eq!(
        model.extract_solution().err(),
        Some(ModelError::NoFeasibleSolution)
    );
}

#[test]
fn test_fixing_requires_warm_start() {
    let graph = create_test_graph("###\n###\n###");
    let fixed: BTreeSet<TileId> = [TileId(0), TileId(1)].into_iter().collect();

    let result = RefinementModel::new(&graph, None, Some(&fixed));
    assert_eq!(result.err(), Some(ModelError::FixingWithoutSolution));
}

#[test]
fn test_no_solution_without_time() {
    let graph = create_test_graph("###\n###\n###");
    let mut model = RefinementModel::new(&graph, None, None).expect("model");

    let bounds = model.optimize(Deadline::after(Duration::ZERO)).expect("bounds");
    assert!(!bounds.is_optimal());
    assert_eq!(model.rounds, 0);
    assert_eq!(
        model.extract_solution().err(),
        Some(ModelError::NoFeasibleSolution)
    );
}

#[test]
fn test_warm_start_is_kept_without_time() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let cost = graph.objective(&warm);
    let mut model = RefinementModel::new(&graph, Some(warm.clone()), None).expect("model");

    let bounds = model.optimize(Deadline::after(Duration::ZERO)).expect("bounds");
    assert!((bounds.ub - cost).abs() < 1e-9);
    assert_eq!(model.extract_solution(), Ok(warm));
}

#[test]
fn test_ring_is_solved_to_optimality() {
    let graph = create_test_graph("###\n# #\n###");
    let mut model = RefinementModel::new(&graph, None, None).expect("model");
    assert!(model.is_global());

    let bounds = model.optimize(Deadline::after(Duration::from_secs(30))).expect("bounds");
    let solution = model.extract_solution().expect("solution");

    assert!(bounds.is_optimal());
    assert!(solution.is_feasible(&graph));
    assert!((graph.objective(&solution) - (4.0 * TURN + 4.0)).abs() < 1e-6);
    assert!(bounds.lb <= bounds.ub);
    assert!((bounds.ub - graph.objective(&solution)).abs() < 1e-9);
}

#[test]
fn test_refinement_bounds_are_consistent() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let warm_cost = graph.objective(&warm);
    let mut model = RefinementModel::new(&graph, Some(warm), None).expect("model");

    let bounds = model.optimize(Deadline::after(Duration::from_secs(30))).expect("bounds");
    let solution = model.extract_solution().expect("solution");

    assert!(solution.is_feasible(&graph));
    assert!(bounds.lb <= bounds.ub);
    assert!(bounds.ub <= warm_cost + 1e-9);
    assert!((bounds.ub - graph.objective(&solution)).abs() < 1e-9);
}

#[test]
fn test_fixed_tiles_keep_their_pieces() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let fixed: BTreeSet<TileId> = [0, 1, 2, 5, 8].into_iter().map(TileId).collect();
    let mut model =
        RefinementModel::new(&graph, Some(warm.clone()), Some(&fixed)).expect("model");
    assert!(!model.is_global());
    assert_eq!(model.free_tiles().len(), 4);

    model.optimize(Deadline::after(Duration::from_secs(30))).expect("bounds");
    let solution = model.extract_solution().expect("solution");
    assert!(solution.is_feasible(&graph));

    for tile in &fixed {
        let mut before: Vec<_> = warm
            .visits()
            .iter()
            .filter(|v| v.tile == *tile)
            .map(|v| v.key())
            .collect();
        let mut after: Vec<_> = solution
            .visits()
            .iter()
            .filter(|v| v.tile == *tile)
            .map(|v| v.key())
            .collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}

#[test]
fn test_warm_start_satisfies_program() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let fixed: BTreeSet<TileId> = [0, 1, 2].into_iter().map(TileId).collect();
    let model = RefinementModel::new(&graph, Some(warm), Some(&fixed)).expect("model");

    let start: Vec<f64> = model
        .program()
        .variables()
        .iter()
        .map(|v| v.start.unwrap_or(0.0))
        .collect();
    assert!(model.program().is_feasible(&start));
}

#[test]
fn test_infeasible_warm_start_is_ignored() {
    let graph = create_test_graph("###\n###\n###");
    let mut visits = create_spike_solution(&graph).into_visits();
    visits[0].full = false;

    let model = RefinementModel::new(&graph, Some(Solution::new(visits)), None).expect("model");
    assert!(model.bounds().ub.is_infinite());
}

#[test]
fn test_engine_infeasible_is_an_error() {
    let graph = create_test_graph("###\n###\n###");
    let engine = FixedStatus::new(EngineStatus::Infeasible);
    let mut model = RefinementModel::with_engine(&graph, None, None, engine).expect("model");

    let result = model.optimize(Deadline::unbounded());
    assert_eq!(result.err(), Some(ModelError::Infeasible));
    assert_eq!(model.engine().calls, 1);
}

#[test]
fn test_engine_failure_is_an_error() {
    let graph = create_test_graph("###\n###\n###");
    let engine = FixedStatus::new(EngineStatus::Failed("license".to_string()));
    let mut model = RefinementModel::with_engine(&graph, None, None, engine).expect("model");

    let result = model.optimize(Deadline::unbounded());
    assert_eq!(result.err(), Some(ModelError::Engine("license".to_string())));
}

#[test]
fn test_engine_timeout_keeps_incumbent() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let engine = FixedStatus::new(EngineStatus::TimedOut);
    let mut model =
        RefinementModel::with_engine(&graph, Some(warm.clone()), None, engine).expect("model");

    let bounds = model.optimize(Deadline::unbounded()).expect("bounds");
    assert!(!bounds.is_optimal());
    assert_eq!(model.extract_solution(), Ok(warm));
}

#[test]
fn test_refinement_stops_at_deadline() {
    let graph = create_test_graph("#####\n#####\n#####\n#####\n#####");
    let mut model = RefinementModel::new(&graph, None, None).expect("model");
    let time_limit = Duration::from_secs(1);

    let started = Instant::now();
    let bounds = model.optimize(Deadline::after(time_limit)).expect("bounds");

    assert!(started.elapsed() <= time_limit + Duration::from_secs(2));
    assert!(bounds.lb <= bounds.ub);
}

#[test]
fn test_engine_starts_from_warm_start() {
    let graph = create_test_graph("###\n###\n###");
    let warm = create_spike_solution(&graph);
    let model = RefinementModel::new(&graph, Some(warm), None).expect("model");
    let program = model.program();
    let start: Vec<f64> = program
        .variables()
        .iter()
        .map(|v| v.start.unwrap_or(0.0))
        .collect();
    let start_objective = program.objective().evaluate(&start);

    let mut engine = GoodLpEngine::new();
    let outcome = engine.solve(program, Deadline::after(Duration::from_secs(30)));

    assert_eq!(engine.calls, 1);
    assert!(matches!(
        outcome.status,
        EngineStatus::Optimal | EngineStatus::Feasible
    ));
    assert!(program.is_feasible(&outcome.values));
    assert!(outcome.objective <= start_objective + 1e-6);
    assert!(outcome.bound <= outcome.objective + 1e-6);
}

#[test]
fn test_engine_with_expired_deadline_times_out() {
    let graph = create_test_graph("###\n###\n###");
    let model = RefinementModel::new(&graph, None, None).expect("model");

    let mut engine = GoodLpEngine::new();
    let outcome = engine.solve(model.program(), Deadline::after(Duration::ZERO));

    assert_eq!(outcome.status, EngineStatus::TimedOut);
    assert_eq!(engine.calls, 0);
}
