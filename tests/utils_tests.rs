//! Tests for the reporting helpers.

use puzzle_tour::graph::{CoverageGraph, TileId};
use puzzle_tour::solution::Solution;
use puzzle_tour::square::SquareGrid;
use puzzle_tour::utils::{self, SearchStatistics};
use std::time::Duration;

fn create_test_graph(layout: &str) -> CoverageGraph {
    let square = SquareGrid::parse(layout, 1.0);
    CoverageGraph::build(&square.grid, &square.catalogue).expect("valid grid")
}

fn create_test_solution(graph: &CoverageGraph, ids: &[usize]) -> Solution {
    let walk: Vec<TileId> = ids.iter().map(|&i| TileId(i)).collect();
    Solution::from_walk(graph, &walk)
}

#[test]
fn test_format_duration() {
    let duration1 = Duration::from_secs(65);
    assert_eq!(utils::format_duration(duration1), "0h 01m 05s");

    let duration2 = Duration::from_secs(3600 + 120 + 5);
    assert_eq!(utils::format_duration(duration2), "1h 02m 05s");

    let duration3 = Duration::from_secs(7200 + 3600 + 900 + 30);
    assert_eq!(utils::format_duration(duration3), "3h 15m 30s");
}

#[test]
fn test_render_ring() {
    let graph = create_test_graph("###\n# #\n###");
    let solution = create_test_solution(&graph, &[0, 1, 2, 4, 7, 6, 5, 3]);

    assert_eq!(utils::render_solution(&solution, &graph), "###\n# #\n###");
}

#[test]
fn test_render_marks_passes() {
    // Tile 1 is passed twice, the phantom tile 2 once.
    let graph = create_test_graph("##.\n##");
    let solution = create_test_solution(&graph, &[0, 1, 2, 1, 4, 3]);

    assert_eq!(utils::render_solution(&solution, &graph), "#+o\n## ");
}

#[test]
fn test_save_solution() {
    let graph = create_test_graph("###\n# #\n###");
    let solution = create_test_solution(&graph, &[0, 1, 2, 4, 7, 6, 5, 3]);
    let path = std::env::temp_dir().join(format!("puzzle_tour_{}.txt", std::process::id()));

    utils::save_solution(&solution, &graph, &path).expect("writable temp dir");
    let report = std::fs::read_to_string(&path).expect("readable report");
    let _ = std::fs::remove_file(&path);

    assert!(report.starts_with("Coverage tour"));
    assert!(report.contains("Is Feasible: true"));
    assert!(report.contains("Visits: 8"));
    assert_eq!(report.lines().filter(|l| l.starts_with("Visit #")).count(), 8);
    assert!(report.contains("Path:"));
}

#[test]
fn test_search_statistics_format() {
    let statistics = SearchStatistics {
        runtime: Duration::from_secs(65),
        stages: Vec::new(),
        lower_bound: 9.0,
        upper_bound: 9.5,
        lns_iterations: 12,
        lns_improvements: 3,
        visits: 8,
    };

    let text = statistics.format();
    assert!(text.contains("Runtime: 0h 01m 05s"));
    assert!(text.contains("Lower Bound: 9.0000"));
    assert!(text.contains("LNS Iterations: 12"));
}
