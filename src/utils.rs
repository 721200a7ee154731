//! Reporting helpers: durations, solution reports and a console rendering.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::graph::{CoverageGraph, TileId};
use crate::solution::Solution;
use crate::StageCost;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// Write a text report of a solution.
pub fn save_solution<P: AsRef<Path>>(
    solution: &Solution,
    graph: &CoverageGraph,
    path: P,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "Coverage tour")?;
    writeln!(file, "Total Cost: {:.6}", graph.objective(solution))?;
    writeln!(file, "Is Feasible: {}", solution.is_feasible(graph))?;
    writeln!(file, "Visits: {}", solution.len())?;
    writeln!(file, "Turns: {}", solution.turn_count(graph))?;
    writeln!(file)?;

    for (i, visit) in solution.visits().iter().enumerate() {
        let tile = graph.tile(visit.tile);
        writeln!(
            file,
            "Visit #{}: tile {} at {:?} from {} to {} {} (cost {:.4})",
            i + 1,
            visit.tile,
            tile.coord,
            visit.entry,
            visit.exit,
            if visit.full { "full" } else { "passing" },
            graph.cost(&visit.key())
        )?;
    }
    writeln!(file)?;

    write!(file, "Path:")?;
    for point in &solution.path(graph).points {
        write!(file, " {}", point)?;
    }
    writeln!(file)?;

    Ok(())
}

/// Statistics of a pipeline run.
pub struct SearchStatistics {
    pub runtime: Duration,
    pub stages: Vec<StageCost>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub lns_iterations: usize,
    pub lns_improvements: usize,
    pub visits: usize,
}

impl SearchStatistics {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                format!(
                    "\n  - {}: {:.4} after {}",
                    s.stage,
                    s.cost,
                    format_duration(s.elapsed)
                )
            })
            .collect::<String>();
        format!(
            "Search Statistics:
- Runtime: {}
- Stages:{}
- Lower Bound: {:.4}
- Upper Bound: {:.4}
- LNS Iterations: {}
- LNS Improvements: {}
- Visits: {}",
            format_duration(self.runtime),
            stages,
            self.lower_bound,
            self.upper_bound,
            self.lns_iterations,
            self.lns_improvements,
            self.visits
        )
    }
}

/// Render the grid as text, first row on top: `#` covered, `+` covered and
/// also passed, `o` only passed, `.` untouched, blank for no tile.
pub fn render_solution(solution: &Solution, graph: &CoverageGraph) -> String {
    let mut passes: HashMap<TileId, usize> = HashMap::new();
    for visit in solution.visits() {
        *passes.entry(visit.tile).or_insert(0) += 1;
    }

    let tiles = graph.tiles();
    let (Some(min_i), Some(max_i), Some(min_j), Some(max_j)) = (
        tiles.iter().map(|t| t.coord.0).min(),
        tiles.iter().map(|t| t.coord.0).max(),
        tiles.iter().map(|t| t.coord.1).min(),
        tiles.iter().map(|t| t.coord.1).max(),
    ) else {
        return String::new();
    };

    let width = (max_i - min_i + 1) as usize;
    let height = (max_j - min_j + 1) as usize;
    let mut canvas = vec![vec![' '; width]; height];
    for tile in tiles {
        let x = (tile.coord.0 - min_i) as usize;
        let y = (max_j - tile.coord.1) as usize;
        canvas[y][x] = match (tile.mandatory, passes.get(&tile.id).copied().unwrap_or(0)) {
            (_, 0) => '.',
            (true, 1) => '#',
            (true, _) => '+',
            (false, _) => 'o',
        };
    }

    canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a solution summary and rendering to the console.
pub fn print_solution_visualization(solution: &Solution, graph: &CoverageGraph) {
    println!("Coverage tour");
    println!("Total Cost: {:.4}", graph.objective(solution));
    println!("Visits: {}", solution.len());
    println!();
    println!("{}", render_solution(solution, graph));
    println!();
    println!("Legend:");
    println!("# - covered once");
    println!("+ - covered and passed again");
    println!("o - passed outside the polygon");
    println!(". - not visited");
    println!();
}
