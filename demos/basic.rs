//! Basic example of using the puzzle_tour library.
//!
//! Reads a square-grid layout (`#` inside the polygon, `.` passable outside,
//! anything else empty), runs the pipeline and prints the tour.

use clap::Parser;
use puzzle_tour::config::Config;
use puzzle_tour::square::SquareGrid;
use puzzle_tour::utils::{format_duration, print_solution_visualization, save_solution};
use puzzle_tour::PuzzleTourSolver;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const DEFAULT_LAYOUT: &str = "\
#####.
#####.
##..##
######
";

#[derive(Parser)]
#[command(name = "basic")]
#[command(about = "Compute a coverage tour over a square grid layout")]
struct Cli {
    /// Layout file; a built-in layout is used when omitted
    layout: Option<PathBuf>,

    /// Side length of a tile
    #[arg(long, default_value = "1.0")]
    side: f64,

    /// Time limit in seconds
    #[arg(short, long, default_value = "60")]
    time_limit: u64,

    /// JSON configuration file (overrides the time limit)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text report output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the solution as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let layout = match &cli.layout {
        Some(path) => {
            println!("Loading layout from: {}", path.display());
            fs::read_to_string(path)?
        }
        None => DEFAULT_LAYOUT.to_string(),
    };
    let square = SquareGrid::parse(&layout, cli.side);
    println!(
        "Loaded grid with {} tiles and {} pieces",
        square.grid.len(),
        square.catalogue.len()
    );

    let config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Config::new().with_time_limit(Duration::from_secs(cli.time_limit)),
    };

    let mut solver = PuzzleTourSolver::from_grid(&square.grid, &square.catalogue, config)?;
    println!("Starting search");
    let start_time = Instant::now();
    let (lb, ub, solution) = solver.run()?;
    let runtime = start_time.elapsed();

    println!("Search completed in {}", format_duration(runtime));
    println!("Tour cost: {:.4}", ub);
    println!("Lower bound: {:.4}", lb);
    println!("Visits: {}", solution.len());
    for stage in &solver.stages {
        println!("  {}: {:.4}", stage.stage, stage.cost);
    }

    if let Some(path) = &cli.output {
        println!("Saving solution to: {}", path.display());
        save_solution(&solution, &solver.graph, path)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
    }

    print_solution_visualization(&solution, &solver.graph);

    Ok(())
}
