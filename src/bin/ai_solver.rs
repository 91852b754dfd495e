use clap::Parser;
use pour_sort::config::EngineConfig;
use pour_sort::engine::{BoardState, DEFAULT_CAPACITY};
use pour_sort::solver::is_solvable_exhaustive;
use pour_sort::tier::Tier;
use pour_sort::utils::board_from_text;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Tier whose search budget to use
    #[clap(short, long, default_value_t = Tier::Hard)]
    tier: Tier,

    /// Units per container
    #[clap(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Also run the unpruned breadth-first search, capped at this many states
    #[clap(long)]
    exhaustive: Option<usize>,

    /// Path to the board file (one container per line, bottom unit first)
    board_file: PathBuf,
}

fn read_board_file(path: &Path, capacity: usize) -> Result<BoardState, Box<dyn Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(board_from_text(&content, capacity)?)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::load_or_default(path)?,
        None => EngineConfig::default(),
    };
    let board = read_board_file(&args.board_file, args.capacity)?;
    println!("Loaded board from {}\n", args.board_file.display());
    println!("Initial board state:\n{}\n", board);

    let solver = config.solver_for(args.tier);
    let budget = solver.budget();
    println!(
        "Searching with the {} budget ({} states, depth {})...\n",
        args.tier, budget.max_states, budget.max_depth
    );

    let report = solver.solve(&board);
    match report.outcome.moves() {
        Some(moves) => {
            println!("Solvable\n");
            println!("Moves ({}):", moves.len());
            if moves.is_empty() {
                println!("  Already solved.");
            }
            let mut state = board.clone();
            for (i, mv) in moves.iter().enumerate() {
                println!("  Move {}: {}", i + 1, mv);
                state.apply_pour(*mv);
            }
            println!("States explored: {}\n", report.explored);
            println!("Final board state:\n{}\n", state);
        }
        None => {
            println!("No solution found within budget.");
            println!("States explored: {}", report.explored);
        }
    }

    if let Some(max_states) = args.exhaustive {
        match is_solvable_exhaustive(&board, max_states) {
            Some(true) => println!("Exhaustive search: solvable"),
            Some(false) => println!("Exhaustive search: unsolvable"),
            None => println!("Exhaustive search: gave up after {} states", max_states),
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
