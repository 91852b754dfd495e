use clap::Parser;
use pour_sort::config::EngineConfig;
use pour_sort::session::TapOutcome;
use pour_sort::tier::Tier;
use pour_sort::Engine;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play a pour sort level in the terminal", long_about = None)]
struct Args {
    /// Difficulty tier: tutorial, easy, medium or hard
    #[clap(short, long, default_value_t = Tier::Tutorial)]
    tier: Tier,

    /// Play a catalog level (1-36) instead of a random level of `--tier`
    #[clap(short, long)]
    level: Option<u32>,

    /// Seed for level generation (random if omitted)
    #[clap(short, long)]
    seed: Option<u64>,

    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load_or_default(path)?,
        None => EngineConfig::default(),
    };
    let mut engine = Engine::new(config, args.seed.unwrap_or_else(rand::random));
    let mut session = match args.level {
        Some(id) => engine
            .session_for_level(id)
            .ok_or_else(|| format!("no level {} (levels run from 1 to 36)", id))?,
        None => engine.new_session(args.tier),
    };
    let tier = session.tier().unwrap_or(args.tier);
    let hint_solver = engine.solver_for(tier);

    println!("Welcome to Pour Sort! ({} tier)", tier);
    if !session.is_validated() {
        println!("(The solver could not confirm this level is solvable.)");
    }

    loop {
        println!("---------------------");
        println!("Moves: {}, Score: {}", session.moves(), session.score());
        println!("{}", session.board().to_string_with_highlight(session.selected()));

        if session.is_complete() {
            println!();
            println!("---------------------");
            println!("🎉 LEVEL COMPLETE! 🎉");
            println!("Final Score: {}", session.score());
            println!("Total Moves: {}", session.moves());
            println!("---------------------");
            break;
        }

        print!("Tap a container (index), 'h' for a hint, 'u' to undo, 'r' to reset, 'q' to quit: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        match input.trim() {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "u" => {
                if session.undo() {
                    println!("Move undone.");
                } else {
                    println!("Nothing to undo.");
                }
            }
            "r" => {
                session.reset();
                println!("Level reset.");
            }
            "h" => match session.hint(&hint_solver) {
                Some(mv) => println!("Hint: pour {}", mv),
                None => println!("No hint available."),
            },
            other => match other.parse::<usize>() {
                Ok(index) => match session.tap(index) {
                    TapOutcome::Selected(i) => println!("Selected container {}.", i),
                    TapOutcome::Deselected => println!("Selection cleared."),
                    TapOutcome::Poured(n) => println!("Poured {} unit(s).", n),
                    TapOutcome::Rejected => println!("That pour is not allowed."),
                    TapOutcome::Ignored => {
                        println!("Nothing to select there (empty or out of range).")
                    }
                },
                Err(_) => println!("Invalid input. Use an index, 'h', 'u', 'r' or 'q'."),
            },
        }
    }
    Ok(())
}
