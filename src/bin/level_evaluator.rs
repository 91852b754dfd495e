use clap::Parser;
use pour_sort::config::EngineConfig;
use pour_sort::generator::{LevelGenerator, PatternCache};
use pour_sort::tier::Tier;
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Generate levels and report how well they validate",
    long_about = None
)]
struct Args {
    /// Levels to generate per tier
    #[clap(short = 'n', long, default_value_t = 20)]
    count: u64,

    /// Only evaluate this tier (all tiers, easiest first, if omitted)
    #[clap(short, long)]
    tier: Option<Tier>,

    /// Seed of the first level; each following level uses the next seed
    #[clap(short, long, default_value_t = 0)]
    seed: u64,

    /// Path to a TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[derive(Default)]
struct TierStats {
    validated: u64,
    seeded: u64,
    attempts: u64,
    solution_moves: u64,
    explored: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load_or_default(path)?,
        None => EngineConfig::default(),
    };
    let tiers: Vec<Tier> = match args.tier {
        Some(tier) => vec![tier],
        None => Tier::ALL.to_vec(),
    };

    // Shared across tiers so harder tiers can build on validated easier layouts.
    let mut cache = PatternCache::new(config.generator.pattern_cache_capacity);
    let mut generator = LevelGenerator::new(config.generator.clone(), args.seed);

    println!("Evaluating {} level(s) per tier starting at seed {}...", args.count, args.seed);

    for tier in tiers {
        let solver = config.solver_for(tier);
        let mut stats = TierStats::default();

        for i in 0..args.count {
            generator.reseed(args.seed + i);
            let level = generator.generate(tier, &solver, &mut cache);
            stats.attempts += level.attempts as u64;
            stats.explored += level.explored as u64;
            if level.seeded {
                stats.seeded += 1;
            }
            if let Some(moves) = &level.solution {
                stats.validated += 1;
                stats.solution_moves += moves.len() as u64;
            }
        }

        let runs = args.count.max(1) as f64;
        let avg_attempts = stats.attempts as f64 / runs;
        let avg_explored = stats.explored as f64 / runs;
        let avg_moves = if stats.validated > 0 {
            stats.solution_moves as f64 / stats.validated as f64
        } else {
            0.0
        };
        println!(
            "Tier {:<9}: validated {}/{}, avg attempts {:.2}, avg explored {:.0}, \
             avg solution length {:.1}, seeded {}",
            tier,
            stats.validated,
            args.count,
            avg_attempts,
            avg_explored,
            avg_moves,
            stats.seeded
        );
    }
    Ok(())
}
