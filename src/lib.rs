//! # Pour Sort Library
//!
//! Core logic for a color-sorting puzzle: containers hold stacked colored
//! units, and a pour moves the top run of one color onto an empty container
//! or a matching top. A level is solved when every container is empty or
//! full of a single color.
//!
//! It is used by three binaries:
//! - `human_player`: plays a generated level interactively on the command line.
//! - `ai_solver`: reads a board file and prints a move sequence that solves it.
//! - `level_evaluator`: generates batches of levels and reports how often
//!   they validate and how hard the solver had to work.
//!
//! ## Modules
//! - `engine`: colors, units, containers, moves and `BoardState` with the
//!   pour mechanics.
//! - `heuristics`: the state estimate and the pruned move set the search expands.
//! - `solver`: bounded A* search plus an exhaustive checker for small boards.
//! - `tier`: difficulty tiers and the level catalog.
//! - `generator`: random level generation validated by the solver, and the
//!   pattern cache.
//! - `session`: the live game state machine with undo, scoring and events.
//! - `config`: TOML-loadable tuning for weights, budgets and generation.
//! - `error`: parse and configuration errors.
//! - `utils`: parsing boards from compact text rows.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod session;
pub mod solver;
pub mod tier;
pub mod utils;

use tracing::info;

use crate::config::EngineConfig;
use crate::generator::{LevelGenerator, PatternCache};
use crate::session::GameSession;
use crate::solver::Solver;
use crate::tier::{Level, Tier};

/// Entry point for starting games: owns the configuration, the level
/// generator and the pattern cache shared by every session it creates.
pub struct Engine {
    config: EngineConfig,
    generator: LevelGenerator,
    cache: PatternCache,
}

impl Engine {
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        let cache = PatternCache::new(config.generator.pattern_cache_capacity);
        let generator = LevelGenerator::new(config.generator.clone(), seed);
        Engine {
            config,
            generator,
            cache,
        }
    }

    pub fn pattern_cache(&self) -> &PatternCache {
        &self.cache
    }

    /// A solver with the configured weights and `tier`'s budget.
    pub fn solver_for(&self, tier: Tier) -> Solver {
        self.config.solver_for(tier)
    }

    /// Generates a level for `tier` and starts a session on it.
    ///
    /// Always returns a playable session; check
    /// [`GameSession::is_validated`] to learn whether the solver confirmed it.
    pub fn new_session(&mut self, tier: Tier) -> GameSession {
        let solver = self.solver_for(tier);
        let level = self.generator.generate(tier, &solver, &mut self.cache);
        GameSession::from_level(level)
    }

    /// Starts the catalog level `id`, or `None` if no such level exists.
    ///
    /// The generator is reseeded from the level id, so the same id yields the
    /// same layout as long as the pattern cache holds the same entries.
    pub fn session_for_level(&mut self, id: u32) -> Option<GameSession> {
        let level = Level::by_id(id)?;
        info!(id, tier = %level.tier, "starting catalog level");
        self.generator.reseed(level.seed());
        Some(self.new_session(level.tier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_shape() {
        let mut engine = Engine::new(EngineConfig::default(), 1);
        let session = engine.new_session(Tier::Easy);
        assert_eq!(session.tier(), Some(Tier::Easy));
        assert_eq!(session.board().len(), Tier::Easy.container_count());
        assert_eq!(session.moves(), 0);
        assert!(session.is_validated());
    }

    #[test]
    fn test_session_for_level_is_reproducible() {
        let mut a = Engine::new(EngineConfig::default(), 1);
        let mut b = Engine::new(EngineConfig::default(), 99);
        let first = a.session_for_level(3).unwrap();
        let second = b.session_for_level(3).unwrap();
        assert_eq!(first.board(), second.board());
        assert_eq!(first.tier(), Some(Tier::Tutorial));
        assert!(a.session_for_level(37).is_none());
    }

    #[test]
    fn test_medium_sessions_fill_the_cache() {
        let mut engine = Engine::new(EngineConfig::default(), 4);
        let session = engine.new_session(Tier::Medium);
        assert!(session.is_validated());
        assert_eq!(engine.pattern_cache().count_for(Tier::Medium), 1);
    }
}
