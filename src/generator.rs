//! Random level generation with solver validation.
//!
//! A candidate layout is built per tier, checked by the [`Solver`], and
//! retried until one validates or the attempt cap is reached. On exhaustion
//! the last candidate is returned unvalidated: a player always gets a level.
use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::engine::{BoardState, Color, Container, Move, Unit, UnitKind, DEFAULT_CAPACITY};
use crate::solver::Solver;
use crate::tier::Tier;

/// Tunables for [`LevelGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Units per container.
    pub capacity: usize,
    /// Candidates tried before falling back to the last one.
    pub max_attempts: u32,
    /// Validated layouts kept per process.
    pub pattern_cache_capacity: usize,
    /// Build `seed_tier` levels on top of a cached `cache_tier` layout when one exists.
    pub seed_from_cache: bool,
    pub cache_tier: Tier,
    pub seed_tier: Tier,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            capacity: DEFAULT_CAPACITY,
            max_attempts: 20,
            pattern_cache_capacity: 16,
            seed_from_cache: true,
            cache_tier: Tier::Medium,
            seed_tier: Tier::Hard,
        }
    }
}

/// Validated layouts kept for reuse when building harder levels.
///
/// Owned by whoever drives generation and passed in explicitly, so tests can
/// start from an empty or pre-seeded cache. Oldest entries are evicted first.
#[derive(Clone, Debug, Default)]
pub struct PatternCache {
    capacity: usize,
    entries: VecDeque<(Tier, BoardState)>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        PatternCache {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn store(&mut self, tier: Tier, board: BoardState) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((tier, board));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_for(&self, tier: Tier) -> usize {
        self.entries.iter().filter(|(t, _)| *t == tier).count()
    }

    /// A random cached layout for `tier`.
    pub fn choose(&self, tier: Tier, rng: &mut impl Rng) -> Option<&BoardState> {
        let matching: Vec<&BoardState> = self
            .entries
            .iter()
            .filter(|(t, _)| *t == tier)
            .map(|(_, b)| b)
            .collect();
        matching.choose(rng).copied()
    }
}

/// The result of one [`LevelGenerator::generate`] call.
#[derive(Clone, Debug)]
pub struct GeneratedLevel {
    pub tier: Tier,
    pub board: BoardState,
    /// False only when every attempt failed and this is the fallback layout.
    pub validated: bool,
    pub attempts: u32,
    /// The solver's path, when validated.
    pub solution: Option<Vec<Move>>,
    /// Whether the layout was built on a cached pattern.
    pub seeded: bool,
    /// States discovered by the solver, summed over every attempt.
    pub explored: usize,
}

pub struct LevelGenerator {
    config: GeneratorConfig,
    rng: SmallRng,
}

impl LevelGenerator {
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        LevelGenerator {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reseeds the generator, e.g. to reproduce a catalog level.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Produces a level for `tier`, validated by `solver` whenever possible.
    ///
    /// The cache is only written after a candidate validates, so abandoning
    /// a call part way never leaves a bad entry behind.
    #[instrument(skip(self, solver, cache))]
    pub fn generate(
        &mut self,
        tier: Tier,
        solver: &Solver,
        cache: &mut PatternCache,
    ) -> GeneratedLevel {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last: Option<(BoardState, bool)> = None;
        let mut explored = 0;

        for attempt in 1..=max_attempts {
            let (candidate, seeded) = self.candidate(tier, cache);
            let report = solver.solve(&candidate);
            explored += report.explored;
            debug!(
                attempt,
                seeded,
                explored = report.explored,
                solvable = report.outcome.is_solvable(),
                "generation attempt"
            );
            if let Some(moves) = report.outcome.moves() {
                if tier == self.config.cache_tier {
                    debug!("storing validated layout in pattern cache");
                    cache.store(tier, candidate.clone());
                }
                info!(attempt, moves = moves.len(), "accepted level");
                return GeneratedLevel {
                    tier,
                    solution: Some(moves.to_vec()),
                    board: candidate,
                    validated: true,
                    attempts: attempt,
                    seeded,
                    explored,
                };
            }
            last = Some((candidate, seeded));
        }

        warn!(max_attempts, "no candidate validated, using last attempt");
        let (board, seeded) = match last {
            Some(last) => last,
            None => (self.fresh_candidate(tier), false),
        };
        GeneratedLevel {
            tier,
            board,
            validated: false,
            attempts: max_attempts,
            solution: None,
            seeded,
            explored,
        }
    }

    fn candidate(&mut self, tier: Tier, cache: &PatternCache) -> (BoardState, bool) {
        if self.config.seed_from_cache && tier == self.config.seed_tier {
            let pattern = cache.choose(self.config.cache_tier, &mut self.rng).cloned();
            if let Some(board) = pattern.and_then(|p| self.seeded_candidate(tier, &p)) {
                return (board, true);
            }
        }
        (self.fresh_candidate(tier), false)
    }

    /// Picks the tier's colors, fills its containers and appends the empty ones.
    pub fn fresh_candidate(&mut self, tier: Tier) -> BoardState {
        let colors: Vec<Color> = match tier.fixed_colors() {
            Some(fixed) => fixed.to_vec(),
            None => Color::PALETTE
                .choose_multiple(&mut self.rng, tier.color_count())
                .copied()
                .collect(),
        };
        let mut containers = self.fill_containers(&colors, tier.unit_kind());
        self.append_empties(&mut containers, tier);
        BoardState::new(containers)
    }

    /// Reuses the filled containers of a validated easier layout, swaps the top
    /// units of random pairs of them, adds fresh containers for the colors it
    /// lacks, then shuffles container order.
    /// Returns `None` if the pattern cannot fit the tier.
    fn seeded_candidate(&mut self, tier: Tier, pattern: &BoardState) -> Option<BoardState> {
        let capacity = self.config.capacity;
        let mut reused: Vec<Container> = pattern
            .containers()
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        if reused.len() > tier.filled_count()
            || reused.iter().any(|c| c.capacity() != capacity || c.accepts() != tier.unit_kind())
        {
            return None;
        }

        for _ in 0..reused.len() / 2 {
            let a = self.rng.gen_range(0..reused.len());
            let b = self.rng.gen_range(0..reused.len());
            if a != b {
                swap_tops(&mut reused, a, b);
            }
        }

        let mut missing: Vec<Color> = Color::PALETTE
            .iter()
            .copied()
            .filter(|color| {
                !reused
                    .iter()
                    .any(|c| c.units().iter().any(|u| u.color == *color))
            })
            .collect();
        let extra = tier.filled_count() - reused.len();
        if missing.len() < extra {
            return None;
        }
        missing.shuffle(&mut self.rng);
        missing.truncate(extra);

        let mut containers = reused;
        containers.extend(self.fill_containers(&missing, tier.unit_kind()));
        containers.shuffle(&mut self.rng);
        self.append_empties(&mut containers, tier);
        Some(BoardState::new(containers))
    }

    /// One container per color, each filled from the shared pool of
    /// `capacity` units per color.
    ///
    /// Each next unit is drawn at random, skipping any unit that would make
    /// three same-colored units in a row on top; if only such units are
    /// left, any remaining unit is taken.
    fn fill_containers(&mut self, colors: &[Color], kind: UnitKind) -> Vec<Container> {
        let capacity = self.config.capacity;
        let mut pool: Vec<Unit> = colors
            .iter()
            .flat_map(|&color| std::iter::repeat(Unit::new(color, kind)).take(capacity))
            .collect();

        let mut containers = Vec::with_capacity(colors.len());
        for _ in 0..colors.len() {
            let mut units: Vec<Unit> = Vec::with_capacity(capacity);
            for _ in 0..capacity {
                let stacked = match units.as_slice() {
                    [.., a, b] if a.color == b.color => Some(b.color),
                    _ => None,
                };
                let allowed: Vec<usize> = (0..pool.len())
                    .filter(|&i| Some(pool[i].color) != stacked)
                    .collect();
                let pick = if allowed.is_empty() {
                    self.rng.gen_range(0..pool.len())
                } else {
                    allowed[self.rng.gen_range(0..allowed.len())]
                };
                units.push(pool.swap_remove(pick));
            }
            containers.push(Container::with_units(capacity, kind, units));
        }
        containers
    }

    fn append_empties(&self, containers: &mut Vec<Container>, tier: Tier) {
        while containers.len() < tier.container_count() {
            containers.push(Container::new(self.config.capacity, tier.unit_kind()));
        }
    }
}

/// Exchanges the top unit of containers `a` and `b`; both must be non-empty.
fn swap_tops(containers: &mut [Container], a: usize, b: usize) {
    let top_a = containers[a].pop_run(1);
    let top_b = containers[b].pop_run(1);
    containers[a].push_run(&top_b);
    containers[b].push_run(&top_a);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::HeuristicWeights;
    use crate::solver::SearchBudget;
    use crate::utils::board_from_rows;
    use std::collections::HashMap;

    fn color_totals(board: &BoardState) -> HashMap<Color, usize> {
        let mut totals = HashMap::new();
        for container in board.containers() {
            for unit in container.units() {
                *totals.entry(unit.color).or_insert(0) += 1;
            }
        }
        totals
    }

    fn has_triple_run(container: &Container) -> bool {
        container
            .units()
            .windows(3)
            .any(|w| w[0].color == w[1].color && w[1].color == w[2].color)
    }

    #[test]
    fn test_fresh_candidate_shape() {
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 7);
        for tier in Tier::ALL {
            let board = generator.fresh_candidate(tier);
            assert_eq!(board.len(), tier.container_count());
            let filled = board.containers().iter().filter(|c| c.is_full()).count();
            let empty = board.containers().iter().filter(|c| c.is_empty()).count();
            assert_eq!(filled, tier.filled_count());
            assert_eq!(empty, tier.empty_count());
            let totals = color_totals(&board);
            assert_eq!(totals.len(), tier.color_count());
            assert!(totals.values().all(|&n| n == DEFAULT_CAPACITY));
        }
    }

    #[test]
    fn test_tutorial_uses_fixed_colors() {
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 3);
        let totals = color_totals(&generator.fresh_candidate(Tier::Tutorial));
        let mut colors: Vec<Color> = totals.keys().copied().collect();
        colors.sort();
        assert_eq!(colors, vec![Color::Red, Color::Blue, Color::Green]);
    }

    #[test]
    fn test_fill_avoids_triple_runs_when_possible() {
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 11);
        for tier in Tier::ALL {
            for _ in 0..20 {
                let board = generator.fresh_candidate(tier);
                // Only the last filled container can run out of alternatives.
                let filled = &board.containers()[..tier.filled_count() - 1];
                assert!(
                    filled.iter().all(|c| !has_triple_run(c)),
                    "unexpected triple run:\n{}",
                    board
                );
            }
        }
    }

    #[test]
    fn test_generate_is_deterministic_per_seed() {
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(1_000, 10));
        let mut a = LevelGenerator::new(GeneratorConfig::default(), 42);
        let mut b = LevelGenerator::new(GeneratorConfig::default(), 42);
        let level_a = a.generate(Tier::Tutorial, &solver, &mut PatternCache::new(4));
        let level_b = b.generate(Tier::Tutorial, &solver, &mut PatternCache::new(4));
        assert_eq!(level_a.board, level_b.board);
        assert_eq!(level_a.attempts, level_b.attempts);
    }

    #[test]
    fn test_generate_validates_and_solution_replays() {
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(20_000, 40));
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 5);
        let level = generator.generate(Tier::Easy, &solver, &mut PatternCache::new(4));
        assert!(level.validated);
        let mut state = level.board.clone();
        for mv in level.solution.as_deref().unwrap() {
            assert!(state.apply_pour(*mv).is_some());
        }
        assert!(state.is_complete());
    }

    #[test]
    fn test_generate_falls_back_after_attempt_cap() {
        // A zero-depth budget can only accept already-solved boards.
        let solver = Solver::new(HeuristicWeights::default(), SearchBudget::new(1_000, 0));
        let config = GeneratorConfig {
            max_attempts: 3,
            ..GeneratorConfig::default()
        };
        let mut generator = LevelGenerator::new(config, 9);
        let mut cache = PatternCache::new(4);
        let level = generator.generate(Tier::Tutorial, &solver, &mut cache);
        assert!(!level.validated);
        assert_eq!(level.attempts, 3);
        assert!(level.solution.is_none());
        assert_eq!(level.board.len(), Tier::Tutorial.container_count());
        // Each zero-depth attempt discovers only its root.
        assert_eq!(level.explored, 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_medium_levels_are_cached_and_seed_hard() {
        let medium = Solver::new(HeuristicWeights::default(), SearchBudget::new(100_000, 70));
        let hard = Solver::new(HeuristicWeights::default(), SearchBudget::new(500_000, 100));
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 21);
        let mut cache = PatternCache::new(4);

        let level = generator.generate(Tier::Medium, &medium, &mut cache);
        assert!(level.validated);
        assert_eq!(cache.count_for(Tier::Medium), 1);

        let hard_level = generator.generate(Tier::Hard, &hard, &mut cache);
        assert!(hard_level.seeded);
        assert_eq!(hard_level.board.len(), Tier::Hard.container_count());
        let totals = color_totals(&hard_level.board);
        assert_eq!(totals.len(), Tier::Hard.color_count());
        assert!(totals.values().all(|&n| n == DEFAULT_CAPACITY));
        // Reused containers keep everything below their top unit.
        for container in level.board.containers().iter().filter(|c| !c.is_empty()) {
            let base = &container.units()[..container.len() - 1];
            assert!(hard_level
                .board
                .containers()
                .iter()
                .any(|c| c.units().starts_with(base)));
        }
        assert!(hard_level.explored > 0);
    }

    #[test]
    fn test_swap_tops_exchanges_top_units() {
        let board = board_from_rows(&["RGBY", "YBGR", "GGRR"], DEFAULT_CAPACITY).unwrap();
        let mut containers = board.containers().to_vec();
        swap_tops(&mut containers, 0, 1);
        let swapped = BoardState::new(containers);
        let expected = board_from_rows(&["RGBR", "YBGY", "GGRR"], DEFAULT_CAPACITY).unwrap();
        assert_eq!(swapped, expected);
        assert_eq!(color_totals(&swapped), color_totals(&board));
    }

    #[test]
    fn test_hard_without_cache_is_fresh() {
        let hard = Solver::new(HeuristicWeights::default(), SearchBudget::new(500_000, 100));
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 2);
        let level = generator.generate(Tier::Hard, &hard, &mut PatternCache::new(4));
        assert!(!level.seeded);
    }

    #[test]
    fn test_pattern_cache_evicts_oldest() {
        let mut cache = PatternCache::new(2);
        let mut generator = LevelGenerator::new(GeneratorConfig::default(), 1);
        let boards: Vec<BoardState> =
            (0..3).map(|_| generator.fresh_candidate(Tier::Easy)).collect();
        for b in &boards {
            cache.store(Tier::Easy, b.clone());
        }
        assert_eq!(cache.len(), 2);
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..10 {
            let chosen = cache.choose(Tier::Easy, &mut rng).unwrap();
            assert_ne!(chosen, &boards[0]);
        }
        assert!(cache.choose(Tier::Hard, &mut rng).is_none());

        let mut disabled = PatternCache::new(0);
        disabled.store(Tier::Easy, boards[0].clone());
        assert!(disabled.is_empty());
    }
}
