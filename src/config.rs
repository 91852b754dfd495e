use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::generator::GeneratorConfig;
use crate::heuristics::HeuristicWeights;
use crate::solver::{SearchBudget, Solver};
use crate::tier::Tier;

/// Solver budget for each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBudgets {
    pub tutorial: SearchBudget,
    pub easy: SearchBudget,
    pub medium: SearchBudget,
    pub hard: SearchBudget,
}

impl Default for TierBudgets {
    fn default() -> Self {
        TierBudgets {
            tutorial: SearchBudget::new(1_000, 10),
            easy: SearchBudget::new(20_000, 40),
            medium: SearchBudget::new(100_000, 70),
            hard: SearchBudget::new(500_000, 100),
        }
    }
}

impl TierBudgets {
    pub fn for_tier(&self, tier: Tier) -> SearchBudget {
        match tier {
            Tier::Tutorial => self.tutorial,
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard => self.hard,
        }
    }
}

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub heuristic: HeuristicWeights,
    pub budgets: TierBudgets,
    pub generator: GeneratorConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// A solver using this configuration's weights and `tier`'s budget.
    pub fn solver_for(&self, tier: Tier) -> Solver {
        Solver::new(self.heuristic.clone(), self.budgets.for_tier(tier))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.heuristic;
        if w.mixed_container <= w.accessible_match || w.mixed_container <= w.buried_match {
            return Err(ConfigError::Validation(
                "heuristic.mixed_container must exceed accessible_match and buried_match".into(),
            ));
        }
        if w.buried_match <= w.accessible_match {
            return Err(ConfigError::Validation(
                "heuristic.buried_match must exceed heuristic.accessible_match".into(),
            ));
        }

        let mut previous: Option<SearchBudget> = None;
        for tier in Tier::ALL {
            let budget = self.budgets.for_tier(tier);
            if budget.max_states == 0 || budget.max_depth == 0 {
                return Err(ConfigError::Validation(format!(
                    "budgets.{} must have max_states and max_depth > 0",
                    tier
                )));
            }
            if let Some(prev) = previous {
                if budget.max_states < prev.max_states || budget.max_depth < prev.max_depth {
                    return Err(ConfigError::Validation(format!(
                        "budgets.{} must not be smaller than the previous tier",
                        tier
                    )));
                }
            }
            previous = Some(budget);
        }

        let g = &self.generator;
        if g.capacity == 0 {
            return Err(ConfigError::Validation(
                "generator.capacity must be > 0".into(),
            ));
        }
        if g.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "generator.max_attempts must be > 0".into(),
            ));
        }
        if g.seed_from_cache {
            if g.cache_tier.filled_count() > g.seed_tier.filled_count() {
                return Err(ConfigError::Validation(
                    "generator.cache_tier must not have more filled containers \
                     than generator.seed_tier"
                        .into(),
                ));
            }
            if g.cache_tier == g.seed_tier {
                return Err(ConfigError::Validation(
                    "generator.cache_tier and generator.seed_tier must differ".into(),
                ));
            }
        }
        Ok(())
    }
}
