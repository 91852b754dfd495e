//! Difficulty tiers and the level catalog.

use serde::{Deserialize, Serialize};

use crate::engine::{Color, UnitKind};

/// A named difficulty configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tutorial,
    Easy,
    Medium,
    Hard,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Tutorial, Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn container_count(&self) -> usize {
        match self {
            Tier::Tutorial => 4,
            Tier::Easy => 8,
            Tier::Medium => 12,
            Tier::Hard => 15,
        }
    }

    pub fn filled_count(&self) -> usize {
        match self {
            Tier::Tutorial => 3,
            Tier::Easy => 6,
            Tier::Medium => 10,
            Tier::Hard => 13,
        }
    }

    /// Each color fills exactly one container once sorted.
    pub fn color_count(&self) -> usize {
        self.filled_count()
    }

    pub fn empty_count(&self) -> usize {
        self.container_count() - self.filled_count()
    }

    pub fn unit_kind(&self) -> UnitKind {
        UnitKind::Liquid
    }

    /// Colors the tier always uses, if fixed. The tutorial teaches with red,
    /// green and blue; other tiers draw a random subset of the palette.
    pub fn fixed_colors(&self) -> Option<&'static [Color]> {
        match self {
            Tier::Tutorial => Some(&[Color::Red, Color::Green, Color::Blue]),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Tutorial => "tutorial",
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown tier '{}' (expected tutorial, easy, medium or hard)", s)
            })
    }
}

pub const LEVELS_PER_TIER: usize = 9;

/// One entry of the level picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    /// 1-based, unique across the catalog.
    pub id: u32,
    pub tier: Tier,
}

impl Level {
    /// The full catalog: nine levels per tier, ids counting up from 1 in tier order.
    pub fn all() -> Vec<Level> {
        Tier::ALL
            .iter()
            .enumerate()
            .flat_map(|(tier_idx, &tier)| {
                (0..LEVELS_PER_TIER).map(move |i| Level {
                    id: (tier_idx * LEVELS_PER_TIER + i + 1) as u32,
                    tier,
                })
            })
            .collect()
    }

    pub fn by_id(id: u32) -> Option<Level> {
        Level::all().into_iter().find(|l| l.id == id)
    }

    /// Generation seed for this level, so a level id always maps to the same layout.
    pub fn seed(&self) -> u64 {
        0x5eed_0000 + self.id as u64
    }
}
