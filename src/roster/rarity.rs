//! Rarity tiers and weighted rarity draws

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BattleError;

/// Hero/enemy rarity, ordered from lowest to highest tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn all() -> &'static [Rarity] {
        &[
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Multiplier applied to every base stat, in percent.
    pub fn stat_percent(&self) -> u64 {
        match self {
            Rarity::Common => 100,
            Rarity::Uncommon => 120,
            Rarity::Rare => 150,
            Rarity::Epic => 200,
            Rarity::Legendary => 300,
        }
    }

    /// Probability of this rarity on a standard summon.
    pub fn summon_chance(&self) -> f32 {
        match self {
            Rarity::Common => 0.6,
            Rarity::Uncommon => 0.25,
            Rarity::Rare => 0.1,
            Rarity::Epic => 0.04,
            Rarity::Legendary => 0.01,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rarity {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rarity::all()
            .iter()
            .copied()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BattleError::configuration("rarity", s))
    }
}

/// Cumulative-probability table used to roll a rarity.
///
/// Buckets are checked in order; the first whose running total reaches the
/// roll wins. Probabilities that sum below 1.0 leave a gap that falls back to
/// `Rarity::Common`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RarityTable {
    buckets: Vec<(Rarity, f32)>,
}

impl RarityTable {
    pub fn new(buckets: Vec<(Rarity, f32)>) -> Result<Self, BattleError> {
        let table = Self { buckets };
        table.validate()?;
        Ok(table)
    }

    /// The standard summon distribution.
    pub fn summon() -> Self {
        Self {
            buckets: Rarity::all()
                .iter()
                .map(|r| (*r, r.summon_chance()))
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), BattleError> {
        if let Some((rarity, p)) = self
            .buckets
            .iter()
            .find(|(_, p)| !p.is_finite() || *p < 0.0)
        {
            return Err(BattleError::invalid(format!(
                "rarity weight for {} must be a non-negative number, got {}",
                rarity, p
            )));
        }
        Ok(())
    }

    pub fn buckets(&self) -> &[(Rarity, f32)] {
        &self.buckets
    }

    /// Resolve a uniform roll in `[0, 1)` against the table.
    pub fn draw(&self, roll: f32) -> Rarity {
        let mut cumulative = 0.0;
        for (rarity, probability) in &self.buckets {
            cumulative += probability;
            if roll <= cumulative {
                return *rarity;
            }
        }
        Rarity::Common
    }
}
