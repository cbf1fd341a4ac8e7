//! Pets and pet ability slots
//!
//! A pet is equipped to one player unit. Its battle ability has a cooldown
//! measured in the owner's turns and, for some pets, a per-battle use limit.

use serde::{Deserialize, Serialize};

use super::combatant::{CombatantId, EffectKind, StatBlock};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PetEffect {
    /// Timed buff on every living member of the owner's team.
    /// `bonus` is a fraction (`0.05` = +5%).
    TeamBuff {
        effect: EffectKind,
        bonus: f32,
        duration: u32,
    },
    /// `floor(pet attack x ratio)` to the first living enemy, or to all of them.
    Damage {
        ratio: f32,
        #[serde(default)]
        aoe: bool,
    },
    /// Bring the first fallen ally back at a fraction of max health.
    Revive { health_ratio: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetAbility {
    pub name: String,
    pub effect: PetEffect,
    /// Owner turns between uses
    pub cooldown: u32,
    #[serde(default)]
    pub uses_per_battle: Option<u32>,
    #[serde(default)]
    pub description: String,
}

/// A pet instance as equipped on a hero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    /// Catalog id ("wolf", "phoenix")
    pub kind: String,
    pub name: String,
    pub level: u32,
    pub stats: StatBlock,
    pub ability: PetAbility,
}

/// Per-battle cooldown and use tracking for one equipped pet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PetSlot {
    pub owner: CombatantId,
    pub pet: Pet,
    cooldown: u32,
    uses_left: Option<u32>,
    exhausted: bool,
}

impl PetSlot {
    pub fn new(owner: CombatantId, pet: Pet) -> Self {
        let uses_left = pet.ability.uses_per_battle;
        Self {
            owner,
            pet,
            cooldown: 0,
            uses_left,
            exhausted: uses_left == Some(0),
        }
    }

    /// Back to battle-start state: ready, full uses.
    pub fn reset(&mut self) {
        self.cooldown = 0;
        self.uses_left = self.pet.ability.uses_per_battle;
        self.exhausted = self.uses_left == Some(0);
    }

    /// One owner turn has passed.
    pub fn tick(&mut self) {
        if !self.exhausted {
            self.cooldown = self.cooldown.saturating_sub(1);
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.exhausted && self.cooldown == 0
    }

    /// Turns until ready, `None` once the per-battle uses are spent.
    pub fn cooldown_remaining(&self) -> Option<u32> {
        if self.exhausted {
            None
        } else {
            Some(self.cooldown)
        }
    }

    pub fn uses_left(&self) -> Option<u32> {
        self.uses_left
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Start the cooldown after a successful use.
    pub(crate) fn consume(&mut self) {
        self.cooldown = self.pet.ability.cooldown;
        if let Some(uses) = self.uses_left.as_mut() {
            *uses = uses.saturating_sub(1);
            if *uses == 0 {
                self.exhausted = true;
            }
        }
    }
}
