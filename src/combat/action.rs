//! Action requests and structured action results

use serde::{Deserialize, Serialize};

use super::combatant::{CombatantId, EffectKind};

/// What the acting unit does on its turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    BasicAttack,
    /// Ability by name, looked up on the actor
    Ability(String),
}

/// A decision made by the AI policy or submitted by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Required for attacks and damage abilities, optional for heals
    /// (defaults to the actor), ignored for buffs.
    pub target: Option<CombatantId>,
}

impl Action {
    pub fn basic_attack(target: CombatantId) -> Self {
        Self {
            kind: ActionKind::BasicAttack,
            target: Some(target),
        }
    }

    pub fn ability(name: impl Into<String>, target: Option<CombatantId>) -> Self {
        Self {
            kind: ActionKind::Ability(name.into()),
            target,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionSource {
    BasicAttack,
    Ability(String),
    Pet { pet: String, ability: String },
}

impl ActionSource {
    /// Name used in logs and damage breakdowns.
    pub fn label(&self) -> &str {
        match self {
            ActionSource::BasicAttack => "Attack",
            ActionSource::Ability(name) => name,
            ActionSource::Pet { ability, .. } => ability,
        }
    }
}

/// Damage landed on one target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub target: CombatantId,
    /// Health actually removed
    pub amount: f32,
    pub dodged: bool,
    /// The hit brought the target to 0
    pub defeated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionEffect {
    Damage(Vec<Hit>),
    Heal {
        target: CombatantId,
        amount: f32,
    },
    Buff {
        kind: EffectKind,
        magnitude: f32,
        duration: u32,
        targets: Vec<CombatantId>,
    },
    Revive {
        target: CombatantId,
        health: f32,
    },
}

/// Everything one resolution changed. Log lines and events derive from this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Acting unit (the owner, for pet abilities)
    pub actor: CombatantId,
    pub source: ActionSource,
    pub effect: ActionEffect,
}

impl ActionResult {
    pub fn total_damage(&self) -> f32 {
        match &self.effect {
            ActionEffect::Damage(hits) => hits.iter().map(|h| h.amount).sum(),
            _ => 0.0,
        }
    }

    pub fn defeated(&self) -> Vec<CombatantId> {
        match &self.effect {
            ActionEffect::Damage(hits) => hits.iter().filter(|h| h.defeated).map(|h| h.target).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_pet(&self) -> bool {
        matches!(self.source, ActionSource::Pet { .. })
    }
}
