//! Status effects
//!
//! Timed buffs attached to a combatant id. Durations count the owner's turn
//! steps, not global turns.

use serde::{Deserialize, Serialize};

use super::combatant::{CombatantId, EffectKind};

/// A timed buff on one combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Unit the effect applies to
    pub target: CombatantId,
    pub kind: EffectKind,
    /// Multiplier for stat buffs, chance for dodge, fraction for damage reduction
    pub magnitude: f32,
    /// Owner turn steps left before expiry
    pub remaining_turns: u32,
    /// Ability or pet ability that produced the effect
    pub source: String,
}

/// Effect read-back for one unit at the moment a formula needs it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectModifiers {
    pub attack: f32,
    pub defense: f32,
    pub speed: f32,
    /// Summed dodge chance, capped at 1
    pub dodge_chance: f32,
    /// Multiplier applied to incoming damage after mitigation
    pub damage_taken: f32,
}

impl Default for EffectModifiers {
    fn default() -> Self {
        Self {
            attack: 1.0,
            defense: 1.0,
            speed: 1.0,
            dodge_chance: 0.0,
            damage_taken: 1.0,
        }
    }
}

/// Every effect active in the current battle.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ActiveEffects {
    effects: Vec<StatusEffect>,
}

impl ActiveEffects {
    /// Add an effect. Zero-duration effects and heals are dropped.
    pub fn apply(&mut self, effect: StatusEffect) {
        if effect.remaining_turns == 0 || effect.kind == EffectKind::Heal {
            return;
        }
        self.effects.push(effect);
    }

    /// Decrement every effect on `unit` and remove those that ran out.
    /// Effects on other units are untouched. Returns the expired effects.
    pub fn tick(&mut self, unit: CombatantId) -> Vec<StatusEffect> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            if effect.target != unit {
                return true;
            }
            effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
            if effect.remaining_turns == 0 {
                expired.push(effect.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn for_target(&self, unit: CombatantId) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter().filter(move |e| e.target == unit)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Fold the unit's active effects into formula inputs. Stat multipliers
    /// and damage reductions stack multiplicatively; dodge chances add.
    pub fn modifiers(&self, unit: CombatantId) -> EffectModifiers {
        let mut mods = EffectModifiers::default();
        for effect in self.for_target(unit) {
            match effect.kind {
                EffectKind::AttackBuff => mods.attack *= effect.magnitude,
                EffectKind::DefenseBuff => mods.defense *= effect.magnitude,
                EffectKind::SpeedBuff => mods.speed *= effect.magnitude,
                EffectKind::Dodge => mods.dodge_chance += effect.magnitude,
                EffectKind::DamageReduction => {
                    mods.damage_taken *= (1.0 - effect.magnitude).clamp(0.0, 1.0)
                }
                EffectKind::Heal | EffectKind::Taunt => {}
            }
        }
        mods.dodge_chance = mods.dodge_chance.clamp(0.0, 1.0);
        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(target: u64, kind: EffectKind, magnitude: f32, turns: u32) -> StatusEffect {
        StatusEffect {
            target: CombatantId(target),
            kind,
            magnitude,
            remaining_turns: turns,
            source: "test".into(),
        }
    }

    #[test]
    fn test_tick_only_touches_owner() {
        let mut effects = ActiveEffects::default();
        effects.apply(effect(1, EffectKind::AttackBuff, 1.5, 2));
        effects.apply(effect(2, EffectKind::AttackBuff, 1.5, 1));

        assert!(effects.tick(CombatantId(1)).is_empty());
        assert_eq!(effects.len(), 2);

        let expired = effects.tick(CombatantId(1));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].target, CombatantId(1));
        assert_eq!(effects.len(), 1);
        assert_eq!(effects.for_target(CombatantId(2)).count(), 1);
    }

    #[test]
    fn test_heal_is_never_stored() {
        let mut effects = ActiveEffects::default();
        effects.apply(effect(1, EffectKind::Heal, 0.2, 2));
        effects.apply(effect(1, EffectKind::DefenseBuff, 1.5, 0));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_modifiers_stack() {
        let mut effects = ActiveEffects::default();
        effects.apply(effect(1, EffectKind::DefenseBuff, 1.5, 2));
        effects.apply(effect(1, EffectKind::DefenseBuff, 2.0, 2));
        effects.apply(effect(1, EffectKind::Dodge, 0.7, 2));
        effects.apply(effect(1, EffectKind::Dodge, 0.6, 2));
        effects.apply(effect(1, EffectKind::DamageReduction, 0.5, 2));

        let mods = effects.modifiers(CombatantId(1));
        assert_eq!(mods.defense, 3.0);
        assert_eq!(mods.attack, 1.0);
        assert_eq!(mods.dodge_chance, 1.0);
        assert_eq!(mods.damage_taken, 0.5);
        assert_eq!(effects.modifiers(CombatantId(9)), EffectModifiers::default());
    }
}
