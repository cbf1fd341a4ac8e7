//! Action resolution
//!
//! Applies a chosen action to the battle state and reports what changed.
//! Every function validates first and mutates second, so an `Err` leaves the
//! state untouched.

use bevy::log::debug;

use crate::error::BattleError;
use crate::rng::GameRng;

use super::action::{ActionEffect, ActionResult, ActionSource, Hit};
use super::combatant::{floor_scaled, Ability, AbilityKind, CombatantId, EffectKind, Side};
use super::effects::StatusEffect;
use super::pets::PetEffect;
use super::state::BattleState;

/// Turns a stored ability effect lasts when nothing else is configured.
pub const DEFAULT_EFFECT_DURATION: u32 = 2;

/// `max(1, attack x multiplier - defense / 2)`
pub fn damage_formula(attack: f32, multiplier: f32, defense: f32) -> f32 {
    (attack * multiplier - defense / 2.0).max(1.0)
}

fn acting_side(state: &BattleState, actor: CombatantId) -> Result<Side, BattleError> {
    let unit = state
        .combatant(actor)
        .ok_or_else(|| BattleError::invalid(format!("unknown actor {}", actor)))?;
    if !unit.is_alive() {
        return Err(BattleError::invalid(format!("{} is defeated and cannot act", unit.name)));
    }
    Ok(unit.side)
}

/// Check that `target` is a living member of `expected`.
pub fn validate_target(state: &BattleState, target: CombatantId, expected: Side) -> Result<(), BattleError> {
    if state.all_defeated(expected) {
        return Err(BattleError::NoValidTarget(expected));
    }
    let unit = state
        .combatant(target)
        .ok_or_else(|| BattleError::invalid(format!("unknown target {}", target)))?;
    if unit.side != expected {
        return Err(BattleError::invalid(format!(
            "{} is on the {} side, expected a {} target",
            unit.name, unit.side, expected
        )));
    }
    if !unit.is_alive() {
        return Err(BattleError::invalid(format!("{} is already defeated", unit.name)));
    }
    Ok(())
}

/// One damaging strike with buff read-back: attack and defense multipliers
/// feed the formula, then dodge and damage reduction scale the result, and
/// the floor at 1 is applied last.
fn strike(
    state: &mut BattleState,
    attacker: CombatantId,
    defender: CombatantId,
    multiplier: f32,
    rng: &mut GameRng,
) -> Result<Hit, BattleError> {
    let attack = state
        .combatant(attacker)
        .map(|c| c.stats.attack)
        .ok_or_else(|| BattleError::invalid(format!("unknown actor {}", attacker)))?;
    let defense = state
        .combatant(defender)
        .map(|c| c.stats.defense)
        .ok_or_else(|| BattleError::invalid(format!("unknown target {}", defender)))?;

    let attack_mods = state.effects.modifiers(attacker);
    let defense_mods = state.effects.modifiers(defender);

    let raw = attack * attack_mods.attack * multiplier - defense * defense_mods.defense / 2.0;
    let dodged = rng.chance(defense_mods.dodge_chance);
    let scaled = if dodged { 0.0 } else { raw * defense_mods.damage_taken };
    let amount = scaled.max(1.0);

    let target = state
        .combatant_mut(defender)
        .ok_or_else(|| BattleError::invalid(format!("unknown target {}", defender)))?;
    let dealt = target.take_damage(amount);
    target.debug_validate();

    Ok(Hit {
        target: defender,
        amount: dealt,
        dodged,
        defeated: !target.is_alive(),
    })
}

pub fn resolve_basic_attack(
    state: &mut BattleState,
    attacker: CombatantId,
    defender: CombatantId,
    rng: &mut GameRng,
) -> Result<ActionResult, BattleError> {
    let side = acting_side(state, attacker)?;
    validate_target(state, defender, side.opponent())?;

    let hit = strike(state, attacker, defender, 1.0, rng)?;
    Ok(ActionResult {
        actor: attacker,
        source: ActionSource::BasicAttack,
        effect: ActionEffect::Damage(vec![hit]),
    })
}

/// Resolve one of the actor's abilities.
///
/// Damage abilities need an opposing target. Heals default to the caster when
/// no target is given. Taunt lands on the caster only; every other buff fans
/// out to the caster's living team.
pub fn resolve_ability(
    state: &mut BattleState,
    user: CombatantId,
    ability: &Ability,
    target: Option<CombatantId>,
    effect_duration: u32,
    rng: &mut GameRng,
) -> Result<ActionResult, BattleError> {
    let side = acting_side(state, user)?;
    let source = ActionSource::Ability(ability.name.clone());

    let effect = match ability.kind {
        AbilityKind::Damage { multiplier } => {
            let enemies = side.opponent();
            if state.all_defeated(enemies) {
                return Err(BattleError::NoValidTarget(enemies));
            }
            let target = target.ok_or_else(|| {
                BattleError::invalid(format!("{} requires a target", ability.name))
            })?;
            validate_target(state, target, enemies)?;
            ActionEffect::Damage(vec![strike(state, user, target, multiplier, rng)?])
        }
        AbilityKind::Effect {
            effect: EffectKind::Heal,
            value,
        } => {
            let target = target.unwrap_or(user);
            validate_target(state, target, side)?;
            let unit = state
                .combatant_mut(target)
                .ok_or_else(|| BattleError::invalid(format!("unknown target {}", target)))?;
            let amount = floor_scaled(unit.max_health(), value);
            let healed = unit.heal(amount);
            ActionEffect::Heal {
                target,
                amount: healed,
            }
        }
        AbilityKind::Effect { effect, value } => {
            let targets = if effect == EffectKind::Taunt {
                vec![user]
            } else {
                state.living(side)
            };
            for id in &targets {
                state.effects.apply(StatusEffect {
                    target: *id,
                    kind: effect,
                    magnitude: value,
                    remaining_turns: effect_duration,
                    source: ability.name.clone(),
                });
            }
            ActionEffect::Buff {
                kind: effect,
                magnitude: value,
                duration: effect_duration,
                targets,
            }
        }
    };

    Ok(ActionResult {
        actor: user,
        source,
        effect,
    })
}

/// Fire the pet equipped on `owner`.
///
/// Refuses with `AbilityUnavailable` when no pet is equipped, the ability is
/// cooling down or spent, or a revive finds nobody to bring back. The
/// cooldown only starts once the ability actually lands.
pub fn resolve_pet_ability(state: &mut BattleState, owner: CombatantId) -> Result<ActionResult, BattleError> {
    let side = state
        .combatant(owner)
        .map(|c| c.side)
        .ok_or_else(|| BattleError::invalid(format!("unknown pet owner {}", owner)))?;
    let slot = state
        .pet_slot(owner)
        .ok_or_else(|| BattleError::AbilityUnavailable(format!("no pet equipped on {}", owner)))?;
    if !slot.is_ready() {
        return Err(BattleError::AbilityUnavailable(format!(
            "{} is not ready",
            slot.pet.ability.name
        )));
    }
    let pet = slot.pet.clone();
    let source = ActionSource::Pet {
        pet: pet.name.clone(),
        ability: pet.ability.name.clone(),
    };

    let effect = match pet.ability.effect {
        PetEffect::TeamBuff {
            effect,
            bonus,
            duration,
        } => {
            let magnitude = effect.magnitude_from_bonus(bonus);
            let targets = state.living(side);
            for id in &targets {
                state.effects.apply(StatusEffect {
                    target: *id,
                    kind: effect,
                    magnitude,
                    remaining_turns: duration,
                    source: pet.ability.name.clone(),
                });
            }
            ActionEffect::Buff {
                kind: effect,
                magnitude,
                duration,
                targets,
            }
        }
        PetEffect::Damage { ratio, aoe } => {
            let enemies = side.opponent();
            let living = state.living(enemies);
            if living.is_empty() {
                return Err(BattleError::NoValidTarget(enemies));
            }
            let targets = if aoe { living } else { vec![living[0]] };
            let amount = floor_scaled(pet.stats.attack, ratio);
            let mut hits = Vec::with_capacity(targets.len());
            for id in targets {
                if let Some(unit) = state.combatant_mut(id) {
                    let dealt = unit.take_damage(amount);
                    hits.push(Hit {
                        target: id,
                        amount: dealt,
                        dodged: false,
                        defeated: !unit.is_alive(),
                    });
                }
            }
            ActionEffect::Damage(hits)
        }
        PetEffect::Revive { health_ratio } => {
            let fallen = state
                .team_mut(side)
                .iter_mut()
                .find(|c| !c.is_alive())
                .ok_or_else(|| BattleError::AbilityUnavailable("no fallen ally to revive".to_string()))?;
            let health = floor_scaled(fallen.max_health(), health_ratio).max(1.0);
            fallen.current_health = health.min(fallen.max_health());
            ActionEffect::Revive {
                target: fallen.id,
                health: fallen.current_health,
            }
        }
    };

    if let Some(slot) = state.pet_slot_mut(owner) {
        slot.consume();
    }
    debug!("Pet ability {} resolved for {}", pet.ability.name, owner);

    Ok(ActionResult {
        actor: owner,
        source,
        effect,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{Combatant, StatBlock};
    use crate::combat::pets::{Pet, PetAbility, PetSlot};
    use crate::combat::state::BattleContext;

    fn duel(attacker: StatBlock, defender: StatBlock) -> BattleState {
        BattleState::new(
            vec![Combatant::new(CombatantId(1), "Aiden", Side::Player, attacker)],
            vec![Combatant::new(CombatantId::enemy(0), "Lyra", Side::Opposing, defender)],
            BattleContext::default(),
        )
    }

    fn pet(effect: PetEffect, uses: Option<u32>) -> Pet {
        Pet {
            kind: "test".into(),
            name: "Test Pet".into(),
            level: 1,
            stats: StatBlock::new(50.0, 10.0, 5.0, 10.0),
            ability: PetAbility {
                name: "Test Ability".into(),
                effect,
                cooldown: 3,
                uses_per_battle: uses,
                description: String::new(),
            },
        }
    }

    #[test]
    fn test_damage_floor_holds_for_any_stats() {
        for attack in [0.0, 1.0, 5.0, 50.0] {
            for defense in [0.0, 10.0, 400.0] {
                assert!(damage_formula(attack, 1.0, defense) >= 1.0);
            }
        }
    }

    #[test]
    fn test_basic_attack_scenario() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        let mut rng = GameRng::from_seed(1);
        let result = resolve_basic_attack(&mut state, CombatantId(1), CombatantId::enemy(0), &mut rng).unwrap();
        assert_eq!(result.total_damage(), 15.0);
        assert_eq!(state.opposing_team[0].current_health, 85.0);
    }

    #[test]
    fn test_attack_buff_read_back() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        state.effects.apply(StatusEffect {
            target: CombatantId(1),
            kind: EffectKind::AttackBuff,
            magnitude: 1.5,
            remaining_turns: 2,
            source: "Blessing".into(),
        });
        let mut rng = GameRng::from_seed(1);
        let result = resolve_basic_attack(&mut state, CombatantId(1), CombatantId::enemy(0), &mut rng).unwrap();
        assert_eq!(result.total_damage(), 25.0);
    }

    #[test]
    fn test_certain_dodge_grazes_for_one() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        state.effects.apply(StatusEffect {
            target: CombatantId::enemy(0),
            kind: EffectKind::Dodge,
            magnitude: 1.0,
            remaining_turns: 2,
            source: "Quick Dodge".into(),
        });
        let mut rng = GameRng::from_seed(3);
        let result = resolve_basic_attack(&mut state, CombatantId(1), CombatantId::enemy(0), &mut rng).unwrap();
        match result.effect {
            ActionEffect::Damage(hits) => {
                assert!(hits[0].dodged);
                assert_eq!(hits[0].amount, 1.0);
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_wrong_side_target_mutates_nothing() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        let mut rng = GameRng::from_seed(1);
        let err = resolve_basic_attack(&mut state, CombatantId(1), CombatantId(1), &mut rng).unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
        assert_eq!(state.player_team[0].current_health, 100.0);
    }

    #[test]
    fn test_taunt_only_on_caster() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        state
            .player_team
            .push(Combatant::new(CombatantId(2), "Kael", Side::Player, StatBlock::new(100.0, 10.0, 10.0, 5.0)));
        let taunt = Ability::effect("Taunt", EffectKind::Taunt, 2.0);
        let mut rng = GameRng::from_seed(1);
        resolve_ability(&mut state, CombatantId(1), &taunt, None, 2, &mut rng).unwrap();
        assert_eq!(state.effects.len(), 1);
        assert_eq!(state.effects.for_target(CombatantId(1)).count(), 1);
    }

    #[test]
    fn test_pet_aoe_hits_every_living_enemy() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        let mut second = Combatant::new(CombatantId::enemy(1), "Orion", Side::Opposing, StatBlock::new(100.0, 1.0, 1.0, 1.0));
        second.current_health = 0.0;
        state.opposing_team.push(second);
        state
            .pets
            .push(PetSlot::new(CombatantId(1), pet(PetEffect::Damage { ratio: 0.5, aoe: true }, None)));

        let result = resolve_pet_ability(&mut state, CombatantId(1)).unwrap();
        match result.effect {
            ActionEffect::Damage(hits) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].amount, 5.0);
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(state.pet_slot(CombatantId(1)).unwrap().cooldown_remaining(), Some(3));
    }

    #[test]
    fn test_revive_without_fallen_ally_is_unavailable() {
        let mut state = duel(StatBlock::new(100.0, 20.0, 10.0, 10.0), StatBlock::new(100.0, 20.0, 10.0, 10.0));
        state
            .pets
            .push(PetSlot::new(CombatantId(1), pet(PetEffect::Revive { health_ratio: 0.3 }, Some(1))));
        let before = state.player_team.clone();

        let err = resolve_pet_ability(&mut state, CombatantId(1)).unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(state.player_team, before);
        let slot = state.pet_slot(CombatantId(1)).unwrap();
        assert!(slot.is_ready());
        assert_eq!(slot.uses_left(), Some(1));
    }
}
