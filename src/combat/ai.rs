//! AI policy
//!
//! Memoryless: every decision is a fresh roll. Used for opposing units and for
//! player units while auto-battle is on.

use crate::rng::GameRng;

use super::action::{Action, ActionKind};
use super::combatant::Combatant;
use super::state::BattleState;

/// Chance of picking an ability over a basic attack.
pub const DEFAULT_ABILITY_CHANCE: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiPolicy {
    pub ability_chance: f32,
}

impl Default for AiPolicy {
    fn default() -> Self {
        Self {
            ability_chance: DEFAULT_ABILITY_CHANCE,
        }
    }
}

impl AiPolicy {
    pub fn new(ability_chance: f32) -> Self {
        Self { ability_chance }
    }

    /// Pick an action for `unit`.
    ///
    /// Rolls for a random ability first, otherwise a basic attack. Attacks and
    /// damage abilities target a random living opponent; heals target a random
    /// living ally. Returns `None` when the unit has nobody to act on.
    pub fn choose_action(&self, unit: &Combatant, state: &BattleState, rng: &mut GameRng) -> Option<Action> {
        let enemies = state.living(unit.side.opponent());
        if enemies.is_empty() {
            return None;
        }

        if !unit.abilities.is_empty() && rng.chance(self.ability_chance) {
            let ability = &unit.abilities[rng.pick_index(unit.abilities.len())];
            let pool = if ability.is_heal() {
                state.living(unit.side)
            } else {
                enemies
            };
            let target = pool[rng.pick_index(pool.len())];
            return Some(Action {
                kind: ActionKind::Ability(ability.name.clone()),
                target: Some(target),
            });
        }

        let target = enemies[rng.pick_index(enemies.len())];
        Some(Action::basic_attack(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{Ability, CombatantId, EffectKind, Side, StatBlock};
    use crate::combat::state::BattleContext;

    fn state() -> BattleState {
        let stats = StatBlock::new(100.0, 10.0, 5.0, 5.0);
        let healer = Combatant::new(CombatantId(1), "Elara", Side::Player, stats)
            .with_abilities([Ability::effect("Heal", EffectKind::Heal, 0.2)]);
        let mut fallen = Combatant::new(CombatantId::enemy(0), "Riven", Side::Opposing, stats);
        fallen.current_health = 0.0;
        let standing = Combatant::new(CombatantId::enemy(1), "Nova", Side::Opposing, stats);
        BattleState::new(vec![healer], vec![fallen, standing], BattleContext::default())
    }

    #[test]
    fn test_targets_only_living_opponents() {
        let state = state();
        let unit = state.player_team[0].clone();
        let policy = AiPolicy::new(0.0);
        let mut rng = GameRng::from_seed(11);
        for _ in 0..20 {
            let action = policy.choose_action(&unit, &state, &mut rng).unwrap();
            assert_eq!(action, Action::basic_attack(CombatantId::enemy(1)));
        }
    }

    #[test]
    fn test_heal_targets_an_ally() {
        let state = state();
        let unit = state.player_team[0].clone();
        let policy = AiPolicy::new(1.0);
        let mut rng = GameRng::from_seed(5);
        let action = policy.choose_action(&unit, &state, &mut rng).unwrap();
        assert_eq!(action.kind, ActionKind::Ability("Heal".into()));
        assert_eq!(action.target, Some(CombatantId(1)));
    }

    #[test]
    fn test_no_action_without_opponents() {
        let mut state = state();
        state.opposing_team[1].current_health = 0.0;
        let unit = state.player_team[0].clone();
        let mut rng = GameRng::from_seed(5);
        assert!(AiPolicy::default().choose_action(&unit, &state, &mut rng).is_none());
    }
}
