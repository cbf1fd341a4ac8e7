//! Battle session
//!
//! `BattleSession` owns one battle at a time and drives the turn loop:
//! outcome check, effect tick, pet trigger, then an AI or player action,
//! then another outcome check and a pointer advance.
//!
//! Two step modes are supported. `RunToInput` keeps processing turns until a
//! player decision is needed or the battle ends, which is what an interactive
//! front end wants. `Manual` processes nothing on its own; the caller drives
//! it with `step()`, one unit at a time (used by the headless runner).

use bevy::log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{BattleRules, GameCatalog};
use crate::combat::action::{Action, ActionKind, ActionResult};
use crate::combat::ai::AiPolicy;
use crate::combat::combatant::{Combatant, CombatantId, Side};
use crate::combat::effects::StatusEffect;
use crate::combat::events::{BattleEvent, BattleObserver, RewardIssuer};
use crate::combat::log::{BattleMetadata, CombatLog, CombatLogEventType};
use crate::combat::outcome::{detect_outcome, BattlePhase};
use crate::combat::pets::{Pet, PetSlot};
use crate::combat::resolver;
use crate::combat::scheduler;
use crate::combat::state::{BattleContext, BattleState};
use crate::error::BattleError;
use crate::rng::GameRng;
use crate::roster::modifiers::StatModifierProvider;
use crate::roster::{build_encounter, Encounter};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepMode {
    /// Keep resolving turns until player input is needed or the battle ends
    #[default]
    RunToInput,
    /// Only advance when `step()` is called
    Manual,
}

/// Pet cooldown state as seen from outside the session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PetStatus {
    pub owner: CombatantId,
    pub pet: String,
    pub ability: String,
    /// `None` once the per-battle uses are spent
    pub cooldown: Option<u32>,
    pub uses_left: Option<u32>,
}

impl From<&PetSlot> for PetStatus {
    fn from(slot: &PetSlot) -> Self {
        Self {
            owner: slot.owner,
            pet: slot.pet.name.clone(),
            ability: slot.pet.ability.name.clone(),
            cooldown: slot.cooldown_remaining(),
            uses_left: slot.uses_left(),
        }
    }
}

/// Read-only copy of the battle state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BattleSnapshot {
    pub phase: BattlePhase,
    pub context: BattleContext,
    pub player_team: Vec<Combatant>,
    pub opposing_team: Vec<Combatant>,
    /// Ids in initiative order
    pub turn_order: Vec<CombatantId>,
    pub current_actor: Option<CombatantId>,
    pub awaiting: Option<CombatantId>,
    pub auto_battle: bool,
    pub effects: Vec<StatusEffect>,
    pub pets: Vec<PetStatus>,
    pub turns_taken: u32,
}

impl BattleSnapshot {
    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.player_team
            .iter()
            .chain(self.opposing_team.iter())
            .find(|c| c.id == id)
    }
}

/// Everything that happened in response to one session call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TurnResult {
    pub actions: Vec<ActionResult>,
    pub phase: BattlePhase,
    pub awaiting: Option<CombatantId>,
}

pub struct BattleSession {
    catalog: Arc<GameCatalog>,
    rules: BattleRules,
    ai: AiPolicy,
    rng: GameRng,
    state: BattleState,
    log: CombatLog,
    mode: StepMode,
    observers: Vec<Box<dyn BattleObserver>>,
    rewards: Option<Box<dyn RewardIssuer>>,
    modifiers: Option<Box<dyn StatModifierProvider>>,
    equipped_pets: BTreeMap<CombatantId, Pet>,
}

impl BattleSession {
    pub fn new(catalog: Arc<GameCatalog>, rng: GameRng) -> Self {
        let rules = catalog.rules.clone();
        Self {
            ai: AiPolicy::new(rules.ai_ability_chance),
            rules,
            catalog,
            rng,
            state: BattleState::default(),
            log: CombatLog::default(),
            mode: StepMode::default(),
            observers: Vec::new(),
            rewards: None,
            modifiers: None,
            equipped_pets: BTreeMap::new(),
        }
    }

    pub fn with_step_mode(mut self, mode: StepMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_step_mode(&mut self, mode: StepMode) {
        self.mode = mode;
    }

    pub fn add_observer(&mut self, observer: Box<dyn BattleObserver>) {
        self.observers.push(observer);
    }

    pub fn set_reward_issuer(&mut self, issuer: Box<dyn RewardIssuer>) {
        self.rewards = Some(issuer);
    }

    pub fn set_stat_modifiers(&mut self, provider: Box<dyn StatModifierProvider>) {
        self.modifiers = Some(provider);
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &BattleRules {
        &self.rules
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn random_seed(&self) -> Option<u64> {
        self.rng.seed
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a new battle, replacing whatever battle the session held.
    ///
    /// Player units are copied, restored to full health and given their
    /// modified stats. Enemies are built from the encounter. On error no
    /// battle state is created.
    pub fn start_battle(&mut self, player_team: &[Combatant], encounter: &Encounter) -> Result<BattleSnapshot, BattleError> {
        if player_team.is_empty() {
            return Err(BattleError::EmptyTeam);
        }

        let mut team = Vec::with_capacity(player_team.len());
        for unit in player_team {
            if unit.id.is_enemy_range() {
                return Err(BattleError::invalid(format!(
                    "player id {} collides with the enemy id range",
                    unit.id
                )));
            }
            if team.iter().any(|c: &Combatant| c.id == unit.id) {
                return Err(BattleError::invalid(format!("duplicate combatant id {}", unit.id)));
            }
            if unit.level < 1 {
                return Err(BattleError::invalid(format!("{} has level 0", unit.name)));
            }

            let mut copy = unit.clone();
            copy.side = Side::Player;
            if let Some(stats) = self.modifiers.as_ref().and_then(|m| m.adjusted_stats(unit.id)) {
                copy.stats = stats;
            }
            copy.stats.validate()?;
            copy.restore();
            team.push(copy);
        }

        let enemies = build_encounter(&self.catalog, encounter, &mut self.rng)?;
        if enemies.is_empty() {
            return Err(BattleError::invalid("encounter has no enemies"));
        }

        self.state = BattleState::new(team, enemies, encounter.context.clone());
        self.state.phase = BattlePhase::InProgress;
        self.reset_cooldowns();

        self.log.clear();
        for unit in self.state.player_team.iter().chain(self.state.opposing_team.iter()) {
            self.log.register_combatant(unit.id, unit.name.clone());
        }
        let opening = format!(
            "Battle started: {} heroes vs {} enemies ({})",
            self.state.player_team.len(),
            self.state.opposing_team.len(),
            self.state.context.describe()
        );
        info!("{}", opening);
        self.write_line(CombatLogEventType::MatchEvent, opening);

        let turn_order = self
            .state
            .turn_order
            .iter()
            .filter_map(|r| self.state.unit(*r).map(|c| c.id))
            .collect();
        self.emit(BattleEvent::BattleStarted {
            context: self.state.context.clone(),
            player_team: self.state.player_team.iter().map(|c| c.id).collect(),
            opposing_team: self.state.opposing_team.iter().map(|c| c.id).collect(),
            turn_order,
        });

        self.continue_battle();
        Ok(self.snapshot())
    }

    /// Equip a pet on a hero. Takes effect from the next cooldown reset.
    pub fn equip_pet(&mut self, owner: CombatantId, pet: Pet) -> Option<Pet> {
        self.equipped_pets.insert(owner, pet)
    }

    pub fn unequip_pet(&mut self, owner: CombatantId) -> Option<Pet> {
        self.equipped_pets.remove(&owner)
    }

    pub fn equipped_pet(&self, owner: CombatantId) -> Option<&Pet> {
        self.equipped_pets.get(&owner)
    }

    /// Rebuild the pet slots for the current player team with every ability
    /// ready and every use restored.
    pub fn reset_cooldowns(&mut self) {
        self.state.pets = self
            .state
            .player_team
            .iter()
            .filter_map(|unit| {
                self.equipped_pets
                    .get(&unit.id)
                    .map(|pet| PetSlot::new(unit.id, pet.clone()))
            })
            .collect();
    }

    /// Resolve the pending player's action.
    pub fn submit_player_action(&mut self, action: Action) -> Result<TurnResult, BattleError> {
        self.ensure_in_progress()?;
        let actor = self.state.awaiting.ok_or(BattleError::NotAwaitingInput)?;

        let result = self.resolve_action(actor, &action)?;
        self.state.awaiting = None;
        let mut actions = vec![result];
        self.finish_action();
        actions.extend(self.continue_battle());
        Ok(self.turn_result(actions))
    }

    /// Turn auto-battle on or off. Enabling it while a player decision is
    /// pending hands that turn to the AI immediately.
    pub fn set_auto_battle(&mut self, enabled: bool) -> Result<TurnResult, BattleError> {
        self.ensure_in_progress()?;

        if self.state.auto_battle != enabled {
            self.state.auto_battle = enabled;
            let line = if enabled {
                "Auto battle enabled!"
            } else {
                "Auto battle disabled!"
            };
            self.write_line(CombatLogEventType::MatchEvent, line.to_string());
            self.emit(BattleEvent::AutoBattleChanged { enabled });
        }

        let mut actions = Vec::new();
        if enabled {
            if let Some(actor) = self.state.awaiting.take() {
                actions.extend(self.ai_turn(actor));
                self.finish_action();
            }
        }
        actions.extend(self.continue_battle());
        Ok(self.turn_result(actions))
    }

    /// Give up the pending decision: auto-battle goes on and the AI plays
    /// the turn.
    pub fn cancel_pending_action(&mut self) -> Result<TurnResult, BattleError> {
        self.ensure_in_progress()?;
        if self.state.awaiting.is_none() {
            return Err(BattleError::NotAwaitingInput);
        }
        self.set_auto_battle(true)
    }

    /// Process exactly one unit step. `None` when the battle is not running
    /// or is waiting on the player.
    pub fn step(&mut self) -> Option<TurnResult> {
        if !self.state.phase.is_in_progress() || self.state.awaiting.is_some() {
            return None;
        }
        let actions = self.process_step();
        Some(self.turn_result(actions))
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            phase: self.state.phase,
            context: self.state.context.clone(),
            player_team: self.state.player_team.clone(),
            opposing_team: self.state.opposing_team.clone(),
            turn_order: self
                .state
                .turn_order
                .iter()
                .filter_map(|r| self.state.unit(*r).map(|c| c.id))
                .collect(),
            current_actor: self
                .state
                .phase
                .is_in_progress()
                .then(|| self.state.current_unit().map(|c| c.id))
                .flatten(),
            awaiting: self.state.awaiting,
            auto_battle: self.state.auto_battle,
            effects: self.state.effects.iter().cloned().collect(),
            pets: self.state.pets.iter().map(PetStatus::from).collect(),
            turns_taken: self.state.turns_taken,
        }
    }

    /// Save the combat log with metadata for the current battle.
    pub fn save_log(&self, path: Option<&str>) -> Result<String, String> {
        let metadata = BattleMetadata::from_state(&self.state, &self.log, self.rng.seed);
        self.log.save_to_file(&metadata, path)
    }

    // ========================================================================
    // Turn loop
    // ========================================================================

    fn ensure_in_progress(&self) -> Result<(), BattleError> {
        if self.state.phase.is_in_progress() {
            Ok(())
        } else {
            Err(BattleError::NotInProgress)
        }
    }

    fn turn_result(&self, actions: Vec<ActionResult>) -> TurnResult {
        TurnResult {
            actions,
            phase: self.state.phase,
            awaiting: self.state.awaiting,
        }
    }

    fn continue_battle(&mut self) -> Vec<ActionResult> {
        let mut actions = Vec::new();
        if self.mode == StepMode::RunToInput {
            while self.state.phase.is_in_progress() && self.state.awaiting.is_none() {
                actions.extend(self.process_step());
            }
        }
        actions
    }

    fn process_step(&mut self) -> Vec<ActionResult> {
        let mut actions = Vec::new();
        if self.check_outcome() {
            return actions;
        }

        let Some(unit) = self.state.current_unit().cloned() else {
            warn!("Turn pointer {} is outside the turn order", self.state.current_turn);
            self.advance_turn();
            return actions;
        };

        self.state.turns_taken += 1;
        self.log.set_turn(self.state.turns_taken);

        for expired in self.state.effects.tick(unit.id) {
            let line = self.log.record_expired(&expired);
            self.notify_log(&line);
            self.emit(BattleEvent::EffectExpired(expired));
        }

        if !unit.is_alive() {
            self.advance_turn();
            return actions;
        }

        self.emit(BattleEvent::TurnStarted {
            actor: unit.id,
            turn: self.state.turns_taken,
        });

        if unit.side == Side::Player {
            if let Some(result) = self.try_pet_ability(unit.id) {
                actions.push(result);
                if self.check_outcome() {
                    return actions;
                }
            }
        }

        if unit.side == Side::Opposing || self.state.auto_battle {
            actions.extend(self.ai_turn(unit.id));
            self.finish_action();
        } else {
            self.state.awaiting = Some(unit.id);
            self.write_line(
                CombatLogEventType::MatchEvent,
                format!("{}'s turn! Choose an action.", unit.name),
            );
            self.emit(BattleEvent::AwaitingInput { actor: unit.id });
        }
        actions
    }

    /// Tick the owner's pet and roll for it to fire.
    fn try_pet_ability(&mut self, owner: CombatantId) -> Option<ActionResult> {
        let slot = self.state.pet_slot_mut(owner)?;
        slot.tick();
        if !slot.is_ready() {
            return None;
        }
        if !self.rng.chance(self.rules.pet_trigger_chance) {
            return None;
        }

        match resolver::resolve_pet_ability(&mut self.state, owner) {
            Ok(result) => {
                self.publish(&result);
                Some(result)
            }
            Err(e) if e.is_unavailable() => {
                debug!("Pet ability for {} did not fire: {}", owner, e);
                None
            }
            Err(e) => {
                warn!("Pet ability for {} failed: {}", owner, e);
                None
            }
        }
    }

    fn ai_turn(&mut self, actor: CombatantId) -> Option<ActionResult> {
        let unit = self.state.combatant(actor)?.clone();
        let action = self.ai.choose_action(&unit, &self.state, &mut self.rng)?;
        match self.resolve_action(actor, &action) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("AI action for {} failed: {}", unit.name, e);
                None
            }
        }
    }

    fn resolve_action(&mut self, actor: CombatantId, action: &Action) -> Result<ActionResult, BattleError> {
        let result = match &action.kind {
            ActionKind::BasicAttack => {
                let target = action
                    .target
                    .ok_or_else(|| BattleError::invalid("basic attack requires a target"))?;
                resolver::resolve_basic_attack(&mut self.state, actor, target, &mut self.rng)?
            }
            ActionKind::Ability(name) => {
                let ability = self
                    .state
                    .combatant(actor)
                    .and_then(|c| c.find_ability(name))
                    .cloned()
                    .ok_or_else(|| BattleError::configuration("ability", name.clone()))?;
                resolver::resolve_ability(
                    &mut self.state,
                    actor,
                    &ability,
                    action.target,
                    self.rules.effect_duration,
                    &mut self.rng,
                )?
            }
        };
        self.publish(&result);
        Ok(result)
    }

    fn finish_action(&mut self) {
        if !self.check_outcome() {
            self.advance_turn();
        }
    }

    fn advance_turn(&mut self) {
        if scheduler::advance(&mut self.state).is_none() {
            self.check_outcome();
        }
    }

    /// True when the battle is over, concluding it first if the teams say so.
    fn check_outcome(&mut self) -> bool {
        if !self.state.phase.is_in_progress() {
            return true;
        }
        match detect_outcome(&self.state) {
            Some(phase) => {
                self.conclude(phase);
                true
            }
            None => false,
        }
    }

    fn conclude(&mut self, phase: BattlePhase) {
        self.state.phase = phase;
        self.state.awaiting = None;
        self.state.effects.clear();

        let context = self.state.context.clone();
        let line = match phase {
            BattlePhase::Won => format!("Victory! You cleared {}.", context.describe()),
            _ => format!("Defeat! Your team fell at {}.", context.describe()),
        };
        info!("{} ({} turns)", line, self.state.turns_taken);
        self.write_line(CombatLogEventType::MatchEvent, line);
        self.emit(BattleEvent::BattleEnded {
            phase,
            context: context.clone(),
            turns: self.state.turns_taken,
        });

        let team: Vec<CombatantId> = self.state.player_team.iter().map(|c| c.id).collect();
        if let Some(rewards) = self.rewards.as_mut() {
            match phase {
                BattlePhase::Won => {
                    rewards.on_victory(&context);
                    rewards.on_post_battle_experience(&team, true);
                }
                BattlePhase::Lost => rewards.on_defeat(&context),
                _ => {}
            }
        }
    }

    // ========================================================================
    // Reporting
    // ========================================================================

    fn publish(&mut self, result: &ActionResult) {
        for line in self.log.record_action(result) {
            debug!("{}", line);
            self.notify_log(&line);
        }
        self.emit(BattleEvent::ActionResolved(result.clone()));
    }

    fn write_line(&mut self, event_type: CombatLogEventType, line: String) {
        self.notify_log(&line);
        self.log.log(event_type, line);
    }

    fn notify_log(&mut self, line: &str) {
        for observer in self.observers.iter_mut() {
            observer.on_log(line);
        }
    }

    fn emit(&mut self, event: BattleEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::StatBlock;
    use crate::roster::EnemySpec;
    use crate::roster::rarity::Rarity;

    fn session(mode: StepMode) -> BattleSession {
        let catalog = Arc::new(GameCatalog::builtin().unwrap());
        BattleSession::new(catalog, GameRng::from_seed(42)).with_step_mode(mode)
    }

    fn hero(id: u64, attack: f32, speed: f32) -> Combatant {
        Combatant::new(CombatantId(id), format!("Hero {}", id), Side::Player, StatBlock::new(500.0, attack, 10.0, speed))
    }

    fn encounter() -> Encounter {
        Encounter::new(
            vec![EnemySpec::Fixed {
                class: "warrior".into(),
                level: 1,
                rarity: Rarity::Common,
            }],
            BattleContext::campaign("1-1"),
        )
    }

    #[test]
    fn test_empty_team_creates_no_state() {
        let mut session = session(StepMode::RunToInput);
        assert_eq!(session.start_battle(&[], &encounter()).unwrap_err(), BattleError::EmptyTeam);
        assert_eq!(session.phase(), BattlePhase::NotStarted);
        assert!(session.state().opposing_team.is_empty());
    }

    #[test]
    fn test_fast_player_is_asked_first() {
        let mut session = session(StepMode::RunToInput);
        let snapshot = session.start_battle(&[hero(1, 20.0, 50.0)], &encounter()).unwrap();
        assert_eq!(snapshot.phase, BattlePhase::InProgress);
        assert_eq!(snapshot.awaiting, Some(CombatantId(1)));
        assert_eq!(snapshot.turn_order[0], CombatantId(1));
    }

    #[test]
    fn test_step_is_refused_while_awaiting_input() {
        let mut session = session(StepMode::RunToInput);
        session.start_battle(&[hero(1, 20.0, 50.0)], &encounter()).unwrap();
        assert!(session.step().is_none());
    }

    #[test]
    fn test_manual_mode_steps_one_unit() {
        let mut session = session(StepMode::Manual);
        let snapshot = session.start_battle(&[hero(1, 20.0, 1.0)], &encounter()).unwrap();
        assert_eq!(snapshot.turns_taken, 0);

        // the enemy warrior (speed 8) moves first
        let turn = session.step().unwrap();
        assert_eq!(turn.actions.len(), 1);
        assert_eq!(turn.actions[0].actor, CombatantId::enemy(0));
        assert_eq!(turn.awaiting, None);

        let turn = session.step().unwrap();
        assert!(turn.actions.is_empty());
        assert_eq!(turn.awaiting, Some(CombatantId(1)));
    }

    #[test]
    fn test_submit_without_pending_turn() {
        let mut session = session(StepMode::Manual);
        session.start_battle(&[hero(1, 20.0, 1.0)], &encounter()).unwrap();
        let err = session
            .submit_player_action(Action::basic_attack(CombatantId::enemy(0)))
            .unwrap_err();
        assert_eq!(err, BattleError::NotAwaitingInput);
    }

    #[test]
    fn test_invalid_submission_keeps_the_turn() {
        let mut session = session(StepMode::RunToInput);
        session.start_battle(&[hero(1, 20.0, 50.0)], &encounter()).unwrap();
        let before = session.snapshot();

        let err = session
            .submit_player_action(Action::basic_attack(CombatantId(1)))
            .unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
        let err = session
            .submit_player_action(Action::ability("Meteor", Some(CombatantId::enemy(0))))
            .unwrap_err();
        assert!(matches!(err, BattleError::Configuration { kind: "ability", .. }));

        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut session = session(StepMode::RunToInput);
        let err = session
            .start_battle(&[hero(1, 20.0, 5.0), hero(1, 20.0, 5.0)], &encounter())
            .unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
    }
}
