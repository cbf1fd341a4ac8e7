//! Battle state
//!
//! Everything a running battle owns: both teams, the fixed turn order, active
//! effects, pet slots and the context the battle was started with.

use serde::{Deserialize, Serialize};

use super::combatant::{Combatant, CombatantId, Side};
use super::effects::ActiveEffects;
use super::outcome::BattlePhase;
use super::pets::PetSlot;
use super::scheduler::{compute_turn_order, UnitRef};

/// Where a battle came from. Reward issuers key off this.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterKind {
    /// Ad-hoc fight with no rewards attached
    #[default]
    Skirmish,
    Campaign { stage: String },
    Dungeon { dungeon: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleContext {
    pub encounter: EncounterKind,
    /// Zero-based dungeon floor
    pub floor: Option<usize>,
    pub boss: bool,
}

impl BattleContext {
    pub fn campaign(stage: impl Into<String>) -> Self {
        Self {
            encounter: EncounterKind::Campaign {
                stage: stage.into(),
            },
            floor: None,
            boss: false,
        }
    }

    pub fn dungeon(dungeon: impl Into<String>, floor: usize, boss: bool) -> Self {
        Self {
            encounter: EncounterKind::Dungeon {
                dungeon: dungeon.into(),
            },
            floor: Some(floor),
            boss,
        }
    }

    pub fn describe(&self) -> String {
        match (&self.encounter, self.floor) {
            (EncounterKind::Campaign { stage }, _) => format!("stage {}", stage),
            (EncounterKind::Dungeon { dungeon }, Some(floor)) => {
                format!("{} dungeon floor {}", dungeon, floor + 1)
            }
            (EncounterKind::Dungeon { dungeon }, None) => format!("{} dungeon", dungeon),
            (EncounterKind::Skirmish, _) => "skirmish".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub player_team: Vec<Combatant>,
    pub opposing_team: Vec<Combatant>,
    /// Computed once when the battle starts
    pub turn_order: Vec<UnitRef>,
    /// Index into `turn_order` of the unit whose step is next
    pub current_turn: usize,
    pub effects: ActiveEffects,
    pub pets: Vec<PetSlot>,
    pub auto_battle: bool,
    /// Player unit whose action the session is waiting on
    pub awaiting: Option<CombatantId>,
    pub context: BattleContext,
    /// Unit steps processed so far
    pub turns_taken: u32,
}

impl BattleState {
    pub fn new(player_team: Vec<Combatant>, opposing_team: Vec<Combatant>, context: BattleContext) -> Self {
        let turn_order = compute_turn_order(&player_team, &opposing_team);
        Self {
            phase: BattlePhase::NotStarted,
            player_team,
            opposing_team,
            turn_order,
            current_turn: 0,
            effects: ActiveEffects::default(),
            pets: Vec::new(),
            auto_battle: false,
            awaiting: None,
            context,
            turns_taken: 0,
        }
    }

    pub fn team(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Player => &self.player_team,
            Side::Opposing => &self.opposing_team,
        }
    }

    pub fn team_mut(&mut self, side: Side) -> &mut Vec<Combatant> {
        match side {
            Side::Player => &mut self.player_team,
            Side::Opposing => &mut self.opposing_team,
        }
    }

    pub fn unit(&self, unit: UnitRef) -> Option<&Combatant> {
        self.team(unit.side).get(unit.index)
    }

    pub fn current_unit(&self) -> Option<&Combatant> {
        self.turn_order
            .get(self.current_turn)
            .and_then(|r| self.unit(*r))
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.player_team
            .iter()
            .chain(self.opposing_team.iter())
            .find(|c| c.id == id)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.player_team
            .iter_mut()
            .chain(self.opposing_team.iter_mut())
            .find(|c| c.id == id)
    }

    /// Living unit ids on one side, in team order.
    pub fn living(&self, side: Side) -> Vec<CombatantId> {
        self.team(side)
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| c.id)
            .collect()
    }

    pub fn all_defeated(&self, side: Side) -> bool {
        !self.team(side).iter().any(|c| c.is_alive())
    }

    pub fn pet_slot(&self, owner: CombatantId) -> Option<&PetSlot> {
        self.pets.iter().find(|p| p.owner == owner)
    }

    pub fn pet_slot_mut(&mut self, owner: CombatantId) -> Option<&mut PetSlot> {
        self.pets.iter_mut().find(|p| p.owner == owner)
    }
}
