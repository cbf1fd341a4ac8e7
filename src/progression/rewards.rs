//! Reward issuer backed by the resource ledger
//!
//! `LedgerRewards` is the stock `RewardIssuer`: campaign wins pay the stage
//! reward and unlock the next stage, dungeon floors pay scaled rewards and
//! advance the active run, and equipped pets earn experience after a win.

use bevy::log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::GameCatalog;
use crate::combat::combatant::CombatantId;
use crate::combat::events::RewardIssuer;
use crate::combat::pets::Pet;
use crate::combat::state::{BattleContext, EncounterKind};
use crate::error::BattleError;
use crate::progression::campaign::{CampaignProgress, FIRST_STAGE};
use crate::progression::dungeon::{DungeonProgress, DungeonRun, FloorOutcome};
use crate::progression::ledger::{ResourceLedger, Rewards};
use crate::rng::GameRng;
use crate::roster::Encounter;

pub const PET_EXP_MIN: u32 = 5;
pub const PET_EXP_MAX: u32 = 9;

/// Pet experience needed per pet level.
pub const PET_EXP_PER_LEVEL: u64 = 50;

/// A pet together with its accumulated experience.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PetRecord {
    pub pet: Pet,
    pub exp: u64,
}

impl PetRecord {
    pub fn new(pet: Pet) -> Self {
        Self { pet, exp: 0 }
    }

    pub fn exp_to_next_level(&self) -> u64 {
        PET_EXP_PER_LEVEL * self.pet.level as u64
    }
}

pub struct LedgerRewards {
    catalog: Arc<GameCatalog>,
    rng: GameRng,
    pub ledger: ResourceLedger,
    pub campaign: CampaignProgress,
    pub dungeons: BTreeMap<String, DungeonProgress>,
    /// Active dungeon run, advanced by floor results
    pub run: Option<DungeonRun>,
    /// Pets keyed by owning hero
    pub pets: BTreeMap<CombatantId, PetRecord>,
    /// Everything credited by battles since creation
    pub total_earned: Rewards,
    /// Outcome of the last dungeon floor fought
    pub last_floor: Option<FloorOutcome>,
}

impl LedgerRewards {
    pub fn new(catalog: Arc<GameCatalog>, rng: GameRng) -> Self {
        Self {
            catalog,
            rng,
            ledger: ResourceLedger::default(),
            campaign: CampaignProgress::default(),
            dungeons: BTreeMap::new(),
            run: None,
            pets: BTreeMap::new(),
            total_earned: Rewards::default(),
            last_floor: None,
        }
    }

    pub fn with_ledger(mut self, ledger: ResourceLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn add_pet(&mut self, owner: CombatantId, pet: Pet) {
        self.pets.insert(owner, PetRecord::new(pet));
    }

    pub fn pet(&self, owner: CombatantId) -> Option<&Pet> {
        self.pets.get(&owner).map(|r| &r.pet)
    }

    /// Begin a dungeon run. Floor rewards are based on the player's current
    /// campaign stage.
    pub fn start_dungeon_run(&mut self, dungeon: &str) -> Result<Encounter, BattleError> {
        let base = self
            .catalog
            .stage(&self.campaign.current_stage)
            .or_else(|_| self.catalog.stage(FIRST_STAGE))
            .map(|s| s.rewards)
            .unwrap_or_default();
        let run = DungeonRun::start(&self.catalog, dungeon, self.ledger.player_level, base)?;
        let encounter = run.floor_encounter()?;
        info!(
            "Dungeon run started: {} ({} floors)",
            run.template.name,
            run.floor_count()
        );
        self.run = Some(run);
        Ok(encounter)
    }

    /// Encounter for the active run's current floor.
    pub fn next_floor_encounter(&self) -> Option<Encounter> {
        self.run
            .as_ref()
            .filter(|r| r.in_progress)
            .and_then(|r| r.floor_encounter().ok())
    }

    fn pay(&mut self, rewards: Rewards) {
        let levels = self.ledger.credit(rewards);
        self.total_earned += rewards;
        info!(
            "Rewards: {} Gold, {} EXP, {} Gems",
            rewards.gold, rewards.exp, rewards.gems
        );
        if levels > 0 {
            info!("Player reached level {}", self.ledger.player_level);
        }
    }

    fn dungeon_result(&mut self, dungeon: &str, context: &BattleContext, victory: bool) {
        let Some(run) = self.run.as_mut() else {
            warn!("Dungeon battle finished without an active run");
            return;
        };
        if run.dungeon != dungeon || Some(run.floor) != context.floor {
            warn!("Battle result for {} does not match the active run", context.describe());
            return;
        }

        let outcome = match run.complete_floor(victory) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Could not record dungeon floor: {}", e);
                return;
            }
        };
        self.dungeons
            .entry(dungeon.to_string())
            .or_default()
            .record(&outcome);

        match &outcome {
            FloorOutcome::Advanced { rewards, .. } => self.pay(*rewards),
            FloorOutcome::Completed { rewards, bonus } => {
                self.pay(*rewards);
                info!("Dungeon completed! Bonus rewards granted");
                self.pay(*bonus);
            }
            FloorOutcome::Failed => info!("Dungeon run failed!"),
        }
        self.last_floor = Some(outcome);
    }

    fn grant_pet_exp(&mut self, owner: CombatantId) {
        let gained = self.rng.random_inclusive(PET_EXP_MIN, PET_EXP_MAX) as u64;
        let Some(record) = self.pets.get_mut(&owner) else {
            return;
        };
        record.exp += gained;

        let mut leveled = false;
        while record.exp >= record.exp_to_next_level() {
            record.exp -= record.exp_to_next_level();
            record.pet.level += 1;
            leveled = true;
        }
        if leveled {
            match self.catalog.create_pet(&record.pet.kind, record.pet.level) {
                Ok(pet) => record.pet.stats = pet.stats,
                Err(e) => warn!("Could not rescale {}: {}", record.pet.name, e),
            }
            info!("{} reached level {}", record.pet.name, record.pet.level);
        }
    }
}

impl RewardIssuer for LedgerRewards {
    fn on_victory(&mut self, context: &BattleContext) {
        match &context.encounter {
            EncounterKind::Campaign { stage } => {
                let rewards = match self.catalog.stage(stage) {
                    Ok(s) => s.rewards,
                    Err(e) => {
                        warn!("{}", e);
                        return;
                    }
                };
                self.pay(rewards);
                if let Some(next) = self.campaign.record_clear(&self.catalog, stage) {
                    info!("Stage {} unlocked", next);
                }
            }
            EncounterKind::Dungeon { dungeon } => self.dungeon_result(dungeon, context, true),
            EncounterKind::Skirmish => {}
        }
    }

    fn on_defeat(&mut self, context: &BattleContext) {
        if let EncounterKind::Dungeon { dungeon } = &context.encounter {
            self.dungeon_result(dungeon, context, false);
        }
    }

    fn on_post_battle_experience(&mut self, team: &[CombatantId], victory: bool) {
        if !victory {
            return;
        }
        for owner in team {
            self.grant_pet_exp(*owner);
        }
    }
}
