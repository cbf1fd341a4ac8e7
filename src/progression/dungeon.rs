//! Dungeon runs
//!
//! A run walks a dungeon floor by floor. Enemy levels scale with the player
//! level and rarities are rolled on the dungeon's table. Each cleared floor
//! pays out, the last floor adds a completion bonus and any loss ends the run.

use serde::{Deserialize, Serialize};

use crate::catalog::{DungeonTemplate, GameCatalog};
use crate::combat::combatant::percent;
use crate::combat::state::BattleContext;
use crate::error::BattleError;
use crate::progression::ledger::Rewards;
use crate::roster::{EnemySpec, Encounter, ScalingTier};

/// Bonus for clearing every floor, before dungeon multipliers.
pub const COMPLETION_BONUS: Rewards = Rewards {
    gold: 500,
    exp: 100,
    gems: 20,
};

/// Reward for clearing `floor` (zero-based). Gold and exp grow with the
/// floor number; gems double on boss floors.
pub fn floor_rewards(template: &DungeonTemplate, base: Rewards, floor: usize, boss: bool) -> Rewards {
    let floor_number = (floor + 1) as u64;
    let gem_factor = if boss { 2 } else { 1 };
    Rewards {
        gold: base.gold * percent(template.gold_multiplier) * floor_number / 100,
        exp: base.exp * percent(template.exp_multiplier) * floor_number / 100,
        gems: base.gems * percent(template.gem_multiplier) * gem_factor / 100,
    }
}

pub fn completion_bonus(template: &DungeonTemplate) -> Rewards {
    COMPLETION_BONUS.scaled(
        template.gold_multiplier,
        template.exp_multiplier,
        template.gem_multiplier,
    )
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorOutcome {
    /// Floor cleared, the run moves on
    Advanced { rewards: Rewards, next_floor: usize },
    /// Last floor cleared
    Completed { rewards: Rewards, bonus: Rewards },
    Failed,
}

/// An in-progress dungeon run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DungeonRun {
    pub dungeon: String,
    pub template: DungeonTemplate,
    pub player_level: u32,
    /// Zero-based floor being fought
    pub floor: usize,
    /// Per-floor reward before dungeon multipliers
    pub base_rewards: Rewards,
    pub in_progress: bool,
}

impl DungeonRun {
    /// Start a run. Fails when the player is below the level requirement.
    pub fn start(catalog: &GameCatalog, dungeon: &str, player_level: u32, base_rewards: Rewards) -> Result<Self, BattleError> {
        let template = catalog.dungeon(dungeon)?;
        if player_level < template.level_requirement {
            return Err(BattleError::invalid(format!(
                "{} requires player level {}",
                template.name, template.level_requirement
            )));
        }
        if template.floors.is_empty() {
            return Err(BattleError::invalid(format!("{} has no floors", template.name)));
        }
        Ok(Self {
            dungeon: dungeon.to_string(),
            template: template.clone(),
            player_level,
            floor: 0,
            base_rewards,
            in_progress: true,
        })
    }

    pub fn floor_count(&self) -> usize {
        self.template.floors.len()
    }

    pub fn is_boss_floor(&self) -> bool {
        self.template
            .floors
            .get(self.floor)
            .is_some_and(|f| f.boss_floor)
    }

    /// Encounter for the current floor.
    pub fn floor_encounter(&self) -> Result<Encounter, BattleError> {
        if !self.in_progress {
            return Err(BattleError::invalid("dungeon run is over"));
        }
        let floor = self
            .template
            .floors
            .get(self.floor)
            .ok_or_else(|| BattleError::invalid(format!("floor {} out of range", self.floor + 1)))?;

        let enemies = floor
            .enemies
            .iter()
            .map(|e| EnemySpec::Scaled {
                class: e.class.clone(),
                level_multiplier: e.level_multiplier,
            })
            .collect();
        let tier = ScalingTier {
            player_level: self.player_level,
            level_bonus: self.template.enemy_level_bonus,
            rarity_table: self.template.rarity_table.clone(),
        };
        Ok(Encounter::new(
            enemies,
            BattleContext::dungeon(self.dungeon.clone(), self.floor, floor.boss_floor),
        )
        .with_tier(tier)
        .with_boss(floor.boss_floor))
    }

    /// Record the result of the current floor's battle.
    pub fn complete_floor(&mut self, victory: bool) -> Result<FloorOutcome, BattleError> {
        if !self.in_progress {
            return Err(BattleError::invalid("dungeon run is over"));
        }
        if !victory {
            self.in_progress = false;
            return Ok(FloorOutcome::Failed);
        }

        let rewards = floor_rewards(&self.template, self.base_rewards, self.floor, self.is_boss_floor());
        if self.floor + 1 < self.floor_count() {
            self.floor += 1;
            Ok(FloorOutcome::Advanced {
                rewards,
                next_floor: self.floor,
            })
        } else {
            self.in_progress = false;
            Ok(FloorOutcome::Completed {
                rewards,
                bonus: completion_bonus(&self.template),
            })
        }
    }
}

/// Per-dungeon record across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonProgress {
    pub highest_floor: usize,
    pub completed_runs: u32,
}

impl DungeonProgress {
    pub fn record(&mut self, outcome: &FloorOutcome) {
        match outcome {
            FloorOutcome::Advanced { next_floor, .. } => {
                self.highest_floor = self.highest_floor.max(*next_floor);
            }
            FloorOutcome::Completed { .. } => self.completed_runs += 1,
            FloorOutcome::Failed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::state::EncounterKind;

    fn catalog() -> GameCatalog {
        GameCatalog::builtin().unwrap()
    }

    fn base() -> Rewards {
        Rewards::new(100, 10, 5)
    }

    #[test]
    fn test_level_requirement() {
        let err = DungeonRun::start(&catalog(), "easy", 4, base()).unwrap_err();
        assert!(matches!(err, BattleError::InvalidArgument(_)));
        assert!(DungeonRun::start(&catalog(), "easy", 5, base()).is_ok());
    }

    #[test]
    fn test_floor_encounter_scales_to_player() {
        let run = DungeonRun::start(&catalog(), "easy", 10, base()).unwrap();
        let encounter = run.floor_encounter().unwrap();
        let tier = encounter.tier.as_ref().unwrap();
        assert_eq!(tier.enemy_level(1.0), 12);
        assert!(!encounter.boss_floor);
        assert_eq!(encounter.context.floor, Some(0));
        assert_eq!(
            encounter.context.encounter,
            EncounterKind::Dungeon {
                dungeon: "easy".to_string()
            }
        );
    }

    #[test]
    fn test_floor_rewards() {
        let catalog = catalog();
        let easy = catalog.dungeon("easy").unwrap();
        // 100 x 1.5 x 2, 10 x 1.5 x 2, 5 x 1.2
        assert_eq!(floor_rewards(easy, base(), 1, false), Rewards::new(300, 30, 6));
        // boss floor doubles gems: 5 x 1.2 x 2
        assert_eq!(floor_rewards(easy, base(), 2, true).gems, 12);
    }

    #[test]
    fn test_full_run() {
        let catalog = catalog();
        let mut run = DungeonRun::start(&catalog, "easy", 5, base()).unwrap();
        let mut progress = DungeonProgress::default();

        for _ in 0..2 {
            let outcome = run.complete_floor(true).unwrap();
            assert!(matches!(outcome, FloorOutcome::Advanced { .. }));
            progress.record(&outcome);
        }
        assert!(run.is_boss_floor());
        assert!(run.floor_encounter().unwrap().boss_floor);

        let outcome = run.complete_floor(true).unwrap();
        match &outcome {
            FloorOutcome::Completed { bonus, .. } => assert_eq!(*bonus, Rewards::new(750, 150, 24)),
            other => panic!("expected completion, got {:?}", other),
        }
        progress.record(&outcome);
        assert_eq!(progress.highest_floor, 2);
        assert_eq!(progress.completed_runs, 1);
        assert!(run.complete_floor(true).is_err());
    }

    #[test]
    fn test_loss_ends_run() {
        let mut run = DungeonRun::start(&catalog(), "easy", 5, base()).unwrap();
        assert_eq!(run.complete_floor(false).unwrap(), FloorOutcome::Failed);
        assert!(!run.in_progress);
        assert!(run.floor_encounter().is_err());
    }
}
