//! Data-driven game catalog
//!
//! Hero classes, pets, campaign stages and dungeons are defined in
//! `assets/config/game_data.ron`. The built-in copy is embedded in the binary;
//! a different file can be loaded from disk for balance experiments.
//!
//! ## Usage
//! ```ignore
//! let catalog = GameCatalog::builtin()?;
//! let warrior = catalog.class("warrior")?;
//! println!("Warrior base health: {}", warrior.base_stats.health);
//! ```

use bevy::log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::combat::ai::DEFAULT_ABILITY_CHANCE;
use crate::combat::combatant::{Ability, Stat, StatBlock};
use crate::combat::pets::{Pet, PetAbility};
use crate::combat::resolver::DEFAULT_EFFECT_DURATION;
use crate::error::BattleError;
use crate::progression::ledger::Rewards;
use crate::roster::level_percent;
use crate::roster::rarity::{Rarity, RarityTable};

const BUILTIN_GAME_DATA: &str = include_str!("../assets/config/game_data.ron");

fn default_ai_ability_chance() -> f32 {
    DEFAULT_ABILITY_CHANCE
}

fn default_pet_trigger_chance() -> f32 {
    0.3
}

fn default_effect_duration() -> u32 {
    DEFAULT_EFFECT_DURATION
}

/// Tunable battle constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleRules {
    /// Chance the AI uses an ability instead of a basic attack
    #[serde(default = "default_ai_ability_chance")]
    pub ai_ability_chance: f32,
    /// Chance a ready pet fires at the start of its owner's turn
    #[serde(default = "default_pet_trigger_chance")]
    pub pet_trigger_chance: f32,
    /// Duration in owner turns of buffs applied by hero abilities
    #[serde(default = "default_effect_duration")]
    pub effect_duration: u32,
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            ai_ability_chance: default_ai_ability_chance(),
            pet_trigger_chance: default_pet_trigger_chance(),
            effect_duration: default_effect_duration(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub name: String,
    pub base_stats: StatBlock,
    pub abilities: Vec<Ability>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PetTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_stats: StatBlock,
    /// Percentage bonuses granted to the owning hero's stats
    #[serde(default)]
    pub stat_bonus: Vec<(Stat, f32)>,
    pub ability: PetAbility,
    /// Player level at which the pet becomes available
    pub unlock_level: u32,
    #[serde(default)]
    pub rare: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageEnemy {
    pub class: String,
    pub level: u32,
    #[serde(default)]
    pub rarity: Rarity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignStage {
    pub enemies: Vec<StageEnemy>,
    pub rewards: Rewards,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorEnemy {
    pub class: String,
    pub level_multiplier: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DungeonFloor {
    pub enemies: Vec<FloorEnemy>,
    #[serde(default)]
    pub boss_floor: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DungeonTemplate {
    pub name: String,
    pub level_requirement: u32,
    pub gold_multiplier: f32,
    pub exp_multiplier: f32,
    pub gem_multiplier: f32,
    /// Added to scaled enemy levels
    pub enemy_level_bonus: u32,
    pub rarity_table: RarityTable,
    pub floors: Vec<DungeonFloor>,
}

/// Complete set of static game data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameCatalog {
    #[serde(default)]
    pub rules: BattleRules,
    pub hero_names: Vec<String>,
    pub classes: BTreeMap<String, ClassTemplate>,
    #[serde(default)]
    pub pets: BTreeMap<String, PetTemplate>,
    #[serde(default)]
    pub stages: BTreeMap<String, CampaignStage>,
    #[serde(default)]
    pub dungeons: BTreeMap<String, DungeonTemplate>,
}

impl GameCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, String> {
        Self::from_ron_str(BUILTIN_GAME_DATA)
    }

    /// Parse and validate catalog RON.
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let catalog: GameCatalog =
            ron::from_str(contents).map_err(|e| format!("Failed to parse game data: {}", e))?;
        catalog
            .validate()
            .map_err(|problems| format!("Invalid game data: {}", problems.join("; ")))?;
        Ok(catalog)
    }

    /// Load a catalog from a RON file on disk
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron_str(&contents)?;
        info!(
            "Loaded {} classes, {} pets, {} stages and {} dungeons from {}",
            catalog.classes.len(),
            catalog.pets.len(),
            catalog.stages.len(),
            catalog.dungeons.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Check cross references and value ranges. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.classes.is_empty() {
            problems.push("no hero classes defined".to_string());
        }
        if self.hero_names.is_empty() {
            problems.push("hero name pool is empty".to_string());
        }
        for (label, chance) in [
            ("ai_ability_chance", self.rules.ai_ability_chance),
            ("pet_trigger_chance", self.rules.pet_trigger_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                problems.push(format!("{} must be within 0..=1, got {}", label, chance));
            }
        }

        for (id, class) in &self.classes {
            if let Err(e) = class.base_stats.validate() {
                problems.push(format!("class '{}': {}", id, e));
            }
        }
        for (id, pet) in &self.pets {
            if let Err(e) = pet.base_stats.validate() {
                problems.push(format!("pet '{}': {}", id, e));
            }
        }

        for (id, stage) in &self.stages {
            if stage.enemies.is_empty() {
                problems.push(format!("stage '{}' has no enemies", id));
            }
            for enemy in &stage.enemies {
                if !self.classes.contains_key(&enemy.class) {
                    problems.push(format!("stage '{}' references unknown class '{}'", id, enemy.class));
                }
                if enemy.level == 0 {
                    problems.push(format!("stage '{}' has a level 0 enemy", id));
                }
            }
        }

        for (id, dungeon) in &self.dungeons {
            if dungeon.floors.is_empty() {
                problems.push(format!("dungeon '{}' has no floors", id));
            }
            if let Err(e) = dungeon.rarity_table.validate() {
                problems.push(format!("dungeon '{}': {}", id, e));
            }
            for (index, floor) in dungeon.floors.iter().enumerate() {
                if floor.enemies.is_empty() {
                    problems.push(format!("dungeon '{}' floor {} has no enemies", id, index + 1));
                }
                for enemy in &floor.enemies {
                    if !self.classes.contains_key(&enemy.class) {
                        problems.push(format!(
                            "dungeon '{}' floor {} references unknown class '{}'",
                            id,
                            index + 1,
                            enemy.class
                        ));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    pub fn class(&self, id: &str) -> Result<&ClassTemplate, BattleError> {
        self.classes
            .get(id)
            .ok_or_else(|| BattleError::configuration("class", id))
    }

    pub fn pet(&self, id: &str) -> Result<&PetTemplate, BattleError> {
        self.pets.get(id).ok_or_else(|| BattleError::configuration("pet", id))
    }

    pub fn stage(&self, id: &str) -> Result<&CampaignStage, BattleError> {
        self.stages
            .get(id)
            .ok_or_else(|| BattleError::configuration("stage", id))
    }

    pub fn dungeon(&self, id: &str) -> Result<&DungeonTemplate, BattleError> {
        self.dungeons
            .get(id)
            .ok_or_else(|| BattleError::configuration("dungeon", id))
    }

    /// Pet instance at `level`, stats scaled like hero stats.
    pub fn create_pet(&self, kind: &str, level: u32) -> Result<Pet, BattleError> {
        if level == 0 {
            return Err(BattleError::invalid("pet level must be at least 1"));
        }
        let template = self.pet(kind)?;
        Ok(Pet {
            kind: kind.to_string(),
            name: template.name.clone(),
            level,
            stats: template.base_stats.scaled_ratio(level_percent(level), 100),
            ability: template.ability.clone(),
        })
    }

    /// Pets available at the given player level, in id order.
    pub fn unlocked_pets(&self, player_level: u32) -> Vec<&str> {
        self.pets
            .iter()
            .filter(|(_, p)| p.unlock_level <= player_level)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{AbilityKind, EffectKind};
    use crate::combat::pets::PetEffect;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = GameCatalog::builtin().unwrap();
        assert_eq!(catalog.classes.len(), 5);
        assert_eq!(catalog.pets.len(), 6);
        assert_eq!(catalog.stages.len(), 6);
        assert_eq!(catalog.dungeons.len(), 3);
        assert_eq!(catalog.hero_names.len(), 32);
        assert_eq!(catalog.rules, BattleRules::default());
    }

    #[test]
    fn test_class_data_matches_game_balance() {
        let catalog = GameCatalog::builtin().unwrap();
        let warrior = catalog.class("warrior").unwrap();
        assert_eq!(warrior.base_stats, StatBlock::new(150.0, 15.0, 10.0, 8.0));
        assert_eq!(warrior.abilities[0].kind, AbilityKind::Damage { multiplier: 1.2 });

        let healer = catalog.class("healer").unwrap();
        assert!(healer.abilities[0].is_heal());
        assert_eq!(
            healer.abilities[1].kind,
            AbilityKind::Effect {
                effect: EffectKind::AttackBuff,
                value: 1.2
            }
        );
    }

    #[test]
    fn test_phoenix_is_single_use_revive() {
        let catalog = GameCatalog::builtin().unwrap();
        let phoenix = catalog.pet("phoenix").unwrap();
        assert_eq!(phoenix.ability.uses_per_battle, Some(1));
        assert_eq!(phoenix.ability.effect, PetEffect::Revive { health_ratio: 0.3 });
    }

    #[test]
    fn test_every_dungeon_ends_on_a_boss_floor() {
        let catalog = GameCatalog::builtin().unwrap();
        for dungeon in catalog.dungeons.values() {
            assert_eq!(dungeon.floors.len(), 3);
            assert!(dungeon.floors.last().unwrap().boss_floor);
            assert!(dungeon.floors[..2].iter().all(|f| !f.boss_floor));
        }
    }

    #[test]
    fn test_unknown_ids_are_configuration_errors() {
        let catalog = GameCatalog::builtin().unwrap();
        assert_eq!(
            catalog.class("paladin").unwrap_err(),
            BattleError::configuration("class", "paladin")
        );
        assert!(catalog.stage("9-9").is_err());
        assert!(catalog.create_pet("griffin", 1).is_err());
    }

    #[test]
    fn test_validation_reports_dangling_class() {
        let mut catalog = GameCatalog::builtin().unwrap();
        catalog.classes.remove("archer");
        let problems = catalog.validate().unwrap_err();
        assert!(problems.iter().any(|p| p.contains("unknown class 'archer'")));
    }

    #[test]
    fn test_pets_unlock_by_level() {
        let catalog = GameCatalog::builtin().unwrap();
        assert!(catalog.unlocked_pets(1).is_empty());
        assert_eq!(catalog.unlocked_pets(5), vec!["wolf"]);
        assert_eq!(catalog.unlocked_pets(30).len(), 6);
    }
}
