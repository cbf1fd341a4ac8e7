//! JSON configuration parsing for headless mode
//!
//! Parses JSON battle configurations and builds the hero team and encounter
//! they describe.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::GameCatalog;
use crate::combat::combatant::{Combatant, CombatantId};
use crate::combat::pets::Pet;
use crate::roster::build_hero;
use crate::roster::rarity::Rarity;

/// Largest team a battle accepts.
pub const MAX_TEAM_SIZE: usize = 5;

/// One hero slot in the player team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroEntry {
    /// Class id from the game data ("warrior", "healer", ...)
    pub class: String,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Rarity name, case-insensitive (default: "common")
    #[serde(default = "default_rarity")]
    pub rarity: String,
    /// Display name (default: "<Class> <slot>")
    #[serde(default)]
    pub name: Option<String>,
    /// Pet id to equip on this hero
    #[serde(default)]
    pub pet: Option<String>,
    #[serde(default = "default_level")]
    pub pet_level: u32,
}

/// Headless battle configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessBattleConfig {
    /// Player team (1-5 heroes)
    pub team: Vec<HeroEntry>,
    /// Campaign stage to fight ("1-1")
    #[serde(default)]
    pub stage: Option<String>,
    /// Dungeon to run floor by floor ("easy", "medium", "hard")
    #[serde(default)]
    pub dungeon: Option<String>,
    /// Player level used for dungeon requirements and enemy scaling
    #[serde(default = "default_level")]
    pub player_level: u32,
    /// Unit steps before the battle is declared a draw (default: 500)
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Random seed for deterministic battle reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the battle log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Game data RON file to use instead of the built-in data
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Print battle log lines while running
    #[serde(default)]
    pub verbose: bool,
}

fn default_level() -> u32 {
    1
}

fn default_rarity() -> String {
    "common".to_string()
}

fn default_max_turns() -> u32 {
    500
}

impl HeadlessBattleConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: HeadlessBattleConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.team.is_empty() || self.team.len() > MAX_TEAM_SIZE {
            return Err(format!("team must have 1-{} members", MAX_TEAM_SIZE));
        }

        match (&self.stage, &self.dungeon) {
            (Some(_), Some(_)) => return Err("set either stage or dungeon, not both".to_string()),
            (None, None) => return Err("one of stage or dungeon is required".to_string()),
            _ => {}
        }

        for (slot, hero) in self.team.iter().enumerate() {
            if hero.level == 0 {
                return Err(format!("team[{}]: level must be at least 1", slot));
            }
            if hero.pet.is_some() && hero.pet_level == 0 {
                return Err(format!("team[{}]: pet_level must be at least 1", slot));
            }
            hero.rarity
                .parse::<Rarity>()
                .map_err(|e| format!("team[{}]: {}", slot, e))?;
        }

        if self.player_level == 0 {
            return Err("player_level must be at least 1".to_string());
        }
        if self.max_turns == 0 {
            return Err("max_turns must be positive".to_string());
        }

        Ok(())
    }

    /// Catalog named by `data_path`, or the built-in one
    pub fn load_catalog(&self) -> Result<GameCatalog, String> {
        match &self.data_path {
            Some(path) => GameCatalog::load_from_file(path),
            None => GameCatalog::builtin(),
        }
    }

    /// Build the hero team and the pets to equip. Heroes get ids 1..=n in
    /// slot order.
    pub fn build_team(&self, catalog: &GameCatalog) -> Result<(Vec<Combatant>, Vec<(CombatantId, Pet)>), String> {
        let mut heroes = Vec::with_capacity(self.team.len());
        let mut pets = Vec::new();

        for (slot, entry) in self.team.iter().enumerate() {
            let id = CombatantId(slot as u64 + 1);
            let rarity: Rarity = entry.rarity.parse().map_err(|e| format!("team[{}]: {}", slot, e))?;
            let class = catalog
                .class(&entry.class)
                .map_err(|e| format!("team[{}]: {}", slot, e))?;
            let name = entry
                .name
                .clone()
                .unwrap_or_else(|| format!("{} {}", class.name, slot + 1));

            let hero = build_hero(catalog, id, name, &entry.class, entry.level, rarity)
                .map_err(|e| format!("team[{}]: {}", slot, e))?;
            heroes.push(hero);

            if let Some(kind) = &entry.pet {
                let pet = catalog
                    .create_pet(kind, entry.pet_level)
                    .map_err(|e| format!("team[{}]: {}", slot, e))?;
                pets.push((id, pet));
            }
        }

        Ok((heroes, pets))
    }
}
