//! Roster and scaling
//!
//! Turns catalog templates into battle-ready combatants: class base stats
//! scaled by rarity and level, boss variants, and enemy lists for campaign
//! stages and dungeon floors.

pub mod ascension;
pub mod modifiers;
pub mod rarity;

use serde::{Deserialize, Serialize};

use crate::catalog::{ClassTemplate, GameCatalog};
use crate::combat::combatant::{percent, Combatant, CombatantId, Side};
use crate::combat::state::BattleContext;
use crate::error::BattleError;
use crate::rng::GameRng;

use rarity::{Rarity, RarityTable};

/// Stat growth per level above 1, in percent.
pub const LEVEL_GROWTH_PERCENT: u64 = 10;

pub const BOSS_HEALTH_MULTIPLIER: f32 = 1.5;
pub const BOSS_ATTACK_MULTIPLIER: f32 = 1.3;
pub const BOSS_DEFENSE_MULTIPLIER: f32 = 1.3;

/// `1 + (level - 1) x 0.1`, in percent.
pub fn level_percent(level: u32) -> u64 {
    100 + level.saturating_sub(1) as u64 * LEVEL_GROWTH_PERCENT
}

/// Build a unit from a class template. Each stat is
/// `floor(base x rarity multiplier x level multiplier)` and the unit starts at
/// full health. Id, name and side are placeholders for the caller to set.
pub fn build_combatant(
    class_id: &str,
    template: &ClassTemplate,
    level: u32,
    rarity: Rarity,
) -> Result<Combatant, BattleError> {
    if level < 1 {
        return Err(BattleError::invalid(format!("level must be at least 1, got {}", level)));
    }
    template.base_stats.validate()?;

    let stats = template
        .base_stats
        .scaled_ratio(rarity.stat_percent() * level_percent(level), 100 * 100);
    let mut unit = Combatant::new(CombatantId(0), template.name.clone(), Side::Player, stats)
        .with_abilities(template.abilities.iter().cloned());
    unit.class_id = class_id.to_string();
    unit.level = level;
    unit.rarity = rarity;
    Ok(unit)
}

/// Player hero straight from the catalog.
pub fn build_hero(
    catalog: &GameCatalog,
    id: CombatantId,
    name: impl Into<String>,
    class_id: &str,
    level: u32,
    rarity: Rarity,
) -> Result<Combatant, BattleError> {
    let mut hero = build_combatant(class_id, catalog.class(class_id)?, level, rarity)?;
    hero.id = id;
    hero.name = name.into();
    hero.side = Side::Player;
    Ok(hero)
}

/// Promote a unit to a floor boss. Multipliers apply to the already scaled
/// stats and are not floored.
pub fn make_boss(unit: &mut Combatant) {
    unit.name = format!("Boss {}", unit.name);
    unit.stats.health *= BOSS_HEALTH_MULTIPLIER;
    unit.stats.attack *= BOSS_ATTACK_MULTIPLIER;
    unit.stats.defense *= BOSS_DEFENSE_MULTIPLIER;
    unit.restore();
}

pub fn draw_rarity(table: &RarityTable, rng: &mut GameRng) -> Rarity {
    table.draw(rng.random_f32())
}

pub fn random_name<'a>(catalog: &'a GameCatalog, rng: &mut GameRng) -> &'a str {
    if catalog.hero_names.is_empty() {
        return "Nameless";
    }
    &catalog.hero_names[rng.pick_index(catalog.hero_names.len())]
}

/// Level and rarity source for enemies scaled to the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalingTier {
    pub player_level: u32,
    pub level_bonus: u32,
    pub rarity_table: RarityTable,
}

impl ScalingTier {
    /// `floor(player_level x multiplier) + level_bonus`, with the multiplier
    /// read to hundredths.
    pub fn enemy_level(&self, level_multiplier: f32) -> u32 {
        (self.player_level as u64 * percent(level_multiplier) / 100) as u32 + self.level_bonus
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EnemySpec {
    Fixed {
        class: String,
        level: u32,
        rarity: Rarity,
    },
    /// Resolved against the encounter's scaling tier
    Scaled { class: String, level_multiplier: f32 },
}

/// Enemy lineup plus everything needed to build it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub enemies: Vec<EnemySpec>,
    /// Last enemy becomes the boss
    pub boss_floor: bool,
    pub tier: Option<ScalingTier>,
    pub context: BattleContext,
}

impl Encounter {
    pub fn new(enemies: Vec<EnemySpec>, context: BattleContext) -> Self {
        Self {
            enemies,
            boss_floor: false,
            tier: None,
            context,
        }
    }

    pub fn with_tier(mut self, tier: ScalingTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_boss(mut self, boss_floor: bool) -> Self {
        self.boss_floor = boss_floor;
        self
    }
}

/// Build the opposing team for an encounter. Enemy ids start at
/// `ENEMY_ID_BASE` and names come from the hero name pool.
pub fn build_encounter(
    catalog: &GameCatalog,
    encounter: &Encounter,
    rng: &mut GameRng,
) -> Result<Vec<Combatant>, BattleError> {
    let mut enemies = Vec::with_capacity(encounter.enemies.len());

    for (index, enemy_spec) in encounter.enemies.iter().enumerate() {
        let (class_id, level, rarity) = match enemy_spec {
            EnemySpec::Fixed { class, level, rarity } => (class.as_str(), *level, *rarity),
            EnemySpec::Scaled {
                class,
                level_multiplier,
            } => {
                let tier = encounter.tier.as_ref().ok_or_else(|| {
                    BattleError::invalid(format!("scaled enemy '{}' needs a scaling tier", class))
                })?;
                let rarity = draw_rarity(&tier.rarity_table, rng);
                (class.as_str(), tier.enemy_level(*level_multiplier), rarity)
            }
        };

        let mut enemy = build_combatant(class_id, catalog.class(class_id)?, level, rarity)?;
        enemy.id = CombatantId::enemy(index);
        enemy.side = Side::Opposing;
        enemy.name = random_name(catalog, rng).to_string();
        enemies.push(enemy);
    }

    if encounter.boss_floor {
        if let Some(boss) = enemies.last_mut() {
            make_boss(boss);
        }
    }
    Ok(enemies)
}

/// Random level 1 hero rolled on the standard summon table.
pub fn summon_hero(catalog: &GameCatalog, id: CombatantId, rng: &mut GameRng) -> Result<Combatant, BattleError> {
    if catalog.classes.is_empty() {
        return Err(BattleError::invalid("catalog has no hero classes"));
    }
    let class_id = catalog
        .classes
        .keys()
        .nth(rng.pick_index(catalog.classes.len()))
        .cloned()
        .unwrap_or_default();
    let rarity = draw_rarity(&RarityTable::summon(), rng);
    let name = random_name(catalog, rng).to_string();
    build_hero(catalog, id, name, &class_id, 1, rarity)
}
