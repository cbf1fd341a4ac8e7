//! Combatant model
//!
//! Heroes and enemies share one `Combatant` type. Status effects are not stored
//! on the unit; they live in the battle state and point back at a unit by id.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::error::BattleError;
use crate::roster::rarity::Rarity;

/// Enemy ids are allocated from this base so they never collide with
/// caller-supplied hero ids.
pub const ENEMY_ID_BASE: u64 = 1 << 32;

/// Game-data multiplier in hundredths, e.g. `1.3` -> `130`.
pub fn percent(factor: f32) -> u64 {
    (factor as f64 * 100.0).round().max(0.0) as u64
}

/// `floor(value x factor)`, with the factor read to hundredths.
pub fn floor_scaled(value: f32, factor: f32) -> f32 {
    (value as f64 * percent(factor) as f64 / 100.0).floor() as f32
}

// ============================================================================
// Identity
// ============================================================================

/// Stable unit identifier, unique within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u64);

impl CombatantId {
    pub fn enemy(index: usize) -> Self {
        CombatantId(ENEMY_ID_BASE + index as u64)
    }

    pub fn is_enemy_range(&self) -> bool {
        self.0 >= ENEMY_ID_BASE
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which team a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Opposing,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Opposing,
            Side::Opposing => Side::Player,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Opposing => "opposing",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Stats
// ============================================================================

/// One of the four combat attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Health,
    Attack,
    Defense,
    Speed,
}

/// Base combat attributes. Health here is the maximum health.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health: f32,
    pub attack: f32,
    pub defense: f32,
    pub speed: f32,
}

impl StatBlock {
    pub fn new(health: f32, attack: f32, defense: f32, speed: f32) -> Self {
        Self {
            health,
            attack,
            defense,
            speed,
        }
    }

    pub fn get(&self, stat: Stat) -> f32 {
        match stat {
            Stat::Health => self.health,
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Speed => self.speed,
        }
    }

    pub fn get_mut(&mut self, stat: Stat) -> &mut f32 {
        match stat {
            Stat::Health => &mut self.health,
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
            Stat::Speed => &mut self.speed,
        }
    }

    /// Multiply every stat by `factor`, flooring the result. The factor is
    /// read to hundredths.
    pub fn scaled(&self, factor: f32) -> Self {
        self.scaled_ratio(percent(factor), 100)
    }

    /// Multiply every stat by `numerator / denominator`, flooring the result.
    /// Whole stats with a whole-number result come out exact.
    pub fn scaled_ratio(&self, numerator: u64, denominator: u64) -> Self {
        let scale = |value: f32| (value as f64 * numerator as f64 / denominator as f64).floor() as f32;
        Self {
            health: scale(self.health),
            attack: scale(self.attack),
            defense: scale(self.defense),
            speed: scale(self.speed),
        }
    }

    pub fn validate(&self) -> Result<(), BattleError> {
        for (label, value) in [
            ("health", self.health),
            ("attack", self.attack),
            ("defense", self.defense),
            ("speed", self.speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(BattleError::invalid(format!(
                    "{} must be a non-negative number, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Abilities
// ============================================================================

/// Status effect kinds an ability or pet can produce.
///
/// `Heal` is resolved on the spot and never stored. The stat buffs carry a
/// multiplier, `Dodge` an additive chance and `DamageReduction` the fraction
/// removed from incoming damage. `Taunt` is recorded but has no mechanical
/// effect on targeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Heal,
    AttackBuff,
    DefenseBuff,
    SpeedBuff,
    Dodge,
    DamageReduction,
    Taunt,
}

impl EffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Heal => "heal",
            EffectKind::AttackBuff => "attack",
            EffectKind::DefenseBuff => "defense",
            EffectKind::SpeedBuff => "speed",
            EffectKind::Dodge => "dodge",
            EffectKind::DamageReduction => "damage reduction",
            EffectKind::Taunt => "taunt",
        }
    }

    /// Stored magnitude for a percentage bonus such as a pet's `0.05`.
    pub fn magnitude_from_bonus(&self, bonus: f32) -> f32 {
        match self {
            EffectKind::AttackBuff | EffectKind::DefenseBuff | EffectKind::SpeedBuff => 1.0 + bonus,
            _ => bonus,
        }
    }
}

/// What an ability does when used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    Damage { multiplier: f32 },
    Effect { effect: EffectKind, value: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub kind: AbilityKind,
    #[serde(default)]
    pub description: String,
}

impl Ability {
    pub fn damage(name: impl Into<String>, multiplier: f32) -> Self {
        Self {
            name: name.into(),
            kind: AbilityKind::Damage { multiplier },
            description: String::new(),
        }
    }

    pub fn effect(name: impl Into<String>, effect: EffectKind, value: f32) -> Self {
        Self {
            name: name.into(),
            kind: AbilityKind::Effect { effect, value },
            description: String::new(),
        }
    }

    pub fn is_heal(&self) -> bool {
        matches!(
            self.kind,
            AbilityKind::Effect {
                effect: EffectKind::Heal,
                ..
            }
        )
    }
}

/// Most classes carry two abilities.
pub type AbilityList = SmallVec<[Ability; 2]>;

// ============================================================================
// Combatant
// ============================================================================

/// A hero or enemy taking part in a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique id within the battle
    pub id: CombatantId,
    /// Display name ("Lyra", "Boss Thorne")
    pub name: String,
    /// Team this unit fights for
    pub side: Side,
    /// Class template this unit was built from
    pub class_id: String,
    /// Level (1-based)
    pub level: u32,
    /// Rarity tier
    pub rarity: Rarity,
    /// Maximum health and base combat attributes
    pub stats: StatBlock,
    /// Current health points (defeated at 0)
    pub current_health: f32,
    /// Abilities in the order they are offered
    pub abilities: AbilityList,
}

impl Combatant {
    /// A level 1 common unit with no abilities.
    pub fn new(id: CombatantId, name: impl Into<String>, side: Side, stats: StatBlock) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            class_id: String::from("custom"),
            level: 1,
            rarity: Rarity::Common,
            stats,
            current_health: stats.health,
            abilities: AbilityList::new(),
        }
    }

    pub fn with_abilities(mut self, abilities: impl IntoIterator<Item = Ability>) -> Self {
        self.abilities = abilities.into_iter().collect();
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0.0
    }

    pub fn max_health(&self) -> f32 {
        self.stats.health
    }

    /// Subtract damage, clamping at zero. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let before = self.current_health;
        self.current_health = (self.current_health - amount.max(0.0)).max(0.0);
        before - self.current_health
    }

    /// Add health, capped at the maximum. Returns the health actually gained.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current_health;
        self.current_health = (self.current_health + amount.max(0.0)).min(self.stats.health);
        self.current_health - before
    }

    /// Back to full health.
    pub fn restore(&mut self) {
        self.current_health = self.stats.health;
    }

    pub fn find_ability(&self, name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name == name)
    }

    #[inline]
    pub fn debug_validate(&self) {
        debug_assert!(
            self.current_health >= 0.0,
            "{} health cannot be negative: {}",
            self.name,
            self.current_health
        );
        debug_assert!(
            self.current_health <= self.stats.health,
            "{} health ({}) cannot exceed max_health ({})",
            self.name,
            self.current_health,
            self.stats.health
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Combatant {
        Combatant::new(CombatantId(1), "Aiden", Side::Player, StatBlock::new(100.0, 20.0, 10.0, 10.0))
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut c = unit();
        assert_eq!(c.take_damage(30.0), 30.0);
        assert_eq!(c.take_damage(500.0), 70.0);
        assert_eq!(c.current_health, 0.0);
        assert!(!c.is_alive());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut c = unit();
        c.take_damage(10.0);
        assert_eq!(c.heal(50.0), 10.0);
        assert_eq!(c.current_health, 100.0);
    }

    #[test]
    fn test_scaled_floors_every_stat() {
        let stats = StatBlock::new(150.0, 15.0, 10.0, 8.0).scaled(1.5);
        assert_eq!(stats, StatBlock::new(225.0, 22.0, 15.0, 12.0));
    }

    #[test]
    fn test_scaled_whole_products_are_not_shaved() {
        // 150 x 2.7 and 15 x 1.1 land on whole numbers
        let stats = StatBlock::new(150.0, 15.0, 10.0, 8.0).scaled_ratio(270, 100);
        assert_eq!(stats.health, 405.0);
        assert_eq!(stats.defense, 27.0);
        assert_eq!(floor_scaled(15.0, 1.1), 16.0);
        assert_eq!(floor_scaled(90.0, 1.3), 117.0);
        assert_eq!(percent(1.3), 130);
    }

    #[test]
    fn test_negative_stats_rejected() {
        let stats = StatBlock::new(100.0, -1.0, 0.0, 0.0);
        assert!(matches!(stats.validate(), Err(BattleError::InvalidArgument(_))));
    }

    #[test]
    fn test_bonus_magnitude_by_kind() {
        assert!((EffectKind::AttackBuff.magnitude_from_bonus(0.05) - 1.05).abs() < 1e-6);
        assert_eq!(EffectKind::Dodge.magnitude_from_bonus(0.1), 0.1);
        assert_eq!(EffectKind::DamageReduction.magnitude_from_bonus(0.15), 0.15);
    }

    #[test]
    fn test_enemy_ids_do_not_overlap_player_range() {
        assert!(CombatantId::enemy(0).is_enemy_range());
        assert!(!CombatantId(42).is_enemy_range());
    }
}
