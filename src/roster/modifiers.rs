//! Out-of-battle stat modifiers
//!
//! Equipment, pet bonuses and ascension are applied before a battle starts.
//! The session asks a `StatModifierProvider` once per player unit and treats
//! the answer as that unit's stats for the whole battle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::combatant::{floor_scaled, CombatantId, Stat, StatBlock};
use crate::error::BattleError;

use super::ascension::AscensionTier;
use super::rarity::Rarity;

pub trait StatModifierProvider: Send + Sync {
    /// Final stats for a player unit, or `None` to keep its own.
    fn adjusted_stats(&self, id: CombatantId) -> Option<StatBlock>;
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Helmet,
    Accessory,
}

impl EquipmentSlot {
    pub fn primary_stat(&self) -> Stat {
        match self {
            EquipmentSlot::Weapon => Stat::Attack,
            EquipmentSlot::Armor => Stat::Defense,
            EquipmentSlot::Helmet => Stat::Health,
            EquipmentSlot::Accessory => Stat::Speed,
        }
    }

    /// Items of this slot a hero can wear at once.
    pub fn capacity(&self) -> usize {
        match self {
            EquipmentSlot::Accessory => 2,
            _ => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSet {
    Warrior,
    Mage,
    Ranger,
    Guardian,
}

impl EquipmentSet {
    /// Pieces needed before the bonus applies.
    pub const PIECES: usize = 4;

    /// Stat multipliers granted by a complete set.
    pub fn bonus(&self) -> &'static [(Stat, f32)] {
        match self {
            EquipmentSet::Warrior => &[(Stat::Attack, 1.2), (Stat::Health, 1.1)],
            EquipmentSet::Mage => &[(Stat::Attack, 1.3), (Stat::Speed, 1.1)],
            EquipmentSet::Ranger => &[(Stat::Attack, 1.15), (Stat::Speed, 1.2)],
            EquipmentSet::Guardian => &[(Stat::Defense, 1.3), (Stat::Health, 1.2)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub name: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    pub level: u32,
    #[serde(default)]
    pub set: Option<EquipmentSet>,
    /// Flat bonus to the slot's primary stat
    pub primary_value: f32,
    #[serde(default)]
    pub secondary: Vec<(Stat, f32)>,
}

impl Equipment {
    /// Item with the standard primary value `floor((5 + 2 x level) x rarity)`.
    pub fn new(name: impl Into<String>, slot: EquipmentSlot, rarity: Rarity, level: u32) -> Self {
        let base = 5 + 2 * level as u64;
        Self {
            name: name.into(),
            slot,
            rarity,
            level,
            set: None,
            primary_value: (base * rarity.stat_percent() / 100) as f32,
            secondary: Vec::new(),
        }
    }

    pub fn with_set(mut self, set: EquipmentSet) -> Self {
        self.set = Some(set);
        self
    }

    pub fn with_secondary(mut self, stat: Stat, value: f32) -> Self {
        self.secondary.push((stat, value));
        self
    }

    /// Gold cost of the next upgrade.
    pub fn upgrade_cost(&self) -> u64 {
        50 * self.level as u64 * self.rarity.stat_percent() / 100
    }

    /// One level up: every bonus grows by 20%, floored.
    pub fn upgrade(&mut self) {
        self.level += 1;
        self.primary_value = floor_scaled(self.primary_value, 1.2);
        for (_, value) in self.secondary.iter_mut() {
            *value = floor_scaled(*value, 1.2);
        }
    }
}

// ============================================================================
// Loadout
// ============================================================================

/// Everything that modifies one hero's stats outside of battle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    /// Class x rarity x level stats
    pub base: StatBlock,
    pub ascension: AscensionTier,
    pub equipment: Vec<Equipment>,
    /// Percentage bonuses from the equipped pet
    pub pet_bonus: Vec<(Stat, f32)>,
}

impl Loadout {
    pub fn new(base: StatBlock) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    /// Wear an item. A full slot gives back the oldest item it held.
    pub fn equip(&mut self, item: Equipment) -> Option<Equipment> {
        let in_slot: Vec<usize> = self
            .equipment
            .iter()
            .enumerate()
            .filter(|(_, e)| e.slot == item.slot)
            .map(|(i, _)| i)
            .collect();
        let replaced = if in_slot.len() >= item.slot.capacity() {
            Some(self.equipment.remove(in_slot[0]))
        } else {
            None
        };
        self.equipment.push(item);
        replaced
    }

    pub fn unequip(&mut self, name: &str) -> Result<Equipment, BattleError> {
        let index = self
            .equipment
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| BattleError::invalid(format!("'{}' is not equipped", name)))?;
        Ok(self.equipment.remove(index))
    }

    /// Complete sets currently worn.
    pub fn active_sets(&self) -> Vec<EquipmentSet> {
        let mut counts: HashMap<EquipmentSet, usize> = HashMap::new();
        for set in self.equipment.iter().filter_map(|e| e.set) {
            *counts.entry(set).or_insert(0) += 1;
        }
        let mut sets: Vec<EquipmentSet> = counts
            .into_iter()
            .filter(|(_, n)| *n >= EquipmentSet::PIECES)
            .map(|(set, _)| set)
            .collect();
        sets.sort_by_key(|s| *s as u8);
        sets
    }

    /// Ascension multiplier, then flat equipment bonuses, then set bonuses,
    /// then pet percentages. Every multiplicative step floors.
    pub fn final_stats(&self) -> StatBlock {
        let mut stats = self.base.scaled(self.ascension.stat_multiplier());

        for item in &self.equipment {
            *stats.get_mut(item.slot.primary_stat()) += item.primary_value;
            for (stat, value) in &item.secondary {
                *stats.get_mut(*stat) += value;
            }
        }

        for set in self.active_sets() {
            for (stat, multiplier) in set.bonus() {
                let value = stats.get_mut(*stat);
                *value = floor_scaled(*value, *multiplier);
            }
        }

        for (stat, bonus) in &self.pet_bonus {
            let value = stats.get_mut(*stat);
            *value = floor_scaled(*value, 1.0 + bonus);
        }
        stats
    }
}

/// Reference provider backed by per-hero loadouts.
#[derive(Clone, Debug, Default)]
pub struct LoadoutModifiers {
    loadouts: HashMap<CombatantId, Loadout>,
}

impl LoadoutModifiers {
    pub fn insert(&mut self, id: CombatantId, loadout: Loadout) {
        self.loadouts.insert(id, loadout);
    }

    pub fn get(&self, id: CombatantId) -> Option<&Loadout> {
        self.loadouts.get(&id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Loadout> {
        self.loadouts.get_mut(&id)
    }
}

impl StatModifierProvider for LoadoutModifiers {
    fn adjusted_stats(&self, id: CombatantId) -> Option<StatBlock> {
        self.loadouts.get(&id).map(Loadout::final_stats)
    }
}
