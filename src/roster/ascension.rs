//! Ascension tiers
//!
//! A hero climbs tiers by reaching a level threshold and sacrificing other
//! heroes ("fodder"). Each tier multiplies the hero's stats.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::combat::combatant::{percent, CombatantId, StatBlock};
use crate::error::BattleError;

use super::rarity::Rarity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AscensionTier {
    #[default]
    Basic,
    Elite,
    ElitePlus,
    Legendary,
    LegendaryPlus,
    Mythic,
    MythicPlus,
    Ascended,
}

impl AscensionTier {
    pub fn all() -> &'static [AscensionTier] {
        &[
            AscensionTier::Basic,
            AscensionTier::Elite,
            AscensionTier::ElitePlus,
            AscensionTier::Legendary,
            AscensionTier::LegendaryPlus,
            AscensionTier::Mythic,
            AscensionTier::MythicPlus,
            AscensionTier::Ascended,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AscensionTier::Basic => "Basic",
            AscensionTier::Elite => "Elite",
            AscensionTier::ElitePlus => "Elite+",
            AscensionTier::Legendary => "Legendary",
            AscensionTier::LegendaryPlus => "Legendary+",
            AscensionTier::Mythic => "Mythic",
            AscensionTier::MythicPlus => "Mythic+",
            AscensionTier::Ascended => "Ascended",
        }
    }

    pub fn required_level(&self) -> u32 {
        match self {
            AscensionTier::Basic => 1,
            AscensionTier::Elite => 20,
            AscensionTier::ElitePlus => 40,
            AscensionTier::Legendary => 60,
            AscensionTier::LegendaryPlus => 80,
            AscensionTier::Mythic => 100,
            AscensionTier::MythicPlus => 120,
            AscensionTier::Ascended => 140,
        }
    }

    pub fn stat_multiplier(&self) -> f32 {
        match self {
            AscensionTier::Basic => 1.0,
            AscensionTier::Elite => 1.3,
            AscensionTier::ElitePlus => 1.6,
            AscensionTier::Legendary => 2.0,
            AscensionTier::LegendaryPlus => 2.5,
            AscensionTier::Mythic => 3.0,
            AscensionTier::MythicPlus => 3.5,
            AscensionTier::Ascended => 4.0,
        }
    }

    /// Heroes consumed to reach this tier.
    pub fn required_fodder(&self) -> usize {
        match self {
            AscensionTier::Basic => 0,
            AscensionTier::LegendaryPlus | AscensionTier::MythicPlus => 1,
            _ => 2,
        }
    }

    pub fn next(&self) -> Option<AscensionTier> {
        let tiers = Self::all();
        tiers
            .iter()
            .position(|t| t == self)
            .and_then(|i| tiers.get(i + 1))
            .copied()
    }

    /// Elite and Elite+ want copies of the same hero; later tiers accept any
    /// hero already at the tier below.
    pub fn needs_matching_fodder(&self) -> bool {
        matches!(self, AscensionTier::Elite | AscensionTier::ElitePlus)
    }
}

impl fmt::Display for AscensionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the ascension check needs to know about a hero in the collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AscensionCandidate {
    pub id: CombatantId,
    pub class_id: String,
    pub rarity: Rarity,
    pub level: u32,
    pub tier: AscensionTier,
    /// Part of the active battle team
    pub in_team: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AscensionPlan {
    pub hero: CombatantId,
    pub from: AscensionTier,
    pub to: AscensionTier,
    /// Heroes that will be consumed, in collection order
    pub fodder: Vec<CombatantId>,
}

/// Check whether `hero` can ascend using heroes from `collection`.
pub fn plan_ascension(hero: &AscensionCandidate, collection: &[AscensionCandidate]) -> Result<AscensionPlan, BattleError> {
    let next = hero
        .tier
        .next()
        .ok_or_else(|| BattleError::invalid(format!("hero {} is already at max ascension", hero.id)))?;

    if hero.level < next.required_level() {
        return Err(BattleError::invalid(format!(
            "hero must be level {} to ascend to {}",
            next.required_level(),
            next
        )));
    }

    let eligible: Vec<CombatantId> = collection
        .iter()
        .filter(|c| c.id != hero.id && !c.in_team && c.tier == hero.tier)
        .filter(|c| !next.needs_matching_fodder() || (c.rarity == hero.rarity && c.class_id == hero.class_id))
        .map(|c| c.id)
        .collect();

    let needed = next.required_fodder();
    if eligible.len() < needed {
        let reason = if next.needs_matching_fodder() {
            format!(
                "need {} {} {} heroes of {} ascension",
                needed, hero.rarity, hero.class_id, hero.tier
            )
        } else {
            format!("need {} heroes of {} ascension", needed, hero.tier)
        };
        return Err(BattleError::invalid(reason));
    }

    Ok(AscensionPlan {
        hero: hero.id,
        from: hero.tier,
        to: next,
        fodder: eligible.into_iter().take(needed).collect(),
    })
}

/// Rescale stats from one tier's multiplier to another's, flooring.
pub fn ascended_stats(stats: &StatBlock, from: AscensionTier, to: AscensionTier) -> StatBlock {
    stats.scaled_ratio(percent(to.stat_multiplier()), percent(from.stat_multiplier()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, class_id: &str, rarity: Rarity, level: u32, tier: AscensionTier) -> AscensionCandidate {
        AscensionCandidate {
            id: CombatantId(id),
            class_id: class_id.to_string(),
            rarity,
            level,
            tier,
            in_team: false,
        }
    }

    #[test]
    fn test_tiers_are_ordered() {
        assert!(AscensionTier::Basic < AscensionTier::Elite);
        assert_eq!(AscensionTier::MythicPlus.next(), Some(AscensionTier::Ascended));
        assert_eq!(AscensionTier::Ascended.next(), None);
    }

    #[test]
    fn test_elite_needs_matching_fodder() {
        let hero = candidate(1, "mage", Rarity::Rare, 20, AscensionTier::Basic);
        let mut collection = vec![
            hero.clone(),
            candidate(2, "mage", Rarity::Rare, 1, AscensionTier::Basic),
            candidate(3, "warrior", Rarity::Rare, 1, AscensionTier::Basic),
            candidate(4, "mage", Rarity::Common, 1, AscensionTier::Basic),
        ];
        assert!(plan_ascension(&hero, &collection).is_err());

        collection.push(candidate(5, "mage", Rarity::Rare, 3, AscensionTier::Basic));
        let plan = plan_ascension(&hero, &collection).unwrap();
        assert_eq!(plan.to, AscensionTier::Elite);
        assert_eq!(plan.fodder, vec![CombatantId(2), CombatantId(5)]);
    }

    #[test]
    fn test_team_members_are_never_fodder() {
        let hero = candidate(1, "mage", Rarity::Rare, 20, AscensionTier::Basic);
        let mut busy = candidate(2, "mage", Rarity::Rare, 1, AscensionTier::Basic);
        busy.in_team = true;
        let collection = vec![busy, candidate(3, "mage", Rarity::Rare, 1, AscensionTier::Basic)];
        assert!(plan_ascension(&hero, &collection).is_err());
    }

    #[test]
    fn test_legendary_plus_takes_any_single_legendary() {
        let hero = candidate(1, "tank", Rarity::Epic, 80, AscensionTier::Legendary);
        let collection = vec![candidate(9, "healer", Rarity::Common, 60, AscensionTier::Legendary)];
        let plan = plan_ascension(&hero, &collection).unwrap();
        assert_eq!(plan.to, AscensionTier::LegendaryPlus);
        assert_eq!(plan.fodder, vec![CombatantId(9)]);
    }

    #[test]
    fn test_level_requirement() {
        let hero = candidate(1, "tank", Rarity::Epic, 19, AscensionTier::Basic);
        let err = plan_ascension(&hero, &[]).unwrap_err();
        assert!(err.to_string().contains("level 20"));
    }

    #[test]
    fn test_ascended_stats_use_tier_ratio() {
        let stats = StatBlock::new(100.0, 10.0, 10.0, 10.0);
        let legendary = ascended_stats(&stats, AscensionTier::Basic, AscensionTier::Legendary);
        assert_eq!(legendary, StatBlock::new(200.0, 20.0, 20.0, 20.0));
    }
}
