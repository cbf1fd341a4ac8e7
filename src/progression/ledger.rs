//! Player resources and idle income

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::time::Duration;

use crate::combat::combatant::percent;
use crate::error::BattleError;

/// Idle income stops accruing after a full day.
pub const IDLE_CAP_MINUTES: u64 = 1440;

/// Experience needed per player level.
pub const EXP_PER_LEVEL: u64 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub gold: u64,
    pub exp: u64,
    pub gems: u64,
}

impl Rewards {
    pub fn new(gold: u64, exp: u64, gems: u64) -> Self {
        Self { gold, exp, gems }
    }

    /// Multiply each currency separately, flooring the results. Multipliers
    /// are read to hundredths.
    pub fn scaled(&self, gold: f32, exp: f32, gems: f32) -> Self {
        Self {
            gold: self.gold * percent(gold) / 100,
            exp: self.exp * percent(exp) / 100,
            gems: self.gems * percent(gems) / 100,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.exp == 0 && self.gems == 0
    }
}

impl Add for Rewards {
    type Output = Rewards;

    fn add(self, rhs: Rewards) -> Rewards {
        Rewards {
            gold: self.gold + rhs.gold,
            exp: self.exp + rhs.exp,
            gems: self.gems + rhs.gems,
        }
    }
}

impl AddAssign for Rewards {
    fn add_assign(&mut self, rhs: Rewards) {
        *self = *self + rhs;
    }
}

/// Chapter number of a `c-s` stage id.
pub fn chapter_of(stage_id: &str) -> u32 {
    stage_id
        .split('-')
        .next()
        .and_then(|c| c.parse().ok())
        .unwrap_or(1)
}

/// Gold, experience and gems owned by the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    pub gold: u64,
    pub exp: u64,
    pub gems: u64,
    pub player_level: u32,
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self {
            gold: 0,
            exp: 0,
            gems: 0,
            player_level: 1,
        }
    }
}

impl ResourceLedger {
    pub fn exp_to_next_level(&self) -> u64 {
        EXP_PER_LEVEL * self.player_level as u64
    }

    /// Add rewards and apply any level-ups. Returns the number of levels gained.
    pub fn credit(&mut self, rewards: Rewards) -> u32 {
        self.gold += rewards.gold;
        self.exp += rewards.exp;
        self.gems += rewards.gems;

        let mut gained = 0;
        while self.exp >= self.exp_to_next_level() {
            self.exp -= self.exp_to_next_level();
            self.player_level += 1;
            gained += 1;
        }
        gained
    }

    pub fn spend_gold(&mut self, amount: u64) -> Result<(), BattleError> {
        if self.gold < amount {
            return Err(BattleError::invalid(format!(
                "not enough gold: need {}, have {}",
                amount, self.gold
            )));
        }
        self.gold -= amount;
        Ok(())
    }

    pub fn spend_gems(&mut self, amount: u64) -> Result<(), BattleError> {
        if self.gems < amount {
            return Err(BattleError::invalid(format!(
                "not enough gems: need {}, have {}",
                amount, self.gems
            )));
        }
        self.gems -= amount;
        Ok(())
    }

    /// Per-minute idle income for the player's level in `chapter`.
    pub fn idle_rate(&self, chapter: u32) -> Rewards {
        let level = self.player_level as u64;
        let chapter = chapter as u64;
        Rewards {
            gold: 10 * level + 5 * chapter,
            exp: 5 * level + 2 * chapter,
            gems: 0,
        }
    }

    /// Income for `minutes` of idle time, capped at one day.
    pub fn idle_rewards(&self, minutes: u64, chapter: u32) -> Rewards {
        let minutes = minutes.min(IDLE_CAP_MINUTES);
        let rate = self.idle_rate(chapter);
        Rewards {
            gold: rate.gold * minutes,
            exp: rate.exp * minutes,
            gems: 0,
        }
    }

    /// Credit idle income for a wall-clock delta. Less than a full minute
    /// is rejected and nothing is credited.
    pub fn collect_idle(&mut self, elapsed: Duration, chapter: u32) -> Result<Rewards, BattleError> {
        let minutes = elapsed.as_secs() / 60;
        if minutes < 1 {
            return Err(BattleError::invalid("not enough time has passed to collect rewards"));
        }
        let rewards = self.idle_rewards(minutes, chapter);
        self.credit(rewards);
        Ok(rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_rewards_land_on_whole_numbers() {
        let bonus = Rewards::new(500, 100, 20).scaled(1.1, 1.3, 1.15);
        assert_eq!(bonus, Rewards::new(550, 130, 23));
    }

    #[test]
    fn test_level_up_carries_remainder() {
        let mut ledger = ResourceLedger::default();
        let gained = ledger.credit(Rewards::new(0, 350, 0));
        // 100 for level 1, 200 for level 2, 50 left over
        assert_eq!(gained, 2);
        assert_eq!(ledger.player_level, 3);
        assert_eq!(ledger.exp, 50);
    }

    #[test]
    fn test_idle_rate_formula() {
        let ledger = ResourceLedger {
            player_level: 4,
            ..Default::default()
        };
        assert_eq!(ledger.idle_rate(2), Rewards::new(50, 24, 0));
    }

    #[test]
    fn test_idle_rewards_capped_at_one_day() {
        let ledger = ResourceLedger::default();
        assert_eq!(ledger.idle_rewards(5000, 1), ledger.idle_rewards(IDLE_CAP_MINUTES, 1));
        assert_eq!(ledger.idle_rewards(10, 1).gold, 150);
    }

    #[test]
    fn test_collect_idle_requires_a_minute() {
        let mut ledger = ResourceLedger::default();
        assert!(ledger.collect_idle(Duration::from_secs(59), 1).is_err());
        assert_eq!(ledger.gold, 0);
        let rewards = ledger.collect_idle(Duration::from_secs(120), 1).unwrap();
        assert_eq!(rewards.gold, 30);
        assert_eq!(ledger.gold, 30);
    }

    #[test]
    fn test_spending_rejects_overdraw() {
        let mut ledger = ResourceLedger::default();
        ledger.credit(Rewards::new(100, 0, 5));
        assert!(ledger.spend_gems(6).is_err());
        assert!(ledger.spend_gold(100).is_ok());
        assert_eq!(ledger.gold, 0);
    }

    #[test]
    fn test_chapter_parsing() {
        assert_eq!(chapter_of("2-3"), 2);
        assert_eq!(chapter_of("garbage"), 1);
    }
}
