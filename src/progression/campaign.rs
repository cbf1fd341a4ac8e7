//! Campaign stages: fixed enemy lineups and linear unlocks

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::GameCatalog;
use crate::combat::state::BattleContext;
use crate::error::BattleError;
use crate::roster::{EnemySpec, Encounter};

/// Stages per chapter before the next chapter opens.
pub const STAGES_PER_CHAPTER: u32 = 5;

pub const FIRST_STAGE: &str = "1-1";

/// Build the encounter for a campaign stage.
pub fn stage_encounter(catalog: &GameCatalog, stage_id: &str) -> Result<Encounter, BattleError> {
    let stage = catalog.stage(stage_id)?;
    let enemies = stage
        .enemies
        .iter()
        .map(|e| EnemySpec::Fixed {
            class: e.class.clone(),
            level: e.level,
            rarity: e.rarity,
        })
        .collect();
    Ok(Encounter::new(enemies, BattleContext::campaign(stage_id)))
}

fn parse_stage_id(stage_id: &str) -> Option<(u32, u32)> {
    let (chapter, stage) = stage_id.split_once('-')?;
    Some((chapter.parse().ok()?, stage.parse().ok()?))
}

/// Stage unlocked by clearing `stage_id`, if the catalog has one.
///
/// `c-s` leads to `c-(s+1)` inside a chapter and to `(c+1)-1` after the
/// last stage of a chapter.
pub fn next_stage_id(catalog: &GameCatalog, stage_id: &str) -> Option<String> {
    let (chapter, stage) = parse_stage_id(stage_id)?;
    let next = if stage < STAGES_PER_CHAPTER {
        format!("{}-{}", chapter, stage + 1)
    } else {
        format!("{}-1", chapter + 1)
    };
    catalog.stages.contains_key(&next).then_some(next)
}

/// Which stages the player can fight and which are cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignProgress {
    /// Furthest unlocked stage
    pub current_stage: String,
    pub cleared: BTreeSet<String>,
}

impl Default for CampaignProgress {
    fn default() -> Self {
        Self {
            current_stage: FIRST_STAGE.to_string(),
            cleared: BTreeSet::new(),
        }
    }
}

impl CampaignProgress {
    pub fn is_cleared(&self, stage_id: &str) -> bool {
        self.cleared.contains(stage_id)
    }

    /// Mark a stage cleared. Unlocks the following stage when the cleared
    /// one was the furthest unlocked. Returns the newly unlocked id.
    pub fn record_clear(&mut self, catalog: &GameCatalog, stage_id: &str) -> Option<String> {
        self.cleared.insert(stage_id.to_string());
        if stage_id != self.current_stage {
            return None;
        }
        let next = next_stage_id(catalog, stage_id)?;
        self.current_stage = next.clone();
        Some(next)
    }
}
