//! Battle lifecycle and outcome detection

use serde::{Deserialize, Serialize};

use super::combatant::Side;
use super::state::BattleState;

/// `NotStarted -> InProgress -> {Won, Lost}`. Won and Lost are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl BattlePhase {
    pub fn is_in_progress(&self) -> bool {
        *self == BattlePhase::InProgress
    }

    /// Winning side for a terminal phase.
    pub fn winner(&self) -> Option<Side> {
        match self {
            BattlePhase::Won => Some(Side::Player),
            BattlePhase::Lost => Some(Side::Opposing),
            _ => None,
        }
    }
}

/// Terminal phase implied by the current teams, if any.
///
/// The player side is checked first, so a battle where both sides are down
/// counts as lost.
pub fn detect_outcome(state: &BattleState) -> Option<BattlePhase> {
    if state.all_defeated(Side::Player) {
        Some(BattlePhase::Lost)
    } else if state.all_defeated(Side::Opposing) {
        Some(BattlePhase::Won)
    } else {
        None
    }
}
