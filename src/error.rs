//! Battle engine errors
//!
//! Every rejected request maps to one variant so callers can branch on it.
//! None of these are fatal to the session: the battle state is left exactly
//! as it was before the failing call.

use thiserror::Error;

use crate::combat::combatant::Side;

/// Errors surfaced by the roster, resolver and session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BattleError {
    /// Unknown class, ability, rarity, pet, stage or dungeon identifier.
    #[error("unknown {kind} identifier: '{id}'")]
    Configuration { kind: &'static str, id: String },

    /// Malformed input rejected before any state was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A battle was requested without any player combatants.
    #[error("cannot start a battle with an empty player team")]
    EmptyTeam,

    /// The requested side has no living members to target.
    #[error("no living targets on the {0} side")]
    NoValidTarget(Side),

    /// Non-fatal refusal: cooldown, exhausted uses, nothing to revive.
    #[error("ability unavailable: {0}")]
    AbilityUnavailable(String),

    /// No battle is running (never started, or already won or lost).
    #[error("no battle is in progress")]
    NotInProgress,

    /// The battle is running but is not waiting on a player decision.
    #[error("the current turn is not waiting for player input")]
    NotAwaitingInput,
}

impl BattleError {
    pub fn configuration(kind: &'static str, id: impl Into<String>) -> Self {
        BattleError::Configuration {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        BattleError::InvalidArgument(reason.into())
    }

    /// True for the soft failures the turn loop is allowed to shrug off.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, BattleError::AbilityUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_names_kind_and_id() {
        let err = BattleError::configuration("class", "paladin");
        assert_eq!(err.to_string(), "unknown class identifier: 'paladin'");
    }

    #[test]
    fn test_only_ability_unavailable_is_soft() {
        assert!(BattleError::AbilityUnavailable("cooldown".into()).is_unavailable());
        assert!(!BattleError::EmptyTeam.is_unavailable());
        assert!(!BattleError::NoValidTarget(Side::Opposing).is_unavailable());
    }
}
