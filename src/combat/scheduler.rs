//! Turn scheduler
//!
//! Initiative is decided once per battle by speed. The pointer then walks the
//! fixed order, skipping anyone who has been defeated.

use serde::{Deserialize, Serialize};

use super::combatant::{Combatant, Side};
use super::state::BattleState;

/// Position of a unit inside one of the two team lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    pub side: Side,
    pub index: usize,
}

/// Player team then opposing team, stable-sorted by descending speed.
///
/// Ties keep their concatenation order, so with equal speeds player units act
/// before opposing units and each team keeps its own order.
pub fn compute_turn_order(player_team: &[Combatant], opposing_team: &[Combatant]) -> Vec<UnitRef> {
    let mut order: Vec<(UnitRef, f32)> = player_team
        .iter()
        .enumerate()
        .map(|(index, c)| (UnitRef { side: Side::Player, index }, c.stats.speed))
        .chain(
            opposing_team
                .iter()
                .enumerate()
                .map(|(index, c)| (UnitRef { side: Side::Opposing, index }, c.stats.speed)),
        )
        .collect();

    // sort_by is stable
    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    order.into_iter().map(|(unit, _)| unit).collect()
}

/// Move the pointer to the next living unit.
///
/// Returns the new pointer, or `None` when every unit in the order is
/// defeated. The pointer is left unchanged in that case.
pub fn advance(state: &mut BattleState) -> Option<usize> {
    let len = state.turn_order.len();
    if len == 0 {
        return None;
    }

    let mut index = state.current_turn;
    for _ in 0..len {
        index = (index + 1) % len;
        let alive = state
            .unit(state.turn_order[index])
            .map(|c| c.is_alive())
            .unwrap_or(false);
        if alive {
            state.current_turn = index;
            return Some(index);
        }
    }
    None
}
