//! Combat logging
//!
//! Records all battle events for display and post-battle analysis. Every
//! entry keeps the human-readable line the UI shows plus, where it matters,
//! structured data the aggregation queries work from.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::action::{ActionEffect, ActionResult, ActionSource};
use super::combatant::{CombatantId, EffectKind, Side};
use super::effects::StatusEffect;
use super::state::{BattleContext, BattleState};

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Unit step the entry was recorded in (0 = before the first step)
    pub turn: u32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Machine-readable details for aggregation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Buff applied by an ability
    Buff,
    /// Buff expired
    AuraRemoved,
    /// Pet ability fired
    PetAbility,
    /// Fallen unit brought back
    Revive,
    /// Combatant defeated
    Death,
    /// Battle event (start, end, auto-battle, waiting on input)
    MatchEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StructuredEventData {
    Damage {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        dodged: bool,
        is_killing_blow: bool,
    },
    Healing {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
    },
    Buff {
        source: CombatantId,
        ability: String,
        kind: EffectKind,
        magnitude: f32,
        duration: u32,
        targets: Vec<CombatantId>,
    },
    Revive {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        health: f32,
    },
    Death {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
}

/// Final state of one combatant, written alongside a saved log.
#[derive(Debug, Clone, Serialize)]
pub struct CombatantMetadata {
    pub id: CombatantId,
    pub name: String,
    pub class_id: String,
    pub level: u32,
    pub rarity: String,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BattleMetadata {
    pub context: BattleContext,
    pub winner: Option<Side>,
    pub turns: u32,
    pub random_seed: Option<u64>,
    pub player_team: Vec<CombatantMetadata>,
    pub opposing_team: Vec<CombatantMetadata>,
}

impl BattleMetadata {
    /// Snapshot both teams of `state` together with per-unit log totals.
    pub fn from_state(state: &BattleState, log: &CombatLog, random_seed: Option<u64>) -> Self {
        let describe = |side: Side| {
            state
                .team(side)
                .iter()
                .map(|c| CombatantMetadata {
                    id: c.id,
                    name: c.name.clone(),
                    class_id: c.class_id.clone(),
                    level: c.level,
                    rarity: c.rarity.name().to_string(),
                    max_health: c.max_health(),
                    final_health: c.current_health,
                    damage_dealt: log.total_damage_dealt(c.id),
                    damage_taken: log.total_damage_taken(c.id),
                })
                .collect()
        };
        Self {
            context: state.context.clone(),
            winner: state.phase.winner(),
            turns: state.turns_taken,
            random_seed,
            player_team: describe(Side::Player),
            opposing_team: describe(Side::Opposing),
        }
    }
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a BattleMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log storing all events of the current battle
#[derive(Debug, Clone, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current unit step
    pub turn: u32,
    names: HashMap<CombatantId, String>,
}

impl CombatLog {
    /// Clear the log for a new battle
    pub fn clear(&mut self) {
        self.entries.clear();
        self.names.clear();
        self.turn = 0;
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.turn = turn;
    }

    /// Remember a display name for structured entries.
    pub fn register_combatant(&mut self, id: CombatantId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn name_of(&self, id: CombatantId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            turn: self.turn,
            event_type,
            message,
            data,
        });
    }

    pub fn log_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        dodged: bool,
        is_killing_blow: bool,
        message: String,
    ) {
        self.push(
            CombatLogEventType::Damage,
            message,
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                dodged,
                is_killing_blow,
            }),
        );
    }

    pub fn log_healing(&mut self, source: CombatantId, target: CombatantId, ability: String, amount: f32, message: String) {
        self.push(
            CombatLogEventType::Healing,
            message,
            Some(StructuredEventData::Healing {
                source,
                target,
                ability,
                amount,
            }),
        );
    }

    pub fn log_death(&mut self, victim: CombatantId, killer: Option<CombatantId>) -> String {
        let message = format!("{} has been defeated!", self.name_of(victim));
        self.push(
            CombatLogEventType::Death,
            message.clone(),
            Some(StructuredEventData::Death { victim, killer }),
        );
        message
    }

    /// Log one resolved action. Returns the lines written, in order.
    pub fn record_action(&mut self, result: &ActionResult) -> Vec<String> {
        let actor = match &result.source {
            ActionSource::Pet { pet, .. } => format!("{}'s {}", self.name_of(result.actor), pet),
            _ => self.name_of(result.actor),
        };
        let ability = result.source.label().to_string();
        let pet_action = result.is_pet();
        let mut lines = Vec::new();

        match &result.effect {
            ActionEffect::Damage(hits) => {
                for hit in hits {
                    let target = self.name_of(hit.target);
                    let message = match (&result.source, hit.dodged) {
                        (_, true) => format!("{} dodges {}'s {} and takes only {} damage!", target, actor, ability, hit.amount),
                        (ActionSource::BasicAttack, false) => {
                            format!("{} attacks {} for {} damage!", actor, target, hit.amount)
                        }
                        _ => format!("{} uses {} on {} for {} damage!", actor, ability, target, hit.amount),
                    };
                    self.log_damage(
                        result.actor,
                        hit.target,
                        ability.clone(),
                        hit.amount,
                        hit.dodged,
                        hit.defeated,
                        message.clone(),
                    );
                    lines.push(message);
                }
                for hit in hits.iter().filter(|h| h.defeated) {
                    lines.push(self.log_death(hit.target, Some(result.actor)));
                }
            }
            ActionEffect::Heal { target, amount } => {
                let message = format!(
                    "{} uses {} and heals {} for {} HP!",
                    actor,
                    ability,
                    self.name_of(*target),
                    amount
                );
                self.log_healing(result.actor, *target, ability.clone(), *amount, message.clone());
                lines.push(message);
            }
            ActionEffect::Buff {
                kind,
                magnitude,
                duration,
                targets,
            } => {
                let message = if *kind == EffectKind::Taunt {
                    format!("{} uses {} and draws attention for {} turns!", actor, ability, duration)
                } else {
                    format!(
                        "{} uses {}! {} boosted for {} allies over {} turns.",
                        actor,
                        ability,
                        kind.name(),
                        targets.len(),
                        duration
                    )
                };
                let event_type = if pet_action {
                    CombatLogEventType::PetAbility
                } else {
                    CombatLogEventType::Buff
                };
                self.push(
                    event_type,
                    message.clone(),
                    Some(StructuredEventData::Buff {
                        source: result.actor,
                        ability: ability.clone(),
                        kind: *kind,
                        magnitude: *magnitude,
                        duration: *duration,
                        targets: targets.clone(),
                    }),
                );
                lines.push(message);
            }
            ActionEffect::Revive { target, health } => {
                let message = format!("{} revives {} with {} HP!", actor, self.name_of(*target), health);
                self.push(
                    CombatLogEventType::Revive,
                    message.clone(),
                    Some(StructuredEventData::Revive {
                        source: result.actor,
                        target: *target,
                        ability: ability.clone(),
                        health: *health,
                    }),
                );
                lines.push(message);
            }
        }
        lines
    }

    pub fn record_expired(&mut self, effect: &StatusEffect) -> String {
        let message = format!("{}'s {} from {} wore off.", self.name_of(effect.target), effect.kind.name(), effect.source);
        self.log(CombatLogEventType::AuraRemoved, message.clone());
        message
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage, healing and revives)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing | CombatLogEventType::Revive
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    fn damage_entries(&self) -> impl Iterator<Item = (CombatantId, CombatantId, &str, f32, bool)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Damage {
                source,
                target,
                ability,
                amount,
                is_killing_blow,
                ..
            }) => Some((*source, *target, ability.as_str(), *amount, *is_killing_blow)),
            _ => None,
        })
    }

    fn healing_entries(&self) -> impl Iterator<Item = (CombatantId, &str, f32)> {
        self.entries.iter().filter_map(|e| match &e.data {
            Some(StructuredEventData::Healing {
                source,
                ability,
                amount,
                ..
            }) => Some((*source, ability.as_str(), *amount)),
            _ => None,
        })
    }

    /// Damage dealt by `source`, keyed by ability label.
    pub fn damage_by_ability(&self, source: CombatantId) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (src, _, ability, amount, _) in self.damage_entries() {
            if src == source {
                *totals.entry(ability.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: CombatantId) -> f32 {
        self.damage_entries()
            .filter(|(src, ..)| *src == source)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn total_damage_taken(&self, target: CombatantId) -> f32 {
        self.damage_entries()
            .filter(|(_, tgt, ..)| *tgt == target)
            .map(|(_, _, _, amount, _)| amount)
            .sum()
    }

    pub fn healing_by_ability(&self, source: CombatantId) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for (src, ability, amount) in self.healing_entries() {
            if src == source {
                *totals.entry(ability.to_string()).or_insert(0.0) += amount;
            }
        }
        totals
    }

    pub fn total_healing_done(&self, source: CombatantId) -> f32 {
        self.healing_entries()
            .filter(|(src, ..)| *src == source)
            .map(|(_, _, amount)| amount)
            .sum()
    }

    pub fn killing_blows(&self, source: CombatantId) -> usize {
        self.damage_entries()
            .filter(|(src, _, _, _, killing)| *src == source && *killing)
            .count()
    }

    /// Write the log and battle metadata as pretty JSON.
    ///
    /// Without an explicit path the file goes to `battle_logs/` with a
    /// timestamped name. Returns the path written.
    pub fn save_to_file(&self, metadata: &BattleMetadata, path: Option<&str>) -> Result<String, String> {
        let filename = match path {
            Some(p) => p.to_string(),
            None => {
                std::fs::create_dir_all("battle_logs")
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                format!("battle_logs/battle_{}.json", stamp)
            }
        };

        if let Some(parent) = Path::new(&filename).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
            }
        }

        let json = serde_json::to_string_pretty(&SavedLog {
            metadata,
            entries: &self.entries,
        })
        .map_err(|e| format!("Failed to serialize combat log: {}", e))?;
        std::fs::write(&filename, json).map_err(|e| format!("Failed to write combat log: {}", e))?;
        Ok(filename)
    }
}
