//! Combat system
//!
//! Implements the core turn-based battle mechanics:
//! - Combatant stats, abilities and health
//! - Speed-ordered turn scheduling
//! - Damage, healing and timed buffs
//! - Pet abilities with cooldowns
//! - Enemy and auto-battle AI
//! - Combat logging and battle events

pub mod action;
pub mod ai;
pub mod combatant;
pub mod effects;
pub mod events;
pub mod log;
pub mod outcome;
pub mod pets;
pub mod resolver;
pub mod scheduler;
pub mod state;

pub use action::{Action, ActionResult};
pub use combatant::{Combatant, CombatantId, Side, StatBlock};
pub use outcome::BattlePhase;
