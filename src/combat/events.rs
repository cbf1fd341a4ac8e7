//! Battle events and collaborator interfaces
//!
//! The session reports everything it does through `BattleObserver`s and pays
//! out through a `RewardIssuer`. Both are plain trait objects so UI layers,
//! the headless runner and tests can plug in without touching the engine.

use bevy::log::warn;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::action::ActionResult;
use super::combatant::CombatantId;
use super::effects::StatusEffect;
use super::outcome::BattlePhase;
use super::state::BattleContext;

/// Typed notification emitted by a `BattleSession`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BattleEvent {
    BattleStarted {
        context: BattleContext,
        player_team: Vec<CombatantId>,
        opposing_team: Vec<CombatantId>,
        /// Ids in initiative order
        turn_order: Vec<CombatantId>,
    },
    TurnStarted {
        actor: CombatantId,
        turn: u32,
    },
    ActionResolved(ActionResult),
    EffectExpired(StatusEffect),
    AutoBattleChanged {
        enabled: bool,
    },
    /// The session is waiting on a player decision for `actor`
    AwaitingInput {
        actor: CombatantId,
    },
    BattleEnded {
        phase: BattlePhase,
        context: BattleContext,
        turns: u32,
    },
}

pub trait BattleObserver: Send + Sync {
    fn on_event(&mut self, event: &BattleEvent);

    /// Human-readable battle log line.
    fn on_log(&mut self, _message: &str) {}
}

/// Reward and progression hooks. Each is called at most once per battle.
pub trait RewardIssuer: Send + Sync {
    fn on_victory(&mut self, context: &BattleContext);

    fn on_defeat(&mut self, context: &BattleContext);

    /// Called after `on_victory` with the ids of the player team.
    fn on_post_battle_experience(&mut self, team: &[CombatantId], victory: bool);
}

/// Lock a shared collaborator. A poisoned lock is recovered so no callback
/// is lost to an earlier panic.
fn lock_shared<'a, T>(shared: &'a Mutex<T>, call: &str) -> MutexGuard<'a, T> {
    shared.lock().unwrap_or_else(|poisoned| {
        warn!("Recovering poisoned lock for {}", call);
        poisoned.into_inner()
    })
}

impl<T: BattleObserver> BattleObserver for Arc<Mutex<T>> {
    fn on_event(&mut self, event: &BattleEvent) {
        lock_shared(&**self, "on_event").on_event(event);
    }

    fn on_log(&mut self, message: &str) {
        lock_shared(&**self, "on_log").on_log(message);
    }
}

impl<T: RewardIssuer> RewardIssuer for Arc<Mutex<T>> {
    fn on_victory(&mut self, context: &BattleContext) {
        lock_shared(&**self, "on_victory").on_victory(context);
    }

    fn on_defeat(&mut self, context: &BattleContext) {
        lock_shared(&**self, "on_defeat").on_defeat(context);
    }

    fn on_post_battle_experience(&mut self, team: &[CombatantId], victory: bool) {
        lock_shared(&**self, "on_post_battle_experience").on_post_battle_experience(team, victory);
    }
}

/// Buffers events and log lines until someone drains them.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<BattleEvent>,
    lines: Vec<String>,
}

impl EventQueue {
    pub fn shared() -> Arc<Mutex<EventQueue>> {
        Arc::new(Mutex::new(EventQueue::default()))
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl BattleObserver for EventQueue {
    fn on_event(&mut self, event: &BattleEvent) {
        self.events.push(event.clone());
    }

    fn on_log(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        victories: u32,
    }

    impl RewardIssuer for Tally {
        fn on_victory(&mut self, _context: &BattleContext) {
            self.victories += 1;
        }

        fn on_defeat(&mut self, _context: &BattleContext) {}

        fn on_post_battle_experience(&mut self, _team: &[CombatantId], _victory: bool) {}
    }

    #[test]
    fn test_poisoned_reward_issuer_still_pays() {
        let shared = Arc::new(Mutex::new(Tally::default()));
        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("issuer panicked mid-callback");
        })
        .join();
        assert!(shared.is_poisoned());

        let mut issuer = Arc::clone(&shared);
        issuer.on_victory(&BattleContext::campaign("1-1"));

        let tally = shared.lock().unwrap_or_else(|p| p.into_inner());
        assert_eq!(tally.victories, 1);
    }

    #[test]
    fn test_shared_queue_collects_events_and_lines() {
        let queue = EventQueue::shared();
        let mut observer = Arc::clone(&queue);
        observer.on_event(&BattleEvent::AutoBattleChanged { enabled: true });
        observer.on_log("Auto battle enabled");

        let mut queue = queue.lock().unwrap();
        assert_eq!(queue.events().len(), 1);
        assert_eq!(queue.drain_lines(), vec!["Auto battle enabled".to_string()]);
        assert!(queue.lines().is_empty());
    }
}
