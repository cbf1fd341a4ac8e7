//! HeroSim - Turn-Based Battle Engine for an Idle Hero Collector
//!
//! Heroes and enemies take turns in speed order, trading basic attacks,
//! abilities and pet effects until one side is wiped out. Campaign stages,
//! dungeon runs and the resource ledger sit on top of the battle session.
//!
//! This library exposes the engine modules for testing and reuse.

pub mod catalog;
pub mod cli;
pub mod combat;
pub mod error;
pub mod headless;
pub mod progression;
pub mod rng;
pub mod roster;
pub mod session;

// Re-export commonly used types
pub use catalog::GameCatalog;
pub use combat::log::{CombatLog, CombatLogEventType};
pub use error::BattleError;
pub use headless::HeadlessBattleConfig;
pub use rng::GameRng;
pub use session::{BattleSession, BattleSnapshot, StepMode, TurnResult};
