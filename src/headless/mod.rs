//! Headless mode for automated battle runs
//!
//! This module runs campaign stages and dungeon runs without any front end,
//! with every hero on auto battle. Useful for balance checks and for
//! reproducing a battle from its seed.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless battle
//! cargo run --release -- --headless battle_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "team": [
//!     { "class": "warrior", "level": 5, "rarity": "rare", "pet": "wolf" },
//!     { "class": "healer", "level": 4 }
//!   ],
//!   "stage": "1-3",
//!   "max_turns": 300,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessBattleConfig;
pub use runner::{run_headless_battle, BattleReport, CombatantResult};
