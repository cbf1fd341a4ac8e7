//! Progression outside the battle itself: currencies, campaign unlocks,
//! dungeon runs and the reward issuer that ties them to battle results.

pub mod campaign;
pub mod dungeon;
pub mod ledger;
pub mod rewards;

pub use campaign::{next_stage_id, stage_encounter, CampaignProgress};
pub use dungeon::{DungeonProgress, DungeonRun, FloorOutcome};
pub use ledger::{ResourceLedger, Rewards};
pub use rewards::LedgerRewards;
