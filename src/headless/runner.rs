//! Headless battle execution
//!
//! Runs battles without any graphical output, suitable for automated testing
//! and balance runs. The session advances one unit step per app update.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use crate::catalog::GameCatalog;
use crate::combat::combatant::{Combatant, Side};
use crate::combat::events::{BattleEvent, EventQueue};
use crate::combat::log::{BattleMetadata, CombatantMetadata};
use crate::combat::outcome::BattlePhase;
use crate::progression::campaign::stage_encounter;
use crate::progression::ledger::{ResourceLedger, Rewards};
use crate::progression::rewards::LedgerRewards;
use crate::rng::GameRng;
use crate::roster::Encounter;
use crate::session::{BattleSession, StepMode};

use super::config::HeadlessBattleConfig;

/// Result of a completed headless battle
///
/// This struct provides programmatic access to battle results for testing and analysis.
#[derive(Debug, Clone)]
pub struct BattleReport {
    /// The winning side, or None for a draw
    pub winner: Option<Side>,
    /// Unit steps taken, summed over every floor fought
    pub turns: u32,
    /// Dungeon floors won (0 for campaign battles)
    pub floors_cleared: usize,
    /// Final state of the heroes in the last battle fought
    pub player_team: Vec<CombatantResult>,
    /// Final state of the enemies in the last battle fought
    pub opposing_team: Vec<CombatantResult>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    /// Gold, exp and gems credited across the run
    pub rewards: Rewards,
    /// Where the battle log was written
    pub log_path: Option<String>,
}

/// Statistics for a single combatant after the battle
#[derive(Debug, Clone)]
pub struct CombatantResult {
    pub name: String,
    /// Class id (e.g., "warrior", "mage")
    pub class_id: String,
    pub level: u32,
    pub max_health: f32,
    /// Health remaining at battle end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

impl From<&CombatantMetadata> for CombatantResult {
    fn from(meta: &CombatantMetadata) -> Self {
        Self {
            name: meta.name.clone(),
            class_id: meta.class_id.clone(),
            level: meta.level,
            max_health: meta.max_health,
            final_health: meta.final_health,
            survived: meta.final_health > 0.0,
            damage_dealt: meta.damage_dealt,
            damage_taken: meta.damage_taken,
        }
    }
}

/// Engine event re-published on the bevy event bus
#[derive(Event, Debug, Clone)]
pub struct BattleEventMessage(pub BattleEvent);

/// The running session and the collaborators wired into it
#[derive(Resource)]
pub struct ActiveBattle {
    pub session: BattleSession,
    pub queue: Arc<Mutex<EventQueue>>,
    pub rewards: Arc<Mutex<LedgerRewards>>,
    /// Heroes as configured, re-used for every dungeon floor
    pub player_team: Vec<Combatant>,
}

/// Resource to track headless battle state
#[derive(Resource)]
pub struct HeadlessBattleState {
    /// Unit steps per battle before declaring a draw
    pub max_turns: u32,
    /// Steps taken on floors already finished
    pub turns_before_floor: u32,
    pub floors_cleared: usize,
    /// Custom output path for battle log
    pub output_path: Option<String>,
    pub verbose: bool,
    /// Whether the battle has completed
    pub battle_complete: bool,
    /// Random seed for deterministic simulation (if provided)
    pub random_seed: Option<u64>,
    /// Battle report (populated when the battle completes)
    pub result: Option<BattleReport>,
}

/// Plugin for headless battle execution
pub struct HeadlessPlugin {
    pub config: HeadlessBattleConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HeadlessBattleState {
            max_turns: self.config.max_turns,
            turns_before_floor: 0,
            floors_cleared: 0,
            output_path: self.config.output_path.clone(),
            verbose: self.config.verbose,
            battle_complete: false,
            random_seed: self.config.random_seed,
            result: None,
        })
        .add_event::<BattleEventMessage>()
        .add_systems(Startup, headless_setup_battle)
        .add_systems(
            Update,
            (
                headless_step_battle,
                headless_forward_events,
                headless_check_battle_end,
            )
                .chain(),
        )
        .add_systems(PostUpdate, headless_exit_on_complete);
    }
}

/// Build the session, wire its collaborators and start the first battle.
pub fn prepare_battle(config: &HeadlessBattleConfig) -> Result<ActiveBattle, String> {
    let catalog = Arc::new(config.load_catalog()?);
    if let Err(problems) = catalog.validate() {
        return Err(format!("Invalid game data: {}", problems.join("; ")));
    }

    let rng = match config.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };
    // pet exp rolls get their own stream so they never shift battle rolls
    let reward_rng = match config.random_seed {
        Some(seed) => GameRng::from_seed(seed.wrapping_add(1)),
        None => GameRng::from_entropy(),
    };

    let (player_team, pets) = config.build_team(&catalog)?;

    let mut ledger = ResourceLedger::default();
    ledger.player_level = config.player_level;
    let mut issuer = LedgerRewards::new(Arc::clone(&catalog), reward_rng).with_ledger(ledger);
    for (owner, pet) in &pets {
        issuer.add_pet(*owner, pet.clone());
    }

    let encounter = first_encounter(config, &catalog, &mut issuer)?;
    let rewards = Arc::new(Mutex::new(issuer));
    let queue = EventQueue::shared();

    let mut session = BattleSession::new(Arc::clone(&catalog), rng).with_step_mode(StepMode::Manual);
    session.add_observer(Box::new(Arc::clone(&queue)));
    session.set_reward_issuer(Box::new(Arc::clone(&rewards)));
    for (owner, pet) in pets {
        session.equip_pet(owner, pet);
    }

    session
        .start_battle(&player_team, &encounter)
        .map_err(|e| format!("Failed to start battle: {}", e))?;
    session
        .set_auto_battle(true)
        .map_err(|e| format!("Failed to enable auto battle: {}", e))?;

    Ok(ActiveBattle {
        session,
        queue,
        rewards,
        player_team,
    })
}

fn first_encounter(
    config: &HeadlessBattleConfig,
    catalog: &GameCatalog,
    issuer: &mut LedgerRewards,
) -> Result<Encounter, String> {
    if let Some(stage) = &config.stage {
        return stage_encounter(catalog, stage).map_err(|e| e.to_string());
    }
    match &config.dungeon {
        Some(dungeon) => issuer.start_dungeon_run(dungeon).map_err(|e| e.to_string()),
        None => Err("one of stage or dungeon is required".to_string()),
    }
}

fn headless_setup_battle(battle: Res<ActiveBattle>) {
    let state = battle.session.state();
    info!(
        "Headless battle setup complete: {} heroes vs {} enemies ({})",
        state.player_team.len(),
        state.opposing_team.len(),
        state.context.describe()
    );
}

/// Advance the session by one unit step.
fn headless_step_battle(mut battle: ResMut<ActiveBattle>, headless_state: Res<HeadlessBattleState>) {
    if headless_state.battle_complete {
        return;
    }
    if battle.session.step().is_none() && battle.session.state().awaiting.is_some() {
        // auto battle is always on; recover if a front end turned it off
        if let Err(e) = battle.session.set_auto_battle(true) {
            warn!("Could not resume auto battle: {}", e);
        }
    }
}

/// Re-publish queued engine events and echo log lines when verbose.
fn headless_forward_events(
    battle: Res<ActiveBattle>,
    headless_state: Res<HeadlessBattleState>,
    mut writer: EventWriter<BattleEventMessage>,
) {
    let Ok(mut queue) = battle.queue.lock() else {
        return;
    };
    for line in queue.drain_lines() {
        if headless_state.verbose {
            println!("{}", line);
        }
    }
    for event in queue.drain_events() {
        writer.send(BattleEventMessage(event));
    }
}

/// Check whether the battle (or the dungeon run) has ended.
fn headless_check_battle_end(
    mut events: EventReader<BattleEventMessage>,
    mut battle: ResMut<ActiveBattle>,
    mut headless_state: ResMut<HeadlessBattleState>,
) {
    if headless_state.battle_complete {
        return;
    }

    let ended = events
        .read()
        .find_map(|e| match &e.0 {
            BattleEvent::BattleEnded { phase, .. } => Some(*phase),
            _ => None,
        });

    let phase = match ended {
        Some(phase) => phase,
        None => {
            if battle.session.state().turns_taken >= headless_state.max_turns {
                info!(
                    "Battle reached {} turns - declaring DRAW",
                    headless_state.max_turns
                );
                finish(&mut battle, &mut headless_state, None);
            }
            return;
        }
    };

    if phase == BattlePhase::Won {
        let next_floor = battle
            .rewards
            .lock()
            .ok()
            .filter(|r| r.run.is_some())
            .map(|r| r.next_floor_encounter());
        if let Some(next) = next_floor {
            headless_state.floors_cleared += 1;
            if let Some(encounter) = next {
                headless_state.turns_before_floor += battle.session.state().turns_taken;
                start_next_floor(&mut battle, &encounter, &mut headless_state);
                return;
            }
        }
    }

    finish(&mut battle, &mut headless_state, phase.winner());
}

fn start_next_floor(battle: &mut ActiveBattle, encounter: &Encounter, headless_state: &mut HeadlessBattleState) {
    let team = battle.player_team.clone();
    let started = battle
        .session
        .start_battle(&team, encounter)
        .and_then(|_| battle.session.set_auto_battle(true));
    match started {
        Ok(_) => info!("Starting {}", encounter.context.describe()),
        Err(e) => {
            warn!("Failed to start next floor: {}", e);
            finish(battle, headless_state, Some(Side::Opposing));
        }
    }
}

fn finish(battle: &mut ActiveBattle, headless_state: &mut HeadlessBattleState, winner: Option<Side>) {
    match winner {
        Some(Side::Player) => info!("Battle ended! Player team wins!"),
        Some(Side::Opposing) => info!("Battle ended! Opposing team wins!"),
        None => info!("Battle ended in a DRAW"),
    }

    let session = &battle.session;
    let metadata = BattleMetadata::from_state(session.state(), session.log(), session.random_seed());

    let log_path = match session.log().save_to_file(&metadata, headless_state.output_path.as_deref()) {
        Ok(filename) => {
            println!("Battle complete. Log saved to: {}", filename);
            Some(filename)
        }
        Err(e) => {
            eprintln!("Failed to save combat log: {}", e);
            None
        }
    };

    let rewards = battle
        .rewards
        .lock()
        .map(|r| r.total_earned)
        .unwrap_or_default();

    headless_state.result = Some(BattleReport {
        winner,
        turns: headless_state.turns_before_floor + session.state().turns_taken,
        floors_cleared: headless_state.floors_cleared,
        player_team: metadata.player_team.iter().map(CombatantResult::from).collect(),
        opposing_team: metadata.opposing_team.iter().map(CombatantResult::from).collect(),
        random_seed: headless_state.random_seed,
        rewards,
        log_path,
    });
    headless_state.battle_complete = true;
}

/// Exit the app when the battle is complete
fn headless_exit_on_complete(headless_state: Res<HeadlessBattleState>, mut exit: EventWriter<AppExit>) {
    if headless_state.battle_complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless battle with the given configuration
pub fn run_headless_battle(config: HeadlessBattleConfig) -> Result<BattleReport, String> {
    config.validate()?;
    let battle = prepare_battle(&config)?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if config.verbose {
        app.add_plugins(LogPlugin::default());
    }
    app.insert_resource(battle)
        .add_plugins(HeadlessPlugin { config });

    app.finish();
    app.cleanup();
    while !app.world().resource::<HeadlessBattleState>().battle_complete {
        app.update();
    }

    app.world_mut()
        .resource_mut::<HeadlessBattleState>()
        .result
        .take()
        .ok_or_else(|| "Battle finished without a result".to_string())
}
