//! Integration tests for roster building and progression
//!
//! These tests verify that:
//! - The built-in game data is complete and consistent
//! - Heroes and enemies are scaled by rarity, level and boss status
//! - Loadouts feed modified stats into a battle
//! - Campaign wins pay out through the ledger and unlock the next stage

use std::sync::{Arc, Mutex};
use std::time::Duration;

use herosim::catalog::GameCatalog;
use herosim::combat::combatant::{CombatantId, Side, StatBlock};
use herosim::combat::outcome::BattlePhase;
use herosim::combat::state::BattleContext;
use herosim::progression::campaign::stage_encounter;
use herosim::progression::ledger::{ResourceLedger, IDLE_CAP_MINUTES};
use herosim::progression::rewards::LedgerRewards;
use herosim::roster::ascension::AscensionTier;
use herosim::roster::modifiers::{Equipment, EquipmentSlot, Loadout, LoadoutModifiers};
use herosim::roster::rarity::{Rarity, RarityTable};
use herosim::roster::{build_encounter, build_hero, summon_hero, EnemySpec, Encounter, ScalingTier};
use herosim::{BattleError, BattleSession, GameRng};

fn catalog() -> GameCatalog {
    GameCatalog::builtin().unwrap()
}

fn common_tier(player_level: u32) -> ScalingTier {
    ScalingTier {
        player_level,
        level_bonus: 0,
        rarity_table: RarityTable::new(vec![(Rarity::Common, 1.0)]).unwrap(),
    }
}

fn scaled(class: &str) -> EnemySpec {
    EnemySpec::Scaled {
        class: class.to_string(),
        level_multiplier: 1.0,
    }
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_builtin_catalog_is_valid() {
    let catalog = catalog();
    assert!(catalog.validate().is_ok(), "{:?}", catalog.validate());
    assert_eq!(catalog.classes.len(), 5);
    assert_eq!(catalog.pets.len(), 6);
    for dungeon in catalog.dungeons.values() {
        assert_eq!(dungeon.floors.len(), 3);
        assert!(dungeon.floors.last().unwrap().boss_floor);
    }
}

#[test]
fn test_unlocked_pets_follow_player_level() {
    let catalog = catalog();
    assert!(catalog.unlocked_pets(4).is_empty());
    assert_eq!(catalog.unlocked_pets(5), vec!["wolf"]);
    assert_eq!(catalog.unlocked_pets(30).len(), 6);
}

// =============================================================================
// Hero and Enemy Scaling Tests
// =============================================================================

#[test]
fn test_rare_hero_stats() {
    let hero = build_hero(&catalog(), CombatantId(1), "Lyra", "warrior", 1, Rarity::Rare).unwrap();
    assert_eq!(hero.stats, StatBlock::new(225.0, 22.0, 15.0, 12.0));
    assert_eq!(hero.current_health, 225.0);
    assert_eq!(hero.abilities.len(), 2);
    assert_eq!(hero.side, Side::Player);
}

#[test]
fn test_rare_level_nine_warrior_hits_whole_stats() {
    // 150 x 1.5 x 1.8 = 405 and 10 x 2.7 = 27 exactly
    let hero = build_hero(&catalog(), CombatantId(1), "Lyra", "warrior", 9, Rarity::Rare).unwrap();
    assert_eq!(hero.stats.health, 405.0);
    assert_eq!(hero.stats.defense, 27.0);
    assert_eq!(hero.current_health, 405.0);
}

#[test]
fn test_common_level_thirty_three_attack() {
    // 15 x 4.2 = 63
    let hero = build_hero(&catalog(), CombatantId(1), "Lyra", "warrior", 33, Rarity::Common).unwrap();
    assert_eq!(hero.stats.attack, 63.0);
}

#[test]
fn test_level_zero_rejected() {
    let err = build_hero(&catalog(), CombatantId(1), "Lyra", "warrior", 0, Rarity::Common).unwrap_err();
    assert!(matches!(err, BattleError::InvalidArgument(_)));
}

#[test]
fn test_boss_floor_promotes_last_enemy() {
    let catalog = catalog();
    let encounter = Encounter::new(vec![scaled("archer"), scaled("warrior")], BattleContext::dungeon("easy", 2, true))
        .with_tier(common_tier(1))
        .with_boss(true);
    let mut rng = GameRng::from_seed(9);

    let enemies = build_encounter(&catalog, &encounter, &mut rng).unwrap();

    assert_eq!(enemies[0].id, CombatantId::enemy(0));
    assert_eq!(enemies[1].id, CombatantId::enemy(1));
    assert!(enemies.iter().all(|e| e.side == Side::Opposing));
    assert!(!enemies[0].name.starts_with("Boss "));
    assert!(enemies[1].name.starts_with("Boss "));
    // 150 x 1.5
    assert_eq!(enemies[1].current_health, 225.0);
    assert_eq!(enemies[1].max_health(), 225.0);
}

#[test]
fn test_scaled_enemy_needs_tier() {
    let encounter = Encounter::new(vec![scaled("warrior")], BattleContext::default());
    let err = build_encounter(&catalog(), &encounter, &mut GameRng::from_seed(1)).unwrap_err();
    assert!(matches!(err, BattleError::InvalidArgument(_)));
}

#[test]
fn test_scaled_enemy_level() {
    let encounter = Encounter::new(vec![scaled("mage")], BattleContext::default()).with_tier(ScalingTier {
        level_bonus: 2,
        ..common_tier(10)
    });
    let enemies = build_encounter(&catalog(), &encounter, &mut GameRng::from_seed(1)).unwrap();
    assert_eq!(enemies[0].level, 12);
}

#[test]
fn test_scaled_enemy_level_on_whole_product() {
    let tier = common_tier(90);
    // 90 x 1.3 = 117
    assert_eq!(tier.enemy_level(1.3), 117);
    let encounter = Encounter::new(
        vec![EnemySpec::Scaled {
            class: "warrior".to_string(),
            level_multiplier: 1.3,
        }],
        BattleContext::default(),
    )
    .with_tier(tier);
    let enemies = build_encounter(&catalog(), &encounter, &mut GameRng::from_seed(1)).unwrap();
    assert_eq!(enemies[0].level, 117);
}

#[test]
fn test_summon_is_seeded() {
    let catalog = catalog();
    let first = summon_hero(&catalog, CombatantId(1), &mut GameRng::from_seed(31)).unwrap();
    let second = summon_hero(&catalog, CombatantId(1), &mut GameRng::from_seed(31)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.level, 1);
    assert!(catalog.classes.contains_key(&first.class_id));
}

// =============================================================================
// Loadout Tests
// =============================================================================

#[test]
fn test_loadout_stats_used_in_battle() {
    let catalog = Arc::new(catalog());
    let hero = build_hero(&catalog, CombatantId(1), "Thorne", "warrior", 1, Rarity::Common).unwrap();

    let mut loadout = Loadout::new(hero.stats);
    loadout.ascension = AscensionTier::ElitePlus;
    loadout.equip(Equipment::new("Iron Sword", EquipmentSlot::Weapon, Rarity::Common, 1));
    let mut modifiers = LoadoutModifiers::default();
    modifiers.insert(hero.id, loadout);

    let mut session = BattleSession::new(Arc::clone(&catalog), GameRng::from_seed(4));
    session.set_stat_modifiers(Box::new(modifiers));
    let snapshot = session
        .start_battle(&[hero], &stage_encounter(&catalog, "1-1").unwrap())
        .unwrap();

    let unit = snapshot.combatant(CombatantId(1)).unwrap();
    // 150 x 1.6
    assert_eq!(unit.max_health(), 240.0);
    assert_eq!(unit.current_health, 240.0);
    // 15 x 1.6 = 24, plus a 7 attack weapon
    assert_eq!(unit.stats.attack, 31.0);
}

// =============================================================================
// Progression Tests
// =============================================================================

#[test]
fn test_campaign_win_pays_and_unlocks() {
    let catalog = Arc::new(catalog());
    let rewards = Arc::new(Mutex::new(LedgerRewards::new(Arc::clone(&catalog), GameRng::from_seed(2))));
    let team: Vec<_> = (1..=3)
        .map(|i| build_hero(&catalog, CombatantId(i), format!("Hero {}", i), "warrior", 50, Rarity::Legendary).unwrap())
        .collect();

    let mut session = BattleSession::new(Arc::clone(&catalog), GameRng::from_seed(8));
    session.set_reward_issuer(Box::new(Arc::clone(&rewards)));
    session
        .start_battle(&team, &stage_encounter(&catalog, "1-1").unwrap())
        .unwrap();
    let turn = session.set_auto_battle(true).unwrap();

    assert_eq!(turn.phase, BattlePhase::Won);
    let rewards = rewards.lock().unwrap();
    assert_eq!(rewards.ledger.gold, 100);
    assert_eq!(rewards.ledger.gems, 5);
    assert_eq!(rewards.campaign.current_stage, "1-2");
}

#[test]
fn test_idle_collection_levels_player() {
    let mut ledger = ResourceLedger::default();
    let earned = ledger.collect_idle(Duration::from_secs(90 * 60), 1).unwrap();

    // 15 gold and 7 exp per minute at level 1, chapter 1
    assert_eq!(earned.gold, 1350);
    assert_eq!(earned.exp, 630);
    // 630 exp: 100 to level 2, 200 to level 3, 300 to level 4
    assert_eq!(ledger.player_level, 4);
    assert_eq!(ledger.exp, 30);
}

#[test]
fn test_idle_collection_is_capped() {
    let ledger = ResourceLedger::default();
    let day = ledger.idle_rewards(IDLE_CAP_MINUTES, 1);
    assert_eq!(ledger.idle_rewards(IDLE_CAP_MINUTES * 3, 1), day);

    let mut ledger = ResourceLedger::default();
    assert!(ledger.collect_idle(Duration::from_secs(30), 1).is_err());
    assert_eq!(ledger.gold, 0);
}
