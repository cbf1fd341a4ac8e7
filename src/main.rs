//! HeroSim - Turn-Based Battle Engine for an Idle Hero Collector
//!
//! Runs a headless battle and prints a summary. Without `--headless` a demo
//! team of three fights the stage given by `--stage`.

use std::process::ExitCode;

use herosim::cli::parse_args;
use herosim::combat::Side;
use herosim::headless::config::HeroEntry;
use herosim::headless::{run_headless_battle, BattleReport, HeadlessBattleConfig};

fn demo_config(stage: String) -> HeadlessBattleConfig {
    let hero = |class: &str, pet: Option<&str>| HeroEntry {
        class: class.to_string(),
        level: 3,
        rarity: "uncommon".to_string(),
        name: None,
        pet: pet.map(str::to_string),
        pet_level: 1,
    };
    HeadlessBattleConfig {
        team: vec![
            hero("warrior", Some("wolf")),
            hero("mage", None),
            hero("healer", Some("turtle")),
        ],
        stage: Some(stage),
        dungeon: None,
        player_level: 1,
        max_turns: 500,
        random_seed: None,
        output_path: None,
        data_path: None,
        verbose: false,
    }
}

fn print_summary(report: &BattleReport) {
    println!();
    match report.winner {
        Some(Side::Player) => println!("Result: VICTORY"),
        Some(Side::Opposing) => println!("Result: DEFEAT"),
        None => println!("Result: DRAW"),
    }
    println!("Turns: {}", report.turns);
    if report.floors_cleared > 0 {
        println!("Floors cleared: {}", report.floors_cleared);
    }
    if let Some(seed) = report.random_seed {
        println!("Seed: {}", seed);
    }
    println!(
        "Rewards: {} Gold, {} EXP, {} Gems",
        report.rewards.gold, report.rewards.exp, report.rewards.gems
    );

    for (title, team) in [("Heroes", &report.player_team), ("Enemies", &report.opposing_team)] {
        println!("{}:", title);
        for unit in team.iter() {
            println!(
                "  {:<20} {:<8} L{:<3} HP {:>6.0}/{:<6.0} dealt {:>7.0} taken {:>7.0}{}",
                unit.name,
                unit.class_id,
                unit.level,
                unit.final_health,
                unit.max_health,
                unit.damage_dealt,
                unit.damage_taken,
                if unit.survived { "" } else { "  (defeated)" }
            );
        }
    }
}

fn main() -> ExitCode {
    let args = parse_args();

    let mut config = match &args.headless {
        Some(path) => match HeadlessBattleConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => demo_config(args.stage.clone()),
    };

    // CLI flags override the config file
    if let Some(output) = &args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    config.verbose |= args.verbose;

    match run_headless_battle(config) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
