//! Command-line interface for HeroSim
//!
//! Runs a headless battle from a JSON config, or a short demo stage when no
//! config is given.

use clap::Parser;
use std::path::PathBuf;

/// Turn-based hero battle simulator
#[derive(Parser, Debug)]
#[command(name = "herosim")]
#[command(about = "Turn-based hero battle simulator")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the battle log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Unit steps before the battle is declared a draw (overrides the config)
    #[arg(long)]
    pub max_turns: Option<u32>,

    /// Random seed for a reproducible battle (overrides the config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Campaign stage for the demo battle
    #[arg(long, default_value = "1-1")]
    pub stage: String,

    /// Print every battle log line
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
