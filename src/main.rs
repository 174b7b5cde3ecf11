//! # Trove Demo Entry Point
//!
//! Generates a world, runs a batch of simulated treasure hunts against it and
//! prints a JSON summary of what was found.

use clap::Parser;
use log::{error, info, warn};
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use trove::{
    load_from_path, utils::create_rng, ActivityEvent, Attacker, ConfigHandle, Controller,
    DeathEvent, GridWorld, ItemFactory, ItemSpec, Position, Rarity, Recipient, RedeemOutcome,
    Terrain, TreasureConfig, TreasureCoordinator, TreasureHooks, TroveResult,
};

/// Command line arguments for the Trove demo.
#[derive(Parser, Debug)]
#[command(name = "trove")]
#[command(about = "Simulates treasure hunts on a procedurally generated world")]
#[command(version)]
struct Args {
    /// Random seed for world generation and the hunts
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of hunts to simulate
    #[arg(long, default_value_t = 10)]
    hunts: u32,

    /// World edge length in tiles
    #[arg(long, default_value_t = 256)]
    world_size: u32,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Make every trigger chance certain
    #[arg(long)]
    always: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Default, Serialize)]
struct HuntSummary {
    seed: u64,
    hunts: u32,
    markers: u32,
    chests: u32,
    items: usize,
    coins: u64,
    locked: u32,
    guardians: usize,
    failed_categories: usize,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args) {
        error!("Hunt simulation failed: {}", e);
        std::process::exit(1);
    }
}

/// Initializes env_logger, letting `RUST_LOG` override the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn run(args: &Args) -> TroveResult<()> {
    let seed = args.seed.unwrap_or(12345);
    info!("Starting Trove v{} with seed {}", trove::VERSION, seed);

    let base = if args.always {
        TreasureConfig::for_testing()
    } else {
        TreasureConfig::new()
    };
    let config = match &args.config {
        Some(path) => {
            let loaded = load_from_path(path, &base)?;
            for warning in &loaded.warnings {
                warn!("{}: {}", path.display(), warning);
            }
            loaded.config
        }
        None => base,
    };

    info!("Generating a {0}x{0} world", args.world_size);
    let world = GridWorld::generate(seed, args.world_size);
    let mut coordinator = TreasureCoordinator::new(world, ConfigHandle::new(config), seed);
    let mut rng = create_rng(seed.wrapping_add(1));
    let recipient = Recipient { kingdom: rng.gen_range(1..=4) };

    let mut summary = HuntSummary {
        seed,
        hunts: args.hunts,
        ..HuntSummary::default()
    };
    let backpack = coordinator
        .world_mut()
        .instantiate_item(&ItemSpec::new(189, 50.0, Rarity::None))?;

    for hunt in 0..args.hunts {
        let (width, height) = coordinator.world().world_size();
        let position = Position::new(
            rng.gen_range(0..width as i32),
            rng.gen_range(0..height as i32),
        );

        let marker = if hunt % 2 == 0 {
            coordinator.on_dig(&ActivityEvent {
                actor_position: position,
                knowledge: rng.gen_range(1.0..100.0),
                tool: None,
                actor_rarity: None,
                inventory: Some(backpack),
            })
        } else {
            coordinator.on_creature_death(&DeathEvent {
                victim: 11,
                position,
                unique: false,
                champion: rng.gen_bool(0.1),
                attackers: vec![Attacker {
                    controller: Controller::Player,
                    fighting_knowledge: rng.gen_range(1.0..100.0),
                }],
                remains: Some(backpack),
            })
        };
        let Some(mut marker) = marker else {
            continue;
        };
        summary.markers += 1;

        let reading = coordinator.read_marker(&mut marker, position);
        info!("Hunt {}: {}", hunt, reading.describe());
        if reading.destroyed {
            continue;
        }

        if let RedeemOutcome::Redeemed { chest, guards } =
            coordinator.redeem(&marker, marker.location, &recipient)
        {
            summary.guardians += guards.len();
            if let Some(chest) = chest {
                summary.chests += 1;
                summary.items += chest.contents.len();
                summary.coins += chest.report.money_total();
                summary.failed_categories += chest.report.failures().count();
                if chest.lock.is_some() {
                    summary.locked += 1;
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
