// Zerg mining simulation driver
// Runs the Overlord against generated zones and reports what it brought home

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::{thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zerg_mining::{
    Action, Dashboard, MapId, NullDashboard, Overlord, OverlordConfig, Simulation, TerminalDashboard,
    Zone,
};

/// Runs an Overlord and its drones against Perlin-noise deployment zones.
#[derive(Parser, Debug)]
#[command(name = "simulation", version, about)]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 300)]
    ticks: u64,

    /// Starting budget, overrides the config file
    #[arg(long)]
    budget: Option<u32>,

    /// Number of deployment zones
    #[arg(long, default_value_t = 2)]
    maps: u32,

    /// Seed for zones and exploration jitter, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 40)]
    width: usize,

    #[arg(long, default_value_t = 24)]
    height: usize,

    /// JSON file holding an OverlordConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw the maps in the terminal every tick
    #[arg(long)]
    render: bool,

    /// Pause between rendered ticks, in milliseconds
    #[arg(long, default_value_t = 80)]
    delay_ms: u64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    snapshot: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never tear through the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // === PHASE 1: CONFIGURATION ===
    let mut config = match &args.config {
        Some(path) => OverlordConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => OverlordConfig::default(),
    };
    if let Some(budget) = args.budget {
        config.budget = budget;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    info!(?config, maps = args.maps, ticks = args.ticks, "starting simulation");

    // === PHASE 2: ZONES AND FLEET ===
    let zones: BTreeMap<MapId, Zone> = (1..=args.maps)
        .map(|id| {
            let zone = Zone::generate(config.seed.wrapping_add(u64::from(id)), args.width, args.height);
            (MapId(id), zone)
        })
        .collect();
    let initial_minerals: u32 = zones.values().map(Zone::remaining_minerals).sum();

    let dashboard: Box<dyn Dashboard> = if args.render {
        Box::new(TerminalDashboard::new())
    } else {
        Box::new(NullDashboard)
    };
    let overlord = Overlord::with_dashboard(&config, dashboard).context("building the fleet")?;
    let mut simulation = Simulation::new(overlord, zones);

    // === PHASE 3: MAIN LOOP ===
    let mut orders = 0;
    for tick in 1..=args.ticks {
        let action = simulation
            .tick()
            .with_context(|| format!("simulation failed at tick {tick}"))?;
        if action != Action::Idle {
            orders += 1;
        }
        if args.render {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }

    // === PHASE 4: REPORT ===
    let overlord = simulation.overlord();
    let snapshot = overlord.snapshot();
    info!(
        ticks = args.ticks,
        orders,
        collected = overlord.collected_minerals(),
        initial_minerals,
        drones_left = snapshot.drones.len(),
        "simulation finished"
    );
    if args.snapshot {
        println!("{}", snapshot.to_json().context("serializing snapshot")?);
    }
    Ok(())
}
