//! Authoritative simulation host: generates or loads a world, drives it
//! forward on a dedicated thread, and serves clients over TCP.

mod config;
mod error;
mod net;
mod sim;

use std::process::ExitCode;

use clap::Parser;
use config::{Cli, HostConfig};
use error::HostError;
use seedfall_ecs::world::{ComponentBundle, World};
use seedfall_procgen::terrain::{self, TerrainParams};
use seedfall_seed::RootSeed;
use seedfall_sim::bootstrap::{register_components, register_systems};
use seedfall_sim::components::TerrainGrid;
use seedfall_sim::pipeline::{TickConfig, TickLoop};
use tokio::sync::mpsc;
use tracing::{error, info};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = HostConfig::from_cli(&cli);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "server exiting");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(config: HostConfig) -> Result<(), HostError> {
    let tick_loop = build_tick_loop(&config)?;

    let (sim_tx, sim_rx) = mpsc::unbounded_channel();
    let sim_config = config.clone();
    std::thread::spawn(move || sim::run(sim_config, tick_loop, sim_rx));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");
    runtime.block_on(net::accept_loop(config.port, sim_tx))
}

fn build_tick_loop(config: &HostConfig) -> Result<TickLoop, HostError> {
    let mut world = World::new();
    register_components(&mut world);

    if let Some(path) = &config.load_path {
        let bytes = std::fs::read(path).map_err(HostError::ReadSave)?;
        let envelope = seedfall_sim::save::from_bytes(&bytes)?;
        let mut tick_loop = TickLoop::new(world, TickConfig { fixed_dt: 1.0 / config.tick_hz, headless: true });
        register_systems(&mut tick_loop);
        seedfall_sim::save::load(&mut tick_loop, &envelope)?;
        info!(path = %path.display(), "restored world from save");
        return Ok(tick_loop);
    }

    let root_seed = RootSeed::new(config.root_seed);
    let terrain_seed = root_seed.derive(&["terrain", "layer", "0"]);
    let (map, validation) = terrain::generate(terrain_seed, &TerrainParams::default())
        .map_err(|err| HostError::Generation(err.to_string()))?;
    info!(
        seed = config.root_seed,
        genre = %config.genre,
        rooms_checked = validation.rooms_checked,
        "generated terrain"
    );

    let mut bundle = ComponentBundle::new();
    bundle.add(world.registry(), TerrainGrid { map });
    world.spawn_bundle(bundle);

    let mut tick_loop = TickLoop::new(world, TickConfig { fixed_dt: 1.0 / config.tick_hz, headless: true });
    register_systems(&mut tick_loop);
    Ok(tick_loop)
}
