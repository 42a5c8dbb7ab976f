//! Headless creature simulation.
//!
//! Loads content, populates a sandbox world around one player, tames a pet
//! for them and lets the world run for a number of ticks, logging every
//! creature event. With `--save-dir` the surviving creatures are written to
//! disk at the end and `--resume` loads them back on the next run.
//!
//! ```bash
//! RUST_LOG=runtime=debug cargo run -p creature-sim -- --ticks 400 --seed 7
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use creature_content::ContentFactory;
use creature_core::{EntityId, Location, MapId, Point3D, SandboxEnv, SandboxMobile, SkillName};
use creature_runtime::{
    CreatureRepository, Event, FileCreatureRepository, InMemoryCreatureRepo, Runtime,
    RuntimeConfig, RuntimeHandle, Topic,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

const PLAYER: EntityId = EntityId(1);
const BARD: EntityId = EntityId(2);

/// Wild population placed around the player, as offsets from their position.
const POPULATION: &[(&str, i32, i32)] = &[
    ("grey_wolf", 6, 2),
    ("grey_wolf", 7, 3),
    ("mongbat", -5, 4),
    ("orc_archer", 9, -6),
    ("wandering_healer", -3, -3),
    ("provisioner", 0, -8),
];

/// Run the creature world without a client attached
#[derive(Parser, Debug)]
#[command(name = "creature-sim", version, about, long_about = None)]
struct Cli {
    /// Content directory holding species.ron, food.ron and config.toml
    #[arg(long, env = "CREATURE_DATA_DIR", value_name = "DIR")]
    data: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, env = "SIM_TICKS", default_value_t = 240)]
    ticks: u64,

    /// Game time per tick in milliseconds
    #[arg(long, env = "SIM_TICK_MS", default_value_t = 250)]
    tick_ms: u64,

    /// Seed for reproducible runs
    #[arg(long, env = "SIM_SEED")]
    seed: Option<u64>,

    /// Persist creatures to this directory when the run ends
    #[arg(long, env = "SIM_SAVE_DIR", value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Load creatures from `--save-dir` instead of spawning a fresh population
    #[arg(long, requires = "save_dir")]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let factory = match &cli.data {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    let bundle = factory
        .load_all()
        .with_context(|| format!("loading content from {}", factory.data_dir().display()))?;
    info!(species = bundle.species.len(), data = %factory.data_dir().display(), "Content loaded");

    let repository: Arc<dyn CreatureRepository> = match &cli.save_dir {
        Some(dir) => Arc::new(FileCreatureRepository::new(dir)?),
        None => Arc::new(InMemoryCreatureRepo::new()),
    };

    let config = RuntimeConfig {
        tick: std::time::Duration::from_millis(cli.tick_ms.max(1)),
        rng_seed: cli.seed,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder()
        .config(config)
        .content(bundle)
        .repository(repository)
        .build(sandbox())?;
    let handle = runtime.handle();
    let logger = tokio::spawn(log_creature_events(handle.subscribe(Topic::Creature)));

    if cli.resume {
        let summary = handle.load().await?;
        info!(
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            "Resumed from save"
        );
    } else {
        populate(&handle).await?;
    }

    let reports = runtime.run_for(cli.ticks).await?;
    let thinks: usize = reports.iter().map(|r| r.thinks).sum();
    let removed: usize = reports.iter().map(|r| r.removed.len()).sum();
    let survivors = handle.list_creatures().await?;
    info!(
        ticks = reports.len(),
        thinks,
        removed,
        survivors = survivors.len(),
        "Simulation finished"
    );

    if cli.save_dir.is_some() {
        let saved = handle.save().await?;
        info!(saved, "Creatures saved");
    }

    drop(handle);
    runtime.shutdown().await?;
    if let Err(err) = logger.await {
        warn!(error = %err, "Event logger ended abnormally");
    }
    Ok(())
}

fn at(x: i32, y: i32) -> Location {
    Location::new(MapId::TRAMMEL, Point3D::new(x, y, 0))
}

fn sandbox() -> SandboxEnv {
    let mut env = SandboxEnv::new();
    env.insert(
        SandboxMobile::player(PLAYER, at(100, 100))
            .with_skill(SkillName::AnimalTaming, 1000)
            .with_followers(0, 5),
    );
    env.insert(SandboxMobile::player(BARD, at(96, 96)));
    env
}

async fn populate(handle: &RuntimeHandle) -> Result<()> {
    let mut spawned = Vec::with_capacity(POPULATION.len());
    for &(species, dx, dy) in POPULATION {
        spawned.push(handle.spawn(species, at(100 + dx, 100 + dy)).await?);
    }

    // Set the first wolf on the orc archer.
    let provoked = handle.provoke(spawned[0], spawned[3], BARD, true).await?;
    info!(bard = %BARD, provoked, "Bard played");

    let horse = handle.spawn("horse", at(101, 101)).await?;
    handle.tame(horse, PLAYER).await?;
    for (creature, outcome) in handle.speak(PLAYER, "all follow me").await? {
        info!(%creature, ?outcome, "Pet answered");
    }
    Ok(())
}

async fn log_creature_events(mut rx: broadcast::Receiver<Event>) {
    loop {
        match rx.recv().await {
            Ok(Event::Creature(event)) => info!(?event, "Creature event"),
            Ok(Event::World(_)) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event logger fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
