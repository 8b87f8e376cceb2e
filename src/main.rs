//! Ember - demo host for the Ember ECS runtime
//!
//! Loads settings, builds a world, runs the demo scene for a fixed number of
//! frames and reports where the player ended up.

mod demo;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use ember_core::GameTime;
use ember_ecs::World;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::demo::Position;
use crate::settings::Settings;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Ember runtime...");

    let settings = Settings::load(std::env::args_os().nth(1).map(PathBuf::from));
    let mut world = World::with_config(settings.world.clone());
    let mut time = GameTime::new(settings.time.clone());

    let player = demo::populate(&mut world, &settings.demo).context("Failed to build demo scene")?;
    info!(
        "Systems in dispatch order: {}",
        world.systems().system_names().join(", ")
    );

    demo::run(&mut world, &mut time, &settings.demo);

    if let Some(Position(position)) = world.get_component::<Position>(player) {
        info!("Player finished at {position}");
    }

    world.shutdown();
    Ok(())
}
