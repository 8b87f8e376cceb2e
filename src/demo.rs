//! Built-in demo scene: a player plus a handful of short-lived walkers,
//! moved by a movement system and culled by an expiry system.

use ember_core::{GameTime, Vec3};
use ember_ecs::{Component, EntityId, Requirements, System, SystemContext, World};
use tracing::{debug, info};

use crate::settings::DemoSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {}

/// Seconds left before the owning entity is culled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Component for Lifetime {
    fn update(&mut self, dt: f32) {
        self.remaining -= dt;
    }
}

/// Integrates velocity into position.
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn requirements(&self) -> Requirements {
        Requirements::of::<(Position, Velocity)>()
    }

    fn process_entity(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId, dt: f32) {
        let Some(Velocity(velocity)) = ctx.get::<Velocity>(entity).copied() else {
            return;
        };
        if let Some(Position(position)) = ctx.get_mut::<Position>(entity) {
            *position += velocity * dt;
        }
    }
}

/// Destroys entities whose lifetime ran out.
#[derive(Default)]
pub struct ExpirySystem {
    pub expired: usize,
}

impl System for ExpirySystem {
    fn name(&self) -> &str {
        "expiry"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn requirements(&self) -> Requirements {
        Requirements::new().with::<Lifetime>()
    }

    fn process_entity(&mut self, ctx: &mut SystemContext<'_>, entity: EntityId, _dt: f32) {
        if ctx
            .get::<Lifetime>(entity)
            .is_some_and(|lifetime| lifetime.remaining <= 0.0)
        {
            debug!("Entity {entity} expired");
            self.expired += 1;
            ctx.commands().destroy_entity(entity);
        }
    }

    fn shutdown(&mut self) {
        info!("Expiry system culled {} entities", self.expired);
    }
}

/// Create the player and walkers and register the demo systems.
pub fn populate(world: &mut World, settings: &DemoSettings) -> anyhow::Result<EntityId> {
    let player = world.create_entity("Player");
    world.add_component(player, Position(Vec3::ZERO));
    world.add_component(player, Velocity(Vec3::X));

    for i in 0..settings.walkers {
        let walker = world.create_entity("Walker");
        let heading = i as f32 / settings.walkers.max(1) as f32 * std::f32::consts::TAU;
        world.add_component(walker, Position(Vec3::ZERO));
        world.add_component(walker, Velocity(Vec3::new(heading.cos(), 0.0, heading.sin())));
        world.add_component(
            walker,
            Lifetime {
                remaining: 0.25 * (i + 1) as f32,
            },
        );
    }

    world.register_system(MovementSystem)?;
    world.register_system(ExpirySystem::default())?;
    Ok(player)
}

/// Drive `frames` frames through the world.
///
/// Component hooks tick once per frame. Systems run once per due fixed step,
/// or once per frame with the frame delta when fixed stepping is off.
pub fn run(world: &mut World, time: &mut GameTime, settings: &DemoSettings) {
    for _ in 0..settings.frames {
        time.advance(settings.frame_delta);
        world.update_components(time.delta_time);
        if time.uses_fixed_steps() {
            for _ in 0..time.fixed_steps() {
                world.update_systems(time.config.fixed_timestep);
            }
        } else {
            world.update_systems(time.delta_time);
        }
    }
    info!(
        "Simulated {} frames ({:.2}s), {} entities alive",
        time.frame_count,
        time.total_time,
        world.entity_count()
    );
}
