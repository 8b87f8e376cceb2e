//! Ember ECS - Entity Component System
//!
//! Entities carry a fixed-size mask of attached component types. Components
//! live in dense per-type pools with swap-remove deletion. Systems declare the
//! components they need and are handed exactly the matching entities each
//! frame; membership is updated incrementally on every structural change.

mod command;
mod component;
mod config;
mod entity;
mod error;
mod manager;
mod mask;
mod pool;
mod query;
mod registry;
mod system;
mod world;

pub use command::CommandBuffer;
pub use component::{Component, ComponentTypeId};
pub use config::WorldConfig;
pub use entity::{Entity, EntityId, EntityRegistry};
pub use error::{EcsError, InitError};
pub use manager::{SystemHandle, SystemManager};
pub use mask::{ComponentMask, MAX_COMPONENTS};
pub use pool::ComponentPool;
pub use query::{ComponentSet, View};
pub use registry::ComponentRegistry;
pub use system::{Requirements, System, SystemContext};
pub use world::World;
