use std::any::type_name;

use tracing::{debug, info, warn};

use crate::command::CommandBuffer;
use crate::component::{Component, ComponentTypeId};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityId, EntityRegistry};
use crate::error::EcsError;
use crate::manager::{SystemHandle, SystemManager};
use crate::query::{ComponentSet, View};
use crate::registry::ComponentRegistry;
use crate::system::System;

/// The central ECS container. Owns the entity registry, the component
/// registry and the system manager, and forwards every structural change
/// between them as it happens.
///
/// Worlds are independent of each other; nothing is stored globally except
/// the component type-id counter.
pub struct World {
    entities: EntityRegistry,
    components: ComponentRegistry,
    systems: SystemManager,
    commands: CommandBuffer,
    config: WorldConfig,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityRegistry::new(),
            components: ComponentRegistry::with_pool_capacity(config.pool_capacity),
            systems: SystemManager::new(),
            commands: CommandBuffer::with_capacity(config.command_capacity),
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // ---- Entity management ----

    /// Create an entity with no components. The name is made unique by
    /// appending `_1`, `_2`, ... when taken.
    pub fn create_entity(&mut self, name: &str) -> EntityId {
        let entity = self.entities.create(name);
        debug!("Created entity {} '{}'", entity.id(), entity.name());
        self.systems.entity_created(entity);
        entity.id()
    }

    /// Destroy an entity, dropping its components and system memberships.
    /// Returns `false` if it did not exist.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        if !self.entities.contains(id) {
            return false;
        }
        // Downstream structures are purged while the record is still reachable.
        self.systems.entity_destroyed(id);
        let dropped = self.components.entity_destroyed(id);
        if let Some(entity) = self.entities.destroy(id) {
            debug!(
                "Destroyed entity {} '{}' ({dropped} components)",
                id,
                entity.name()
            );
        }
        true
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.get_by_name(name)
    }

    /// Rename an entity, returning the (possibly suffixed) name assigned.
    pub fn rename_entity(&mut self, id: EntityId, name: &str) -> Option<String> {
        self.entities.rename(id, name)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    // ---- Component management ----

    pub fn register_component<T: Component>(&mut self) -> ComponentTypeId {
        self.components.register::<T>()
    }

    /// Bind `T` to a name that stays valid across runs.
    pub fn register_component_named<T: Component>(
        &mut self,
        name: &str,
    ) -> Result<ComponentTypeId, EcsError> {
        self.components.register_named::<T>(name)
    }

    /// Attach `value` to an entity, replacing any existing `T`.
    ///
    /// Runs [`Component::init`], sets the entity's bit for `T` and
    /// re-evaluates its system memberships. Returns `None` only when the
    /// entity does not exist.
    pub fn add_component<T: Component>(&mut self, id: EntityId, value: T) -> Option<&mut T> {
        if !self.entities.contains(id) {
            warn!("Cannot add {} to unknown entity {id}", type_name::<T>());
            return None;
        }
        let stored = self.components.add(id, value);
        let entity = self
            .entities
            .set_component_bit(id, ComponentTypeId::of::<T>())?;
        debug!("Added {} to entity {id}", type_name::<T>());
        self.systems.entity_components_changed(entity);
        Some(stored)
    }

    /// Detach `T` from an entity. Returns `false` if it was not attached.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> bool {
        if self.components.remove::<T>(id).is_none() {
            return false;
        }
        if let Some(entity) = self
            .entities
            .clear_component_bit(id, ComponentTypeId::of::<T>())
        {
            debug!("Removed {} from entity {id}", type_name::<T>());
            self.systems.entity_components_changed(entity);
        }
        true
    }

    pub fn get_component<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.components.get::<T>(id)
    }

    pub fn get_component_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.components.get_mut::<T>(id)
    }

    pub fn has_component<T: Component>(&self, id: EntityId) -> bool {
        self.components.contains::<T>(id)
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Run [`Component::update`] on every stored component.
    pub fn update_components(&mut self, dt: f32) {
        self.components.update_all(dt);
    }

    // ---- Queries ----

    /// Snapshot of the entities holding every component in `Q`.
    ///
    /// # Example
    /// ```ignore
    /// world.view::<(Position, Velocity)>().each(|entity, (pos, vel)| {
    ///     // ...
    /// });
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> View<'_, Q> {
        View::new(&self.components)
    }

    // ---- Systems ----

    /// Register a system; see [`SystemManager::register`].
    pub fn register_system<S: System>(&mut self, system: S) -> Result<SystemHandle<S>, EcsError> {
        self.systems.register(system, &self.entities)
    }

    /// Shared handle to the registered `S`. Release its lock before the next
    /// [`update_systems`](Self::update_systems) or `S` sits the frame out.
    pub fn get_system<S: System>(&self) -> Option<SystemHandle<S>> {
        self.systems.get::<S>()
    }

    pub fn unregister_system<S: System>(&mut self) -> bool {
        self.systems.unregister::<S>()
    }

    pub fn set_system_active<S: System>(&mut self, active: bool) -> bool {
        self.systems.set_active::<S>(active)
    }

    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Run one frame: every active system in priority order, then every
    /// structural change they queued.
    pub fn update_systems(&mut self, dt: f32) {
        self.systems.update(
            dt,
            &self.entities,
            &mut self.components,
            &mut self.commands,
        );
        self.flush_commands();
    }

    // ---- Deferred commands ----

    /// Queue structural changes to apply at the next flush.
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Apply the commands queued so far. Returns how many ran.
    ///
    /// Commands queued while the batch runs wait for the next flush, so a
    /// command that re-queues itself runs once per frame.
    pub fn flush_commands(&mut self) -> usize {
        let batch = self.commands.take();
        let applied = batch.len();
        for command in batch {
            command(self);
        }
        applied
    }

    /// Shut down every system. Entities and components are kept.
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down world ({} entities, {} systems)",
            self.entities.len(),
            self.systems.len()
        );
        self.systems.shutdown();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
