use std::any::type_name;

use crate::command::CommandBuffer;
use crate::component::{Component, ComponentTypeId};
use crate::entity::{Entity, EntityId, EntityRegistry};
use crate::error::InitError;
use crate::mask::ComponentMask;
use crate::query::{ComponentSet, View};
use crate::registry::ComponentRegistry;

/// A unit of per-frame behavior, dispatched by the
/// [`SystemManager`](crate::SystemManager) against exactly the entities whose
/// component mask covers [`System::requirements`].
///
/// `requirements` and `priority` are read once, at registration.
pub trait System: Send + 'static {
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Higher values run earlier within a frame.
    fn priority(&self) -> i32 {
        0
    }

    /// Component types an entity must hold to be processed by this system.
    fn requirements(&self) -> Requirements;

    /// Called once at registration. An error aborts the registration.
    fn init(&mut self) -> Result<(), InitError> {
        Ok(())
    }

    /// Called once per frame while the system is active. The default walks
    /// the member list and calls [`System::process_entity`] for each entry.
    fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
        for &entity in ctx.members() {
            self.process_entity(ctx, entity, dt);
        }
    }

    fn process_entity(&mut self, _ctx: &mut SystemContext<'_>, _entity: EntityId, _dt: f32) {}

    /// Called when the system is unregistered or the world shuts down.
    fn shutdown(&mut self) {}
}

/// The set of component types a system requires, folded into a mask.
///
/// ```ignore
/// Requirements::new().with::<Position>().with::<Velocity>();
/// Requirements::of::<(Position, Velocity)>();
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirements {
    mask: ComponentMask,
}

impl Requirements {
    /// No requirements: every entity matches.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<Q: ComponentSet>() -> Self {
        Self { mask: Q::mask() }
    }

    pub fn with<T: Component>(mut self) -> Self {
        self.mask.set(ComponentTypeId::of::<T>());
        self
    }

    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        entity.mask().is_superset_of(&self.mask)
    }
}

/// What a system can reach while it runs.
///
/// Component data can be read and written in place. Structural changes
/// (creating or destroying entities, adding or removing components) go
/// through [`SystemContext::commands`] and are applied after the frame's
/// last system has run, so member lists never change mid-iteration.
pub struct SystemContext<'a> {
    entities: &'a EntityRegistry,
    components: &'a mut ComponentRegistry,
    members: &'a [EntityId],
    commands: &'a mut CommandBuffer,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(
        entities: &'a EntityRegistry,
        components: &'a mut ComponentRegistry,
        members: &'a [EntityId],
        commands: &'a mut CommandBuffer,
    ) -> Self {
        Self {
            entities,
            components,
            members,
            commands,
        }
    }

    /// Entities currently matching the running system.
    pub fn members(&self) -> &'a [EntityId] {
        self.members
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.get_by_name(name)
    }

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.components.get::<T>(id)
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.components.get_mut::<T>(id)
    }

    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.components.contains::<T>(id)
    }

    /// Ad-hoc multi-component snapshot over the whole world.
    pub fn view<Q: ComponentSet>(&self) -> View<'_, Q> {
        View::new(&*self.components)
    }

    /// Queue structural changes for the end of the frame.
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut *self.commands
    }
}
