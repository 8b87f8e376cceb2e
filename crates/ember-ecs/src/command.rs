use std::fmt;

use crate::component::Component;
use crate::entity::EntityId;
use crate::world::World;

type Command = Box<dyn FnOnce(&mut World) + Send>;

/// Structural changes queued while systems run.
///
/// Applied in FIFO order by [`World::flush_commands`], which
/// [`World::update_systems`] calls once every system has finished.
#[derive(Default)]
pub struct CommandBuffer {
    queue: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Vec::with_capacity(capacity),
        }
    }

    /// Queue an arbitrary change against the world.
    pub fn push<F>(&mut self, command: F)
    where
        F: FnOnce(&mut World) + Send + 'static,
    {
        self.queue.push(Box::new(command));
    }

    pub fn create_entity(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.push(move |world| {
            world.create_entity(&name);
        });
    }

    /// Create an entity and hand its id to `setup`, typically to attach components.
    pub fn create_entity_with<F>(&mut self, name: impl Into<String>, setup: F)
    where
        F: FnOnce(&mut World, EntityId) + Send + 'static,
    {
        let name = name.into();
        self.push(move |world| {
            let id = world.create_entity(&name);
            setup(world, id);
        });
    }

    pub fn destroy_entity(&mut self, id: EntityId) {
        self.push(move |world| {
            world.destroy_entity(id);
        });
    }

    pub fn add_component<T: Component>(&mut self, id: EntityId, value: T) {
        self.push(move |world| {
            world.add_component(id, value);
        });
    }

    pub fn remove_component<T: Component>(&mut self, id: EntityId) {
        self.push(move |world| {
            world.remove_component::<T>(id);
        });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("queued", &self.queue.len())
            .finish()
    }
}
