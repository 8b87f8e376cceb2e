use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use parking_lot::RwLock;

use crate::entity::EntityId;
use crate::mask::MAX_COMPONENTS;

/// Data attached to entities.
///
/// Both hooks default to no-ops. `init` runs once when the value is stored
/// through [`ComponentRegistry::add`](crate::ComponentRegistry::add);
/// `update` runs from [`World::update_components`](crate::World::update_components).
pub trait Component: 'static + Send + Sync {
    fn init(&mut self, _entity: EntityId) {}

    fn update(&mut self, _dt: f32) {}
}

/// Runtime identifier of a component type, also its bit position in a
/// [`ComponentMask`](crate::ComponentMask).
///
/// Ids are handed out by a process-wide counter the first time a type is
/// referenced. They are only stable for the lifetime of the process; use
/// [`ComponentRegistry::register_named`](crate::ComponentRegistry::register_named)
/// when a persistent key is needed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u32);

static TYPE_IDS: LazyLock<RwLock<HashMap<TypeId, ComponentTypeId>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

impl ComponentTypeId {
    /// The id of `T`, assigning the next free one on first use.
    ///
    /// # Panics
    /// If more than [`MAX_COMPONENTS`] distinct component types are used.
    pub fn of<T: Component>() -> Self {
        let key = TypeId::of::<T>();
        let existing = TYPE_IDS.read().get(&key).copied();
        if let Some(id) = existing {
            return id;
        }

        let mut ids = TYPE_IDS.write();
        let next = ids.len();
        *ids.entry(key).or_insert_with(|| {
            assert!(
                next < MAX_COMPONENTS,
                "component type limit of {MAX_COMPONENTS} exceeded by {}",
                type_name::<T>()
            );
            ComponentTypeId(next as u32)
        })
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of this type's bit in a component mask.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
