use std::any::Any;
use std::collections::HashMap;

use crate::component::Component;
use crate::entity::EntityId;

/// Type-erased component storage interface.
pub(crate) trait ComponentStorage: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Drop whatever this storage holds for `entity`. Returns `true` if something was removed.
    fn entity_destroyed(&mut self, entity: EntityId) -> bool;
    fn contains(&self, entity: EntityId) -> bool;
    fn len(&self) -> usize;
    /// Entities in dense order.
    fn entities(&self) -> &[EntityId];
    /// Run `Component::update` on every stored value.
    fn update_all(&mut self, dt: f32);
}

/// Packed storage for every live instance of one component type.
///
/// Values live contiguously in `dense` with no gaps. `entity_to_index` and
/// `index_to_entity` are mutual inverses: for every live entity `e`,
/// `index_to_entity[entity_to_index[e]] == e`. Insert, lookup and removal are
/// O(1) on average; removal swaps the last value into the hole, so iteration
/// order is not preserved.
pub struct ComponentPool<T> {
    dense: Vec<T>,
    entity_to_index: HashMap<EntityId, usize>,
    index_to_entity: Vec<EntityId>,
}

impl<T: Component> ComponentPool<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            entity_to_index: HashMap::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
        }
    }

    /// Insert or overwrite the value for `entity`.
    ///
    /// An existing entry is replaced in place and keeps its index.
    pub fn insert(&mut self, entity: EntityId, value: T) -> &mut T {
        if let Some(&index) = self.entity_to_index.get(&entity) {
            self.dense[index] = value;
            return &mut self.dense[index];
        }
        let index = self.dense.len();
        self.dense.push(value);
        self.index_to_entity.push(entity);
        self.entity_to_index.insert(entity, index);
        &mut self.dense[index]
    }

    /// Remove the value for `entity`, returning it. `None` when absent.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let index = self.entity_to_index.remove(&entity)?;
        let last = self.dense.len() - 1;
        if index != last {
            let moved = self.index_to_entity[last];
            self.index_to_entity[index] = moved;
            self.entity_to_index.insert(moved, index);
        }
        self.index_to_entity.pop();
        Some(self.dense.swap_remove(index))
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.entity_to_index
            .get(&entity)
            .map(|&index| &self.dense[index])
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entity_to_index
            .get(&entity)
            .map(|&index| &mut self.dense[index])
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    /// Dense index of `entity`'s value.
    pub fn index_of(&self, entity: EntityId) -> Option<usize> {
        self.entity_to_index.get(&entity).copied()
    }

    /// Entity whose value occupies dense slot `index`.
    pub fn entity_at(&self, index: usize) -> Option<EntityId> {
        self.index_to_entity.get(index).copied()
    }

    /// Iterate over all (entity, &component) pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.index_to_entity.iter().copied().zip(self.dense.iter())
    }

    /// Iterate over all (entity, &mut component) pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.index_to_entity
            .iter()
            .copied()
            .zip(self.dense.iter_mut())
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.index_to_entity
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStorage for ComponentPool<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn entity_destroyed(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        ComponentPool::contains(self, entity)
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn entities(&self) -> &[EntityId] {
        &self.index_to_entity
    }

    fn update_all(&mut self, dt: f32) {
        for value in &mut self.dense {
            value.update(dt);
        }
    }
}
