use std::collections::HashMap;
use std::fmt;

use crate::component::ComponentTypeId;
use crate::mask::ComponentMask;

/// Opaque entity identity. Assigned in increasing order and never reused
/// within one [`EntityRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an id from its raw value (mainly for testing and tooling).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live entity: its identity, the mask of attached component types and its
/// unique display name.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    mask: ComponentMask,
    name: String,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn mask(&self) -> &ComponentMask {
        &self.mask
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has(&self, component: ComponentTypeId) -> bool {
        self.mask.contains(component)
    }
}

/// Base used when an entity is created or renamed with an empty name.
const DEFAULT_NAME: &str = "Entity";

/// Owns every live entity and the name index over them.
///
/// This is the only place an entity's component mask is mutated. The
/// registry itself does not notify anyone; [`World`](crate::World) forwards
/// each change to the system manager and component registry.
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    names: HashMap<String, EntityId>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            names: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create an entity with an empty mask. Name collisions are resolved by
    /// appending `_1`, `_2`, ... until the name is unique.
    pub fn create(&mut self, name: &str) -> &Entity {
        let id = EntityId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("entity id space exhausted");

        let name = self.unique_name(name);
        self.names.insert(name.clone(), id);
        self.entities.entry(id).or_insert(Entity {
            id,
            mask: ComponentMask::new(),
            name,
        })
    }

    /// Remove an entity and its name entry, returning the record.
    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        self.names.remove(&entity.name);
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Entity> {
        self.names.get(name).and_then(|id| self.entities.get(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Give an entity a new name, de-duplicated the same way as on creation.
    /// Returns the name actually assigned.
    pub fn rename(&mut self, id: EntityId, name: &str) -> Option<String> {
        let current = self.entities.get(&id)?.name.clone();
        if current == name {
            return Some(current);
        }
        self.names.remove(&current);
        let name = self.unique_name(name);
        self.names.insert(name.clone(), id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.name.clone_from(&name);
        }
        Some(name)
    }

    /// Set the bit for `component`. Returns the updated entity.
    pub fn set_component_bit(&mut self, id: EntityId, component: ComponentTypeId) -> Option<&Entity> {
        let entity = self.entities.get_mut(&id)?;
        entity.mask.set(component);
        Some(entity)
    }

    /// Clear the bit for `component`. Returns the updated entity.
    pub fn clear_component_bit(
        &mut self,
        id: EntityId,
        component: ComponentTypeId,
    ) -> Option<&Entity> {
        let entity = self.entities.get_mut(&id)?;
        entity.mask.clear(component);
        Some(entity)
    }

    /// Iterate over all live entities in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn unique_name(&self, requested: &str) -> String {
        let base = if requested.is_empty() {
            DEFAULT_NAME
        } else {
            requested
        };
        if !self.names.contains_key(base) {
            return base.to_string();
        }
        (1u64..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(registry: &EntityRegistry) {
        assert_eq!(registry.names.len(), registry.entities.len());
        for (name, id) in &registry.names {
            assert_eq!(registry.entities[id].name, *name);
        }
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let mut registry = EntityRegistry::new();
        let a = registry.create("a").id();
        let b = registry.create("b").id();
        assert!(b > a);
        assert!(registry.get(a).unwrap().mask().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut registry = EntityRegistry::new();
        let a = registry.create("a").id();
        registry.destroy(a);
        let b = registry.create("a").id();
        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
    }

    #[test]
    fn duplicate_names_get_suffixes() {
        let mut registry = EntityRegistry::new();
        let first = registry.create("Foo").id();
        let second = registry.create("Foo").id();
        let third = registry.create("Foo").id();
        assert_eq!(registry.get(second).unwrap().name(), "Foo_1");
        assert_eq!(registry.get(third).unwrap().name(), "Foo_2");
        assert_eq!(registry.get_by_name("Foo").unwrap().id(), first);
        assert_eq!(registry.get_by_name("Foo_1").unwrap().id(), second);
        assert_consistent(&registry);
    }

    #[test]
    fn suffix_skips_taken_names() {
        let mut registry = EntityRegistry::new();
        registry.create("Foo");
        registry.create("Foo_1");
        let id = registry.create("Foo").id();
        assert_eq!(registry.get(id).unwrap().name(), "Foo_2");
    }

    #[test]
    fn empty_name_uses_default() {
        let mut registry = EntityRegistry::new();
        let a = registry.create("").id();
        let b = registry.create("").id();
        assert_eq!(registry.get(a).unwrap().name(), "Entity");
        assert_eq!(registry.get(b).unwrap().name(), "Entity_1");
    }

    #[test]
    fn destroy_frees_name() {
        let mut registry = EntityRegistry::new();
        let id = registry.create("Foo").id();
        assert!(registry.destroy(id).is_some());
        assert!(registry.destroy(id).is_none());
        assert!(registry.get_by_name("Foo").is_none());
        let again = registry.create("Foo").id();
        assert_eq!(registry.get(again).unwrap().name(), "Foo");
        assert_consistent(&registry);
    }

    #[test]
    fn rename_keeps_index_in_sync() {
        let mut registry = EntityRegistry::new();
        let a = registry.create("A").id();
        registry.create("B");
        assert_eq!(registry.rename(a, "B").as_deref(), Some("B_1"));
        assert!(registry.get_by_name("A").is_none());
        assert_eq!(registry.get_by_name("B_1").unwrap().id(), a);
        assert_eq!(registry.rename(a, "B_1").as_deref(), Some("B_1"));
        assert!(registry.rename(EntityId::from_raw(999), "X").is_none());
        assert_consistent(&registry);
    }

    #[test]
    fn component_bits() {
        let mut registry = EntityRegistry::new();
        let id = registry.create("a").id();
        let component = ComponentTypeId::from_index(4);
        assert!(registry.set_component_bit(id, component).unwrap().has(component));
        assert!(!registry.clear_component_bit(id, component).unwrap().has(component));
        assert!(registry
            .set_component_bit(EntityId::from_raw(999), component)
            .is_none());
    }
}
