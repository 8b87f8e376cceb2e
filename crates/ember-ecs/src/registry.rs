use std::any::type_name;
use std::collections::HashMap;

use tracing::debug;

use crate::component::{Component, ComponentTypeId};
use crate::entity::EntityId;
use crate::error::EcsError;
use crate::pool::{ComponentPool, ComponentStorage};

/// Owns one [`ComponentPool`] per registered component type.
///
/// Pools are indexed by [`ComponentTypeId`] and created lazily. Every
/// operation is total: unknown types and absent entities read as `None`
/// or no-op. The registry does not touch entity masks; that is the job of
/// [`World`](crate::World).
pub struct ComponentRegistry {
    pools: Vec<Option<Box<dyn ComponentStorage>>>,
    by_name: HashMap<String, ComponentTypeId>,
    names: HashMap<ComponentTypeId, String>,
    pool_capacity: usize,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::with_pool_capacity(0)
    }

    /// New pools pre-allocate room for `pool_capacity` components.
    pub fn with_pool_capacity(pool_capacity: usize) -> Self {
        Self {
            pools: Vec::new(),
            by_name: HashMap::new(),
            names: HashMap::new(),
            pool_capacity,
        }
    }

    /// Create the pool for `T` if it does not exist yet.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        self.pool_or_insert::<T>();
        ComponentTypeId::of::<T>()
    }

    /// Register `T` and bind it to a stable name that survives process
    /// restarts, for use by serializers and tooling.
    ///
    /// Re-binding the same pair is a no-op. Binding a taken name to another
    /// type, or a second name to the same type, fails.
    pub fn register_named<T: Component>(&mut self, name: &str) -> Result<ComponentTypeId, EcsError> {
        let id = self.register::<T>();
        match (self.by_name.get(name), self.names.get(&id)) {
            (Some(bound), _) if *bound == id => return Ok(id),
            (Some(_), _) | (None, Some(_)) => {
                return Err(EcsError::DuplicateTypeName {
                    name: name.to_string(),
                    type_name: type_name::<T>(),
                })
            }
            (None, None) => {}
        }
        self.by_name.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        Ok(id)
    }

    /// Runtime id bound to a stable name.
    pub fn type_id_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Stable name bound to a runtime id.
    pub fn name_of(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.storage(ComponentTypeId::of::<T>()).is_some()
    }

    /// Store `value` for `entity`, registering `T` if needed.
    ///
    /// Runs [`Component::init`] before the value is stored and returns a
    /// reference to the stored instance. An existing value is overwritten.
    pub fn add<T: Component>(&mut self, entity: EntityId, mut value: T) -> &mut T {
        value.init(entity);
        self.pool_or_insert::<T>().insert(entity, value)
    }

    /// Remove and return `entity`'s `T`. `None` when `T` is unregistered or absent.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.pool_mut::<T>()?.remove(entity)
    }

    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.pool::<T>()?.get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.pool_mut::<T>()?.get_mut(entity)
    }

    pub fn contains<T: Component>(&self, entity: EntityId) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.contains(entity))
    }

    /// The pool for `T`, if registered.
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.storage(ComponentTypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentPool<T>>()
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        self.pools
            .get_mut(ComponentTypeId::of::<T>().index())?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
    }

    /// Purge `entity` from every pool. Returns how many components were dropped.
    pub fn entity_destroyed(&mut self, entity: EntityId) -> usize {
        self.pools
            .iter_mut()
            .flatten()
            .map(|pool| pool.entity_destroyed(entity))
            .filter(|removed| *removed)
            .count()
    }

    /// Run [`Component::update`] on every stored component.
    pub fn update_all(&mut self, dt: f32) {
        for pool in self.pools.iter_mut().flatten() {
            pool.update_all(dt);
        }
    }

    /// Number of registered component types.
    pub fn len(&self) -> usize {
        self.pools.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn storage(&self, id: ComponentTypeId) -> Option<&dyn ComponentStorage> {
        self.pools.get(id.index())?.as_deref()
    }

    fn pool_or_insert<T: Component>(&mut self) -> &mut ComponentPool<T> {
        let index = ComponentTypeId::of::<T>().index();
        if index >= self.pools.len() {
            self.pools.resize_with(index + 1, || None);
        }
        let capacity = self.pool_capacity;
        self.pools[index]
            .get_or_insert_with(|| {
                debug!("Registered component pool for {}", type_name::<T>());
                Box::new(ComponentPool::<T>::with_capacity(capacity))
            })
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
            .expect("component pool type mismatch")
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Debug, Clone, PartialEq)]
    struct Armor(i32);
    impl Component for Armor {}

    #[derive(Debug, Default)]
    struct Owned {
        owner: Option<EntityId>,
        ticks: u32,
    }
    impl Component for Owned {
        fn init(&mut self, entity: EntityId) {
            self.owner = Some(entity);
        }

        fn update(&mut self, _dt: f32) {
            self.ticks += 1;
        }
    }

    struct NeverAdded;
    impl Component for NeverAdded {}

    fn e(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn add_registers_lazily() {
        let mut registry = ComponentRegistry::new();
        assert!(!registry.is_registered::<Health>());
        registry.add(e(1), Health(10));
        assert!(registry.is_registered::<Health>());
        assert_eq!(registry.get::<Health>(e(1)), Some(&Health(10)));
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = ComponentRegistry::new();
        let a = registry.register::<Health>();
        registry.add(e(1), Health(1));
        let b = registry.register::<Health>();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get::<Health>(e(1)), Some(&Health(1)));
    }

    #[test]
    fn add_runs_init_and_returns_stored_value() {
        let mut registry = ComponentRegistry::new();
        let stored = registry.add(e(7), Owned::default());
        assert_eq!(stored.owner, Some(e(7)));
        stored.ticks = 5;
        assert_eq!(registry.get::<Owned>(e(7)).unwrap().ticks, 5);
    }

    #[test]
    fn unknown_types_soft_fail() {
        let mut registry = ComponentRegistry::new();
        assert_eq!(registry.get::<NeverAdded>(e(1)).map(|_| ()), None);
        assert!(registry.get_mut::<NeverAdded>(e(1)).is_none());
        assert!(registry.remove::<NeverAdded>(e(1)).is_none());
        assert!(!registry.contains::<NeverAdded>(e(1)));
        assert!(!registry.is_registered::<NeverAdded>());
    }

    #[test]
    fn remove_then_get_is_none() {
        let mut registry = ComponentRegistry::new();
        registry.add(e(1), Health(3));
        assert_eq!(registry.remove::<Health>(e(1)), Some(Health(3)));
        assert_eq!(registry.get::<Health>(e(1)), None);
        assert_eq!(registry.remove::<Health>(e(1)), None);
    }

    #[test]
    fn entity_destroyed_purges_all_pools() {
        let mut registry = ComponentRegistry::new();
        registry.add(e(1), Health(1));
        registry.add(e(1), Armor(2));
        registry.add(e(2), Armor(3));
        assert_eq!(registry.entity_destroyed(e(1)), 2);
        assert!(!registry.contains::<Health>(e(1)));
        assert!(!registry.contains::<Armor>(e(1)));
        assert_eq!(registry.get::<Armor>(e(2)), Some(&Armor(3)));
        assert_eq!(registry.entity_destroyed(e(1)), 0);
    }

    #[test]
    fn update_all_reaches_every_component() {
        let mut registry = ComponentRegistry::new();
        registry.add(e(1), Owned::default());
        registry.add(e(2), Owned::default());
        registry.update_all(0.1);
        registry.update_all(0.1);
        assert!(registry.pool::<Owned>().unwrap().iter().all(|(_, o)| o.ticks == 2));
    }

    #[test]
    fn stable_names() {
        let mut registry = ComponentRegistry::new();
        let id = registry.register_named::<Health>("health").unwrap();
        assert_eq!(registry.register_named::<Health>("health").unwrap(), id);
        assert_eq!(registry.type_id_by_name("health"), Some(id));
        assert_eq!(registry.name_of(id), Some("health"));

        assert!(matches!(
            registry.register_named::<Armor>("health"),
            Err(EcsError::DuplicateTypeName { .. })
        ));
        assert!(matches!(
            registry.register_named::<Health>("hp"),
            Err(EcsError::DuplicateTypeName { .. })
        ));
        assert_eq!(registry.type_id_by_name("hp"), None);
    }
}
