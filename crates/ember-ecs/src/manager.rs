use std::any::{Any, TypeId};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, trace, warn};

use crate::command::CommandBuffer;
use crate::entity::{Entity, EntityId, EntityRegistry};
use crate::error::EcsError;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;
use crate::system::{System, SystemContext};

/// Shared owner of a registered system.
///
/// The lock is not reentrant. A guard held across
/// [`World::update_systems`](crate::World::update_systems) makes the manager
/// skip that system for the frame; one held across `unregister` or
/// `shutdown` blocks the calling thread.
pub type SystemHandle<S> = Arc<Mutex<S>>;

/// Entity ids with O(1) insert, removal and membership test.
#[derive(Default)]
struct MemberList {
    ids: Vec<EntityId>,
    index: HashMap<EntityId, usize>,
}

impl MemberList {
    fn insert(&mut self, id: EntityId) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.index.insert(moved, slot);
        }
        true
    }

    fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    fn as_slice(&self) -> &[EntityId] {
        &self.ids
    }
}

struct SystemEntry {
    type_id: TypeId,
    name: String,
    priority: i32,
    active: bool,
    required: ComponentMask,
    members: MemberList,
    system: Arc<Mutex<dyn System>>,
    /// The same system as a `SystemHandle<S>`, for typed lookups.
    handle: Box<dyn Any + Send + Sync>,
}

impl SystemEntry {
    fn matches_requirements(&self, entity: &Entity) -> bool {
        entity.mask().is_superset_of(&self.required)
    }
}

/// Owns every registered system, keeps them ordered by descending priority
/// and keeps each system's member list in step with entity structure.
///
/// Membership is maintained incrementally: each structural change costs one
/// mask comparison per system, never a rescan of all entities.
#[derive(Default)]
pub struct SystemManager {
    entries: Vec<SystemEntry>,
}

impl SystemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `system`, run its `init` hook and seed its member list from
    /// the entities that already exist.
    ///
    /// One instance per type: registering a type again returns the handle of
    /// the existing instance and drops `system`. If `init` fails the error is
    /// logged and returned and the system never runs.
    pub fn register<S: System>(
        &mut self,
        mut system: S,
        entities: &EntityRegistry,
    ) -> Result<SystemHandle<S>, EcsError> {
        if let Some(existing) = self.get::<S>() {
            warn!("System '{}' is already registered", system.name());
            return Ok(existing);
        }

        let name = system.name().to_string();
        if let Err(source) = system.init() {
            error!("System '{name}' failed to initialize: {source}");
            return Err(EcsError::SystemInit { name, source });
        }

        let priority = system.priority();
        let required = *system.requirements().mask();

        let mut matching: Vec<EntityId> = entities
            .iter()
            .filter(|entity| entity.mask().is_superset_of(&required))
            .map(Entity::id)
            .collect();
        matching.sort_unstable();
        let mut members = MemberList::default();
        for id in matching {
            members.insert(id);
        }

        let handle: SystemHandle<S> = Arc::new(Mutex::new(system));
        let erased: Arc<Mutex<dyn System>> = handle.clone();
        info!(
            "Registered system '{name}' (priority {priority}, {} matching entities)",
            members.ids.len()
        );

        self.entries.push(SystemEntry {
            type_id: TypeId::of::<S>(),
            name,
            priority,
            active: true,
            required,
            members,
            system: erased,
            handle: Box::new(handle.clone()),
        });
        // Stable: equal priorities keep registration order.
        self.entries.sort_by_key(|entry| Reverse(entry.priority));
        Ok(handle)
    }

    /// Remove a system, calling its `shutdown` hook. Returns `false` if it
    /// was never registered.
    pub fn unregister<S: System>(&mut self) -> bool {
        let Some(position) = self.position::<S>() else {
            return false;
        };
        let entry = self.entries.remove(position);
        entry.system.lock().shutdown();
        info!("Unregistered system '{}'", entry.name);
        true
    }

    pub fn get<S: System>(&self) -> Option<SystemHandle<S>> {
        self.entry::<S>()?
            .handle
            .downcast_ref::<SystemHandle<S>>()
            .cloned()
    }

    pub fn contains<S: System>(&self) -> bool {
        self.position::<S>().is_some()
    }

    /// Enable or disable dispatch for `S`. Returns `false` if `S` is not registered.
    ///
    /// Inactive systems keep their member lists current.
    pub fn set_active<S: System>(&mut self, active: bool) -> bool {
        let Some(position) = self.position::<S>() else {
            return false;
        };
        self.entries[position].active = active;
        true
    }

    pub fn is_active<S: System>(&self) -> Option<bool> {
        self.entry::<S>().map(|entry| entry.active)
    }

    /// Entities currently matched by `S`.
    pub fn members<S: System>(&self) -> Option<&[EntityId]> {
        self.entry::<S>().map(|entry| entry.members.as_slice())
    }

    /// Registered system names in dispatch order.
    pub fn system_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every active system once, highest priority first.
    pub fn update(
        &mut self,
        dt: f32,
        entities: &EntityRegistry,
        components: &mut ComponentRegistry,
        commands: &mut CommandBuffer,
    ) {
        for entry in &mut self.entries {
            if !entry.active {
                continue;
            }
            trace!(
                "Updating system '{}' over {} entities",
                entry.name,
                entry.members.ids.len()
            );
            let Some(mut system) = entry.system.try_lock() else {
                warn!("System '{}' is locked elsewhere, skipping this frame", entry.name);
                continue;
            };
            let mut ctx =
                SystemContext::new(entities, components, entry.members.as_slice(), commands);
            system.update(&mut ctx, dt);
        }
    }

    /// A new entity exists; add it to every system it already satisfies.
    pub fn entity_created(&mut self, entity: &Entity) {
        for entry in &mut self.entries {
            if entry.matches_requirements(entity) {
                entry.members.insert(entity.id());
            }
        }
    }

    /// An entity is going away; drop it from every member list.
    pub fn entity_destroyed(&mut self, id: EntityId) {
        for entry in &mut self.entries {
            entry.members.remove(id);
        }
    }

    /// An entity's mask changed; re-evaluate it against every system.
    pub fn entity_components_changed(&mut self, entity: &Entity) {
        let id = entity.id();
        for entry in &mut self.entries {
            let matches = entry.matches_requirements(entity);
            let present = entry.members.contains(id);
            if matches && !present {
                entry.members.insert(id);
            } else if !matches && present {
                entry.members.remove(id);
            }
        }
    }

    /// Shut down and drop every system in dispatch order.
    pub fn shutdown(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        for entry in self.entries.drain(..) {
            entry.system.lock().shutdown();
        }
        info!("All systems shut down");
    }

    fn position<S: System>(&self) -> Option<usize> {
        let type_id = TypeId::of::<S>();
        self.entries
            .iter()
            .position(|entry| entry.type_id == type_id)
    }

    fn entry<S: System>(&self) -> Option<&SystemEntry> {
        self.position::<S>().map(|position| &self.entries[position])
    }
}

impl Drop for SystemManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentTypeId};
    use crate::error::InitError;
    use crate::system::Requirements;

    struct Position;
    impl Component for Position {}

    struct Velocity;
    impl Component for Velocity {}

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        label: &'static str,
        priority: i32,
        log: Log,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            self.label
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn requirements(&self) -> Requirements {
            Requirements::of::<(Position, Velocity)>()
        }

        fn update(&mut self, _ctx: &mut SystemContext<'_>, _dt: f32) {
            self.log.lock().push(self.label.to_string());
        }

        fn shutdown(&mut self) {
            self.log.lock().push(format!("{}:shutdown", self.label));
        }
    }

    struct Low(Recorder);
    struct High(Recorder);

    macro_rules! forward_system {
        ($ty:ident) => {
            impl System for $ty {
                fn name(&self) -> &str {
                    self.0.name()
                }
                fn priority(&self) -> i32 {
                    self.0.priority()
                }
                fn requirements(&self) -> Requirements {
                    self.0.requirements()
                }
                fn update(&mut self, ctx: &mut SystemContext<'_>, dt: f32) {
                    self.0.update(ctx, dt)
                }
                fn shutdown(&mut self) {
                    self.0.shutdown()
                }
            }
        };
    }
    forward_system!(Low);
    forward_system!(High);

    struct Broken;
    impl System for Broken {
        fn requirements(&self) -> Requirements {
            Requirements::new()
        }

        fn init(&mut self) -> Result<(), InitError> {
            Err(InitError::new("missing device"))
        }
    }

    fn recorder(label: &'static str, priority: i32, log: &Log) -> Recorder {
        Recorder {
            label,
            priority,
            log: log.clone(),
        }
    }

    fn run(manager: &mut SystemManager, entities: &EntityRegistry) {
        let mut components = ComponentRegistry::new();
        let mut commands = CommandBuffer::new();
        manager.update(0.1, entities, &mut components, &mut commands);
    }

    #[test]
    fn member_list_swap_removes() {
        let mut list = MemberList::default();
        let ids: Vec<_> = (1..=4).map(EntityId::from_raw).collect();
        for id in &ids {
            assert!(list.insert(*id));
        }
        assert!(!list.insert(ids[0]));
        assert!(list.remove(ids[0]));
        assert!(!list.remove(ids[0]));
        assert_eq!(list.as_slice().len(), 3);
        for (slot, id) in list.as_slice().iter().enumerate() {
            assert_eq!(list.index[id], slot);
        }
        assert!(list.contains(ids[3]));
    }

    #[test]
    fn higher_priority_runs_first() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 50, &log)), &entities).unwrap();
        manager.register(High(recorder("high", 100, &log)), &entities).unwrap();

        assert_eq!(manager.system_names(), vec!["high", "low"]);
        run(&mut manager, &entities);
        assert_eq!(*log.lock(), vec!["high", "low"]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("first", 0, &log)), &entities).unwrap();
        manager.register(High(recorder("second", 0, &log)), &entities).unwrap();
        assert_eq!(manager.system_names(), vec!["first", "second"]);
    }

    #[test]
    fn registration_is_idempotent_by_type() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        let first = manager.register(Low(recorder("a", 1, &log)), &entities).unwrap();
        let second = manager.register(Low(recorder("b", 2, &log)), &entities).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.len(), 1);
        assert_eq!(second.lock().0.label, "a");
    }

    #[test]
    fn failed_init_is_not_registered() {
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        let result = manager.register(Broken, &entities);
        assert!(matches!(result, Err(EcsError::SystemInit { .. })));
        assert!(manager.is_empty());
        assert!(manager.get::<Broken>().is_none());
    }

    #[test]
    fn locked_systems_are_skipped_not_blocked() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 0, &log)), &entities).unwrap();
        let high = manager.register(High(recorder("high", 9, &log)), &entities).unwrap();

        let guard = high.lock();
        run(&mut manager, &entities);
        drop(guard);
        assert_eq!(*log.lock(), vec!["low"]);

        run(&mut manager, &entities);
        assert_eq!(*log.lock(), vec!["low", "high", "low"]);
    }

    #[test]
    fn inactive_systems_are_skipped() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 0, &log)), &entities).unwrap();
        assert!(manager.set_active::<Low>(false));
        assert_eq!(manager.is_active::<Low>(), Some(false));
        assert!(!manager.set_active::<High>(false));
        run(&mut manager, &entities);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn membership_follows_structure() {
        let log: Log = Arc::default();
        let mut entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 0, &log)), &entities).unwrap();

        let id = entities.create("mover").id();
        manager.entity_created(entities.get(id).unwrap());
        assert_eq!(manager.members::<Low>(), Some(&[][..]));

        let entity = entities
            .set_component_bit(id, ComponentTypeId::of::<Position>())
            .unwrap();
        manager.entity_components_changed(entity);
        assert!(manager.members::<Low>().unwrap().is_empty());

        let entity = entities
            .set_component_bit(id, ComponentTypeId::of::<Velocity>())
            .unwrap();
        manager.entity_components_changed(entity);
        assert_eq!(manager.members::<Low>(), Some(&[id][..]));

        let entity = entities
            .clear_component_bit(id, ComponentTypeId::of::<Velocity>())
            .unwrap();
        manager.entity_components_changed(entity);
        assert!(manager.members::<Low>().unwrap().is_empty());

        let entity = entities
            .set_component_bit(id, ComponentTypeId::of::<Velocity>())
            .unwrap();
        manager.entity_components_changed(entity);
        manager.entity_destroyed(id);
        manager.entity_destroyed(id);
        assert!(manager.members::<Low>().unwrap().is_empty());
    }

    #[test]
    fn registration_seeds_existing_entities() {
        let log: Log = Arc::default();
        let mut entities = EntityRegistry::new();
        let id = entities.create("ready").id();
        entities.set_component_bit(id, ComponentTypeId::of::<Position>());
        entities.set_component_bit(id, ComponentTypeId::of::<Velocity>());
        entities.create("bare");

        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 0, &log)), &entities).unwrap();
        assert_eq!(manager.members::<Low>(), Some(&[id][..]));
    }

    #[test]
    fn unregister_and_shutdown_call_hooks() {
        let log: Log = Arc::default();
        let entities = EntityRegistry::new();
        let mut manager = SystemManager::new();
        manager.register(Low(recorder("low", 0, &log)), &entities).unwrap();
        manager.register(High(recorder("high", 9, &log)), &entities).unwrap();

        assert!(manager.unregister::<Low>());
        assert!(!manager.unregister::<Low>());
        assert_eq!(*log.lock(), vec!["low:shutdown"]);

        drop(manager);
        assert_eq!(*log.lock(), vec!["low:shutdown", "high:shutdown"]);
    }
}
