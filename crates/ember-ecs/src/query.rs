use std::marker::PhantomData;

use crate::component::{Component, ComponentTypeId};
use crate::entity::EntityId;
use crate::mask::ComponentMask;
use crate::registry::ComponentRegistry;

/// A tuple of component types, used to declare system requirements and to
/// build [`View`]s.
pub trait ComponentSet: 'static {
    /// Shared references to one entity's components, in tuple order.
    type Refs<'w>;

    /// Type ids of every member, in tuple order.
    fn type_ids() -> Vec<ComponentTypeId>;

    fn mask() -> ComponentMask {
        Self::type_ids().into_iter().collect()
    }

    /// Borrow all members for `entity`. `None` if any is missing.
    fn fetch(components: &ComponentRegistry, entity: EntityId) -> Option<Self::Refs<'_>>;
}

macro_rules! impl_component_set_tuple {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Refs<'w> = ($(&'w $name,)+);

            fn type_ids() -> Vec<ComponentTypeId> {
                vec![$(ComponentTypeId::of::<$name>()),+]
            }

            fn fetch(components: &ComponentRegistry, entity: EntityId) -> Option<Self::Refs<'_>> {
                Some(($(components.get::<$name>(entity)?,)+))
            }
        }
    };
}

impl_component_set_tuple!(A);
impl_component_set_tuple!(A, B);
impl_component_set_tuple!(A, B, C);
impl_component_set_tuple!(A, B, C, D);
impl_component_set_tuple!(A, B, C, D, E);
impl_component_set_tuple!(A, B, C, D, E, F);
impl_component_set_tuple!(A, B, C, D, E, F, G);
impl_component_set_tuple!(A, B, C, D, E, F, G, H);

/// Snapshot of the entities holding every component in `Q`.
///
/// Matching runs once, in [`View::new`], by walking the smallest of the
/// involved pools and probing the others. The view does not refresh; it is
/// meant for tooling and one-off queries; per-frame work belongs in a
/// [`System`](crate::System).
pub struct View<'w, Q: ComponentSet> {
    components: &'w ComponentRegistry,
    entities: Vec<EntityId>,
    _marker: PhantomData<fn() -> Q>,
}

impl<'w, Q: ComponentSet> View<'w, Q> {
    pub fn new(components: &'w ComponentRegistry) -> Self {
        Self {
            components,
            entities: Self::collect_matches(components),
            _marker: PhantomData,
        }
    }

    fn collect_matches(components: &ComponentRegistry) -> Vec<EntityId> {
        let mut storages = Vec::new();
        for id in Q::type_ids() {
            match components.storage(id) {
                Some(storage) => storages.push(storage),
                // A required type has no pool, so nothing can match.
                None => return Vec::new(),
            }
        }

        let Some(smallest) = storages.iter().min_by_key(|storage| storage.len()) else {
            return Vec::new();
        };
        smallest
            .entities()
            .iter()
            .copied()
            .filter(|entity| storages.iter().all(|storage| storage.contains(*entity)))
            .collect()
    }

    /// Call `f` with each matching entity and its components.
    pub fn each<F>(&self, mut f: F)
    where
        F: FnMut(EntityId, Q::Refs<'w>),
    {
        for &entity in &self.entities {
            if let Some(refs) = Q::fetch(self.components, entity) {
                f(entity, refs);
            }
        }
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
