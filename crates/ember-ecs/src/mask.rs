use std::fmt;

use crate::component::ComponentTypeId;

/// Maximum number of distinct component types a process can use.
pub const MAX_COMPONENTS: usize = 128;

const WORDS: usize = MAX_COMPONENTS.div_ceil(64);

/// Fixed-capacity bit vector with one bit per component type.
///
/// An entity's mask has bit `i` set exactly when a component whose
/// [`ComponentTypeId`] is `i` is attached to it. A system's mask is the union
/// of the bits of the component types it requires.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComponentMask {
    words: [u64; WORDS],
}

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask { words: [0; WORDS] };

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn set(&mut self, id: ComponentTypeId) {
        let (word, bit) = Self::locate(id);
        self.words[word] |= bit;
    }

    pub fn clear(&mut self, id: ComponentTypeId) {
        let (word, bit) = Self::locate(id);
        self.words[word] &= !bit;
    }

    pub fn contains(&self, id: ComponentTypeId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words[word] & bit != 0
    }

    /// Whether every bit set in `required` is also set in `self`.
    pub fn is_superset_of(&self, required: &ComponentMask) -> bool {
        self.words
            .iter()
            .zip(required.words.iter())
            .all(|(have, need)| have & need == *need)
    }

    pub fn union(mut self, other: &ComponentMask) -> ComponentMask {
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            *a |= *b;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of bits set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over the type ids whose bit is set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        (0..MAX_COMPONENTS)
            .map(ComponentTypeId::from_index)
            .filter(|id| self.contains(*id))
    }

    fn locate(id: ComponentTypeId) -> (usize, u64) {
        let index = id.index();
        (index / 64, 1u64 << (index % 64))
    }
}

impl FromIterator<ComponentTypeId> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentTypeId>>(iter: I) -> Self {
        let mut mask = ComponentMask::new();
        for id in iter {
            mask.set(id);
        }
        mask
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.index())).finish()
    }
}
