//! The mutable metadata graph.
//!
//! A [`Model`] owns every entity type, property, key, foreign key and
//! navigation in slot arenas. Elements refer to each other by typed ids;
//! back-references (property to entity type, foreign key to principal) are id
//! lookups, never shared pointers.
//!
//! The mutation methods on [`Model`] are the raw graph operations. They do
//! not run conventions; model building goes through the convention-aware
//! builders in `ormkit-conventions`.

mod entity_type;
mod foreign_key;
mod key;
mod model;
mod property;

pub use entity_type::EntityType;
pub use foreign_key::{ForeignKey, Navigation};
pub use key::Key;
pub use model::Model;
pub use property::Property;

use serde::Serialize;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $name(usize);

        impl $name {
            /// Slot index inside the owning arena.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }

            pub(crate) const fn new(index: usize) -> Self {
                Self(index)
            }
        }
    };
}

arena_id!(
    /// Stable id of an entity type.
    EntityTypeId
);
arena_id!(
    /// Stable id of a property.
    PropertyId
);
arena_id!(
    /// Stable id of a key.
    KeyId
);
arena_id!(
    /// Stable id of a foreign key.
    ForeignKeyId
);
arena_id!(
    /// Stable id of a navigation.
    NavigationId
);

/// Slot storage. Removed elements leave an empty slot so ids stay stable.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, item: T) -> usize {
        self.slots.push(Some(item));
        self.slots.len() - 1
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_ids_stay_stable_after_removal() {
        let mut arena = Arena::default();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        let c = arena.insert("c");
        assert_ne!(c, a);
    }
}
