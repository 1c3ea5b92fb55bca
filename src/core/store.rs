//! Entity store: the indirection table from entity IDs to components.
//!
//! Backed by `im::OrdMap` so cloning the store (and therefore the whole
//! `GameState`) is O(1) and iteration order is deterministic.
//!
//! ```
//! use rules_core::core::{Component, ComponentKind, EntityId, EntityStore, PlayerId};
//!
//! let mut store = EntityStore::new();
//! store.insert(EntityId(5), [Component::Owner(PlayerId::new(0)), Component::Tapped]);
//!
//! assert!(store.has(EntityId(5), ComponentKind::Tapped));
//! assert_eq!(store.owner(EntityId(5)), Some(PlayerId::new(0)));
//! ```

use im::OrdMap;
use serde::{Deserialize, Serialize};

use super::component::{Component, ComponentKind, CounterSet};
use super::{EntityId, PlayerId};
use crate::cards::Characteristics;

/// The components attached to one entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    components: OrdMap<ComponentKind, Component>,
}

impl EntityRecord {
    /// Build a record from components. Later components of the same kind win.
    pub fn from_components(components: impl IntoIterator<Item = Component>) -> Self {
        let mut record = Self::default();
        for component in components {
            record.components.insert(component.kind(), component);
        }
        record
    }

    /// Get a component by kind.
    #[must_use]
    pub fn get(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind)
    }

    /// Check whether a component kind is attached.
    #[must_use]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Iterate over attached components in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }
}

/// Table of all live entities.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStore {
    entities: OrdMap<EntityId, EntityRecord>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity with its initial components, replacing any previous record.
    pub fn insert(&mut self, id: EntityId, components: impl IntoIterator<Item = Component>) {
        self.entities.insert(id, EntityRecord::from_components(components));
    }

    /// Remove an entity. Returns its record if it existed.
    pub fn remove(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&id)
    }

    /// Check whether an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get an entity's record.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Get one component of an entity.
    #[must_use]
    pub fn component(&self, id: EntityId, kind: ComponentKind) -> Option<&Component> {
        self.entities.get(&id).and_then(|r| r.get(kind))
    }

    /// Check whether an entity has a component kind.
    #[must_use]
    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.component(id, kind).is_some()
    }

    /// Attach or replace a component. Returns `false` if the entity does not exist.
    pub fn set(&mut self, id: EntityId, component: Component) -> bool {
        match self.entities.get_mut(&id) {
            Some(record) => {
                record.components.insert(component.kind(), component);
                true
            }
            None => false,
        }
    }

    /// Detach a component. Returns the removed component, if any.
    pub fn unset(&mut self, id: EntityId, kind: ComponentKind) -> Option<Component> {
        self.entities
            .get_mut(&id)
            .and_then(|record| record.components.remove(&kind))
    }

    /// Iterate over all entity IDs in order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // === Typed accessors ===

    /// Owner of an entity.
    #[must_use]
    pub fn owner(&self, id: EntityId) -> Option<PlayerId> {
        self.component(id, ComponentKind::Owner).and_then(Component::as_player)
    }

    /// Controller before continuous effects; falls back to the owner.
    #[must_use]
    pub fn controller(&self, id: EntityId) -> Option<PlayerId> {
        self.component(id, ComponentKind::Controller)
            .and_then(Component::as_player)
            .or_else(|| self.owner(id))
    }

    /// Printed characteristics.
    #[must_use]
    pub fn base(&self, id: EntityId) -> Option<&Characteristics> {
        self.component(id, ComponentKind::Base).and_then(Component::as_base)
    }

    /// Printed name, falling back to the card identity name.
    #[must_use]
    pub fn name(&self, id: EntityId) -> Option<&str> {
        if let Some(base) = self.base(id) {
            return Some(base.name.as_str());
        }
        match self.component(id, ComponentKind::Card) {
            Some(Component::Card { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Check the tapped flag.
    #[must_use]
    pub fn is_tapped(&self, id: EntityId) -> bool {
        self.has(id, ComponentKind::Tapped)
    }

    /// Damage marked on an entity.
    #[must_use]
    pub fn damage(&self, id: EntityId) -> u32 {
        self.component(id, ComponentKind::Damage)
            .and_then(Component::as_damage)
            .unwrap_or(0)
    }

    /// Counters on an entity (empty if none).
    #[must_use]
    pub fn counters(&self, id: EntityId) -> CounterSet {
        self.component(id, ComponentKind::Counters)
            .and_then(Component::as_counters)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::component::CounterKind;

    fn bears_store() -> EntityStore {
        let mut store = EntityStore::new();
        store.insert(
            EntityId(10),
            [
                Component::Owner(PlayerId::new(0)),
                Component::Base(Characteristics::creature("Grizzly Bears", 2, 2)),
            ],
        );
        store
    }

    #[test]
    fn test_insert_and_lookup() {
        let store = bears_store();

        assert!(store.contains(EntityId(10)));
        assert_eq!(store.name(EntityId(10)), Some("Grizzly Bears"));
        assert_eq!(store.owner(EntityId(10)), Some(PlayerId::new(0)));
        assert_eq!(store.controller(EntityId(10)), Some(PlayerId::new(0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_set_and_unset() {
        let mut store = bears_store();

        assert!(store.set(EntityId(10), Component::Damage(1)));
        assert_eq!(store.damage(EntityId(10)), 1);

        assert!(store.set(EntityId(10), Component::Damage(3)));
        assert_eq!(store.damage(EntityId(10)), 3);

        assert_eq!(store.unset(EntityId(10), ComponentKind::Damage), Some(Component::Damage(3)));
        assert_eq!(store.damage(EntityId(10)), 0);

        assert!(!store.set(EntityId(99), Component::Tapped));
    }

    #[test]
    fn test_controller_override() {
        let mut store = bears_store();
        store.set(EntityId(10), Component::Controller(PlayerId::new(1)));

        assert_eq!(store.controller(EntityId(10)), Some(PlayerId::new(1)));
        assert_eq!(store.owner(EntityId(10)), Some(PlayerId::new(0)));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = bears_store();
        let mut copy = original.clone();

        copy.set(EntityId(10), Component::Tapped);
        copy.remove(EntityId(10));

        assert!(original.contains(EntityId(10)));
        assert!(!original.is_tapped(EntityId(10)));
        assert!(!copy.contains(EntityId(10)));
    }

    #[test]
    fn test_counters_default_empty() {
        let mut store = bears_store();
        assert!(store.counters(EntityId(10)).is_empty());

        let mut counters = CounterSet::new();
        counters.add(CounterKind::PlusOne, 1);
        store.set(EntityId(10), counters.into());

        assert_eq!(store.counters(EntityId(10)).net_pt(), 1);
    }
}
