//! Card registry for definition lookup.
//!
//! The `CardRegistry` is the boundary to whatever supplies card data. The
//! rules core only ever looks definitions up by `CardId`.

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::characteristics::{CardType, Characteristics};
use super::definition::{CardDefinition, CardId};

/// Registration failure.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} is already registered")]
    DuplicateId(CardId),
}

/// Registry of card definitions.
///
/// ## Example
///
/// ```
/// use rules_core::cards::{CardRegistry, Characteristics};
///
/// let mut registry = CardRegistry::new();
/// let id = registry.register_auto(Characteristics::creature("Grizzly Bears", 2, 2));
///
/// let found = registry.get(id).unwrap();
/// assert_eq!(found.name, "Grizzly Bears");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
    next_id: u32,
}

impl CardRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card definition.
    pub fn register(&mut self, card: CardDefinition) -> Result<(), RegistryError> {
        if self.cards.contains_key(&card.id) {
            return Err(RegistryError::DuplicateId(card.id));
        }
        self.next_id = self.next_id.max(card.id.raw() + 1);
        self.cards.insert(card.id, card);
        Ok(())
    }

    /// Register characteristics under a fresh ID. Returns the assigned ID.
    pub fn register_auto(&mut self, characteristics: Characteristics) -> CardId {
        let id = CardId::new(self.next_id);
        self.next_id += 1;
        self.cards.insert(id, CardDefinition::new(id, characteristics));
        id
    }

    /// Get a card definition by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    /// Check if a card ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Get the number of registered cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all card definitions.
    pub fn iter(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    /// Find cards with a card type.
    pub fn find_by_type(&self, card_type: CardType) -> impl Iterator<Item = &CardDefinition> {
        self.cards
            .values()
            .filter(move |c| c.characteristics.card_types.contains(&card_type))
    }

    /// Find cards matching a predicate.
    pub fn find<F>(&self, predicate: F) -> impl Iterator<Item = &CardDefinition>
    where
        F: Fn(&CardDefinition) -> bool,
    {
        self.cards.values().filter(move |c| predicate(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = CardRegistry::new();

        let card = CardDefinition::new(CardId::new(1), Characteristics::new("Test Card"));
        registry.register(card).unwrap();

        assert_eq!(registry.get(CardId::new(1)).unwrap().name, "Test Card");
        assert!(registry.get(CardId::new(99)).is_none());
    }

    #[test]
    fn test_register_auto_skips_used_ids() {
        let mut registry = CardRegistry::new();
        registry
            .register(CardDefinition::new(CardId::new(4), Characteristics::new("Four")))
            .unwrap();

        let id = registry.register_auto(Characteristics::new("Next"));
        assert_eq!(id, CardId::new(5));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = CardRegistry::new();

        let card1 = CardDefinition::new(CardId::new(1), Characteristics::new("Card A"));
        let card2 = CardDefinition::new(CardId::new(1), Characteristics::new("Card B"));

        registry.register(card1).unwrap();
        assert_eq!(registry.register(card2), Err(RegistryError::DuplicateId(CardId::new(1))));
        assert_eq!(registry.get(CardId::new(1)).unwrap().name, "Card A");
    }

    #[test]
    fn test_find_by_type() {
        let mut registry = CardRegistry::new();

        registry.register_auto(Characteristics::creature("Goblin", 1, 1));
        registry.register_auto(Characteristics::new("Bolt").with_type(CardType::Instant));
        registry.register_auto(Characteristics::creature("Orc", 2, 1));

        assert_eq!(registry.find_by_type(CardType::Creature).count(), 2);
        assert_eq!(registry.find_by_type(CardType::Instant).count(), 1);
    }

    #[test]
    fn test_find_with_predicate() {
        let mut registry = CardRegistry::new();

        registry.register_auto(Characteristics::creature("Small", 1, 1));
        registry.register_auto(Characteristics::creature("Large", 5, 5));

        let small: Vec<_> = registry
            .find(|c| c.characteristics.power.unwrap_or(0) <= 2)
            .collect();
        assert_eq!(small.len(), 1);
        assert_eq!(small[0].name, "Small");
    }
}
