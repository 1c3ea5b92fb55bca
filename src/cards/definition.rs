//! Card definitions: static card data.
//!
//! A `CardDefinition` holds what is printed on a card: its base
//! characteristics and, for spells, the effect tree it resolves with.
//! Everything that changes during a game lives on the entity instead.

use serde::{Deserialize, Serialize};

use super::characteristics::Characteristics;
use crate::effects::{EffectNode, TargetSpec};

/// Unique identifier for a card definition.
///
/// This identifies the printed card (e.g., "Lightning Bolt"), not a
/// specific object in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use rules_core::cards::{CardDefinition, CardId, Characteristics};
///
/// let bears = CardDefinition::new(
///     CardId::new(1),
///     Characteristics::creature("Grizzly Bears", 2, 2),
/// );
///
/// assert_eq!(bears.name, "Grizzly Bears");
/// assert!(bears.effect.is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Unique identifier for this card definition.
    pub id: CardId,

    /// Card name (for display/debugging).
    pub name: String,

    /// Printed characteristics.
    pub characteristics: Characteristics,

    /// Effect performed when the card resolves, for spells.
    pub effect: Option<EffectNode>,

    /// Targets chosen when the card is cast, if any.
    pub target: Option<TargetSpec>,
}

impl CardDefinition {
    /// Create a definition from printed characteristics.
    #[must_use]
    pub fn new(id: CardId, characteristics: Characteristics) -> Self {
        Self {
            id,
            name: characteristics.name.clone(),
            characteristics,
            effect: None,
            target: None,
        }
    }

    /// Set the resolution effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: EffectNode) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Set the targeting requirement (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = Some(target);
        self
    }

    /// Check whether the card is a permanent card.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.characteristics.is_permanent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardType;
    use crate::effects::{Amount, EntityRef, LeafEffect, Recipient};

    #[test]
    fn test_spell_definition() {
        let bolt = CardDefinition::new(
            CardId::new(7),
            Characteristics::new("Lightning Bolt").with_type(CardType::Instant),
        )
        .with_effect(EffectNode::leaf(LeafEffect::DealDamage {
            to: Recipient::Entities(EntityRef::AllTargets),
            amount: Amount::Fixed(3),
        }));

        assert!(!bolt.is_permanent());
        assert!(bolt.effect.is_some());
        assert_eq!(bolt.id.to_string(), "Card(7)");
    }

    #[test]
    fn test_definition_serialization() {
        let bears = CardDefinition::new(CardId::new(1), Characteristics::creature("Grizzly Bears", 2, 2));
        let json = serde_json::to_string(&bears).unwrap();
        let deserialized: CardDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(bears, deserialized);
    }
}
