//! Events: the visible record of what an operation changed.
//!
//! Every operation that transforms the state returns the events it
//! produced, in the order the changes happened. Triggered-ability matching
//! and game logs consume them; the rules core itself never reads them back.

use serde::{Deserialize, Serialize};

use super::cost::Cost;
use crate::core::{CounterKind, EntityId, PlayerId};
use crate::layers::ModifierId;
use crate::zones::ZoneType;

/// Something that received damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamageTarget {
    Player(PlayerId),
    Permanent(EntityId),
}

impl DamageTarget {
    /// Interpret an entity id, treating player ids as players.
    #[must_use]
    pub fn from_entity(id: EntityId, player_count: usize) -> Self {
        match id.as_player(player_count) {
            Some(player) => DamageTarget::Player(player),
            None => DamageTarget::Permanent(id),
        }
    }
}

/// A state change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DamageDealt {
        source: Option<EntityId>,
        target: DamageTarget,
        amount: u32,
        combat: bool,
    },
    LifeGained { player: PlayerId, amount: i64 },
    LifeLost { player: PlayerId, amount: i64 },

    /// A card changed zones and became the object `new`.
    ZoneChanged {
        old: EntityId,
        new: EntityId,
        from: ZoneType,
        to: ZoneType,
    },
    CardDrawn { player: PlayerId, card: EntityId },
    Discarded { player: PlayerId, card: EntityId },
    LibraryShuffled { player: PlayerId },

    Destroyed { entity: EntityId },
    Sacrificed { entity: EntityId },

    CountersAdded {
        entity: EntityId,
        kind: CounterKind,
        count: u32,
    },
    Tapped { entity: EntityId },
    Untapped { entity: EntityId },

    ManaAdded { player: PlayerId, amount: u32 },
    CostPaid { player: PlayerId, cost: Cost },

    ModifierCreated { id: ModifierId, source: EntityId },

    CoinFlipped { player: PlayerId, heads: bool },
    ModeChosen { player: PlayerId, index: usize },

    AttackerDeclared { attacker: EntityId, defender: PlayerId },
    BlockerDeclared { blocker: EntityId, attacker: EntityId },

    PlayerLost { player: PlayerId },
}

impl GameEvent {
    /// Total damage across a slice of events.
    #[must_use]
    pub fn total_damage(events: &[GameEvent]) -> u32 {
        events
            .iter()
            .map(|e| match e {
                GameEvent::DamageDealt { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_target_from_entity() {
        assert_eq!(
            DamageTarget::from_entity(EntityId(1), 2),
            DamageTarget::Player(PlayerId::new(1))
        );
        assert_eq!(
            DamageTarget::from_entity(EntityId(7), 2),
            DamageTarget::Permanent(EntityId(7))
        );
    }

    #[test]
    fn test_total_damage() {
        let events = vec![
            GameEvent::DamageDealt {
                source: None,
                target: DamageTarget::Player(PlayerId::new(0)),
                amount: 2,
                combat: false,
            },
            GameEvent::LifeLost {
                player: PlayerId::new(0),
                amount: 2,
            },
            GameEvent::DamageDealt {
                source: None,
                target: DamageTarget::Permanent(EntityId(5)),
                amount: 3,
                combat: true,
            },
        ];
        assert_eq!(GameEvent::total_damage(&events), 5);
    }
}
