//! Combat declarations carried in the game state.
//!
//! Tracks which creatures attack whom, which creatures block which
//! attacker, and each attacker's damage assignment order. A blocked
//! attacker stays blocked even after all its blockers are gone.

use im::{OrdMap, OrdSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EntityId, PlayerId};

/// Blockers of one attacker, in damage assignment order.
pub type BlockerOrder = SmallVec<[EntityId; 4]>;

/// Combat state tracking.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Attacker -> defending player.
    attackers: OrdMap<EntityId, PlayerId>,
    /// Blocker -> the attacker it blocks.
    blockers: OrdMap<EntityId, EntityId>,
    /// Attacker -> its blockers in damage assignment order.
    order: OrdMap<EntityId, BlockerOrder>,
    /// Attackers that were blocked at declaration.
    blocked: OrdSet<EntityId>,
}

impl CombatState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attacker.
    pub fn add_attacker(&mut self, attacker: EntityId, defender: PlayerId) {
        self.attackers.insert(attacker, defender);
    }

    /// Record a block. The blocker goes to the end of the attacker's order.
    pub fn add_blocker(&mut self, blocker: EntityId, attacker: EntityId) {
        self.blockers.insert(blocker, attacker);
        self.blocked.insert(attacker);
        let mut order = self.order.get(&attacker).cloned().unwrap_or_default();
        if !order.contains(&blocker) {
            order.push(blocker);
        }
        self.order.insert(attacker, order);
    }

    /// Replace an attacker's damage assignment order.
    pub fn set_order(&mut self, attacker: EntityId, order: BlockerOrder) {
        self.order.insert(attacker, order);
    }

    #[must_use]
    pub fn is_attacking(&self, id: EntityId) -> bool {
        self.attackers.contains_key(&id)
    }

    #[must_use]
    pub fn is_blocking(&self, id: EntityId) -> bool {
        self.blockers.contains_key(&id)
    }

    /// The player an attacker is attacking.
    #[must_use]
    pub fn defender_of(&self, attacker: EntityId) -> Option<PlayerId> {
        self.attackers.get(&attacker).copied()
    }

    /// The attacker a blocker is blocking.
    #[must_use]
    pub fn blocked_attacker(&self, blocker: EntityId) -> Option<EntityId> {
        self.blockers.get(&blocker).copied()
    }

    /// Blockers of an attacker in damage assignment order.
    #[must_use]
    pub fn blockers_of(&self, attacker: EntityId) -> &[EntityId] {
        self.order.get(&attacker).map_or(&[], |order| order.as_slice())
    }

    #[must_use]
    pub fn is_blocked(&self, attacker: EntityId) -> bool {
        self.blocked.contains(&attacker)
    }

    /// Attackers in id order.
    pub fn attackers(&self) -> impl Iterator<Item = (EntityId, PlayerId)> + '_ {
        self.attackers.iter().map(|(a, d)| (*a, *d))
    }

    /// Blockers in id order, with the attacker each blocks.
    pub fn blocks(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.blockers.iter().map(|(b, a)| (*b, *a))
    }

    /// Every creature in combat.
    #[must_use]
    pub fn combatants(&self) -> Vec<EntityId> {
        self.attackers
            .keys()
            .chain(self.blockers.keys())
            .copied()
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attackers.is_empty() && self.blockers.is_empty()
    }

    /// Take an object out of combat (it left the battlefield).
    pub fn remove_entity(&mut self, id: EntityId) {
        self.attackers.remove(&id);
        self.order.remove(&id);
        self.blocked.remove(&id);

        if let Some(attacker) = self.blockers.remove(&id) {
            if let Some(order) = self.order.get(&attacker) {
                let remaining: BlockerOrder = order.iter().copied().filter(|&b| b != id).collect();
                self.order.insert(attacker, remaining);
            }
        }
    }

    /// Clear everything at end of combat.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations() {
        let mut combat = CombatState::new();
        combat.add_attacker(EntityId(10), PlayerId::new(1));
        combat.add_blocker(EntityId(20), EntityId(10));
        combat.add_blocker(EntityId(21), EntityId(10));

        assert!(combat.is_attacking(EntityId(10)));
        assert!(combat.is_blocking(EntityId(21)));
        assert!(combat.is_blocked(EntityId(10)));
        assert_eq!(combat.defender_of(EntityId(10)), Some(PlayerId::new(1)));
        assert_eq!(combat.blockers_of(EntityId(10)), &[EntityId(20), EntityId(21)]);
        assert_eq!(combat.combatants().len(), 3);
    }

    #[test]
    fn test_removed_blocker_leaves_attacker_blocked() {
        let mut combat = CombatState::new();
        combat.add_attacker(EntityId(10), PlayerId::new(1));
        combat.add_blocker(EntityId(20), EntityId(10));

        combat.remove_entity(EntityId(20));

        assert!(combat.is_blocked(EntityId(10)));
        assert!(combat.blockers_of(EntityId(10)).is_empty());
        assert!(!combat.is_blocking(EntityId(20)));
    }

    #[test]
    fn test_clear() {
        let mut combat = CombatState::new();
        combat.add_attacker(EntityId(10), PlayerId::new(1));
        combat.clear();
        assert!(combat.is_empty());
        assert!(!combat.is_blocked(EntityId(10)));
    }
}
