//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` tracks which zone every card occupies and the order
//! of cards within each zone. It supports:
//! - Ordered sequences per `ZoneKey` with explicit position control
//! - Reverse lookup from entity to zone
//! - Shuffling with the in-state RNG
//!
//! Every zone is ordered. For libraries, index 0 is the bottom and the last
//! index is the top. Both maps are `im` collections so cloning a
//! `GameState` does not copy zone contents.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use super::zone::{ZoneKey, ZoneType};
use crate::core::entity::EntityId;
use crate::core::rng::GameRng;
use crate::core::PlayerId;

/// Position for inserting a card into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (e.g., top of library).
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index (0 = bottom for libraries).
    Index(usize),
}

/// Manages card locations across zones.
///
/// ## Usage
///
/// ```
/// use rules_core::core::{EntityId, PlayerId};
/// use rules_core::zones::{ZoneKey, ZoneManager, ZonePosition};
///
/// let mut manager = ZoneManager::new();
/// let library = ZoneKey::library(PlayerId::new(0));
///
/// manager.add_to_zone(EntityId(10), library, ZonePosition::Top);
/// manager.add_to_zone(EntityId(11), library, ZonePosition::Bottom);
///
/// assert_eq!(manager.top_card(library), Some(EntityId(10)));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneManager {
    /// Card locations: entity -> zone.
    locations: OrdMap<EntityId, ZoneKey>,

    /// Ordered contents per zone.
    zone_order: OrdMap<ZoneKey, Vector<EntityId>>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card to a zone.
    ///
    /// Returns `false` (and changes nothing) if the entity is already tracked.
    pub fn add_to_zone(&mut self, entity: EntityId, zone: ZoneKey, position: ZonePosition) -> bool {
        if self.locations.contains_key(&entity) {
            return false;
        }

        self.locations.insert(entity, zone);
        if !self.zone_order.contains_key(&zone) {
            self.zone_order.insert(zone, Vector::new());
        }
        let Some(order) = self.zone_order.get_mut(&zone) else {
            return false;
        };
        match position {
            ZonePosition::Top => order.push_back(entity),
            ZonePosition::Bottom => order.push_front(entity),
            ZonePosition::Index(i) => {
                let idx = i.min(order.len());
                order.insert(idx, entity);
            }
        }
        true
    }

    /// Remove a card from the manager entirely.
    ///
    /// Returns the zone it was in, or `None` if not found.
    pub fn remove(&mut self, entity: EntityId) -> Option<ZoneKey> {
        let zone = self.locations.remove(&entity)?;

        if let Some(order) = self.zone_order.get_mut(&zone) {
            order.retain(|&e| e != entity);
        }

        Some(zone)
    }

    /// Get the zone a card is in.
    #[must_use]
    pub fn get_zone(&self, entity: EntityId) -> Option<ZoneKey> {
        self.locations.get(&entity).copied()
    }

    /// Check if a card is in a specific zone.
    #[must_use]
    pub fn is_in_zone(&self, entity: EntityId, zone: ZoneKey) -> bool {
        self.locations.get(&entity) == Some(&zone)
    }

    /// Check if a card is in any zone of the given type.
    #[must_use]
    pub fn is_in_zone_type(&self, entity: EntityId, zone_type: ZoneType) -> bool {
        self.get_zone(entity).is_some_and(|z| z.zone_type == zone_type)
    }

    /// Get cards in a zone, bottom to top.
    #[must_use]
    pub fn cards(&self, zone: ZoneKey) -> Vec<EntityId> {
        self.zone_order
            .get(&zone)
            .map(|v| v.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Get cards in every zone of a type, across owners in player order.
    #[must_use]
    pub fn cards_of_type(&self, zone_type: ZoneType) -> Vec<EntityId> {
        self.zone_order
            .iter()
            .filter(|(key, _)| key.zone_type == zone_type)
            .flat_map(|(_, order)| order.iter().copied())
            .collect()
    }

    /// Get the number of cards in a zone.
    #[must_use]
    pub fn zone_size(&self, zone: ZoneKey) -> usize {
        self.zone_order.get(&zone).map_or(0, Vector::len)
    }

    /// Get the top `count` cards of a zone, topmost first.
    #[must_use]
    pub fn top_cards(&self, zone: ZoneKey, count: usize) -> Vec<EntityId> {
        self.zone_order
            .get(&zone)
            .map(|v| v.iter().rev().take(count).copied().collect())
            .unwrap_or_default()
    }

    /// Get the top card of a zone (last in the sequence).
    #[must_use]
    pub fn top_card(&self, zone: ZoneKey) -> Option<EntityId> {
        self.zone_order.get(&zone)?.last().copied()
    }

    /// Get the bottom card of a zone (first in the sequence).
    #[must_use]
    pub fn bottom_card(&self, zone: ZoneKey) -> Option<EntityId> {
        self.zone_order.get(&zone)?.front().copied()
    }

    /// Remove and return the top card of a zone.
    pub fn pop_top(&mut self, zone: ZoneKey) -> Option<EntityId> {
        let order = self.zone_order.get_mut(&zone)?;
        let entity = order.pop_back()?;
        self.locations.remove(&entity);
        Some(entity)
    }

    /// Shuffle a zone.
    pub fn shuffle_zone(&mut self, zone: ZoneKey, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&zone) {
            let mut cards: Vec<EntityId> = order.iter().copied().collect();
            rng.shuffle(&mut cards);
            *order = cards.into_iter().collect();
        }
    }

    /// Iterate over all tracked `(entity, zone)` pairs in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, ZoneKey)> + '_ {
        self.locations.iter().map(|(&e, &z)| (e, z))
    }

    /// Owners whose zones of `zone_type` hold at least one card.
    pub fn owners_with(&self, zone_type: ZoneType) -> impl Iterator<Item = PlayerId> + '_ {
        self.zone_order
            .iter()
            .filter(move |(key, order)| key.zone_type == zone_type && !order.is_empty())
            .map(|(key, _)| key.owner)
    }

    /// Get total number of cards tracked.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.locations.len()
    }

    /// Check if the manager contains an entity.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Verify the reverse index matches the ordered contents.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let ordered: usize = self.zone_order.values().map(Vector::len).sum();
        ordered == self.locations.len()
            && self.zone_order.iter().all(|(zone, order)| {
                order.iter().all(|e| self.locations.get(e) == Some(zone))
            })
    }
}
