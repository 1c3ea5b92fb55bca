//! Entity identification.
//!
//! Every game object (player, card, token) has a unique `EntityId`.
//!
//! ## ID Layout
//!
//! - `0..player_count`: Reserved for players
//! - `player_count..`: Cards and tokens, allocated by `GameState`
//!
//! IDs are never reused within a game. A card that changes zones becomes a
//! new object with a fresh ID; the old ID simply stops resolving.
//!
//! ```
//! use rules_core::core::EntityId;
//!
//! let player_count = 2;
//! let player_1 = EntityId::player_id(1);
//! assert!(player_1.is_player(player_count));
//!
//! let card = EntityId(10);
//! assert!(!card.is_player(player_count));
//! ```

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Unique identifier for any game entity.
///
/// Ordered so that stores keyed by `EntityId` iterate deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID for a player by index.
    #[must_use]
    pub const fn player_id(index: u8) -> Self {
        Self(index as u32)
    }

    /// First entity ID available for non-player entities.
    #[must_use]
    pub const fn first_non_player(player_count: usize) -> u32 {
        player_count as u32
    }

    /// Check if this entity ID refers to a player.
    #[must_use]
    pub const fn is_player(self, player_count: usize) -> bool {
        self.0 < player_count as u32
    }

    /// Convert to `PlayerId` if this is a player entity.
    ///
    /// ```
    /// use rules_core::core::{EntityId, PlayerId};
    ///
    /// assert_eq!(EntityId(1).as_player(2), Some(PlayerId::new(1)));
    /// assert_eq!(EntityId(5).as_player(2), None);
    /// ```
    #[must_use]
    pub fn as_player(self, player_count: usize) -> Option<PlayerId> {
        if self.is_player(player_count) {
            Some(PlayerId::new(self.0 as u8))
        } else {
            None
        }
    }

    /// Entity ID for a player.
    #[must_use]
    pub const fn player(id: PlayerId) -> Self {
        Self(id.0 as u32)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
