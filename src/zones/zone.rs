//! Zone identifiers.
//!
//! A zone is addressed by its owner and its type. Shared zones (the
//! battlefield, the stack) are still keyed per owner: a permanent sits in
//! its owner's battlefield partition regardless of who controls it.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// The kind of zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ZoneType {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
    Command,
}

impl ZoneType {
    /// All zone types, in a fixed order.
    pub const ALL: [ZoneType; 7] = [
        ZoneType::Library,
        ZoneType::Hand,
        ZoneType::Battlefield,
        ZoneType::Graveyard,
        ZoneType::Exile,
        ZoneType::Stack,
        ZoneType::Command,
    ];

    /// Hidden zones: contents are not visible to every player.
    #[must_use]
    pub fn is_hidden(self) -> bool {
        matches!(self, ZoneType::Library | ZoneType::Hand)
    }
}

/// A zone address: `(owner, zone_type)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneKey {
    pub owner: PlayerId,
    pub zone_type: ZoneType,
}

impl ZoneKey {
    #[must_use]
    pub const fn new(owner: PlayerId, zone_type: ZoneType) -> Self {
        Self { owner, zone_type }
    }

    #[must_use]
    pub const fn library(owner: PlayerId) -> Self {
        Self::new(owner, ZoneType::Library)
    }

    #[must_use]
    pub const fn hand(owner: PlayerId) -> Self {
        Self::new(owner, ZoneType::Hand)
    }

    #[must_use]
    pub const fn battlefield(owner: PlayerId) -> Self {
        Self::new(owner, ZoneType::Battlefield)
    }

    #[must_use]
    pub const fn graveyard(owner: PlayerId) -> Self {
        Self::new(owner, ZoneType::Graveyard)
    }

    #[must_use]
    pub const fn exile(owner: PlayerId) -> Self {
        Self::new(owner, ZoneType::Exile)
    }
}

impl std::fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self.zone_type, self.owner.0)
    }
}
