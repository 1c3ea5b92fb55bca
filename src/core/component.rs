//! Components: typed records attached to entities.
//!
//! An entity has no fixed class; it is whatever set of components is
//! currently attached. Each `Component` variant has a matching
//! `ComponentKind` discriminant, which is the key inside an entity record,
//! so an entity holds at most one component of each kind.
//!
//! ## Component Kinds
//!
//! - `Card`: card identity (definition id and printed name)
//! - `Owner` / `Controller`: players
//! - `Base`: printed characteristics the layer system starts from
//! - `Tapped`, `SummoningSick`: status flags
//! - `Damage`, `DeathtouchDamage`: marked damage
//! - `Counters`: +1/+1, -1/-1 and named counters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PlayerId;
use crate::cards::{CardId, Characteristics};

/// Kind of counter that can be placed on a permanent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CounterKind {
    /// +1/+1 counter.
    PlusOne,
    /// -1/-1 counter.
    MinusOne,
    /// Any other counter, by name (loyalty, charge, ...).
    Named(String),
}

/// Counters on a single permanent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterSet {
    counts: BTreeMap<CounterKind, u32>,
}

impl CounterSet {
    /// Create an empty counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters of a kind.
    #[must_use]
    pub fn get(&self, kind: &CounterKind) -> u32 {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Add counters of a kind.
    pub fn add(&mut self, kind: CounterKind, count: u32) {
        if count == 0 {
            return;
        }
        *self.counts.entry(kind).or_insert(0) += count;
    }

    /// Remove up to `count` counters of a kind. Returns how many were removed.
    pub fn remove(&mut self, kind: &CounterKind, count: u32) -> u32 {
        let Some(current) = self.counts.get_mut(kind) else {
            return 0;
        };
        let removed = count.min(*current);
        *current -= removed;
        if *current == 0 {
            self.counts.remove(kind);
        }
        removed
    }

    /// Remove +1/+1 and -1/-1 counters in pairs.
    ///
    /// Returns the number of pairs removed.
    pub fn annihilate(&mut self) -> u32 {
        let pairs = self.get(&CounterKind::PlusOne).min(self.get(&CounterKind::MinusOne));
        if pairs > 0 {
            self.remove(&CounterKind::PlusOne, pairs);
            self.remove(&CounterKind::MinusOne, pairs);
        }
        pairs
    }

    /// Net power/toughness adjustment from +1/+1 and -1/-1 counters.
    #[must_use]
    pub fn net_pt(&self) -> i32 {
        self.get(&CounterKind::PlusOne) as i32 - self.get(&CounterKind::MinusOne) as i32
    }

    /// Check if there are no counters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over (kind, count) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&CounterKind, u32)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }
}

/// Discriminant of a `Component`, used as its key in an entity record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Card,
    Owner,
    Controller,
    Base,
    Tapped,
    SummoningSick,
    Damage,
    DeathtouchDamage,
    Counters,
}

/// A typed record attached to an entity.
///
/// Components are replaced wholesale on write; nothing holds a mutable
/// reference into one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// Card identity.
    Card { card_id: CardId, name: String },
    /// Owning player.
    Owner(PlayerId),
    /// Controlling player before continuous effects.
    Controller(PlayerId),
    /// Printed characteristics.
    Base(Characteristics),
    /// The permanent is tapped.
    Tapped,
    /// The permanent came under its controller's control this turn.
    SummoningSick,
    /// Damage marked this turn.
    Damage(u32),
    /// Damage from a deathtouch source was marked this turn.
    DeathtouchDamage,
    /// Counters on the permanent.
    Counters(CounterSet),
}

impl Component {
    /// The kind key for this component.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Card { .. } => ComponentKind::Card,
            Component::Owner(_) => ComponentKind::Owner,
            Component::Controller(_) => ComponentKind::Controller,
            Component::Base(_) => ComponentKind::Base,
            Component::Tapped => ComponentKind::Tapped,
            Component::SummoningSick => ComponentKind::SummoningSick,
            Component::Damage(_) => ComponentKind::Damage,
            Component::DeathtouchDamage => ComponentKind::DeathtouchDamage,
            Component::Counters(_) => ComponentKind::Counters,
        }
    }

    /// Get as player if this is an `Owner` or `Controller` component.
    #[must_use]
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Component::Owner(p) | Component::Controller(p) => Some(*p),
            _ => None,
        }
    }

    /// Get as characteristics if this is a `Base` component.
    #[must_use]
    pub fn as_base(&self) -> Option<&Characteristics> {
        match self {
            Component::Base(c) => Some(c),
            _ => None,
        }
    }

    /// Get marked damage if this is a `Damage` component.
    #[must_use]
    pub fn as_damage(&self) -> Option<u32> {
        match self {
            Component::Damage(d) => Some(*d),
            _ => None,
        }
    }

    /// Get counters if this is a `Counters` component.
    #[must_use]
    pub fn as_counters(&self) -> Option<&CounterSet> {
        match self {
            Component::Counters(c) => Some(c),
            _ => None,
        }
    }
}

impl From<Characteristics> for Component {
    fn from(c: Characteristics) -> Self {
        Component::Base(c)
    }
}

impl From<CounterSet> for Component {
    fn from(c: CounterSet) -> Self {
        Component::Counters(c)
    }
}
