//! Modifiers: one continuous effect as data.
//!
//! A `Modifier` is `{source, timestamp, filter, modification, duration}`.
//! Its layer and sublayer are derived from the modification, so the two
//! can never disagree. Modifiers carry no behavior of their own; the
//! projector interprets them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::filter::EntityFilter;
use super::layer::{ApplicationStep, Characteristic, Layer, PtSublayer};
use crate::cards::{CardType, Color, Keyword};
use crate::core::{EntityId, PlayerId};

/// Identifier of an active modifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub u64);

/// Monotonic creation order of continuous effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

/// How long a modifier stays active.
///
/// The projector ignores durations; `GameState::expire_modifiers` removes
/// modifiers when their duration ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    #[default]
    Permanent,
    UntilEndOfTurn,
    WhileSourceOnBattlefield,
}

/// Event that may end modifier durations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryEvent {
    EndOfTurn,
    SourceLeft(EntityId),
}

impl Duration {
    /// Check whether this duration ends on `event` for a modifier from `source`.
    #[must_use]
    pub fn expires_on(self, event: ExpiryEvent, source: EntityId) -> bool {
        match (self, event) {
            (Duration::UntilEndOfTurn, ExpiryEvent::EndOfTurn) => true,
            (Duration::WhileSourceOnBattlefield, ExpiryEvent::SourceLeft(left)) => left == source,
            _ => false,
        }
    }
}

/// A word replacement made by a text-changing effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextChange {
    Color { from: Color, to: Color },
    Subtype { from: String, to: String },
}

impl TextChange {
    /// Apply every color replacement, in order, to one color word.
    #[must_use]
    pub fn apply_color(changes: &[TextChange], color: Color) -> Color {
        changes.iter().fold(color, |c, change| match change {
            TextChange::Color { from, to } if *from == c => *to,
            _ => c,
        })
    }

    /// Apply every subtype replacement, in order, to one subtype word.
    #[must_use]
    pub fn apply_subtype(changes: &[TextChange], subtype: &str) -> String {
        changes
            .iter()
            .fold(subtype.to_string(), |s, change| match change {
                TextChange::Subtype { from, to } if *from == s => to.clone(),
                _ => s,
            })
    }
}

/// A power or toughness value, possibly computed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PtValue {
    Fixed(i32),
    /// Number of battlefield entities matching the filter, evaluated in the
    /// source's scope at the moment the modifier applies.
    CountMatching(EntityFilter),
}

/// What a modifier changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modification {
    // Layer 1
    /// Become a copy of another object's copiable values.
    CopyOf(EntityId),

    // Layer 2
    ChangeController(PlayerId),

    // Layer 3
    /// Replace a color word in the affected objects' text.
    ReplaceColorWord { from: Color, to: Color },
    /// Replace a subtype word in the affected objects' text.
    ReplaceSubtypeWord { from: String, to: String },

    // Layer 4
    AddCardTypes(BTreeSet<CardType>),
    RemoveCardTypes(BTreeSet<CardType>),
    SetCardTypes(BTreeSet<CardType>),
    AddSubtypes(BTreeSet<String>),
    RemoveAllSubtypes,

    // Layer 5
    SetColors(BTreeSet<Color>),
    AddColors(BTreeSet<Color>),

    // Layer 6
    AddKeywords(BTreeSet<Keyword>),
    RemoveKeywords(BTreeSet<Keyword>),
    RemoveAllAbilities,

    // Layer 7
    DefinePowerToughness { power: PtValue, toughness: PtValue },
    SetPowerToughness { power: i32, toughness: i32 },
    ModifyPowerToughness { power: i32, toughness: i32 },
    SwitchPowerToughness,
}

impl Modification {
    /// The application step this modification belongs to.
    #[must_use]
    pub fn step(&self) -> ApplicationStep {
        match self {
            Modification::CopyOf(_) => ApplicationStep::Copy,
            Modification::ChangeController(_) => ApplicationStep::Control,
            Modification::ReplaceColorWord { .. } | Modification::ReplaceSubtypeWord { .. } => {
                ApplicationStep::Text
            }
            Modification::AddCardTypes(_)
            | Modification::RemoveCardTypes(_)
            | Modification::SetCardTypes(_)
            | Modification::AddSubtypes(_)
            | Modification::RemoveAllSubtypes => ApplicationStep::Type,
            Modification::SetColors(_) | Modification::AddColors(_) => ApplicationStep::Color,
            Modification::AddKeywords(_)
            | Modification::RemoveKeywords(_)
            | Modification::RemoveAllAbilities => ApplicationStep::Ability,
            Modification::DefinePowerToughness { .. } => ApplicationStep::PtDefining,
            Modification::SetPowerToughness { .. } => ApplicationStep::PtSet,
            Modification::ModifyPowerToughness { .. } => ApplicationStep::PtModify,
            Modification::SwitchPowerToughness => ApplicationStep::PtSwitch,
        }
    }

    /// Characteristics this modification can change.
    #[must_use]
    pub fn changes(&self) -> BTreeSet<Characteristic> {
        use Characteristic as C;
        let list: &[Characteristic] = match self {
            Modification::CopyOf(_) => &[
                C::Name,
                C::Text,
                C::CardType,
                C::Subtype,
                C::Color,
                C::Keyword,
                C::PowerToughness,
            ],
            Modification::ChangeController(_) => &[C::Controller],
            Modification::ReplaceColorWord { .. } | Modification::ReplaceSubtypeWord { .. } => {
                &[C::Text]
            }
            Modification::AddCardTypes(_)
            | Modification::RemoveCardTypes(_)
            | Modification::SetCardTypes(_) => &[C::CardType],
            Modification::AddSubtypes(_) | Modification::RemoveAllSubtypes => &[C::Subtype],
            Modification::SetColors(_) | Modification::AddColors(_) => &[C::Color],
            Modification::AddKeywords(_)
            | Modification::RemoveKeywords(_)
            | Modification::RemoveAllAbilities => &[C::Keyword],
            Modification::DefinePowerToughness { .. }
            | Modification::SetPowerToughness { .. }
            | Modification::ModifyPowerToughness { .. }
            | Modification::SwitchPowerToughness => &[C::PowerToughness],
        };
        list.iter().copied().collect()
    }

    /// Apply text-changing replacements to the words this modification mentions.
    #[must_use]
    pub fn rewritten(&self, changes: &[TextChange]) -> Modification {
        match self {
            Modification::AddSubtypes(subtypes) => Modification::AddSubtypes(
                subtypes
                    .iter()
                    .map(|s| TextChange::apply_subtype(changes, s))
                    .collect(),
            ),
            Modification::SetColors(colors) => Modification::SetColors(
                colors
                    .iter()
                    .map(|c| TextChange::apply_color(changes, *c))
                    .collect(),
            ),
            Modification::AddColors(colors) => Modification::AddColors(
                colors
                    .iter()
                    .map(|c| TextChange::apply_color(changes, *c))
                    .collect(),
            ),
            Modification::DefinePowerToughness { power, toughness } => {
                let rewrite = |v: &PtValue| match v {
                    PtValue::CountMatching(f) => PtValue::CountMatching(f.rewritten(changes)),
                    fixed => fixed.clone(),
                };
                Modification::DefinePowerToughness {
                    power: rewrite(power),
                    toughness: rewrite(toughness),
                }
            }
            other => other.clone(),
        }
    }
}

/// One active continuous effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifier {
    /// Assigned by `GameState::add_modifier`.
    pub id: ModifierId,
    /// Entity that generated the effect.
    pub source: EntityId,
    /// Assigned by `GameState::add_modifier`.
    pub timestamp: Timestamp,
    /// Which entities are affected.
    pub filter: EntityFilter,
    /// What changes.
    pub modification: Modification,
    pub duration: Duration,
}

impl Modifier {
    /// Create a modifier. Id and timestamp are assigned when it is added to a state.
    pub fn new(source: EntityId, filter: EntityFilter, modification: Modification) -> Self {
        Self {
            id: ModifierId::default(),
            source,
            timestamp: Timestamp::default(),
            filter,
            modification,
            duration: Duration::Permanent,
        }
    }

    /// Set the duration (builder pattern).
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set an explicit timestamp (builder pattern).
    ///
    /// Used for caller-supplied extra modifiers that never enter a state.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Timestamp(timestamp);
        self
    }

    /// Set an explicit id (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = ModifierId(id);
        self
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        self.step().layer()
    }

    #[must_use]
    pub fn sublayer(&self) -> Option<PtSublayer> {
        self.step().sublayer()
    }

    #[must_use]
    pub fn step(&self) -> ApplicationStep {
        self.modification.step()
    }

    /// Ordering key for timestamp order.
    #[must_use]
    pub fn order_key(&self) -> (Timestamp, ModifierId) {
        (self.timestamp, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_derivation() {
        let anthem = Modifier::new(
            EntityId(5),
            EntityFilter::Creatures,
            Modification::ModifyPowerToughness {
                power: 1,
                toughness: 1,
            },
        );
        assert_eq!(anthem.layer(), Layer::PowerToughness);
        assert_eq!(anthem.sublayer(), Some(PtSublayer::Modify));

        let steal = Modifier::new(
            EntityId(5),
            EntityFilter::Specific(EntityId(9)),
            Modification::ChangeController(PlayerId::new(1)),
        );
        assert_eq!(steal.layer(), Layer::Control);
        assert_eq!(steal.sublayer(), None);
    }

    #[test]
    fn test_changes() {
        let m = Modification::AddColors([Color::Black].into_iter().collect());
        assert_eq!(
            m.changes(),
            [Characteristic::Color].into_iter().collect::<BTreeSet<_>>()
        );
        assert!(Modification::CopyOf(EntityId(3))
            .changes()
            .contains(&Characteristic::PowerToughness));
    }

    #[test]
    fn test_duration_expiry() {
        let source = EntityId(7);
        assert!(Duration::UntilEndOfTurn.expires_on(ExpiryEvent::EndOfTurn, source));
        assert!(Duration::WhileSourceOnBattlefield.expires_on(ExpiryEvent::SourceLeft(source), source));
        assert!(!Duration::WhileSourceOnBattlefield
            .expires_on(ExpiryEvent::SourceLeft(EntityId(8)), source));
        assert!(!Duration::Permanent.expires_on(ExpiryEvent::EndOfTurn, source));
    }

    #[test]
    fn test_text_change_chain() {
        let changes = vec![
            TextChange::Color {
                from: Color::Red,
                to: Color::Blue,
            },
            TextChange::Color {
                from: Color::Blue,
                to: Color::White,
            },
        ];
        assert_eq!(TextChange::apply_color(&changes, Color::Red), Color::White);
        assert_eq!(TextChange::apply_color(&changes, Color::Green), Color::Green);
    }
}
