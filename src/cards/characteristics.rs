//! Printed characteristics of a card.
//!
//! `Characteristics` is the base value the layer system starts from. The
//! projector copies it, then continuous effects rewrite the copy; the stored
//! base is never modified.
//!
//! ## Example
//!
//! ```
//! use rules_core::cards::{Characteristics, Color, Keyword};
//!
//! let bird = Characteristics::creature("Storm Crow", 1, 2)
//!     .with_color(Color::Blue)
//!     .with_subtype("Bird")
//!     .with_keyword(Keyword::Flying);
//!
//! assert!(bird.is_creature());
//! assert!(bird.keywords.contains(&Keyword::Flying));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Card type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CardType {
    Artifact,
    Creature,
    Enchantment,
    Instant,
    Land,
    Planeswalker,
    Sorcery,
}

/// One of the five colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
}

/// Keyword abilities the core interprets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Deathtouch,
    Defender,
    DoubleStrike,
    FirstStrike,
    Flying,
    Haste,
    Hexproof,
    Indestructible,
    Lifelink,
    Menace,
    Reach,
    Shadow,
    Trample,
    Vigilance,
}

impl Keyword {
    /// Keywords that restrict which creatures may block the holder.
    ///
    /// Each gate is satisfied by the keywords returned from `evasion_answers`.
    pub const EVASION: [Keyword; 2] = [Keyword::Flying, Keyword::Shadow];

    /// Keywords on a blocker that satisfy this evasion gate.
    #[must_use]
    pub fn evasion_answers(self) -> &'static [Keyword] {
        match self {
            Keyword::Flying => &[Keyword::Flying, Keyword::Reach],
            Keyword::Shadow => &[Keyword::Shadow],
            _ => &[],
        }
    }
}

/// Base characteristics of an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Characteristics {
    /// Card name.
    pub name: String,
    /// Card types.
    pub card_types: BTreeSet<CardType>,
    /// Subtypes (creature types, land types, ...).
    pub subtypes: BTreeSet<String>,
    /// Colors.
    pub colors: BTreeSet<Color>,
    /// Keyword abilities.
    pub keywords: BTreeSet<Keyword>,
    /// Printed power, if any.
    pub power: Option<i32>,
    /// Printed toughness, if any.
    pub toughness: Option<i32>,
}

impl Characteristics {
    /// Create named characteristics with no types.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a creature with the given power and toughness.
    #[must_use]
    pub fn creature(name: impl Into<String>, power: i32, toughness: i32) -> Self {
        Self::new(name)
            .with_type(CardType::Creature)
            .with_power_toughness(power, toughness)
    }

    /// Add a card type (builder pattern).
    #[must_use]
    pub fn with_type(mut self, card_type: CardType) -> Self {
        self.card_types.insert(card_type);
        self
    }

    /// Add a subtype (builder pattern).
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtypes.insert(subtype.into());
        self
    }

    /// Add a color (builder pattern).
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.colors.insert(color);
        self
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.insert(keyword);
        self
    }

    /// Set printed power and toughness (builder pattern).
    #[must_use]
    pub fn with_power_toughness(mut self, power: i32, toughness: i32) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    /// Check for the creature type.
    #[must_use]
    pub fn is_creature(&self) -> bool {
        self.card_types.contains(&CardType::Creature)
    }

    /// Check for a permanent type (can exist on the battlefield).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.card_types.is_empty()
            && !self.card_types.contains(&CardType::Instant)
            && !self.card_types.contains(&CardType::Sorcery)
    }
}
