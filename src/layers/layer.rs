//! Layer ordering.
//!
//! Continuous effects apply in a fixed sequence of layers. The
//! power/toughness layer is split into sublayers; `ApplicationStep`
//! flattens both into the single strict order the projector walks.

use serde::{Deserialize, Serialize};

/// A layer in which continuous effects apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Copy effects.
    Copy,
    /// Control-changing effects.
    Control,
    /// Text-changing effects.
    Text,
    /// Type, subtype and supertype changes.
    Type,
    /// Color changes.
    Color,
    /// Ability adding and removing.
    Ability,
    /// Power/toughness, split into `PtSublayer`s.
    PowerToughness,
}

/// Sublayer of the power/toughness layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PtSublayer {
    /// Characteristic-defining abilities.
    CharacteristicDefining,
    /// Effects that set a specific value.
    Set,
    /// Effects that raise or lower the values.
    Modify,
    /// +1/+1 and -1/-1 counters.
    Counters,
    /// Effects that switch power and toughness.
    Switch,
}

/// One step of the strict application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApplicationStep {
    Copy,
    Control,
    Text,
    Type,
    Color,
    Ability,
    PtDefining,
    PtSet,
    PtModify,
    PtCounters,
    PtSwitch,
}

impl ApplicationStep {
    /// Every step, in application order.
    pub const ORDER: [ApplicationStep; 11] = [
        ApplicationStep::Copy,
        ApplicationStep::Control,
        ApplicationStep::Text,
        ApplicationStep::Type,
        ApplicationStep::Color,
        ApplicationStep::Ability,
        ApplicationStep::PtDefining,
        ApplicationStep::PtSet,
        ApplicationStep::PtModify,
        ApplicationStep::PtCounters,
        ApplicationStep::PtSwitch,
    ];

    /// Build the step for a layer and optional sublayer.
    ///
    /// The sublayer is only read for `Layer::PowerToughness`; a P/T effect
    /// without one lands in the modify sublayer.
    #[must_use]
    pub fn new(layer: Layer, sublayer: Option<PtSublayer>) -> Self {
        match layer {
            Layer::Copy => ApplicationStep::Copy,
            Layer::Control => ApplicationStep::Control,
            Layer::Text => ApplicationStep::Text,
            Layer::Type => ApplicationStep::Type,
            Layer::Color => ApplicationStep::Color,
            Layer::Ability => ApplicationStep::Ability,
            Layer::PowerToughness => match sublayer.unwrap_or(PtSublayer::Modify) {
                PtSublayer::CharacteristicDefining => ApplicationStep::PtDefining,
                PtSublayer::Set => ApplicationStep::PtSet,
                PtSublayer::Modify => ApplicationStep::PtModify,
                PtSublayer::Counters => ApplicationStep::PtCounters,
                PtSublayer::Switch => ApplicationStep::PtSwitch,
            },
        }
    }

    #[must_use]
    pub fn layer(self) -> Layer {
        match self {
            ApplicationStep::Copy => Layer::Copy,
            ApplicationStep::Control => Layer::Control,
            ApplicationStep::Text => Layer::Text,
            ApplicationStep::Type => Layer::Type,
            ApplicationStep::Color => Layer::Color,
            ApplicationStep::Ability => Layer::Ability,
            ApplicationStep::PtDefining
            | ApplicationStep::PtSet
            | ApplicationStep::PtModify
            | ApplicationStep::PtCounters
            | ApplicationStep::PtSwitch => Layer::PowerToughness,
        }
    }

    #[must_use]
    pub fn sublayer(self) -> Option<PtSublayer> {
        match self {
            ApplicationStep::PtDefining => Some(PtSublayer::CharacteristicDefining),
            ApplicationStep::PtSet => Some(PtSublayer::Set),
            ApplicationStep::PtModify => Some(PtSublayer::Modify),
            ApplicationStep::PtCounters => Some(PtSublayer::Counters),
            ApplicationStep::PtSwitch => Some(PtSublayer::Switch),
            _ => None,
        }
    }
}

/// A characteristic a filter can read or a modification can change.
///
/// Used to derive dependency edges between effects in the same layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Characteristic {
    Name,
    Controller,
    Text,
    CardType,
    Subtype,
    Color,
    Keyword,
    PowerToughness,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_strict() {
        let order = ApplicationStep::ORDER;
        for pair in order.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_step_round_trip() {
        for step in ApplicationStep::ORDER {
            assert_eq!(ApplicationStep::new(step.layer(), step.sublayer()), step);
        }
    }

    #[test]
    fn test_pt_default_sublayer() {
        assert_eq!(
            ApplicationStep::new(Layer::PowerToughness, None),
            ApplicationStep::PtModify
        );
    }
}
