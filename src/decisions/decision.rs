//! Decision records: what a suspended execution asks a player, and the
//! shape of the answer.
//!
//! A `PlayerDecision` is pure data. Everything the engine needs to carry on
//! after the answer arrives lives in the state's continuation stack; the
//! decision itself only describes the choice.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::effects::{Cost, HandlerArgs, LookRest};
use crate::zones::ZoneType;

/// Identifier of one decision, unique within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecisionId(pub u64);

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decision({})", self.0)
    }
}

/// A choice a player must make before execution can continue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerDecision {
    pub id: DecisionId,
    /// The player who answers.
    pub player: PlayerId,
    /// Text for display.
    pub prompt: String,
    pub context: DecisionContext,
}

/// A decision before it is given an id: who, what to show, what to ask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub player: PlayerId,
    pub prompt: String,
    pub context: DecisionContext,
}

impl DecisionRequest {
    pub fn new(player: PlayerId, prompt: impl Into<String>, context: DecisionContext) -> Self {
        Self {
            player,
            prompt: prompt.into(),
            context,
        }
    }

    #[must_use]
    pub fn into_decision(self, id: DecisionId) -> PlayerDecision {
        PlayerDecision {
            id,
            player: self.player,
            prompt: self.prompt,
            context: self.context,
        }
    }
}

/// What kind of choice is being asked, with everything needed to present
/// and validate it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecisionContext {
    /// Pick up to `max` library cards to put into `destination`.
    SearchLibrary {
        candidates: Vec<EntityId>,
        min: usize,
        max: usize,
        destination: ZoneType,
        shuffle: bool,
        store_as: Option<String>,
    },

    /// Discard exactly `count` cards from hand.
    Discard { candidates: Vec<EntityId>, count: usize },

    /// Pay `cost` (yes) or sacrifice `permanent` (no).
    SacrificeUnless { permanent: EntityId, cost: Cost },

    /// Choose between `min` and `max` targets.
    ChooseTargets {
        candidates: Vec<EntityId>,
        min: usize,
        max: usize,
        store_as: Option<String>,
    },

    /// Return cards from a graveyard.
    ReturnFromGraveyard {
        candidates: Vec<EntityId>,
        min: usize,
        max: usize,
        destination: ZoneType,
    },

    /// Take exactly `take` of the looked-at cards; the rest go to `rest`.
    LookAtTop {
        cards: Vec<EntityId>,
        take: usize,
        take_to: ZoneType,
        rest: LookRest,
    },

    /// Choose mode indices.
    ChooseModes { modes: Vec<String>, min: usize, max: usize },

    /// Yes/no on an optional effect.
    MayChoice,

    /// Yes pays the cost and performs the effect.
    MayPayCost { cost: Cost },

    /// Yes repeats the loop body again.
    RepeatChoice { iterations: u32 },

    /// Discard down to maximum hand size.
    CleanupDiscard { candidates: Vec<EntityId>, count: usize },

    /// Choice requested by a registered effect handler.
    Custom {
        handler: String,
        payload: HandlerArgs,
        options: Vec<EntityId>,
        min: usize,
        max: usize,
    },
}

/// Shape of answer a decision context accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceShape {
    Entities,
    YesNo,
    Modes,
}

impl fmt::Display for ChoiceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceShape::Entities => write!(f, "entity selection"),
            ChoiceShape::YesNo => write!(f, "yes/no"),
            ChoiceShape::Modes => write!(f, "mode selection"),
        }
    }
}

impl DecisionContext {
    /// Short name for logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionContext::SearchLibrary { .. } => "search library",
            DecisionContext::Discard { .. } => "discard",
            DecisionContext::SacrificeUnless { .. } => "sacrifice unless",
            DecisionContext::ChooseTargets { .. } => "choose targets",
            DecisionContext::ReturnFromGraveyard { .. } => "return from graveyard",
            DecisionContext::LookAtTop { .. } => "look at top",
            DecisionContext::ChooseModes { .. } => "choose modes",
            DecisionContext::MayChoice => "may",
            DecisionContext::MayPayCost { .. } => "may pay cost",
            DecisionContext::RepeatChoice { .. } => "repeat",
            DecisionContext::CleanupDiscard { .. } => "cleanup discard",
            DecisionContext::Custom { .. } => "custom",
        }
    }

    /// The answer shape this context accepts.
    #[must_use]
    pub fn shape(&self) -> ChoiceShape {
        match self {
            DecisionContext::SearchLibrary { .. }
            | DecisionContext::Discard { .. }
            | DecisionContext::ChooseTargets { .. }
            | DecisionContext::ReturnFromGraveyard { .. }
            | DecisionContext::LookAtTop { .. }
            | DecisionContext::CleanupDiscard { .. }
            | DecisionContext::Custom { .. } => ChoiceShape::Entities,
            DecisionContext::SacrificeUnless { .. }
            | DecisionContext::MayChoice
            | DecisionContext::MayPayCost { .. }
            | DecisionContext::RepeatChoice { .. } => ChoiceShape::YesNo,
            DecisionContext::ChooseModes { .. } => ChoiceShape::Modes,
        }
    }

    /// Entities offered for selection (empty for yes/no and mode choices).
    #[must_use]
    pub fn options(&self) -> &[EntityId] {
        match self {
            DecisionContext::SearchLibrary { candidates, .. }
            | DecisionContext::Discard { candidates, .. }
            | DecisionContext::ChooseTargets { candidates, .. }
            | DecisionContext::ReturnFromGraveyard { candidates, .. }
            | DecisionContext::CleanupDiscard { candidates, .. } => candidates,
            DecisionContext::LookAtTop { cards, .. } => cards,
            DecisionContext::Custom { options, .. } => options,
            DecisionContext::SacrificeUnless { .. }
            | DecisionContext::ChooseModes { .. }
            | DecisionContext::MayChoice
            | DecisionContext::MayPayCost { .. }
            | DecisionContext::RepeatChoice { .. } => &[],
        }
    }

    /// Inclusive bounds on how many options may be selected.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<(usize, usize)> {
        match self {
            DecisionContext::SearchLibrary { min, max, .. }
            | DecisionContext::ChooseTargets { min, max, .. }
            | DecisionContext::ReturnFromGraveyard { min, max, .. }
            | DecisionContext::ChooseModes { min, max, .. }
            | DecisionContext::Custom { min, max, .. } => Some((*min, *max)),
            DecisionContext::Discard { count, .. } | DecisionContext::CleanupDiscard { count, .. } => {
                Some((*count, *count))
            }
            DecisionContext::LookAtTop { take, .. } => Some((*take, *take)),
            DecisionContext::SacrificeUnless { .. }
            | DecisionContext::MayChoice
            | DecisionContext::MayPayCost { .. }
            | DecisionContext::RepeatChoice { .. } => None,
        }
    }
}

/// A player's answer to a decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub decision_id: DecisionId,
    pub choice: DecisionChoice,
}

impl DecisionResponse {
    pub fn new(decision_id: DecisionId, choice: DecisionChoice) -> Self {
        Self { decision_id, choice }
    }

    /// Answer with selected entities.
    pub fn entities(decision_id: DecisionId, entities: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(decision_id, DecisionChoice::Entities(entities.into_iter().collect()))
    }

    /// Answer yes or no.
    pub fn yes_no(decision_id: DecisionId, yes: bool) -> Self {
        Self::new(decision_id, DecisionChoice::YesNo(yes))
    }

    /// Answer with mode indices.
    pub fn modes(decision_id: DecisionId, modes: impl IntoIterator<Item = usize>) -> Self {
        Self::new(decision_id, DecisionChoice::Modes(modes.into_iter().collect()))
    }
}

/// The content of an answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionChoice {
    Entities(Vec<EntityId>),
    YesNo(bool),
    Modes(Vec<usize>),
}

impl DecisionChoice {
    #[must_use]
    pub fn shape(&self) -> ChoiceShape {
        match self {
            DecisionChoice::Entities(_) => ChoiceShape::Entities,
            DecisionChoice::YesNo(_) => ChoiceShape::YesNo,
            DecisionChoice::Modes(_) => ChoiceShape::Modes,
        }
    }
}
