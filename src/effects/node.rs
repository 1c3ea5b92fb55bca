//! Effect tree vocabulary.
//!
//! An ability is an `EffectNode` tree: composites decide what runs and in
//! which order, leaves change the state. The tree is plain data, so it can
//! be stored inside continuation frames and serialized with the state.
//!
//! ## Composites
//!
//! - `Sequence`: children in order, threading the context through
//! - `Conditional`: one branch chosen by a `Condition`
//! - `ForEachTarget` / `ForEachPlayer` / `ForEachMatching`: the body once per binding
//! - `Modal`: the controller picks modes
//! - `May` / `MayPayCost`: optional, asks first
//! - `RepeatWhile`: the body again while a condition (or a player) says so
//! - `FlipCoin`: one branch chosen by the in-state RNG
//!
//! ## Leaves
//!
//! See `LeafEffect`. Some leaves suspend for a decision; which ones is
//! listed on `LeafEffect::may_suspend`.

use serde::{Deserialize, Serialize};

use super::cost::Cost;
use super::handlers::HandlerArgs;
use super::targeting::TargetSpec;
use crate::core::{CounterKind, EntityId, PlayerId};
use crate::layers::{Duration, EntityFilter, Modification};
use crate::zones::{ZonePosition, ZoneType};

/// A node of an effect tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EffectNode {
    Sequence(Vec<EffectNode>),

    Conditional {
        condition: Condition,
        then: Box<EffectNode>,
        otherwise: Option<Box<EffectNode>>,
    },

    /// Body once per chosen target, with that target as the current entity.
    ForEachTarget { body: Box<EffectNode> },

    ForEachPlayer { scope: PlayerScope, body: Box<EffectNode> },

    /// Body once per battlefield permanent matching the filter.
    ForEachMatching { filter: EntityFilter, body: Box<EffectNode> },

    Modal {
        player: PlayerRef,
        modes: Vec<Mode>,
        min: usize,
        max: usize,
    },

    May { player: PlayerRef, effect: Box<EffectNode> },

    MayPayCost {
        player: PlayerRef,
        cost: Cost,
        effect: Box<EffectNode>,
    },

    /// Runs the body, then again for as long as the condition holds.
    RepeatWhile {
        body: Box<EffectNode>,
        condition: RepeatCondition,
        /// Cap on body runs; `None` uses the engine's configured cap.
        max_iterations: Option<u32>,
    },

    FlipCoin {
        heads: Box<EffectNode>,
        tails: Option<Box<EffectNode>>,
    },

    Leaf(LeafEffect),
}

impl EffectNode {
    pub fn leaf(effect: LeafEffect) -> Self {
        EffectNode::Leaf(effect)
    }

    pub fn sequence(nodes: impl IntoIterator<Item = EffectNode>) -> Self {
        EffectNode::Sequence(nodes.into_iter().collect())
    }

    pub fn conditional(condition: Condition, then: EffectNode, otherwise: Option<EffectNode>) -> Self {
        EffectNode::Conditional {
            condition,
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        }
    }

    pub fn for_each_target(body: EffectNode) -> Self {
        EffectNode::ForEachTarget { body: Box::new(body) }
    }

    pub fn for_each_player(scope: PlayerScope, body: EffectNode) -> Self {
        EffectNode::ForEachPlayer {
            scope,
            body: Box::new(body),
        }
    }

    pub fn for_each_matching(filter: EntityFilter, body: EffectNode) -> Self {
        EffectNode::ForEachMatching {
            filter,
            body: Box::new(body),
        }
    }

    /// "Choose one" for the controller.
    pub fn choose_one(modes: impl IntoIterator<Item = Mode>) -> Self {
        EffectNode::Modal {
            player: PlayerRef::Controller,
            modes: modes.into_iter().collect(),
            min: 1,
            max: 1,
        }
    }

    /// "You may" for the controller.
    pub fn may(effect: EffectNode) -> Self {
        EffectNode::May {
            player: PlayerRef::Controller,
            effect: Box::new(effect),
        }
    }

    pub fn may_pay(cost: Cost, effect: EffectNode) -> Self {
        EffectNode::MayPayCost {
            player: PlayerRef::Controller,
            cost,
            effect: Box::new(effect),
        }
    }

    pub fn repeat_while(body: EffectNode, condition: RepeatCondition) -> Self {
        EffectNode::RepeatWhile {
            body: Box::new(body),
            condition,
            max_iterations: None,
        }
    }

    pub fn flip_coin(heads: EffectNode, tails: Option<EffectNode>) -> Self {
        EffectNode::FlipCoin {
            heads: Box::new(heads),
            tails: tails.map(Box::new),
        }
    }
}

/// One option of a modal effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    pub label: String,
    pub effect: EffectNode,
}

impl Mode {
    pub fn new(label: impl Into<String>, effect: EffectNode) -> Self {
        Self {
            label: label.into(),
            effect,
        }
    }
}

/// Which players a `ForEachPlayer` visits. Players who have lost are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerScope {
    /// Every player, in turn order from the controller.
    All,
    /// Every opponent of the controller, in turn order.
    Opponents,
}

/// When a `RepeatWhile` runs its body again.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RepeatCondition {
    While(Condition),
    /// The player is asked after each run.
    PlayerChooses(PlayerRef),
}

/// A set of entities, resolved against the execution context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    /// The effect's source.
    Source,
    /// The entity bound by the enclosing loop.
    CurrentEntity,
    /// Every chosen target.
    AllTargets,
    /// A collection stored earlier under a key.
    Stored(String),
    Specific(EntityId),
}

/// A player, resolved against the execution context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRef {
    Controller,
    /// The context's opponent, else the controller's next opponent.
    Opponent,
    /// The player bound by the enclosing loop.
    CurrentPlayer,
    ActivePlayer,
    Specific(PlayerId),
}

/// A number, resolved when the leaf runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(i64),
    /// Size of a stored collection.
    StoredCount(String),
    /// The source's current projected power.
    SourcePower,
    /// Battlefield permanents matching a filter.
    CountMatching(EntityFilter),
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Amount::Fixed(n)
    }
}

/// Boolean test over the state and context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    Always,
    Never,
    LifeAtLeast(PlayerRef, i64),
    LifeAtMost(PlayerRef, i64),
    /// Every referenced entity is on the battlefield (false if none).
    EntityOnBattlefield(EntityRef),
    StoredCountAtLeast(String, usize),
    ControlsMatching {
        player: PlayerRef,
        filter: EntityFilter,
        at_least: usize,
    },
    HandSizeAtLeast(PlayerRef, usize),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

/// Who takes damage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Entities; player entity ids mean those players.
    Entities(EntityRef),
    Player(PlayerRef),
}

/// What a created modifier affects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affected {
    /// Whatever matches the filter each time it is projected.
    Matching(EntityFilter),
    /// The referenced entities, fixed when the modifier is created.
    Entities(EntityRef),
}

/// Where the cards not taken by `LookAtTop` go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookRest {
    LibraryBottom,
    Graveyard,
}

/// A state-changing effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LeafEffect {
    // === Immediate ===
    DealDamage { to: Recipient, amount: Amount },
    GainLife { player: PlayerRef, amount: Amount },
    LoseLife { player: PlayerRef, amount: Amount },
    DrawCards { player: PlayerRef, count: Amount },
    /// Battlefield to graveyard unless indestructible.
    Destroy { what: EntityRef },
    Exile { what: EntityRef },
    Sacrifice { what: EntityRef },
    Tap { what: EntityRef },
    Untap { what: EntityRef },
    AddCounters {
        what: EntityRef,
        kind: CounterKind,
        count: Amount,
    },
    AddMana { player: PlayerRef, amount: Amount },
    CreateModifier {
        affected: Affected,
        modification: Modification,
        duration: Duration,
    },
    MoveToZone {
        what: EntityRef,
        to: ZoneType,
        position: ZonePosition,
    },
    ShuffleLibrary { player: PlayerRef },
    /// Store every entity in zones of `zone` type matching `filter`.
    StoreMatching {
        key: String,
        filter: EntityFilter,
        zone: ZoneType,
    },

    // === May suspend ===
    SearchLibrary {
        player: PlayerRef,
        filter: EntityFilter,
        max: usize,
        destination: ZoneType,
        store_as: Option<String>,
    },
    Discard { player: PlayerRef, count: usize },
    SacrificeUnlessPay { what: EntityRef, cost: Cost },
    ChooseTargets {
        spec: TargetSpec,
        store_as: Option<String>,
    },
    ReturnFromGraveyard {
        player: PlayerRef,
        filter: EntityFilter,
        count: usize,
        up_to: bool,
        destination: ZoneType,
    },
    LookAtTop {
        player: PlayerRef,
        count: usize,
        take: usize,
        take_to: ZoneType,
        rest: LookRest,
    },
    /// Registered handler, looked up by name.
    Custom { handler: String, args: HandlerArgs },
}

impl LeafEffect {
    /// Whether this leaf can stop for a player decision.
    #[must_use]
    pub fn may_suspend(&self) -> bool {
        matches!(
            self,
            LeafEffect::SearchLibrary { .. }
                | LeafEffect::Discard { .. }
                | LeafEffect::SacrificeUnlessPay { .. }
                | LeafEffect::ChooseTargets { .. }
                | LeafEffect::ReturnFromGraveyard { .. }
                | LeafEffect::LookAtTop { .. }
                | LeafEffect::Custom { .. }
        )
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LeafEffect::DealDamage { .. } => "deal damage",
            LeafEffect::GainLife { .. } => "gain life",
            LeafEffect::LoseLife { .. } => "lose life",
            LeafEffect::DrawCards { .. } => "draw cards",
            LeafEffect::Destroy { .. } => "destroy",
            LeafEffect::Exile { .. } => "exile",
            LeafEffect::Sacrifice { .. } => "sacrifice",
            LeafEffect::Tap { .. } => "tap",
            LeafEffect::Untap { .. } => "untap",
            LeafEffect::AddCounters { .. } => "add counters",
            LeafEffect::AddMana { .. } => "add mana",
            LeafEffect::CreateModifier { .. } => "create modifier",
            LeafEffect::MoveToZone { .. } => "move to zone",
            LeafEffect::ShuffleLibrary { .. } => "shuffle library",
            LeafEffect::StoreMatching { .. } => "store matching",
            LeafEffect::SearchLibrary { .. } => "search library",
            LeafEffect::Discard { .. } => "discard",
            LeafEffect::SacrificeUnlessPay { .. } => "sacrifice unless pay",
            LeafEffect::ChooseTargets { .. } => "choose targets",
            LeafEffect::ReturnFromGraveyard { .. } => "return from graveyard",
            LeafEffect::LookAtTop { .. } => "look at top",
            LeafEffect::Custom { .. } => "custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let node = EffectNode::may(EffectNode::leaf(LeafEffect::DrawCards {
            player: PlayerRef::Controller,
            count: Amount::Fixed(1),
        }));

        match node {
            EffectNode::May { player, effect } => {
                assert_eq!(player, PlayerRef::Controller);
                assert!(matches!(*effect, EffectNode::Leaf(LeafEffect::DrawCards { .. })));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn test_may_suspend() {
        assert!(LeafEffect::Discard {
            player: PlayerRef::Controller,
            count: 1
        }
        .may_suspend());
        assert!(!LeafEffect::Tap { what: EntityRef::Source }.may_suspend());
    }

    #[test]
    fn test_tree_serialization() {
        let node = EffectNode::sequence([
            EffectNode::leaf(LeafEffect::GainLife {
                player: PlayerRef::Controller,
                amount: Amount::Fixed(3),
            }),
            EffectNode::for_each_player(
                PlayerScope::Opponents,
                EffectNode::leaf(LeafEffect::LoseLife {
                    player: PlayerRef::CurrentPlayer,
                    amount: Amount::Fixed(1),
                }),
            ),
        ]);
        let bytes = bincode::serialize(&node).unwrap();
        let restored: EffectNode = bincode::deserialize(&bytes).unwrap();
        assert_eq!(node, restored);
    }
}
