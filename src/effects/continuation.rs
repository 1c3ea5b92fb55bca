//! Continuation frames: the part of an effect tree still to run when
//! execution stops for a decision.
//!
//! Frames live on the state's continuation stack, innermost on top. The
//! frame on top always belongs to the node that asked the question; the
//! frames below it belong to the composites that were waiting on that node.
//! Everything here is plain data, so a suspended state serializes like any
//! other.

use serde::{Deserialize, Serialize};

use super::context::ExecutionContext;
use super::cost::Cost;
use super::node::{EffectNode, RepeatCondition};
use crate::core::{EntityId, PlayerId};

/// One suspended composite or leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Continuation {
    /// Siblings after the child that paused. Runs them with the context
    /// the child finishes with.
    Sequence { remaining: Vec<EffectNode> },

    /// Iterations not yet started. `context` is the loop's own context,
    /// which the loop hands back when it finishes.
    ForEach {
        body: EffectNode,
        remaining: Vec<LoopBinding>,
        context: ExecutionContext,
    },

    /// Waiting for mode indices.
    ModeChoice {
        player: PlayerId,
        modes: Vec<EffectNode>,
        context: ExecutionContext,
    },

    /// Waiting for yes/no on an optional effect.
    May {
        effect: EffectNode,
        context: ExecutionContext,
    },

    /// Waiting for yes/no on paying a cost.
    MayPayCost {
        player: PlayerId,
        cost: Cost,
        effect: EffectNode,
        context: ExecutionContext,
    },

    /// A do-while loop, either between iterations or waiting on whether to
    /// go again.
    RepeatWhile {
        body: EffectNode,
        condition: RepeatCondition,
        phase: RepeatPhase,
        iterations: u32,
        max: u32,
        context: ExecutionContext,
    },

    /// A leaf waiting for its decision. Holds the leaf's context so the
    /// answer can be applied to it.
    AwaitLeaf { context: ExecutionContext },
}

/// Where a suspended repeat loop stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatPhase {
    /// The body paused; check the condition once it finishes.
    AfterBody,
    /// Waiting on the player's "again?" answer.
    AwaitingChoice,
}

/// What one loop iteration binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopBinding {
    Entity(EntityId),
    Target(EntityId),
    Player(PlayerId),
}

impl LoopBinding {
    /// The iteration context derived from the loop's context.
    #[must_use]
    pub fn bind(self, base: &ExecutionContext) -> ExecutionContext {
        match self {
            LoopBinding::Entity(id) => base.for_entity(id),
            LoopBinding::Target(id) => base.for_target(id),
            LoopBinding::Player(player) => base.for_player(player),
        }
    }
}

impl Continuation {
    /// Short name for logs and error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Continuation::Sequence { .. } => "sequence",
            Continuation::ForEach { .. } => "for-each",
            Continuation::ModeChoice { .. } => "mode choice",
            Continuation::May { .. } => "may",
            Continuation::MayPayCost { .. } => "may pay",
            Continuation::RepeatWhile { .. } => "repeat",
            Continuation::AwaitLeaf { .. } => "leaf",
        }
    }

    /// Whether this frame is answered by a decision, as opposed to being
    /// resumed by the frame above it finishing.
    #[must_use]
    pub fn awaits_decision(&self) -> bool {
        match self {
            Continuation::ModeChoice { .. }
            | Continuation::May { .. }
            | Continuation::MayPayCost { .. }
            | Continuation::AwaitLeaf { .. } => true,
            Continuation::RepeatWhile { phase, .. } => *phase == RepeatPhase::AwaitingChoice,
            Continuation::Sequence { .. } | Continuation::ForEach { .. } => false,
        }
    }
}
