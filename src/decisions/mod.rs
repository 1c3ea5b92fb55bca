//! Player decisions: what a suspended execution asks, how answers are
//! checked, and how they are applied.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --(effect needs input)--> Suspended(decision, frames) --(valid answer)--> Idle
//! ```
//!
//! - `PlayerDecision`: the question, stored in `GameState`
//! - `DecisionResponse`: the answer, checked by `DecisionValidator`
//! - `EffectEngine::resume`: clears the decision and continues the frames
//! - `PlayerInterface` / `run_to_completion`: asking players in a loop

pub mod decision;
pub mod player;
pub(crate) mod resumer;
pub mod validator;

pub use decision::{
    ChoiceShape, DecisionChoice, DecisionContext, DecisionId, DecisionRequest, DecisionResponse, PlayerDecision,
};
pub use player::{
    run_to_completion, DecisionOutcome, DriveError, DriveOutcome, FallbackPlayer, FallbackStrategy, PlayerInterface,
    ScriptedPlayer,
};
pub use validator::{DecisionValidator, Validation};
