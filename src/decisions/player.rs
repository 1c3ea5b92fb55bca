//! Players answering decisions, and a driver that runs an effect tree to
//! the end by asking them.
//!
//! `PlayerInterface` is the seam between the rules core and whatever picks
//! answers: a UI, an AI, a network session, or a test script. The core
//! only needs responses that pass `DecisionValidator`.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{GameState, PlayerId};
use crate::effects::{EffectEngine, EffectNode, ExecutionContext, ExecutionResult, GameEvent};
use crate::error::{ExecutionError, ProtocolError};

use super::decision::{ChoiceShape, DecisionChoice, DecisionId, DecisionResponse, PlayerDecision};
use super::validator::{DecisionValidator, Validation};

/// What a player did when asked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionOutcome {
    Response(DecisionResponse),
    /// No answer could be produced (disconnect, timeout, exhausted script).
    Failure(String),
    Conceded,
}

/// Source of answers for one or more players.
pub trait PlayerInterface {
    fn request_decision(&mut self, state: &GameState, decision: &PlayerDecision) -> DecisionOutcome;
}

/// Answers from a fixed queue, in order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedPlayer {
    script: VecDeque<DecisionChoice>,
    asked: Vec<PlayerDecision>,
}

impl ScriptedPlayer {
    pub fn new(script: impl IntoIterator<Item = DecisionChoice>) -> Self {
        Self {
            script: script.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Decisions asked so far.
    #[must_use]
    pub fn asked(&self) -> &[PlayerDecision] {
        &self.asked
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PlayerInterface for ScriptedPlayer {
    fn request_decision(&mut self, _state: &GameState, decision: &PlayerDecision) -> DecisionOutcome {
        self.asked.push(decision.clone());
        match self.script.pop_front() {
            Some(choice) => DecisionOutcome::Response(DecisionResponse::new(decision.id, choice)),
            None => DecisionOutcome::Failure(format!("script has no answer for {}", decision.id)),
        }
    }
}

/// How a `FallbackPlayer` answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackStrategy {
    /// Say no to optional actions and select as little as allowed.
    #[default]
    Decline,
    /// Select the first options, at least one where allowed; say no.
    FirstOption,
    /// Say yes where the answer is legal and select as much as allowed.
    Accept,
}

/// Answers every decision by a fixed strategy, without looking at the game.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackPlayer {
    pub strategy: FallbackStrategy,
}

impl FallbackPlayer {
    pub fn new(strategy: FallbackStrategy) -> Self {
        Self { strategy }
    }

    fn choose(&self, state: &GameState, decision: &PlayerDecision) -> DecisionChoice {
        let context = &decision.context;
        let (min, max) = context.selection_bounds().unwrap_or((0, 0));
        let count = match self.strategy {
            FallbackStrategy::Decline => min,
            FallbackStrategy::FirstOption => min.max(1).min(max),
            FallbackStrategy::Accept => max,
        };

        match context.shape() {
            ChoiceShape::Entities => DecisionChoice::Entities(context.options().iter().copied().take(count).collect()),
            ChoiceShape::Modes => DecisionChoice::Modes((0..count).collect()),
            ChoiceShape::YesNo => {
                let yes = DecisionChoice::YesNo(true);
                let accepted = self.strategy == FallbackStrategy::Accept
                    && DecisionValidator::validate(state, decision, &DecisionResponse::new(decision.id, yes.clone()))
                        .is_valid();
                if accepted {
                    yes
                } else {
                    DecisionChoice::YesNo(false)
                }
            }
        }
    }
}

impl PlayerInterface for FallbackPlayer {
    fn request_decision(&mut self, state: &GameState, decision: &PlayerDecision) -> DecisionOutcome {
        DecisionOutcome::Response(DecisionResponse::new(decision.id, self.choose(state, decision)))
    }
}

/// How a driven execution ended.
#[derive(Clone, Debug)]
pub enum DriveOutcome {
    Completed {
        state: GameState,
        events: Vec<GameEvent>,
    },
    Failed {
        state: GameState,
        error: ExecutionError,
        events: Vec<GameEvent>,
    },
    Conceded {
        state: GameState,
        player: PlayerId,
        events: Vec<GameEvent>,
    },
}

impl DriveOutcome {
    #[must_use]
    pub fn state(&self) -> &GameState {
        match self {
            DriveOutcome::Completed { state, .. }
            | DriveOutcome::Failed { state, .. }
            | DriveOutcome::Conceded { state, .. } => state,
        }
    }

    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        match self {
            DriveOutcome::Completed { events, .. }
            | DriveOutcome::Failed { events, .. }
            | DriveOutcome::Conceded { events, .. } => events,
        }
    }
}

/// Driver failures that are not rules outcomes.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DriveError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("{attempts} invalid response(s) to {decision}")]
    TooManyInvalidResponses { decision: DecisionId, attempts: u32 },

    #[error("Player could not answer {decision}: {reason}")]
    PlayerFailure { decision: DecisionId, reason: String },
}

/// Execute `node` and answer every decision it raises through `player`
/// until it finishes.
///
/// Invalid responses are re-asked up to `max_attempts` times per decision.
/// Events from every step are collected in order.
pub fn run_to_completion(
    engine: &mut EffectEngine,
    state: &GameState,
    node: &EffectNode,
    ctx: ExecutionContext,
    player: &mut dyn PlayerInterface,
    max_attempts: u32,
) -> Result<DriveOutcome, DriveError> {
    let max_attempts = max_attempts.max(1);
    let mut events = Vec::new();
    let mut result = engine.execute(state, node, ctx)?;

    loop {
        let (state, decision) = match result {
            ExecutionResult::Success { state, events: produced } => {
                events.extend(produced);
                return Ok(DriveOutcome::Completed { state, events });
            }
            ExecutionResult::Error { state, error } => {
                return Ok(DriveOutcome::Failed { state, error, events });
            }
            ExecutionResult::Paused {
                state,
                decision,
                events: produced,
            } => {
                events.extend(produced);
                (state, decision)
            }
        };

        let mut attempts = 0;
        result = loop {
            attempts += 1;
            match player.request_decision(&state, &decision) {
                DecisionOutcome::Response(response) => {
                    match DecisionValidator::validate(&state, &decision, &response) {
                        Validation::Valid => break engine.resume(&state, response)?,
                        Validation::Invalid(reason) => {
                            warn!(id = %decision.id, attempts, %reason, "invalid response");
                            if attempts >= max_attempts {
                                return Err(DriveError::TooManyInvalidResponses {
                                    decision: decision.id,
                                    attempts,
                                });
                            }
                        }
                    }
                }
                DecisionOutcome::Failure(reason) => {
                    return Err(DriveError::PlayerFailure {
                        decision: decision.id,
                        reason,
                    });
                }
                DecisionOutcome::Conceded => {
                    debug!(player = %decision.player, "conceded");
                    return Ok(DriveOutcome::Conceded {
                        state,
                        player: decision.player,
                        events,
                    });
                }
            }
        };
    }
}
