//! Effect execution engine.
//!
//! `EffectEngine::execute` walks an effect tree against a cloned state.
//! The walk ends in one of three ways:
//!
//! - every node finished: `ExecutionResult::Success`
//! - a node needs a player's answer: `ExecutionResult::Paused`, with the
//!   question in the state's pending decision and the rest of the tree in
//!   its continuation stack
//! - a node raised a rules error: `ExecutionResult::Error`
//!
//! `EffectEngine::resume` answers the pending decision and keeps going from
//! the continuation stack. Nothing else links the two calls, so a paused
//! state can be serialized, stored, and resumed by a different engine.
//!
//! The engine owns one `ProjectionCache`; an engine is meant to be used by
//! one worker at a time.

use tracing::{debug, warn};

use super::composite;
use super::context::ExecutionContext;
use super::continuation::Continuation;
use super::events::GameEvent;
use super::handlers::{EffectHandler, EffectHandlerRegistry};
use super::leaf::{self, LeafOutcome};
use super::node::{EffectNode, LeafEffect};
use crate::core::{GameConfig, GameState};
use crate::decisions::{resumer, DecisionRequest, DecisionResponse, DecisionValidator, PlayerDecision, Validation};
use crate::error::{ExecutionError, ProtocolError};
use crate::layers::ProjectionCache;

/// How far one node got.
#[derive(Clone, Debug)]
pub enum Flow {
    /// Finished; `ctx` is the context later siblings run with.
    Done {
        state: GameState,
        ctx: ExecutionContext,
        events: Vec<GameEvent>,
    },
    /// Stopped for a decision. The state carries it and the frames needed
    /// to continue.
    Paused {
        state: GameState,
        events: Vec<GameEvent>,
    },
    /// A rules error. The state is as it was when the failing leaf started.
    Failed { state: GameState, error: ExecutionError },
}

impl Flow {
    pub fn done(state: GameState, ctx: ExecutionContext) -> Self {
        Flow::Done {
            state,
            ctx,
            events: Vec::new(),
        }
    }

    pub fn failed(state: GameState, error: ExecutionError) -> Self {
        Flow::Failed { state, error }
    }

    /// Stop for a decision: allocate its id, push `frame` and record the
    /// decision on the state.
    pub fn pause(
        mut state: GameState,
        request: DecisionRequest,
        frame: Continuation,
        events: Vec<GameEvent>,
    ) -> Self {
        let id = state.next_decision_id();
        debug!(%id, player = %request.player, kind = request.context.kind(), frame = frame.kind(), "paused");
        state.push_continuation(frame);
        state.set_pending_decision(request.into_decision(id));
        Flow::Paused { state, events }
    }

    /// Put events produced before this flow in front of its own.
    #[must_use]
    pub fn with_prior(self, mut prior: Vec<GameEvent>) -> Self {
        if prior.is_empty() {
            return self;
        }
        match self {
            Flow::Done { state, ctx, events } => {
                prior.extend(events);
                Flow::Done {
                    state,
                    ctx,
                    events: prior,
                }
            }
            Flow::Paused { state, events } => {
                prior.extend(events);
                Flow::Paused { state, events: prior }
            }
            failed @ Flow::Failed { .. } => failed,
        }
    }
}

impl LeafOutcome {
    pub(crate) fn into_flow(self) -> Flow {
        match self {
            LeafOutcome::Done { state, ctx, events } => Flow::Done { state, ctx, events },
            LeafOutcome::Suspend {
                state,
                ctx,
                events,
                request,
            } => Flow::pause(state, request, Continuation::AwaitLeaf { context: ctx }, events),
        }
    }
}

/// What composites need from whoever runs them.
///
/// Composites only run children and read the cache through this trait, so
/// they never depend on the engine type.
pub trait Dispatch {
    /// Run one node.
    fn run(&mut self, state: GameState, node: &EffectNode, ctx: ExecutionContext) -> Result<Flow, ProtocolError>;

    fn cache(&mut self) -> &mut ProjectionCache;

    fn handlers(&self) -> &EffectHandlerRegistry;

    /// Default cap for repeat loops without their own.
    fn max_loop_iterations(&self) -> u32;
}

/// Final result of `execute` or `resume`.
#[derive(Clone, Debug)]
pub enum ExecutionResult {
    Success {
        state: GameState,
        events: Vec<GameEvent>,
    },
    Paused {
        state: GameState,
        decision: PlayerDecision,
        events: Vec<GameEvent>,
    },
    Error { state: GameState, error: ExecutionError },
}

impl ExecutionResult {
    #[must_use]
    pub fn state(&self) -> &GameState {
        match self {
            ExecutionResult::Success { state, .. }
            | ExecutionResult::Paused { state, .. }
            | ExecutionResult::Error { state, .. } => state,
        }
    }

    #[must_use]
    pub fn into_state(self) -> GameState {
        match self {
            ExecutionResult::Success { state, .. }
            | ExecutionResult::Paused { state, .. }
            | ExecutionResult::Error { state, .. } => state,
        }
    }

    /// Events of this call (none for an error).
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        match self {
            ExecutionResult::Success { events, .. } | ExecutionResult::Paused { events, .. } => events,
            ExecutionResult::Error { .. } => &[],
        }
    }

    #[must_use]
    pub fn decision(&self) -> Option<&PlayerDecision> {
        match self {
            ExecutionResult::Paused { decision, .. } => Some(decision),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self, ExecutionResult::Paused { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExecutionError> {
        match self {
            ExecutionResult::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Runs effect trees and resumes them after decisions.
#[derive(Debug)]
pub struct EffectEngine {
    cache: ProjectionCache,
    handlers: EffectHandlerRegistry,
    max_loop_iterations: u32,
}

impl EffectEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            cache: ProjectionCache::from_config(config),
            handlers: EffectHandlerRegistry::new(),
            max_loop_iterations: config.max_loop_iterations,
        }
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: EffectHandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn register_handler(&mut self, name: impl Into<String>, handler: impl EffectHandler + 'static) {
        self.handlers.register(name, handler);
    }

    /// The engine's projection cache.
    pub fn cache_mut(&mut self) -> &mut ProjectionCache {
        &mut self.cache
    }

    /// Run an effect tree.
    ///
    /// Fails with `DecisionAlreadyPending` if `state` is waiting on a
    /// decision; answer it with `resume` first.
    pub fn execute(
        &mut self,
        state: &GameState,
        node: &EffectNode,
        ctx: ExecutionContext,
    ) -> Result<ExecutionResult, ProtocolError> {
        if state.is_suspended() || !state.continuations().is_empty() {
            warn!(
                decision = ?state.pending_decision().map(|d| d.id),
                "execute called on a suspended state"
            );
            return Err(ProtocolError::DecisionAlreadyPending);
        }

        let flow = self.run(state.clone(), node, ctx)?;
        self.finish(flow)
    }

    /// Answer the pending decision and continue.
    ///
    /// The response is checked before anything changes: its id must match,
    /// its shape must fit the decision, and it must pass
    /// `DecisionValidator`. On any of these failures `state` is untouched
    /// and the same decision can be answered again.
    pub fn resume(
        &mut self,
        state: &GameState,
        response: DecisionResponse,
    ) -> Result<ExecutionResult, ProtocolError> {
        let pending = state.pending_decision().ok_or(ProtocolError::NoPendingDecision)?;
        if pending.id != response.decision_id {
            warn!(expected = %pending.id, got = %response.decision_id, "decision id mismatch");
            return Err(ProtocolError::DecisionIdMismatch {
                expected: pending.id,
                got: response.decision_id,
            });
        }
        let expected = pending.context.shape();
        if response.choice.shape() != expected {
            warn!(id = %pending.id, %expected, got = %response.choice.shape(), "response shape mismatch");
            return Err(ProtocolError::ResponseShapeMismatch(format!(
                "{} decision expects {expected}, got {}",
                pending.context.kind(),
                response.choice.shape()
            )));
        }
        if let Validation::Invalid(reason) = DecisionValidator::validate(state, pending, &response) {
            warn!(id = %pending.id, %reason, "invalid response");
            return Err(ProtocolError::InvalidResponse(reason));
        }

        let mut state = state.clone();
        let decision = state
            .take_pending_decision()
            .ok_or(ProtocolError::NoPendingDecision)?;
        let frame = state.pop_continuation().ok_or_else(|| {
            ProtocolError::CorruptContinuation(format!("no frame waiting on {}", decision.id))
        })?;
        debug!(id = %decision.id, kind = decision.context.kind(), frame = frame.kind(), "resuming");

        let flow = resumer::resume_frame(self, state, frame, decision, response.choice)?;
        let flow = self.unwind(flow)?;
        self.finish(flow)
    }

    /// Pop and continue frames for as long as the node below them finishes.
    fn unwind(&mut self, mut flow: Flow) -> Result<Flow, ProtocolError> {
        loop {
            let Flow::Done { mut state, ctx, events } = flow else {
                return Ok(flow);
            };
            let Some(frame) = state.pop_continuation() else {
                return Ok(Flow::Done { state, ctx, events });
            };
            flow = composite::continue_frame(self, state, frame, ctx)?.with_prior(events);
        }
    }

    fn finish(&mut self, flow: Flow) -> Result<ExecutionResult, ProtocolError> {
        match flow {
            Flow::Done { state, events, .. } => {
                if !state.continuations().is_empty() {
                    return Err(ProtocolError::CorruptContinuation(format!(
                        "{} frame(s) left after completion",
                        state.continuations().len()
                    )));
                }
                Ok(ExecutionResult::Success { state, events })
            }
            Flow::Paused { state, events } => {
                let decision = state.pending_decision().cloned().ok_or_else(|| {
                    ProtocolError::CorruptContinuation("paused without a pending decision".into())
                })?;
                Ok(ExecutionResult::Paused { state, decision, events })
            }
            Flow::Failed { mut state, error } => {
                debug!(%error, "effect failed");
                state.truncate_continuations(0);
                if state.is_suspended() {
                    state.take_pending_decision();
                }
                Ok(ExecutionResult::Error { state, error })
            }
        }
    }

    fn run_leaf(&mut self, state: GameState, effect: &LeafEffect, ctx: ExecutionContext) -> Result<Flow, ProtocolError> {
        let before = state.clone();
        let outcome = match effect {
            LeafEffect::Custom { handler, args } => {
                let Some(h) = self.handlers.get(handler) else {
                    warn!(%handler, "unregistered effect handler");
                    return Err(ProtocolError::UnregisteredHandler(handler.clone()));
                };
                h.execute(state, args, ctx, &mut self.cache)
            }
            _ => leaf::execute(state, effect, ctx, &mut self.cache),
        };

        Ok(match outcome {
            Ok(outcome) => outcome.into_flow(),
            Err(error) => Flow::failed(before, error),
        })
    }
}

impl Dispatch for EffectEngine {
    fn run(&mut self, state: GameState, node: &EffectNode, ctx: ExecutionContext) -> Result<Flow, ProtocolError> {
        match node {
            EffectNode::Leaf(effect) => self.run_leaf(state, effect, ctx),
            _ => composite::run_composite(self, state, node, ctx),
        }
    }

    fn cache(&mut self) -> &mut ProjectionCache {
        &mut self.cache
    }

    fn handlers(&self) -> &EffectHandlerRegistry {
        &self.handlers
    }

    fn max_loop_iterations(&self) -> u32 {
        self.max_loop_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::{EntityId, PlayerId};
    use crate::effects::node::{Amount, EntityRef, PlayerRef, Recipient};
    use crate::zones::ZoneType;

    fn bolt(amount: i64) -> EffectNode {
        EffectNode::leaf(LeafEffect::DealDamage {
            to: Recipient::Player(PlayerRef::Opponent),
            amount: Amount::Fixed(amount),
        })
    }

    #[test]
    fn test_execute_leaf() {
        let config = GameConfig::default();
        let state = GameState::new(&config);
        let mut engine = EffectEngine::new(&config);

        let result = engine
            .execute(&state, &bolt(3), ExecutionContext::new(PlayerId::new(0)))
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.state().life(PlayerId::new(1)), 17);
        assert_eq!(state.life(PlayerId::new(1)), 20);
        assert_eq!(result.events().len(), 1);
    }

    #[test]
    fn test_execute_rejects_suspended_state() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        let p0 = PlayerId::new(0);
        for name in ["A", "B"] {
            state.create_card(p0, Characteristics::new(name), ZoneType::Hand);
        }
        let discard = EffectNode::leaf(LeafEffect::Discard {
            player: PlayerRef::Controller,
            count: 1,
        });
        let mut engine = EffectEngine::new(&config);

        let paused = engine.execute(&state, &discard, ExecutionContext::new(p0)).unwrap();
        assert!(paused.is_paused());

        let err = engine
            .execute(paused.state(), &bolt(1), ExecutionContext::new(p0))
            .unwrap_err();
        assert_eq!(err, ProtocolError::DecisionAlreadyPending);
    }

    #[test]
    fn test_error_keeps_earlier_effects() {
        let config = GameConfig::default();
        let state = GameState::new(&config);
        let mut engine = EffectEngine::new(&config);
        let tree = EffectNode::sequence([
            bolt(2),
            EffectNode::leaf(LeafEffect::Tap { what: EntityRef::Source }),
            bolt(5),
        ]);

        let result = engine
            .execute(&state, &tree, ExecutionContext::new(PlayerId::new(0)))
            .unwrap();

        assert_eq!(result.error(), Some(&ExecutionError::MissingBinding("source".into())));
        assert_eq!(result.state().life(PlayerId::new(1)), 18);
        assert!(!result.state().is_suspended());
    }

    #[test]
    fn test_unregistered_handler() {
        let config = GameConfig::default();
        let state = GameState::new(&config);
        let mut engine = EffectEngine::new(&config);
        let node = EffectNode::leaf(LeafEffect::Custom {
            handler: "proliferate".into(),
            args: Default::default(),
        });

        let err = engine
            .execute(&state, &node, ExecutionContext::new(PlayerId::new(0)))
            .unwrap_err();
        assert_eq!(err, ProtocolError::UnregisteredHandler("proliferate".into()));
    }

    #[test]
    fn test_resume_checks_id() {
        let config = GameConfig::default();
        let mut state = GameState::new(&config);
        let p0 = PlayerId::new(0);
        let cards: Vec<EntityId> = ["A", "B"]
            .into_iter()
            .map(|n| state.create_card(p0, Characteristics::new(n), ZoneType::Hand))
            .collect();
        let mut engine = EffectEngine::new(&config);
        let discard = EffectNode::leaf(LeafEffect::Discard {
            player: PlayerRef::Controller,
            count: 1,
        });

        let paused = engine.execute(&state, &discard, ExecutionContext::new(p0)).unwrap();
        let id = paused.decision().unwrap().id;
        let wrong = crate::decisions::DecisionId(id.0 + 1);

        let err = engine
            .resume(paused.state(), DecisionResponse::entities(wrong, [cards[0]]))
            .unwrap_err();
        assert_eq!(err, ProtocolError::DecisionIdMismatch { expected: id, got: wrong });

        let err = engine
            .resume(paused.state(), DecisionResponse::yes_no(id, true))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ResponseShapeMismatch(_)));

        let done = engine
            .resume(paused.state(), DecisionResponse::entities(id, [cards[0]]))
            .unwrap();
        assert!(done.is_success());
        assert_eq!(done.state().cards_in(p0, ZoneType::Hand).len(), 1);
        assert!(done.state().continuations().is_empty());
    }
}
