//! Composite nodes: control flow over child nodes.
//!
//! Every composite threads the state through its children and collects
//! their events in order. When a child pauses, the composite records a
//! frame for the work it still has left *below* the frames the child
//! pushed, then passes the pause up unchanged. A failed child ends the
//! composite at once; later children never run.
//!
//! Loops snapshot what they iterate over before the first iteration, so
//! entities removed by an earlier iteration are still visited.

use tracing::trace;

use super::context::ExecutionContext;
use super::continuation::{Continuation, LoopBinding, RepeatPhase};
use super::cost::Cost;
use super::engine::{Dispatch, Flow};
use super::events::GameEvent;
use super::node::{Condition, EffectNode, Mode, PlayerRef, PlayerScope, RepeatCondition};
use crate::core::{GameState, PlayerId};
use crate::decisions::{DecisionContext, DecisionRequest};
use crate::error::{ExecutionError, ProtocolError};
use crate::layers::EntityFilter;

/// Run any non-leaf node.
pub(crate) fn run_composite(
    d: &mut dyn Dispatch,
    state: GameState,
    node: &EffectNode,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    match node {
        EffectNode::Sequence(children) => run_sequence(d, state, children, ctx),
        EffectNode::Conditional {
            condition,
            then,
            otherwise,
        } => run_conditional(d, state, condition, then, otherwise.as_deref(), ctx),
        EffectNode::ForEachTarget { body } => {
            let bindings: Vec<LoopBinding> = ctx.targets.iter().map(|&t| LoopBinding::Target(t)).collect();
            run_for_each(d, state, body, &bindings, ctx)
        }
        EffectNode::ForEachPlayer { scope, body } => {
            let bindings = player_bindings(&state, *scope, ctx.controller);
            run_for_each(d, state, body, &bindings, ctx)
        }
        EffectNode::ForEachMatching { filter, body } => {
            let bindings = matching_bindings(d, &state, filter, &ctx);
            run_for_each(d, state, body, &bindings, ctx)
        }
        EffectNode::Modal {
            player,
            modes,
            min,
            max,
        } => run_modal(d, state, *player, modes, *min, *max, ctx),
        EffectNode::May { player, effect } => ask_may(state, *player, effect, ctx),
        EffectNode::MayPayCost { player, cost, effect } => ask_may_pay(state, *player, cost, effect, ctx),
        EffectNode::RepeatWhile {
            body,
            condition,
            max_iterations,
        } => {
            let max = max_iterations.unwrap_or_else(|| d.max_loop_iterations()).max(1);
            repeat(d, state, body, condition, 0, max, ctx, true)
        }
        EffectNode::FlipCoin { heads, tails } => run_flip_coin(d, state, heads, tails.as_deref(), ctx),
        EffectNode::Leaf(_) => d.run(state, node, ctx),
    }
}

/// Continue a frame after the node above it finished with `ctx`.
pub(crate) fn continue_frame(
    d: &mut dyn Dispatch,
    state: GameState,
    frame: Continuation,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    trace!(frame = frame.kind(), "continuing");
    match frame {
        Continuation::Sequence { remaining } => run_sequence(d, state, &remaining, ctx),
        Continuation::ForEach {
            body,
            remaining,
            context,
        } => run_for_each(d, state, &body, &remaining, context),
        Continuation::RepeatWhile {
            body,
            condition,
            phase: RepeatPhase::AfterBody,
            iterations,
            max,
            ..
        } => repeat(d, state, &body, &condition, iterations, max, ctx, false),
        other => Err(ProtocolError::CorruptContinuation(format!(
            "{} frame reached without its decision",
            other.kind()
        ))),
    }
}

/// Run children in order, threading the context.
pub(crate) fn run_sequence(
    d: &mut dyn Dispatch,
    mut state: GameState,
    children: &[EffectNode],
    mut ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let mut events = Vec::new();

    for (i, child) in children.iter().enumerate() {
        let depth = state.continuations().len();
        match d.run(state, child, ctx)? {
            Flow::Done {
                state: next,
                ctx: next_ctx,
                events: produced,
            } => {
                state = next;
                ctx = next_ctx;
                events.extend(produced);
            }
            Flow::Paused {
                state: mut paused,
                events: produced,
            } => {
                let remaining = &children[i + 1..];
                if !remaining.is_empty() {
                    paused.insert_continuation(
                        depth,
                        Continuation::Sequence {
                            remaining: remaining.to_vec(),
                        },
                    );
                }
                return Ok(Flow::Paused {
                    state: paused,
                    events: produced,
                }
                .with_prior(events));
            }
            failed @ Flow::Failed { .. } => return Ok(failed),
        }
    }

    Ok(Flow::Done { state, ctx, events })
}

fn run_conditional(
    d: &mut dyn Dispatch,
    state: GameState,
    condition: &Condition,
    then: &EffectNode,
    otherwise: Option<&EffectNode>,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    match ctx.evaluate(&state, d.cache(), condition) {
        Ok(true) => d.run(state, then, ctx),
        Ok(false) => match otherwise {
            Some(node) => d.run(state, node, ctx),
            None => Ok(Flow::done(state, ctx)),
        },
        Err(error) => Ok(Flow::failed(state, error)),
    }
}

/// Run `body` once per binding. Finishes with the loop's own context.
pub(crate) fn run_for_each(
    d: &mut dyn Dispatch,
    mut state: GameState,
    body: &EffectNode,
    bindings: &[LoopBinding],
    base: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let mut events = Vec::new();

    for (i, binding) in bindings.iter().enumerate() {
        let depth = state.continuations().len();
        match d.run(state, body, binding.bind(&base))? {
            Flow::Done {
                state: next,
                events: produced,
                ..
            } => {
                state = next;
                events.extend(produced);
            }
            Flow::Paused {
                state: mut paused,
                events: produced,
            } => {
                paused.insert_continuation(
                    depth,
                    Continuation::ForEach {
                        body: body.clone(),
                        remaining: bindings[i + 1..].to_vec(),
                        context: base,
                    },
                );
                return Ok(Flow::Paused {
                    state: paused,
                    events: produced,
                }
                .with_prior(events));
            }
            failed @ Flow::Failed { .. } => return Ok(failed),
        }
    }

    Ok(Flow::Done {
        state,
        ctx: base,
        events,
    })
}

/// Players for a per-player loop, in turn order from the controller.
fn player_bindings(state: &GameState, scope: PlayerScope, controller: PlayerId) -> Vec<LoopBinding> {
    let players = match scope {
        PlayerScope::All => controller
            .turn_order(state.player_count())
            .filter(|&p| state.player(p).is_some_and(|s| !s.has_lost))
            .collect(),
        PlayerScope::Opponents => state.opponents(controller),
    };
    players.into_iter().map(LoopBinding::Player).collect()
}

fn matching_bindings(
    d: &mut dyn Dispatch,
    state: &GameState,
    filter: &EntityFilter,
    ctx: &ExecutionContext,
) -> Vec<LoopBinding> {
    let scope = ctx.scope();
    d.cache()
        .project_battlefield(state)
        .iter()
        .filter(|view| filter.matches(view, &scope))
        .map(|view| LoopBinding::Entity(view.id))
        .collect()
}

fn run_modal(
    d: &mut dyn Dispatch,
    state: GameState,
    player: PlayerRef,
    modes: &[Mode],
    min: usize,
    max: usize,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let player = match ctx.player(&state, player) {
        Ok(player) => player,
        Err(error) => return Ok(Flow::failed(state, error)),
    };
    if modes.is_empty() {
        return Ok(Flow::done(state, ctx));
    }

    let max = max.clamp(1, modes.len());
    let min = min.min(max);
    let bodies: Vec<EffectNode> = modes.iter().map(|m| m.effect.clone()).collect();
    if modes.len() <= min {
        return run_chosen_modes(d, state, player, &bodies, (0..modes.len()).collect(), ctx);
    }

    let request = DecisionRequest::new(
        player,
        if max == 1 { "Choose one".to_string() } else { format!("Choose up to {max}") },
        DecisionContext::ChooseModes {
            modes: modes.iter().map(|m| m.label.clone()).collect(),
            min,
            max,
        },
    );
    let frame = Continuation::ModeChoice {
        player,
        modes: bodies,
        context: ctx,
    };
    Ok(Flow::pause(state, request, frame, Vec::new()))
}

/// Run the chosen modes in printed order.
pub(crate) fn run_chosen_modes(
    d: &mut dyn Dispatch,
    state: GameState,
    player: PlayerId,
    modes: &[EffectNode],
    mut chosen: Vec<usize>,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    chosen.sort_unstable();
    chosen.dedup();

    let events = chosen
        .iter()
        .map(|&index| GameEvent::ModeChosen { player, index })
        .collect();
    let bodies: Vec<EffectNode> = chosen.iter().filter_map(|&i| modes.get(i).cloned()).collect();

    Ok(run_sequence(d, state, &bodies, ctx)?.with_prior(events))
}

fn ask_may(
    state: GameState,
    player: PlayerRef,
    effect: &EffectNode,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let player = match ctx.player(&state, player) {
        Ok(player) => player,
        Err(error) => return Ok(Flow::failed(state, error)),
    };
    let request = DecisionRequest::new(player, "Do you want to?", DecisionContext::MayChoice);
    let frame = Continuation::May {
        effect: effect.clone(),
        context: ctx,
    };
    Ok(Flow::pause(state, request, frame, Vec::new()))
}

fn ask_may_pay(
    state: GameState,
    player: PlayerRef,
    cost: &Cost,
    effect: &EffectNode,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let player = match ctx.player(&state, player) {
        Ok(player) => player,
        Err(error) => return Ok(Flow::failed(state, error)),
    };
    if !cost.can_pay(&state, player, ctx.source) {
        return Ok(Flow::done(state, ctx));
    }

    let request = DecisionRequest::new(
        player,
        format!("Pay {cost:?}?"),
        DecisionContext::MayPayCost { cost: cost.clone() },
    );
    let frame = Continuation::MayPayCost {
        player,
        cost: cost.clone(),
        effect: effect.clone(),
        context: ctx,
    };
    Ok(Flow::pause(state, request, frame, Vec::new()))
}

/// Answer to a "may pay" question.
pub(crate) fn pay_and_run(
    d: &mut dyn Dispatch,
    mut state: GameState,
    player: PlayerId,
    cost: &Cost,
    effect: &EffectNode,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let before = state.clone();
    match cost.pay(&mut state, player, ctx.source) {
        Ok(paid) => Ok(d.run(state, effect, ctx)?.with_prior(paid)),
        Err(error) => Ok(Flow::failed(before, error)),
    }
}

/// A do-while loop. With `body_first` false, the body has just finished
/// and the loop starts at the condition check.
#[allow(clippy::too_many_arguments)]
pub(crate) fn repeat(
    d: &mut dyn Dispatch,
    mut state: GameState,
    body: &EffectNode,
    condition: &RepeatCondition,
    mut iterations: u32,
    max: u32,
    mut ctx: ExecutionContext,
    body_first: bool,
) -> Result<Flow, ProtocolError> {
    let mut events = Vec::new();
    let mut run_body = body_first;

    loop {
        if run_body {
            if iterations >= max {
                return Ok(Flow::failed(state, ExecutionError::IterationLimit(max)));
            }
            iterations += 1;
            let depth = state.continuations().len();
            match d.run(state, body, ctx.clone())? {
                Flow::Done {
                    state: next,
                    ctx: next_ctx,
                    events: produced,
                } => {
                    state = next;
                    ctx = next_ctx;
                    events.extend(produced);
                }
                Flow::Paused {
                    state: mut paused,
                    events: produced,
                } => {
                    paused.insert_continuation(
                        depth,
                        Continuation::RepeatWhile {
                            body: body.clone(),
                            condition: condition.clone(),
                            phase: RepeatPhase::AfterBody,
                            iterations,
                            max,
                            context: ctx,
                        },
                    );
                    return Ok(Flow::Paused {
                        state: paused,
                        events: produced,
                    }
                    .with_prior(events));
                }
                failed @ Flow::Failed { .. } => return Ok(failed),
            }
        }
        run_body = true;

        match condition {
            RepeatCondition::While(check) => match ctx.evaluate(&state, d.cache(), check) {
                Ok(true) => {}
                Ok(false) => return Ok(Flow::Done { state, ctx, events }),
                Err(error) => return Ok(Flow::failed(state, error)),
            },
            RepeatCondition::PlayerChooses(who) => {
                let player = match ctx.player(&state, *who) {
                    Ok(player) => player,
                    Err(error) => return Ok(Flow::failed(state, error)),
                };
                let request = DecisionRequest::new(
                    player,
                    "Repeat?",
                    DecisionContext::RepeatChoice { iterations },
                );
                let frame = Continuation::RepeatWhile {
                    body: body.clone(),
                    condition: condition.clone(),
                    phase: RepeatPhase::AwaitingChoice,
                    iterations,
                    max,
                    context: ctx,
                };
                return Ok(Flow::pause(state, request, frame, Vec::new()).with_prior(events));
            }
        }
    }
}

fn run_flip_coin(
    d: &mut dyn Dispatch,
    mut state: GameState,
    heads: &EffectNode,
    tails: Option<&EffectNode>,
    ctx: ExecutionContext,
) -> Result<Flow, ProtocolError> {
    let won = state.rng_mut().flip_coin();
    let flipped = GameEvent::CoinFlipped {
        player: ctx.controller,
        heads: won,
    };

    let branch = if won { Some(heads) } else { tails };
    let flow = match branch {
        Some(node) => d.run(state, node, ctx)?,
        None => Flow::done(state, ctx),
    };
    Ok(flow.with_prior(vec![flipped]))
}
