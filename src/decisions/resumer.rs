//! Applying an answer to the frame that asked for it.
//!
//! Each decision context pairs with exactly one frame kind. Leaf decisions
//! re-read zones from the current state: a card that left the zone it was
//! offered from since the question was asked is skipped.

use crate::core::{EntityId, GameState};
use crate::effects::composite::{pay_and_run, repeat, run_chosen_modes};
use crate::effects::leaf::{discard, move_card, rest_destination, sacrifice};
use crate::effects::{Continuation, Dispatch, ExecutionContext, Flow, GameEvent, RepeatPhase};
use crate::error::ProtocolError;
use crate::zones::{ZoneKey, ZonePosition};

use super::decision::{DecisionChoice, DecisionContext, PlayerDecision};

/// Continue `frame` with the answer to `decision`.
pub(crate) fn resume_frame(
    d: &mut dyn Dispatch,
    state: GameState,
    frame: Continuation,
    decision: PlayerDecision,
    choice: DecisionChoice,
) -> Result<Flow, ProtocolError> {
    match frame {
        Continuation::AwaitLeaf { context } => resume_leaf(d, state, context, decision, choice),
        Continuation::ModeChoice { player, modes, context }
            if matches!(decision.context, DecisionContext::ChooseModes { .. }) =>
        {
            let chosen = modes_of(choice)?;
            run_chosen_modes(d, state, player, &modes, chosen, context)
        }
        Continuation::May { effect, context } if decision.context == DecisionContext::MayChoice => {
            if yes_of(choice)? {
                d.run(state, &effect, context)
            } else {
                Ok(Flow::done(state, context))
            }
        }
        Continuation::MayPayCost {
            player,
            cost,
            effect,
            context,
        } if matches!(decision.context, DecisionContext::MayPayCost { .. }) => {
            if yes_of(choice)? {
                pay_and_run(d, state, player, &cost, &effect, context)
            } else {
                Ok(Flow::done(state, context))
            }
        }
        Continuation::RepeatWhile {
            body,
            condition,
            phase: RepeatPhase::AwaitingChoice,
            iterations,
            max,
            context,
        } if matches!(decision.context, DecisionContext::RepeatChoice { .. }) => {
            if yes_of(choice)? {
                repeat(d, state, &body, &condition, iterations, max, context, true)
            } else {
                Ok(Flow::done(state, context))
            }
        }
        frame => Err(ProtocolError::CorruptContinuation(format!(
            "{} frame cannot take a {} answer",
            frame.kind(),
            decision.context.kind()
        ))),
    }
}

fn resume_leaf(
    d: &mut dyn Dispatch,
    mut state: GameState,
    mut ctx: ExecutionContext,
    decision: PlayerDecision,
    choice: DecisionChoice,
) -> Result<Flow, ProtocolError> {
    let player = decision.player;
    let mut events: Vec<GameEvent> = Vec::new();

    match decision.context {
        DecisionContext::SearchLibrary {
            destination,
            shuffle,
            store_as,
            ..
        } => {
            let mut found = Vec::new();
            for id in entities_of(choice)? {
                if !state.zones().is_in_zone(id, ZoneKey::library(player)) {
                    continue;
                }
                found.extend(move_card(&mut state, id, destination, ZonePosition::Top, &mut events));
            }
            if shuffle {
                state.shuffle_library(player);
                events.push(GameEvent::LibraryShuffled { player });
            }
            if let Some(key) = store_as {
                ctx.store(key, found);
            }
        }

        DecisionContext::Discard { .. } | DecisionContext::CleanupDiscard { .. } => {
            let chosen = entities_of(choice)?;
            discard(&mut state, player, &chosen, &mut events);
        }

        DecisionContext::SacrificeUnless { permanent, cost } => {
            if yes_of(choice)? && cost.can_pay(&state, player, Some(permanent)) {
                let before = state.clone();
                match cost.pay(&mut state, player, Some(permanent)) {
                    Ok(paid) => events.extend(paid),
                    Err(error) => return Ok(Flow::failed(before, error)),
                }
            } else {
                sacrifice(&mut state, permanent, &mut events);
            }
        }

        DecisionContext::ChooseTargets { store_as, .. } => {
            let chosen = entities_of(choice)?;
            if let Some(key) = store_as {
                ctx.store(key, chosen.clone());
            }
            ctx.targets = chosen;
        }

        DecisionContext::ReturnFromGraveyard { destination, .. } => {
            for id in entities_of(choice)? {
                if state.zones().is_in_zone(id, ZoneKey::graveyard(player)) {
                    move_card(&mut state, id, destination, ZonePosition::Top, &mut events);
                }
            }
        }

        DecisionContext::LookAtTop {
            cards, take_to, rest, ..
        } => {
            let chosen = entities_of(choice)?;
            let library = ZoneKey::library(player);
            let (rest_zone, rest_position) = rest_destination(rest);
            for &id in &chosen {
                if state.zones().is_in_zone(id, library) {
                    move_card(&mut state, id, take_to, ZonePosition::Top, &mut events);
                }
            }
            for id in cards.into_iter().filter(|id| !chosen.contains(id)) {
                if state.zones().is_in_zone(id, library) {
                    move_card(&mut state, id, rest_zone, rest_position, &mut events);
                }
            }
        }

        DecisionContext::Custom { handler, payload, .. } => {
            let chosen = entities_of(choice)?;
            let h = d
                .handlers()
                .get(&handler)
                .ok_or_else(|| ProtocolError::UnregisteredHandler(handler.clone()))?;
            let before = state.clone();
            return Ok(match h.resume(state, &payload, &chosen, ctx, d.cache()) {
                Ok(outcome) => outcome.into_flow(),
                Err(error) => Flow::failed(before, error),
            });
        }

        other @ (DecisionContext::ChooseModes { .. }
        | DecisionContext::MayChoice
        | DecisionContext::MayPayCost { .. }
        | DecisionContext::RepeatChoice { .. }) => {
            return Err(ProtocolError::CorruptContinuation(format!(
                "leaf frame cannot take a {} answer",
                other.kind()
            )));
        }
    }

    Ok(Flow::Done { state, ctx, events })
}

fn entities_of(choice: DecisionChoice) -> Result<Vec<EntityId>, ProtocolError> {
    match choice {
        DecisionChoice::Entities(ids) => Ok(ids),
        other => Err(shape_mismatch("entity selection", &other)),
    }
}

fn yes_of(choice: DecisionChoice) -> Result<bool, ProtocolError> {
    match choice {
        DecisionChoice::YesNo(yes) => Ok(yes),
        other => Err(shape_mismatch("yes/no", &other)),
    }
}

fn modes_of(choice: DecisionChoice) -> Result<Vec<usize>, ProtocolError> {
    match choice {
        DecisionChoice::Modes(modes) => Ok(modes),
        other => Err(shape_mismatch("mode selection", &other)),
    }
}

fn shape_mismatch(expected: &str, got: &DecisionChoice) -> ProtocolError {
    ProtocolError::ResponseShapeMismatch(format!("expected {expected}, got {}", got.shape()))
}
