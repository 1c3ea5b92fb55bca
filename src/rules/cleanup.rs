//! Cleanup-step hand size check.

use tracing::debug;

use crate::core::{GameConfig, GameState, PlayerId};
use crate::decisions::{DecisionContext, DecisionRequest};
use crate::effects::{Continuation, ExecutionContext, ExecutionResult};
use crate::error::ProtocolError;
use crate::zones::ZoneType;

/// Ask `player` to discard down to the maximum hand size.
///
/// A hand within the limit is a plain `Success` with no events. Otherwise
/// the state comes back paused on a `CleanupDiscard` decision, answered
/// through `EffectEngine::resume` like any other.
pub fn request_cleanup_discard(
    state: &GameState,
    player: PlayerId,
    config: &GameConfig,
) -> Result<ExecutionResult, ProtocolError> {
    if state.is_suspended() || !state.continuations().is_empty() {
        return Err(ProtocolError::DecisionAlreadyPending);
    }

    let hand = state.cards_in(player, ZoneType::Hand);
    let excess = hand.len().saturating_sub(config.max_hand_size);
    if excess == 0 {
        return Ok(ExecutionResult::Success {
            state: state.clone(),
            events: Vec::new(),
        });
    }

    let mut next = state.clone();
    let id = next.next_decision_id();
    let decision = DecisionRequest::new(
        player,
        format!("Discard {excess} card(s) down to {}", config.max_hand_size),
        DecisionContext::CleanupDiscard {
            candidates: hand,
            count: excess,
        },
    )
    .into_decision(id);

    debug!(%id, %player, excess, "cleanup discard requested");
    next.push_continuation(Continuation::AwaitLeaf {
        context: ExecutionContext::new(player),
    });
    next.set_pending_decision(decision.clone());

    Ok(ExecutionResult::Paused {
        state: next,
        decision,
        events: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::decisions::DecisionResponse;
    use crate::effects::{EffectEngine, GameEvent};

    fn with_hand(config: &GameConfig, size: usize) -> (GameState, PlayerId) {
        let mut state = GameState::new(config);
        let p0 = PlayerId::new(0);
        for i in 0..size {
            state.create_card(p0, Characteristics::new(format!("Card {i}")), ZoneType::Hand);
        }
        (state, p0)
    }

    #[test]
    fn test_within_limit() {
        let config = GameConfig::default();
        let (state, p0) = with_hand(&config, 7);

        let result = request_cleanup_discard(&state, p0, &config).unwrap();
        assert!(result.is_success());
        assert!(result.events().is_empty());
    }

    #[test]
    fn test_discard_down_and_resume() {
        let config = GameConfig::default().with_max_hand_size(2);
        let (state, p0) = with_hand(&config, 4);

        let result = request_cleanup_discard(&state, p0, &config).unwrap();
        let decision = result.decision().cloned().unwrap();
        assert!(matches!(decision.context, DecisionContext::CleanupDiscard { count: 2, .. }));
        result.state().check_invariants().unwrap();

        let hand = result.state().cards_in(p0, ZoneType::Hand);
        let mut engine = EffectEngine::new(&config);
        let done = engine
            .resume(result.state(), DecisionResponse::entities(decision.id, [hand[0], hand[3]]))
            .unwrap();

        assert!(done.is_success());
        assert_eq!(done.state().cards_in(p0, ZoneType::Hand).len(), 2);
        assert_eq!(
            done.events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Discarded { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_refuses_suspended_state() {
        let config = GameConfig::default().with_max_hand_size(0);
        let (state, p0) = with_hand(&config, 1);
        let paused = request_cleanup_discard(&state, p0, &config).unwrap();

        assert_eq!(
            request_cleanup_discard(paused.state(), p0, &config).unwrap_err(),
            ProtocolError::DecisionAlreadyPending
        );
    }
}
