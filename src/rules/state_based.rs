//! State-based actions.
//!
//! Checked against the whole state, applied together, and repeated until a
//! check finds nothing. Every action removes something (a player, a
//! permanent, a pair of counters), so the loop ends.

use tracing::debug;

use crate::cards::Keyword;
use crate::core::{CounterKind, EntityId, GameState, PlayerId};
use crate::effects::leaf::move_card;
use crate::effects::GameEvent;
use crate::layers::ProjectionCache;
use crate::zones::{ZonePosition, ZoneType};

/// Why a player loses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoseReason {
    ZeroLife,
    DrewFromEmptyLibrary,
}

/// A state-based action waiting to be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateBasedAction {
    PlayerLoses { player: PlayerId, reason: LoseReason },
    /// Toughness 0 or less. Not destruction, so indestructible doesn't help.
    ZeroToughness(EntityId),
    /// Lethal damage, or any deathtouch damage.
    LethalDamage(EntityId),
    CountersAnnihilate { permanent: EntityId, count: u32 },
}

/// Every state-based action that applies to `state` right now.
pub fn check_state_based_actions(state: &GameState, cache: &mut ProjectionCache) -> Vec<StateBasedAction> {
    let mut actions = Vec::new();

    for (player, p) in state.players().iter() {
        if p.has_lost {
            continue;
        }
        if p.life <= 0 {
            actions.push(StateBasedAction::PlayerLoses {
                player,
                reason: LoseReason::ZeroLife,
            });
        } else if p.drew_from_empty {
            actions.push(StateBasedAction::PlayerLoses {
                player,
                reason: LoseReason::DrewFromEmptyLibrary,
            });
        }
    }

    for view in cache.project_battlefield(state) {
        let pairs = view
            .counters
            .get(&CounterKind::PlusOne)
            .min(view.counters.get(&CounterKind::MinusOne));
        if pairs > 0 {
            actions.push(StateBasedAction::CountersAnnihilate {
                permanent: view.id,
                count: pairs,
            });
        }

        if !view.is_creature() {
            continue;
        }
        if view.effective_toughness() <= 0 {
            actions.push(StateBasedAction::ZeroToughness(view.id));
            continue;
        }
        let lethal = view.damage > 0 && (view.deathtouch_damage || view.lethal_damage_remaining() == 0);
        if lethal && !view.has_keyword(Keyword::Indestructible) {
            actions.push(StateBasedAction::LethalDamage(view.id));
        }
    }

    actions
}

/// Apply state-based actions until none apply. Returns what happened.
pub fn apply_state_based_actions(state: &mut GameState, cache: &mut ProjectionCache) -> Vec<GameEvent> {
    let mut events = Vec::new();
    loop {
        let actions = check_state_based_actions(state, cache);
        if actions.is_empty() {
            return events;
        }
        debug!(count = actions.len(), "state-based actions");
        for action in actions {
            apply_action(state, action, &mut events);
        }
    }
}

fn apply_action(state: &mut GameState, action: StateBasedAction, events: &mut Vec<GameEvent>) {
    match action {
        StateBasedAction::PlayerLoses { player, reason } => {
            if state.mark_lost(player) {
                debug!(%player, ?reason, "player lost");
                events.push(GameEvent::PlayerLost { player });
            }
        }
        StateBasedAction::ZeroToughness(id) => {
            move_card(state, id, ZoneType::Graveyard, ZonePosition::Top, events);
        }
        StateBasedAction::LethalDamage(id) => {
            if state.zones().is_in_zone_type(id, ZoneType::Battlefield) {
                events.push(GameEvent::Destroyed { entity: id });
                move_card(state, id, ZoneType::Graveyard, ZonePosition::Top, events);
            }
        }
        StateBasedAction::CountersAnnihilate { permanent, count } => {
            state.remove_counters(permanent, &CounterKind::PlusOne, count);
            state.remove_counters(permanent, &CounterKind::MinusOne, count);
        }
    }
}
