//! Declaring attackers and blockers.
//!
//! Each declaration has a `can_*` check returning `Legality` and a
//! declaring operation that re-runs the check and returns
//! `Err(RulesViolation)` without touching the state when it fails.
//! Checks read projected characteristics, so granted keywords count.

use tracing::debug;

use crate::cards::Keyword;
use crate::core::{EntityId, GameState, PlayerId};
use crate::effects::GameEvent;
use crate::error::{Legality, RulesViolation};
use crate::layers::{ProjectedView, ProjectionCache};

use super::state::BlockerOrder;

/// Can `attacker` attack `defender` right now?
pub fn can_declare_attacker(
    state: &GameState,
    cache: &mut ProjectionCache,
    attacker: EntityId,
    defender: PlayerId,
) -> Legality {
    let view = match combatant(state, cache, attacker) {
        Ok(view) => view,
        Err(reason) => return Legality::Invalid(reason),
    };

    if view.controller != state.active_player() {
        return Legality::invalid(format!("{} is not controlled by the active player", view.name));
    }
    if view.tapped {
        return Legality::invalid(format!("{} is tapped", view.name));
    }
    if state.combat().is_attacking(attacker) {
        return Legality::invalid(format!("{} is already attacking", view.name));
    }
    if view.has_keyword(Keyword::Defender) {
        return Legality::invalid(format!("{} has defender", view.name));
    }
    if view.summoning_sick && !view.has_keyword(Keyword::Haste) {
        return Legality::invalid(format!("{} has summoning sickness", view.name));
    }
    if defender == view.controller {
        return Legality::invalid(format!("{} cannot attack its controller", view.name));
    }
    if state.player(defender).map_or(true, |p| p.has_lost) {
        return Legality::invalid(format!("{defender} cannot be attacked"));
    }
    Legality::Valid
}

/// Declare an attacker. It taps unless it has vigilance.
pub fn declare_attacker(
    state: &mut GameState,
    cache: &mut ProjectionCache,
    attacker: EntityId,
    defender: PlayerId,
) -> Result<Vec<GameEvent>, RulesViolation> {
    can_declare_attacker(state, cache, attacker, defender).into_result()?;

    let mut events = Vec::new();
    let vigilance = cache
        .get_view(state, attacker)
        .is_some_and(|v| v.has_keyword(Keyword::Vigilance));
    if !vigilance && state.tap(attacker) {
        events.push(GameEvent::Tapped { entity: attacker });
    }
    state.combat_mut().add_attacker(attacker, defender);
    events.push(GameEvent::AttackerDeclared { attacker, defender });

    debug!(%attacker, %defender, vigilance, "attacker declared");
    Ok(events)
}

/// Can `blocker` block `attacker` right now?
pub fn can_declare_blocker(
    state: &GameState,
    cache: &mut ProjectionCache,
    blocker: EntityId,
    attacker: EntityId,
) -> Legality {
    let Some(defender) = state.combat().defender_of(attacker) else {
        return Legality::invalid(format!("{attacker} is not attacking"));
    };
    let blocking = match combatant(state, cache, blocker) {
        Ok(view) => view,
        Err(reason) => return Legality::Invalid(reason),
    };
    let Some(attacking) = cache.get_view(state, attacker) else {
        return Legality::invalid(format!("{attacker} does not exist"));
    };

    if blocking.controller != defender {
        return Legality::invalid(format!("{} is not controlled by the defending player", blocking.name));
    }
    if blocking.tapped {
        return Legality::invalid(format!("{} is tapped", blocking.name));
    }
    match state.combat().blocked_attacker(blocker) {
        Some(current) if current == attacker => {
            return Legality::invalid(format!("{} is already blocking {}", blocking.name, attacking.name));
        }
        Some(_) => {
            return Legality::invalid(format!("{} is already blocking another attacker", blocking.name));
        }
        None => {}
    }
    if let Some(reason) = evasion_violation(&attacking, &blocking) {
        return Legality::Invalid(reason);
    }
    Legality::Valid
}

/// Declare a blocker. It goes to the end of the attacker's damage
/// assignment order.
pub fn declare_blocker(
    state: &mut GameState,
    cache: &mut ProjectionCache,
    blocker: EntityId,
    attacker: EntityId,
) -> Result<Vec<GameEvent>, RulesViolation> {
    can_declare_blocker(state, cache, blocker, attacker).into_result()?;

    state.combat_mut().add_blocker(blocker, attacker);
    debug!(%blocker, %attacker, "blocker declared");
    Ok(vec![GameEvent::BlockerDeclared { blocker, attacker }])
}

/// Set the damage assignment order of an attacker's blockers.
///
/// `order` must name exactly the attacker's current blockers.
pub fn order_blockers(state: &mut GameState, attacker: EntityId, order: &[EntityId]) -> Result<(), RulesViolation> {
    let current = state.combat().blockers_of(attacker);
    if current.is_empty() {
        return Err(RulesViolation::new(format!("{attacker} has no blockers to order")));
    }
    let same_set = order.len() == current.len()
        && current.iter().all(|b| order.contains(b))
        && order.iter().enumerate().all(|(i, b)| !order[..i].contains(b));
    if !same_set {
        return Err(RulesViolation::new(format!(
            "order must list each blocker of {attacker} exactly once"
        )));
    }

    state
        .combat_mut()
        .set_order(attacker, order.iter().copied().collect::<BlockerOrder>());
    Ok(())
}

/// Fewest blockers that can block a creature.
#[must_use]
pub fn minimum_blockers(view: &ProjectedView) -> usize {
    if view.has_keyword(Keyword::Menace) {
        2
    } else {
        1
    }
}

/// Check the declared blocks as a whole.
///
/// Individual blocks are checked when declared; this checks the rules that
/// depend on all of them together, such as menace.
pub fn validate_blocks(state: &GameState, cache: &mut ProjectionCache) -> Legality {
    for (attacker, _) in state.combat().attackers() {
        let count = state.combat().blockers_of(attacker).len();
        if count == 0 {
            continue;
        }
        let Some(view) = cache.get_view(state, attacker) else {
            continue;
        };
        let needed = minimum_blockers(&view);
        if count < needed {
            return Legality::invalid(format!(
                "{} can't be blocked except by {needed} or more creatures",
                view.name
            ));
        }
    }
    Legality::Valid
}

/// A creature on the battlefield, or why it isn't one.
fn combatant(state: &GameState, cache: &mut ProjectionCache, id: EntityId) -> Result<ProjectedView, String> {
    let view = cache.get_view(state, id).ok_or_else(|| format!("{id} does not exist"))?;
    if !view.is_on_battlefield() {
        return Err(format!("{} is not on the battlefield", view.name));
    }
    if !view.is_creature() {
        return Err(format!("{} is not a creature", view.name));
    }
    Ok(view)
}

/// The first evasion rule that forbids this block.
fn evasion_violation(attacker: &ProjectedView, blocker: &ProjectedView) -> Option<String> {
    for gate in Keyword::EVASION {
        if !attacker.has_keyword(gate) {
            continue;
        }
        if !gate.evasion_answers().iter().any(|&k| blocker.has_keyword(k)) {
            return Some(format!("{} can't block {} ({gate:?})", blocker.name, attacker.name));
        }
    }
    // Shadow cuts both ways.
    if blocker.has_keyword(Keyword::Shadow) && !attacker.has_keyword(Keyword::Shadow) {
        return Some(format!("{} has shadow and can only block creatures with shadow", blocker.name));
    }
    None
}
