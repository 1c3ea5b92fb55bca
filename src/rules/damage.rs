//! Dealing damage.
//!
//! Shared by damage effects and combat:
//! - Damage to a player is life loss
//! - Damage to a permanent is marked on it, flagged if the source has deathtouch
//! - Lifelink is applied by the caller, once per source per damage event
//!   batch, via `lifelink_gain`

use tracing::trace;

use crate::cards::Keyword;
use crate::core::{EntityId, GameState};
use crate::effects::{DamageTarget, GameEvent};
use crate::layers::ProjectionCache;
use crate::zones::ZoneType;

/// Keyword abilities of a damage source that change how its damage lands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceTraits {
    pub deathtouch: bool,
    pub lifelink: bool,
}

impl SourceTraits {
    /// Read the source's current (or last known) keywords.
    pub fn of(state: &GameState, cache: &mut ProjectionCache, source: Option<EntityId>) -> Self {
        source
            .and_then(|id| cache.get_view(state, id))
            .map(|view| Self {
                deathtouch: view.has_keyword(Keyword::Deathtouch),
                lifelink: view.has_keyword(Keyword::Lifelink),
            })
            .unwrap_or_default()
    }
}

/// Deal damage to one recipient. Returns the event, or `None` if nothing
/// was dealt (zero amount, or the recipient is gone).
pub fn deal_damage(
    state: &mut GameState,
    source: Option<EntityId>,
    traits: SourceTraits,
    target: DamageTarget,
    amount: u32,
    combat: bool,
) -> Option<GameEvent> {
    if amount == 0 {
        return None;
    }

    match target {
        DamageTarget::Player(player) => {
            if state.player(player).is_none() {
                return None;
            }
            state.lose_life(player, i64::from(amount));
        }
        DamageTarget::Permanent(id) => {
            if !state.zones().is_in_zone_type(id, ZoneType::Battlefield) {
                return None;
            }
            state.mark_damage(id, amount, traits.deathtouch);
        }
    }

    trace!(?source, ?target, amount, combat, "damage dealt");
    Some(GameEvent::DamageDealt {
        source,
        target,
        amount,
        combat,
    })
}

/// Life gained from lifelink for `total` damage dealt by `source`.
pub fn lifelink_gain(
    state: &mut GameState,
    cache: &mut ProjectionCache,
    source: EntityId,
    traits: SourceTraits,
    total: u32,
) -> Option<GameEvent> {
    if !traits.lifelink || total == 0 {
        return None;
    }
    let controller = cache.get_view(state, source).map(|v| v.controller)?;
    state.gain_life(controller, i64::from(total));
    Some(GameEvent::LifeGained {
        player: controller,
        amount: i64::from(total),
    })
}
