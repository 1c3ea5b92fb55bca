//! Costs an effect may ask a player to pay.
//!
//! Mana is paid from a single generic pool; choosing which mana to spend
//! is the business of the payment solver outside this crate.

use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use crate::core::{EntityId, GameState, PlayerId};
use crate::error::ExecutionError;
use crate::zones::{ZonePosition, ZoneType};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cost {
    Life(i64),
    Mana(u32),
    /// Tap the permanent the cost belongs to.
    TapSource,
    /// Sacrifice the permanent the cost belongs to.
    SacrificeSource,
}

impl Cost {
    /// Whether `player` can pay this cost for `source` right now.
    #[must_use]
    pub fn can_pay(&self, state: &GameState, player: PlayerId, source: Option<EntityId>) -> bool {
        let on_battlefield =
            |id: EntityId| state.zones().is_in_zone_type(id, ZoneType::Battlefield);
        match self {
            Cost::Life(amount) => state.life(player) >= *amount,
            Cost::Mana(amount) => state.player(player).is_some_and(|p| p.mana_pool >= *amount),
            Cost::TapSource => {
                source.is_some_and(|id| on_battlefield(id) && !state.entities().is_tapped(id))
            }
            Cost::SacrificeSource => source.is_some_and(on_battlefield),
        }
    }

    /// Pay the cost. Fails without changing anything if it cannot be paid.
    pub fn pay(
        &self,
        state: &mut GameState,
        player: PlayerId,
        source: Option<EntityId>,
    ) -> Result<Vec<GameEvent>, ExecutionError> {
        if !self.can_pay(state, player, source) {
            return Err(ExecutionError::CostUnpaid(format!("{self:?}")));
        }

        let mut events = Vec::new();
        match (self, source) {
            (Cost::Life(amount), _) => {
                state.lose_life(player, *amount);
                events.push(GameEvent::LifeLost {
                    player,
                    amount: *amount,
                });
            }
            (Cost::Mana(amount), _) => {
                state.spend_mana(player, *amount);
            }
            (Cost::TapSource, Some(id)) => {
                state.tap(id);
                events.push(GameEvent::Tapped { entity: id });
            }
            (Cost::SacrificeSource, Some(id)) => {
                if let Some(new) = state.move_to_zone(id, ZoneType::Graveyard, ZonePosition::Top) {
                    events.push(GameEvent::Sacrificed { entity: id });
                    events.push(GameEvent::ZoneChanged {
                        old: id,
                        new,
                        from: ZoneType::Battlefield,
                        to: ZoneType::Graveyard,
                    });
                }
            }
            (Cost::TapSource | Cost::SacrificeSource, None) => {}
        }
        events.insert(
            0,
            GameEvent::CostPaid {
                player,
                cost: self.clone(),
            },
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::GameConfig;

    #[test]
    fn test_life_cost() {
        let mut state = GameState::new(&GameConfig::default());
        let p0 = PlayerId::new(0);

        assert!(Cost::Life(20).can_pay(&state, p0, None));
        assert!(!Cost::Life(21).can_pay(&state, p0, None));

        let events = Cost::Life(3).pay(&mut state, p0, None).unwrap();
        assert_eq!(state.life(p0), 17);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_mana_cost_short() {
        let mut state = GameState::new(&GameConfig::default());
        let p0 = PlayerId::new(0);
        state.add_mana(p0, 1);

        let err = Cost::Mana(2).pay(&mut state, p0, None).unwrap_err();
        assert!(matches!(err, ExecutionError::CostUnpaid(_)));
        assert_eq!(state.player(p0).unwrap().mana_pool, 1);
    }

    #[test]
    fn test_tap_source() {
        let mut state = GameState::new(&GameConfig::default());
        let p0 = PlayerId::new(0);
        let land = state.create_card(p0, Characteristics::new("Land"), ZoneType::Battlefield);

        assert!(!Cost::TapSource.can_pay(&state, p0, None));
        Cost::TapSource.pay(&mut state, p0, Some(land)).unwrap();
        assert!(state.entities().is_tapped(land));
        assert!(!Cost::TapSource.can_pay(&state, p0, Some(land)));
    }
}
