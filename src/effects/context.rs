//! Execution context: the bindings an effect tree runs with.
//!
//! The context travels through the tree by value. Each node returns the
//! context it finished with, so a target chosen by one child is visible to
//! the next. Loops hand their body a fresh iteration context and return the
//! context they started with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::{Amount, Condition, EntityRef, PlayerRef};
use crate::core::{EntityId, GameState, PlayerId};
use crate::error::ExecutionError;
use crate::layers::{FilterScope, ProjectionCache};
use crate::zones::ZoneType;

/// Bindings for one run of an effect tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// The player "you" refers to.
    pub controller: PlayerId,
    /// Explicit opponent, for two-player effects.
    pub opponent: Option<PlayerId>,
    /// The object the effect comes from.
    pub source: Option<EntityId>,
    /// Chosen targets.
    pub targets: Vec<EntityId>,
    /// Entity bound by the enclosing loop.
    pub current_entity: Option<EntityId>,
    /// Player bound by the enclosing loop.
    pub current_player: Option<PlayerId>,
    /// Named collections stored by earlier effects.
    pub stored: BTreeMap<String, Vec<EntityId>>,
}

impl ExecutionContext {
    #[must_use]
    pub fn new(controller: PlayerId) -> Self {
        Self {
            controller,
            opponent: None,
            source: None,
            targets: Vec::new(),
            current_entity: None,
            current_player: None,
            stored: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_opponent(mut self, opponent: PlayerId) -> Self {
        self.opponent = Some(opponent);
        self
    }

    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = EntityId>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    /// Iteration context for a loop over entities.
    #[must_use]
    pub fn for_entity(&self, entity: EntityId) -> Self {
        Self {
            current_entity: Some(entity),
            stored: BTreeMap::new(),
            ..self.clone()
        }
    }

    /// Iteration context for a loop over targets: the target is both the
    /// current entity and the only target.
    #[must_use]
    pub fn for_target(&self, target: EntityId) -> Self {
        Self {
            targets: vec![target],
            ..self.for_entity(target)
        }
    }

    /// Iteration context for a loop over players.
    #[must_use]
    pub fn for_player(&self, player: PlayerId) -> Self {
        Self {
            current_player: Some(player),
            stored: BTreeMap::new(),
            ..self.clone()
        }
    }

    pub fn store(&mut self, key: impl Into<String>, entities: Vec<EntityId>) {
        self.stored.insert(key.into(), entities);
    }

    /// Filter bindings for this context.
    #[must_use]
    pub fn scope(&self) -> FilterScope {
        FilterScope::new(self.source, Some(self.controller))
    }

    // === Resolution ===

    /// Resolve an entity reference.
    pub fn entities(&self, what: &EntityRef) -> Result<Vec<EntityId>, ExecutionError> {
        match what {
            EntityRef::Source => self
                .source
                .map(|id| vec![id])
                .ok_or_else(|| ExecutionError::MissingBinding("source".into())),
            EntityRef::CurrentEntity => self
                .current_entity
                .map(|id| vec![id])
                .ok_or_else(|| ExecutionError::MissingBinding("current entity".into())),
            EntityRef::AllTargets => Ok(self.targets.clone()),
            EntityRef::Stored(key) => self
                .stored
                .get(key)
                .cloned()
                .ok_or_else(|| ExecutionError::MissingBinding(format!("stored '{key}'"))),
            EntityRef::Specific(id) => Ok(vec![*id]),
        }
    }

    /// Resolve a player reference.
    pub fn player(&self, state: &GameState, who: PlayerRef) -> Result<PlayerId, ExecutionError> {
        match who {
            PlayerRef::Controller => Ok(self.controller),
            PlayerRef::Opponent => self
                .opponent
                .or_else(|| state.next_opponent(self.controller))
                .ok_or_else(|| ExecutionError::MissingBinding("opponent".into())),
            PlayerRef::CurrentPlayer => self
                .current_player
                .ok_or_else(|| ExecutionError::MissingBinding("current player".into())),
            PlayerRef::ActivePlayer => Ok(state.active_player()),
            PlayerRef::Specific(player) => Ok(player),
        }
    }

    /// Evaluate an amount.
    pub fn amount(
        &self,
        state: &GameState,
        cache: &mut ProjectionCache,
        amount: &Amount,
    ) -> Result<i64, ExecutionError> {
        match amount {
            Amount::Fixed(n) => Ok(*n),
            Amount::StoredCount(key) => self
                .stored
                .get(key)
                .map(|ids| ids.len() as i64)
                .ok_or_else(|| ExecutionError::MissingBinding(format!("stored '{key}'"))),
            Amount::SourcePower => {
                let source = self
                    .source
                    .ok_or_else(|| ExecutionError::MissingBinding("source".into()))?;
                Ok(cache
                    .get_view(state, source)
                    .map_or(0, |v| i64::from(v.effective_power())))
            }
            Amount::CountMatching(filter) => {
                let scope = self.scope();
                Ok(cache
                    .project_battlefield(state)
                    .iter()
                    .filter(|v| filter.matches(v, &scope))
                    .count() as i64)
            }
        }
    }

    /// Evaluate a condition.
    pub fn evaluate(
        &self,
        state: &GameState,
        cache: &mut ProjectionCache,
        condition: &Condition,
    ) -> Result<bool, ExecutionError> {
        Ok(match condition {
            Condition::Always => true,
            Condition::Never => false,
            Condition::LifeAtLeast(who, n) => state.life(self.player(state, *who)?) >= *n,
            Condition::LifeAtMost(who, n) => state.life(self.player(state, *who)?) <= *n,
            Condition::EntityOnBattlefield(what) => {
                let ids = self.entities(what)?;
                !ids.is_empty()
                    && ids
                        .iter()
                        .all(|&id| state.zones().is_in_zone_type(id, ZoneType::Battlefield))
            }
            Condition::StoredCountAtLeast(key, n) => {
                self.stored.get(key).map_or(0, Vec::len) >= *n
            }
            Condition::ControlsMatching {
                player,
                filter,
                at_least,
            } => {
                let player = self.player(state, *player)?;
                let scope = self.scope();
                let count = cache
                    .project_battlefield(state)
                    .iter()
                    .filter(|v| v.controller == player && filter.matches(v, &scope))
                    .count();
                count >= *at_least
            }
            Condition::HandSizeAtLeast(who, n) => {
                state.cards_in(self.player(state, *who)?, ZoneType::Hand).len() >= *n
            }
            Condition::Not(inner) => !self.evaluate(state, cache, inner)?,
            Condition::All(conditions) => {
                for c in conditions {
                    if !self.evaluate(state, cache, c)? {
                        return Ok(false);
                    }
                }
                true
            }
            Condition::Any(conditions) => {
                for c in conditions {
                    if self.evaluate(state, cache, c)? {
                        return Ok(true);
                    }
                }
                false
            }
        })
    }
}
