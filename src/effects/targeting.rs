//! Targeting: which objects and players an effect may target.
//!
//! - `TargetSpec`: what can be targeted and how many
//! - `TargetType`: players, permanents, cards in a zone, or any
//! - `TargetCount`: how many targets to select
//!
//! Legality is read from projected views, so a permanent that gained
//! hexproof from a continuous effect is excluded like one that prints it.

use serde::{Deserialize, Serialize};

use crate::cards::Keyword;
use crate::core::{EntityId, GameState, PlayerId};
use crate::layers::{EntityFilter, FilterScope, ProjectedView, ProjectionCache};
use crate::zones::ZoneType;

/// Specification for effect targeting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// What kind of thing can be targeted.
    pub target_type: TargetType,
    /// Applied to objects; players are not filtered by it.
    pub filter: EntityFilter,
    /// Whose things may be targeted.
    pub controller: TargetController,
    /// How many targets to select.
    pub count: TargetCount,
}

/// The kind of thing that can be targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    Player,
    Permanent,
    /// A card in a zone of this type (any owner).
    Card { zone: ZoneType },
    /// Players and permanents.
    Any,
}

/// Relation between the chooser and the target's controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetController {
    Any,
    You,
    Opponent,
}

/// Number of targets to select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetCount {
    /// Exactly N targets.
    Exactly(usize),
    /// Up to N targets.
    UpTo(usize),
    /// Between min and max targets.
    Range { min: usize, max: usize },
    /// Any number of the legal targets.
    All,
}

impl TargetCount {
    /// Minimum selection size.
    #[must_use]
    pub fn min(self) -> usize {
        match self {
            TargetCount::Exactly(n) => n,
            TargetCount::Range { min, .. } => min,
            TargetCount::UpTo(_) | TargetCount::All => 0,
        }
    }

    /// Maximum selection size given how many targets are available.
    #[must_use]
    pub fn max(self, available: usize) -> usize {
        match self {
            TargetCount::Exactly(n) | TargetCount::UpTo(n) => n.min(available),
            TargetCount::Range { max, .. } => max.min(available),
            TargetCount::All => available,
        }
    }
}

impl TargetSpec {
    /// One target of a type, anyone's, unfiltered.
    pub fn single(target_type: TargetType) -> Self {
        Self {
            target_type,
            filter: EntityFilter::All,
            controller: TargetController::Any,
            count: TargetCount::Exactly(1),
        }
    }

    /// "Target creature."
    pub fn creature() -> Self {
        Self::single(TargetType::Permanent).with_filter(EntityFilter::Creatures)
    }

    /// "Target opponent."
    pub fn opponent() -> Self {
        Self::single(TargetType::Player).with_controller(TargetController::Opponent)
    }

    /// "Any target": a player or a creature.
    pub fn any_target() -> Self {
        Self::single(TargetType::Any).with_filter(EntityFilter::Creatures)
    }

    /// Set the object filter (builder pattern).
    #[must_use]
    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_controller(mut self, controller: TargetController) -> Self {
        self.controller = controller;
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: TargetCount) -> Self {
        self.count = count;
        self
    }

    /// All legal targets for `chooser`, players first, then objects by id.
    pub fn legal_targets(
        &self,
        state: &GameState,
        cache: &mut ProjectionCache,
        chooser: PlayerId,
        source: Option<EntityId>,
    ) -> Vec<EntityId> {
        let scope = FilterScope::new(source, Some(chooser));
        let mut targets = Vec::new();

        if matches!(self.target_type, TargetType::Player | TargetType::Any) {
            for player in PlayerId::all(state.player_count()) {
                let in_game = state.player(player).is_some_and(|p| !p.has_lost);
                if in_game && self.relation_holds(chooser, player) {
                    targets.push(EntityId::player(player));
                }
            }
        }

        match self.target_type {
            TargetType::Permanent | TargetType::Any => {
                for view in cache.project_battlefield(state) {
                    if self.object_allowed(&view, chooser, &scope) && !shrouded(&view, chooser) {
                        targets.push(view.id);
                    }
                }
            }
            TargetType::Card { zone } => {
                for id in state.zones().cards_of_type(zone) {
                    if let Some(view) = cache.get_view(state, id) {
                        if self.object_allowed(&view, chooser, &scope) {
                            targets.push(id);
                        }
                    }
                }
            }
            TargetType::Player => {}
        }

        targets
    }

    /// Check if the minimum target count can be satisfied.
    pub fn has_enough_targets(
        &self,
        state: &GameState,
        cache: &mut ProjectionCache,
        chooser: PlayerId,
        source: Option<EntityId>,
    ) -> bool {
        self.legal_targets(state, cache, chooser, source).len() >= self.count.min()
    }

    /// Validate a selection of targets.
    pub fn validate_selection(
        &self,
        state: &GameState,
        cache: &mut ProjectionCache,
        chooser: PlayerId,
        source: Option<EntityId>,
        selected: &[EntityId],
    ) -> bool {
        let legal = self.legal_targets(state, cache, chooser, source);
        let count_valid = selected.len() >= self.count.min().min(legal.len())
            && selected.len() <= self.count.max(legal.len());
        let mut seen = selected.to_vec();
        seen.sort_unstable();
        seen.dedup();

        count_valid && seen.len() == selected.len() && selected.iter().all(|s| legal.contains(s))
    }

    fn relation_holds(&self, chooser: PlayerId, controller: PlayerId) -> bool {
        match self.controller {
            TargetController::Any => true,
            TargetController::You => controller == chooser,
            TargetController::Opponent => controller != chooser,
        }
    }

    fn object_allowed(&self, view: &ProjectedView, chooser: PlayerId, scope: &FilterScope) -> bool {
        self.relation_holds(chooser, view.controller) && self.filter.matches(view, scope)
    }
}

/// Hexproof keeps opponents from targeting a permanent.
fn shrouded(view: &ProjectedView, chooser: PlayerId) -> bool {
    view.has_keyword(Keyword::Hexproof) && view.controller != chooser
}
