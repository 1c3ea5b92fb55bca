//! Memoized projections.
//!
//! A `ProjectionCache` remembers projected views for one state at a time,
//! identified by its `StateRevision`. Presenting a state with a different
//! revision drops every entry. Each worker owns its own cache and passes
//! it down the call chain as `&mut ProjectionCache`; nothing is shared.
//!
//! ```
//! use rules_core::cards::Characteristics;
//! use rules_core::core::{GameConfig, GameState, PlayerId};
//! use rules_core::layers::ProjectionCache;
//! use rules_core::zones::ZoneType;
//!
//! let mut state = GameState::new(&GameConfig::default());
//! let bears = state.create_card(
//!     PlayerId::new(0),
//!     Characteristics::creature("Grizzly Bears", 2, 2),
//!     ZoneType::Battlefield,
//! );
//!
//! let mut cache = ProjectionCache::new();
//! assert_eq!(cache.get_view(&state, bears).and_then(|v| v.power), Some(2));
//! assert_eq!(cache.get_view(&state, bears).and_then(|v| v.power), Some(2));
//! assert_eq!(cache.stats().hits, 1);
//! ```

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::projector::{ProjectedView, StateProjector};
use crate::core::{EntityId, GameConfig, GameState, StateRevision};
use crate::zones::ZoneType;

/// Cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to project.
    pub misses: u64,
    /// Wholesale or per-entity invalidations.
    pub invalidations: u64,
    /// Entries dropped to respect the capacity bound.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Per-worker memo of projected views.
#[derive(Clone, Debug, Default)]
pub struct ProjectionCache {
    revision: Option<StateRevision>,
    entries: FxHashMap<EntityId, Option<ProjectedView>>,
    /// Insertion order, oldest first, for eviction.
    order: VecDeque<EntityId>,
    /// Whole-battlefield projection is present in `entries`.
    battlefield_complete: bool,
    capacity: Option<usize>,
    stats: CacheStats,
}

impl ProjectionCache {
    /// Create an unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }

    /// Create a cache sized by the configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig) -> Self {
        match config.projection_cache_capacity {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::new(),
        }
    }

    /// Projected view of one entity, or `None` if it does not exist.
    pub fn get_view(&mut self, state: &GameState, id: EntityId) -> Option<ProjectedView> {
        self.sync(state);

        if let Some(entry) = self.entries.get(&id) {
            self.stats.hits += 1;
            return entry.clone();
        }

        self.stats.misses += 1;
        let view = StateProjector::project(state, id);
        self.insert(id, view.clone());
        view
    }

    /// Projected views of several entities; missing ones are skipped.
    pub fn get_views(&mut self, state: &GameState, ids: &[EntityId]) -> Vec<ProjectedView> {
        ids.iter().filter_map(|&id| self.get_view(state, id)).collect()
    }

    /// Projected views of every battlefield entity, ordered by id.
    pub fn project_battlefield(&mut self, state: &GameState) -> Vec<ProjectedView> {
        self.sync(state);

        if self.battlefield_complete {
            let ids = state.zones().cards_of_type(ZoneType::Battlefield);
            let cached: Option<Vec<ProjectedView>> = ids
                .iter()
                .map(|id| self.entries.get(id).cloned().flatten())
                .collect();
            if let Some(mut views) = cached {
                self.stats.hits += 1;
                views.sort_by_key(|v| v.id);
                return views;
            }
        }

        self.stats.misses += 1;
        let views = StateProjector::project_battlefield(state);
        for view in &views {
            self.insert(view.id, Some(view.clone()));
        }
        self.battlefield_complete = self
            .capacity
            .map_or(true, |capacity| views.len() <= capacity);
        views
    }

    /// Drop the cached view of one entity.
    pub fn invalidate_entity(&mut self, id: EntityId) {
        if self.entries.remove(&id).is_some() {
            self.order.retain(|&e| e != id);
            self.battlefield_complete = false;
            self.stats.invalidations += 1;
            trace!(entity = %id, "projection entry invalidated");
        }
    }

    /// Drop every cached view.
    pub fn invalidate_all(&mut self) {
        self.clear();
        self.revision = None;
        self.stats.invalidations += 1;
        trace!("projection cache invalidated");
    }

    /// Counters since creation.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sync(&mut self, state: &GameState) {
        let revision = state.revision();
        if self.revision == Some(revision) {
            return;
        }
        if self.revision.is_some() {
            self.stats.invalidations += 1;
            trace!(from = ?self.revision, to = ?revision, "state changed, projection cache cleared");
        }
        self.clear();
        self.revision = Some(revision);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.battlefield_complete = false;
    }

    fn insert(&mut self, id: EntityId, view: Option<ProjectedView>) {
        if self.entries.insert(id, view).is_some() {
            return;
        }
        self.order.push_back(id);

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
                self.battlefield_complete = false;
                self.stats.evictions += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::PlayerId;

    fn state_with_creatures(n: usize) -> (GameState, Vec<EntityId>) {
        let mut state = GameState::new(&GameConfig::default());
        let ids = (0..n)
            .map(|i| {
                state.create_card(
                    PlayerId::new(0),
                    Characteristics::creature(format!("Soldier {i}"), 1, 1),
                    ZoneType::Battlefield,
                )
            })
            .collect();
        (state, ids)
    }

    #[test]
    fn test_hits_and_misses() {
        let (state, ids) = state_with_creatures(1);
        let mut cache = ProjectionCache::new();

        let first = cache.get_view(&state, ids[0]);
        let second = cache.get_view(&state, ids[0]);

        assert_eq!(first, second);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_new_revision_invalidates() {
        let (mut state, ids) = state_with_creatures(1);
        let mut cache = ProjectionCache::new();

        cache.get_view(&state, ids[0]);
        state.tap(ids[0]);
        let view = cache.get_view(&state, ids[0]).unwrap();

        assert!(view.tapped);
        assert_eq!(cache.stats().invalidations, 1);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_clone_shares_revision() {
        let (state, ids) = state_with_creatures(1);
        let copy = state.clone();
        let mut cache = ProjectionCache::new();

        cache.get_view(&state, ids[0]);
        cache.get_view(&copy, ids[0]);

        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().invalidations, 0);
    }

    #[test]
    fn test_missing_entity_cached_as_none() {
        let (state, _) = state_with_creatures(1);
        let mut cache = ProjectionCache::new();

        assert!(cache.get_view(&state, EntityId(500)).is_none());
        assert!(cache.get_view(&state, EntityId(500)).is_none());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (state, ids) = state_with_creatures(3);
        let mut cache = ProjectionCache::with_capacity(2);

        cache.get_view(&state, ids[0]);
        cache.get_view(&state, ids[1]);
        cache.get_view(&state, ids[2]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        // ids[0] was evicted, so this is a miss
        cache.get_view(&state, ids[0]);
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_invalidate_entity() {
        let (state, ids) = state_with_creatures(2);
        let mut cache = ProjectionCache::new();

        cache.get_views(&state, &ids);
        cache.invalidate_entity(ids[0]);
        cache.get_view(&state, ids[1]);
        cache.get_view(&state, ids[0]);

        let stats = cache.stats();
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
    }

    #[test]
    fn test_battlefield_projection_is_memoized() {
        let (state, ids) = state_with_creatures(3);
        let mut cache = ProjectionCache::new();

        let first = cache.project_battlefield(&state);
        let second = cache.project_battlefield(&state);

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);

        // Individual lookups are served by the bulk projection.
        cache.get_view(&state, ids[2]);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_invalidate_all() {
        let (state, ids) = state_with_creatures(1);
        let mut cache = ProjectionCache::new();

        cache.get_view(&state, ids[0]);
        cache.invalidate_all();
        assert!(cache.is_empty());

        cache.get_view(&state, ids[0]);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().invalidations, 1);
    }
}
