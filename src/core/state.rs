//! Game state: the single value every rules operation transforms.
//!
//! ## GameState
//!
//! Complete game state including:
//! - Entity store (components per entity)
//! - Zone manager (card locations and order)
//! - Player life totals and mana
//! - Active modifiers and the timestamp counter
//! - Combat declarations
//! - Pending decision and continuation stack
//! - RNG
//!
//! Uses `im` persistent data structures for O(1) cloning. Public rules
//! operations take `&GameState` and return a new value; the mutating
//! helpers here act on an owned clone.
//!
//! ## Revisions
//!
//! Every mutating helper stamps the state with a fresh `StateRevision`.
//! Two values with the same revision are identical, so a projection cached
//! against one revision is valid for any state carrying it. Revisions are
//! not serialized: a deserialized state always gets a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::component::{Component, ComponentKind, CounterKind, CounterSet};
use super::config::GameConfig;
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap, PlayerState};
use super::rng::GameRng;
use super::store::EntityStore;
use crate::cards::{CardDefinition, Characteristics};
use crate::combat::CombatState;
use crate::decisions::{DecisionId, PlayerDecision};
use crate::effects::Continuation;
use crate::error::ProtocolError;
use crate::layers::{ExpiryEvent, Modifier, ModifierId, Timestamp};
use crate::zones::{ZoneKey, ZoneManager, ZonePosition, ZoneType};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Identity of one state value, used as the projection cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateRevision(u64);

impl StateRevision {
    /// A revision no other state has carried in this process.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_REVISION.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Complete game state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    #[serde(skip, default = "StateRevision::fresh")]
    revision: StateRevision,

    entities: EntityStore,
    zones: ZoneManager,
    players: PlayerMap<PlayerState>,

    modifiers: Vector<Modifier>,
    next_timestamp: u64,
    next_modifier: u64,

    /// Next id for a non-player entity. Never decreases.
    next_entity: u32,
    next_decision: u64,

    active_player: PlayerId,
    turn_number: u32,

    combat: CombatState,

    pending_decision: Option<PlayerDecision>,
    continuations: Vector<Continuation>,

    rng: GameRng,
}

impl GameState {
    /// Create the initial state for a configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            revision: StateRevision::fresh(),
            entities: EntityStore::new(),
            zones: ZoneManager::new(),
            players: PlayerMap::with_value(config.player_count, PlayerState::new(config.starting_life)),
            modifiers: Vector::new(),
            next_timestamp: 1,
            next_modifier: 1,
            next_entity: EntityId::first_non_player(config.player_count),
            next_decision: 1,
            active_player: PlayerId::new(0),
            turn_number: 1,
            combat: CombatState::default(),
            pending_decision: None,
            continuations: Vector::new(),
            rng: GameRng::new(config.seed),
        }
    }

    fn touch(&mut self) {
        self.revision = StateRevision::fresh();
    }

    // === Read access ===

    #[must_use]
    pub fn revision(&self) -> StateRevision {
        self.revision
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.player_count()
    }

    #[must_use]
    pub fn active_player(&self) -> PlayerId {
        self.active_player
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    #[must_use]
    pub fn players(&self) -> &PlayerMap<PlayerState> {
        &self.players
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(player)
    }

    /// Life total of a player (0 for an unknown player).
    #[must_use]
    pub fn life(&self, player: PlayerId) -> i64 {
        self.players.get(player).map_or(0, |p| p.life)
    }

    /// Players still in the game other than `player`, in turn order.
    #[must_use]
    pub fn opponents(&self, player: PlayerId) -> Vec<PlayerId> {
        player
            .turn_order(self.player_count())
            .skip(1)
            .filter(|p| self.players.get(*p).is_some_and(|s| !s.has_lost))
            .collect()
    }

    /// The next opponent in turn order, if any remain.
    #[must_use]
    pub fn next_opponent(&self, player: PlayerId) -> Option<PlayerId> {
        self.opponents(player).into_iter().next()
    }

    /// Cards in a player's zone, bottom to top.
    #[must_use]
    pub fn cards_in(&self, owner: PlayerId, zone_type: ZoneType) -> Vec<EntityId> {
        self.zones.cards(ZoneKey::new(owner, zone_type))
    }

    #[must_use]
    pub fn modifiers(&self) -> &Vector<Modifier> {
        &self.modifiers
    }

    #[must_use]
    pub fn combat(&self) -> &CombatState {
        &self.combat
    }

    #[must_use]
    pub fn pending_decision(&self) -> Option<&PlayerDecision> {
        self.pending_decision.as_ref()
    }

    #[must_use]
    pub fn continuations(&self) -> &Vector<Continuation> {
        &self.continuations
    }

    /// Waiting for a player decision.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.pending_decision.is_some()
    }

    // === Entities and zones ===

    fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    /// Create a card with the given characteristics in one of its owner's zones.
    pub fn create_card(&mut self, owner: PlayerId, base: Characteristics, zone: ZoneType) -> EntityId {
        self.create_entity(owner, None, base, zone)
    }

    /// Create a card from a definition in one of its owner's zones.
    pub fn create_from_definition(
        &mut self,
        owner: PlayerId,
        definition: &CardDefinition,
        zone: ZoneType,
    ) -> EntityId {
        let card = Component::Card {
            card_id: definition.id,
            name: definition.name.clone(),
        };
        self.create_entity(owner, Some(card), definition.characteristics.clone(), zone)
    }

    fn create_entity(
        &mut self,
        owner: PlayerId,
        card: Option<Component>,
        base: Characteristics,
        zone: ZoneType,
    ) -> EntityId {
        self.touch();
        let id = self.alloc_entity();
        let sick = zone == ZoneType::Battlefield && base.is_creature();

        let mut components = vec![Component::Owner(owner), Component::Base(base)];
        components.extend(card);
        if sick {
            components.push(Component::SummoningSick);
        }
        self.entities.insert(id, components);
        self.zones
            .add_to_zone(id, ZoneKey::new(owner, zone), ZonePosition::Top);
        id
    }

    /// Move an entity to one of its owner's zones.
    ///
    /// The moved card becomes a new object: it gets a fresh id and keeps
    /// only its identity, owner and printed characteristics. Its controller
    /// resets to the owner. Modifiers that last while the old object stays
    /// on the battlefield expire, and it leaves combat.
    ///
    /// Returns the new id, or `None` if the entity is not in a zone.
    pub fn move_to_zone(&mut self, id: EntityId, to: ZoneType, position: ZonePosition) -> Option<EntityId> {
        let from = self.zones.get_zone(id)?;
        let record = self.entities.get(id)?.clone();
        let owner = self.entities.owner(id)?;

        self.touch();
        let new_id = self.alloc_entity();

        let mut components: Vec<Component> = [ComponentKind::Card, ComponentKind::Owner, ComponentKind::Base]
            .into_iter()
            .filter_map(|kind| record.get(kind).cloned())
            .collect();
        let entering_creature = to == ZoneType::Battlefield
            && self.entities.base(id).is_some_and(Characteristics::is_creature);
        if entering_creature {
            components.push(Component::SummoningSick);
        }

        self.zones.remove(id);
        self.entities.remove(id);
        self.entities.insert(new_id, components);
        self.zones.add_to_zone(new_id, ZoneKey::new(owner, to), position);

        self.combat.remove_entity(id);
        if from.zone_type == ZoneType::Battlefield {
            self.expire_modifiers(ExpiryEvent::SourceLeft(id));
        }

        trace!(old = %id, new = %new_id, from = %from, to = ?to, "zone change");
        Some(new_id)
    }

    /// Move the top card of a player's library to their hand.
    ///
    /// Returns the new hand entity. Drawing from an empty library is
    /// recorded on the player and returns `None`.
    pub fn draw_card(&mut self, player: PlayerId) -> Option<EntityId> {
        let Some(top) = self.zones.top_card(ZoneKey::library(player)) else {
            self.touch();
            if let Some(p) = self.players.get_mut(player) {
                p.drew_from_empty = true;
            }
            return None;
        };
        self.move_to_zone(top, ZoneType::Hand, ZonePosition::Top)
    }

    /// Shuffle a player's library with the in-state RNG.
    pub fn shuffle_library(&mut self, player: PlayerId) {
        self.touch();
        self.zones.shuffle_zone(ZoneKey::library(player), &mut self.rng);
    }

    // === Components ===

    /// Tap a permanent. Returns `false` if it was already tapped or missing.
    pub fn tap(&mut self, id: EntityId) -> bool {
        if !self.entities.contains(id) || self.entities.is_tapped(id) {
            return false;
        }
        self.touch();
        self.entities.set(id, Component::Tapped)
    }

    /// Untap a permanent. Returns `false` if it was not tapped.
    pub fn untap(&mut self, id: EntityId) -> bool {
        if !self.entities.is_tapped(id) {
            return false;
        }
        self.touch();
        self.entities.unset(id, ComponentKind::Tapped).is_some()
    }

    /// Set or clear summoning sickness.
    pub fn set_summoning_sick(&mut self, id: EntityId, sick: bool) {
        if !self.entities.contains(id) {
            return;
        }
        self.touch();
        if sick {
            self.entities.set(id, Component::SummoningSick);
        } else {
            self.entities.unset(id, ComponentKind::SummoningSick);
        }
    }

    /// Mark damage on a permanent.
    pub fn mark_damage(&mut self, id: EntityId, amount: u32, deathtouch: bool) {
        if amount == 0 || !self.entities.contains(id) {
            return;
        }
        self.touch();
        let total = self.entities.damage(id).saturating_add(amount);
        self.entities.set(id, Component::Damage(total));
        if deathtouch {
            self.entities.set(id, Component::DeathtouchDamage);
        }
    }

    /// Remove all marked damage from a permanent.
    pub fn clear_damage(&mut self, id: EntityId) {
        if self.entities.has(id, ComponentKind::Damage) || self.entities.has(id, ComponentKind::DeathtouchDamage) {
            self.touch();
            self.entities.unset(id, ComponentKind::Damage);
            self.entities.unset(id, ComponentKind::DeathtouchDamage);
        }
    }

    /// Put counters on a permanent.
    ///
    /// +1/+1 and -1/-1 counters annihilate in pairs as they are placed.
    pub fn add_counters(&mut self, id: EntityId, kind: CounterKind, count: u32) -> bool {
        if count == 0 || !self.entities.contains(id) {
            return false;
        }
        let mut counters = self.entities.counters(id);
        counters.add(kind, count);
        counters.annihilate();
        self.set_counters(id, counters);
        true
    }

    /// Remove up to `count` counters. Returns how many were removed.
    pub fn remove_counters(&mut self, id: EntityId, kind: &CounterKind, count: u32) -> u32 {
        let mut counters = self.entities.counters(id);
        let removed = counters.remove(kind, count);
        if removed > 0 {
            self.set_counters(id, counters);
        }
        removed
    }

    /// Replace the counters on a permanent.
    pub fn set_counters(&mut self, id: EntityId, counters: CounterSet) {
        if !self.entities.contains(id) {
            return;
        }
        self.touch();
        if counters.is_empty() {
            self.entities.unset(id, ComponentKind::Counters);
        } else {
            self.entities.set(id, Component::Counters(counters));
        }
    }

    // === Players ===

    pub fn gain_life(&mut self, player: PlayerId, amount: i64) {
        let Some(p) = self.players.get_mut(player) else {
            return;
        };
        p.life += amount;
        self.touch();
    }

    pub fn lose_life(&mut self, player: PlayerId, amount: i64) {
        let Some(p) = self.players.get_mut(player) else {
            return;
        };
        p.life -= amount;
        self.touch();
    }

    pub fn add_mana(&mut self, player: PlayerId, amount: u32) {
        let Some(p) = self.players.get_mut(player) else {
            return;
        };
        p.mana_pool = p.mana_pool.saturating_add(amount);
        self.touch();
    }

    /// Spend mana from the pool. Returns `false` (spending nothing) if short.
    pub fn spend_mana(&mut self, player: PlayerId, amount: u32) -> bool {
        match self.players.get_mut(player) {
            Some(p) if p.mana_pool >= amount => p.mana_pool -= amount,
            _ => return false,
        }
        self.touch();
        true
    }

    /// Record that a player lost. Returns `false` if they already had.
    pub fn mark_lost(&mut self, player: PlayerId) -> bool {
        match self.players.get_mut(player) {
            Some(p) if !p.has_lost => p.has_lost = true,
            _ => return false,
        }
        self.touch();
        true
    }

    // === Turn structure ===

    /// Start `player`'s turn: untap their permanents and clear summoning sickness.
    pub fn begin_turn(&mut self, player: PlayerId) {
        self.touch();
        if player != self.active_player {
            self.turn_number += 1;
        }
        self.active_player = player;

        let controlled: Vec<EntityId> = self
            .zones
            .cards_of_type(ZoneType::Battlefield)
            .into_iter()
            .filter(|&id| self.entities.controller(id) == Some(player))
            .collect();
        for id in controlled {
            self.entities.unset(id, ComponentKind::Tapped);
            self.entities.unset(id, ComponentKind::SummoningSick);
        }
    }

    /// Cleanup: remove damage, end "until end of turn" effects, empty mana pools.
    pub fn end_turn(&mut self) {
        self.touch();
        for id in self.zones.cards_of_type(ZoneType::Battlefield) {
            self.entities.unset(id, ComponentKind::Damage);
            self.entities.unset(id, ComponentKind::DeathtouchDamage);
        }
        for player in PlayerId::all(self.player_count()) {
            self.players[player].mana_pool = 0;
        }
        self.expire_modifiers(ExpiryEvent::EndOfTurn);
        self.combat = CombatState::default();
    }

    // === Modifiers ===

    /// Allocate the next timestamp.
    pub fn next_timestamp(&mut self) -> Timestamp {
        self.touch();
        let ts = Timestamp(self.next_timestamp);
        self.next_timestamp += 1;
        ts
    }

    /// Add a modifier, assigning its id and timestamp.
    pub fn add_modifier(&mut self, mut modifier: Modifier) -> ModifierId {
        modifier.timestamp = self.next_timestamp();
        modifier.id = ModifierId(self.next_modifier);
        self.next_modifier += 1;
        let id = modifier.id;
        self.modifiers.push_back(modifier);
        id
    }

    /// Remove a modifier by id.
    pub fn remove_modifier(&mut self, id: ModifierId) -> Option<Modifier> {
        let index = self.modifiers.iter().position(|m| m.id == id)?;
        self.touch();
        Some(self.modifiers.remove(index))
    }

    /// Remove every modifier whose duration ends on `event`.
    ///
    /// Returns how many were removed.
    pub fn expire_modifiers(&mut self, event: ExpiryEvent) -> usize {
        let before = self.modifiers.len();
        let kept: Vector<Modifier> = self
            .modifiers
            .iter()
            .filter(|m| !m.duration.expires_on(event, m.source))
            .cloned()
            .collect();
        let removed = before - kept.len();
        if removed > 0 {
            self.touch();
            self.modifiers = kept;
            trace!(?event, removed, "modifiers expired");
        }
        removed
    }

    // === Combat ===

    /// Mutable access to combat declarations.
    pub fn combat_mut(&mut self) -> &mut CombatState {
        self.touch();
        &mut self.combat
    }

    // === Decisions and continuations ===

    /// Allocate the next decision id.
    pub fn next_decision_id(&mut self) -> DecisionId {
        self.touch();
        let id = DecisionId(self.next_decision);
        self.next_decision += 1;
        id
    }

    pub fn push_continuation(&mut self, continuation: Continuation) {
        self.touch();
        self.continuations.push_back(continuation);
    }

    /// Insert a frame below the frames pushed after `depth` was recorded.
    pub fn insert_continuation(&mut self, depth: usize, continuation: Continuation) {
        self.touch();
        let depth = depth.min(self.continuations.len());
        self.continuations.insert(depth, continuation);
    }

    pub fn pop_continuation(&mut self) -> Option<Continuation> {
        self.touch();
        self.continuations.pop_back()
    }

    /// Drop frames above `depth`.
    pub fn truncate_continuations(&mut self, depth: usize) {
        if self.continuations.len() > depth {
            self.touch();
            self.continuations.truncate(depth);
        }
    }

    pub fn set_pending_decision(&mut self, decision: PlayerDecision) {
        self.touch();
        self.pending_decision = Some(decision);
    }

    pub fn take_pending_decision(&mut self) -> Option<PlayerDecision> {
        self.touch();
        self.pending_decision.take()
    }

    // === RNG ===

    /// Mutable access to the in-state RNG.
    pub fn rng_mut(&mut self) -> &mut GameRng {
        self.touch();
        &mut self.rng
    }

    // === Invariants and persistence ===

    /// Check structural invariants.
    pub fn check_invariants(&self) -> Result<(), ProtocolError> {
        if self.pending_decision.is_some() != !self.continuations.is_empty() {
            return Err(ProtocolError::CorruptContinuation(format!(
                "pending decision {:?} with {} continuation frame(s)",
                self.pending_decision.as_ref().map(|d| d.id),
                self.continuations.len()
            )));
        }
        if !self.zones.is_consistent() {
            return Err(ProtocolError::CorruptContinuation(
                "zone index out of sync".to_string(),
            ));
        }
        if let Some(orphan) = self.entities.ids().find(|&id| !self.zones.contains(id)) {
            return Err(ProtocolError::CorruptContinuation(format!(
                "{orphan} is in no zone"
            )));
        }
        Ok(())
    }

    /// Encode the whole state, including any suspended execution.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Decode a state produced by `to_bytes`. The result has a fresh revision.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}
