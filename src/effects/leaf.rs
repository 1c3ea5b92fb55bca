//! Built-in leaf effects.
//!
//! A leaf takes the state by value and either finishes or asks for a
//! decision. When it asks, the engine records the request and an
//! `AwaitLeaf` frame holding the leaf's context; the answer is applied by
//! the decision resumer using the helpers at the bottom of this file.
//!
//! Every leaf re-reads zones from the state it is given. Entities that have
//! left the zone an effect expects are skipped rather than reported.

use tracing::trace;

use super::context::ExecutionContext;
use super::events::{DamageTarget, GameEvent};
use super::node::{Affected, LeafEffect, LookRest, Recipient};
use crate::cards::Keyword;
use crate::core::{EntityId, GameState, PlayerId};
use crate::decisions::{DecisionContext, DecisionRequest};
use crate::error::ExecutionError;
use crate::layers::{EntityFilter, FilterScope, Modifier, ProjectionCache};
use crate::rules::damage::{deal_damage, lifelink_gain, SourceTraits};
use crate::zones::{ZoneKey, ZonePosition, ZoneType};

/// Result of running a leaf.
#[derive(Clone, Debug)]
pub enum LeafOutcome {
    Done {
        state: GameState,
        ctx: ExecutionContext,
        events: Vec<GameEvent>,
    },
    /// The leaf needs an answer before it can finish.
    Suspend {
        state: GameState,
        ctx: ExecutionContext,
        events: Vec<GameEvent>,
        request: DecisionRequest,
    },
}

impl LeafOutcome {
    pub fn done(state: GameState, ctx: ExecutionContext) -> Self {
        Self::with_events(state, ctx, Vec::new())
    }

    pub fn with_events(state: GameState, ctx: ExecutionContext, events: Vec<GameEvent>) -> Self {
        LeafOutcome::Done { state, ctx, events }
    }

    pub fn ask(state: GameState, ctx: ExecutionContext, request: DecisionRequest) -> Self {
        LeafOutcome::Suspend {
            state,
            ctx,
            events: Vec::new(),
            request,
        }
    }
}

/// Run a built-in leaf. Custom leaves go through the handler registry.
pub fn execute(
    mut state: GameState,
    leaf: &LeafEffect,
    mut ctx: ExecutionContext,
    cache: &mut ProjectionCache,
) -> Result<LeafOutcome, ExecutionError> {
    trace!(leaf = leaf.name(), "leaf");
    let mut events = Vec::new();

    match leaf {
        LeafEffect::DealDamage { to, amount } => {
            let amount = non_negative(ctx.amount(&state, cache, amount)?);
            let recipients: Vec<DamageTarget> = match to {
                Recipient::Entities(what) => ctx
                    .entities(what)?
                    .into_iter()
                    .map(|id| DamageTarget::from_entity(id, state.player_count()))
                    .collect(),
                Recipient::Player(who) => vec![DamageTarget::Player(ctx.player(&state, *who)?)],
            };
            let traits = SourceTraits::of(&state, cache, ctx.source);

            let mut total = 0;
            for target in recipients {
                if let Some(event) = deal_damage(&mut state, ctx.source, traits, target, amount, false) {
                    total += amount;
                    events.push(event);
                }
            }
            if let Some(source) = ctx.source {
                events.extend(lifelink_gain(&mut state, cache, source, traits, total));
            }
        }

        LeafEffect::GainLife { player, amount } => {
            let player = ctx.player(&state, *player)?;
            let amount = ctx.amount(&state, cache, amount)?;
            if amount > 0 {
                state.gain_life(player, amount);
                events.push(GameEvent::LifeGained { player, amount });
            }
        }

        LeafEffect::LoseLife { player, amount } => {
            let player = ctx.player(&state, *player)?;
            let amount = ctx.amount(&state, cache, amount)?;
            if amount > 0 {
                state.lose_life(player, amount);
                events.push(GameEvent::LifeLost { player, amount });
            }
        }

        LeafEffect::DrawCards { player, count } => {
            let player = ctx.player(&state, *player)?;
            for _ in 0..non_negative(ctx.amount(&state, cache, count)?) {
                match state.draw_card(player) {
                    Some(card) => events.push(GameEvent::CardDrawn { player, card }),
                    None => break,
                }
            }
        }

        LeafEffect::Destroy { what } => {
            for id in ctx.entities(what)? {
                let Some(view) = cache.get_view(&state, id) else {
                    continue;
                };
                if !view.is_on_battlefield() || view.has_keyword(Keyword::Indestructible) {
                    continue;
                }
                if move_card(&mut state, id, ZoneType::Graveyard, ZonePosition::Top, &mut events).is_some() {
                    events.insert(events.len() - 1, GameEvent::Destroyed { entity: id });
                }
            }
        }

        LeafEffect::Exile { what } => {
            for id in ctx.entities(what)? {
                move_card(&mut state, id, ZoneType::Exile, ZonePosition::Top, &mut events);
            }
        }

        LeafEffect::Sacrifice { what } => {
            for id in ctx.entities(what)? {
                sacrifice(&mut state, id, &mut events);
            }
        }

        LeafEffect::Tap { what } => {
            for id in on_battlefield(&state, ctx.entities(what)?) {
                if state.tap(id) {
                    events.push(GameEvent::Tapped { entity: id });
                }
            }
        }

        LeafEffect::Untap { what } => {
            for id in on_battlefield(&state, ctx.entities(what)?) {
                if state.untap(id) {
                    events.push(GameEvent::Untapped { entity: id });
                }
            }
        }

        LeafEffect::AddCounters { what, kind, count } => {
            let count = non_negative(ctx.amount(&state, cache, count)?);
            for id in on_battlefield(&state, ctx.entities(what)?) {
                if state.add_counters(id, kind.clone(), count) {
                    events.push(GameEvent::CountersAdded {
                        entity: id,
                        kind: kind.clone(),
                        count,
                    });
                }
            }
        }

        LeafEffect::AddMana { player, amount } => {
            let player = ctx.player(&state, *player)?;
            let amount = non_negative(ctx.amount(&state, cache, amount)?);
            if amount > 0 {
                state.add_mana(player, amount);
                events.push(GameEvent::ManaAdded { player, amount });
            }
        }

        LeafEffect::CreateModifier {
            affected,
            modification,
            duration,
        } => {
            let source = ctx
                .source
                .ok_or_else(|| ExecutionError::MissingBinding("source".into()))?;
            let filter = match affected {
                Affected::Matching(filter) => Some(filter.clone()),
                Affected::Entities(what) => fixed_filter(ctx.entities(what)?),
            };
            if let Some(filter) = filter {
                let modifier = Modifier::new(source, filter, modification.clone()).with_duration(*duration);
                let id = state.add_modifier(modifier);
                events.push(GameEvent::ModifierCreated { id, source });
            }
        }

        LeafEffect::MoveToZone { what, to, position } => {
            for id in ctx.entities(what)? {
                move_card(&mut state, id, *to, *position, &mut events);
            }
        }

        LeafEffect::ShuffleLibrary { player } => {
            let player = ctx.player(&state, *player)?;
            state.shuffle_library(player);
            events.push(GameEvent::LibraryShuffled { player });
        }

        LeafEffect::StoreMatching { key, filter, zone } => {
            let scope = ctx.scope();
            let ids: Vec<EntityId> = state
                .zones()
                .cards_of_type(*zone)
                .into_iter()
                .filter(|&id| {
                    cache
                        .get_view(&state, id)
                        .is_some_and(|v| filter.matches(&v, &scope))
                })
                .collect();
            ctx.store(key.clone(), ids);
        }

        LeafEffect::SearchLibrary {
            player,
            filter,
            max,
            destination,
            store_as,
        } => {
            let player = ctx.player(&state, *player)?;
            let candidates = matching_in(&state, cache, ZoneKey::library(player), filter, &ctx.scope());
            if candidates.is_empty() || *max == 0 {
                if let Some(key) = store_as {
                    ctx.store(key.clone(), Vec::new());
                }
                return Ok(LeafOutcome::with_events(state, ctx, events));
            }
            let request = DecisionRequest::new(
                player,
                format!("Search your library for up to {max} card(s)"),
                DecisionContext::SearchLibrary {
                    max: (*max).min(candidates.len()),
                    candidates,
                    min: 0,
                    destination: *destination,
                    shuffle: true,
                    store_as: store_as.clone(),
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::Discard { player, count } => {
            let player = ctx.player(&state, *player)?;
            let hand = state.cards_in(player, ZoneType::Hand);
            if hand.is_empty() || *count == 0 {
                return Ok(LeafOutcome::done(state, ctx));
            }
            if hand.len() <= *count {
                discard(&mut state, player, &hand, &mut events);
                return Ok(LeafOutcome::with_events(state, ctx, events));
            }
            let request = DecisionRequest::new(
                player,
                format!("Discard {count} card(s)"),
                DecisionContext::Discard {
                    candidates: hand,
                    count: *count,
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::SacrificeUnlessPay { what, cost } => {
            let Some(permanent) = on_battlefield(&state, ctx.entities(what)?).into_iter().next() else {
                return Ok(LeafOutcome::done(state, ctx));
            };
            let Some(controller) = cache.get_view(&state, permanent).map(|v| v.controller) else {
                return Ok(LeafOutcome::done(state, ctx));
            };
            if !cost.can_pay(&state, controller, Some(permanent)) {
                sacrifice(&mut state, permanent, &mut events);
                return Ok(LeafOutcome::with_events(state, ctx, events));
            }
            let name = state.entities().name(permanent).unwrap_or("permanent").to_string();
            let request = DecisionRequest::new(
                controller,
                format!("Pay {cost:?} or sacrifice {name}"),
                DecisionContext::SacrificeUnless {
                    permanent,
                    cost: cost.clone(),
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::ChooseTargets { spec, store_as } => {
            let candidates = spec.legal_targets(&state, cache, ctx.controller, ctx.source);
            let min = spec.count.min();
            if candidates.len() <= min {
                if let Some(key) = store_as {
                    ctx.store(key.clone(), candidates.clone());
                }
                ctx.targets = candidates;
                return Ok(LeafOutcome::done(state, ctx));
            }
            let request = DecisionRequest::new(
                ctx.controller,
                "Choose targets",
                DecisionContext::ChooseTargets {
                    max: spec.count.max(candidates.len()),
                    candidates,
                    min,
                    store_as: store_as.clone(),
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::ReturnFromGraveyard {
            player,
            filter,
            count,
            up_to,
            destination,
        } => {
            let player = ctx.player(&state, *player)?;
            let candidates = matching_in(&state, cache, ZoneKey::graveyard(player), filter, &ctx.scope());
            if candidates.is_empty() || *count == 0 {
                return Ok(LeafOutcome::done(state, ctx));
            }
            if !up_to && candidates.len() <= *count {
                for id in candidates {
                    move_card(&mut state, id, *destination, ZonePosition::Top, &mut events);
                }
                return Ok(LeafOutcome::with_events(state, ctx, events));
            }
            let max = (*count).min(candidates.len());
            let request = DecisionRequest::new(
                player,
                format!("Return {count} card(s) from your graveyard"),
                DecisionContext::ReturnFromGraveyard {
                    candidates,
                    min: if *up_to { 0 } else { max },
                    max,
                    destination: *destination,
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::LookAtTop {
            player,
            count,
            take,
            take_to,
            rest,
        } => {
            let player = ctx.player(&state, *player)?;
            let cards = state.zones().top_cards(ZoneKey::library(player), *count);
            if cards.is_empty() {
                return Ok(LeafOutcome::done(state, ctx));
            }
            let take = (*take).min(cards.len());
            if take == cards.len() || take == 0 {
                let (to, position) = if take == 0 {
                    rest_destination(*rest)
                } else {
                    (*take_to, ZonePosition::Top)
                };
                for id in cards {
                    move_card(&mut state, id, to, position, &mut events);
                }
                return Ok(LeafOutcome::with_events(state, ctx, events));
            }
            let request = DecisionRequest::new(
                player,
                format!("Choose {take} card(s) to keep"),
                DecisionContext::LookAtTop {
                    cards,
                    take,
                    take_to: *take_to,
                    rest: *rest,
                },
            );
            return Ok(LeafOutcome::ask(state, ctx, request));
        }

        LeafEffect::Custom { handler, .. } => {
            return Err(ExecutionError::HandlerFailed {
                handler: handler.clone(),
                reason: "custom leaves run through the handler registry".into(),
            });
        }
    }

    Ok(LeafOutcome::with_events(state, ctx, events))
}

// === Shared helpers ===

/// Move a card, recording the zone change. Returns the new id.
pub(crate) fn move_card(
    state: &mut GameState,
    id: EntityId,
    to: ZoneType,
    position: ZonePosition,
    events: &mut Vec<GameEvent>,
) -> Option<EntityId> {
    let from = state.zones().get_zone(id)?.zone_type;
    let new = state.move_to_zone(id, to, position)?;
    events.push(GameEvent::ZoneChanged { old: id, new, from, to });
    Some(new)
}

/// Sacrifice a permanent if it is still on the battlefield.
pub(crate) fn sacrifice(state: &mut GameState, id: EntityId, events: &mut Vec<GameEvent>) {
    if !state.zones().is_in_zone_type(id, ZoneType::Battlefield) {
        return;
    }
    events.push(GameEvent::Sacrificed { entity: id });
    move_card(state, id, ZoneType::Graveyard, ZonePosition::Top, events);
}

/// Discard cards that are still in the player's hand.
pub(crate) fn discard(state: &mut GameState, player: PlayerId, cards: &[EntityId], events: &mut Vec<GameEvent>) {
    for &card in cards {
        if !state.zones().is_in_zone(card, ZoneKey::hand(player)) {
            continue;
        }
        events.push(GameEvent::Discarded { player, card });
        move_card(state, card, ZoneType::Graveyard, ZonePosition::Top, events);
    }
}

/// Where the cards not taken by a look-at-top effect go.
pub(crate) fn rest_destination(rest: LookRest) -> (ZoneType, ZonePosition) {
    match rest {
        LookRest::LibraryBottom => (ZoneType::Library, ZonePosition::Bottom),
        LookRest::Graveyard => (ZoneType::Graveyard, ZonePosition::Top),
    }
}

/// Cards in a zone matching a filter, in zone order.
pub(crate) fn matching_in(
    state: &GameState,
    cache: &mut ProjectionCache,
    zone: ZoneKey,
    filter: &EntityFilter,
    scope: &FilterScope,
) -> Vec<EntityId> {
    state
        .zones()
        .cards(zone)
        .into_iter()
        .filter(|&id| cache.get_view(state, id).is_some_and(|v| filter.matches(&v, scope)))
        .collect()
}

fn on_battlefield(state: &GameState, ids: Vec<EntityId>) -> Vec<EntityId> {
    ids.into_iter()
        .filter(|&id| state.zones().is_in_zone_type(id, ZoneType::Battlefield))
        .collect()
}

/// A filter that names exactly these entities, or `None` for no entities.
fn fixed_filter(ids: Vec<EntityId>) -> Option<EntityFilter> {
    match ids.as_slice() {
        [] => None,
        [one] => Some(EntityFilter::Specific(*one)),
        _ => Some(EntityFilter::Or(ids.into_iter().map(EntityFilter::Specific).collect())),
    }
}

fn non_negative(n: i64) -> u32 {
    n.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::{CounterKind, GameConfig};
    use crate::effects::node::{Amount, EntityRef, PlayerRef};
    use crate::layers::{Duration, Modification};

    fn setup() -> (GameState, PlayerId, PlayerId) {
        (GameState::new(&GameConfig::default()), PlayerId::new(0), PlayerId::new(1))
    }

    fn run(state: GameState, leaf: LeafEffect, ctx: ExecutionContext) -> LeafOutcome {
        execute(state, &leaf, ctx, &mut ProjectionCache::new()).unwrap()
    }

    fn finished(outcome: LeafOutcome) -> (GameState, ExecutionContext, Vec<GameEvent>) {
        match outcome {
            LeafOutcome::Done { state, ctx, events } => (state, ctx, events),
            LeafOutcome::Suspend { request, .. } => panic!("unexpected decision {request:?}"),
        }
    }

    #[test]
    fn test_deal_damage_to_targets_and_players() {
        let (mut state, p0, p1) = setup();
        let bears = state.create_card(p1, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let ctx = ExecutionContext::new(p0).with_targets([bears, EntityId::player(p1)]);

        let (state, _, events) = finished(run(
            state,
            LeafEffect::DealDamage {
                to: Recipient::Entities(EntityRef::AllTargets),
                amount: Amount::Fixed(2),
            },
            ctx,
        ));

        assert_eq!(state.entities().damage(bears), 2);
        assert_eq!(state.life(p1), 18);
        assert_eq!(GameEvent::total_damage(&events), 4);
    }

    #[test]
    fn test_lifelink_source_gains_once() {
        let (mut state, p0, p1) = setup();
        let cleric = state.create_card(
            p0,
            Characteristics::creature("Cleric", 1, 1).with_keyword(Keyword::Lifelink),
            ZoneType::Battlefield,
        );
        let ctx = ExecutionContext::new(p0)
            .with_source(cleric)
            .with_targets([EntityId::player(p1), EntityId::player(p1)]);

        let (state, _, _) = finished(run(
            state,
            LeafEffect::DealDamage {
                to: Recipient::Entities(EntityRef::AllTargets),
                amount: Amount::Fixed(3),
            },
            ctx,
        ));

        assert_eq!(state.life(p1), 14);
        assert_eq!(state.life(p0), 26);
    }

    #[test]
    fn test_destroy_skips_indestructible() {
        let (mut state, p0, _) = setup();
        let bears = state.create_card(p0, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let golem = state.create_card(
            p0,
            Characteristics::creature("Golem", 3, 3).with_keyword(Keyword::Indestructible),
            ZoneType::Battlefield,
        );
        let ctx = ExecutionContext::new(p0).with_targets([bears, golem]);

        let (state, _, events) = finished(run(state, LeafEffect::Destroy { what: EntityRef::AllTargets }, ctx));

        assert!(!state.entities().contains(bears));
        assert!(state.entities().contains(golem));
        assert_eq!(state.cards_in(p0, ZoneType::Graveyard).len(), 1);
        assert!(matches!(events[0], GameEvent::Destroyed { entity } if entity == bears));
        assert!(matches!(events[1], GameEvent::ZoneChanged { to: ZoneType::Graveyard, .. }));
    }

    #[test]
    fn test_draw_stops_at_empty_library() {
        let (mut state, p0, _) = setup();
        state.create_card(p0, Characteristics::new("Card"), ZoneType::Library);

        let (state, _, events) = finished(run(
            state,
            LeafEffect::DrawCards {
                player: PlayerRef::Controller,
                count: Amount::Fixed(3),
            },
            ExecutionContext::new(p0),
        ));

        assert_eq!(state.cards_in(p0, ZoneType::Hand).len(), 1);
        assert_eq!(events.len(), 1);
        assert!(state.player(p0).unwrap().drew_from_empty);
    }

    #[test]
    fn test_counters_and_modifier() {
        let (mut state, p0, _) = setup();
        let bears = state.create_card(p0, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let ctx = ExecutionContext::new(p0).with_source(bears);

        let (state, ctx, _) = finished(run(
            state,
            LeafEffect::AddCounters {
                what: EntityRef::Source,
                kind: CounterKind::PlusOne,
                count: Amount::Fixed(1),
            },
            ctx,
        ));
        let (state, _, events) = finished(run(
            state,
            LeafEffect::CreateModifier {
                affected: Affected::Entities(EntityRef::Source),
                modification: Modification::ModifyPowerToughness {
                    power: 2,
                    toughness: 0,
                },
                duration: Duration::UntilEndOfTurn,
            },
            ctx,
        ));

        let mut cache = ProjectionCache::new();
        let view = cache.get_view(&state, bears).unwrap();
        assert_eq!((view.power, view.toughness), (Some(5), Some(3)));
        assert!(matches!(events[0], GameEvent::ModifierCreated { source, .. } if source == bears));
    }

    #[test]
    fn test_store_matching() {
        let (mut state, p0, p1) = setup();
        state.create_card(p0, Characteristics::creature("A", 1, 1), ZoneType::Battlefield);
        let theirs = state.create_card(p1, Characteristics::creature("B", 1, 1), ZoneType::Battlefield);

        let (_, ctx, _) = finished(run(
            state,
            LeafEffect::StoreMatching {
                key: "theirs".into(),
                filter: EntityFilter::Creatures.and(EntityFilter::Not(Box::new(EntityFilter::ControlledByYou))),
                zone: ZoneType::Battlefield,
            },
            ExecutionContext::new(p0),
        ));

        assert_eq!(ctx.stored["theirs"], vec![theirs]);
    }

    #[test]
    fn test_discard_whole_hand_without_asking() {
        let (mut state, p0, _) = setup();
        state.create_card(p0, Characteristics::new("A"), ZoneType::Hand);
        state.create_card(p0, Characteristics::new("B"), ZoneType::Hand);

        let (state, _, events) = finished(run(
            state,
            LeafEffect::Discard {
                player: PlayerRef::Controller,
                count: 3,
            },
            ExecutionContext::new(p0),
        ));

        assert!(state.cards_in(p0, ZoneType::Hand).is_empty());
        assert_eq!(
            events.iter().filter(|e| matches!(e, GameEvent::Discarded { .. })).count(),
            2
        );
    }

    #[test]
    fn test_discard_asks_when_hand_is_larger() {
        let (mut state, p0, _) = setup();
        for name in ["A", "B", "C"] {
            state.create_card(p0, Characteristics::new(name), ZoneType::Hand);
        }

        let outcome = run(
            state,
            LeafEffect::Discard {
                player: PlayerRef::Controller,
                count: 1,
            },
            ExecutionContext::new(p0),
        );

        match outcome {
            LeafOutcome::Suspend { request, .. } => {
                assert_eq!(request.player, p0);
                assert!(matches!(request.context, DecisionContext::Discard { count: 1, ref candidates } if candidates.len() == 3));
            }
            LeafOutcome::Done { .. } => panic!("expected a decision"),
        }
    }

    #[test]
    fn test_search_with_no_candidates_is_silent() {
        let (state, p0, _) = setup();

        let (state, ctx, events) = finished(run(
            state,
            LeafEffect::SearchLibrary {
                player: PlayerRef::Controller,
                filter: EntityFilter::Creatures,
                max: 1,
                destination: ZoneType::Hand,
                store_as: Some("found".into()),
            },
            ExecutionContext::new(p0),
        ));

        assert!(events.is_empty());
        assert_eq!(ctx.stored["found"], Vec::<EntityId>::new());
        assert!(!state.is_suspended());
    }

    #[test]
    fn test_sacrifice_unless_pay_unaffordable() {
        let (mut state, p0, _) = setup();
        let wall = state.create_card(p0, Characteristics::creature("Wall", 0, 4), ZoneType::Battlefield);
        let ctx = ExecutionContext::new(p0).with_source(wall);

        let (state, _, events) = finished(run(
            state,
            LeafEffect::SacrificeUnlessPay {
                what: EntityRef::Source,
                cost: crate::effects::Cost::Mana(2),
            },
            ctx,
        ));

        assert!(!state.entities().contains(wall));
        assert!(matches!(events[0], GameEvent::Sacrificed { entity } if entity == wall));
    }

    #[test]
    fn test_look_at_top_take_all() {
        let (mut state, p0, _) = setup();
        state.create_card(p0, Characteristics::new("A"), ZoneType::Library);
        state.create_card(p0, Characteristics::new("B"), ZoneType::Library);

        let (state, _, _) = finished(run(
            state,
            LeafEffect::LookAtTop {
                player: PlayerRef::Controller,
                count: 5,
                take: 5,
                take_to: ZoneType::Hand,
                rest: LookRest::LibraryBottom,
            },
            ExecutionContext::new(p0),
        ));

        assert_eq!(state.cards_in(p0, ZoneType::Hand).len(), 2);
        assert!(state.cards_in(p0, ZoneType::Library).is_empty());
    }

    #[test]
    fn test_missing_source_binding() {
        let (state, p0, _) = setup();
        let err = execute(
            state,
            &LeafEffect::Tap { what: EntityRef::Source },
            ExecutionContext::new(p0),
            &mut ProjectionCache::new(),
        )
        .unwrap_err();
        assert_eq!(err, ExecutionError::MissingBinding("source".into()));
    }
}
