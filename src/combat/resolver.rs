//! Combat damage steps.
//!
//! A step works out every assignment against the state as it was when the
//! step began, deals all of it at once, applies lifelink once per source,
//! then runs state-based actions. A creature destroyed in the first-strike
//! step is a new object in the graveyard by the regular step, so it deals
//! nothing there.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cards::Keyword;
use crate::core::{EntityId, GameState};
use crate::effects::{DamageTarget, GameEvent};
use crate::layers::ProjectionCache;
use crate::rules::damage::{deal_damage, lifelink_gain, SourceTraits};
use crate::rules::state_based::apply_state_based_actions;

use super::damage::{calculate_combat_damage, CombatDamage, DamageStep};

/// One piece of combat damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageAssignment {
    pub source: EntityId,
    pub target: DamageTarget,
    pub amount: u32,
}

/// Result of resolving one or more damage steps.
#[derive(Clone, Debug)]
pub struct DamageStepOutcome {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub assignments: Vec<DamageAssignment>,
}

/// Damage steps this combat needs: a first-strike step only when some
/// combatant has first strike or double strike.
pub fn damage_steps(state: &GameState, cache: &mut ProjectionCache) -> Vec<DamageStep> {
    let any_first = state.combat().combatants().into_iter().any(|id| {
        cache
            .get_view(state, id)
            .is_some_and(|v| v.has_keyword(Keyword::FirstStrike) || v.has_keyword(Keyword::DoubleStrike))
    });
    if any_first {
        vec![DamageStep::FirstStrike, DamageStep::Regular]
    } else {
        vec![DamageStep::Regular]
    }
}

/// Every assignment for `step`, read from `state` before any is dealt.
pub fn plan_damage_step(state: &GameState, cache: &mut ProjectionCache, step: DamageStep) -> Vec<DamageAssignment> {
    let mut plan = Vec::new();

    let attackers: Vec<_> = state.combat().attackers().collect();
    for (attacker, _) in attackers {
        if !cache.get_view(state, attacker).is_some_and(|v| step.includes(&v)) {
            continue;
        }
        match calculate_combat_damage(state, cache, attacker) {
            CombatDamage::Unblocked { defender, amount } => plan.push(DamageAssignment {
                source: attacker,
                target: DamageTarget::Player(defender),
                amount,
            }),
            CombatDamage::Blocked {
                defender,
                to_blockers,
                trample,
            } => {
                plan.extend(to_blockers.into_iter().map(|(blocker, amount)| DamageAssignment {
                    source: attacker,
                    target: DamageTarget::Permanent(blocker),
                    amount,
                }));
                if trample > 0 {
                    plan.push(DamageAssignment {
                        source: attacker,
                        target: DamageTarget::Player(defender),
                        amount: trample,
                    });
                }
            }
            CombatDamage::NoDamage => {}
            CombatDamage::Invalid(reason) => {
                debug!(%attacker, %reason, "attacker skipped");
            }
        }
    }

    let blocks: Vec<_> = state.combat().blocks().collect();
    for (blocker, attacker) in blocks {
        let Some(view) = cache.get_view(state, blocker) else {
            continue;
        };
        if !view.is_on_battlefield() || !step.includes(&view) || view.effective_power() <= 0 {
            continue;
        }
        if !cache.get_view(state, attacker).is_some_and(|v| v.is_on_battlefield()) {
            continue;
        }
        plan.push(DamageAssignment {
            source: blocker,
            target: DamageTarget::Permanent(attacker),
            amount: view.effective_power() as u32,
        });
    }

    plan
}

/// Resolve one combat damage step.
pub fn resolve_damage_step(state: &GameState, cache: &mut ProjectionCache, step: DamageStep) -> DamageStepOutcome {
    let assignments = plan_damage_step(state, cache, step);
    debug!(?step, assignments = assignments.len(), "combat damage planned");

    let traits: BTreeMap<EntityId, SourceTraits> = assignments
        .iter()
        .map(|a| (a.source, SourceTraits::of(state, cache, Some(a.source))))
        .collect();

    let mut next = state.clone();
    let mut events = Vec::new();
    let mut dealt: BTreeMap<EntityId, u32> = BTreeMap::new();

    for a in &assignments {
        let source_traits = traits.get(&a.source).copied().unwrap_or_default();
        if let Some(event) = deal_damage(&mut next, Some(a.source), source_traits, a.target, a.amount, true) {
            *dealt.entry(a.source).or_insert(0) += a.amount;
            events.push(event);
        }
    }

    for (source, total) in dealt {
        let source_traits = traits.get(&source).copied().unwrap_or_default();
        events.extend(lifelink_gain(&mut next, cache, source, source_traits, total));
    }

    events.extend(apply_state_based_actions(&mut next, cache));

    DamageStepOutcome {
        state: next,
        events,
        assignments,
    }
}

/// Resolve every damage step of the current combat in order.
pub fn resolve_combat_damage(state: &GameState, cache: &mut ProjectionCache) -> DamageStepOutcome {
    let mut outcome = DamageStepOutcome {
        state: state.clone(),
        events: Vec::new(),
        assignments: Vec::new(),
    };

    for step in damage_steps(state, cache) {
        let step_outcome = resolve_damage_step(&outcome.state, cache, step);
        outcome.state = step_outcome.state;
        outcome.events.extend(step_outcome.events);
        outcome.assignments.extend(step_outcome.assignments);
    }

    outcome
}

/// Leave combat: nothing is attacking or blocking any more.
pub fn end_combat(state: &mut GameState) {
    state.combat_mut().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::{GameConfig, PlayerId};
    use crate::zones::ZoneType;

    #[test]
    fn test_simultaneous_trade() {
        let mut state = GameState::new(&GameConfig::default());
        let (p0, p1) = (PlayerId::new(0), PlayerId::new(1));
        let a = state.create_card(p0, Characteristics::creature("A", 3, 2), ZoneType::Battlefield);
        let b = state.create_card(p1, Characteristics::creature("B", 2, 3), ZoneType::Battlefield);
        state.combat_mut().add_attacker(a, p1);
        state.combat_mut().add_blocker(b, a);
        let mut cache = ProjectionCache::new();

        let outcome = resolve_combat_damage(&state, &mut cache);

        assert_eq!(outcome.assignments.len(), 2);
        assert!(outcome.state.cards_in(p0, ZoneType::Battlefield).is_empty());
        assert!(outcome.state.cards_in(p1, ZoneType::Battlefield).is_empty());
        assert_eq!(
            outcome
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::Destroyed { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_first_strike_kills_before_regular() {
        let mut state = GameState::new(&GameConfig::default());
        let (p0, p1) = (PlayerId::new(0), PlayerId::new(1));
        let knight = state.create_card(
            p0,
            Characteristics::creature("Knight", 2, 2).with_keyword(Keyword::FirstStrike),
            ZoneType::Battlefield,
        );
        let bears = state.create_card(p1, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        state.combat_mut().add_attacker(knight, p1);
        state.combat_mut().add_blocker(bears, knight);
        let mut cache = ProjectionCache::new();

        assert_eq!(
            damage_steps(&state, &mut cache),
            vec![DamageStep::FirstStrike, DamageStep::Regular]
        );
        let outcome = resolve_combat_damage(&state, &mut cache);

        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.state.cards_in(p0, ZoneType::Battlefield), vec![knight]);
        assert!(outcome.state.cards_in(p1, ZoneType::Battlefield).is_empty());
    }

    #[test]
    fn test_lifelink_once_per_source() {
        let mut state = GameState::new(&GameConfig::default());
        let (p0, p1) = (PlayerId::new(0), PlayerId::new(1));
        let cleric = state.create_card(
            p0,
            Characteristics::creature("Cleric", 5, 5)
                .with_keyword(Keyword::Lifelink)
                .with_keyword(Keyword::Trample),
            ZoneType::Battlefield,
        );
        let bears = state.create_card(p1, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        state.combat_mut().add_attacker(cleric, p1);
        state.combat_mut().add_blocker(bears, cleric);
        let mut cache = ProjectionCache::new();

        let outcome = resolve_damage_step(&state, &mut cache, DamageStep::Regular);

        assert_eq!(outcome.state.life(p0), 25);
        assert_eq!(outcome.state.life(p1), 17);
        let gains: Vec<_> = outcome
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LifeGained { .. }))
            .collect();
        assert_eq!(gains.len(), 1);
    }

    #[test]
    fn test_end_combat() {
        let mut state = GameState::new(&GameConfig::default());
        let a = state.create_card(
            PlayerId::new(0),
            Characteristics::creature("A", 1, 1),
            ZoneType::Battlefield,
        );
        state.combat_mut().add_attacker(a, PlayerId::new(1));

        end_combat(&mut state);
        assert!(state.combat().is_empty());
    }
}
