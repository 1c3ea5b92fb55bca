//! Combat damage assignment for a single attacker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cards::Keyword;
use crate::core::{EntityId, GameState, PlayerId};
use crate::layers::{ProjectedView, ProjectionCache};

/// Combat damage sub-step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageStep {
    FirstStrike,
    Regular,
}

impl DamageStep {
    /// Does this creature deal combat damage in this step?
    #[must_use]
    pub fn includes(self, view: &ProjectedView) -> bool {
        let first = view.has_keyword(Keyword::FirstStrike);
        let double = view.has_keyword(Keyword::DoubleStrike);
        match self {
            DamageStep::FirstStrike => first || double,
            DamageStep::Regular => !first || double,
        }
    }
}

/// How an attacker's combat damage would be assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatDamage {
    /// Zero power, or blocked with nothing left to hit.
    NoDamage,
    Unblocked { defender: PlayerId, amount: u32 },
    /// `to_blockers` holds non-zero assignments; `trample` goes to `defender`.
    Blocked {
        defender: PlayerId,
        to_blockers: BTreeMap<EntityId, u32>,
        trample: u32,
    },
    Invalid(String),
}

impl CombatDamage {
    /// Total damage assigned.
    #[must_use]
    pub fn total(&self) -> u32 {
        match self {
            CombatDamage::Unblocked { amount, .. } => *amount,
            CombatDamage::Blocked {
                to_blockers, trample, ..
            } => to_blockers.values().sum::<u32>() + trample,
            CombatDamage::NoDamage | CombatDamage::Invalid(_) => 0,
        }
    }
}

/// Work out where an attacking creature's damage goes.
///
/// Blockers are taken in the attacker's damage assignment order. Each gets
/// lethal damage before the next is considered (1 with deathtouch). With
/// trample the rest goes to the defending player; without it the rest goes
/// to the last blocker.
pub fn calculate_combat_damage(state: &GameState, cache: &mut ProjectionCache, attacker: EntityId) -> CombatDamage {
    let Some(view) = cache.get_view(state, attacker) else {
        return CombatDamage::Invalid(format!("{attacker} does not exist"));
    };
    let Some(defender) = state.combat().defender_of(attacker) else {
        return CombatDamage::Invalid(format!("{} is not attacking", view.name));
    };

    let power = view.effective_power();
    if power <= 0 {
        return CombatDamage::NoDamage;
    }
    let power = power as u32;

    if !state.combat().is_blocked(attacker) {
        return CombatDamage::Unblocked {
            defender,
            amount: power,
        };
    }

    let trample = view.has_keyword(Keyword::Trample);
    let deathtouch = view.has_keyword(Keyword::Deathtouch);
    let blockers: Vec<ProjectedView> = state
        .combat()
        .blockers_of(attacker)
        .iter()
        .filter_map(|&b| cache.get_view(state, b))
        .filter(ProjectedView::is_on_battlefield)
        .collect();

    let mut to_blockers = BTreeMap::new();
    let Some(last) = blockers.last().map(|b| b.id) else {
        if !trample {
            return CombatDamage::NoDamage;
        }
        return CombatDamage::Blocked {
            defender,
            to_blockers,
            trample: power,
        };
    };

    if blockers.len() == 1 && !trample {
        to_blockers.insert(last, power);
        return CombatDamage::Blocked {
            defender,
            to_blockers,
            trample: 0,
        };
    }

    let mut remaining = power;
    for blocker in &blockers {
        let lethal = if deathtouch {
            1
        } else {
            blocker.lethal_damage_remaining()
        };
        let assigned = remaining.min(lethal);
        if assigned > 0 {
            to_blockers.insert(blocker.id, assigned);
        }
        remaining -= assigned;
    }

    let mut overflow = 0;
    if trample {
        overflow = remaining;
    } else if remaining > 0 {
        *to_blockers.entry(last).or_insert(0) += remaining;
    }

    CombatDamage::Blocked {
        defender,
        to_blockers,
        trample: overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Characteristics;
    use crate::core::GameConfig;
    use crate::zones::ZoneType;

    fn setup() -> (GameState, PlayerId, PlayerId) {
        (GameState::new(&GameConfig::default()), PlayerId::new(0), PlayerId::new(1))
    }

    fn attack(state: &mut GameState, attacker: EntityId, defender: PlayerId, blockers: &[EntityId]) {
        state.combat_mut().add_attacker(attacker, defender);
        for &b in blockers {
            state.combat_mut().add_blocker(b, attacker);
        }
    }

    #[test]
    fn test_unblocked_and_zero_power() {
        let (mut state, p0, p1) = setup();
        let bears = state.create_card(p0, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let wall = state.create_card(p0, Characteristics::creature("Wall", 0, 4), ZoneType::Battlefield);
        attack(&mut state, bears, p1, &[]);
        attack(&mut state, wall, p1, &[]);
        let mut cache = ProjectionCache::new();

        assert_eq!(
            calculate_combat_damage(&state, &mut cache, bears),
            CombatDamage::Unblocked {
                defender: p1,
                amount: 2
            }
        );
        assert_eq!(calculate_combat_damage(&state, &mut cache, wall), CombatDamage::NoDamage);
    }

    #[test]
    fn test_not_attacking_is_invalid() {
        let (mut state, p0, _) = setup();
        let bears = state.create_card(p0, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let mut cache = ProjectionCache::new();

        assert!(matches!(
            calculate_combat_damage(&state, &mut cache, bears),
            CombatDamage::Invalid(_)
        ));
    }

    #[test]
    fn test_single_blocker_takes_everything() {
        let (mut state, p0, p1) = setup();
        let giant = state.create_card(p0, Characteristics::creature("Giant", 5, 5), ZoneType::Battlefield);
        let bears = state.create_card(p1, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        attack(&mut state, giant, p1, &[bears]);

        let damage = calculate_combat_damage(&state, &mut ProjectionCache::new(), giant);
        assert_eq!(
            damage,
            CombatDamage::Blocked {
                defender: p1,
                to_blockers: BTreeMap::from([(bears, 5)]),
                trample: 0
            }
        );
    }

    #[test]
    fn test_trample_counts_marked_damage() {
        let (mut state, p0, p1) = setup();
        let wurm = state.create_card(
            p0,
            Characteristics::creature("Wurm", 6, 6).with_keyword(Keyword::Trample),
            ZoneType::Battlefield,
        );
        let ogre = state.create_card(p1, Characteristics::creature("Ogre", 3, 3), ZoneType::Battlefield);
        state.mark_damage(ogre, 2, false);
        attack(&mut state, wurm, p1, &[ogre]);

        let damage = calculate_combat_damage(&state, &mut ProjectionCache::new(), wurm);
        assert_eq!(
            damage,
            CombatDamage::Blocked {
                defender: p1,
                to_blockers: BTreeMap::from([(ogre, 1)]),
                trample: 5
            }
        );
        assert_eq!(damage.total(), 6);
    }

    #[test]
    fn test_multiple_blockers_excess_to_last() {
        let (mut state, p0, p1) = setup();
        let giant = state.create_card(p0, Characteristics::creature("Giant", 7, 7), ZoneType::Battlefield);
        let a = state.create_card(p1, Characteristics::creature("A", 2, 2), ZoneType::Battlefield);
        let b = state.create_card(p1, Characteristics::creature("B", 3, 3), ZoneType::Battlefield);
        attack(&mut state, giant, p1, &[a, b]);

        let damage = calculate_combat_damage(&state, &mut ProjectionCache::new(), giant);
        assert_eq!(
            damage,
            CombatDamage::Blocked {
                defender: p1,
                to_blockers: BTreeMap::from([(a, 2), (b, 5)]),
                trample: 0
            }
        );
    }

    #[test]
    fn test_deathtouch_trample_needs_one_each() {
        let (mut state, p0, p1) = setup();
        let hydra = state.create_card(
            p0,
            Characteristics::creature("Hydra", 4, 4)
                .with_keyword(Keyword::Trample)
                .with_keyword(Keyword::Deathtouch),
            ZoneType::Battlefield,
        );
        let a = state.create_card(p1, Characteristics::creature("A", 3, 3), ZoneType::Battlefield);
        let b = state.create_card(p1, Characteristics::creature("B", 5, 5), ZoneType::Battlefield);
        attack(&mut state, hydra, p1, &[a, b]);

        let damage = calculate_combat_damage(&state, &mut ProjectionCache::new(), hydra);
        assert_eq!(
            damage,
            CombatDamage::Blocked {
                defender: p1,
                to_blockers: BTreeMap::from([(a, 1), (b, 1)]),
                trample: 2
            }
        );
    }

    #[test]
    fn test_blockers_gone() {
        let (mut state, p0, p1) = setup();
        let bears = state.create_card(p0, Characteristics::creature("Bears", 2, 2), ZoneType::Battlefield);
        let wurm = state.create_card(
            p0,
            Characteristics::creature("Wurm", 6, 6).with_keyword(Keyword::Trample),
            ZoneType::Battlefield,
        );
        let x = state.create_card(p1, Characteristics::creature("X", 1, 1), ZoneType::Battlefield);
        let y = state.create_card(p1, Characteristics::creature("Y", 1, 1), ZoneType::Battlefield);
        attack(&mut state, bears, p1, &[x]);
        attack(&mut state, wurm, p1, &[y]);
        state.combat_mut().remove_entity(x);
        state.combat_mut().remove_entity(y);
        let mut cache = ProjectionCache::new();

        assert_eq!(calculate_combat_damage(&state, &mut cache, bears), CombatDamage::NoDamage);
        assert_eq!(calculate_combat_damage(&state, &mut cache, wurm).total(), 6);
    }

    #[test]
    fn test_step_membership() {
        let plain = ProjectedView::from_base(EntityId(5), &Characteristics::creature("P", 1, 1), PlayerId::new(0));
        let first = ProjectedView::from_base(
            EntityId(6),
            &Characteristics::creature("F", 1, 1).with_keyword(Keyword::FirstStrike),
            PlayerId::new(0),
        );
        let double = ProjectedView::from_base(
            EntityId(7),
            &Characteristics::creature("D", 1, 1).with_keyword(Keyword::DoubleStrike),
            PlayerId::new(0),
        );

        assert!(!DamageStep::FirstStrike.includes(&plain));
        assert!(DamageStep::Regular.includes(&plain));
        assert!(DamageStep::FirstStrike.includes(&first));
        assert!(!DamageStep::Regular.includes(&first));
        assert!(DamageStep::FirstStrike.includes(&double));
        assert!(DamageStep::Regular.includes(&double));
    }
}
