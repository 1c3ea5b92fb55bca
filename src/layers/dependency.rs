//! Dependency ordering of modifiers within one layer.
//!
//! Modifier A depends on modifier B when B can change a characteristic
//! that A's filter reads. Within a (sub)layer, B then applies before A
//! regardless of timestamps; independent modifiers keep timestamp order.
//!
//! Only same-(sub)layer dependencies are resolved. An effect in a later
//! layer whose filter reads a characteristic changed in an earlier layer
//! already sees the change, because layers are applied in order.

use std::collections::BTreeSet;

use tracing::trace;

use super::modifier::Modifier;

/// Check whether `a` depends on `b`.
///
/// A modifier never depends on itself. Distinct modifiers are compared by
/// what they read and change, even when their ids and timestamps are equal.
#[must_use]
pub fn depends_on(a: &Modifier, b: &Modifier) -> bool {
    if std::ptr::eq(a, b) {
        return false;
    }
    if a.step() != b.step() || a.filter.is_self_scoped() {
        return false;
    }
    let changed = b.modification.changes();
    a.filter.inspected().iter().any(|c| changed.contains(c))
}

/// Sort same-layer modifiers by dependency, then timestamp.
///
/// Kahn's algorithm with the ready set ordered by `(timestamp, id)`. When
/// every remaining modifier is waiting on another (a dependency cycle),
/// the oldest remaining modifier is emitted next, so a cyclic subset falls
/// back to timestamp order. Always terminates.
pub fn sort_with_dependencies<'a>(modifiers: &[&'a Modifier]) -> Vec<&'a Modifier> {
    let n = modifiers.len();
    if n <= 1 {
        return modifiers.to_vec();
    }

    // waiting_on[i]: modifiers that must apply before i.
    let mut waiting_on: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut has_edges = false;
    for i in 0..n {
        for j in 0..n {
            if i != j && depends_on(modifiers[i], modifiers[j]) {
                waiting_on[i].insert(j);
                has_edges = true;
            }
        }
    }

    let key = |i: usize| modifiers[i].order_key();

    if !has_edges {
        let mut sorted = modifiers.to_vec();
        sorted.sort_by_key(|m| m.order_key());
        return sorted;
    }

    let mut emitted = vec![false; n];
    let mut result = Vec::with_capacity(n);

    while result.len() < n {
        let ready = (0..n)
            .filter(|&i| !emitted[i] && waiting_on[i].iter().all(|&j| emitted[j]))
            .min_by_key(|&i| key(i));

        let next = match ready {
            Some(i) => i,
            None => {
                // Cycle: take the oldest remaining modifier.
                let Some(oldest) = (0..n).filter(|&i| !emitted[i]).min_by_key(|&i| key(i)) else {
                    break;
                };
                trace!(modifier = ?modifiers[oldest].id, "dependency cycle, using timestamp order");
                oldest
            }
        };

        emitted[next] = true;
        result.push(modifiers[next]);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardType, Color, Keyword};
    use crate::core::EntityId;
    use crate::layers::{EntityFilter, Modification};

    fn modifier(id: u64, filter: EntityFilter, modification: Modification) -> Modifier {
        Modifier::new(EntityId(100 + id as u32), filter, modification)
            .with_id(id)
            .with_timestamp(id)
    }

    fn make_creatures(id: u64) -> Modifier {
        modifier(
            id,
            EntityFilter::HasCardType(CardType::Artifact),
            Modification::AddCardTypes([CardType::Creature].into_iter().collect()),
        )
    }

    fn creatures_are_zombies(id: u64) -> Modifier {
        modifier(
            id,
            EntityFilter::Creatures,
            Modification::AddSubtypes(["Zombie".to_string()].into_iter().collect()),
        )
    }

    #[test]
    fn test_no_dependencies_sorts_by_timestamp() {
        let a = modifier(
            2,
            EntityFilter::Creatures,
            Modification::AddKeywords([Keyword::Flying].into_iter().collect()),
        );
        let b = modifier(
            1,
            EntityFilter::Creatures,
            Modification::AddKeywords([Keyword::Trample].into_iter().collect()),
        );

        // Filters read card type, modifications change keywords: no edge.
        let sorted = sort_with_dependencies(&[&a, &b]);
        assert_eq!(sorted[0].id, b.id);
        assert_eq!(sorted[1].id, a.id);
    }

    #[test]
    fn test_dependency_overrides_timestamp() {
        // The zombie effect is older but reads card types the other one changes.
        let zombies = creatures_are_zombies(1);
        let animate = make_creatures(2);

        assert!(depends_on(&zombies, &animate));
        assert!(!depends_on(&animate, &zombies));

        let sorted = sort_with_dependencies(&[&zombies, &animate]);
        assert_eq!(sorted[0].id, animate.id);
        assert_eq!(sorted[1].id, zombies.id);

        let sorted = sort_with_dependencies(&[&animate, &zombies]);
        assert_eq!(sorted[0].id, animate.id);
    }

    #[test]
    fn test_unregistered_modifiers_keep_their_edge() {
        // Built without ids or timestamps, as hypothetical modifiers are.
        let zombies = Modifier::new(
            EntityId(50),
            EntityFilter::Creatures,
            Modification::AddSubtypes(["Zombie".to_string()].into_iter().collect()),
        );
        let animate = Modifier::new(
            EntityId(51),
            EntityFilter::HasCardType(CardType::Artifact),
            Modification::AddCardTypes([CardType::Creature].into_iter().collect()),
        );
        assert_eq!((zombies.id, zombies.timestamp), (animate.id, animate.timestamp));

        assert!(depends_on(&zombies, &animate));
        assert!(!depends_on(&zombies, &zombies));
        for input in [[&zombies, &animate], [&animate, &zombies]] {
            let sorted = sort_with_dependencies(&input);
            assert_eq!(sorted[0].source, animate.source);
            assert_eq!(sorted[1].source, zombies.source);
        }
    }

    #[test]
    fn test_self_scoped_has_no_edges() {
        let own = modifier(
            1,
            EntityFilter::Source,
            Modification::AddSubtypes(["Zombie".to_string()].into_iter().collect()),
        );
        let animate = make_creatures(2);

        assert!(!depends_on(&own, &animate));
        let sorted = sort_with_dependencies(&[&animate, &own]);
        assert_eq!(sorted[0].id, own.id);
    }

    #[test]
    fn test_different_layers_never_depend() {
        let whiten = modifier(
            1,
            EntityFilter::Creatures,
            Modification::SetColors([Color::White].into_iter().collect()),
        );
        let white_anthem = modifier(
            2,
            EntityFilter::HasColor(Color::White),
            Modification::ModifyPowerToughness {
                power: 1,
                toughness: 1,
            },
        );

        assert!(!depends_on(&white_anthem, &whiten));
    }

    #[test]
    fn test_cycle_falls_back_to_timestamp() {
        // Each reads card types and changes card types.
        let a = modifier(
            3,
            EntityFilter::HasCardType(CardType::Land),
            Modification::AddCardTypes([CardType::Artifact].into_iter().collect()),
        );
        let b = modifier(
            1,
            EntityFilter::HasCardType(CardType::Artifact),
            Modification::AddCardTypes([CardType::Land].into_iter().collect()),
        );

        assert!(depends_on(&a, &b) && depends_on(&b, &a));

        let sorted = sort_with_dependencies(&[&a, &b]);
        assert_eq!(sorted[0].id, b.id);
        assert_eq!(sorted[1].id, a.id);
    }

    #[test]
    fn test_chain_of_three() {
        // c depends on b, b depends on a; timestamps reversed.
        let c = modifier(
            1,
            EntityFilter::HasSubtype("Zombie".into()),
            Modification::AddSubtypes(["Horror".to_string()].into_iter().collect()),
        );
        let b = creatures_are_zombies(2);
        let a = make_creatures(3);

        let sorted = sort_with_dependencies(&[&c, &b, &a]);
        let ids: Vec<_> = sorted.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
