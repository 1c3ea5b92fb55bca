//! Benchmarks for characteristic projection and the projection cache.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rules_core::{
    CardType, Characteristics, EntityFilter, GameConfig, GameState, Keyword, Modification, Modifier, PlayerId,
    ProjectionCache, StateProjector, ZoneType,
};

/// A battlefield of `creatures` creatures under a stack of anthems, type
/// changes and a dependent "artifacts are creatures" effect.
fn board(creatures: usize) -> GameState {
    let mut state = GameState::new(&GameConfig::default());
    let (p0, p1) = (PlayerId::new(0), PlayerId::new(1));

    for i in 0..creatures {
        let owner = if i % 2 == 0 { p0 } else { p1 };
        state.create_card(
            owner,
            Characteristics::creature(format!("Creature {i}"), 2, 2),
            ZoneType::Battlefield,
        );
    }
    let relic = state.create_card(
        p0,
        Characteristics::new("Relic").with_type(CardType::Artifact),
        ZoneType::Battlefield,
    );

    state.add_modifier(Modifier::new(
        relic,
        EntityFilter::Creatures,
        Modification::ModifyPowerToughness { power: 1, toughness: 1 },
    ));
    state.add_modifier(Modifier::new(
        relic,
        EntityFilter::Creatures,
        Modification::AddKeywords([Keyword::Flying].into_iter().collect()),
    ));
    state.add_modifier(Modifier::new(
        relic,
        EntityFilter::HasCardType(CardType::Artifact),
        Modification::AddCardTypes([CardType::Creature].into_iter().collect()),
    ));
    state.add_modifier(Modifier::new(
        relic,
        EntityFilter::HasCardType(CardType::Artifact),
        Modification::SetPowerToughness { power: 3, toughness: 3 },
    ));
    state
}

fn bench_project_uncached(c: &mut Criterion) {
    let mut group = c.benchmark_group("project_uncached");
    for size in [10, 50, 200] {
        let state = board(size);
        let ids = state.zones().cards_of_type(ZoneType::Battlefield);
        group.throughput(Throughput::Elements(ids.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.iter(|| {
                for &id in ids {
                    black_box(StateProjector::project(&state, id));
                }
            });
        });
    }
    group.finish();
}

fn bench_cache_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_warm");
    for size in [10, 50, 200] {
        let state = board(size);
        let mut cache = ProjectionCache::new();
        cache.project_battlefield(&state);
        group.bench_with_input(BenchmarkId::from_parameter(size), &state, |b, state| {
            b.iter(|| black_box(cache.project_battlefield(state)));
        });
    }
    group.finish();
}

fn bench_cache_after_change(c: &mut Criterion) {
    let state = board(50);
    let mut cache = ProjectionCache::new();
    cache.project_battlefield(&state);

    c.bench_function("cache_after_life_change", |b| {
        b.iter(|| {
            let mut next = state.clone();
            next.gain_life(PlayerId::new(0), 1);
            black_box(cache.project_battlefield(&next))
        });
    });
}

criterion_group!(
    benches,
    bench_project_uncached,
    bench_cache_warm,
    bench_cache_after_change
);
criterion_main!(benches);
