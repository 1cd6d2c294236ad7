//! Tracker benchmarks using criterion.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rgb_tracker::{EntityFilter, EntityTrackerEngine, NearbyEntityTracker, SectionPos, TrackerConfig};

fn populated(entities: u32, observers: u32) -> EntityTrackerEngine<u32> {
    let mut engine = EntityTrackerEngine::new(TrackerConfig::default());

    for i in 0..observers {
        let id = engine.add_listener(NearbyEntityTracker::new(i, 16.0, EntityFilter::any()));
        let pos = SectionPos::new((i % 16) as i32, 4, (i / 16) as i32);
        engine.on_entity_added(pos, i, Some(id)).unwrap();
    }

    for i in observers..observers + entities {
        let pos = SectionPos::new((i % 32) as i32, 4, ((i / 32) % 32) as i32);
        engine.add_entity(pos, i);
    }

    engine
}

fn entity_move_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_move");

    for observers in [0, 16, 128] {
        group.throughput(Throughput::Elements(1000));

        group.bench_with_input(
            BenchmarkId::new("back_and_forth", observers),
            &observers,
            |b, &observers| {
                let mut engine = populated(1000, observers);
                let entity = observers;
                let home = SectionPos::new((entity % 32) as i32, 4, ((entity / 32) % 32) as i32);
                let away = SectionPos::new(home.x + 1, 4, home.z);

                b.iter(|| {
                    for _ in 0..500 {
                        black_box(engine.move_entity(home, away, entity));
                        black_box(engine.move_entity(away, home, entity));
                    }
                });
            },
        );
    }

    group.finish();
}

fn relocate_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocate");

    for range in [1u32, 2, 4] {
        group.bench_with_input(BenchmarkId::new("step", range), &range, |b, &range| {
            let mut engine = populated(2000, 0);
            let blocks = f64::from(range * 16);
            let id = engine.add_listener(NearbyEntityTracker::new(u32::MAX, blocks, EntityFilter::any()));
            let mut center = SectionPos::new(0, 4, 0);
            engine.subscribe(id, center).unwrap();

            b.iter(|| {
                let next = SectionPos::new((center.x + 1) % 32, 4, center.z);
                engine.relocate(id, center, next).unwrap();
                center = next;
            });
        });
    }

    group.finish();
}

fn subscribe_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");

    for range in [1u32, 3, 6] {
        group.bench_with_input(BenchmarkId::new("cycle", range), &range, |b, &range| {
            let mut engine = populated(2000, 0);
            let blocks = f64::from(range * 16);
            let id = engine.add_listener(NearbyEntityTracker::new(u32::MAX, blocks, EntityFilter::any()));

            b.iter(|| {
                engine.subscribe(id, SectionPos::new(8, 4, 8)).unwrap();
                engine.unsubscribe(id).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    entity_move_benchmarks,
    relocate_benchmarks,
    subscribe_benchmarks
);
criterion_main!(benches);
