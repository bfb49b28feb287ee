use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dungeon_core::collaborators::{CallLog, Collaborators};
use dungeon_core::engine::config::{DungeonConfig, GenerationConfig};
use dungeon_core::events::DungeonEvent;
use dungeon_core::generation::{generate_with_retries, DungeonSeed, GridGraphGenerator};
use dungeon_core::session::DungeonSession;
use dungeon_core::survey::survey;

fn bench_generation(c: &mut Criterion) {
    let generator = GridGraphGenerator::new(GenerationConfig::default()).unwrap();

    c.bench_function("generate_seeded_11x9", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let _ = generator.generate_seeded(black_box(seed));
        })
    });

    c.bench_function("generate_with_retries_11x9", |b| {
        let config = GenerationConfig::default();
        b.iter(|| generate_with_retries(black_box(&config), DungeonSeed::new(black_box(42))))
    });

    let mut group = c.benchmark_group("generate_by_probability");
    for p in [0.3, 0.6, 0.9] {
        let generator = GridGraphGenerator::new(GenerationConfig {
            expansion_probability: p,
            ..Default::default()
        })
        .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(p), &generator, |b, generator| {
            b.iter(|| generator.generate_seeded(black_box(7)))
        });
    }
    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let graph = GridGraphGenerator::new(GenerationConfig::default())
        .unwrap()
        .generate_seeded(42)
        .unwrap();

    c.bench_function("register_graph", |b| {
        b.iter(|| {
            let mut session = DungeonSession::new(DungeonConfig::default(), Collaborators::default());
            session.register_graph(black_box(graph.clone()));
        })
    });

    c.bench_function("transition_round_trip", |b| {
        let log = CallLog::new();
        let mut session = DungeonSession::new(DungeonConfig::default(), Collaborators::recording(&log));
        session.register_graph(graph.clone());
        b.iter(|| {
            let Some(trigger) = session.armed_triggers().iter().next().copied() else {
                return;
            };
            let _ = session.handle_event(DungeonEvent::DoorCrossed {
                trigger,
                target: trigger.room,
            });
            while session.is_transitioning() {
                session.tick(1.0 / 60.0);
            }
            // Clear whatever spawned so the walk never stalls in a sealed room.
            for (room, hostile) in log.spawned() {
                let _ = session.hostile_defeated(room, hostile);
            }
            log.clear();
        })
    });
}

fn bench_survey(c: &mut Criterion) {
    let config = GenerationConfig::default();
    c.bench_function("survey_1k", |b| {
        b.iter(|| survey(black_box(&config), black_box(42), 1_000))
    });
}

criterion_group!(benches, bench_generation, bench_session, bench_survey);
criterion_main!(benches);
