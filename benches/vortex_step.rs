//! Benchmarks for the CPU physics step.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use twister::prelude::*;

/// Minimal in-memory world: objects never move, forces go nowhere.
struct BenchWorld {
    objects: Mutex<HashMap<EntityHandle, EntityProbe>>,
}

impl BenchWorld {
    fn with_objects(count: u64) -> Arc<Self> {
        let mut objects = HashMap::new();
        for i in 0..count {
            let handle = EntityHandle(i);
            objects.insert(
                handle,
                EntityProbe {
                    handle,
                    position: Vec3::new((i % 40) as f32, (i / 40) as f32, 0.0),
                    height_above_ground: 0.0,
                    class: ObjectClass::Prop,
                    is_primary_actor: false,
                },
            );
        }
        Arc::new(Self {
            objects: Mutex::new(objects),
        })
    }
}

impl EntityEnumerator for BenchWorld {
    fn query_near(&self, _center: Vec3, _radius: f32) -> Vec<EntityProbe> {
        self.objects.lock().unwrap().values().copied().collect()
    }

    fn probe(&self, handle: EntityHandle) -> Option<EntityProbe> {
        self.objects.lock().unwrap().get(&handle).copied()
    }

    fn primary_actor(&self) -> Option<EntityProbe> {
        None
    }
}

impl ForceApplier for BenchWorld {
    fn apply(&self, _handle: EntityHandle, force: Vec3, _torque: Vec3) {
        black_box(force);
    }

    fn limit_speed(&self, _handle: EntityHandle, max_speed: f32) {
        black_box(max_speed);
    }
}

impl GroundQuery for BenchWorld {
    fn height_at(&self, _position: Vec3) -> f32 {
        0.0
    }

    fn line_of_sight(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

impl RoadQuery for BenchWorld {
    fn nearest_point(&self, position: Vec3) -> Vec3 {
        position
    }
}

impl PropFactory for BenchWorld {
    fn create(&self, _position: Vec3) -> Result<EntityHandle, PropError> {
        Err(PropError::CreationRejected("disabled for bench".into()))
    }

    fn place(&self, _handle: EntityHandle, _position: Vec3) {}

    fn destroy(&self, _handle: EntityHandle) {}
}

fn bench_factory_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("factory_update");

    for count in [50u64, 300] {
        group.bench_with_input(BenchmarkId::new("captured", count), &count, |b, &count| {
            let world = BenchWorld::with_objects(count);
            let clock = Arc::new(ManualClock::new());
            let context = WorldContext {
                entities: world.clone(),
                forces: world.clone(),
                clock: clock.clone(),
                ground: world.clone(),
                roads: world.clone(),
                props: world.clone(),
            };

            let config = VortexConfig::default()
                .with_jitter_seed(7)
                .without_debris();
            let factory = VortexFactory::new(config, context);
            factory.spawn(Vec3::ZERO).unwrap();

            // Warm up: fill the capture registry.
            for _ in 0..10 {
                clock.advance(0.016);
                factory.update(clock.now_ms());
            }

            b.iter(|| {
                clock.advance(0.016);
                factory.update(black_box(clock.now_ms()));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_factory_update);
criterion_main!(benches);
