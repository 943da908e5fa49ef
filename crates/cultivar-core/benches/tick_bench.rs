use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use cultivar_core::{
    CultivationConfig, CultivationWorld, Genotype, IndoorEnvironment, SpeciesId, SpeciesProfile,
    StaticSpeciesCatalog, StaticStressCatalog, ZoneId,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;
use std::time::Duration;

fn bench_world_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(8));

    let steps = 64;
    for &plants in &[50_usize, 200, 1000] {
        group.bench_function(format!("steps{steps}_plants{plants}"), |b| {
            b.iter_batched(
                || {
                    let config = CultivationConfig {
                        rng_seed: Some(0xBEEF),
                        batch_base_size: 50,
                        powerful_host: true,
                        history_capacity: 1,
                        ..CultivationConfig::default()
                    };
                    let mut catalog = StaticSpeciesCatalog::new();
                    catalog.insert(
                        SpeciesId::new(1),
                        SpeciesProfile::indoor_baseline("Bench Kush"),
                    );
                    let mut world = CultivationWorld::new(
                        config,
                        Box::new(IndoorEnvironment::default()),
                        Box::new(catalog),
                        Box::new(StaticStressCatalog::with_defaults()),
                    )
                    .expect("world");
                    let mut rng = SmallRng::seed_from_u64(7);
                    for index in 0..plants {
                        world.spawn_plant(
                            SpeciesId::new(1),
                            ZoneId::new((index % 4) as u32),
                            Some(Arc::new(Genotype::random(&mut rng))),
                        );
                    }
                    world
                },
                |mut world| {
                    for _ in 0..steps {
                        world.step(1.0, 1.0);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_world_steps);
criterion_main!(benches);
