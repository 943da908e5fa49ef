use cultivar_core::{
    CultivationConfig, CultivationWorld, EnvironmentalConditions, Genotype, GrowthStage,
    IndoorEnvironment, PlantId, SpeciesId, SpeciesProfile, StaticSpeciesCatalog,
    StaticStressCatalog, StressCategory, StressSource, Tick, ZoneId,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

const SPECIES: SpeciesId = SpeciesId::new(1);
const ZONE: ZoneId = ZoneId::new(0);
const HOT_ZONE: ZoneId = ZoneId::new(9);

fn species_catalog() -> StaticSpeciesCatalog {
    let mut catalog = StaticSpeciesCatalog::new();
    catalog.insert(SPECIES, SpeciesProfile::indoor_baseline("Integration Haze"));
    catalog
}

fn environment() -> IndoorEnvironment {
    let mut environment = IndoorEnvironment::default();
    environment.set_zone(HOT_ZONE, EnvironmentalConditions::new(39.0, 25.0, 650.0, 900.0));
    environment
}

fn build_world(config: CultivationConfig) -> CultivationWorld {
    CultivationWorld::new(
        config,
        Box::new(environment()),
        Box::new(species_catalog()),
        Box::new(StaticStressCatalog::with_defaults()),
    )
    .expect("world")
}

fn seed_plants(world: &mut CultivationWorld, count: usize, zone: ZoneId, seed: u64) -> Vec<PlantId> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| world.spawn_plant(SPECIES, zone, Some(Arc::new(Genotype::random(&mut rng)))))
        .collect()
}

#[test]
fn seeded_worlds_advance_deterministically() {
    let config = CultivationConfig {
        rng_seed: Some(0xDEAD_BEEF),
        batch_base_size: 5,
        ..CultivationConfig::default()
    };
    let mut world_a = build_world(config.clone());
    let mut world_b = build_world(config);
    let ids_a = seed_plants(&mut world_a, 5, ZONE, 42);
    let ids_b = seed_plants(&mut world_b, 5, ZONE, 42);

    for _ in 0..48 {
        world_a.step(1.0, 1.0);
        world_b.step(1.0, 1.0);
    }

    assert_eq!(world_a.tick(), Tick(48));
    assert!((world_a.clock_seconds() - 48.0).abs() < f64::EPSILON);
    let history_a: Vec<_> = world_a.history().cloned().collect();
    let history_b: Vec<_> = world_b.history().cloned().collect();
    assert_eq!(history_a, history_b);
    for (a, b) in ids_a.iter().zip(&ids_b) {
        let plant_a = world_a.plant(*a).expect("plant a");
        let plant_b = world_b.plant(*b).expect("plant b");
        assert_eq!(plant_a.health, plant_b.health);
        assert_eq!(plant_a.stage, plant_b.stage);
        assert_eq!(plant_a.growth_progress, plant_b.growth_progress);
    }
}

#[test]
fn large_populations_take_the_batched_path_with_full_coverage() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(3),
        batch_base_size: 40,
        optimization_pass_chance: 0.0,
        ..CultivationConfig::default()
    });
    let ids = seed_plants(&mut world, 30, ZONE, 9);

    world.step(1.0, 1.0);
    let stats = world.expression_stats();
    assert_eq!(stats.calculations, 30, "first tick computes every plant");
    assert_eq!(stats.batches, 1, "slice above threshold goes through the batch path");

    world.step(1.0, 1.0);
    let stats = world.expression_stats();
    assert_eq!(stats.cache_hits, 30, "second tick inside the window hits the cache");

    for id in ids {
        assert!(world.last_expression(id).is_some());
        let fitness = world.environmental_fitness(id).expect("fitness");
        assert!((0.0..=1.0).contains(&fitness));
    }
}

#[test]
fn stress_episode_registers_then_recovers() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(5),
        ..CultivationConfig::default()
    });
    let id = world.spawn_plant(SPECIES, ZONE, Some(Arc::new(Genotype::balanced())));

    assert!(world.apply_stress(id, "Heat", 0.6));
    world.step(1.0, 1.0);
    assert!(world.plant(id).expect("plant").stress_level > 0.0);
    let expression = world.last_expression(id).expect("expression");
    assert!(
        !expression.stress_response.factors.is_empty(),
        "heat should surface as a named stress factor"
    );

    // No new stress: recovery decays the heat stressor away.
    for _ in 0..30 {
        world.step(1.0, 1.0);
    }
    assert!(world.active_stressors(id).is_empty());
    assert_eq!(world.plant(id).expect("plant").stress_level, 0.0);
}

#[test]
fn high_fitness_accumulates_net_positive_health() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(5),
        ..CultivationConfig::default()
    });
    let id = world.spawn_plant(SPECIES, ZONE, Some(Arc::new(Genotype::balanced())));
    // Knock health well below max with one sharp burst, then clear it.
    world.apply_stress_source(
        id,
        StressSource::new("Topping", 0.5, 0.2, StressCategory::Nutrient),
        1.0,
    );
    world.step(1.0, 1.0);
    world.remove_stress(id, "Topping");

    let before = world.plant(id).expect("plant").health;
    assert!(before < 1.0);
    // Zero active stressors, fitness above the 0.8 threshold, ten ticks of
    // dt = 1: the regeneration bonus must produce a net positive delta.
    assert!(world.active_stressors(id).is_empty());
    for _ in 0..10 {
        world.step(1.0, 1.0);
    }
    let after = world.plant(id).expect("plant").health;
    assert!(after > before, "ten comfortable ticks should heal: {before} -> {after}");
}

#[test]
fn hostile_zone_eventually_overwhelms_a_plant() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(11),
        ..CultivationConfig::default()
    });
    world.spawn_plant(SPECIES, HOT_ZONE, Some(Arc::new(Genotype::balanced())));
    let mut deaths = 0;
    for _ in 0..4000 {
        deaths += world.step(1.0, 1.0).deaths;
        if deaths > 0 {
            break;
        }
    }
    assert_eq!(deaths, 1, "sustained strain should eventually kill");
    assert_eq!(world.plant_count(), 0);
}

#[test]
fn growth_runs_to_harvest_without_skipping_stages() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(13),
        optimization_pass_chance: 0.0,
        ..CultivationConfig::default()
    });
    let id = world.spawn_plant(SPECIES, ZONE, Some(Arc::new(Genotype::balanced())));
    let mut stages = vec![GrowthStage::Seed];
    for _ in 0..1500 {
        world.step(5.0, 1.5);
        let stage = world.plant(id).expect("plant").stage;
        if *stages.last().expect("stage") != stage {
            stages.push(stage);
        }
        if stage == GrowthStage::Harvestable {
            break;
        }
    }
    assert_eq!(*stages.last().expect("stage"), GrowthStage::Harvestable);
    for pair in stages.windows(2) {
        assert_eq!(pair[0].next(), Some(pair[1]));
    }

    let result = world.harvest_plant(id).expect("harvest");
    assert!(result.bud_mass_grams > 0.0);
    assert!(result.quality > 0.0);
    assert_eq!(world.plant(id).expect("plant").stage, GrowthStage::Harvested);
}

#[test]
fn adaptation_trails_fitness_between_zone_moves() {
    let mut world = build_world(CultivationConfig {
        rng_seed: Some(17),
        ..CultivationConfig::default()
    });
    let id = world.spawn_plant(SPECIES, ZONE, Some(Arc::new(Genotype::balanced())));
    for _ in 0..60 {
        world.step(1.0, 1.0);
    }
    let adapted = world.plant(id).expect("plant").adaptation;
    assert!(adapted > 0.5, "comfortable zone should build adaptation");
    let fitness = world.environmental_fitness(id).expect("fitness");
    assert!(adapted <= fitness + 1e-3, "adaptation trails fitness from below");
}
