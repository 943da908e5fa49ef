use anyhow::Result;
use cultivar_core::{
    CultivationConfig, CultivationWorld, EnvironmentalConditions, Genotype, GrowthStage,
    IndoorEnvironment, PlantId, SpeciesId, SpeciesProfile, StaticSpeciesCatalog,
    StaticStressCatalog, ToleranceBand, ZoneId,
};
use std::sync::Arc;
use tracing::{info, warn};

const INDICA: SpeciesId = SpeciesId::new(1);
const SATIVA: SpeciesId = SpeciesId::new(2);
const MAIN_ROOM: ZoneId = ZoneId::new(0);
const HOT_CORNER: ZoneId = ZoneId::new(1);

fn main() -> Result<()> {
    init_tracing();
    let mut world = bootstrap_world()?;
    info!("Starting cultivar grow room shell");
    run_season(&mut world);
    report(&world)?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Composition root: wire concrete collaborator instances once, then hand
/// the world their boxed handles.
fn bootstrap_world() -> Result<CultivationWorld> {
    let config = CultivationConfig {
        rng_seed: Some(0xFACA_DE01),
        batch_base_size: 10,
        ..CultivationConfig::default()
    };

    let mut species = StaticSpeciesCatalog::new();
    species.insert(INDICA, SpeciesProfile::indoor_baseline("Valley Indica"));
    species.insert(
        SATIVA,
        SpeciesProfile {
            temperature: ToleranceBand::new(20.0, 32.0, 26.0),
            humidity: ToleranceBand::new(45.0, 75.0, 60.0),
            height_modifier: 1.3,
            potency_modifier: 1.1,
            yield_modifier: 0.9,
            ..SpeciesProfile::indoor_baseline("Ridge Sativa")
        },
    );

    let mut environment = IndoorEnvironment::default();
    environment.set_zone(
        HOT_CORNER,
        EnvironmentalConditions::new(31.5, 48.0, 820.0, 950.0),
    );

    let world = CultivationWorld::new(
        config,
        Box::new(environment),
        Box::new(species),
        Box::new(StaticStressCatalog::with_defaults()),
    )?;
    Ok(world)
}

fn seed_plants(world: &mut CultivationWorld) -> Vec<PlantId> {
    let (mother, father) = {
        let rng = world.rng();
        (Genotype::random(rng), Genotype::random(rng))
    };

    let mut ids = Vec::new();
    for index in 0..16 {
        let species = if index % 2 == 0 { INDICA } else { SATIVA };
        let zone = if index % 4 == 3 { HOT_CORNER } else { MAIN_ROOM };
        let genotype = if index < 8 {
            Genotype::cross(&mother, &father, world.rng())
        } else {
            Genotype::random(world.rng())
        };
        ids.push(world.spawn_plant(species, zone, Some(Arc::new(genotype))));
    }
    info!(
        plants = ids.len(),
        divergence = mother.distance(&father),
        "seeded grow room from two parent genotypes",
    );
    ids
}

fn run_season(world: &mut CultivationWorld) {
    let ids = seed_plants(world);
    let dt = 5.0;
    for tick in 0..700_u32 {
        // A mid-season heat wave hits the whole room for fifty ticks.
        if tick == 200 {
            for &id in &ids {
                world.apply_stress(id, "Heat", 0.5);
            }
            info!("heat wave rolling in");
        }
        if tick == 250 {
            for &id in &ids {
                world.remove_stress(id, "Heat");
            }
            info!("heat wave cleared");
        }
        let events = world.step(dt, 1.0);
        if events.deaths > 0 {
            warn!(tick = events.tick.0, deaths = events.deaths, "lost plants this tick");
        }
        if tick % 100 == 0 {
            if let Some(summary) = world.history().last() {
                info!(
                    tick = summary.tick.0,
                    plants = summary.plant_count,
                    avg_health = summary.average_health,
                    avg_stress = summary.average_stress,
                    avg_fitness = summary.average_fitness,
                    "season progress",
                );
            }
        }
    }

    let mut ready: Vec<PlantId> = world.plant_ids().collect();
    ready.sort();
    for id in ready {
        let Some(result) = world.harvest_plant(id) else {
            continue;
        };
        info!(
            plant = ?id,
            grams = result.bud_mass_grams,
            thc = result.thc_fraction,
            cbd = result.cbd_fraction,
            quality = result.quality,
            "harvested",
        );
    }
}

fn report(world: &CultivationWorld) -> Result<()> {
    let stats = world.expression_stats();
    info!(
        calculations = stats.calculations,
        batches = stats.batches,
        cache_hits = stats.cache_hits,
        fallbacks = stats.fallbacks,
        average_calc_micros = stats.average_calc_micros,
        average_batch_micros = stats.average_batch_micros,
        average_tick_ms = world.average_tick_cost_ms(),
        "expression engine stats",
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    let mut ids: Vec<PlantId> = world.plant_ids().collect();
    ids.sort();
    for id in ids {
        let Some(plant) = world.plant(id) else { continue };
        if plant.stage == GrowthStage::Harvested {
            if let Some(expression) = world.last_expression(id) {
                info!(
                    plant = ?id,
                    height_cm = plant.size.height,
                    thc = expression.thc_expression,
                    cbd = expression.cbd_expression,
                    "post-harvest trait snapshot",
                );
            }
        }
    }
    Ok(())
}
