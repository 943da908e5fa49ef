//! The update orchestrator: owns the plant arena, drives every calculator
//! once per tick over a bounded round-robin slice, and applies the results
//! back onto plant state.

use crate::adaptation;
use crate::config::CultivationConfig;
use crate::environment::{
    EnvironmentProvider, EnvironmentalConditions, SpeciesCatalog, SpeciesId, SpeciesProfile,
    StressSourceCatalog, ZoneId,
};
use crate::expression::{
    BaseModifiers, ExpressionJob, ExpressionStats, TraitExpressionEngine, TraitExpressionResult,
};
use crate::fitness::{FitnessBreakdown, environmental_fitness};
use crate::genetics::{GeneLocus, Genotype};
use crate::harvest::{self, HarvestResult};
use crate::stress::{
    ActiveStressor, StressCategory, StressLedger, StressResponse, StressSource,
    environmental_strain, regeneration_bonus,
};
use crate::{PlantId, PlantMap, Tick, clamp01};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors raised while constructing or reconfiguring a world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Ordered growth stages a plant moves through, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrowthStage {
    #[default]
    Seed,
    Germination,
    Seedling,
    Vegetative,
    PreFlowering,
    Flowering,
    Ripening,
    Harvestable,
    Harvested,
    Drying,
    Curing,
}

/// Growth progress gained per second at full health, per stage ordinal.
/// Terminal stages no longer grow.
const STAGE_PROGRESS_PER_SECOND: [f32; 11] = [
    1.0 / 30.0,  // Seed
    1.0 / 45.0,  // Germination
    1.0 / 90.0,  // Seedling
    1.0 / 240.0, // Vegetative
    1.0 / 120.0, // PreFlowering
    1.0 / 300.0, // Flowering
    1.0 / 180.0, // Ripening
    0.0,         // Harvestable
    0.0,         // Harvested
    0.0,         // Drying
    0.0,         // Curing
];

/// Harvest-value multiplier per stage ordinal. Zero before flower and in
/// every terminal stage by definition.
const STAGE_YIELD_MODIFIER: [f32; 11] = [
    0.0, 0.0, 0.0, 0.0, 0.1, 0.5, 0.9, 1.0, 0.0, 0.0, 0.0,
];

impl GrowthStage {
    /// Every stage, in progression order.
    pub const ALL: [Self; 11] = [
        Self::Seed,
        Self::Germination,
        Self::Seedling,
        Self::Vegetative,
        Self::PreFlowering,
        Self::Flowering,
        Self::Ripening,
        Self::Harvestable,
        Self::Harvested,
        Self::Drying,
        Self::Curing,
    ];

    /// Ordinal used to index the stage tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Seed => 0,
            Self::Germination => 1,
            Self::Seedling => 2,
            Self::Vegetative => 3,
            Self::PreFlowering => 4,
            Self::Flowering => 5,
            Self::Ripening => 6,
            Self::Harvestable => 7,
            Self::Harvested => 8,
            Self::Drying => 9,
            Self::Curing => 10,
        }
    }

    /// The next stage, or `None` once the progression is exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Seed => Some(Self::Germination),
            Self::Germination => Some(Self::Seedling),
            Self::Seedling => Some(Self::Vegetative),
            Self::Vegetative => Some(Self::PreFlowering),
            Self::PreFlowering => Some(Self::Flowering),
            Self::Flowering => Some(Self::Ripening),
            Self::Ripening => Some(Self::Harvestable),
            Self::Harvestable => Some(Self::Harvested),
            Self::Harvested => Some(Self::Drying),
            Self::Drying => Some(Self::Curing),
            Self::Curing => None,
        }
    }

    /// Base growth progress per second for this stage.
    #[must_use]
    pub fn progress_per_second(self) -> f32 {
        STAGE_PROGRESS_PER_SECOND[self.index()]
    }

    /// Harvest-value multiplier for this stage.
    #[must_use]
    pub fn yield_modifier(self) -> f32 {
        STAGE_YIELD_MODIFIER[self.index()]
    }

    /// Whether the plant can be cut down for harvest in this stage.
    #[must_use]
    pub const fn is_harvestable(self) -> bool {
        matches!(self, Self::Ripening | Self::Harvestable)
    }

    /// Post-harvest processing stages.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Harvested | Self::Drying | Self::Curing)
    }
}

/// Physical dimensions of a plant, in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantSize {
    pub height: f32,
    pub canopy: f32,
    pub root_depth: f32,
}

impl Default for PlantSize {
    fn default() -> Self {
        Self {
            height: 0.5,
            canopy: 0.2,
            root_depth: 0.3,
        }
    }
}

/// One tracked plant. Owned exclusively by the world; mutated only by the
/// orchestrator and the calculators it invokes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub species: SpeciesId,
    pub zone: ZoneId,
    /// Immutable once set; shared read-only with breeding records. A plant
    /// without a genotype follows the basic non-genetic update path.
    pub genotype: Option<Arc<Genotype>>,
    pub stage: GrowthStage,
    pub health: f32,
    pub stress_level: f32,
    pub environmental_fitness: f32,
    pub adaptation: f32,
    pub growth_progress: f32,
    pub size: PlantSize,
    pub planted_at: Tick,
    pub active: bool,
}

impl Plant {
    fn new(species: SpeciesId, zone: ZoneId, genotype: Option<Arc<Genotype>>, now: Tick) -> Self {
        Self {
            species,
            zone,
            genotype,
            stage: GrowthStage::Seed,
            health: 1.0,
            stress_level: 0.0,
            environmental_fitness: 1.0,
            adaptation: 0.0,
            growth_progress: 0.0,
            size: PlantSize::default(),
            planted_at: now,
            active: true,
        }
    }
}

/// Events emitted after processing one world tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    pub tick: Tick,
    /// Plants updated this tick.
    pub processed: usize,
    /// Plants that died and were swept this tick.
    pub deaths: usize,
    /// Whether the periodic expression-cache clear ran.
    pub cache_cleared: bool,
    /// Whether the probabilistic optimization pass ran.
    pub optimization_pass: bool,
}

/// Aggregate sampled after a tick for dashboards and history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub plant_count: usize,
    pub processed: usize,
    pub average_health: f32,
    pub average_stress: f32,
    pub average_fitness: f32,
}

/// Per-plant intermediate results carried from the calculation phase to the
/// apply phase of a tick.
struct PreparedUpdate {
    id: PlantId,
    fitness: FitnessBreakdown,
    damage: f32,
    regen: f32,
    stress_level: f32,
    adaptation: f32,
    job: Option<ExpressionJob>,
}

/// The per-tick driver over every tracked plant.
pub struct CultivationWorld {
    config: CultivationConfig,
    tick: Tick,
    clock: f64,
    rng: SmallRng,
    plants: SlotMap<PlantId, Plant>,
    ledgers: PlantMap<StressLedger>,
    expressions: PlantMap<TraitExpressionResult>,
    environment: Box<dyn EnvironmentProvider>,
    species: Box<dyn SpeciesCatalog>,
    stress_sources: Box<dyn StressSourceCatalog>,
    engine: TraitExpressionEngine,
    batch_size: usize,
    cursor: usize,
    recent_costs: VecDeque<f64>,
    last_cache_clear: f64,
    history: VecDeque<TickSummary>,
}

impl fmt::Debug for CultivationWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CultivationWorld")
            .field("tick", &self.tick)
            .field("clock", &self.clock)
            .field("plant_count", &self.plants.len())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl CultivationWorld {
    /// Build a world around validated configuration and the collaborator
    /// handles it will consult every tick. This is the composition seam:
    /// nothing inside the engine reaches for globals.
    pub fn new(
        config: CultivationConfig,
        environment: Box<dyn EnvironmentProvider>,
        species: Box<dyn SpeciesCatalog>,
        stress_sources: Box<dyn StressSourceCatalog>,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        };
        let engine = TraitExpressionEngine::new(
            config.cache_window_secs,
            config.epistasis_enabled,
            config.pleiotropy_enabled,
        );
        let history_capacity = config.history_capacity;
        Ok(Self {
            batch_size: config.batch_base_size,
            config,
            tick: Tick::zero(),
            clock: 0.0,
            rng,
            plants: SlotMap::with_key(),
            ledgers: PlantMap::new(),
            expressions: PlantMap::new(),
            environment,
            species,
            stress_sources,
            engine,
            cursor: 0,
            recent_costs: VecDeque::new(),
            last_cache_clear: 0.0,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Track a new plant, returning its handle.
    pub fn spawn_plant(
        &mut self,
        species: SpeciesId,
        zone: ZoneId,
        genotype: Option<Arc<Genotype>>,
    ) -> PlantId {
        let id = self
            .plants
            .insert(Plant::new(species, zone, genotype, self.tick));
        self.ledgers.insert(id, StressLedger::new());
        id
    }

    /// Remove a plant by handle, returning its last known record.
    pub fn remove_plant(&mut self, id: PlantId) -> Option<Plant> {
        self.ledgers.remove(id);
        self.expressions.remove(id);
        self.plants.remove(id)
    }

    /// Advance the simulation by `dt` seconds. `growth_modifier` scales
    /// growth progress globally (progression systems feed it in; 1.0 is
    /// neutral). Processes one bounded round-robin slice of plants.
    pub fn step(&mut self, dt: f32, growth_modifier: f32) -> TickEvents {
        let started = Instant::now();
        let next_tick = self.tick.next();
        self.clock += f64::from(dt.max(0.0));

        let handles: Vec<PlantId> = self.plants.keys().collect();
        let total = handles.len();
        let slice_len = self.batch_size.min(total);
        let mut slice = Vec::with_capacity(slice_len);
        for offset in 0..slice_len {
            slice.push(handles[(self.cursor + offset) % total.max(1)]);
        }
        let completed_pass = total == 0 || self.cursor + slice_len >= total;
        self.cursor = if total == 0 {
            0
        } else {
            (self.cursor + slice_len) % total
        };

        let mut prepared = Vec::with_capacity(slice.len());
        for &id in &slice {
            if let Some(update) = self.prepare_plant(id, dt, next_tick) {
                prepared.push(update);
            }
        }

        // Expression runs batched above the threshold, per-plant below it;
        // both paths share the same formulas and cache semantics.
        let mut jobs = Vec::new();
        let mut job_owner = Vec::new();
        for (index, update) in prepared.iter().enumerate() {
            if let Some(job) = &update.job {
                jobs.push(job.clone());
                job_owner.push(index);
            }
        }
        let results = if jobs.len() > self.config.batched_threshold {
            self.engine.express_batch(&jobs, self.clock)
        } else {
            jobs.iter()
                .map(|job| self.engine.express(job, self.clock))
                .collect()
        };
        let mut expression_slots: Vec<Option<TraitExpressionResult>> =
            (0..prepared.len()).map(|_| None).collect();
        for (owner, result) in job_owner.into_iter().zip(results) {
            expression_slots[owner] = Some(result);
        }

        let mut deaths = 0;
        let processed = prepared.len();
        for (update, expression) in prepared.into_iter().zip(expression_slots) {
            if self.apply_update(update, expression, dt, growth_modifier) {
                deaths += 1;
            }
        }
        self.sweep_inactive();

        let mut events = TickEvents {
            tick: next_tick,
            processed,
            deaths,
            cache_cleared: false,
            optimization_pass: false,
        };

        if self.clock - self.last_cache_clear >= self.config.cache_clear_interval_secs {
            self.engine.clear_cache();
            self.last_cache_clear = self.clock;
            events.cache_cleared = true;
            tracing::debug!(clock = self.clock, "cleared trait expression cache");
        }
        if completed_pass
            && self.config.optimization_pass_chance > 0.0
            && self.rng.random_bool(self.config.optimization_pass_chance)
        {
            self.run_optimization_pass();
            events.optimization_pass = true;
        }

        let cost_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.record_tick_cost(cost_ms);
        self.push_summary(next_tick, processed);
        self.tick = next_tick;
        events
    }

    /// Update a single plant outside the round-robin schedule. Event
    /// handlers use this to refresh one plant immediately; the global tick
    /// counter and clock are left alone. Returns `false` for unknown or
    /// inactive plants.
    pub fn step_plant(&mut self, id: PlantId, dt: f32, growth_modifier: f32) -> bool {
        let Some(update) = self.prepare_plant(id, dt, self.tick.next()) else {
            return false;
        };
        let expression = update
            .job
            .as_ref()
            .map(|job| self.engine.express(job, self.clock));
        let died = self.apply_update(update, expression, dt, growth_modifier);
        if died {
            self.sweep_inactive();
        }
        true
    }

    /// Phase one of a plant update: sample the environment, score fitness,
    /// advance the stress ledger and adaptation, and stage an expression
    /// job when a genotype is present.
    fn prepare_plant(&mut self, id: PlantId, dt: f32, now: Tick) -> Option<PreparedUpdate> {
        let (zone, species, genotype, current_adaptation, active) = {
            let plant = self.plants.get(id)?;
            (
                plant.zone,
                plant.species,
                plant.genotype.clone(),
                plant.adaptation,
                plant.active,
            )
        };
        if !active {
            return None;
        }

        let mut conditions = self.environment.sample(zone);
        if !conditions.initialized {
            conditions = EnvironmentalConditions::indoor_default();
        }

        // A missing species profile means no penalty, not an error.
        let profile = self.species.profile(species);
        let fitness = match profile {
            Some(profile) => {
                environmental_fitness(profile, &conditions, &self.config.fitness_weights)
            }
            None => FitnessBreakdown::neutral(),
        };
        let base = profile.map_or_else(BaseModifiers::default, |profile| BaseModifiers {
            height: profile.height_modifier,
            potency: profile.potency_modifier,
            yield_factor: profile.yield_modifier,
        });
        let strain_kind = profile.map(|profile| strain_category(profile, &conditions, &fitness));

        let ledger = self.ledgers.entry(id)?.or_default();
        let strain_rate = environmental_strain(
            fitness.combined,
            self.config.low_fitness_threshold,
            self.config.strain_rate_factor,
        );
        if strain_rate > 0.0 {
            if let Some(category) = strain_kind {
                let source = StressSource::environmental(category);
                let existing = ledger
                    .active()
                    .iter()
                    .find(|entry| entry.source.name == source.name)
                    .map_or(0.0, |entry| entry.intensity);
                let intensity = (existing + strain_rate * dt).min(1.0);
                ledger.apply(source, intensity, now);
            }
        }
        let damage = ledger.tick(dt, self.config.stress_recovery_rate);
        let stress_level = ledger.stress_level();
        let regen = regeneration_bonus(
            fitness.combined,
            self.config.high_fitness_threshold,
            self.config.regen_rate_factor,
        ) * dt;
        let next_adaptation = adaptation::advance(
            current_adaptation,
            fitness.combined,
            self.config.adaptation_rate,
            dt,
        );

        let job = genotype.map(|genotype| {
            let resilience = genotype.expressed(GeneLocus::Resilience);
            ExpressionJob {
                plant: id,
                stress: StressResponse::from_ledger(ledger, next_adaptation, resilience),
                genotype,
                base,
                conditions,
                fitness,
            }
        });

        Some(PreparedUpdate {
            id,
            fitness,
            damage,
            regen,
            stress_level,
            adaptation: next_adaptation,
            job,
        })
    }

    /// Phase two: fold the prepared results back onto the plant record.
    /// Returns whether the plant died this tick.
    fn apply_update(
        &mut self,
        update: PreparedUpdate,
        expression: Option<TraitExpressionResult>,
        dt: f32,
        growth_modifier: f32,
    ) -> bool {
        let max_health = self.config.max_health;
        let min_advance_health = self.config.advancement_min_health;
        let Some(plant) = self.plants.get_mut(update.id) else {
            return false;
        };

        plant.environmental_fitness = clamp01(update.fitness.combined);
        plant.stress_level = clamp01(update.stress_level);
        plant.adaptation = update.adaptation;
        plant.health = (plant.health - update.damage + update.regen).clamp(0.0, max_health);

        // Height expression is unclamped; overshoot above 1.0 speeds growth.
        let (height_multiplier, yield_multiplier) = expression
            .as_ref()
            .map_or((1.0, 1.0), |result| {
                (result.height_expression, result.yield_expression)
            });

        let rate = plant.stage.progress_per_second();
        if rate > 0.0 && plant.health > 0.0 {
            let health_factor = plant.health / max_health;
            let gained = rate * dt * growth_modifier * health_factor * height_multiplier;
            plant.growth_progress += gained.max(0.0);
            plant.size.height += 25.0 * gained;
            plant.size.canopy += 15.0 * rate * dt * growth_modifier * yield_multiplier.max(0.0);
            plant.size.root_depth += 10.0 * rate * dt * growth_modifier * health_factor;
        }

        // Advancement is gated on accumulated progress AND viable health,
        // and only growing stages advance on their own; Harvestable waits
        // for an explicit harvest.
        if rate > 0.0 && plant.growth_progress >= 1.0 && plant.health > min_advance_health {
            if let Some(next) = plant.stage.next() {
                plant.growth_progress -= 1.0;
                plant.stage = next;
            }
        }

        if let Some(result) = expression {
            self.expressions.insert(update.id, result);
        }

        if plant.health <= 0.0 {
            plant.active = false;
            tracing::debug!(plant = ?update.id, "plant died of accumulated stress");
            return true;
        }
        false
    }

    /// Drop inactive plants and their side-table entries.
    fn sweep_inactive(&mut self) {
        let dead: Vec<PlantId> = self
            .plants
            .iter()
            .filter(|(_, plant)| !plant.active)
            .map(|(id, _)| id)
            .collect();
        for id in dead {
            self.remove_plant(id);
        }
        if !self.plants.is_empty() {
            self.cursor %= self.plants.len();
        } else {
            self.cursor = 0;
        }
    }

    fn record_tick_cost(&mut self, cost_ms: f64) {
        self.recent_costs.push_back(cost_ms);
        while self.recent_costs.len() > self.config.cost_window {
            self.recent_costs.pop_front();
        }
        self.batch_size = self.calculate_optimal_batch_size();
    }

    /// Rolling average cost of recent ticks, in milliseconds. Zero until the
    /// first tick completes.
    #[must_use]
    pub fn average_tick_cost_ms(&self) -> f64 {
        if self.recent_costs.is_empty() {
            return 0.0;
        }
        self.recent_costs.iter().sum::<f64>() / self.recent_costs.len() as f64
    }

    /// Adaptive slice sizing: halve when the rolling tick cost blows the
    /// frame budget, double when comfortably under half of it.
    fn calculate_optimal_batch_size(&self) -> usize {
        let current = self.batch_size;
        if self.recent_costs.is_empty() {
            return current;
        }
        let average = self.average_tick_cost_ms();
        let budget = f64::from(self.config.tick_budget_ms);
        let cap = if self.config.powerful_host {
            self.config.powerful_batch_cap
        } else {
            self.config.batch_cap
        };
        let next = if average > budget {
            (current / 2).max(self.config.batch_floor)
        } else if average < budget * 0.5 {
            (current * 2).min(cap)
        } else {
            current
        };
        if next != current {
            tracing::debug!(from = current, to = next, average_ms = average, "resized tick slice");
        }
        next
    }

    /// Cache compaction plus scratch shrinking between round-robin passes.
    fn run_optimization_pass(&mut self) {
        self.engine.compact_cache();
        self.recent_costs.shrink_to_fit();
        tracing::debug!(cache_entries = self.engine.cache_len(), "ran optimization pass");
    }

    fn push_summary(&mut self, tick: Tick, processed: usize) {
        let plant_count = self.plants.len();
        let (mut health, mut stress, mut fitness) = (0.0f32, 0.0f32, 0.0f32);
        for plant in self.plants.values() {
            health += plant.health;
            stress += plant.stress_level;
            fitness += plant.environmental_fitness;
        }
        let denom = plant_count.max(1) as f32;
        let summary = TickSummary {
            tick,
            plant_count,
            processed,
            average_health: health / denom,
            average_stress: stress / denom,
            average_fitness: fitness / denom,
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Apply a cataloged stress source to a plant. Unknown sources and
    /// unknown plants are ignored as invalid input, returning `false`.
    pub fn apply_stress(&mut self, id: PlantId, source_name: &str, intensity: f32) -> bool {
        let Some(source) = self.stress_sources.source(source_name) else {
            tracing::debug!(source = source_name, "unknown stress source");
            return false;
        };
        self.apply_stress_source(id, source, intensity)
    }

    /// Apply an explicit stress source descriptor to a plant.
    pub fn apply_stress_source(
        &mut self,
        id: PlantId,
        source: StressSource,
        intensity: f32,
    ) -> bool {
        if !self.plants.contains_key(id) || intensity <= 0.0 || !intensity.is_finite() {
            return false;
        }
        let now = self.tick;
        if let Some(ledger) = self.ledgers.get_mut(id) {
            ledger.apply(source, intensity, now);
            return true;
        }
        false
    }

    /// Clear one named stressor from a plant.
    pub fn remove_stress(&mut self, id: PlantId, source_name: &str) -> bool {
        self.ledgers
            .get_mut(id)
            .is_some_and(|ledger| ledger.remove(source_name))
    }

    /// Current combined environmental fitness for a plant.
    #[must_use]
    pub fn environmental_fitness(&self, id: PlantId) -> Option<f32> {
        self.plants.get(id).map(|plant| plant.environmental_fitness)
    }

    /// Stressors currently acting on a plant; empty for unknown handles.
    #[must_use]
    pub fn active_stressors(&self, id: PlantId) -> &[ActiveStressor] {
        self.ledgers.get(id).map_or(&[], StressLedger::active)
    }

    /// Most recent trait expression result for a plant, retained as a
    /// read-only snapshot for downstream systems.
    #[must_use]
    pub fn last_expression(&self, id: PlantId) -> Option<&TraitExpressionResult> {
        self.expressions.get(id)
    }

    /// Cut a plant down, appraising its harvest from final state. Only
    /// ripening or harvest-ready plants can be cut; the plant then moves to
    /// the Harvested stage and its stressors are cleared.
    pub fn harvest_plant(&mut self, id: PlantId) -> Option<HarvestResult> {
        let profile_snapshot = {
            let plant = self.plants.get(id)?;
            if !plant.stage.is_harvestable() {
                return None;
            }
            self.species.profile(plant.species).cloned()
        };
        let expression = self
            .expressions
            .get(id)
            .cloned()
            .unwrap_or_else(TraitExpressionResult::neutral);
        let plant = self.plants.get_mut(id)?;
        let result = harvest::appraise(plant, &expression, profile_snapshot.as_ref());
        plant.stage = GrowthStage::Harvested;
        plant.growth_progress = 0.0;
        if let Some(ledger) = self.ledgers.get_mut(id) {
            ledger.clear();
        }
        plant.stress_level = 0.0;
        Some(result)
    }

    /// Returns an immutable reference to configuration.
    #[must_use]
    pub fn config(&self) -> &CultivationConfig {
        &self.config
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Accumulated simulation seconds.
    #[must_use]
    pub const fn clock_seconds(&self) -> f64 {
        self.clock
    }

    /// Number of tracked plants.
    #[must_use]
    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    /// Borrow one plant record.
    #[must_use]
    pub fn plant(&self, id: PlantId) -> Option<&Plant> {
        self.plants.get(id)
    }

    /// Iterate over all plant handles.
    pub fn plant_ids(&self) -> impl Iterator<Item = PlantId> + '_ {
        self.plants.keys()
    }

    /// Current adaptive slice size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Iterate over retained tick summaries.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Operational counters from the expression engine.
    #[must_use]
    pub fn expression_stats(&self) -> ExpressionStats {
        self.engine.stats()
    }

    /// Borrow the world RNG mutably for deterministic sampling.
    #[must_use]
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }
}

/// Classify which direction sustained low fitness is pushing from, so the
/// synthesized strain lands in the right taxonomy bucket.
fn strain_category(
    profile: &SpeciesProfile,
    conditions: &EnvironmentalConditions,
    fitness: &FitnessBreakdown,
) -> StressCategory {
    let scores = [
        fitness.temperature,
        fitness.humidity,
        fitness.light,
        fitness.co2,
    ];
    let mut worst = 0;
    for (index, score) in scores.iter().enumerate() {
        if *score < scores[worst] {
            worst = index;
        }
    }
    match worst {
        0 => {
            if conditions.temperature >= profile.temperature.optimal {
                StressCategory::Heat
            } else {
                StressCategory::Cold
            }
        }
        1 => {
            if conditions.humidity <= profile.humidity.optimal {
                StressCategory::Drought
            } else {
                StressCategory::Flood
            }
        }
        2 => StressCategory::Light,
        _ => StressCategory::Atmospheric,
    }
}
