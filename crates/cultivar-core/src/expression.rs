//! Trait expression: genotype x environment to expressed phenotype.
//!
//! Recomputation walks the genotype's locus map, folds per-locus
//! contributions through a static table (one locus may feed several traits),
//! applies epistatic pair modulation, and scales by the environmental
//! response and species base modifiers. Results are cached under a coarse
//! time window shared by every key; see [`TraitExpressionEngine`] for the
//! exact semantics.

use crate::environment::EnvironmentalConditions;
use crate::fitness::FitnessBreakdown;
use crate::genetics::{GeneLocus, Genotype};
use crate::stress::StressResponse;
use crate::{PlantId, clamp01, sanitize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Per-locus contribution weights, ordinal-indexed by [`GeneLocus::index`].
/// Columns: height, THC, CBD, yield. Several loci carry weight in more than
/// one column; that multi-trait spread is the pleiotropy path.
const LOCUS_CONTRIBUTIONS: [[f32; 4]; 8] = [
    // Stature
    [0.45, 0.00, 0.00, 0.15],
    // InternodeSpacing
    [0.25, 0.00, 0.00, 0.10],
    // ThcSynthase
    [0.00, 0.60, 0.00, 0.00],
    // CbdSynthase
    [0.00, 0.00, 0.60, 0.00],
    // BudDensity
    [0.00, 0.10, 0.10, 0.45],
    // FloweringTime
    [0.05, 0.10, 0.10, 0.15],
    // RootVigor
    [0.25, 0.00, 0.00, 0.15],
    // Resilience
    [0.00, 0.00, 0.20, 0.10],
];

/// Column each locus drives hardest; the only contribution used when
/// pleiotropy is disabled.
const PRIMARY_TRAIT: [usize; 8] = [0, 0, 1, 2, 3, 3, 0, 2];

/// Non-additive locus interactions. `factor * expressed(a) * expressed(b)`
/// is added to the named trait column before environmental scaling.
struct EpistaticRule {
    a: GeneLocus,
    b: GeneLocus,
    trait_index: usize,
    factor: f32,
}

/// Synthase substrate competition suppresses both cannabinoids when both
/// loci run hot; root mass and stature reinforce each other; racing through
/// flowering costs bud mass.
const EPISTATIC_RULES: [EpistaticRule; 5] = [
    EpistaticRule {
        a: GeneLocus::ThcSynthase,
        b: GeneLocus::CbdSynthase,
        trait_index: 1,
        factor: -0.25,
    },
    EpistaticRule {
        a: GeneLocus::ThcSynthase,
        b: GeneLocus::CbdSynthase,
        trait_index: 2,
        factor: -0.25,
    },
    EpistaticRule {
        a: GeneLocus::RootVigor,
        b: GeneLocus::Stature,
        trait_index: 0,
        factor: 0.10,
    },
    EpistaticRule {
        a: GeneLocus::Stature,
        b: GeneLocus::BudDensity,
        trait_index: 3,
        factor: 0.12,
    },
    EpistaticRule {
        a: GeneLocus::FloweringTime,
        b: GeneLocus::BudDensity,
        trait_index: 3,
        factor: -0.10,
    },
];

/// Weights folding the four expressions into overall fitness.
const OVERALL_WEIGHTS: [f32; 4] = [0.30, 0.25, 0.15, 0.30];

/// Expressed phenotype for one plant under one environment snapshot.
///
/// The four expression values are multipliers on a roughly unit scale and
/// are not hard-clamped; a height expression above 1.0 drives
/// faster-than-baseline growth downstream. `overall_fitness` and the stress
/// response are clamped at this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitExpressionResult {
    pub height_expression: f32,
    pub thc_expression: f32,
    pub cbd_expression: f32,
    pub yield_expression: f32,
    pub overall_fitness: f32,
    pub stress_response: StressResponse,
}

impl TraitExpressionResult {
    /// Neutral result substituted when a computation faults.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            height_expression: 0.5,
            thc_expression: 0.5,
            cbd_expression: 0.5,
            yield_expression: 0.5,
            overall_fitness: 0.5,
            stress_response: StressResponse::default(),
        }
    }
}

/// Species base modifiers carried into an expression job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseModifiers {
    pub height: f32,
    pub potency: f32,
    pub yield_factor: f32,
}

impl Default for BaseModifiers {
    fn default() -> Self {
        Self {
            height: 1.0,
            potency: 1.0,
            yield_factor: 1.0,
        }
    }
}

/// Everything needed to evaluate one plant, detached from the arena so the
/// batch path can fan out without borrowing world state.
#[derive(Debug, Clone)]
pub struct ExpressionJob {
    pub plant: PlantId,
    pub genotype: Arc<Genotype>,
    pub base: BaseModifiers,
    pub conditions: EnvironmentalConditions,
    pub fitness: FitnessBreakdown,
    pub stress: StressResponse,
}

/// Operational counters exposed to dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStats {
    /// Full recomputations performed.
    pub calculations: u64,
    /// Batch evaluations performed.
    pub batches: u64,
    /// Lookups answered from the cache.
    pub cache_hits: u64,
    /// Results replaced by the neutral fallback.
    pub fallbacks: u64,
    /// Rolling mean cost of one recomputation, in microseconds.
    pub average_calc_micros: f64,
    /// Rolling mean cost of one whole batch evaluation, in microseconds.
    pub average_batch_micros: f64,
    /// Entries currently held in the cache.
    pub cache_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ExpressionKey {
    plant: PlantId,
    environment: u64,
}

/// Cached, batchable trait-expression evaluator.
///
/// The cache is shared across all plants and guarded by ONE global refresh
/// timestamp rather than per-key TTLs: any hit inside the window returns
/// the stored result, and any miss refreshes the window for every key. A
/// burst of distinct keys inside one window therefore all count as fresh
/// even though only the first miss did the refresh. See DESIGN.md before
/// changing this.
#[derive(Debug)]
pub struct TraitExpressionEngine {
    epistasis_enabled: bool,
    pleiotropy_enabled: bool,
    window_secs: f64,
    cache: HashMap<ExpressionKey, TraitExpressionResult>,
    last_refresh: Option<f64>,
    stats: ExpressionStats,
}

impl TraitExpressionEngine {
    /// Build an engine with the given cache window (simulation seconds).
    #[must_use]
    pub fn new(window_secs: f64, epistasis_enabled: bool, pleiotropy_enabled: bool) -> Self {
        Self {
            epistasis_enabled,
            pleiotropy_enabled,
            window_secs,
            cache: HashMap::new(),
            last_refresh: None,
            stats: ExpressionStats::default(),
        }
    }

    /// Evaluate a single plant at simulation time `now`.
    pub fn express(&mut self, job: &ExpressionJob, now: f64) -> TraitExpressionResult {
        let key = ExpressionKey {
            plant: job.plant,
            environment: job.conditions.signature(),
        };
        if self.window_is_fresh(now) {
            if let Some(cached) = self.cache.get(&key) {
                self.stats.cache_hits += 1;
                return cached.clone();
            }
        }
        let started = Instant::now();
        let (result, faulted) =
            compute_expression(job, self.epistasis_enabled, self.pleiotropy_enabled);
        self.record_calculation(started.elapsed().as_micros() as f64, 1, faulted as u64);
        self.cache.insert(key, result.clone());
        self.last_refresh = Some(now);
        result
    }

    /// Evaluate a batch of plants, equivalent to sequential [`Self::express`]
    /// calls with the cache window decided once for the whole batch.
    pub fn express_batch(&mut self, jobs: &[ExpressionJob], now: f64) -> Vec<TraitExpressionResult> {
        if jobs.is_empty() {
            return Vec::new();
        }
        let batch_started = Instant::now();
        self.stats.batches += 1;
        let fresh = self.window_is_fresh(now);

        let mut results: Vec<Option<TraitExpressionResult>> = vec![None; jobs.len()];
        let mut pending: Vec<(usize, ExpressionKey)> = Vec::new();
        for (index, job) in jobs.iter().enumerate() {
            let key = ExpressionKey {
                plant: job.plant,
                environment: job.conditions.signature(),
            };
            match self.cache.get(&key) {
                Some(cached) if fresh => {
                    self.stats.cache_hits += 1;
                    results[index] = Some(cached.clone());
                }
                _ => pending.push((index, key)),
            }
        }

        if !pending.is_empty() {
            let epistasis = self.epistasis_enabled;
            let pleiotropy = self.pleiotropy_enabled;
            let started = Instant::now();
            let computed: Vec<(TraitExpressionResult, bool)> = if pending.len() > 1 {
                pending
                    .par_iter()
                    .map(|(index, _)| compute_expression(&jobs[*index], epistasis, pleiotropy))
                    .collect()
            } else {
                pending
                    .iter()
                    .map(|(index, _)| compute_expression(&jobs[*index], epistasis, pleiotropy))
                    .collect()
            };
            let elapsed = started.elapsed().as_micros() as f64;
            let faults = computed.iter().filter(|(_, faulted)| *faulted).count() as u64;
            self.record_calculation(elapsed, pending.len() as u64, faults);
            for ((index, key), (result, _)) in pending.into_iter().zip(computed) {
                self.cache.insert(key, result.clone());
                results[index] = Some(result);
            }
            self.last_refresh = Some(now);
        }

        let batch_micros = batch_started.elapsed().as_micros() as f64;
        let batches = self.stats.batches as f64;
        self.stats.average_batch_micros +=
            (batch_micros - self.stats.average_batch_micros) / batches;

        results
            .into_iter()
            .map(|slot| slot.unwrap_or_else(TraitExpressionResult::neutral))
            .collect()
    }

    fn window_is_fresh(&self, now: f64) -> bool {
        self.last_refresh
            .is_some_and(|refreshed| now - refreshed < self.window_secs)
    }

    fn record_calculation(&mut self, total_micros: f64, count: u64, faults: u64) {
        if count == 0 {
            return;
        }
        let per_call = total_micros / count as f64;
        let previous = self.stats.calculations;
        self.stats.calculations += count;
        self.stats.fallbacks += faults;
        // Cumulative mean keeps the dashboard number stable under bursts.
        let total = self.stats.calculations as f64;
        self.stats.average_calc_micros =
            (self.stats.average_calc_micros * previous as f64 + per_call * count as f64) / total;
    }

    /// Drop every cached entry and forget the refresh timestamp.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.last_refresh = None;
    }

    /// Release excess cache capacity without discarding entries.
    pub fn compact_cache(&mut self) {
        self.cache.shrink_to_fit();
    }

    /// Number of cached results.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Snapshot of operational counters.
    #[must_use]
    pub fn stats(&self) -> ExpressionStats {
        ExpressionStats {
            cache_entries: self.cache.len(),
            ..self.stats
        }
    }
}

/// Pure recomputation used by both the single and batched paths. Returns
/// the result plus whether any component had to fall back to neutral.
fn compute_expression(
    job: &ExpressionJob,
    epistasis_enabled: bool,
    pleiotropy_enabled: bool,
) -> (TraitExpressionResult, bool) {
    let mut raw = [0.0f32; 4];
    let mut weight_sums = [0.0f32; 4];
    for (locus, pair) in job.genotype.iter() {
        let expressed = pair.expressed();
        let row = LOCUS_CONTRIBUTIONS[locus.index()];
        for trait_index in 0..4 {
            let weight = row[trait_index];
            if weight == 0.0 {
                continue;
            }
            if !pleiotropy_enabled && PRIMARY_TRAIT[locus.index()] != trait_index {
                continue;
            }
            raw[trait_index] += expressed * weight;
            weight_sums[trait_index] += weight;
        }
    }
    for trait_index in 0..4 {
        if weight_sums[trait_index] > 0.0 {
            raw[trait_index] /= weight_sums[trait_index];
        } else {
            raw[trait_index] = 0.5;
        }
    }

    if epistasis_enabled {
        for rule in &EPISTATIC_RULES {
            let interaction = job.genotype.expressed(rule.a) * job.genotype.expressed(rule.b);
            raw[rule.trait_index] += rule.factor * interaction;
        }
    }

    let stress_penalty = job.stress.overall;
    let height = raw[0]
        * (0.5 + 0.5 * 0.5 * (job.fitness.light + job.fitness.temperature))
        * (1.0 - 0.2 * stress_penalty)
        * job.base.height;
    let thc = raw[1]
        * (0.6 + 0.4 * job.fitness.light)
        * job.base.potency;
    let cbd = raw[2]
        * (0.6 + 0.4 * job.fitness.temperature)
        * job.base.potency;
    let yield_expression = raw[3]
        * job.fitness.combined
        * (1.0 - 0.4 * stress_penalty)
        * job.base.yield_factor;

    let (height, fault_a) = sanitize(height, 0.5);
    let (thc, fault_b) = sanitize(thc, 0.5);
    let (cbd, fault_c) = sanitize(cbd, 0.5);
    let (yield_expression, fault_d) = sanitize(yield_expression, 0.5);
    let faulted = fault_a || fault_b || fault_c || fault_d;
    if faulted {
        tracing::warn!(plant = ?job.plant, "trait expression fell back to neutral components");
    }

    let overall_fitness = clamp01(
        height * OVERALL_WEIGHTS[0]
            + thc * OVERALL_WEIGHTS[1]
            + cbd * OVERALL_WEIGHTS[2]
            + yield_expression * OVERALL_WEIGHTS[3],
    );

    (
        TraitExpressionResult {
            height_expression: height,
            thc_expression: thc,
            cbd_expression: cbd,
            yield_expression,
            overall_fitness,
            stress_response: job.stress.clone(),
        },
        faulted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SpeciesProfile;
    use crate::fitness::{FitnessWeights, environmental_fitness};
    use crate::genetics::{Allele, AllelePair};
    use slotmap::SlotMap;

    fn plant_ids(count: usize) -> Vec<PlantId> {
        let mut arena: SlotMap<PlantId, ()> = SlotMap::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    fn job_for(plant: PlantId, genotype: Genotype) -> ExpressionJob {
        let profile = SpeciesProfile::indoor_baseline("test");
        let conditions = EnvironmentalConditions::indoor_default();
        let fitness = environmental_fitness(&profile, &conditions, &FitnessWeights::default());
        ExpressionJob {
            plant,
            genotype: Arc::new(genotype),
            base: BaseModifiers::default(),
            conditions,
            fitness,
            stress: StressResponse::default(),
        }
    }

    #[test]
    fn high_thc_genotype_expresses_more_thc() {
        let ids = plant_ids(2);
        let hot = Genotype::from_pairs([(
            GeneLocus::ThcSynthase,
            AllelePair::homozygous(Allele::new(1.0, 1.0)),
        )]);
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        let strong = engine.express(&job_for(ids[0], hot), 0.0);
        let neutral = engine.express(&job_for(ids[1], Genotype::balanced()), 0.0);
        assert!(strong.thc_expression > neutral.thc_expression);
    }

    #[test]
    fn epistatic_competition_suppresses_dual_synthase_genotypes() {
        let ids = plant_ids(2);
        let dual = Genotype::from_pairs([
            (
                GeneLocus::ThcSynthase,
                AllelePair::homozygous(Allele::new(1.0, 1.0)),
            ),
            (
                GeneLocus::CbdSynthase,
                AllelePair::homozygous(Allele::new(1.0, 1.0)),
            ),
        ]);
        let with = TraitExpressionEngine::new(5.0, true, true)
            .express(&job_for(ids[0], dual.clone()), 0.0);
        let without =
            TraitExpressionEngine::new(5.0, false, true).express(&job_for(ids[1], dual), 0.0);
        assert!(with.thc_expression < without.thc_expression);
        assert!(with.cbd_expression < without.cbd_expression);
    }

    #[test]
    fn pleiotropy_toggles_secondary_contributions() {
        let ids = plant_ids(2);
        let dense = Genotype::from_pairs([(
            GeneLocus::BudDensity,
            AllelePair::homozygous(Allele::new(1.0, 1.0)),
        )]);
        let with = TraitExpressionEngine::new(5.0, true, true)
            .express(&job_for(ids[0], dense.clone()), 0.0);
        let without =
            TraitExpressionEngine::new(5.0, true, false).express(&job_for(ids[1], dense), 0.0);
        // BudDensity's secondary THC spread only exists on the pleiotropy path.
        assert!(with.thc_expression != without.thc_expression);
    }

    #[test]
    fn cache_hit_inside_window_skips_recomputation() {
        let ids = plant_ids(1);
        let job = job_for(ids[0], Genotype::balanced());
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        let first = engine.express(&job, 0.0);
        let second = engine.express(&job, 2.0);
        assert_eq!(first, second);
        let stats = engine.stats();
        assert_eq!(stats.calculations, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn expired_window_recomputes_to_the_same_result() {
        let ids = plant_ids(1);
        let job = job_for(ids[0], Genotype::balanced());
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        let first = engine.express(&job, 0.0);
        let second = engine.express(&job, 6.0);
        assert_eq!(first, second);
        assert_eq!(engine.stats().calculations, 2);
    }

    #[test]
    fn any_miss_refreshes_the_window_for_every_key() {
        let ids = plant_ids(2);
        let job_a = job_for(ids[0], Genotype::balanced());
        let job_b = job_for(ids[1], Genotype::balanced());
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        engine.express(&job_a, 0.0);
        // Window would lapse for A at t=5; the miss for B at t=4 refreshes
        // the shared timestamp, so A still reads as fresh at t=8.
        engine.express(&job_b, 4.0);
        engine.express(&job_a, 8.0);
        let stats = engine.stats();
        assert_eq!(stats.calculations, 2);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn batch_matches_sequential_results() {
        let ids = plant_ids(8);
        let mut rng = {
            use rand::SeedableRng;
            rand::rngs::SmallRng::seed_from_u64(23)
        };
        let jobs: Vec<ExpressionJob> = ids
            .iter()
            .map(|&plant| job_for(plant, Genotype::random(&mut rng)))
            .collect();

        let mut sequential_engine = TraitExpressionEngine::new(5.0, true, true);
        let sequential: Vec<TraitExpressionResult> = jobs
            .iter()
            .map(|job| sequential_engine.express(job, 0.0))
            .collect();

        let mut batch_engine = TraitExpressionEngine::new(5.0, true, true);
        let batched = batch_engine.express_batch(&jobs, 0.0);

        for (a, b) in sequential.iter().zip(&batched) {
            assert!((a.height_expression - b.height_expression).abs() < 1e-6);
            assert!((a.thc_expression - b.thc_expression).abs() < 1e-6);
            assert!((a.cbd_expression - b.cbd_expression).abs() < 1e-6);
            assert!((a.yield_expression - b.yield_expression).abs() < 1e-6);
            assert!((a.overall_fitness - b.overall_fitness).abs() < 1e-6);
        }
        assert_eq!(batch_engine.stats().calculations, jobs.len() as u64);
    }

    #[test]
    fn batch_reuses_fresh_cache_entries() {
        let ids = plant_ids(4);
        let jobs: Vec<ExpressionJob> = ids
            .iter()
            .map(|&plant| job_for(plant, Genotype::balanced()))
            .collect();
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        engine.express_batch(&jobs, 0.0);
        engine.express_batch(&jobs, 1.0);
        let stats = engine.stats();
        assert_eq!(stats.calculations, 4);
        assert_eq!(stats.cache_hits, 4);
        assert_eq!(stats.batches, 2);
    }

    #[test]
    fn clear_cache_forces_recomputation() {
        let ids = plant_ids(1);
        let job = job_for(ids[0], Genotype::balanced());
        let mut engine = TraitExpressionEngine::new(5.0, true, true);
        engine.express(&job, 0.0);
        engine.clear_cache();
        assert_eq!(engine.cache_len(), 0);
        engine.express(&job, 1.0);
        assert_eq!(engine.stats().calculations, 2);
    }

    #[test]
    fn overall_fitness_is_clamped_while_traits_may_overshoot() {
        let ids = plant_ids(1);
        let mut job = job_for(
            ids[0],
            Genotype::from_pairs(GeneLocus::ALL.map(|locus| {
                (locus, AllelePair::homozygous(Allele::new(1.0, 1.0)))
            })),
        );
        job.base = BaseModifiers {
            height: 1.8,
            potency: 1.5,
            yield_factor: 1.6,
        };
        let result = TraitExpressionEngine::new(5.0, true, true).express(&job, 0.0);
        assert!(result.height_expression > 1.0);
        assert!(result.overall_fitness <= 1.0);
    }
}
