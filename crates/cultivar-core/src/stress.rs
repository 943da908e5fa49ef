//! Stress sources, the per-plant stress ledger, and the stress response
//! attached to trait expression results.

use crate::{Tick, clamp01};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Shared classification of stress causes.
///
/// Consumers dispatch plant-state mutations on this tag (heat curls leaves,
/// drought wilts, nutrient burn tips), so the taxonomy is part of the
/// engine's contract and is never round-tripped through strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StressCategory {
    /// Temperature outside the band without a clear hot/cold direction.
    Temperature,
    Heat,
    Cold,
    Light,
    /// General root-zone water imbalance.
    Water,
    Drought,
    Flood,
    Nutrient,
    /// CO2 or other air-composition problems.
    Atmospheric,
}

/// Descriptor of something that stresses a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSource {
    /// Stable name; applying a source with the same name updates in place.
    pub name: Cow<'static, str>,
    /// Health damage per second at intensity 1.0.
    pub damage_per_second: f32,
    /// Contribution of this source to the aggregate stress level.
    pub stress_multiplier: f32,
    /// Taxonomy tag used by consumers and the stress response.
    pub category: StressCategory,
}

impl StressSource {
    /// Construct a stress source descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        damage_per_second: f32,
        stress_multiplier: f32,
        category: StressCategory,
    ) -> Self {
        Self {
            name: name.into(),
            damage_per_second,
            stress_multiplier,
            category,
        }
    }

    /// Synthetic source the orchestrator applies when sustained low fitness
    /// turns into physiological strain.
    #[must_use]
    pub fn environmental(category: StressCategory) -> Self {
        Self::new("EnvironmentalStrain", 0.01, 0.6, category)
    }
}

/// A stress source currently acting on a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStressor {
    pub source: StressSource,
    /// Current intensity; positive, typically at or below 1.0.
    pub intensity: f32,
    /// Tick at which the source first appeared.
    pub applied_at: Tick,
}

/// Per-plant collection of active stressors.
///
/// Owned by the plant's arena entry; no stressor outlives its plant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StressLedger {
    stressors: Vec<ActiveStressor>,
}

impl StressLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stressor or, when the source is already active, update its
    /// intensity in place. Multiple applications of one source never stack.
    /// Non-positive intensities are ignored as invalid input.
    pub fn apply(&mut self, source: StressSource, intensity: f32, now: Tick) {
        if intensity <= 0.0 || !intensity.is_finite() {
            tracing::debug!(source = %source.name, intensity, "ignoring non-positive stress");
            return;
        }
        if let Some(existing) = self
            .stressors
            .iter_mut()
            .find(|entry| entry.source.name == source.name)
        {
            existing.intensity = intensity;
            existing.source = source;
            return;
        }
        self.stressors.push(ActiveStressor {
            source,
            intensity,
            applied_at: now,
        });
    }

    /// Remove a stressor by source name. Returns whether one was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.stressors.len();
        self.stressors.retain(|entry| entry.source.name != name);
        self.stressors.len() != before
    }

    /// Advance the ledger by `dt` seconds: accumulate damage from every
    /// active stressor, then decay intensities toward zero at
    /// `recovery_rate` and drop entries that reached it.
    pub fn tick(&mut self, dt: f32, recovery_rate: f32) -> f32 {
        let mut damage = 0.0;
        for entry in &mut self.stressors {
            damage += entry.intensity * entry.source.damage_per_second * dt;
            entry.intensity -= recovery_rate * dt;
        }
        self.stressors.retain(|entry| entry.intensity > 0.0);
        damage
    }

    /// Aggregate stress level: clamped weighted sum over active stressors.
    #[must_use]
    pub fn stress_level(&self) -> f32 {
        clamp01(
            self.stressors
                .iter()
                .map(|entry| entry.intensity * entry.source.stress_multiplier)
                .sum(),
        )
    }

    /// Currently active stressors.
    #[must_use]
    pub fn active(&self) -> &[ActiveStressor] {
        &self.stressors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stressors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stressors.is_empty()
    }

    /// Drop every stressor at once (plant death or harvest).
    pub fn clear(&mut self) {
        self.stressors.clear();
    }
}

/// Strain synthesized per second when the environment scores below the low
/// fitness threshold; zero otherwise.
#[must_use]
pub fn environmental_strain(fitness: f32, low_threshold: f32, factor: f32) -> f32 {
    if fitness < low_threshold {
        (1.0 - fitness) * factor
    } else {
        0.0
    }
}

/// Health regeneration granted per second when the environment scores above
/// the high fitness threshold; zero otherwise.
#[must_use]
pub fn regeneration_bonus(fitness: f32, high_threshold: f32, factor: f32) -> f32 {
    if fitness > high_threshold {
        (fitness - high_threshold) * factor
    } else {
        0.0
    }
}

/// One named stress factor inside a [`StressResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressFactor {
    pub category: StressCategory,
    /// Clamped severity of this category's contribution.
    pub severity: f32,
}

/// Stress summary embedded in a trait expression result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StressResponse {
    /// Aggregate stress level, clamped.
    pub overall: f32,
    /// Per-category severities for active stressors.
    pub factors: Vec<StressFactor>,
    /// How much headroom the plant has to absorb further stress.
    pub adaptive_capacity: f32,
}

impl StressResponse {
    /// Fold a ledger into named per-category factors.
    ///
    /// `adaptive_capacity` blends adaptation progress with the resilience
    /// locus so hardened, well-adapted plants report more headroom.
    #[must_use]
    pub fn from_ledger(ledger: &StressLedger, adaptation: f32, resilience: f32) -> Self {
        let mut factors: Vec<StressFactor> = Vec::new();
        for entry in ledger.active() {
            let severity = entry.intensity * entry.source.stress_multiplier;
            match factors
                .iter_mut()
                .find(|factor| factor.category == entry.source.category)
            {
                Some(factor) => factor.severity = clamp01(factor.severity + severity),
                None => factors.push(StressFactor {
                    category: entry.source.category,
                    severity: clamp01(severity),
                }),
            }
        }
        Self {
            overall: ledger.stress_level(),
            factors,
            adaptive_capacity: clamp01(0.5 * adaptation + 0.5 * resilience),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heat() -> StressSource {
        StressSource::new("Heat", 0.012, 0.9, StressCategory::Heat)
    }

    #[test]
    fn applying_the_same_source_twice_updates_in_place() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.4, Tick(1));
        ledger.apply(heat(), 0.7, Tick(2));
        assert_eq!(ledger.len(), 1);
        assert!((ledger.active()[0].intensity - 0.7).abs() < f32::EPSILON);
        assert_eq!(ledger.active()[0].applied_at, Tick(1));
    }

    #[test]
    fn non_positive_intensity_is_a_no_op() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.0, Tick(1));
        ledger.apply(heat(), -0.5, Tick(1));
        ledger.apply(heat(), f32::NAN, Tick(1));
        assert!(ledger.is_empty());
    }

    #[test]
    fn stress_level_is_zero_without_stressors_and_clamped_with_many() {
        let mut ledger = StressLedger::new();
        assert_eq!(ledger.stress_level(), 0.0);
        ledger.apply(heat(), 1.0, Tick(1));
        ledger.apply(
            StressSource::new("Drought", 0.015, 1.0, StressCategory::Drought),
            1.0,
            Tick(1),
        );
        ledger.apply(
            StressSource::new("LightBurn", 0.008, 0.6, StressCategory::Light),
            1.0,
            Tick(1),
        );
        assert!((ledger.stress_level() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn recovery_drives_stress_to_zero() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.5, Tick(1));
        let mut ticks = 0;
        while !ledger.is_empty() {
            ledger.tick(1.0, 0.05);
            ticks += 1;
            assert!(ticks < 100, "recovery never converged");
        }
        assert_eq!(ledger.stress_level(), 0.0);
        assert_eq!(ticks, 10);
    }

    #[test]
    fn damage_accrues_before_decay() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.5, Tick(1));
        let damage = ledger.tick(2.0, 0.0);
        assert!((damage - 0.5 * 0.012 * 2.0).abs() < 1e-6);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn apply_then_remove_leaves_no_active_stressors() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.5, Tick(1));
        assert!(ledger.remove("Heat"));
        assert!(!ledger.remove("Heat"));
        assert!(ledger.active().is_empty());
    }

    #[test]
    fn strain_and_regen_respect_their_thresholds() {
        assert_eq!(environmental_strain(0.9, 0.7, 0.5), 0.0);
        assert!((environmental_strain(0.5, 0.7, 0.5) - 0.25).abs() < 1e-6);
        assert_eq!(regeneration_bonus(0.7, 0.8, 0.5), 0.0);
        assert!((regeneration_bonus(0.9, 0.8, 0.5) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn response_groups_factors_by_category() {
        let mut ledger = StressLedger::new();
        ledger.apply(heat(), 0.5, Tick(1));
        ledger.apply(
            StressSource::new("HeatSpike", 0.02, 0.4, StressCategory::Heat),
            0.5,
            Tick(2),
        );
        ledger.apply(
            StressSource::new("Drought", 0.015, 1.0, StressCategory::Drought),
            0.3,
            Tick(2),
        );
        let response = StressResponse::from_ledger(&ledger, 0.6, 0.8);
        assert_eq!(response.factors.len(), 2);
        let heat_factor = response
            .factors
            .iter()
            .find(|factor| factor.category == StressCategory::Heat)
            .expect("heat factor");
        assert!((heat_factor.severity - (0.5 * 0.9 + 0.5 * 0.4)).abs() < 1e-6);
        assert!((response.adaptive_capacity - 0.7).abs() < 1e-6);
    }
}
