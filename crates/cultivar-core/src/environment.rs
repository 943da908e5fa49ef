//! Environmental readings, species tolerance profiles, and the collaborator
//! seams the orchestrator is wired to at construction.

use crate::stress::{StressCategory, StressSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Identifier for a grow zone queried against the environment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl ZoneId {
    /// Create a new zone identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier for a species/strain in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    /// Create a new species identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// One snapshot of the growing conditions around a plant.
///
/// `initialized` distinguishes "never sampled" from a legitimate zero
/// reading; consumers must treat an un-initialized snapshot as "fetch the
/// fallback", never as a zero-degree greenhouse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    /// Air temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent (0-100).
    pub humidity: f32,
    /// Photosynthetic light intensity in micromol per square meter-second.
    pub light_intensity: f32,
    /// Carbon dioxide concentration in parts per million.
    pub co2: f32,
    /// Whether this snapshot came from a real sample.
    pub initialized: bool,
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            light_intensity: 0.0,
            co2: 0.0,
            initialized: false,
        }
    }
}

impl EnvironmentalConditions {
    /// Construct an initialized snapshot from raw readings.
    #[must_use]
    pub const fn new(temperature: f32, humidity: f32, light_intensity: f32, co2: f32) -> Self {
        Self {
            temperature,
            humidity,
            light_intensity,
            co2,
            initialized: true,
        }
    }

    /// Documented indoor fallback used whenever a provider has no data.
    #[must_use]
    pub const fn indoor_default() -> Self {
        Self::new(24.0, 55.0, 600.0, 900.0)
    }

    /// Vapor-pressure deficit in kilopascals, derived from temperature and
    /// relative humidity (Tetens saturation curve).
    #[must_use]
    pub fn vapor_pressure_deficit(&self) -> f32 {
        let saturation = 0.6108 * (17.27 * self.temperature / (self.temperature + 237.3)).exp();
        let fraction = (self.humidity / 100.0).clamp(0.0, 1.0);
        (saturation * (1.0 - fraction)).max(0.0)
    }

    /// Quantised hash of the readings, used as the expression cache key.
    ///
    /// Readings are bucketed (0.5 degC, 1% RH, 25 umol light, 25 ppm CO2)
    /// so sensor jitter below perceptible resolution maps to the same key.
    #[must_use]
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        ((self.temperature * 2.0).round() as i32).hash(&mut hasher);
        (self.humidity.round() as i32).hash(&mut hasher);
        ((self.light_intensity / 25.0).round() as i32).hash(&mut hasher);
        ((self.co2 / 25.0).round() as i32).hash(&mut hasher);
        self.initialized.hash(&mut hasher);
        hasher.finish()
    }
}

/// Tolerance band for one environmental factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    /// Lower edge of the tolerated range.
    pub min: f32,
    /// Upper edge of the tolerated range.
    pub max: f32,
    /// Reading at which fitness peaks.
    pub optimal: f32,
}

impl ToleranceBand {
    /// Construct a band; `optimal` is clamped into `[min, max]`.
    #[must_use]
    pub fn new(min: f32, max: f32, optimal: f32) -> Self {
        Self {
            min,
            max,
            optimal: optimal.clamp(min, max),
        }
    }

    /// Width of the tolerated range.
    #[must_use]
    pub fn width(&self) -> f32 {
        (self.max - self.min).max(f32::EPSILON)
    }

    /// Whether a reading falls inside the tolerated range.
    #[must_use]
    pub fn contains(&self, reading: f32) -> bool {
        reading >= self.min && reading <= self.max
    }
}

/// Per-species optimal-range data, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    /// Display name of the strain.
    pub name: String,
    /// Tolerated temperature band, degrees Celsius.
    pub temperature: ToleranceBand,
    /// Tolerated relative-humidity band, percent.
    pub humidity: ToleranceBand,
    /// Tolerated light-intensity band, micromol.
    pub light: ToleranceBand,
    /// Tolerated CO2 band, ppm.
    pub co2: ToleranceBand,
    /// Baseline multiplier applied to expressed height.
    pub height_modifier: f32,
    /// Baseline multiplier applied to expressed potency.
    pub potency_modifier: f32,
    /// Baseline multiplier applied to expressed yield.
    pub yield_modifier: f32,
}

impl SpeciesProfile {
    /// A forgiving indoor strain useful as a starting point and in tests.
    #[must_use]
    pub fn indoor_baseline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: ToleranceBand::new(18.0, 30.0, 24.0),
            humidity: ToleranceBand::new(40.0, 70.0, 55.0),
            light: ToleranceBand::new(300.0, 1000.0, 650.0),
            co2: ToleranceBand::new(400.0, 1400.0, 950.0),
            height_modifier: 1.0,
            potency_modifier: 1.0,
            yield_modifier: 1.0,
        }
    }
}

/// Synchronous source of environmental readings.
///
/// Implementations must return immediately; a snapshot with
/// `initialized == false` tells the caller to use the indoor default.
pub trait EnvironmentProvider: Send {
    /// Sample current conditions for a zone.
    fn sample(&self, zone: ZoneId) -> EnvironmentalConditions;
}

/// Provider backed by a base climate plus optional per-zone overrides.
#[derive(Debug, Clone)]
pub struct IndoorEnvironment {
    base: EnvironmentalConditions,
    zones: HashMap<ZoneId, EnvironmentalConditions>,
}

impl Default for IndoorEnvironment {
    fn default() -> Self {
        Self {
            base: EnvironmentalConditions::indoor_default(),
            zones: HashMap::new(),
        }
    }
}

impl IndoorEnvironment {
    /// Provider that reports `base` for every zone.
    #[must_use]
    pub fn new(base: EnvironmentalConditions) -> Self {
        Self {
            base,
            zones: HashMap::new(),
        }
    }

    /// Override the climate of a single zone.
    pub fn set_zone(&mut self, zone: ZoneId, conditions: EnvironmentalConditions) {
        self.zones.insert(zone, conditions);
    }

    /// Drop a zone override, reverting it to the base climate.
    pub fn clear_zone(&mut self, zone: ZoneId) {
        self.zones.remove(&zone);
    }
}

impl EnvironmentProvider for IndoorEnvironment {
    fn sample(&self, zone: ZoneId) -> EnvironmentalConditions {
        self.zones.get(&zone).copied().unwrap_or(self.base)
    }
}

/// Read-only species profile lookup.
pub trait SpeciesCatalog: Send {
    /// Profile for a species, if the catalog knows it.
    fn profile(&self, species: SpeciesId) -> Option<&SpeciesProfile>;
}

/// In-memory species catalog populated at composition time.
#[derive(Debug, Default, Clone)]
pub struct StaticSpeciesCatalog {
    profiles: HashMap<SpeciesId, SpeciesProfile>,
}

impl StaticSpeciesCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile, replacing any previous entry for the species.
    pub fn insert(&mut self, species: SpeciesId, profile: SpeciesProfile) {
        self.profiles.insert(species, profile);
    }

    /// Number of registered species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns true when no species are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl SpeciesCatalog for StaticSpeciesCatalog {
    fn profile(&self, species: SpeciesId) -> Option<&SpeciesProfile> {
        self.profiles.get(&species)
    }
}

/// Read-only stressor definition lookup.
pub trait StressSourceCatalog: Send {
    /// Definition for a named stress source, if known.
    fn source(&self, name: &str) -> Option<StressSource>;
}

/// In-memory stress-source catalog.
#[derive(Debug, Default, Clone)]
pub struct StaticStressCatalog {
    sources: HashMap<String, StressSource>,
}

impl StaticStressCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-loaded with the standard cultivation stressors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for source in [
            StressSource::new("Heat", 0.012, 0.9, StressCategory::Heat),
            StressSource::new("Cold", 0.010, 0.8, StressCategory::Cold),
            StressSource::new("TemperatureSwing", 0.006, 0.5, StressCategory::Temperature),
            StressSource::new("LightBurn", 0.008, 0.6, StressCategory::Light),
            StressSource::new("Drought", 0.015, 1.0, StressCategory::Drought),
            StressSource::new("Overwatering", 0.009, 0.7, StressCategory::Flood),
            StressSource::new("RootZoneImbalance", 0.007, 0.6, StressCategory::Water),
            StressSource::new("NutrientDeficiency", 0.011, 0.8, StressCategory::Nutrient),
            StressSource::new("Co2Depletion", 0.004, 0.4, StressCategory::Atmospheric),
        ] {
            catalog.insert(source);
        }
        catalog
    }

    /// Register a source under its own name.
    pub fn insert(&mut self, source: StressSource) {
        self.sources.insert(source.name.to_string(), source);
    }
}

impl StressSourceCatalog for StaticStressCatalog {
    fn source(&self, name: &str) -> Option<StressSource> {
        self.sources.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_snapshot_is_distinguishable_from_zero() {
        let never_sampled = EnvironmentalConditions::default();
        let freezing = EnvironmentalConditions::new(0.0, 0.0, 0.0, 0.0);
        assert!(!never_sampled.initialized);
        assert!(freezing.initialized);
        assert_ne!(never_sampled.signature(), freezing.signature());
    }

    #[test]
    fn signature_ignores_sub_resolution_jitter() {
        let a = EnvironmentalConditions::new(24.0, 55.0, 600.0, 900.0);
        let b = EnvironmentalConditions::new(24.04, 55.2, 603.0, 905.0);
        let c = EnvironmentalConditions::new(27.0, 55.0, 600.0, 900.0);
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn vapor_pressure_deficit_grows_with_dry_air() {
        let humid = EnvironmentalConditions::new(24.0, 80.0, 600.0, 900.0);
        let dry = EnvironmentalConditions::new(24.0, 30.0, 600.0, 900.0);
        assert!(dry.vapor_pressure_deficit() > humid.vapor_pressure_deficit());
        assert!(humid.vapor_pressure_deficit() > 0.0);
    }

    #[test]
    fn zone_overrides_shadow_the_base_climate() {
        let mut provider = IndoorEnvironment::default();
        let hot = EnvironmentalConditions::new(35.0, 40.0, 700.0, 800.0);
        provider.set_zone(ZoneId::new(2), hot);
        assert_eq!(provider.sample(ZoneId::new(2)), hot);
        assert_eq!(
            provider.sample(ZoneId::new(1)),
            EnvironmentalConditions::indoor_default()
        );
        provider.clear_zone(ZoneId::new(2));
        assert_eq!(
            provider.sample(ZoneId::new(2)),
            EnvironmentalConditions::indoor_default()
        );
    }

    #[test]
    fn default_stress_catalog_resolves_named_sources() {
        let catalog = StaticStressCatalog::with_defaults();
        let heat = catalog.source("Heat").expect("heat source");
        assert_eq!(heat.category, StressCategory::Heat);
        assert!(catalog.source("Meteor").is_none());
    }
}
