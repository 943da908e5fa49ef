//! Core engine for the cultivar grow simulation.
//!
//! The crate models many independent plants whose observable traits emerge
//! from a fixed genotype interacting with a time-varying environment. The
//! pieces compose bottom-up: [`fitness`] scores how well current conditions
//! suit a species, [`stress`] accumulates and recovers damage from adverse
//! conditions, [`adaptation`] smooths noisy fitness into a slow-moving
//! baseline, [`expression`] turns genotype plus environment into expressed
//! trait multipliers, and [`world`] drives the whole thing tick by tick over
//! an arena of plant records.

use slotmap::{SecondaryMap, new_key_type};

pub mod adaptation;
pub mod config;
pub mod environment;
pub mod expression;
pub mod fitness;
pub mod genetics;
pub mod harvest;
pub mod stress;
pub mod world;

pub use config::CultivationConfig;
pub use environment::{
    EnvironmentProvider, EnvironmentalConditions, IndoorEnvironment, SpeciesCatalog, SpeciesId,
    SpeciesProfile, StaticSpeciesCatalog, StaticStressCatalog, StressSourceCatalog, ToleranceBand,
    ZoneId,
};
pub use expression::{ExpressionStats, TraitExpressionEngine, TraitExpressionResult};
pub use fitness::{FitnessBreakdown, FitnessWeights, environmental_fitness};
pub use genetics::{Allele, AllelePair, GeneLocus, Genotype};
pub use harvest::HarvestResult;
pub use stress::{
    ActiveStressor, StressCategory, StressFactor, StressLedger, StressResponse, StressSource,
};
pub use world::{
    CultivationWorld, GrowthStage, Plant, PlantSize, TickEvents, TickSummary, WorldError,
};

new_key_type! {
    /// Stable handle for plants backed by a generational slot map.
    pub struct PlantId;
}

/// Convenience alias for associating side data with plants.
pub type PlantMap<T> = SecondaryMap<PlantId, T>;

/// High level simulation clock (ticks processed since boot).
#[derive(
    Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Resets the tick counter back to zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Replaces a non-finite scalar with a fallback, reporting whether the
/// substitution happened. Per-plant computation faults degrade to neutral
/// values instead of aborting the tick slice.
pub(crate) fn sanitize(value: f32, fallback: f32) -> (f32, bool) {
    if value.is_finite() {
        (value, false)
    } else {
        (fallback, true)
    }
}
