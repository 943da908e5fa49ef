//! Harvest appraisal.
//!
//! Reads the engine's outputs (final health, stage, size, expressed traits)
//! and prices them into a harvest record. All of the interesting work
//! happened upstream.

use crate::environment::SpeciesProfile;
use crate::expression::TraitExpressionResult;
use crate::world::Plant;
use crate::clamp01;
use serde::{Deserialize, Serialize};

/// Grams of bud per centimeter of canopy at yield expression 1.0.
const BUD_MASS_PER_CANOPY_CM: f32 = 1.8;
/// Cannabinoid content caps, as fractions of dry mass.
const MAX_THC_FRACTION: f32 = 0.34;
const MAX_CBD_FRACTION: f32 = 0.28;

/// Outcome of cutting a plant down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarvestResult {
    /// Dry bud mass in grams.
    pub bud_mass_grams: f32,
    /// THC fraction of dry mass.
    pub thc_fraction: f32,
    /// CBD fraction of dry mass.
    pub cbd_fraction: f32,
    /// Composite quality grade in `[0, 1]`.
    pub quality: f32,
}

/// Appraise a plant from its final state and last expressed traits.
#[must_use]
pub fn appraise(
    plant: &Plant,
    expression: &TraitExpressionResult,
    profile: Option<&SpeciesProfile>,
) -> HarvestResult {
    let stage_modifier = plant.stage.yield_modifier();
    let health_factor = plant.health.max(0.0);
    let potency_base = profile.map_or(1.0, |profile| profile.potency_modifier);

    let bud_mass_grams = (plant.size.canopy
        * BUD_MASS_PER_CANOPY_CM
        * expression.yield_expression.max(0.0)
        * stage_modifier
        * (0.5 + 0.5 * health_factor))
        .max(0.0);

    let thc_fraction =
        (MAX_THC_FRACTION * clamp01(expression.thc_expression) * potency_base).min(MAX_THC_FRACTION);
    let cbd_fraction =
        (MAX_CBD_FRACTION * clamp01(expression.cbd_expression) * potency_base).min(MAX_CBD_FRACTION);

    let quality = clamp01(
        0.5 * health_factor + 0.3 * (1.0 - plant.stress_level) + 0.2 * plant.adaptation,
    );

    HarvestResult {
        bud_mass_grams,
        thc_fraction,
        cbd_fraction,
        quality,
    }
}
