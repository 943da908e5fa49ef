//! Environmental fitness scoring.
//!
//! Pure functions from (species profile, conditions) to per-factor scores
//! and a fixed-weight combination. Inside the tolerance band a score decays
//! linearly from the optimal point; outside it a steeper floored penalty
//! applies so fitness degrades gracefully instead of cliffing to zero.

use crate::clamp01;
use crate::environment::{EnvironmentalConditions, SpeciesProfile, ToleranceBand};
use crate::world::WorldError;
use serde::{Deserialize, Serialize};

/// Fitness lost between the optimal point and the band edge.
const IN_BAND_LOSS: f32 = 0.3;
/// Additional loss per band-width of out-of-range distance.
const OUT_OF_BAND_SLOPE: f32 = 1.0;

/// Per-factor floors. Out-of-range readings never push a factor below
/// these, so a single bad sensor cannot zero a plant's combined fitness.
const TEMPERATURE_FLOOR: f32 = 0.10;
const HUMIDITY_FLOOR: f32 = 0.20;
const LIGHT_FLOOR: f32 = 0.15;
const CO2_FLOOR: f32 = 0.30;

/// Weights combining the four factor scores. Tunable constants, not derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub temperature: f32,
    pub humidity: f32,
    pub light: f32,
    pub co2: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            temperature: 0.30,
            humidity: 0.25,
            light: 0.27,
            co2: 0.18,
        }
    }
}

impl FitnessWeights {
    /// Weights must be non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.temperature < 0.0 || self.humidity < 0.0 || self.light < 0.0 || self.co2 < 0.0 {
            return Err(WorldError::InvalidConfig(
                "fitness weights must be non-negative",
            ));
        }
        let sum = self.temperature + self.humidity + self.light + self.co2;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(WorldError::InvalidConfig("fitness weights must sum to 1"));
        }
        Ok(())
    }
}

/// Per-factor scores plus the weighted combination, all in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub temperature: f32,
    pub humidity: f32,
    pub light: f32,
    pub co2: f32,
    pub combined: f32,
}

impl FitnessBreakdown {
    /// Breakdown reporting no penalty on any factor. Used when a species
    /// profile is missing: no data means no penalty.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            temperature: 1.0,
            humidity: 1.0,
            light: 1.0,
            co2: 1.0,
            combined: 1.0,
        }
    }
}

/// Score one reading against one tolerance band.
fn band_score(band: &ToleranceBand, reading: f32, floor: f32) -> f32 {
    if !reading.is_finite() {
        return floor;
    }
    if band.contains(reading) {
        let side = if reading < band.optimal {
            band.optimal - band.min
        } else {
            band.max - band.optimal
        };
        if side <= f32::EPSILON {
            return 1.0;
        }
        let distance = (reading - band.optimal).abs();
        clamp01(1.0 - IN_BAND_LOSS * (distance / side))
    } else {
        let out_distance = if reading < band.min {
            band.min - reading
        } else {
            reading - band.max
        };
        let edge = 1.0 - IN_BAND_LOSS;
        clamp01((edge - OUT_OF_BAND_SLOPE * out_distance / band.width()).max(floor))
    }
}

/// Score current conditions against a species profile.
///
/// Deterministic and side-effect free. The caller is responsible for
/// resolving un-initialized readings to the indoor default first.
#[must_use]
pub fn environmental_fitness(
    profile: &SpeciesProfile,
    conditions: &EnvironmentalConditions,
    weights: &FitnessWeights,
) -> FitnessBreakdown {
    let temperature = band_score(&profile.temperature, conditions.temperature, TEMPERATURE_FLOOR);
    let humidity = band_score(&profile.humidity, conditions.humidity, HUMIDITY_FLOOR);
    let light = band_score(&profile.light, conditions.light_intensity, LIGHT_FLOOR);
    let co2 = band_score(&profile.co2, conditions.co2, CO2_FLOOR);
    let combined = clamp01(
        temperature * weights.temperature
            + humidity * weights.humidity
            + light * weights.light
            + co2 * weights.co2,
    );
    FitnessBreakdown {
        temperature,
        humidity,
        light,
        co2,
        combined,
    }
}
