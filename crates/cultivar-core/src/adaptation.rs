//! Adaptation progress: a slow-moving baseline that trails instantaneous
//! environmental fitness.
//!
//! Long-lived decisions (automation heuristics, achievement checks) read
//! this instead of raw fitness so a single bad sample does not whipsaw
//! them. The blend is asymmetric: plants acclimate to an improving
//! environment faster than they lose ground in a declining one.

use crate::clamp01;

/// Fraction of the base rate used when fitness is below the baseline.
const DECLINE_RATE_FACTOR: f32 = 0.5;

/// Advance adaptation progress one step toward current fitness.
///
/// `rate` is the full per-second blend speed toward improvement; decline
/// moves at half that. The result is clamped to `[0, 1]`.
#[must_use]
pub fn advance(current: f32, fitness: f32, rate: f32, dt: f32) -> f32 {
    let gap = fitness - current;
    let speed = if gap >= 0.0 {
        rate
    } else {
        rate * DECLINE_RATE_FACTOR
    };
    let step = gap * (speed * dt).min(1.0);
    clamp01(current + step)
}
