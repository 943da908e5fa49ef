//! Static configuration for a cultivation world.

use crate::fitness::FitnessWeights;
use crate::world::WorldError;
use serde::{Deserialize, Serialize};

/// Tunables for the cultivation engine.
///
/// All values are plain data validated once at world construction; nothing
/// here is probed from the host at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultivationConfig {
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Upper bound for plant health.
    pub max_health: f32,
    /// Target wall-clock budget for one tick slice, in milliseconds.
    pub tick_budget_ms: f32,
    /// Starting slice size before the adaptive controller takes over.
    pub batch_base_size: usize,
    /// Smallest slice size the controller may shrink to.
    pub batch_floor: usize,
    /// Largest slice size on an ordinary host.
    pub batch_cap: usize,
    /// Largest slice size when `powerful_host` is set.
    pub powerful_batch_cap: usize,
    /// Opts into the larger slice cap. Replaces the hardware probe the
    /// original design used; set it from deployment configuration instead.
    pub powerful_host: bool,
    /// Slice sizes above this use the batched expression/fitness path.
    pub batched_threshold: usize,
    /// Number of recent tick costs folded into the rolling average.
    pub cost_window: usize,
    /// Expression cache freshness window, in simulation seconds.
    pub cache_window_secs: f64,
    /// Interval between full expression-cache clears, in simulation seconds.
    pub cache_clear_interval_secs: f64,
    /// Chance per completed round-robin pass to run the optimization pass.
    pub optimization_pass_chance: f64,
    /// Fixed weights combining per-factor environmental fitness scores.
    pub fitness_weights: FitnessWeights,
    /// Rate at which stressor intensities decay toward zero, per second.
    pub stress_recovery_rate: f32,
    /// Fitness below this synthesizes environmental strain.
    pub low_fitness_threshold: f32,
    /// Scale applied to `(1 - fitness)` when synthesizing strain.
    pub strain_rate_factor: f32,
    /// Fitness above this grants a health regeneration bonus.
    pub high_fitness_threshold: f32,
    /// Scale applied to `(fitness - threshold)` for the regeneration bonus.
    pub regen_rate_factor: f32,
    /// Base adaptation blend rate, per second.
    pub adaptation_rate: f32,
    /// Minimum health required to advance a growth stage.
    pub advancement_min_health: f32,
    /// Enables epistatic pair modulation during trait expression.
    pub epistasis_enabled: bool,
    /// Enables multi-trait (pleiotropic) locus contributions.
    pub pleiotropy_enabled: bool,
    /// Maximum number of recent tick summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for CultivationConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            max_health: 1.0,
            tick_budget_ms: 4.0,
            batch_base_size: 20,
            batch_floor: 5,
            batch_cap: 50,
            powerful_batch_cap: 100,
            powerful_host: false,
            batched_threshold: 10,
            cost_window: 16,
            cache_window_secs: 5.0,
            cache_clear_interval_secs: 60.0,
            optimization_pass_chance: 0.1,
            fitness_weights: FitnessWeights::default(),
            stress_recovery_rate: 0.05,
            low_fitness_threshold: 0.7,
            strain_rate_factor: 0.5,
            high_fitness_threshold: 0.8,
            regen_rate_factor: 0.5,
            adaptation_rate: 0.1,
            advancement_min_health: 0.3,
            epistasis_enabled: true,
            pleiotropy_enabled: true,
            history_capacity: 256,
        }
    }
}

impl CultivationConfig {
    /// Validates the configuration before a world is built around it.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.max_health <= 0.0 {
            return Err(WorldError::InvalidConfig("max_health must be positive"));
        }
        if self.tick_budget_ms <= 0.0 {
            return Err(WorldError::InvalidConfig("tick_budget_ms must be positive"));
        }
        if self.batch_floor == 0 {
            return Err(WorldError::InvalidConfig("batch_floor must be non-zero"));
        }
        if self.batch_floor > self.batch_cap {
            return Err(WorldError::InvalidConfig(
                "batch_floor cannot exceed batch_cap",
            ));
        }
        if self.batch_cap > self.powerful_batch_cap {
            return Err(WorldError::InvalidConfig(
                "batch_cap cannot exceed powerful_batch_cap",
            ));
        }
        if self.batch_base_size < self.batch_floor || self.batch_base_size > self.powerful_batch_cap
        {
            return Err(WorldError::InvalidConfig(
                "batch_base_size must lie between batch_floor and powerful_batch_cap",
            ));
        }
        if self.cost_window == 0 {
            return Err(WorldError::InvalidConfig("cost_window must be non-zero"));
        }
        if self.cache_window_secs <= 0.0 || self.cache_clear_interval_secs <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "cache windows must be positive durations",
            ));
        }
        if !(0.0..=1.0).contains(&self.optimization_pass_chance) {
            return Err(WorldError::InvalidConfig(
                "optimization_pass_chance must be within [0, 1]",
            ));
        }
        self.fitness_weights.validate()?;
        if self.stress_recovery_rate < 0.0
            || self.strain_rate_factor < 0.0
            || self.regen_rate_factor < 0.0
            || self.adaptation_rate < 0.0
        {
            return Err(WorldError::InvalidConfig(
                "stress and adaptation rates must be non-negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.low_fitness_threshold)
            || !(0.0..=1.0).contains(&self.high_fitness_threshold)
            || self.low_fitness_threshold > self.high_fitness_threshold
        {
            return Err(WorldError::InvalidConfig(
                "fitness thresholds must be ordered within [0, 1]",
            ));
        }
        if self.advancement_min_health < 0.0 || self.advancement_min_health > self.max_health {
            return Err(WorldError::InvalidConfig(
                "advancement_min_health must lie within [0, max_health]",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        CultivationConfig::default().validate().expect("default");
    }

    #[test]
    fn rejects_inverted_batch_bounds() {
        let config = CultivationConfig {
            batch_floor: 60,
            ..CultivationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unordered_fitness_thresholds() {
        let config = CultivationConfig {
            low_fitness_threshold: 0.9,
            high_fitness_threshold: 0.8,
            ..CultivationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_skewed_weights() {
        let mut config = CultivationConfig::default();
        config.fitness_weights.temperature = 0.9;
        assert!(config.validate().is_err());
    }
}
