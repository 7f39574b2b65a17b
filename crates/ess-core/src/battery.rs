use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;

/// Price ticks per hour. Prices are quoted on 15-minute steps.
pub const TICKS_PER_HOUR: f64 = 4.0;

/// Physical and trading parameters of the energy store.
///
/// Energy is in the same unit as `capacity` (e.g. MWh), power in that unit per
/// hour. One tick at rated power moves `maximum_power / 4` units of energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    #[serde(default)]
    pub initial_energy: f64,
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default = "default_maximum_power")]
    pub maximum_power: f64,
    /// Ticks per charge or discharge leg.
    #[serde(default = "default_interval_width")]
    pub interval_width: usize,
    /// Minimum index distance from the running extremum before a single-tick
    /// candidate is considered. Zero disables it.
    #[serde(default)]
    pub cycle_offset: usize,
}

impl BatteryConfig {
    pub fn new(initial_energy: f64, capacity: f64, maximum_power: f64, interval_width: usize) -> Self {
        Self {
            initial_energy,
            capacity,
            maximum_power,
            interval_width,
            cycle_offset: 0,
        }
    }

    pub fn with_cycle_offset(mut self, cycle_offset: usize) -> Self {
        self.cycle_offset = cycle_offset;
        self
    }

    /// Energy moved in one tick at rated power.
    #[inline]
    pub fn interval_power(&self) -> f64 {
        self.maximum_power / TICKS_PER_HOUR
    }

    /// Check the config invariants.
    ///
    /// `capacity > 0`, `maximum_power > 0`, `interval_width >= 1` and
    /// `0 <= initial_energy <= capacity`, all values finite.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(OptimizeError::InvalidConfig(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }
        if !self.maximum_power.is_finite() || self.maximum_power <= 0.0 {
            return Err(OptimizeError::InvalidConfig(format!(
                "maximum power must be positive, got {}",
                self.maximum_power
            )));
        }
        if self.interval_width < 1 {
            return Err(OptimizeError::InvalidConfig(
                "interval width must be at least 1 tick".into(),
            ));
        }
        if !(0.0..=self.capacity).contains(&self.initial_energy) {
            return Err(OptimizeError::InvalidConfig(format!(
                "initial energy {} outside [0, {}]",
                self.initial_energy, self.capacity
            )));
        }
        Ok(())
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self::new(0.0, default_capacity(), default_maximum_power(), default_interval_width())
    }
}

fn default_capacity() -> f64 { 24.0 }
fn default_maximum_power() -> f64 { 6.0 }
fn default_interval_width() -> usize { 4 }
