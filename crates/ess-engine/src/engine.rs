use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use ess_core::error::Result;
use ess_core::{Algorithm, BatteryConfig, PlannerConfig, PriceSeries, TradePlan};
use ess_strategy::interval;

use crate::parallel::ParallelSearch;
use crate::validator::{PlanValidator, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Runs one optimizer against a price series for a fixed battery.
///
/// The interval scan is linear and always runs sequentially; the window
/// searches go through the rayon pool in [`ExecutionMode::Parallel`].
pub struct Planner {
    battery: BatteryConfig,
    mode: ExecutionMode,
}

impl Planner {
    pub fn new(battery: BatteryConfig, mode: ExecutionMode) -> Self {
        Self { battery, mode }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        let mode = if config.search.parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        };
        Self::new(config.battery, mode)
    }

    pub fn battery(&self) -> &BatteryConfig {
        &self.battery
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run `algorithm` over `series`.
    pub fn plan(&self, series: &PriceSeries, algorithm: Algorithm) -> Result<TradePlan> {
        let start = Instant::now();

        let plan = match (algorithm, self.mode) {
            (Algorithm::Interval, _) => {
                TradePlan::Interval(interval::optimize(series, &self.battery)?)
            }
            (_, ExecutionMode::Sequential) => ess_strategy::run(algorithm, series, &self.battery)?,
            (Algorithm::OneCycle, ExecutionMode::Parallel) => {
                TradePlan::OneCycle(ParallelSearch::one_cycle(series, &self.battery)?)
            }
            (Algorithm::TwoCycles, ExecutionMode::Parallel) => {
                TradePlan::TwoCycles(ParallelSearch::two_cycles(series, &self.battery)?)
            }
        };

        info!(
            %algorithm,
            mode = ?self.mode,
            ticks = series.len(),
            width = self.battery.interval_width,
            profit = plan.profit(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "plan complete"
        );

        Ok(plan)
    }

    /// Run `algorithm` and validate the result with an independent replay.
    pub fn plan_and_validate(
        &self,
        series: &PriceSeries,
        algorithm: Algorithm,
    ) -> Result<(TradePlan, ValidationReport)> {
        let plan = self.plan(series, algorithm)?;
        let report = PlanValidator::new(self.battery).validate(series, &plan);
        Ok((plan, report))
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(BatteryConfig::default(), ExecutionMode::Sequential)
    }
}
