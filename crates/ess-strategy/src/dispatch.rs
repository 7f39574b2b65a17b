use ess_core::error::Result;
use ess_core::{Algorithm, BatteryConfig, PriceSeries, TradePlan};

use crate::{interval, one_cycle, two_cycles};

/// Run the sequential optimizer for `algorithm`.
pub fn run(algorithm: Algorithm, series: &PriceSeries, battery: &BatteryConfig) -> Result<TradePlan> {
    Ok(match algorithm {
        Algorithm::Interval => TradePlan::Interval(interval::optimize(series, battery)?),
        Algorithm::OneCycle => TradePlan::OneCycle(one_cycle::optimize(series, battery)?),
        Algorithm::TwoCycles => TradePlan::TwoCycles(two_cycles::optimize(series, battery)?),
    })
}
