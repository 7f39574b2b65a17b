use rayon::prelude::*;

use ess_core::error::Result;
use ess_core::window::window_count;
use ess_core::{BatteryConfig, Cycle, CyclePair, PriceSeries};
use ess_strategy::check_preconditions;
use ess_strategy::one_cycle::{self, Candidate};
use ess_strategy::two_cycles::{self, SplitCandidate};

/// Rayon versions of the window searches.
///
/// Level 1: buy-window rows (one cycle) or split points (two cycles) via
/// `into_par_iter`.
/// Level 2: none. Each split searches its two sides sequentially so the pool
/// is not oversubscribed.
///
/// Results are reduced in scan order with the same left-biased strict `>`
/// comparison as the sequential search, so both return identical plans.
pub struct ParallelSearch;

impl ParallelSearch {
    /// Parallel counterpart of [`one_cycle::optimize`].
    pub fn one_cycle(series: &PriceSeries, battery: &BatteryConfig) -> Result<Option<Cycle>> {
        let width = battery.interval_width;
        check_preconditions(series, battery, one_cycle::min_ticks(width))?;

        Ok(Self::search_one_cycle(series.prices(), battery)
            .map(|c| c.into_cycle(series, width, 0)))
    }

    /// Parallel counterpart of [`two_cycles::optimize`].
    pub fn two_cycles(series: &PriceSeries, battery: &BatteryConfig) -> Result<CyclePair> {
        let width = battery.interval_width;
        check_preconditions(series, battery, two_cycles::min_ticks(width))?;

        Ok(Self::search_two_cycles(series.prices(), battery)
            .map(|c| c.into_pair(series, width))
            .unwrap_or_default())
    }

    fn search_one_cycle(prices: &[f64], battery: &BatteryConfig) -> Option<Candidate> {
        (0..window_count(prices.len(), battery.interval_width))
            .into_par_iter()
            .map(|buy_start| one_cycle::search_row(prices, battery, buy_start))
            .reduce(|| None, one_cycle::keep_best)
    }

    fn search_two_cycles(prices: &[f64], battery: &BatteryConfig) -> Option<SplitCandidate> {
        two_cycles::split_points(prices.len(), battery.interval_width)
            .into_par_iter()
            .map(|split| {
                let candidate = two_cycles::evaluate_split(prices, battery, split);
                // Zero-total splits never beat "no trade"
                (candidate.total() > 0.0).then_some(candidate)
            })
            .reduce(|| None, two_cycles::keep_best_split)
    }
}
