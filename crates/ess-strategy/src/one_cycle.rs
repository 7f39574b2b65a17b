//! One trading cycle: a buy window and a sell window of `interval_width` ticks.
//!
//! Brute force over every ordered pair of window starts, each checked by a
//! full-series feasibility replay. Either order is a candidate; the replay is
//! what rules out selling energy the store does not yet hold. Cost is
//! O(windows² · n), fine for a day of 15-minute ticks.

use tracing::debug;

use ess_core::error::Result;
use ess_core::window::window_count;
use ess_core::{BatteryConfig, Cycle, PriceSeries, TradeWindow};

use crate::simulate::{check_preconditions, simulate_cycle};

/// Fewest ticks that fit two disjoint windows of `width`.
#[inline]
pub fn min_ticks(width: usize) -> usize {
    2 * width
}

/// A feasible window pair, indices relative to the searched slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub buy_start: usize,
    pub sell_start: usize,
    pub profit: f64,
}

impl Candidate {
    /// Resolve into a [`Cycle`] on `series`, shifting indices by `offset`.
    pub fn into_cycle(self, series: &PriceSeries, width: usize, offset: usize) -> Cycle {
        Cycle {
            buy: TradeWindow::from_series(series, offset + self.buy_start, width),
            sell: TradeWindow::from_series(series, offset + self.sell_start, width),
            profit: self.profit,
        }
    }
}

/// Keep `current` unless `challenger` is strictly more profitable.
///
/// Associative and left-biased, so folding candidates in scan order (or
/// reducing them in order on a thread pool) keeps the earliest best.
pub fn keep_best(current: Option<Candidate>, challenger: Option<Candidate>) -> Option<Candidate> {
    match (current, challenger) {
        (Some(a), Some(b)) if b.profit > a.profit => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

/// Best strictly profitable feasible pair with the buy window at `buy_start`,
/// scanning sell starts in ascending order.
pub fn search_row(prices: &[f64], battery: &BatteryConfig, buy_start: usize) -> Option<Candidate> {
    let width = battery.interval_width;
    let mut best: Option<Candidate> = None;
    let mut best_profit = 0.0;

    for sell_start in 0..window_count(prices.len(), width) {
        // Also excludes sell_start == buy_start
        if sell_start.abs_diff(buy_start) < width {
            continue;
        }
        if let Some(profit) = simulate_cycle(prices, battery, buy_start, sell_start) {
            if profit > best_profit {
                best_profit = profit;
                best = Some(Candidate { buy_start, sell_start, profit });
            }
        }
    }

    best
}

/// Best strictly profitable feasible pair over all of `prices`.
///
/// Scan order is ascending buy start, then ascending sell start. No
/// precondition checks; see [`optimize`].
pub fn search(prices: &[f64], battery: &BatteryConfig) -> Option<Candidate> {
    (0..window_count(prices.len(), battery.interval_width))
        .map(|buy_start| search_row(prices, battery, buy_start))
        .fold(None, keep_best)
}

/// Most profitable single cycle over the whole series.
///
/// `Ok(None)` means doing nothing is the best feasible plan.
pub fn optimize(series: &PriceSeries, battery: &BatteryConfig) -> Result<Option<Cycle>> {
    let width = battery.interval_width;
    check_preconditions(series, battery, min_ticks(width))?;

    let best = search(series.prices(), battery);
    debug!(
        ticks = series.len(),
        width,
        windows = window_count(series.len(), width),
        profit = best.map_or(0.0, |c| c.profit),
        "one-cycle search"
    );

    Ok(best.map(|c| c.into_cycle(series, width, 0)))
}
