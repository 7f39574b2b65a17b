//! Two trading cycles on either side of a split point.
//!
//! Each side is searched with the one-cycle optimizer as if it were the whole
//! series, starting from the configured initial energy. The energy left by the
//! first cycle is deliberately not carried into the second.

use std::ops::Range;

use tracing::debug;

use ess_core::error::Result;
use ess_core::{BatteryConfig, CyclePair, PriceSeries};

use crate::one_cycle::{self, Candidate};
use crate::simulate::check_preconditions;

/// Fewest ticks that leave at least one split point.
#[inline]
pub fn min_ticks(width: usize) -> usize {
    4 * width + 1
}

/// Candidate split points `[2w, n - 2w)`, leaving room for two windows on
/// each side.
#[inline]
pub fn split_points(len: usize, width: usize) -> Range<usize> {
    2 * width..len.saturating_sub(2 * width)
}

/// Outcome of searching both sides of one split point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub split: usize,
    /// Indices relative to the prefix `[0, split)`.
    pub first: Option<Candidate>,
    /// Indices relative to the suffix `[split, n)`.
    pub second: Option<Candidate>,
}

impl SplitCandidate {
    pub fn total(&self) -> f64 {
        self.first.map_or(0.0, |c| c.profit) + self.second.map_or(0.0, |c| c.profit)
    }

    /// Resolve into a [`CyclePair`] with indices into the full `series`.
    pub fn into_pair(self, series: &PriceSeries, width: usize) -> CyclePair {
        CyclePair {
            first: self.first.map(|c| c.into_cycle(series, width, 0)),
            second: self.second.map(|c| c.into_cycle(series, width, self.split)),
            split: Some(self.split),
        }
    }
}

/// Search both sides of `split` independently.
pub fn evaluate_split(prices: &[f64], battery: &BatteryConfig, split: usize) -> SplitCandidate {
    let (prefix, suffix) = prices.split_at(split);
    SplitCandidate {
        split,
        first: one_cycle::search(prefix, battery),
        second: one_cycle::search(suffix, battery),
    }
}

/// Keep `current` unless `challenger` has a strictly greater total.
pub fn keep_best_split(
    current: Option<SplitCandidate>,
    challenger: Option<SplitCandidate>,
) -> Option<SplitCandidate> {
    match (current, challenger) {
        (Some(a), Some(b)) if b.total() > a.total() => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

/// Best split with a strictly positive total, scanning splits in ascending
/// order. No precondition checks; see [`optimize`].
pub fn search(prices: &[f64], battery: &BatteryConfig) -> Option<SplitCandidate> {
    let mut best: Option<SplitCandidate> = None;
    let mut best_total = 0.0;

    for split in split_points(prices.len(), battery.interval_width) {
        let candidate = evaluate_split(prices, battery, split);
        let total = candidate.total();
        if total > best_total {
            best_total = total;
            best = Some(candidate);
        }
    }

    best
}

/// Most profitable pair of independent cycles.
///
/// If no split earns anything both cycles are `None` and so is `split`.
pub fn optimize(series: &PriceSeries, battery: &BatteryConfig) -> Result<CyclePair> {
    let width = battery.interval_width;
    check_preconditions(series, battery, min_ticks(width))?;

    let best = search(series.prices(), battery);
    debug!(
        ticks = series.len(),
        width,
        splits = split_points(series.len(), width).len(),
        split = ?best.map(|c| c.split),
        total = best.map_or(0.0, |c| c.total()),
        "two-cycle search"
    );

    Ok(best.map(|c| c.into_pair(series, width)).unwrap_or_default())
}
