use serde::{Deserialize, Serialize};

use crate::series::PriceSeries;

/// A run of consecutive ticks used as one charge or discharge leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeWindow {
    /// Index of the first tick in this window (inclusive).
    pub start_idx: usize,
    /// Index past the last tick in this window (exclusive).
    pub end_idx: usize,
    /// Timestamp of the first tick.
    pub start_ts: i64,
    /// Timestamp of the last tick.
    pub end_ts: i64,
}

impl TradeWindow {
    /// Window of `width` ticks starting at `start` in `series`.
    ///
    /// Panics if the window is empty or does not fit in the series.
    pub fn from_series(series: &PriceSeries, start: usize, width: usize) -> Self {
        let end = start + width;
        debug_assert!(
            width >= 1 && end <= series.len(),
            "window {start}..{end} outside series of {} ticks",
            series.len()
        );
        let timestamps = &series.timestamps()[start..end];
        Self {
            start_idx: start,
            end_idx: end,
            start_ts: timestamps[0],
            end_ts: timestamps[width - 1],
        }
    }

    #[inline]
    pub fn tick_count(&self) -> usize {
        self.end_idx - self.start_idx
    }

    /// Whether two windows share at least one tick.
    #[inline]
    pub fn overlaps(&self, other: &TradeWindow) -> bool {
        self.start_idx < other.end_idx && other.start_idx < self.end_idx
    }

    /// Timestamps of every tick in the window.
    pub fn timestamps<'a>(&self, series: &'a PriceSeries) -> &'a [i64] {
        &series.timestamps()[self.start_idx..self.end_idx]
    }
}

/// Number of valid start positions for a `width`-tick window over `len` ticks.
#[inline]
pub fn window_count(len: usize, width: usize) -> usize {
    if width == 0 || width > len {
        0
    } else {
        len - width + 1
    }
}
