//! Buy/sell timing optimizers for a fixed-capacity, fixed-power energy store.
//!
//! All optimizers are pure functions over an already-parsed [`PriceSeries`]
//! and [`BatteryConfig`]. Every "best so far" update uses a strict `>`, so on
//! equal profit the candidate found first in scan order wins.
//!
//! The window searches are brute force (cubic and quartic in series length).
//! Sliding-window price sums would be the way to speed them up for series much
//! longer than a day.
//!
//! [`PriceSeries`]: ess_core::PriceSeries
//! [`BatteryConfig`]: ess_core::BatteryConfig

pub mod dispatch;
pub mod interval;
pub mod one_cycle;
pub mod simulate;
pub mod two_cycles;

pub use dispatch::run;
pub use interval::{select_strategy, IntervalStrategy};
pub use simulate::{check_preconditions, simulate_cycle};
