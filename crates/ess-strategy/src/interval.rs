use serde::Serialize;
use tracing::debug;

use ess_core::error::Result;
use ess_core::{BatteryConfig, PriceSeries, TransactionResult};

use crate::simulate::check_preconditions;

/// Fewest ticks a single-tick trade can use.
pub const MIN_TICKS: usize = 2;

/// Scan used by the single-interval optimizer, chosen from the store's
/// starting charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalStrategy {
    /// Too little energy to sell: charge at the running minimum, sell later.
    BuyFirst,
    /// Too little headroom to charge: sell at the running maximum, buy later.
    SellFirst,
    /// Slack both ways: buy at the global minimum, sell at the global maximum.
    MinMax,
}

/// Pick the scan for the store's starting charge.
///
/// Thresholds are one tick's energy away from empty and from full, so a store
/// that cannot complete a full tick of discharge (or charge) is treated as
/// empty (or full).
pub fn select_strategy(battery: &BatteryConfig) -> IntervalStrategy {
    let power = battery.interval_power();
    if battery.initial_energy < power {
        IntervalStrategy::BuyFirst
    } else if battery.initial_energy > battery.capacity - power {
        IntervalStrategy::SellFirst
    } else {
        IntervalStrategy::MinMax
    }
}

/// Index pair found by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanPick {
    pub buy: usize,
    pub sell: usize,
    pub profit: f64,
}

/// Best `price[sell] - price[buy]` with `buy < sell`.
///
/// Only strict improvements replace the best pick, so ties keep the earliest
/// pair. `None` if no pair earns more than zero.
pub fn buy_first(prices: &[f64], cycle_offset: usize) -> Option<ScanPick> {
    let (&first, rest) = prices.split_first()?;
    let mut min_price = first;
    let mut min_idx = 0;
    let mut best: Option<ScanPick> = None;
    let mut best_profit = 0.0;

    for (i, &price) in rest.iter().enumerate().map(|(i, p)| (i + 1, p)) {
        if price < min_price {
            min_price = price;
            min_idx = i;
        } else if i - min_idx >= cycle_offset {
            let profit = price - min_price;
            if profit > best_profit {
                best_profit = profit;
                best = Some(ScanPick { buy: min_idx, sell: i, profit });
            }
        }
    }

    best
}

/// Best `price[sell] - price[buy]` with `sell < buy`. Mirror of [`buy_first`].
pub fn sell_first(prices: &[f64], cycle_offset: usize) -> Option<ScanPick> {
    let (&first, rest) = prices.split_first()?;
    let mut max_price = first;
    let mut max_idx = 0;
    let mut best: Option<ScanPick> = None;
    let mut best_profit = 0.0;

    for (i, &price) in rest.iter().enumerate().map(|(i, p)| (i + 1, p)) {
        if price > max_price {
            max_price = price;
            max_idx = i;
        } else if i - max_idx >= cycle_offset {
            let profit = max_price - price;
            if profit > best_profit {
                best_profit = profit;
                best = Some(ScanPick { buy: i, sell: max_idx, profit });
            }
        }
    }

    best
}

/// Earliest global minimum and earliest global maximum, in either order.
///
/// With a non-zero `cycle_offset` an extremum is only accepted that many
/// ticks after the opposite one. A side that is never accepted stays at
/// tick 0, so a pick is always returned for a non-empty series and its
/// profit can be negative.
pub fn min_max(prices: &[f64], cycle_offset: usize) -> Option<ScanPick> {
    if prices.is_empty() {
        return None;
    }
    let mut max: Option<f64> = None;
    let mut min: Option<f64> = None;
    let mut max_idx = 0;
    let mut min_idx = 0;

    for (i, &price) in prices.iter().enumerate() {
        if max.map_or(true, |m| price > m) && i - min_idx >= cycle_offset {
            max = Some(price);
            max_idx = i;
        }
        if min.map_or(true, |m| price < m) && i - max_idx >= cycle_offset {
            min = Some(price);
            min_idx = i;
        }
    }

    Some(ScanPick {
        buy: min_idx,
        sell: max_idx,
        profit: prices[max_idx] - prices[min_idx],
    })
}

/// Run the scan `strategy` names.
pub fn scan(strategy: IntervalStrategy, prices: &[f64], cycle_offset: usize) -> Option<ScanPick> {
    match strategy {
        IntervalStrategy::BuyFirst => buy_first(prices, cycle_offset),
        IntervalStrategy::SellFirst => sell_first(prices, cycle_offset),
        IntervalStrategy::MinMax => min_max(prices, cycle_offset),
    }
}

/// Best single buy tick and single sell tick for the store's starting charge.
///
/// `Ok(None)` means no profitable trade exists in the required order.
pub fn optimize(series: &PriceSeries, battery: &BatteryConfig) -> Result<Option<TransactionResult>> {
    check_preconditions(series, battery, MIN_TICKS)?;

    let strategy = select_strategy(battery);
    let pick = scan(strategy, series.prices(), battery.cycle_offset);
    debug!(?strategy, ticks = series.len(), found = pick.is_some(), "interval scan");

    let timestamps = series.timestamps();
    Ok(pick.map(|p| TransactionResult {
        buy_index: p.buy,
        sell_index: p.sell,
        buy_ts: timestamps[p.buy],
        sell_ts: timestamps[p.sell],
        profit: p.profit,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ess_core::OptimizeError;

    fn series(prices: &[f64]) -> PriceSeries {
        PriceSeries::from_prices(1726617600, 900, prices).unwrap()
    }

    // interval_power = 1.5 for all of these
    fn battery(initial: f64) -> BatteryConfig {
        BatteryConfig::new(initial, 24.0, 6.0, 1)
    }

    #[test]
    fn test_select_strategy_thresholds() {
        assert_eq!(select_strategy(&battery(0.0)), IntervalStrategy::BuyFirst);
        assert_eq!(select_strategy(&battery(1.4)), IntervalStrategy::BuyFirst);
        assert_eq!(select_strategy(&battery(1.5)), IntervalStrategy::MinMax);
        assert_eq!(select_strategy(&battery(12.0)), IntervalStrategy::MinMax);
        assert_eq!(select_strategy(&battery(22.5)), IntervalStrategy::MinMax);
        assert_eq!(select_strategy(&battery(22.6)), IntervalStrategy::SellFirst);
        assert_eq!(select_strategy(&battery(24.0)), IntervalStrategy::SellFirst);
    }

    #[test]
    fn test_buy_first_case() {
        let s = series(&[5.0, 1.0, 3.0, 6.0, 4.0]);
        let result = optimize(&s, &battery(1.0)).unwrap().unwrap();
        assert_eq!(result.buy_index, 1);
        assert_eq!(result.sell_index, 3);
        assert_eq!(result.profit, 5.0);
        assert_eq!(result.buy_ts, s.timestamps()[1]);
        assert_eq!(result.sell_ts, s.timestamps()[3]);
        assert!(!result.sells_first());
    }

    #[test]
    fn test_sell_first_case() {
        let s = series(&[1.0, 6.0, 3.0, 4.0, 1.0]);
        let result = optimize(&s, &battery(23.0)).unwrap().unwrap();
        assert_eq!(result.sell_index, 1);
        assert_eq!(result.buy_index, 4);
        assert_eq!(result.profit, 5.0);
        assert!(result.sells_first());
    }

    #[test]
    fn test_min_max_case() {
        let s = series(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        let result = optimize(&s, &battery(12.0)).unwrap().unwrap();
        assert_eq!(result.buy_index, 1);
        assert_eq!(result.sell_index, 5);
        assert_eq!(result.profit, 8.0);
    }

    #[test]
    fn test_min_max_ignores_chronology() {
        let pick = min_max(&[9.0, 4.0, 1.0], 0).unwrap();
        assert_eq!(pick, ScanPick { buy: 2, sell: 0, profit: 8.0 });
    }

    #[test]
    fn test_ties_keep_earliest_pair() {
        // 1->4 and 1->4 again later
        let pick = buy_first(&[1.0, 4.0, 2.0, 1.0, 4.0], 0).unwrap();
        assert_eq!((pick.buy, pick.sell), (0, 1));

        let pick = sell_first(&[4.0, 1.0, 3.0, 4.0, 1.0], 0).unwrap();
        assert_eq!((pick.sell, pick.buy), (0, 1));
    }

    #[test]
    fn test_monotone_prices_have_no_trade() {
        let falling = series(&[5.0, 4.0, 3.0, 2.0]);
        assert_eq!(optimize(&falling, &battery(0.0)).unwrap(), None);

        let rising = series(&[1.0, 2.0, 3.0]);
        assert_eq!(optimize(&rising, &battery(24.0)).unwrap(), None);
    }

    #[test]
    fn test_cycle_offset_skips_close_candidates() {
        let prices = [1.0, 5.0, 2.0, 4.0];
        assert_eq!(buy_first(&prices, 0).map(|p| (p.buy, p.sell)), Some((0, 1)));
        // sell must be at least 2 ticks after the running minimum
        assert_eq!(buy_first(&prices, 2).map(|p| (p.buy, p.sell)), Some((0, 3)));
        assert_eq!(buy_first(&prices, 4), None);
    }

    #[test]
    fn test_sell_first_cycle_offset() {
        let prices = [5.0, 1.0, 4.0, 2.0];
        assert_eq!(sell_first(&prices, 0).map(|p| (p.sell, p.buy)), Some((0, 1)));
        // buy must be at least 2 ticks after the running maximum
        assert_eq!(sell_first(&prices, 2).map(|p| (p.sell, p.buy)), Some((0, 3)));
        assert_eq!(sell_first(&prices, 4), None);
    }

    #[test]
    fn test_min_max_cycle_offset() {
        // Each extremum must sit 2 ticks after the other one's current index
        let pick = min_max(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0], 2).unwrap();
        assert_eq!(pick, ScanPick { buy: 7, sell: 5, profit: 3.0 });

        // The minimum is never accepted and stays at the first tick
        let pick = min_max(&[5.0, 1.0, 9.0], 1).unwrap();
        assert_eq!(pick, ScanPick { buy: 0, sell: 2, profit: 4.0 });

        assert_eq!(min_max(&[], 0), None);
    }

    #[test]
    fn test_short_inputs_fail() {
        assert_eq!(
            optimize(&PriceSeries::default(), &battery(0.0)),
            Err(OptimizeError::EmptyInput)
        );
        assert_eq!(
            optimize(&series(&[1.0]), &battery(0.0)),
            Err(OptimizeError::InsufficientLength { required: 2, actual: 1 })
        );
    }

    #[test]
    fn test_idempotent() {
        let s = series(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        let b = battery(12.0);
        assert_eq!(optimize(&s, &b), optimize(&s, &b));
    }
}
