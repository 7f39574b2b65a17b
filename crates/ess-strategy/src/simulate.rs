use ess_core::error::{OptimizeError, Result};
use ess_core::{BatteryConfig, PriceSeries};

/// Replay one buy window and one sell window over every tick of `prices`.
///
/// Energy starts at `initial_energy`. A buy-window tick charges one
/// `interval_power` and pays `price * interval_power`; a sell-window tick
/// discharges and earns the same. Returns the profit, or `None` as soon as a
/// tick would push energy above capacity or below zero.
///
/// The windows must not overlap; if they did, the buy leg would take precedence.
pub fn simulate_cycle(
    prices: &[f64],
    battery: &BatteryConfig,
    buy_start: usize,
    sell_start: usize,
) -> Option<f64> {
    let width = battery.interval_width;
    let power = battery.interval_power();
    let buy = buy_start..buy_start + width;
    let sell = sell_start..sell_start + width;

    let mut energy = battery.initial_energy;
    let mut profit = 0.0;

    for (k, &price) in prices.iter().enumerate() {
        if buy.contains(&k) {
            if energy + power > battery.capacity {
                return None;
            }
            energy += power;
            profit -= price * power;
        } else if sell.contains(&k) {
            if energy - power < 0.0 {
                return None;
            }
            energy -= power;
            profit += price * power;
        }
    }

    Some(profit)
}

/// Shared input checks: config, then emptiness, then minimum length.
pub fn check_preconditions(
    series: &PriceSeries,
    battery: &BatteryConfig,
    required: usize,
) -> Result<()> {
    battery.validate()?;
    if series.is_empty() {
        return Err(OptimizeError::EmptyInput);
    }
    if series.len() < required {
        return Err(OptimizeError::InsufficientLength {
            required,
            actual: series.len(),
        });
    }
    Ok(())
}
