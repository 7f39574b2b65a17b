use std::ops::Range;

use serde::Serialize;

use ess_core::{BatteryConfig, Cycle, PriceSeries, TradePlan, TradeWindow, TransactionResult};

/// Replay of one trade leg pair against the price series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegCheck {
    pub label: &'static str,
    pub reported_profit: f64,
    pub recomputed_profit: f64,
    pub min_energy: f64,
    pub max_energy: f64,
    /// Energy stayed within `[0, capacity]` at every tick.
    pub within_bounds: bool,
    /// Recomputed profit equals the reported profit bit for bit.
    pub profit_matches: bool,
}

/// Result of validating a whole plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub legs: Vec<LegCheck>,
    pub reported_total: f64,
    pub recomputed_total: f64,
    pub total_matches: bool,
}

impl ValidationReport {
    pub fn within_bounds(&self) -> bool {
        self.legs.iter().all(|l| l.within_bounds)
    }

    pub fn profit_matches(&self) -> bool {
        self.total_matches && self.legs.iter().all(|l| l.profit_matches)
    }

    pub fn is_valid(&self) -> bool {
        self.within_bounds() && self.profit_matches()
    }
}

/// Independent check of optimizer output.
///
/// Replays every cycle tick by tick over the (sub-)series it was optimized on,
/// recording the energy level throughout instead of stopping at the first
/// violation, and recomputes the profit. Shares no code with the search.
pub struct PlanValidator {
    battery: BatteryConfig,
}

struct Replay {
    profit: f64,
    min_energy: f64,
    max_energy: f64,
    within_bounds: bool,
}

impl PlanValidator {
    pub fn new(battery: BatteryConfig) -> Self {
        Self { battery }
    }

    pub fn validate(&self, series: &PriceSeries, plan: &TradePlan) -> ValidationReport {
        let prices = series.prices();
        let legs: Vec<LegCheck> = match plan {
            TradePlan::Interval(trade) => trade
                .iter()
                .map(|t| self.check_transaction(series, t))
                .collect(),
            TradePlan::OneCycle(_) => plan
                .first()
                .map(|c| self.check_cycle("cycle", prices, 0, c))
                .into_iter()
                .collect(),
            TradePlan::TwoCycles(pair) => {
                let split = pair.split.unwrap_or(prices.len()).min(prices.len());
                let (prefix, suffix) = prices.split_at(split);
                let mut legs = Vec::with_capacity(2);
                if let Some(c) = plan.first() {
                    legs.push(self.check_cycle("first", prefix, 0, c));
                }
                if let Some(c) = plan.second() {
                    legs.push(self.check_cycle("second", suffix, split, c));
                }
                legs
            }
        };

        let reported_total = plan.profit();
        let recomputed_total = match legs.as_slice() {
            [] => 0.0,
            [only] => only.recomputed_profit,
            [first, second, ..] => first.recomputed_profit + second.recomputed_profit,
        };

        ValidationReport {
            legs,
            reported_total,
            recomputed_total,
            total_matches: reported_total == recomputed_total,
        }
    }

    /// `offset` is the index of `prices[0]` in the full series. A window
    /// outside `prices` fails both checks.
    fn check_cycle(&self, label: &'static str, prices: &[f64], offset: usize, cycle: &Cycle) -> LegCheck {
        let local = |w: &TradeWindow| -> Option<Range<usize>> {
            let start = w.start_idx.checked_sub(offset)?;
            let end = w.end_idx.checked_sub(offset)?;
            (start <= end && end <= prices.len()).then_some(start..end)
        };
        let (Some(buy), Some(sell)) = (local(&cycle.buy), local(&cycle.sell)) else {
            return self.out_of_range(label, cycle.profit);
        };
        let replay = self.replay(prices, buy, sell);

        LegCheck {
            label,
            reported_profit: cycle.profit,
            recomputed_profit: replay.profit,
            min_energy: replay.min_energy,
            max_energy: replay.max_energy,
            within_bounds: replay.within_bounds,
            profit_matches: replay.profit == cycle.profit,
        }
    }

    /// Single-tick trades report the price spread; the energy replay uses
    /// one tick at rated power for each side.
    fn check_transaction(&self, series: &PriceSeries, trade: &TransactionResult) -> LegCheck {
        let (Some(buy), Some(sell)) = (series.tick(trade.buy_index), series.tick(trade.sell_index)) else {
            return self.out_of_range("interval", trade.profit);
        };
        let replay = self.replay(
            series.prices(),
            trade.buy_index..trade.buy_index + 1,
            trade.sell_index..trade.sell_index + 1,
        );
        let spread = sell.price - buy.price;

        LegCheck {
            label: "interval",
            reported_profit: trade.profit,
            recomputed_profit: spread,
            min_energy: replay.min_energy,
            max_energy: replay.max_energy,
            within_bounds: replay.within_bounds,
            profit_matches: spread == trade.profit,
        }
    }

    fn out_of_range(&self, label: &'static str, reported_profit: f64) -> LegCheck {
        let energy = self.battery.initial_energy;
        LegCheck {
            label,
            reported_profit,
            recomputed_profit: 0.0,
            min_energy: energy,
            max_energy: energy,
            within_bounds: false,
            profit_matches: false,
        }
    }

    fn replay(&self, prices: &[f64], buy: Range<usize>, sell: Range<usize>) -> Replay {
        let power = self.battery.interval_power();
        let capacity = self.battery.capacity;
        let mut energy = self.battery.initial_energy;
        let mut profit = 0.0;
        let mut min_energy = energy;
        let mut max_energy = energy;

        for (k, &price) in prices.iter().enumerate() {
            if buy.contains(&k) {
                energy += power;
                profit -= price * power;
            } else if sell.contains(&k) {
                energy -= power;
                profit += price * power;
            }
            min_energy = min_energy.min(energy);
            max_energy = max_energy.max(energy);
        }

        Replay {
            profit,
            min_energy,
            max_energy,
            within_bounds: min_energy >= 0.0 && max_energy <= capacity,
        }
    }
}
