use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::window::TradeWindow;

/// Single-tick recommendation.
///
/// Buy and sell are not necessarily chronological: when the store starts full
/// the sell tick comes first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub buy_index: usize,
    pub sell_index: usize,
    pub buy_ts: i64,
    pub sell_ts: i64,
    /// Price spread `sell - buy`.
    pub profit: f64,
}

impl TransactionResult {
    #[inline]
    pub fn sells_first(&self) -> bool {
        self.sell_index < self.buy_index
    }
}

/// One buy window and one sell window of equal width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub buy: TradeWindow,
    pub sell: TradeWindow,
    /// Money earned over both legs at rated power.
    pub profit: f64,
}

impl Cycle {
    #[inline]
    pub fn width(&self) -> usize {
        self.buy.tick_count()
    }

    /// Profit of an optional cycle; "no trade" earns zero.
    #[inline]
    pub fn profit_of(cycle: Option<&Cycle>) -> f64 {
        cycle.map_or(0.0, |c| c.profit)
    }
}

/// Two independently optimized cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CyclePair {
    pub first: Option<Cycle>,
    pub second: Option<Cycle>,
    /// Index of the first tick belonging to the second sub-series.
    pub split: Option<usize>,
}

impl CyclePair {
    pub fn total_profit(&self) -> f64 {
        Cycle::profit_of(self.first.as_ref()) + Cycle::profit_of(self.second.as_ref())
    }
}

/// Output of any optimizer. `None` inside a variant means no profitable
/// feasible trade exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "result", rename_all = "camelCase")]
pub enum TradePlan {
    Interval(Option<TransactionResult>),
    OneCycle(Option<Cycle>),
    TwoCycles(CyclePair),
}

impl TradePlan {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            TradePlan::Interval(_) => Algorithm::Interval,
            TradePlan::OneCycle(_) => Algorithm::OneCycle,
            TradePlan::TwoCycles(_) => Algorithm::TwoCycles,
        }
    }

    pub fn profit(&self) -> f64 {
        match self {
            TradePlan::Interval(t) => t.map_or(0.0, |t| t.profit),
            TradePlan::OneCycle(c) => Cycle::profit_of(c.as_ref()),
            TradePlan::TwoCycles(pair) => pair.total_profit(),
        }
    }

    /// The only cycle of a one-cycle plan, or the first of two. Interval
    /// plans have no windows and return `None`.
    pub fn first(&self) -> Option<&Cycle> {
        match self {
            TradePlan::Interval(_) => None,
            TradePlan::OneCycle(c) => c.as_ref(),
            TradePlan::TwoCycles(pair) => pair.first.as_ref(),
        }
    }

    /// Second cycle; only two-cycle plans have one.
    pub fn second(&self) -> Option<&Cycle> {
        match self {
            TradePlan::TwoCycles(pair) => pair.second.as_ref(),
            _ => None,
        }
    }

    pub fn is_trade(&self) -> bool {
        match self {
            TradePlan::Interval(t) => t.is_some(),
            TradePlan::OneCycle(c) => c.is_some(),
            TradePlan::TwoCycles(pair) => pair.first.is_some() || pair.second.is_some(),
        }
    }
}
