use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ess_core::{Algorithm, BatteryConfig, Cycle, OptimizeError, PriceSeries, TradePlan, TradeWindow};
use ess_engine::{ExecutionMode, ParallelSearch, PlanValidator, Planner};
use ess_strategy::{one_cycle, two_cycles};

const START_TS: i64 = 1726617600; // 2024-09-18T00:00:00Z

fn random_series(rng: &mut StdRng, n: usize) -> PriceSeries {
    let prices: Vec<f64> = (0..n).map(|_| rng.gen_range(10.0..90.0)).collect();
    PriceSeries::from_prices(START_TS, 900, &prices).unwrap()
}

fn random_battery(rng: &mut StdRng, width: usize) -> BatteryConfig {
    let capacity = rng.gen_range(1.5..12.0);
    let initial = rng.gen_range(0.0..=capacity);
    BatteryConfig::new(initial, capacity, 6.0, width)
}

/// Exhaustive search that only uses the validator's replay.
fn oracle_best_profit(series: &PriceSeries, battery: &BatteryConfig) -> f64 {
    let width = battery.interval_width;
    let validator = PlanValidator::new(*battery);
    let starts = series.len() - width + 1;
    let mut best = 0.0;
    for i in 0..starts {
        for j in 0..starts {
            if i.abs_diff(j) < width {
                continue;
            }
            let cycle = Cycle {
                buy: TradeWindow::from_series(series, i, width),
                sell: TradeWindow::from_series(series, j, width),
                profit: 0.0,
            };
            let report = validator.validate(series, &TradePlan::OneCycle(Some(cycle)));
            let leg = &report.legs[0];
            if leg.within_bounds && leg.recomputed_profit > best {
                best = leg.recomputed_profit;
            }
        }
    }
    best
}

#[test]
fn test_one_cycle_replays_exactly_and_stays_in_bounds() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..40 {
        let width = rng.gen_range(1..=3);
        let n = rng.gen_range(2 * width..=16);
        let series = random_series(&mut rng, n);
        let battery = random_battery(&mut rng, width);

        let planner = Planner::new(battery, ExecutionMode::Sequential);
        let (plan, report) = planner.plan_and_validate(&series, Algorithm::OneCycle).unwrap();

        assert!(report.is_valid(), "invalid plan {:?}: {:?}", plan, report);
        if let TradePlan::OneCycle(Some(cycle)) = plan {
            assert_eq!(cycle.width(), width);
            assert!(!cycle.buy.overlaps(&cycle.sell));
            assert!(cycle.profit > 0.0);
        }
    }
}

#[test]
fn test_one_cycle_matches_exhaustive_oracle() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..25 {
        let width = rng.gen_range(1..=2);
        let n = rng.gen_range(2 * width..=10);
        let series = random_series(&mut rng, n);
        let battery = random_battery(&mut rng, width);

        let found = one_cycle::optimize(&series, &battery).unwrap();
        assert_eq!(
            Cycle::profit_of(found.as_ref()),
            oracle_best_profit(&series, &battery)
        );
    }
}

#[test]
fn test_two_cycles_total_is_best_over_all_splits() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..20 {
        let n = rng.gen_range(5..=12);
        let series = random_series(&mut rng, n);
        let battery = random_battery(&mut rng, 1);

        let planner = Planner::new(battery, ExecutionMode::Sequential);
        let (plan, report) = planner.plan_and_validate(&series, Algorithm::TwoCycles).unwrap();
        let pair = match plan {
            TradePlan::TwoCycles(pair) => pair,
            other => panic!("unexpected plan {:?}", other),
        };

        // Reported total equals the independently replayed legs
        assert!(report.is_valid(), "invalid plan {:?}: {:?}", pair, report);
        assert_eq!(report.recomputed_total, pair.total_profit());

        // No other split does strictly better, each side solved on its own
        for split in two_cycles::split_points(n, 1) {
            let first = one_cycle::optimize(&series.slice(0, split), &battery).unwrap();
            let second = one_cycle::optimize(&series.slice(split, n), &battery).unwrap();
            let total = Cycle::profit_of(first.as_ref()) + Cycle::profit_of(second.as_ref());
            assert!(
                pair.total_profit() >= total,
                "split {} totals {} > reported {}",
                split,
                total,
                pair.total_profit()
            );
        }
    }
}

#[test]
fn test_parallel_search_is_identical_to_sequential() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..15 {
        let width = rng.gen_range(1..=2);
        let n = rng.gen_range(4 * width + 1..=20);
        let series = random_series(&mut rng, n);
        let battery = random_battery(&mut rng, width);

        assert_eq!(
            ParallelSearch::one_cycle(&series, &battery),
            one_cycle::optimize(&series, &battery)
        );
        assert_eq!(
            ParallelSearch::two_cycles(&series, &battery),
            two_cycles::optimize(&series, &battery)
        );
    }
}

#[test]
fn test_parallel_keeps_earliest_tie_on_flat_pattern() {
    // Every buy-low/sell-high pair earns the same; the first one must win
    let prices: Vec<f64> = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { 9.0 }).collect();
    let series = PriceSeries::from_prices(START_TS, 900, &prices).unwrap();
    let battery = BatteryConfig::new(0.0, 1.5, 6.0, 1);

    let cycle = ParallelSearch::one_cycle(&series, &battery).unwrap().unwrap();
    assert_eq!((cycle.buy.start_idx, cycle.sell.start_idx), (0, 1));

    let pair = ParallelSearch::two_cycles(&series, &battery).unwrap();
    assert_eq!(pair.split, Some(2));
}

#[test]
fn test_every_algorithm_and_mode_rejects_short_input() {
    let battery = BatteryConfig::new(0.0, 24.0, 6.0, 1);
    let single = PriceSeries::from_prices(START_TS, 900, &[42.0]).unwrap();

    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let planner = Planner::new(battery, mode);
        for algorithm in Algorithm::ALL {
            assert_eq!(
                planner.plan(&PriceSeries::default(), algorithm),
                Err(OptimizeError::EmptyInput)
            );
            assert!(matches!(
                planner.plan(&single, algorithm),
                Err(OptimizeError::InsufficientLength { actual: 1, .. })
            ));
        }
    }
}

#[test]
fn test_invocations_are_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let series = random_series(&mut rng, 14);
    let battery = random_battery(&mut rng, 1);

    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let planner = Planner::new(battery, mode);
        for algorithm in Algorithm::ALL {
            assert_eq!(planner.plan(&series, algorithm), planner.plan(&series, algorithm));
        }
    }
}
