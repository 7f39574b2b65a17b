use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use ess_core::series::{format_timestamp, DEFAULT_STEP_SECONDS};
use ess_core::{
    Algorithm, ConfigError, CsvError, Cycle, OptimizeError, PlannerConfig, PriceSeries,
    TradePlan, TransactionResult, UnknownAlgorithm,
};
use ess_engine::{Planner, ValidationReport};

#[derive(Parser, Debug)]
#[command(name = "ess-plan", about = "Plan buy/sell windows for an energy store")]
struct Cli {
    /// Path to CSV price file (`timestamp,price` rows)
    #[arg(long)]
    prices: PathBuf,

    /// Path to TOML config file(s), comma-separated for merge
    #[arg(long)]
    config: Option<String>,

    /// Optimizer: interval, oneCycle or twoCycles
    #[arg(long)]
    algorithm: Option<String>,

    /// Initial stored energy (kWh)
    #[arg(long)]
    initial_energy: Option<f64>,

    /// Storage capacity (kWh)
    #[arg(long)]
    capacity: Option<f64>,

    /// Rated charge/discharge power (kW)
    #[arg(long)]
    power: Option<f64>,

    /// Window width in ticks
    #[arg(long)]
    intervals: Option<usize>,

    /// Minimum ticks between the running extremum and an accepted
    /// interval candidate
    #[arg(long)]
    cycle_offset: Option<usize>,

    /// Search windows on the rayon pool
    #[arg(long)]
    parallel: bool,

    /// Echo the price series in the report
    #[arg(long)]
    include_lines: bool,

    /// Output file path (stdout if not specified)
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("prices: {0}")]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
    #[error(transparent)]
    Algorithm(#[from] UnknownAlgorithm),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputReport {
    algorithm: Algorithm,
    first_cycle: Option<CycleView>,
    second_cycle: Option<CycleView>,
    total_profit: f64,
    validation: ValidationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines: Option<Vec<LineView>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CycleView {
    Single {
        buy: String,
        sell: String,
        profit: f64,
    },
    Windows {
        buy: Vec<String>,
        sell: Vec<String>,
        profit: f64,
    },
}

impl CycleView {
    fn from_transaction(trade: &TransactionResult) -> Self {
        CycleView::Single {
            buy: format_timestamp(trade.buy_ts),
            sell: format_timestamp(trade.sell_ts),
            profit: trade.profit,
        }
    }

    fn from_cycle(series: &PriceSeries, cycle: &Cycle) -> Self {
        let stamps = |ts: &[i64]| -> Vec<String> { ts.iter().map(|&t| format_timestamp(t)).collect() };
        CycleView::Windows {
            buy: stamps(cycle.buy.timestamps(series)),
            sell: stamps(cycle.sell.timestamps(series)),
            profit: cycle.profit,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationSummary {
    within_bounds: bool,
    profit_matches: bool,
    recomputed_total: f64,
}

#[derive(Debug, Serialize)]
struct LineView {
    timestamp: String,
    price: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let start = Instant::now();

    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(cli, &mut config)?;

    let load_start = Instant::now();
    let series = PriceSeries::from_csv(&cli.prices)?;
    info!(
        path = %cli.prices.display(),
        ticks = series.len(),
        elapsed_ms = load_start.elapsed().as_secs_f64() * 1000.0,
        "loaded prices"
    );
    if let Some(step) = irregular_step(&series) {
        warn!(step, expected = DEFAULT_STEP_SECONDS, "interval power assumes 15-minute ticks");
    }

    let planner = Planner::from_config(&config);
    let (plan, validation) = planner.plan_and_validate(&series, config.search.algorithm)?;
    if !validation.is_valid() {
        warn!(?validation, "plan failed independent replay");
    }

    let report = build_report(cli, &series, &plan, &validation);
    print_summary(&report);

    let json = serde_json::to_string_pretty(&report)?;
    match &cli.output_file {
        Some(path) => {
            std::fs::write(path, &json).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "results written");
        }
        None => println!("{}", json),
    }

    info!(elapsed_ms = start.elapsed().as_secs_f64() * 1000.0, "done");
    Ok(())
}

fn load_config(paths: Option<&str>) -> Result<PlannerConfig, ConfigError> {
    let Some(paths) = paths else {
        return Ok(PlannerConfig::default());
    };
    if !paths.contains(',') {
        return PlannerConfig::from_toml(Path::new(paths.trim()));
    }
    let config_paths: Vec<PathBuf> = paths.split(',').map(|p| PathBuf::from(p.trim())).collect();
    let config_refs: Vec<&Path> = config_paths.iter().map(|p| p.as_path()).collect();
    PlannerConfig::from_toml_files(&config_refs)
}

/// Tick spacing, when it is not the 15 minutes `interval_power` is derived for.
fn irregular_step(series: &PriceSeries) -> Option<i64> {
    series.step().filter(|&step| step != DEFAULT_STEP_SECONDS)
}

fn apply_overrides(cli: &Cli, config: &mut PlannerConfig) -> Result<(), UnknownAlgorithm> {
    if let Some(name) = &cli.algorithm {
        config.search.algorithm = name.parse()?;
    }
    if cli.parallel {
        config.search.parallel = true;
    }

    let battery = &mut config.battery;
    if let Some(v) = cli.initial_energy {
        battery.initial_energy = v;
    }
    if let Some(v) = cli.capacity {
        battery.capacity = v;
    }
    if let Some(v) = cli.power {
        battery.maximum_power = v;
    }
    if let Some(v) = cli.intervals {
        battery.interval_width = v;
    }
    if let Some(v) = cli.cycle_offset {
        battery.cycle_offset = v;
    }
    Ok(())
}

fn build_report(
    cli: &Cli,
    series: &PriceSeries,
    plan: &TradePlan,
    validation: &ValidationReport,
) -> OutputReport {
    let (first_cycle, second_cycle) = match plan {
        TradePlan::Interval(trade) => (trade.as_ref().map(CycleView::from_transaction), None),
        _ => (
            plan.first().map(|c| CycleView::from_cycle(series, c)),
            plan.second().map(|c| CycleView::from_cycle(series, c)),
        ),
    };

    let lines = cli.include_lines.then(|| {
        series
            .iter()
            .map(|tick| LineView {
                timestamp: format_timestamp(tick.timestamp),
                price: tick.price,
            })
            .collect()
    });

    OutputReport {
        algorithm: plan.algorithm(),
        first_cycle,
        second_cycle,
        total_profit: plan.profit(),
        validation: ValidationSummary {
            within_bounds: validation.within_bounds(),
            profit_matches: validation.profit_matches(),
            recomputed_total: validation.recomputed_total,
        },
        lines,
    }
}

fn print_summary(report: &OutputReport) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("Trade plan ({})", report.algorithm);
    eprintln!("{}", "-".repeat(60));
    for (label, cycle) in [("first", &report.first_cycle), ("second", &report.second_cycle)] {
        match cycle {
            Some(CycleView::Single { buy, sell, profit }) => {
                eprintln!("{:<8} buy {} sell {} profit {:.4}", label, buy, sell, profit);
            }
            Some(CycleView::Windows { buy, sell, profit }) => {
                eprintln!(
                    "{:<8} buy {}..{} sell {}..{} profit {:.4}",
                    label,
                    buy.first().map(String::as_str).unwrap_or("-"),
                    buy.last().map(String::as_str).unwrap_or("-"),
                    sell.first().map(String::as_str).unwrap_or("-"),
                    sell.last().map(String::as_str).unwrap_or("-"),
                    profit
                );
            }
            None => {}
        }
    }
    eprintln!("{}", "-".repeat(60));
    eprintln!(
        "Total profit: {:.4} | replay ok: {}",
        report.total_profit,
        report.validation.within_bounds && report.validation.profit_matches
    );
    eprintln!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("ess-plan").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_config() {
        let cli = cli(&[
            "--prices", "prices.csv",
            "--algorithm", "twoCycles",
            "--capacity", "12",
            "--intervals", "2",
            "--cycle-offset", "3",
            "--parallel",
        ]);
        let mut config = PlannerConfig::default();
        apply_overrides(&cli, &mut config).unwrap();

        assert_eq!(config.search.algorithm, Algorithm::TwoCycles);
        assert!(config.search.parallel);
        assert_eq!(config.battery.capacity, 12.0);
        assert_eq!(config.battery.interval_width, 2);
        assert_eq!(config.battery.maximum_power, 6.0);
        assert_eq!(config.battery.cycle_offset, 3);
    }

    #[test]
    fn test_single_and_merged_config_files() {
        let dir = std::env::temp_dir().join(format!("ess-plan-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("base.toml");
        let overlay = dir.join("overlay.toml");
        std::fs::write(&base, "[battery]\ncapacity = 12.0\n\n[search]\nalgorithm = \"oneCycle\"\n").unwrap();
        std::fs::write(&overlay, "[battery]\ninterval_width = 2\n").unwrap();

        let single = load_config(base.to_str()).unwrap();
        assert_eq!(single.battery.capacity, 12.0);
        assert_eq!(single.search.algorithm, Algorithm::OneCycle);

        let both = format!("{},{}", base.display(), overlay.display());
        let merged = load_config(Some(&both)).unwrap();
        assert_eq!(merged.battery.capacity, 12.0);
        assert_eq!(merged.battery.interval_width, 2);

        assert!(load_config(dir.join("missing.toml").to_str()).is_err());
        assert_eq!(load_config(None).unwrap().battery.capacity, 24.0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_irregular_step() {
        let quarter = PriceSeries::from_prices(0, 900, &[1.0, 2.0]).unwrap();
        let hourly = PriceSeries::from_prices(0, 3600, &[1.0, 2.0]).unwrap();
        assert_eq!(irregular_step(&quarter), None);
        assert_eq!(irregular_step(&hourly), Some(3600));
        assert_eq!(irregular_step(&PriceSeries::default()), None);
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let cli = cli(&["--prices", "prices.csv", "--algorithm", "threeCycles"]);
        let mut config = PlannerConfig::default();
        assert!(apply_overrides(&cli, &mut config).is_err());
    }

    #[test]
    fn test_report_json_shape() {
        let series = PriceSeries::from_prices(1726617600, 900, &[1.0, 5.0, 2.0, 8.0]).unwrap();
        let planner = Planner::new(
            ess_core::BatteryConfig::new(0.0, 1.5, 6.0, 1),
            ess_engine::ExecutionMode::Sequential,
        );
        let (plan, validation) = planner.plan_and_validate(&series, Algorithm::OneCycle).unwrap();
        let report = build_report(&cli(&["--prices", "p.csv"]), &series, &plan, &validation);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["algorithm"], "oneCycle");
        assert_eq!(json["firstCycle"]["buy"][0], "2024-09-18T00:00:00Z");
        assert_eq!(json["firstCycle"]["sell"][0], "2024-09-18T00:45:00Z");
        assert_eq!(json["totalProfit"], 10.5);
        assert!(json["secondCycle"].is_null());
        assert_eq!(json["validation"]["withinBounds"], true);
        assert!(json.get("lines").is_none());
    }

    #[test]
    fn test_interval_report_uses_single_timestamps() {
        let series = PriceSeries::from_prices(1726617600, 900, &[5.0, 1.0, 3.0, 6.0, 4.0]).unwrap();
        let planner = Planner::default();
        let (plan, validation) = planner.plan_and_validate(&series, Algorithm::Interval).unwrap();
        let report = build_report(
            &cli(&["--prices", "p.csv", "--include-lines"]),
            &series,
            &plan,
            &validation,
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["firstCycle"]["buy"], "2024-09-18T00:15:00Z");
        assert_eq!(json["firstCycle"]["sell"], "2024-09-18T00:45:00Z");
        assert_eq!(json["lines"].as_array().map(Vec::len), Some(5));
    }
}
