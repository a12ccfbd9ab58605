//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::console_report::ConsoleReport;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_history_report::CsvHistoryReport;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::allocation::{self, DEFAULT_SELECTION_FRACTION};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_backtest_config, validate_strategy_config};
use crate::domain::error::SignaltraderError;
use crate::domain::indicator::combined::DEFAULT_LOOKBACK_DAYS;
use crate::domain::indicator::{Direction, IndicatorParams, Policy, StrategyKind};
use crate::domain::metrics::{periods_per_year, Metrics};
use crate::domain::price_table::PriceTable;
use crate::domain::universe::{load_universe, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// Exit status of a run that ended in ruin. The partial history is still written.
pub const EXIT_RUINED: u8 = 7;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "signaltrader", about = "Signal-ranked long/short portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy policy, overriding [strategy] policy
        #[arg(short, long)]
        policy: Option<String>,
        /// Flip the sign of every signal
        #[arg(long)]
        reversed: bool,
        /// Trading days per window, overriding [backtest] step_size
        #[arg(long)]
        step_size: Option<usize>,
        /// Value history CSV, overriding [report] output
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print every value history sample at the end
        #[arg(long)]
        history: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data_dir: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub policy: Option<String>,
    pub reversed: bool,
    pub step_size: Option<usize>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            policy,
            reversed,
            step_size,
            output,
            history,
            dry_run,
        } => {
            let overrides = Overrides {
                policy,
                reversed,
                step_size,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides, output.as_deref(), history)
            }
        }
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

fn fail(err: SignaltraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Everything a run needs, resolved from the config file and command line.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub backtest: BacktestConfig,
    pub codes: Vec<String>,
    pub data_dir: PathBuf,
    pub output: Option<PathBuf>,
}

/// Loads and validates the config and applies overrides, before touching data.
pub fn prepare(config_path: &Path, overrides: &Overrides) -> Result<PreparedRun, SignaltraderError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    let mut backtest = build_backtest_config(&adapter)?;
    apply_overrides(&mut backtest, overrides)?;
    Ok(PreparedRun {
        backtest,
        codes: resolve_codes(&adapter)?,
        data_dir: data_dir(&adapter),
        output: adapter.get_string("report", "output").map(PathBuf::from),
    })
}

fn run_backtest(
    config_path: &Path,
    overrides: &Overrides,
    output_override: Option<&Path>,
    show_history: bool,
) -> ExitCode {
    // Stage 1: load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let prepared = match prepare(config_path, overrides) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    eprintln!("Strategy: {}", prepared.backtest.strategy.title());

    // Stage 2: resolve data source and report destination
    let data_port = CsvAdapter::new(prepared.data_dir.clone());
    let output = output_override
        .map(Path::to_path_buf)
        .or(prepared.output);

    eprintln!("Validating {} codes...", prepared.codes.len());
    match run_backtest_pipeline(
        &data_port,
        &prepared.backtest,
        &prepared.codes,
        output.as_deref(),
        &ConsoleReport::new(show_history),
    ) {
        Ok(result) if result.is_ruined() => ExitCode::from(EXIT_RUINED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SignaltraderError> {
    let start_date: NaiveDate = parse_date(adapter, "start_date")?;
    let end_date: NaiveDate = parse_date(adapter, "end_date")?;

    let step_size = adapter.get_int("backtest", "step_size", 0);
    let step_size = usize::try_from(step_size)
        .ok()
        .filter(|&s| s >= 1)
        .ok_or_else(|| SignaltraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "step_size".into(),
            reason: "step_size must be a whole number of at least 1".into(),
        })?;

    let policy = adapter
        .get_string("strategy", "policy")
        .ok_or_else(|| SignaltraderError::ConfigMissing {
            section: "strategy".into(),
            key: "policy".into(),
        })?;
    let mut strategy: StrategyKind = policy.parse()?;
    if adapter.get_bool("strategy", "reversed", false) {
        strategy.direction = Direction::Reversed;
    }

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 0.0),
        step_size,
        strategy,
        selection_fraction: adapter.get_double(
            "strategy",
            "selection_fraction",
            DEFAULT_SELECTION_FRACTION,
        ),
        indicator: IndicatorParams {
            combined_lookback_days: adapter.get_int(
                "strategy",
                "combined_lookback_days",
                DEFAULT_LOOKBACK_DAYS,
            ),
        },
    })
}

pub fn apply_overrides(
    bt_config: &mut BacktestConfig,
    overrides: &Overrides,
) -> Result<(), SignaltraderError> {
    if let Some(policy) = &overrides.policy {
        // A plain policy name keeps the configured direction.
        let chosen: StrategyKind = policy.parse()?;
        if chosen.direction == Direction::Reversed {
            bt_config.strategy = chosen;
        } else {
            bt_config.strategy.policy = chosen.policy;
        }
    }
    if overrides.reversed {
        bt_config.strategy.direction = Direction::Reversed;
    }
    if let Some(step_size) = overrides.step_size {
        if step_size == 0 {
            return Err(SignaltraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "step_size".into(),
                reason: "step_size must be at least 1".into(),
            });
        }
        bt_config.step_size = step_size;
    }
    Ok(())
}

pub fn resolve_codes(config: &dyn ConfigPort) -> Result<Vec<String>, SignaltraderError> {
    let codes = config
        .get_string("backtest", "codes")
        .ok_or_else(|| SignaltraderError::ConfigMissing {
            section: "backtest".into(),
            key: "codes".into(),
        })?;
    parse_codes(&codes).map_err(|e| SignaltraderError::ConfigInvalid {
        section: "backtest".into(),
        key: "codes".into(),
        reason: e.to_string(),
    })
}

pub fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("backtest", "data_dir")
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Fetches data, runs the simulation, prints the summary and writes the history CSV.
/// A ruined run is still `Ok`; its partial history is written like any other.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    codes: &[String],
    output_path: Option<&Path>,
    console: &ConsoleReport,
) -> Result<BacktestResult, SignaltraderError> {
    // Stage 3: fetch prices and drop unusable codes
    let universe = load_universe(data_port, codes, bt_config.start_date, bt_config.end_date)?;

    // Stage 4: align on a shared timeline and run
    let table = PriceTable::from_series(&universe.series);
    eprintln!(
        "Running backtest: {} codes, {} to {}",
        universe.count(),
        bt_config.start_date,
        bt_config.end_date,
    );
    eprintln!(
        "  Processing: {} dates, {} per window, top {} by |signal|",
        table.len(),
        bt_config.step_size,
        allocation::selection_size(table.asset_count(), bt_config.selection_fraction),
    );

    let result = backtest_engine::run_backtest(&table, bt_config, console)?;

    // Stage 5: summary
    let metrics = Metrics::compute(&result.portfolio, periods_per_year(bt_config.step_size));
    print_summary(&metrics, result.steps.len());

    // Stage 6: history report
    if let Some(output) = output_path {
        CsvHistoryReport.write(&result, output)?;
        eprintln!("\nHistory written to: {}", output.display());
    }
    Ok(result)
}

fn print_summary(metrics: &Metrics, steps: usize) {
    eprintln!("\n=== Results ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!(
        "Max Drawdown:     -{:.1}% over {} steps",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    eprintln!("Trading Steps:    {steps}");
    eprintln!(
        "Up/Down/Flat:     {}/{}/{}",
        metrics.steps_up, metrics.steps_down, metrics.steps_flat
    );
    eprintln!(
        "Best/Worst Step:  {:+.2}% / {:+.2}%",
        metrics.best_step * 100.0,
        metrics.worst_step * 100.0
    );
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let prepared = match prepare(config_path, overrides) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    eprintln!("Config validated successfully");
    eprintln!("{}", describe_run(&prepared));
    eprintln!("Dry run complete: configuration is valid");
    ExitCode::SUCCESS
}

/// Human-readable outline of a prepared run, as printed by `--dry-run`.
pub fn describe_run(prepared: &PreparedRun) -> String {
    let bt = &prepared.backtest;
    let mut lines = vec![
        "Strategy:".to_string(),
        format!("  policy:              {}", bt.strategy),
        format!("  selection_fraction:  {}", bt.selection_fraction),
    ];
    if bt.strategy.policy == Policy::Combined {
        lines.push(format!(
            "  lookback:            {} days",
            bt.indicator.combined_lookback_days
        ));
    }
    lines.extend([
        "Backtest:".to_string(),
        format!("  period:              {} to {}", bt.start_date, bt.end_date),
        format!("  initial_capital:     {:.2}", bt.initial_capital),
        format!("  step_size:           {}", bt.step_size),
        format!("  data_dir:            {}", prepared.data_dir.display()),
        "Universe:".to_string(),
        format!("  codes: {}", prepared.codes.join(", ")),
    ]);
    if let Some(output) = &prepared.output {
        lines.push(format!("Report:\n  output: {}", output.display()));
    }
    lines.join("\n")
}

fn run_list_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, code: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let codes = match code {
        Some(c) => vec![c.trim().to_uppercase()],
        None => match resolve_codes(&config) {
            Ok(codes) => codes,
            Err(e) => return fail(e),
        },
    };

    let adapter = CsvAdapter::new(data_dir(&config));
    for c in &codes {
        match adapter.get_data_range(c) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} rows, {} to {}", c, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", c);
            }
            Err(e) => {
                eprintln!("error reading {}: {}", c, e);
            }
        }
    }
    ExitCode::SUCCESS
}
