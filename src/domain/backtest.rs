//! Backtest simulation loop.
//!
//! The loop is an explicit state machine: `Initializing` -> `Stepping` (repeated)
//! -> `Terminated` (ruin) or `Completed` (timeline exhausted). Each step first
//! trades on the snapshot computed in the previous window, then computes a new
//! snapshot for the current window. A snapshot is therefore always applied
//! exactly one window after the data it was computed from.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::allocation::{self, Allocation, DEFAULT_SELECTION_FRACTION};
use crate::domain::error::SignaltraderError;
use crate::domain::indicator::{self, IndicatorParams, StrategyKind};
use crate::domain::portfolio::PortfolioState;
use crate::domain::price_table::PriceTable;
use crate::domain::returns;
use crate::domain::signal::Signal;
use crate::domain::window::Window;
use crate::ports::report_port::ProgressSink;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Trading days advanced per window.
    pub step_size: usize,
    pub strategy: StrategyKind,
    pub selection_fraction: f64,
    pub indicator: IndicatorParams,
}

impl BacktestConfig {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_capital: f64,
        step_size: usize,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            start_date,
            end_date,
            initial_capital,
            step_size,
            strategy,
            selection_fraction: DEFAULT_SELECTION_FRACTION,
            indicator: IndicatorParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Stepping,
    Terminated,
    Completed,
}

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub current_index: usize,
    pub portfolio: PortfolioState,
    /// Snapshot from the most recent window, to be traded in the next one.
    pub last_signal: Option<Signal>,
    pub phase: Phase,
}

/// What happened in one trading step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub window: Window,
    pub allocation: Allocation,
    pub value_before: f64,
    pub value_after: f64,
}

impl StepReport {
    pub fn realized_return(&self) -> f64 {
        self.value_after - self.value_before
    }

    pub fn return_pct(&self) -> f64 {
        if self.value_before > 0.0 {
            self.realized_return() / self.value_before
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    Completed,
    Ruined { date: NaiveDate, value: f64 },
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: StrategyKind,
    pub portfolio: PortfolioState,
    pub steps: Vec<StepReport>,
    pub outcome: RunOutcome,
}

impl BacktestResult {
    pub fn is_ruined(&self) -> bool {
        matches!(self.outcome, RunOutcome::Ruined { .. })
    }

    pub fn final_value(&self) -> f64 {
        self.portfolio.value
    }
}

pub struct Simulation<'a> {
    table: &'a PriceTable,
    config: &'a BacktestConfig,
    state: SimulationState,
    steps: Vec<StepReport>,
}

impl<'a> Simulation<'a> {
    pub fn new(table: &'a PriceTable, config: &'a BacktestConfig) -> Result<Self, SignaltraderError> {
        if config.step_size == 0 {
            return Err(SignaltraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "step_size".into(),
                reason: "step_size must be at least 1".into(),
            });
        }
        if !(config.initial_capital > 0.0) {
            return Err(SignaltraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_capital".into(),
                reason: "initial_capital must be positive".into(),
            });
        }
        let start = table.date_at(0).ok_or_else(|| SignaltraderError::NoData {
            code: "all".into(),
        })?;

        Ok(Self {
            table,
            config,
            state: SimulationState {
                current_index: 0,
                portfolio: PortfolioState::new(config.initial_capital, start),
                last_signal: None,
                phase: Phase::Initializing,
            },
            steps: Vec::new(),
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state.phase, Phase::Terminated | Phase::Completed)
    }

    /// Performs one transition. Returns the step report when a trade was
    /// settled in this window.
    pub fn step(&mut self) -> Result<Option<StepReport>, SignaltraderError> {
        if self.is_finished() {
            return Ok(None);
        }
        let Some(window) = Window::new(self.table, self.state.current_index, self.config.step_size)
        else {
            self.state.phase = Phase::Completed;
            return Ok(None);
        };

        let mut report = None;
        if self.state.phase == Phase::Stepping {
            if let Some(signal) = self.state.last_signal.take() {
                report = Some(self.trade(&signal, &window)?);
                self.state.last_signal = Some(signal);
            }
        }
        self.state.phase = Phase::Stepping;

        if self.state.portfolio.is_ruined() {
            self.state.phase = Phase::Terminated;
            return Ok(report);
        }

        self.state.last_signal = Some(indicator::compute_snapshot(
            self.table,
            &window,
            self.config.strategy,
            &self.config.indicator,
        ));

        self.state.current_index = window.end_index + 1;
        if self.state.current_index >= self.table.len() {
            self.state.phase = Phase::Completed;
        }
        Ok(report)
    }

    fn trade(&mut self, signal: &Signal, window: &Window) -> Result<StepReport, SignaltraderError> {
        let candidates = allocation::select_candidates(signal, self.table, window);
        let value_before = self.state.portfolio.value;
        let allocation =
            allocation::allocate(&candidates, value_before, self.config.selection_fraction);

        let value_after = if allocation.is_empty() {
            value_before
        } else {
            returns::settle_window(&allocation, self.table, window, value_before)?
        };
        self.state.portfolio.record(window.end, value_after);

        let report = StepReport {
            window: *window,
            allocation,
            value_before,
            value_after,
        };
        self.steps.push(report.clone());
        Ok(report)
    }

    pub fn into_result(self) -> BacktestResult {
        let outcome = if self.state.phase == Phase::Terminated {
            let last = self.state.portfolio.last_point();
            RunOutcome::Ruined {
                date: last.map(|p| p.date).unwrap_or(self.config.start_date),
                value: self.state.portfolio.value,
            }
        } else {
            RunOutcome::Completed
        };
        BacktestResult {
            strategy: self.config.strategy,
            portfolio: self.state.portfolio,
            steps: self.steps,
            outcome,
        }
    }
}

/// Runs the simulation to completion or ruin, reporting each trading step and
/// the final result to `sink`.
pub fn run_backtest(
    table: &PriceTable,
    config: &BacktestConfig,
    sink: &dyn ProgressSink,
) -> Result<BacktestResult, SignaltraderError> {
    let mut simulation = Simulation::new(table, config)?;
    info!(
        strategy = %config.strategy,
        assets = table.asset_count(),
        days = table.len(),
        step_size = config.step_size,
        "starting backtest"
    );

    while !simulation.is_finished() {
        if let Some(report) = simulation.step()? {
            debug!(
                start = %report.window.start,
                end = %report.window.end,
                days = report.window.trading_days(),
                positions = report.allocation.position_count(),
                value = report.value_after,
                "settled window"
            );
            sink.on_step(&report);
        }
    }

    let result = simulation.into_result();
    match result.outcome {
        RunOutcome::Ruined { date, value } => {
            warn!(%date, value, "portfolio ruined; run halted");
        }
        RunOutcome::Completed => {
            info!(
                steps = result.steps.len(),
                final_value = result.final_value(),
                "backtest complete"
            );
        }
    }
    sink.on_finish(&result);
    Ok(result)
}
