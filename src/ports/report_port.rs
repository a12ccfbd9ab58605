//! Report sink ports.

use crate::domain::backtest::{BacktestResult, StepReport};
use crate::domain::error::SignaltraderError;
use std::path::Path;

/// Observes a run while it executes.
pub trait ProgressSink {
    /// Called after every settled step. Default: ignore.
    fn on_step(&self, _step: &StepReport) {}

    /// Called once with the finished (or ruined) run. Default: ignore.
    fn on_finish(&self, _result: &BacktestResult) {}
}

/// Port for writing the final report to a file.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SignaltraderError>;
}
