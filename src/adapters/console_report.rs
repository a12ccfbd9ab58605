//! Console report adapter: per-step progress and a closing value table on stderr.

use std::collections::BTreeMap;

use crate::domain::backtest::{BacktestResult, RunOutcome, StepReport};
use crate::ports::report_port::ProgressSink;

#[derive(Debug, Clone, Default)]
pub struct ConsoleReport {
    /// Also print every history sample when the run finishes.
    pub show_history: bool,
}

impl ConsoleReport {
    pub fn new(show_history: bool) -> Self {
        Self { show_history }
    }
}

fn format_positions(positions: &BTreeMap<String, f64>) -> String {
    if positions.is_empty() {
        return "-".to_string();
    }
    positions
        .iter()
        .map(|(code, amount)| format!("{code} ${amount:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_step(step: &StepReport) -> String {
    format!(
        "{} -> {}  long: {}  short: {}  return: {:+.2}% (${:.2})",
        step.window.start,
        step.window.end,
        format_positions(&step.allocation.long_positions),
        format_positions(&step.allocation.short_positions),
        step.return_pct() * 100.0,
        step.value_after,
    )
}

impl ConsoleReport {
    /// Closing block: title, optional history table, then the final value or ruin line.
    pub fn format_summary(&self, result: &BacktestResult) -> String {
        let mut lines = vec![format!("=== {} ===", result.strategy.title())];
        if self.show_history {
            lines.extend(
                result
                    .portfolio
                    .history
                    .iter()
                    .map(|point| format!("  {}  {:>14.2}", point.date, point.value)),
            );
        }
        lines.push(match result.outcome {
            RunOutcome::Completed => format!("Final value: ${:.2}", result.final_value()),
            RunOutcome::Ruined { date, value } => {
                format!("Portfolio ruined on {date} (value ${value:.2})")
            }
        });
        lines.join("\n")
    }
}

impl ProgressSink for ConsoleReport {
    fn on_step(&self, step: &StepReport) {
        eprintln!("  {}", format_step(step));
    }

    fn on_finish(&self, result: &BacktestResult) {
        eprintln!("\n{}", self.format_summary(result));
    }
}
