//! Writes the portfolio value history as `date,value` CSV.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SignaltraderError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvHistoryReport;

fn report_error(path: &Path, e: impl std::fmt::Display) -> SignaltraderError {
    SignaltraderError::Report {
        reason: format!("failed to write {}: {e}", path.display()),
    }
}

impl ReportPort for CsvHistoryReport {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SignaltraderError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| report_error(output_path, e))?;
        writer
            .write_record(["date", "value"])
            .map_err(|e| report_error(output_path, e))?;
        for point in &result.portfolio.history {
            writer
                .write_record([point.date.to_string(), format!("{:.2}", point.value)])
                .map_err(|e| report_error(output_path, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}
