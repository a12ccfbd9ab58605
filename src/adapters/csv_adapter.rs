//! CSV file data adapter.
//!
//! One file per asset, `<data_dir>/<CODE>.csv`, with at least a `date` and a
//! `close` column (matched by header name, case-insensitive). Dates are
//! `YYYY-MM-DD`. An empty, `NaN`/`null` or non-positive close is a gap.

use crate::domain::error::SignaltraderError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    /// Every row of `code`'s file as a validated series, or `None` if the
    /// file does not exist.
    fn read_series(&self, code: &str) -> Result<Option<PriceSeries>, SignaltraderError> {
        let path = self.csv_path(code);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| SignaltraderError::DataInvalid {
            code: code.to_string(),
            reason: format!("CSV header error: {e}"),
        })?;
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| SignaltraderError::DataInvalid {
                    code: code.to_string(),
                    reason: format!("missing {name} column in {}", path.display()),
                })
        };
        let date_col = column("date")?;
        let close_col = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SignaltraderError::DataInvalid {
                code: code.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SignaltraderError::DataInvalid {
                    code: code.to_string(),
                    reason: format!("invalid date {date_str:?}: {e}"),
                }
            })?;

            let close = parse_close(record.get(close_col).unwrap_or_default()).map_err(|raw| {
                SignaltraderError::DataInvalid {
                    code: code.to_string(),
                    reason: format!("invalid close {raw:?} on {date}"),
                }
            })?;
            points.push(PricePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        PriceSeries::new(code, points).map(Some)
    }
}

/// `Ok(None)` for an explicit gap marker, `Err` with the raw text when the
/// cell is neither a gap nor a number.
fn parse_close(raw: &str) -> Result<Option<f64>, String> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "nan" | "null" | "na" | "n/a" => Ok(None),
        other => other.parse::<f64>().map(Some).map_err(|_| raw.to_string()),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, SignaltraderError> {
        let series = self.read_series(code)?.ok_or_else(|| SignaltraderError::NoData {
            code: code.to_string(),
        })?;
        Ok(series
            .points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignaltraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignaltraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignaltraderError> {
        let Some(series) = self.read_series(code)? else {
            return Ok(None);
        };
        Ok(match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => Some((first, last, series.points.len())),
            _ => None,
        })
    }
}
