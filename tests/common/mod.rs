#![allow(dead_code)]

use chrono::NaiveDate;
use signaltrader::domain::backtest::BacktestConfig;
use signaltrader::domain::error::SignaltraderError;
use signaltrader::domain::indicator::StrategyKind;
pub use signaltrader::domain::price::{PricePoint, PriceSeries};
use signaltrader::domain::price_table::PriceTable;
use signaltrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, code: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(code.to_string(), points);
        self
    }

    /// Consecutive calendar days from `start`, one close per entry; `None` is a gap.
    pub fn with_closes(self, code: &str, start: &str, closes: &[Option<f64>]) -> Self {
        let points = make_points(start, closes);
        self.with_points(code, points)
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, SignaltraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SignaltraderError::Data {
                reason: reason.clone(),
            });
        }
        let points = self.data.get(code).ok_or_else(|| SignaltraderError::NoData {
            code: code.to_string(),
        })?;
        Ok(points
            .iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignaltraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignaltraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SignaltraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(points) if !points.is_empty() => {
                let min = points.iter().map(|p| p.date).min().unwrap();
                let max = points.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, points.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_points(start: &str, closes: &[Option<f64>]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Table over consecutive days starting 2024-01-01.
pub fn make_table(columns: &[(&str, &[Option<f64>])]) -> PriceTable {
    let series: Vec<PriceSeries> = columns
        .iter()
        .map(|&(code, closes)| PriceSeries::new(code, make_points("2024-01-01", closes)).unwrap())
        .collect();
    PriceTable::from_series(&series)
}

/// A linear price path: `start`, `start + step`, ...
pub fn linear(start: f64, step: f64, count: usize) -> Vec<Option<f64>> {
    (0..count).map(|i| Some(start + step * i as f64)).collect()
}

pub fn sample_config(strategy: StrategyKind, step_size: usize) -> BacktestConfig {
    BacktestConfig::new(date(2024, 1, 1), date(2024, 12, 31), 10_000.0, step_size, strategy)
}
