//! Returns engine: marks an allocation from window-start to window-end closes.
//!
//! Long gain = amount * (end / start - 1), short gain = amount * (1 - end / start).
//! Fills happen at the observed close; no fees, slippage or borrow cost.

use crate::domain::allocation::Allocation;
use crate::domain::error::SignaltraderError;
use crate::domain::price_table::PriceTable;
use crate::domain::window::Window;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Closes for every asset at one timeline date.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    pub date: NaiveDate,
    pub prices: HashMap<String, f64>,
}

impl PriceSnapshot {
    pub fn at(table: &PriceTable, index: usize) -> Option<Self> {
        let date = table.date_at(index)?;
        let prices = table
            .codes()
            .filter_map(|code| table.price_at(code, index).map(|p| (code.to_string(), p)))
            .collect();
        Some(Self { date, prices })
    }

    fn price(&self, code: &str) -> Result<f64, SignaltraderError> {
        self.prices
            .get(code)
            .copied()
            .ok_or_else(|| SignaltraderError::MissingPrice {
                code: code.to_string(),
                date: self.date,
            })
    }
}

/// Price ratio end / start for an allocated asset.
fn price_ratio(
    code: &str,
    start: &PriceSnapshot,
    end: &PriceSnapshot,
) -> Result<f64, SignaltraderError> {
    Ok(end.price(code)? / start.price(code)?)
}

pub fn settle(
    allocation: &Allocation,
    start: &PriceSnapshot,
    end: &PriceSnapshot,
    portfolio_value: f64,
) -> Result<f64, SignaltraderError> {
    let mut value = portfolio_value;
    for (code, &amount) in &allocation.long_positions {
        value += amount * (price_ratio(code, start, end)? - 1.0);
    }
    for (code, &amount) in &allocation.short_positions {
        value += amount * (1.0 - price_ratio(code, start, end)?);
    }
    Ok(value)
}

/// Settles `allocation` over `window` using the table's boundary closes.
pub fn settle_window(
    allocation: &Allocation,
    table: &PriceTable,
    window: &Window,
    portfolio_value: f64,
) -> Result<f64, SignaltraderError> {
    let missing = |date: NaiveDate| SignaltraderError::Data {
        reason: format!("window boundary {date} is outside the price table"),
    };
    let start = PriceSnapshot::at(table, window.start_index).ok_or_else(|| missing(window.start))?;
    let end = PriceSnapshot::at(table, window.end_index).ok_or_else(|| missing(window.end))?;
    settle(allocation, &start, &end, portfolio_value)
}
