//! Allocation engine: turns a signal snapshot into long/short dollar positions.
//!
//! The strongest `max(1, floor(count * selection_fraction))` readings by
//! magnitude are selected and the full portfolio value is split among them in
//! proportion to |signal|. Positive readings go long, negative go short.

use crate::domain::price_table::PriceTable;
use crate::domain::signal::Signal;
use crate::domain::window::Window;
use std::collections::BTreeMap;

pub const DEFAULT_SELECTION_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub long_positions: BTreeMap<String, f64>,
    pub short_positions: BTreeMap<String, f64>,
}

impl Allocation {
    pub fn is_empty(&self) -> bool {
        self.long_positions.is_empty() && self.short_positions.is_empty()
    }

    /// Total notional across both sides.
    pub fn gross_exposure(&self) -> f64 {
        self.long_positions.values().sum::<f64>() + self.short_positions.values().sum::<f64>()
    }

    pub fn position_count(&self) -> usize {
        self.long_positions.len() + self.short_positions.len()
    }
}

/// Number of entries selected from a snapshot of `count` assets.
pub fn selection_size(count: usize, selection_fraction: f64) -> usize {
    if count == 0 {
        return 0;
    }
    // Tolerance keeps e.g. 30 * 0.1 from flooring to 2.
    let raw = (count as f64 * selection_fraction + 1e-9).floor();
    (raw as usize).clamp(1, count)
}

pub fn allocate(signal: &Signal, portfolio_value: f64, selection_fraction: f64) -> Allocation {
    let mut ranked: Vec<(&str, f64)> = signal.iter().collect();
    if ranked.is_empty() {
        return Allocation::default();
    }
    // Stable sort: equal magnitudes keep the snapshot's asset order.
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    ranked.truncate(selection_size(ranked.len(), selection_fraction));

    let total_magnitude: f64 = ranked.iter().map(|(_, v)| v.abs()).sum();
    if total_magnitude <= 0.0 {
        return Allocation::default();
    }

    let mut allocation = Allocation::default();
    for (code, value) in ranked {
        let amount = portfolio_value * (value.abs() / total_magnitude);
        if value > 0.0 {
            allocation.long_positions.insert(code.to_string(), amount);
        } else if value < 0.0 {
            allocation.short_positions.insert(code.to_string(), amount);
        }
    }
    allocation
}

/// Restricts a snapshot to assets priced at both ends of `window`, so every
/// allocation drawn from it can be settled.
pub fn select_candidates(signal: &Signal, table: &PriceTable, window: &Window) -> Signal {
    signal.filtered(|code| {
        table.price_at(code, window.start_index).is_some()
            && table.price_at(code, window.end_index).is_some()
    })
}
