//! One simulation step's span over the unified timeline.

use crate::domain::price_table::PriceTable;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
}

impl Window {
    /// Window beginning at `start_index` and spanning `step_size` trading days,
    /// with the end clamped to the last timeline date. `None` once
    /// `start_index` is past the timeline.
    pub fn new(table: &PriceTable, start_index: usize, step_size: usize) -> Option<Self> {
        let last = table.len().checked_sub(1)?;
        if start_index > last {
            return None;
        }
        let end_index = start_index.saturating_add(step_size).min(last);
        Some(Self {
            start: table.date_at(start_index)?,
            end: table.date_at(end_index)?,
            start_index,
            end_index,
        })
    }

    pub fn trading_days(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::{PricePoint, PriceSeries};

    fn table(days: u32) -> PriceTable {
        let points = (1..=days)
            .map(|day| {
                PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), Some(10.0))
            })
            .collect();
        PriceTable::from_series(&[PriceSeries::new("AAA", points).unwrap()])
    }

    #[test]
    fn spans_step_size_days_past_start() {
        let t = table(10);
        let w = Window::new(&t, 0, 3).unwrap();
        assert_eq!(w.start_index, 0);
        assert_eq!(w.end_index, 3);
        assert_eq!(w.trading_days(), 4);
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn end_is_clamped_to_timeline() {
        let t = table(5);
        let w = Window::new(&t, 3, 10).unwrap();
        assert_eq!(w.end_index, 4);
    }

    #[test]
    fn last_index_gives_single_day_window() {
        let t = table(5);
        let w = Window::new(&t, 4, 2).unwrap();
        assert_eq!(w.start, w.end);
    }

    #[test]
    fn past_timeline_is_none() {
        let t = table(5);
        assert!(Window::new(&t, 5, 1).is_none());
        assert!(Window::new(&table(0), 0, 1).is_none());
    }
}
