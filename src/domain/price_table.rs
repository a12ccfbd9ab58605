//! Unified timeline and date-aligned close columns.
//!
//! The timeline holds every date on which at least one asset has a usable
//! close; dates on which all assets are missing are dropped. Each asset column
//! has one cell per timeline date, `None` where that asset has a gap.

use crate::domain::price::PriceSeries;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct PriceTable {
    timeline: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceTable {
    pub fn from_series(series: &[PriceSeries]) -> Self {
        let timeline = build_unified_timeline(series);
        let date_index: HashMap<NaiveDate, usize> = timeline
            .iter()
            .enumerate()
            .map(|(i, &date)| (date, i))
            .collect();

        let mut columns = BTreeMap::new();
        for s in series {
            let mut column = vec![None; timeline.len()];
            for point in &s.points {
                if let (Some(close), Some(&i)) = (point.close, date_index.get(&point.date)) {
                    column[i] = Some(close);
                }
            }
            columns.insert(s.code.clone(), column);
        }

        Self { timeline, columns }
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Asset identifiers in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn asset_count(&self) -> usize {
        self.columns.len()
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.timeline.get(index).copied()
    }

    pub fn price_at(&self, code: &str, index: usize) -> Option<f64> {
        self.columns.get(code)?.get(index).copied().flatten()
    }

    /// Usable closes for `code` at timeline indices `start..=end`, gaps removed.
    pub fn closes(&self, code: &str, start: usize, end: usize) -> Vec<f64> {
        match self.columns.get(code) {
            Some(column) if start <= end && start < column.len() => {
                let end = end.min(column.len() - 1);
                column[start..=end].iter().flatten().copied().collect()
            }
            _ => Vec::new(),
        }
    }

    /// Usable closes for `code` dated within `from..=to`, gaps removed.
    pub fn closes_between(&self, code: &str, from: NaiveDate, to: NaiveDate) -> Vec<f64> {
        let start = self.timeline.partition_point(|&d| d < from);
        let end = self.timeline.partition_point(|&d| d <= to);
        if start >= end {
            return Vec::new();
        }
        self.closes(code, start, end - 1)
    }
}

pub fn build_unified_timeline(series: &[PriceSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.iter().filter(|p| p.close.is_some()).map(|p| p.date))
        .collect();
    unique_dates.into_iter().collect()
}
