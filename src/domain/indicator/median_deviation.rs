//! Median-deviation indicator.
//!
//! Same reading as mean-deviation but against the window median, obtained
//! from an [`OrderStatisticsTree`] built fresh for each call.

use super::trend::finite_or_zero;
use crate::domain::order_stats::OrderStatisticsTree;

pub fn median_deviation(closes: &[f64]) -> f64 {
    let Some(&last) = closes.last() else {
        return 0.0;
    };
    let tree = OrderStatisticsTree::from_values(closes.iter().copied());
    match tree.median() {
        Some(median) => finite_or_zero((median - last) / median),
        None => 0.0,
    }
}
