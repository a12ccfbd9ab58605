//! Combined short-horizon indicator: mean-deviation plus trend-slope, both
//! read over the same trailing sub-window.

use super::mean_deviation::mean_deviation;
use super::trend::trend_slope;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 5;
/// Upper bound accepted from configuration: ten years of calendar days.
pub const MAX_LOOKBACK_DAYS: i64 = 3_650;

pub fn combined(tail_closes: &[f64]) -> f64 {
    mean_deviation(tail_closes) + trend_slope(tail_closes)
}
