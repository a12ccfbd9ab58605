//! Mean-deviation indicator.
//!
//! (mean - last) / mean over the window. Positive when the last close sits
//! below the window mean (buy), negative when above (sell).

use super::trend::finite_or_zero;

pub fn mean_deviation(closes: &[f64]) -> f64 {
    let Some(&last) = closes.last() else {
        return 0.0;
    };
    let mean = closes.iter().sum::<f64>() / closes.len() as f64;
    finite_or_zero((mean - last) / mean)
}
