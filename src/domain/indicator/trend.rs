//! Trend-slope indicator.
//!
//! Least-squares slope of close against position in the window
//! (x = 0..n-1), divided by the last close so assets at different price
//! levels are comparable. Positive slope is a buy signal.

pub fn trend_slope(closes: &[f64]) -> f64 {
    let n = closes.len();
    if n < 2 {
        return 0.0;
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = closes.iter().sum::<f64>() / nf;

    let (mut cov, mut var) = (0.0, 0.0);
    for (i, &y) in closes.iter().enumerate() {
        let dx = i as f64 - x_mean;
        cov += dx * (y - y_mean);
        var += dx * dx;
    }

    let last = closes[n - 1];
    let slope = cov / var;
    finite_or_zero(slope / last)
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
