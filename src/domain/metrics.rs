//! Run summary statistics computed from the portfolio value history.

use super::portfolio::{PortfolioState, ValuePoint};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Longest run of consecutive history samples below a prior peak.
    pub max_drawdown_duration: usize,
    pub steps_up: usize,
    pub steps_down: usize,
    pub steps_flat: usize,
    pub best_step: f64,
    pub worst_step: f64,
}

/// Number of windows of `step_size` trading days in a year.
pub fn periods_per_year(step_size: usize) -> f64 {
    TRADING_DAYS_PER_YEAR / step_size.max(1) as f64
}

impl Metrics {
    pub fn compute(portfolio: &PortfolioState, periods_per_year: f64) -> Self {
        let history = &portfolio.history;
        let initial_capital = portfolio.initial_capital;

        let final_value = history
            .last()
            .map(|p| p.value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let annualized_return = compute_annualized(history, total_return);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(history);

        let returns = step_returns(history);
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns, periods_per_year);

        let mut steps_up = 0usize;
        let mut steps_down = 0usize;
        let mut steps_flat = 0usize;
        let mut best_step = 0.0_f64;
        let mut worst_step = 0.0_f64;
        for (i, &r) in returns.iter().enumerate() {
            if r > 0.0 {
                steps_up += 1;
            } else if r < 0.0 {
                steps_down += 1;
            } else {
                steps_flat += 1;
            }
            if i == 0 || r > best_step {
                best_step = r;
            }
            if i == 0 || r < worst_step {
                worst_step = r;
            }
        }

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            steps_up,
            steps_down,
            steps_flat,
            best_step,
            worst_step,
        }
    }
}

fn compute_annualized(history: &[ValuePoint], total_return: f64) -> f64 {
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return 0.0;
    };
    let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 || !total_return.is_finite() {
        return 0.0;
    }
    if total_return <= -1.0 {
        return -1.0;
    }
    (1.0 + total_return).powf(1.0 / years) - 1.0
}

fn step_returns(history: &[ValuePoint]) -> Vec<f64> {
    history
        .windows(2)
        .map(|w| {
            let prev = w[0].value;
            if prev > 0.0 {
                (w[1].value - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

fn compute_drawdown(history: &[ValuePoint]) -> (f64, usize) {
    let Some(first) = history.first() else {
        return (0.0, 0);
    };

    let mut peak = first.value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in history {
        if point.value >= peak {
            peak = point.value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(returns: &[f64], periods_per_year: f64) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let scale = periods_per_year.max(0.0).sqrt();

    let sharpe = if stddev > 0.0 {
        (mean / stddev) * scale
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (mean / downside_stddev) * scale
    } else {
        0.0
    };

    (sharpe, sortino)
}
