//! Portfolio value and its per-window history.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub value: f64,
    pub initial_capital: f64,
    pub history: Vec<ValuePoint>,
}

impl PortfolioState {
    /// Starts at `initial_capital` with one history sample dated `start`.
    pub fn new(initial_capital: f64, start: NaiveDate) -> Self {
        PortfolioState {
            value: initial_capital,
            initial_capital,
            history: vec![ValuePoint {
                date: start,
                value: initial_capital,
            }],
        }
    }

    /// Sets the current value and appends it to the history.
    pub fn record(&mut self, date: NaiveDate, value: f64) {
        self.value = value;
        self.history.push(ValuePoint { date, value });
    }

    pub fn is_ruined(&self) -> bool {
        self.value <= 0.0
    }

    pub fn last_point(&self) -> Option<&ValuePoint> {
        self.history.last()
    }
}
