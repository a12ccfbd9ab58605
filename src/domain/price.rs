//! Daily close observations and validated per-asset series.

use crate::domain::error::SignaltraderError;
use chrono::NaiveDate;

/// One trading day's close for one asset. `close` is `None` for a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

impl PricePoint {
    /// Builds a point, normalising unusable closes (non-finite or <= 0) to a gap.
    pub fn new(date: NaiveDate, close: Option<f64>) -> Self {
        Self {
            date,
            close: close.filter(|&c| is_valid_price(c)),
        }
    }

    pub fn gap(date: NaiveDate) -> Self {
        Self { date, close: None }
    }
}

pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Close history for one asset, strictly increasing by date.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub code: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(code: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, SignaltraderError> {
        let code = code.into();
        for pair in points.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(SignaltraderError::DataInvalid {
                    code,
                    reason: format!("duplicate date {}", pair[1].date),
                });
            }
            if pair[1].date < pair[0].date {
                return Err(SignaltraderError::DataInvalid {
                    code,
                    reason: format!("dates out of order at {}", pair[1].date),
                });
            }
        }
        Ok(Self { code, points })
    }

    /// Number of days carrying a usable close.
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.close.is_some()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}
