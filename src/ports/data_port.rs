//! Price data access port.

use crate::domain::error::SignaltraderError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `code` within `[start_date, end_date]`, oldest first.
    /// Missing or unusable closes come back as gaps, not as zero.
    fn fetch_closes(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, SignaltraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignaltraderError>;

    /// First date, last date and row count for `code`, or `None` if the
    /// provider has nothing for it.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignaltraderError>;
}
