//! Asset universe: code list parsing and data-availability checks.
//!
//! Codes with no usable close in the requested range are skipped with a
//! warning rather than failing the run; only an entirely empty universe is an
//! error.

use crate::domain::error::SignaltraderError;
use crate::domain::price::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The provider failed or had no file for the code.
    Unavailable(String),
    /// Rows exist but none carries a usable close.
    NoValidCloses,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub series: Vec<PriceSeries>,
    pub skipped: Vec<SkippedCode>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.series.len()
    }
}

/// Fetches every code and keeps those with at least one usable close.
pub fn load_universe(
    data_port: &dyn DataPort,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Universe, SignaltraderError> {
    let mut series = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let points = match data_port.fetch_closes(code, start_date, end_date) {
            Ok(points) => points,
            Err(e) => {
                warn!(code = %code, error = %e, "skipping code");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::Unavailable(e.to_string()),
                });
                continue;
            }
        };

        let s = PriceSeries::new(code.as_str(), points)?;
        if s.valid_count() == 0 {
            warn!(code = %code, "skipping code: no usable closes in range");
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::NoValidCloses,
            });
            continue;
        }

        debug!(code = %code, closes = s.valid_count(), "code loaded");
        series.push(s);
    }

    if series.is_empty() {
        return Err(SignaltraderError::NoData {
            code: "all".to_string(),
        });
    }

    if !skipped.is_empty() {
        eprintln!(
            "Backtesting {} of {} codes",
            series.len(),
            series.len() + skipped.len()
        );
    }

    info!(loaded = series.len(), skipped = skipped.len(), "universe loaded");
    Ok(Universe { series, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct StubData {
        series: HashMap<String, Vec<PricePoint>>,
    }

    impl DataPort for StubData {
        fn fetch_closes(
            &self,
            code: &str,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> Result<Vec<PricePoint>, SignaltraderError> {
            let points = self.series.get(code).ok_or_else(|| SignaltraderError::NoData {
                code: code.to_string(),
            })?;
            Ok(points
                .iter()
                .filter(|p| p.date >= start_date && p.date <= end_date)
                .cloned()
                .collect())
        }

        fn list_symbols(&self) -> Result<Vec<String>, SignaltraderError> {
            Ok(self.series.keys().cloned().collect())
        }

        fn get_data_range(
            &self,
            _code: &str,
        ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignaltraderError> {
            Ok(None)
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn stub() -> StubData {
        let mut series = HashMap::new();
        series.insert(
            "AAPL".to_string(),
            vec![PricePoint::new(d(2), Some(10.0)), PricePoint::new(d(3), Some(11.0))],
        );
        series.insert(
            "DEAD".to_string(),
            vec![PricePoint::gap(d(2)), PricePoint::gap(d(3))],
        );
        StubData { series }
    }

    #[test]
    fn test_parse_codes_basic() {
        let result = parse_codes("AAPL,MSFT,GOOGL").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn test_parse_codes_with_whitespace_and_case() {
        let result = parse_codes("  aapl , Msft ,GOOGL").unwrap();
        assert_eq!(result, vec!["AAPL", "MSFT", "GOOGL"]);
    }

    #[test]
    fn test_parse_codes_empty_token() {
        let result = parse_codes("AAPL,,MSFT");
        assert!(matches!(result, Err(UniverseError::EmptyToken)));
        assert!(matches!(parse_codes(""), Err(UniverseError::EmptyToken)));
    }

    #[test]
    fn test_parse_codes_duplicate() {
        let result = parse_codes("AAPL,MSFT,aapl");
        assert!(matches!(result, Err(UniverseError::DuplicateCode(s)) if s == "AAPL"));
    }

    #[test]
    fn load_keeps_priced_codes_and_skips_the_rest() {
        let codes = vec!["AAPL".to_string(), "DEAD".to_string(), "GONE".to_string()];
        let universe = load_universe(&stub(), &codes, d(1), d(31)).unwrap();

        assert_eq!(universe.count(), 1);
        assert_eq!(universe.series[0].code, "AAPL");
        assert_eq!(universe.skipped.len(), 2);
        assert_eq!(universe.skipped[0].code, "DEAD");
        assert_eq!(universe.skipped[0].reason, SkipReason::NoValidCloses);
        assert!(matches!(universe.skipped[1].reason, SkipReason::Unavailable(_)));
    }

    #[test]
    fn load_fails_when_nothing_is_usable() {
        let codes = vec!["DEAD".to_string()];
        let err = load_universe(&stub(), &codes, d(1), d(31)).unwrap_err();
        assert!(matches!(err, SignaltraderError::NoData { code } if code == "all"));
    }

    #[test]
    fn load_respects_date_range() {
        let codes = vec!["AAPL".to_string()];
        let universe = load_universe(&stub(), &codes, d(3), d(31)).unwrap();
        assert_eq!(universe.series[0].points.len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn per_code_lines_stay_below_info() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let codes = vec!["AAPL".to_string(), "DEAD".to_string()];
        tracing::subscriber::with_default(subscriber, || {
            load_universe(&stub(), &codes, d(1), d(31)).unwrap();
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("universe loaded"));
        assert!(output.contains("skipping code"));
        assert!(!output.contains("code loaded"));
    }
}
