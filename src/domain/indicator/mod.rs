//! Signal policies and per-window snapshot computation.
//!
//! - `Policy`: which indicator function produces the raw reading
//! - `Direction`: normal or reversed (sign flip applied when the snapshot is stored)
//! - `StrategyKind`: the closed set of policy x direction variants a run selects
//! - `compute_snapshot`: evaluates the active strategy for every asset in a window

pub mod combined;
pub mod mean_deviation;
pub mod median_deviation;
pub mod trend;

use crate::domain::error::SignaltraderError;
use crate::domain::price_table::PriceTable;
use crate::domain::signal::Signal;
use crate::domain::window::Window;
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    Trend,
    MeanReversion,
    MedianReversion,
    Combined,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::Trend,
        Policy::MeanReversion,
        Policy::MedianReversion,
        Policy::Combined,
    ];

    /// Raw reading for one asset's usable closes over the policy's span.
    pub fn evaluate(self, closes: &[f64]) -> f64 {
        match self {
            Policy::Trend => trend::trend_slope(closes),
            Policy::MeanReversion => mean_deviation::mean_deviation(closes),
            Policy::MedianReversion => median_deviation::median_deviation(closes),
            Policy::Combined => combined::combined(closes),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Policy::Trend => "trend",
            Policy::MeanReversion => "mean_reversion",
            Policy::MedianReversion => "median_reversion",
            Policy::Combined => "combined",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = SignaltraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "trend" | "linear_regression" => Ok(Policy::Trend),
            "mean_reversion" | "mean_deviation" => Ok(Policy::MeanReversion),
            "median_reversion" | "median_deviation" => Ok(Policy::MedianReversion),
            "combined" | "short_and_long_term" => Ok(Policy::Combined),
            _ => Err(SignaltraderError::InvalidPolicy {
                name: s.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Normal,
    Reversed,
}

impl Direction {
    pub fn multiplier(self) -> f64 {
        match self {
            Direction::Normal => 1.0,
            Direction::Reversed => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrategyKind {
    pub policy: Policy,
    pub direction: Direction,
}

impl StrategyKind {
    pub fn new(policy: Policy, direction: Direction) -> Self {
        Self { policy, direction }
    }

    pub fn normal(policy: Policy) -> Self {
        Self::new(policy, Direction::Normal)
    }

    pub fn reversed(policy: Policy) -> Self {
        Self::new(policy, Direction::Reversed)
    }

    /// Signed reading as stored in the snapshot.
    pub fn evaluate(self, closes: &[f64]) -> f64 {
        self.direction.multiplier() * self.policy.evaluate(closes)
    }

    /// Human-readable title, e.g. "Reverse Mean Reversion".
    pub fn title(self) -> String {
        let base = match self.policy {
            Policy::Trend => "Trend",
            Policy::MeanReversion => "Mean Reversion",
            Policy::MedianReversion => "Median Reversion",
            Policy::Combined => "Combined",
        };
        match self.direction {
            Direction::Normal => base.to_string(),
            Direction::Reversed => format!("Reverse {base}"),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Normal => write!(f, "{}", self.policy),
            Direction::Reversed => write!(f, "reverse_{}", self.policy),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = SignaltraderError;

    /// Accepts canonical names (`mean_reversion`, `reverse_trend`) as well as
    /// spaced names (`reverse short and long term`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        let (direction, rest) = match normalized.strip_prefix("reverse_") {
            Some(rest) => (Direction::Reversed, rest),
            None => (Direction::Normal, normalized.as_str()),
        };
        let policy = rest.parse::<Policy>().map_err(|_| SignaltraderError::InvalidPolicy {
            name: s.trim().to_string(),
        })?;
        Ok(StrategyKind::new(policy, direction))
    }
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Tunables shared by every policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    /// Calendar days covered by the combined policy's trailing sub-window.
    pub combined_lookback_days: i64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            combined_lookback_days: combined::DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// Usable closes the policy reads for `code` in `window`.
///
/// Combined reads a trailing tail ending at the window end, which may begin
/// before the window start; a tail reaching past the calendar covers the whole
/// timeline. Every other policy reads exactly the window.
pub fn observation_span(
    table: &PriceTable,
    code: &str,
    window: &Window,
    policy: Policy,
    params: &IndicatorParams,
) -> Vec<f64> {
    match policy {
        Policy::Combined => {
            let from = u64::try_from(params.combined_lookback_days)
                .ok()
                .and_then(|days| window.end.checked_sub_days(Days::new(days)))
                .unwrap_or(NaiveDate::MIN);
            table.closes_between(code, from, window.end)
        }
        _ => table.closes(code, window.start_index, window.end_index),
    }
}

/// Evaluates `strategy` for every asset over `window`.
///
/// Assets with no usable close in their observation span are left out of the
/// snapshot. Assets are evaluated in parallel; the snapshot is only returned
/// once all of them are done.
pub fn compute_snapshot(
    table: &PriceTable,
    window: &Window,
    strategy: StrategyKind,
    params: &IndicatorParams,
) -> Signal {
    let codes: Vec<&str> = table.codes().collect();
    let readings: Vec<(&str, Option<f64>)> = codes
        .par_iter()
        .map(|&code| {
            let closes = observation_span(table, code, window, strategy.policy, params);
            if closes.is_empty() {
                (code, None)
            } else {
                (code, Some(strategy.evaluate(&closes)))
            }
        })
        .collect();

    readings
        .into_iter()
        .filter_map(|(code, reading)| reading.map(|v| (code, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::{PricePoint, PriceSeries};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(code: &str, points: &[(u32, Option<f64>)]) -> PriceSeries {
        PriceSeries::new(
            code,
            points
                .iter()
                .map(|&(day, close)| PricePoint::new(d(day), close))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn parses_canonical_names() {
        assert_eq!(
            "mean_reversion".parse::<StrategyKind>().unwrap(),
            StrategyKind::normal(Policy::MeanReversion)
        );
        assert_eq!(
            "reverse_trend".parse::<StrategyKind>().unwrap(),
            StrategyKind::reversed(Policy::Trend)
        );
    }

    #[test]
    fn parses_script_names() {
        assert_eq!(
            "linear regression".parse::<StrategyKind>().unwrap(),
            StrategyKind::normal(Policy::Trend)
        );
        assert_eq!(
            "reverse short and long term".parse::<StrategyKind>().unwrap(),
            StrategyKind::reversed(Policy::Combined)
        );
        assert_eq!(
            "  Median Reversion ".parse::<StrategyKind>().unwrap(),
            StrategyKind::normal(Policy::MedianReversion)
        );
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "momentum".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, SignaltraderError::InvalidPolicy { name } if name == "momentum"));
        assert!("reverse".parse::<StrategyKind>().is_err());
        assert!("".parse::<Policy>().is_err());
    }

    #[test]
    fn display_round_trips_every_variant() {
        for policy in Policy::ALL {
            for kind in [StrategyKind::normal(policy), StrategyKind::reversed(policy)] {
                assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
            }
        }
    }

    #[test]
    fn titles() {
        assert_eq!(StrategyKind::normal(Policy::Trend).title(), "Trend");
        assert_eq!(
            StrategyKind::reversed(Policy::MeanReversion).title(),
            "Reverse Mean Reversion"
        );
    }

    #[test]
    fn reversed_negates_reading() {
        let closes = [10.0, 11.0, 9.0, 8.0];
        for policy in Policy::ALL {
            let normal = StrategyKind::normal(policy).evaluate(&closes);
            let reversed = StrategyKind::reversed(policy).evaluate(&closes);
            assert_eq!(normal, -reversed);
        }
    }

    #[test]
    fn snapshot_omits_assets_without_observations() {
        let table = PriceTable::from_series(&[
            series("AAA", &[(1, Some(10.0)), (2, Some(11.0)), (3, Some(12.0))]),
            series("BBB", &[(1, None), (2, None), (3, Some(5.0))]),
        ]);
        let window = Window::new(&table, 0, 1).unwrap();

        let snapshot = compute_snapshot(
            &table,
            &window,
            StrategyKind::normal(Policy::Trend),
            &IndicatorParams::default(),
        );

        assert_eq!(snapshot.len(), 1);
        assert_relative_eq!(snapshot.get("AAA").unwrap(), 1.0 / 11.0, epsilon = 1e-12);
        assert_eq!(snapshot.get("BBB"), None);
    }

    #[test]
    fn snapshot_keeps_single_observation_as_neutral() {
        let table = PriceTable::from_series(&[
            series("AAA", &[(1, Some(10.0)), (2, Some(11.0))]),
            series("BBB", &[(1, None), (2, Some(5.0))]),
        ]);
        let window = Window::new(&table, 0, 1).unwrap();

        let snapshot = compute_snapshot(
            &table,
            &window,
            StrategyKind::normal(Policy::Trend),
            &IndicatorParams::default(),
        );

        assert_eq!(snapshot.get("BBB"), Some(0.0));
    }

    #[test]
    fn combined_reads_trailing_calendar_tail() {
        // Window covers days 9..=10 only; the 5-day tail reaches back to day 5.
        let table = PriceTable::from_series(&[series(
            "AAA",
            &[
                (1, Some(1.0)),
                (5, Some(10.0)),
                (8, Some(11.0)),
                (9, Some(12.0)),
                (10, Some(13.0)),
            ],
        )]);
        let window = Window::new(&table, 3, 1).unwrap();
        assert_eq!(window.start, d(9));
        assert_eq!(window.end, d(10));

        let params = IndicatorParams::default();
        let closes = observation_span(&table, "AAA", &window, Policy::Combined, &params);
        assert_eq!(closes, vec![10.0, 11.0, 12.0, 13.0]);

        let plain = observation_span(&table, "AAA", &window, Policy::MeanReversion, &params);
        assert_eq!(plain, vec![12.0, 13.0]);
    }

    #[test]
    fn combined_lookback_is_configurable() {
        let table = PriceTable::from_series(&[series(
            "AAA",
            &[(1, Some(1.0)), (5, Some(10.0)), (9, Some(12.0)), (10, Some(13.0))],
        )]);
        let window = Window::new(&table, 2, 1).unwrap();
        let params = IndicatorParams {
            combined_lookback_days: 1,
        };

        let closes = observation_span(&table, "AAA", &window, Policy::Combined, &params);
        assert_eq!(closes, vec![12.0, 13.0]);
    }

    #[test]
    fn combined_lookback_beyond_calendar_reads_whole_history() {
        let table = PriceTable::from_series(&[series(
            "AAA",
            &[(1, Some(1.0)), (5, Some(10.0)), (9, Some(12.0)), (10, Some(13.0))],
        )]);
        let window = Window::new(&table, 2, 1).unwrap();
        let params = IndicatorParams {
            combined_lookback_days: 100_000_000,
        };

        let closes = observation_span(&table, "AAA", &window, Policy::Combined, &params);
        assert_eq!(closes, vec![1.0, 10.0, 12.0, 13.0]);

        let params = IndicatorParams {
            combined_lookback_days: i64::MAX,
        };
        let snapshot = compute_snapshot(&table, &window, StrategyKind::normal(Policy::Combined), &params);
        assert!(snapshot.get("AAA").is_some());
    }
}
