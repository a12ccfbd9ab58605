//! Configuration validation.
//!
//! Checks every run setting before any price data is fetched.

use crate::domain::error::SignaltraderError;
use crate::domain::indicator::combined::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::domain::indicator::StrategyKind;
use crate::domain::universe::{parse_codes, UniverseError};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    validate_initial_capital(config)?;
    validate_step_size(config)?;
    validate_dates(config)?;
    validate_codes(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    validate_selection_fraction(config)?;
    validate_lookback(config)?;
    validate_policy(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SignaltraderError {
    SignaltraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    if !config.has_key("backtest", "initial_capital") {
        return Err(SignaltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
        });
    }
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_step_size(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    if !config.has_key("backtest", "step_size") {
        return Err(SignaltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "step_size".to_string(),
        });
    }
    let value = config.get_int("backtest", "step_size", 0);
    if value < 1 {
        return Err(invalid(
            "backtest",
            "step_size",
            "step_size must be a whole number of at least 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub(crate) fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, SignaltraderError> {
    match config.get_string("backtest", field) {
        None => Err(SignaltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            SignaltraderError::ConfigInvalid {
                section: "backtest".to_string(),
                key: field.to_string(),
                reason: format!("invalid {field} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let Some(codes) = config.get_string("backtest", "codes") else {
        return Err(SignaltraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "codes".to_string(),
        });
    };
    match parse_codes(&codes) {
        Ok(_) => Ok(()),
        Err(UniverseError::EmptyToken) if codes.trim().is_empty() => {
            Err(SignaltraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: "codes".to_string(),
            })
        }
        Err(e) => Err(invalid("backtest", "codes", &e.to_string())),
    }
}

fn validate_policy(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    match config.get_string("strategy", "policy") {
        Some(s) if !s.trim().is_empty() => {
            s.parse::<StrategyKind>()?;
            Ok(())
        }
        _ => Err(SignaltraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "policy".to_string(),
        }),
    }
}

fn validate_selection_fraction(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let value = config.get_double(
        "strategy",
        "selection_fraction",
        crate::domain::allocation::DEFAULT_SELECTION_FRACTION,
    );
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(
            "strategy",
            "selection_fraction",
            "selection_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), SignaltraderError> {
    let value = config.get_int(
        "strategy",
        "combined_lookback_days",
        DEFAULT_LOOKBACK_DAYS,
    );
    if !(1..=MAX_LOOKBACK_DAYS).contains(&value) {
        return Err(invalid(
            "strategy",
            "combined_lookback_days",
            &format!("combined_lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}"),
        ));
    }
    Ok(())
}
