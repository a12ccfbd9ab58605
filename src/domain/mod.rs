//! Core domain types and logic.

pub mod allocation;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod order_stats;
pub mod portfolio;
pub mod price;
pub mod price_table;
pub mod returns;
pub mod signal;
pub mod universe;
pub mod window;
