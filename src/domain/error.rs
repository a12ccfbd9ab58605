//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for signaltrader.
#[derive(Debug, thiserror::Error)]
pub enum SignaltraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("invalid price data for {code}: {reason}")]
    DataInvalid { code: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy policy: {name:?}")]
    InvalidPolicy { name: String },

    #[error("no price data for {code}")]
    NoData { code: String },

    /// An allocated asset has no usable price at a settlement boundary.
    #[error("missing price for allocated asset {code} on {date}")]
    MissingPrice { code: String, date: NaiveDate },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignaltraderError> for std::process::ExitCode {
    fn from(err: &SignaltraderError) -> Self {
        let code: u8 = match err {
            SignaltraderError::Io(_) | SignaltraderError::Report { .. } => 1,
            SignaltraderError::ConfigParse { .. }
            | SignaltraderError::ConfigMissing { .. }
            | SignaltraderError::ConfigInvalid { .. } => 2,
            SignaltraderError::Data { .. } | SignaltraderError::DataInvalid { .. } => 3,
            SignaltraderError::InvalidPolicy { .. } => 4,
            SignaltraderError::NoData { .. } => 5,
            SignaltraderError::MissingPrice { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
