//! Domain error types.

use crate::domain::universe::BasketError;

/// Top-level error type for seasontrader.
#[derive(Debug, thiserror::Error)]
pub enum SeasonalError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error(transparent)]
    Basket(#[from] BasketError),

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("no mark price for {code}")]
    NoPrice { code: String },

    #[error("insufficient capital to allocate {target:.2} to {code} at {price:.2}")]
    InsufficientCapital {
        code: String,
        price: f64,
        target: f64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SeasonalError> for std::process::ExitCode {
    fn from(err: &SeasonalError) -> Self {
        let code: u8 = match err {
            SeasonalError::Io(_) => 1,
            SeasonalError::ConfigParse { .. }
            | SeasonalError::ConfigMissing { .. }
            | SeasonalError::ConfigInvalid { .. }
            | SeasonalError::Basket(_) => 2,
            SeasonalError::Data { .. } => 3,
            SeasonalError::NoPrice { .. } | SeasonalError::InsufficientCapital { .. } => 4,
            SeasonalError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
