//! Pricelens Core - Technical indicator engine for daily OHLCV data.
//!
//! This crate turns a time-indexed price table into derived signal series:
//!
//! - **Moving averages**: SMA, EMA
//! - **Momentum**: RSI, Stochastic Oscillator (%K / %D), MACD
//! - **Volatility**: Bollinger Bands
//! - **Table I/O**: delimited-text load and save with explicit missing values
//!
//! # Example
//!
//! ```rust,no_run
//! use pricelens_core::{io, Indicator, IndicatorEngine};
//!
//! let table = io::read_csv("data/IOC.NS.csv")?;
//! let engine = IndicatorEngine::new(vec![Indicator::sma(50), Indicator::rsi(14)]);
//! let output = engine.run(table)?;
//!
//! for warning in &output.warnings {
//!     println!("{}", warning);
//! }
//! io::write_csv(&output.table, "data/processed_stock_data/IOC.NS.csv")?;
//! # Ok::<(), pricelens_core::Error>(())
//! ```

pub mod config;
pub mod engine;
pub mod forecast;
pub mod indicators;
pub mod io;
#[cfg(feature = "cli")]
pub mod logging;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{EngineOutput, Indicator, IndicatorEngine, Warning};
pub use forecast::Forecaster;
pub use table::{PriceTable, Series};
pub use types::{ApiResponse, Bar, ForecastPoint};

/// Problems with the shape or content of an input table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("input table has no rows")]
    EmptySeries,

    #[error("dates are not in chronological order at row {row}: {date} follows {previous}")]
    UnorderedDates {
        row: usize,
        date: String,
        previous: String,
    },

    #[error("duplicate date at row {row}: {date}")]
    DuplicateDate { row: usize, date: String },

    #[error("unparseable date at row {row}: {value:?}")]
    InvalidDate { row: usize, value: String },

    #[error("non-numeric value in column {column} at row {row}: {value:?}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column {0} is an input column and cannot be overwritten")]
    ProtectedColumn(String),
}

/// Error types for pricelens-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_parameter(name: &str, value: impl ToString) -> Self {
        Error::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Result type for pricelens-core operations.
pub type Result<T> = std::result::Result<T, Error>;
