//! Core data types shared by the engine, the CLI and collaborators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    /// Trading date
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded volume (carried through, never used by indicators)
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// One row returned by an external forecaster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    /// Forecast date
    pub date: NaiveDate,
    /// Point forecast
    pub forecast: f64,
    /// Lower bound of the uncertainty interval
    pub lower: f64,
    /// Upper bound of the uncertainty interval
    pub upper: f64,
}

/// API response wrapper for CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
