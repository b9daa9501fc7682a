//! Indicator engine: parameterized computations over a [`PriceTable`].
//!
//! Each [`Indicator`] reads only the input columns it declares and produces
//! its own output columns. Computation borrows the table immutably; appending
//! the result is a separate step, so indicators never observe each other.

use crate::config::EngineConfig;
use crate::indicators::{bollinger_bands, ema, macd, rsi_detailed, sma, stochastic};
use crate::table::{PriceTable, Series, CLOSE, HIGH, LOW};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_MA_WINDOW: usize = 20;
pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_STOCH_K_WINDOW: usize = 14;
pub const DEFAULT_STOCH_D_WINDOW: usize = 3;
pub const DEFAULT_MACD_SHORT_WINDOW: usize = 12;
pub const DEFAULT_MACD_LONG_WINDOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL_WINDOW: usize = 9;
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
pub const DEFAULT_BOLLINGER_NUM_STD: f64 = 2.0;

pub const RSI_COLUMN: &str = "RSI";
pub const STOCH_K_COLUMN: &str = "%K";
pub const STOCH_D_COLUMN: &str = "%D";
pub const MACD_COLUMN: &str = "MACD";
pub const MACD_SIGNAL_COLUMN: &str = "MACD_Signal";
pub const BOLLINGER_UPPER_COLUMN: &str = "Bollinger_Upper";
pub const BOLLINGER_LOWER_COLUMN: &str = "Bollinger_Lower";

fn default_ma_window() -> usize {
    DEFAULT_MA_WINDOW
}
fn default_rsi_window() -> usize {
    DEFAULT_RSI_WINDOW
}
fn default_k_window() -> usize {
    DEFAULT_STOCH_K_WINDOW
}
fn default_d_window() -> usize {
    DEFAULT_STOCH_D_WINDOW
}
fn default_short_window() -> usize {
    DEFAULT_MACD_SHORT_WINDOW
}
fn default_long_window() -> usize {
    DEFAULT_MACD_LONG_WINDOW
}
fn default_signal_window() -> usize {
    DEFAULT_MACD_SIGNAL_WINDOW
}
fn default_bollinger_window() -> usize {
    DEFAULT_BOLLINGER_WINDOW
}
fn default_num_std() -> f64 {
    DEFAULT_BOLLINGER_NUM_STD
}

/// One indicator family with its parameters.
///
/// Omitted parameters fall back to the documented defaults when
/// deserialized, e.g. `{"kind": "rsi"}` is a 14-row RSI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Indicator {
    /// Simple moving average of `Close` -> `SMA_{window}`
    Sma {
        #[serde(default = "default_ma_window")]
        window: usize,
    },
    /// Exponential moving average of `Close` -> `EMA_{window}`
    Ema {
        #[serde(default = "default_ma_window")]
        window: usize,
    },
    /// Relative Strength Index of `Close` -> `RSI`
    Rsi {
        #[serde(default = "default_rsi_window")]
        window: usize,
    },
    /// Stochastic oscillator of `High`/`Low`/`Close` -> `%K`, `%D`
    Stochastic {
        #[serde(default = "default_k_window")]
        k_window: usize,
        #[serde(default = "default_d_window")]
        d_window: usize,
    },
    /// MACD of `Close` -> `MACD`, `MACD_Signal`
    Macd {
        #[serde(default = "default_short_window")]
        short_window: usize,
        #[serde(default = "default_long_window")]
        long_window: usize,
        #[serde(default = "default_signal_window")]
        signal_window: usize,
    },
    /// Bollinger Bands of `Close` -> `Bollinger_Upper`, `Bollinger_Lower`
    Bollinger {
        #[serde(default = "default_bollinger_window")]
        window: usize,
        #[serde(default = "default_num_std")]
        num_std: f64,
    },
}

impl Indicator {
    pub fn sma(window: usize) -> Self {
        Indicator::Sma { window }
    }

    pub fn ema(window: usize) -> Self {
        Indicator::Ema { window }
    }

    pub fn rsi(window: usize) -> Self {
        Indicator::Rsi { window }
    }

    pub fn stochastic(k_window: usize, d_window: usize) -> Self {
        Indicator::Stochastic { k_window, d_window }
    }

    pub fn macd(short_window: usize, long_window: usize, signal_window: usize) -> Self {
        Indicator::Macd {
            short_window,
            long_window,
            signal_window,
        }
    }

    pub fn bollinger(window: usize, num_std: f64) -> Self {
        Indicator::Bollinger { window, num_std }
    }

    /// All six indicator families with their default parameters.
    pub fn defaults() -> Vec<Indicator> {
        vec![
            Indicator::sma(DEFAULT_MA_WINDOW),
            Indicator::ema(DEFAULT_MA_WINDOW),
            Indicator::rsi(DEFAULT_RSI_WINDOW),
            Indicator::stochastic(DEFAULT_STOCH_K_WINDOW, DEFAULT_STOCH_D_WINDOW),
            Indicator::macd(
                DEFAULT_MACD_SHORT_WINDOW,
                DEFAULT_MACD_LONG_WINDOW,
                DEFAULT_MACD_SIGNAL_WINDOW,
            ),
            Indicator::bollinger(DEFAULT_BOLLINGER_WINDOW, DEFAULT_BOLLINGER_NUM_STD),
        ]
    }

    /// Short identifier used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Sma { .. } => "sma",
            Indicator::Ema { .. } => "ema",
            Indicator::Rsi { .. } => "rsi",
            Indicator::Stochastic { .. } => "stochastic",
            Indicator::Macd { .. } => "macd",
            Indicator::Bollinger { .. } => "bollinger",
        }
    }

    /// Input columns this indicator reads.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Indicator::Stochastic { .. } => &[HIGH, LOW, CLOSE],
            _ => &[CLOSE],
        }
    }

    /// Names of the columns this indicator produces, in append order.
    pub fn output_columns(&self) -> Vec<String> {
        match self {
            Indicator::Sma { window } => vec![format!("SMA_{}", window)],
            Indicator::Ema { window } => vec![format!("EMA_{}", window)],
            Indicator::Rsi { .. } => vec![RSI_COLUMN.to_string()],
            Indicator::Stochastic { .. } => {
                vec![STOCH_K_COLUMN.to_string(), STOCH_D_COLUMN.to_string()]
            }
            Indicator::Macd { .. } => vec![MACD_COLUMN.to_string(), MACD_SIGNAL_COLUMN.to_string()],
            Indicator::Bollinger { .. } => vec![
                BOLLINGER_UPPER_COLUMN.to_string(),
                BOLLINGER_LOWER_COLUMN.to_string(),
            ],
        }
    }

    /// Rows of history each output column needs before its first defined
    /// value, in the same order as [`Indicator::output_columns`].
    fn required_rows(&self) -> Vec<usize> {
        match *self {
            Indicator::Sma { window } => vec![window],
            Indicator::Ema { .. } => vec![1],
            Indicator::Rsi { window } => vec![window.saturating_add(1)],
            Indicator::Stochastic { k_window, d_window } => {
                vec![k_window, k_window.saturating_add(d_window.saturating_sub(1))]
            }
            Indicator::Macd { .. } => vec![1, 1],
            Indicator::Bollinger { window, .. } => vec![window, window],
        }
    }

    /// Check the parameters.
    ///
    /// Windows must be at least 1, the Bollinger window at least 2, and the
    /// Bollinger multiplier finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: usize| -> Result<()> {
            if value == 0 {
                return Err(Error::invalid_parameter(name, value));
            }
            Ok(())
        };

        match *self {
            Indicator::Sma { window } => positive("sma.window", window),
            Indicator::Ema { window } => positive("ema.window", window),
            Indicator::Rsi { window } => positive("rsi.window", window),
            Indicator::Stochastic { k_window, d_window } => {
                positive("stochastic.k_window", k_window)?;
                positive("stochastic.d_window", d_window)
            }
            Indicator::Macd {
                short_window,
                long_window,
                signal_window,
            } => {
                positive("macd.short_window", short_window)?;
                positive("macd.long_window", long_window)?;
                positive("macd.signal_window", signal_window)
            }
            Indicator::Bollinger { window, num_std } => {
                if window < 2 {
                    return Err(Error::invalid_parameter("bollinger.window", window));
                }
                if !num_std.is_finite() || num_std < 0.0 {
                    return Err(Error::invalid_parameter("bollinger.num_std", num_std));
                }
                Ok(())
            }
        }
    }

    /// Compute this indicator's output columns without touching the table.
    pub fn compute(&self, table: &PriceTable) -> Result<Computed> {
        self.validate()?;
        for column in self.required_columns() {
            table.require(column)?;
        }

        let rows = table.len();
        tracing::debug!(indicator = self.name(), rows, "computing indicator");

        let mut warnings: Vec<Warning> = self
            .output_columns()
            .into_iter()
            .zip(self.required_rows())
            .filter(|&(_, required_rows)| rows < required_rows)
            .map(|(column, required_rows)| Warning::InsufficientHistory {
                column,
                required_rows,
                rows,
            })
            .collect();

        let close = table.require(CLOSE)?;

        let columns: Vec<(String, Series)> = match *self {
            Indicator::Sma { window } => vec![(format!("SMA_{}", window), sma(close, window))],
            Indicator::Ema { window } => vec![(format!("EMA_{}", window), ema(close, window))],
            Indicator::Rsi { window } => {
                let result = rsi_detailed(close, window);
                if result.zero_loss_rows > 0 {
                    warnings.push(Warning::DegenerateRange {
                        column: RSI_COLUMN.to_string(),
                        rows: result.zero_loss_rows,
                        policy: "zero average loss resolved as RSI = 100".to_string(),
                    });
                }
                vec![(RSI_COLUMN.to_string(), result.values)]
            }
            Indicator::Stochastic { k_window, d_window } => {
                let high = table.require(HIGH)?;
                let low = table.require(LOW)?;
                let result = stochastic(high, low, close, k_window, d_window);
                if result.degenerate_rows > 0 {
                    warnings.push(Warning::DegenerateRange {
                        column: STOCH_K_COLUMN.to_string(),
                        rows: result.degenerate_rows,
                        policy: "zero-width high/low range left undefined".to_string(),
                    });
                }
                vec![
                    (STOCH_K_COLUMN.to_string(), result.k),
                    (STOCH_D_COLUMN.to_string(), result.d),
                ]
            }
            Indicator::Macd {
                short_window,
                long_window,
                signal_window,
            } => {
                let result = macd(close, short_window, long_window, signal_window);
                vec![
                    (MACD_COLUMN.to_string(), result.macd_line),
                    (MACD_SIGNAL_COLUMN.to_string(), result.signal_line),
                ]
            }
            Indicator::Bollinger { window, num_std } => {
                let bands = bollinger_bands(close, window, num_std);
                vec![
                    (BOLLINGER_UPPER_COLUMN.to_string(), bands.upper),
                    (BOLLINGER_LOWER_COLUMN.to_string(), bands.lower),
                ]
            }
        };

        for warning in &warnings {
            tracing::warn!(indicator = self.name(), %warning, "indicator warning");
        }

        Ok(Computed { columns, warnings })
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Sma { window } => write!(f, "SMA({})", window),
            Indicator::Ema { window } => write!(f, "EMA({})", window),
            Indicator::Rsi { window } => write!(f, "RSI({})", window),
            Indicator::Stochastic { k_window, d_window } => {
                write!(f, "Stochastic({}, {})", k_window, d_window)
            }
            Indicator::Macd {
                short_window,
                long_window,
                signal_window,
            } => write!(f, "MACD({}, {}, {})", short_window, long_window, signal_window),
            Indicator::Bollinger { window, num_std } => {
                write!(f, "Bollinger({}, {})", window, num_std)
            }
        }
    }
}

/// Output of a single indicator computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    /// Output columns in append order
    pub columns: Vec<(String, Series)>,
    /// Non-fatal conditions met while computing
    pub warnings: Vec<Warning>,
}

/// A non-fatal condition reported alongside a successful computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The table is shorter than the window; the column is entirely undefined.
    InsufficientHistory {
        column: String,
        required_rows: usize,
        rows: usize,
    },
    /// Rows where a zero denominator was resolved by a fixed policy.
    DegenerateRange {
        column: String,
        rows: usize,
        policy: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InsufficientHistory {
                column,
                required_rows,
                rows,
            } => write!(
                f,
                "insufficient history for {}: needs {} rows, table has {}",
                column, required_rows, rows
            ),
            Warning::DegenerateRange {
                column,
                rows,
                policy,
            } => write!(f, "{}: {} row(s) with {}", column, rows, policy),
        }
    }
}

impl PriceTable {
    /// Compute an indicator and append its columns to this table.
    pub fn apply(&mut self, indicator: &Indicator) -> Result<Vec<Warning>> {
        let computed = indicator.compute(self)?;
        for (name, values) in computed.columns {
            self.insert_column(name, values)?;
        }
        Ok(computed.warnings)
    }
}

/// Result of running an [`IndicatorEngine`].
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Input table with all derived columns appended
    pub table: PriceTable,
    /// Warnings from every indicator, in run order
    pub warnings: Vec<Warning>,
}

/// Runs an ordered list of indicators over a table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorEngine {
    indicators: Vec<Indicator>,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(Indicator::defaults())
    }
}

impl IndicatorEngine {
    /// Create an engine for the given indicators.
    pub fn new(indicators: Vec<Indicator>) -> Self {
        Self { indicators }
    }

    /// Create an engine from the indicator list of a configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.indicators.clone())
    }

    /// The configured indicators in run order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Check every indicator's parameters and that no two indicators write
    /// the same column.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for indicator in &self.indicators {
            indicator.validate()?;
            for column in indicator.output_columns() {
                if !seen.insert(column.clone()) {
                    return Err(Error::Config(format!(
                        "column {} is produced by more than one indicator",
                        column
                    )));
                }
            }
        }
        Ok(())
    }

    /// Apply every indicator in order and return the augmented table.
    ///
    /// Nothing is computed unless all parameters are valid. A missing input
    /// column stops the run with an error naming the column.
    pub fn run(&self, mut table: PriceTable) -> Result<EngineOutput> {
        self.validate()?;

        let mut warnings = Vec::new();
        for indicator in &self.indicators {
            warnings.extend(table.apply(indicator)?);
        }

        tracing::info!(
            indicators = self.indicators.len(),
            rows = table.len(),
            warnings = warnings.len(),
            "indicators computed"
        );

        Ok(EngineOutput { table, warnings })
    }
}
