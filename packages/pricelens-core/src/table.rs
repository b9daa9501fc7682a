//! Time-indexed OHLCV table with append-only derived columns.

use crate::types::Bar;
use crate::{InputError, Result};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// A numeric column. `None` marks a missing input or an undefined output.
pub type Series = Vec<Option<f64>>;

pub const DATE: &str = "Date";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

/// Columns supplied by the data source. Indicators never write to these.
pub const INPUT_COLUMNS: [&str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

/// A named value column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Series,
}

/// An ordered table of daily rows keyed by date.
///
/// Dates are strictly increasing. Every column has exactly one value per date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl PriceTable {
    /// Build a table from a date index and value columns.
    ///
    /// Fails when the table is empty, the dates are not strictly increasing,
    /// a column name repeats, a column length differs from the index, or a
    /// value is infinite. NaN values are stored as missing.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Series)>) -> Result<Self> {
        if dates.is_empty() {
            return Err(InputError::EmptySeries.into());
        }
        validate_dates(&dates)?;

        let mut table = Self {
            dates,
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, values) in columns {
            if name == DATE || table.column(&name).is_some() {
                return Err(InputError::DuplicateColumn(name).into());
            }
            table.check_length(&name, &values)?;
            let values = normalize(&name, values)?;
            table.columns.push(Column { name, values });
        }
        Ok(table)
    }

    /// Build a table with the five standard OHLCV columns from complete bars.
    pub fn from_bars(bars: &[Bar]) -> Result<Self> {
        let dates = bars.iter().map(|b| b.date).collect();
        let pick = |f: fn(&Bar) -> f64| -> Series { bars.iter().map(|b| Some(f(b))).collect() };

        Self::new(
            dates,
            vec![
                (OPEN.to_string(), pick(|b| b.open)),
                (HIGH.to_string(), pick(|b| b.high)),
                (LOW.to_string(), pick(|b| b.low)),
                (CLOSE.to_string(), pick(|b| b.close)),
                (VOLUME.to_string(), pick(|b| b.volume)),
            ],
        )
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// All value columns in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order (the date index is not included).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Look up a column that a computation depends on.
    pub fn require(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| InputError::MissingColumn(name.to_string()).into())
    }

    /// Append a derived column.
    ///
    /// If a derived column with the same name already exists its values are
    /// replaced and it keeps its position. Input columns cannot be targeted.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Series) -> Result<()> {
        let name = name.into();
        if name == DATE || INPUT_COLUMNS.contains(&name.as_str()) {
            return Err(InputError::ProtectedColumn(name).into());
        }
        self.check_length(&name, &values)?;

        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == name) {
            tracing::debug!(column = %name, "replacing existing derived column");
            existing.values = values;
        } else {
            self.columns.push(Column { name, values });
        }
        Ok(())
    }

    /// The first `rows` rows as a new table (all rows if fewer exist).
    pub fn head(&self, rows: usize) -> PriceTable {
        let n = rows.min(self.len());
        PriceTable {
            dates: self.dates[..n].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[..n].to_vec(),
                })
                .collect(),
        }
    }

    fn check_length(&self, name: &str, values: &[Option<f64>]) -> Result<()> {
        if values.len() != self.dates.len() {
            return Err(InputError::LengthMismatch {
                column: name.to_string(),
                expected: self.dates.len(),
                actual: values.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// NaN is a gap, same as an absent value. Infinities are rejected.
fn normalize(name: &str, values: Series) -> Result<Series> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(x) if x.is_nan() => Ok(None),
            Some(x) if x.is_infinite() => Err(InputError::InvalidValue {
                column: name.to_string(),
                row,
                value: x.to_string(),
            }
            .into()),
            other => Ok(other),
        })
        .collect()
}

fn validate_dates(dates: &[NaiveDate]) -> Result<()> {
    for (row, pair) in dates.windows(2).enumerate() {
        match pair[1].cmp(&pair[0]) {
            Ordering::Greater => {}
            Ordering::Equal => {
                return Err(InputError::DuplicateDate {
                    row: row + 1,
                    date: pair[1].to_string(),
                }
                .into())
            }
            Ordering::Less => {
                return Err(InputError::UnorderedDates {
                    row: row + 1,
                    date: pair[1].to_string(),
                    previous: pair[0].to_string(),
                }
                .into())
            }
        }
    }
    Ok(())
}
