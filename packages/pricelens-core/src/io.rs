//! Delimited-text persistence for [`PriceTable`].
//!
//! Files carry a header row with a `Date` column plus any number of numeric
//! columns. Empty cells and the usual NaN spellings load as missing values,
//! and undefined values are written back as empty cells.

use crate::table::{PriceTable, Series, DATE};
use crate::{InputError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a price table from a CSV file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<PriceTable> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = read_from(BufReader::new(file))?;

    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "loaded price table"
    );
    Ok(table)
}

/// Load a price table from any CSV source.
///
/// The `Date` column may sit at any position. Rows must already be in
/// strictly increasing date order.
pub fn read_from<R: Read>(source: R) -> Result<PriceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == DATE)
        .ok_or_else(|| InputError::MissingColumn(DATE.to_string()))?;

    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != date_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut dates = Vec::new();
    let mut columns: Vec<Series> = vec![Vec::new(); names.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| InputError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;
        dates.push(date);

        let values = record
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != date_idx)
            .map(|(_, field)| field);
        for ((name, column), field) in names.iter().zip(columns.iter_mut()).zip(values) {
            let value = parse_value(field).ok_or_else(|| InputError::InvalidValue {
                column: name.clone(),
                row,
                value: field.to_string(),
            })?;
            column.push(value);
        }
    }

    PriceTable::new(dates, names.into_iter().zip(columns).collect())
}

/// Save a price table to a CSV file, creating parent folders.
pub fn write_csv(table: &PriceTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_to(table, BufWriter::new(file))?;

    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "saved price table"
    );
    Ok(())
}

/// Write a price table as CSV: `Date` first, then every column in table order.
pub fn write_to<W: Write>(table: &PriceTable, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);

    writer.write_record(std::iter::once(DATE).chain(table.column_names()))?;

    for (row, date) in table.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(table.columns().len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        for column in table.columns() {
            record.push(format_value(column.values[row]));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` with or without a UTC offset,
/// and RFC 3339. Timestamps keep the calendar date in their own offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z")
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse a numeric cell. `Some(None)` is a missing value, `None` is garbage.
/// Infinities count as garbage.
fn parse_value(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if is_missing(raw) {
        return Some(None);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(Some)
}

fn is_missing(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "" | "nan" | "na" | "n/a" | "null" | "none"
    )
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
