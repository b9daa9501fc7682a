//! Interface to an external price forecaster.
//!
//! The forecaster is not part of the indicator engine. It consumes a plain
//! `{date, close}` series and returns `{date, forecast, lower, upper}` rows.
//! This module only shapes the input and defines the contract.

use crate::table::{PriceTable, CLOSE, DATE};
use crate::types::ForecastPoint;
use crate::Result;
use chrono::NaiveDate;
use std::io::Write;

/// A forecasting model fitted on a date/price series.
pub trait Forecaster {
    /// Forecast `horizon` days past the end of `history`.
    ///
    /// `history` is in strictly increasing date order and has no gaps in
    /// value (rows with missing prices are already dropped).
    fn forecast(&self, history: &[(NaiveDate, f64)], horizon: usize) -> Result<Vec<ForecastPoint>>;
}

impl PriceTable {
    /// The `{date, close}` series a forecaster consumes.
    ///
    /// Rows whose close is missing are dropped. Fails if the table has no
    /// `Close` column.
    pub fn forecast_input(&self) -> Result<Vec<(NaiveDate, f64)>> {
        let close = self.require(CLOSE)?;
        Ok(self
            .dates()
            .iter()
            .zip(close)
            .filter_map(|(&date, &value)| value.map(|v| (date, v)))
            .collect())
    }
}

/// Write a forecaster input series as a two-column `Date,Close` CSV.
pub fn write_forecast_input<W: Write>(series: &[(NaiveDate, f64)], sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record([DATE, CLOSE])?;
    for (date, value) in series {
        writer.write_record([date.format("%Y-%m-%d").to_string(), value.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::test_support::{dates, table_from_series};
    use crate::table::OPEN;
    use crate::{Error, InputError};
    use chrono::Duration;

    /// Flat forecaster with a fixed-width band around the last price.
    struct LastValue {
        band: f64,
    }

    impl Forecaster for LastValue {
        fn forecast(
            &self,
            history: &[(NaiveDate, f64)],
            horizon: usize,
        ) -> Result<Vec<ForecastPoint>> {
            let Some(&(last_date, last)) = history.last() else {
                return Err(InputError::EmptySeries.into());
            };
            Ok((1..=horizon)
                .map(|step| ForecastPoint {
                    date: last_date + Duration::days(step as i64),
                    forecast: last,
                    lower: last - self.band,
                    upper: last + self.band,
                })
                .collect())
        }
    }

    #[test]
    fn test_forecast_input_drops_missing_closes() {
        let table = table_from_series(vec![Some(10.0), None, Some(12.0)]);
        let series = table.forecast_input().unwrap();

        let d = dates(3);
        assert_eq!(series, vec![(d[0], 10.0), (d[2], 12.0)]);
    }

    #[test]
    fn test_forecast_input_requires_close() {
        let table = PriceTable::new(dates(2), vec![(OPEN.to_string(), vec![Some(1.0); 2])]).unwrap();
        assert!(matches!(
            table.forecast_input(),
            Err(Error::Input(InputError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_forecaster_contract() {
        let table = table_from_series(vec![Some(10.0), Some(11.0), None]);
        let history = table.forecast_input().unwrap();

        let points = LastValue { band: 0.5 }.forecast(&history, 2).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, dates(3)[2]);
        assert_eq!(points[0].forecast, 11.0);
        assert!(points.iter().all(|p| p.lower <= p.forecast && p.forecast <= p.upper));
    }

    #[test]
    fn test_write_forecast_input() {
        let d = dates(2);
        let mut buffer = Vec::new();
        write_forecast_input(&[(d[0], 10.0), (d[1], 10.5)], &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "Date,Close\n2024-01-01,10\n2024-01-02,10.5\n");
    }
}
