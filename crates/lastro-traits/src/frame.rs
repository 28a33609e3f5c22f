//! Conversion of engine series into polars `DataFrame`s.
//!
//! Series are computed on typed rows; polars is the hand-off format to
//! persistence and downstream consumers. Column builders here keep the
//! conventions uniform: dates are polars `Date`, non-finite floats are null.

use crate::{Date, Result};
use polars::prelude::*;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Types that can be rendered as a `DataFrame`.
pub trait ToFrame {
    /// Builds a frame with one row per element of the series.
    fn to_frame(&self) -> Result<DataFrame>;
}

/// Converts a date to polars' physical `Date` representation (days since epoch).
pub fn date_to_days(date: Date) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Converts polars' physical `Date` value back to a calendar date.
pub fn days_to_date(days: i32) -> Option<Date> {
    Date::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Builds a polars `Date` column.
pub fn date_column(name: &str, dates: impl Iterator<Item = Date>) -> Result<Column> {
    let days: Vec<i32> = dates.map(date_to_days).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

/// Builds a `Float64` column, mapping NaN and infinities to null.
pub fn float_column(name: &str, values: impl Iterator<Item = f64>) -> Column {
    let values: Vec<Option<f64>> = values.map(|v| v.is_finite().then_some(v)).collect();
    Column::new(name.into(), values)
}

/// Builds a string column.
pub fn str_column<'a>(name: &str, values: impl Iterator<Item = &'a str>) -> Column {
    let values: Vec<&str> = values.collect();
    Column::new(name.into(), values)
}

/// Reads a `Date` or `Datetime` column as calendar dates.
pub fn column_dates(column: &Column) -> Result<Vec<Option<Date>>> {
    let dates = column.cast(&DataType::Date)?;
    Ok(dates
        .as_materialized_series()
        .date()?
        .physical()
        .into_iter()
        .map(|d: Option<i32>| d.and_then(days_to_date))
        .collect())
}
