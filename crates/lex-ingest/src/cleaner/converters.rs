//! Total type coercions: every value either converts or becomes null.

use crate::error::Result;
use crate::utils::{is_error_marker, is_numeric_dtype, is_temporal_dtype, parse_numeric_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Target dtype for date-time coercion.
pub(crate) const DATETIME_DTYPE: DataType = DataType::Datetime(TimeUnit::Milliseconds, None);

static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("Invalid regex: YYYY-MM"));
static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/](\d{4})$").expect("Invalid regex: MM/YYYY"));

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Parse a single date or date-time string.
///
/// Month-only values (`2023-01`, `6/2002`) resolve to the first of the month.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_error_marker(trimmed) {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(caps) = YEAR_MONTH.captures(trimmed) {
        return first_of_month(&caps[1], &caps[2]);
    }
    if let Some(caps) = MONTH_YEAR.captures(trimmed) {
        return first_of_month(&caps[2], &caps[1]);
    }

    None
}

fn first_of_month(year: &str, month: &str) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
}

/// Coerce a column to `Datetime(ms)`. Unparseable values become null.
///
/// A column that already holds `Datetime(ms)` is returned unchanged; other
/// temporal dtypes are cast.
pub(crate) fn coerce_to_datetime(series: &Series) -> Result<Series> {
    if series.dtype() == &DATETIME_DTYPE {
        return Ok(series.clone());
    }
    if is_temporal_dtype(series.dtype()) {
        return Ok(series.cast(&DATETIME_DTYPE)?);
    }

    let as_string = series.cast(&DataType::String)?;
    let millis: Vec<Option<i64>> = as_string
        .str()?
        .into_iter()
        .map(|opt| {
            opt.and_then(parse_datetime)
                .map(|dt| dt.and_utc().timestamp_millis())
        })
        .collect();

    Ok(Series::new(series.name().clone(), millis).cast(&DATETIME_DTYPE)?)
}

/// Coerce a column to `Float64`. Unparseable values become null.
pub(crate) fn coerce_to_float(series: &Series) -> Result<Series> {
    if series.dtype() == &DataType::Float64 {
        return Ok(series.clone());
    }
    if is_numeric_dtype(series.dtype()) || series.dtype() == &DataType::Boolean {
        return Ok(series.cast(&DataType::Float64)?);
    }

    let as_string = series.cast(&DataType::String)?;
    let values: Vec<Option<f64>> = as_string
        .str()?
        .into_iter()
        .map(|opt| opt.and_then(parse_numeric_string))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}
