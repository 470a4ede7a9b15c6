//! Shared helpers for loading and cleaning.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::borrow::Cow;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date or datetime type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Column names of a frame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
///
/// Commas are handled separately: they are only removed from a valid
/// thousands grouping.
pub const NUMERIC_FORMAT_CHARS: [char; 5] = ['$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a", "nan",
];

/// `1,234` or `-12,345,678.90`: comma-grouped digits with an optional fraction.
static THOUSANDS_GROUPING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: thousands grouping")
});

/// Clean a string for numeric parsing by removing formatting characters.
///
/// Commas are dropped only when they form a thousands grouping, so a
/// decimal comma such as `2,5` is kept and fails to parse.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    if THOUSANDS_GROUPING.is_match(&result) {
        result = result.replace(',', "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a finite `f64`.
///
/// Formatting characters are stripped first. Empty strings, error markers and
/// values that parse to infinity or NaN yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_error_marker(trimmed) {
        return None;
    }
    let cleaned = clean_numeric_string(trimmed);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rewrite `\r\n` and bare `\r` line endings as `\n`.
pub fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Key used to match a normalized column name against a designated name:
/// lower-cased with underscores removed, so `transaction_month` and
/// `transactionmonth` compare equal.
pub fn match_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
