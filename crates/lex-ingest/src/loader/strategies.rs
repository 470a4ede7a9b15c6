//! Built-in [`TableReader`] implementations.
//!
//! All readers keep every column as `String`; typing is the cleaner's job.

use super::TableReader;
use crate::error::Result;
use crate::types::Delimiter;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;

/// Quote-aware CSV parse that tolerates ragged rows.
///
/// Rows with extra fields are truncated to the header width; short rows are
/// padded with nulls.
pub struct FlexibleCsvReader;

impl TableReader for FlexibleCsvReader {
    fn name(&self) -> &'static str {
        "flexible_csv"
    }

    fn try_load(&self, text: &str, delimiter: Delimiter) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(delimiter.as_byte())
                    .with_quote_char(Some(b'"'))
                    .with_missing_is_null(true)
                    .with_truncate_ragged_lines(true),
            )
            .into_reader_with_file_handle(Cursor::new(text.to_owned()))
            .finish()?;
        Ok(df)
    }
}

/// Plain delimiter-table parse: no quote handling, every row must match the
/// header width.
pub struct StrictTableReader;

impl TableReader for StrictTableReader {
    fn name(&self) -> &'static str {
        "strict_table"
    }

    fn try_load(&self, text: &str, delimiter: Delimiter) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(delimiter.as_byte())
                    .with_quote_char(None)
                    .with_missing_is_null(true),
            )
            .into_reader_with_file_handle(Cursor::new(text.to_owned()))
            .finish()?;
        Ok(df)
    }
}

/// Last-resort line-by-line split after collapsing stray quoting.
///
/// Blank lines are dropped, fields are split on the raw delimiter with no
/// quote awareness, short rows are padded and long rows truncated.
pub struct LineSplitReader;

impl TableReader for LineSplitReader {
    fn name(&self) -> &'static str {
        "line_split"
    }

    fn try_load(&self, text: &str, delimiter: Delimiter) -> Result<DataFrame> {
        let cleaned = clean_content(text);
        let mut lines = cleaned.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| PolarsError::NoData("input has no header line".into()))?;
        let headers = header_names(header_line, delimiter.as_char());
        let width = headers.len();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for line in lines {
            let mut fields = line.split(delimiter.as_char());
            for column in columns.iter_mut() {
                let value = fields
                    .next()
                    .map(strip_quotes)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                column.push(value);
            }
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name.into(), values))
            .collect();

        Ok(DataFrame::new(columns)?)
    }
}

/// Collapse doubled and tripled quotes and drop blank lines.
fn clean_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_quotes(field: &str) -> &str {
    let trimmed = field.trim_end_matches('\r');
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Header fields with blanks named `column_N` and repeats made unique the
/// same way the polars CSV reader does it.
fn header_names(line: &str, delimiter: char) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    line.split(delimiter)
        .enumerate()
        .map(|(i, raw)| {
            let name = strip_quotes(raw);
            let name = if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name.to_string()
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}_duplicated_{}", name, *count - 1)
            };
            *count += 1;
            unique
        })
        .collect()
}
