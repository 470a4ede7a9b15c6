//! Table cleaning: header normalization and designated-column coercion.
//!
//! Cleaning never drops rows. Designated columns that are missing from the
//! table are skipped; values that cannot be converted become null.
//!
//! Designated names are compared with [`match_key`], which ignores case and
//! underscores, so a header `Transaction Month` (normalized to
//! `transaction_month`) is coerced as the `transactionmonth` date column.

mod converters;
mod names;

pub use names::{normalize_column_name, normalize_column_names};

use crate::config::{
    DEFAULT_DATE_COLUMNS, DEFAULT_NUMERIC_COLUMNS, DuplicateColumnPolicy, IngestConfig,
};
use crate::error::{IngestError, Result, ResultExt};
use crate::types::{CoercionKind, ColumnCoercion};
use crate::utils::{column_names, match_key};
use converters::{coerce_to_datetime, coerce_to_float};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Normalizes headers and coerces designated columns.
#[derive(Debug, Clone)]
pub struct Cleaner {
    date_columns: Vec<String>,
    numeric_columns: Vec<String>,
    duplicate_policy: DuplicateColumnPolicy,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self {
            date_columns: DEFAULT_DATE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            numeric_columns: DEFAULT_NUMERIC_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            duplicate_policy: DuplicateColumnPolicy::default(),
        }
    }
}

impl Cleaner {
    pub fn new(
        date_columns: Vec<String>,
        numeric_columns: Vec<String>,
        duplicate_policy: DuplicateColumnPolicy,
    ) -> Self {
        Self {
            date_columns,
            numeric_columns,
            duplicate_policy,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.date_columns.clone(),
            config.numeric_columns.clone(),
            config.duplicate_column_policy,
        )
    }

    /// Clean `df`, discarding the per-column report.
    pub fn clean(&self, df: DataFrame) -> Result<DataFrame> {
        self.clean_with_report(df).map(|(df, _)| df)
    }

    /// Clean `df` and report what happened to each designated column.
    ///
    /// Fails with [`IngestError::EmptyInput`] when the table has no rows or no
    /// columns.
    pub fn clean_with_report(
        &self,
        mut df: DataFrame,
    ) -> Result<(DataFrame, Vec<ColumnCoercion>)> {
        if df.height() == 0 || df.width() == 0 {
            return Err(IngestError::EmptyInput);
        }

        let rows_before = df.height();
        info!(
            "Cleaning {} rows x {} columns...",
            rows_before,
            df.width()
        );

        let normalized = normalize_column_names(&column_names(&df), self.duplicate_policy)?;
        df.set_column_names(normalized.iter().map(String::as_str))
            .context("Failed to rename columns")?;

        let mut report = Vec::new();
        self.coerce_all(&mut df, &self.date_columns, CoercionKind::Datetime, &mut report)?;
        self.coerce_all(&mut df, &self.numeric_columns, CoercionKind::Numeric, &mut report)?;

        debug_assert_eq!(df.height(), rows_before);
        Ok((df, report))
    }

    fn coerce_all(
        &self,
        df: &mut DataFrame,
        designated: &[String],
        kind: CoercionKind,
        report: &mut Vec<ColumnCoercion>,
    ) -> Result<()> {
        for target in designated {
            let key = match_key(target);
            let matches: Vec<String> = column_names(df)
                .into_iter()
                .filter(|name| match_key(name) == key)
                .filter(|name| !report.iter().any(|c| &c.column == name))
                .collect();

            if matches.is_empty() {
                debug!("Designated column '{}' not present, skipping", target);
                continue;
            }

            for name in matches {
                let coercion = coerce_column(df, &name, kind)
                    .context(format!("Failed to coerce column '{}'", name))?;
                if coercion.unparseable() > 0 {
                    warn!(
                        "Column '{}': {} value(s) could not be converted and were set to null",
                        name,
                        coercion.unparseable()
                    );
                }
                report.push(coercion);
            }
        }
        Ok(())
    }
}

fn coerce_column(df: &mut DataFrame, name: &str, kind: CoercionKind) -> Result<ColumnCoercion> {
    let series = df.column(name)?.as_materialized_series();
    let nulls_before = series.null_count();

    let converted = match kind {
        CoercionKind::Datetime => coerce_to_datetime(series)?,
        CoercionKind::Numeric => coerce_to_float(series)?,
    };
    let nulls_after = converted.null_count();

    df.replace(name, converted)?;
    debug!("Coerced '{}' to {:?}", name, kind);

    Ok(ColumnCoercion {
        column: name.to_string(),
        kind,
        nulls_before,
        nulls_after,
    })
}
