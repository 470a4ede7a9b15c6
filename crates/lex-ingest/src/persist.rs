//! Writing the cleaned table to disk.
//!
//! Parquet is tried first. If that write fails for any reason the table is
//! written as CSV next to it instead, and only a failure of that second write
//! is reported as an error.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result, ResultExt};
use crate::types::{OutputFormat, PersistedOutput};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One output format.
pub trait TableWriter: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// Write `df` to `path`, replacing any existing file.
    fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()>;
}

/// Snappy-compressed Parquet.
pub struct ParquetTableWriter;

impl TableWriter for ParquetTableWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Parquet
    }

    fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        ParquetWriter::new(&mut file)
            .with_compression(ParquetCompression::Snappy)
            .finish(df)?;
        Ok(())
    }
}

/// Comma-separated text with a header row.
pub struct CsvTableWriter;

impl TableWriter for CsvTableWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)?;
        Ok(())
    }
}

/// Saves a table with a primary format and a fallback format.
pub struct Persister {
    output_dir: PathBuf,
    primary_path: PathBuf,
    fallback_path: PathBuf,
    primary: Box<dyn TableWriter>,
    fallback: Box<dyn TableWriter>,
}

impl Persister {
    /// Parquet to `config.parquet_path()`, CSV to `config.csv_path()`.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            primary_path: config.parquet_path(),
            fallback_path: config.csv_path(),
            primary: Box::new(ParquetTableWriter),
            fallback: Box::new(CsvTableWriter),
        }
    }

    /// Swap the writers, keeping the configured paths.
    pub fn with_writers(
        mut self,
        primary: Box<dyn TableWriter>,
        fallback: Box<dyn TableWriter>,
    ) -> Self {
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }

    /// Write `df`, creating the output directory first.
    pub fn save(&self, df: &mut DataFrame) -> Result<PersistedOutput> {
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory {}",
            self.output_dir.display()
        ))?;

        match self.primary.write(df, &self.primary_path) {
            Ok(()) => {
                info!(
                    "Saved {} rows as {} to {}",
                    df.height(),
                    self.primary.format(),
                    self.primary_path.display()
                );
                return Ok(PersistedOutput {
                    path: self.primary_path.clone(),
                    format: self.primary.format(),
                    rows: df.height(),
                    used_fallback: false,
                });
            }
            Err(e) => {
                warn!(
                    "Could not save {} ({}), falling back to {}",
                    self.primary.format(),
                    e,
                    self.fallback.format()
                );
                remove_partial(&self.primary_path);
            }
        }

        self.fallback
            .write(df, &self.fallback_path)
            .map_err(|e| IngestError::PersistFailed {
                path: self.fallback_path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "Saved {} rows as {} to {}",
            df.height(),
            self.fallback.format(),
            self.fallback_path.display()
        );
        Ok(PersistedOutput {
            path: self.fallback_path.clone(),
            format: self.fallback.format(),
            rows: df.height(),
            used_fallback: true,
        })
    }
}

fn remove_partial(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            debug!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}
