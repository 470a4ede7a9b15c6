//! Multi-strategy table loading.
//!
//! The file is read and decoded once; each [`TableReader`] then gets a try at
//! the decoded text, in order. The first table with more than one column
//! wins. A single-column result means the delimiter guess was wrong or the
//! parse collapsed each line into one field, so it is rejected.

mod strategies;

pub use strategies::{FlexibleCsvReader, LineSplitReader, StrictTableReader};

use crate::error::Result;
use crate::types::{Delimiter, DetectedProperties};
use crate::utils::normalize_line_endings;
use encoding_rs::Encoding;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One way of turning decoded text into a table.
pub trait TableReader: Send + Sync {
    /// Short name used in diagnostics and run summaries.
    fn name(&self) -> &'static str;

    /// Parse `text` with the first line as header.
    fn try_load(&self, text: &str, delimiter: Delimiter) -> Result<DataFrame>;
}

/// A table accepted by one of the strategies.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub data: DataFrame,
    /// Name of the strategy that produced `data`.
    pub strategy: &'static str,
}

/// Ordered list of readers tried until one yields a plausible table.
pub struct LoaderStrategy {
    readers: Vec<Box<dyn TableReader>>,
}

impl Default for LoaderStrategy {
    fn default() -> Self {
        Self::with_readers(vec![
            Box::new(FlexibleCsvReader),
            Box::new(StrictTableReader),
            Box::new(LineSplitReader),
        ])
    }
}

impl LoaderStrategy {
    /// Use a custom reader order.
    pub fn with_readers(readers: Vec<Box<dyn TableReader>>) -> Self {
        Self { readers }
    }

    pub fn reader_names(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.name()).collect()
    }

    /// Read, decode and parse `path`. `None` when every strategy fails.
    pub fn load(&self, path: &Path, properties: &DetectedProperties) -> Option<LoadedTable> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };

        let text = decode_input(&bytes, properties.encoding);
        self.load_text(&text, properties.delimiter)
    }

    /// Try every reader on already decoded text.
    pub fn load_text(&self, text: &str, delimiter: Delimiter) -> Option<LoadedTable> {
        for reader in &self.readers {
            match reader.try_load(text, delimiter) {
                Ok(df) if df.width() > 1 => {
                    info!(
                        "Loaded {} rows x {} columns with '{}' strategy",
                        df.height(),
                        df.width(),
                        reader.name()
                    );
                    return Some(LoadedTable {
                        data: df,
                        strategy: reader.name(),
                    });
                }
                Ok(df) => {
                    debug!(
                        "Strategy '{}' produced {} column(s), rejecting",
                        reader.name(),
                        df.width()
                    );
                }
                Err(e) => {
                    warn!("Error loading with strategy '{}': {}", reader.name(), e);
                }
            }
        }

        None
    }
}

/// Decode `bytes` to UTF-8, replacing malformed sequences. A byte-order mark
/// overrides `encoding` and is stripped. Line endings come out as `\n`.
pub fn decode_input(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if actual != encoding {
        debug!(
            "Byte-order mark overrides {} with {}",
            encoding.name(),
            actual.name()
        );
    }
    if had_errors {
        warn!(
            "Input contains byte sequences not valid in {}, replaced with U+FFFD",
            actual.name()
        );
    }
    normalize_line_endings(&text).into_owned()
}
