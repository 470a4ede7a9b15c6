//! Encoding and delimiter detection.
//!
//! Detection is best-effort: any failure is logged and the defaults
//! (UTF-8, `|`) are used, so this stage never stops the pipeline.

mod delimiter;
mod encoding;

pub use delimiter::{delimiter_counts, detect_delimiter};
pub use encoding::detect_encoding;

use crate::config::IngestConfig;
use crate::error::Result;
use crate::types::DetectedProperties;
use crate::utils::normalize_line_endings;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Upper bound on bytes decoded when sampling lines for delimiter detection.
const LINE_SAMPLE_BYTES: u64 = 1 << 20;

/// Samples the head of a file to guess its encoding and delimiter.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDetector {
    sample_bytes: usize,
    sample_lines: usize,
}

impl Default for PropertyDetector {
    fn default() -> Self {
        Self {
            sample_bytes: 10_000,
            sample_lines: 5,
        }
    }
}

impl PropertyDetector {
    pub fn new(sample_bytes: usize, sample_lines: usize) -> Self {
        Self {
            sample_bytes,
            sample_lines,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.encoding_sample_bytes, config.delimiter_sample_lines)
    }

    /// Guess encoding and delimiter, falling back to (UTF-8, `|`) on any error.
    pub fn detect(&self, path: &Path) -> DetectedProperties {
        match self.try_detect(path) {
            Ok(properties) => properties,
            Err(e) => {
                warn!("Warning: Could not detect file properties ({}), using defaults", e);
                DetectedProperties::default()
            }
        }
    }

    fn try_detect(&self, path: &Path) -> Result<DetectedProperties> {
        let head = read_head(path, LINE_SAMPLE_BYTES.max(self.sample_bytes as u64))?;

        let sample = &head[..head.len().min(self.sample_bytes)];
        let encoding = detect_encoding(sample);

        let (text, _, had_errors) = encoding.decode(&head);
        if had_errors {
            debug!(
                "Sample contains bytes not valid in {}, replaced for delimiter detection",
                encoding.name()
            );
        }

        let text = normalize_line_endings(&text);
        let lines: Vec<&str> = text.lines().take(self.sample_lines).collect();
        let delimiter = detect_delimiter(&lines);

        Ok(DetectedProperties::new(encoding, delimiter))
    }
}

fn read_head(path: &Path, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    File::open(path)?.take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}
