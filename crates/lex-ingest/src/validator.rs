//! Input file precondition check.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Return `true` if `path` is an existing regular file with at least one byte.
///
/// A missing or empty file is a normal, reported outcome: this never fails.
pub fn validate_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => {
            warn!("Error: {} is not a regular file", path.display());
            false
        }
        Ok(meta) if meta.len() == 0 => {
            warn!("Error: File not found or empty at {}", path.display());
            false
        }
        Ok(meta) => {
            debug!("Input file {} has {} bytes", path.display(), meta.len());
            true
        }
        Err(e) => {
            warn!("Error: File not found or empty at {} ({})", path.display(), e);
            false
        }
    }
}
