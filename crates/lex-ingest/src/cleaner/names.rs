//! Column name normalization.

use crate::config::DuplicateColumnPolicy;
use crate::error::{IngestError, Result};
use std::collections::HashSet;
use tracing::warn;

/// Trim, lowercase, and replace every space with an underscore.
///
/// Only the space character is replaced; tabs and other whitespace inside the
/// name are left alone.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Normalize every name, resolving collisions according to `policy`.
///
/// With [`DuplicateColumnPolicy::Suffix`] the first occurrence keeps the plain
/// name and later ones get the smallest `_N` suffix not already taken by any
/// other normalized name.
pub fn normalize_column_names(
    names: &[String],
    policy: DuplicateColumnPolicy,
) -> Result<Vec<String>> {
    let normalized: Vec<String> = names.iter().map(|n| normalize_column_name(n)).collect();
    let reserved: HashSet<&str> = normalized.iter().map(String::as_str).collect();

    let mut used: HashSet<String> = HashSet::with_capacity(normalized.len());
    let mut result = Vec::with_capacity(normalized.len());

    for (original, name) in names.iter().zip(&normalized) {
        if used.insert(name.clone()) {
            result.push(name.clone());
            continue;
        }

        if policy == DuplicateColumnPolicy::Fail {
            return Err(IngestError::DuplicateColumn {
                original: original.clone(),
                normalized: name.clone(),
            });
        }

        let mut n = 1;
        let unique = loop {
            let candidate = format!("{}_{}", name, n);
            if !reserved.contains(candidate.as_str()) && !used.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        warn!(
            "Column '{}' normalizes to duplicate name '{}', renamed to '{}'",
            original, name, unique
        );
        used.insert(unique.clone());
        result.push(unique);
    }

    Ok(result)
}
