//! Delimiter guessing over sampled lines.

use crate::types::Delimiter;
use tracing::debug;

/// Occurrences of every candidate delimiter in `row`, in candidate order.
pub fn delimiter_counts(row: &str) -> Vec<(Delimiter, usize)> {
    Delimiter::CANDIDATES
        .into_iter()
        .map(|d| (d, row.matches(d.as_char()).count()))
        .collect()
}

/// Pick the delimiter that occurs most often in the second sampled line.
///
/// The header (line 0) is skipped because it may be shaped differently from
/// the data rows. Ties go to the candidate listed first in
/// [`Delimiter::CANDIDATES`]. With fewer than two lines, or when no candidate
/// occurs at all, the result is [`Delimiter::Pipe`].
pub fn detect_delimiter<S: AsRef<str>>(lines: &[S]) -> Delimiter {
    let Some(row) = lines.get(1) else {
        debug!("Fewer than 2 sampled lines, defaulting delimiter to '|'");
        return Delimiter::default();
    };

    let counts = delimiter_counts(row.as_ref());
    debug!("Delimiter counts in first data row: {:?}", counts);

    let mut best: Option<(Delimiter, usize)> = None;
    for (candidate, count) in counts {
        if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }

    best.map(|(d, _)| d).unwrap_or_default()
}
