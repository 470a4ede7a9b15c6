use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Field separator candidates, in detection preference order.
///
/// When two candidates occur equally often in the sampled row, the one that
/// appears first in [`Delimiter::CANDIDATES`] is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Tab,
    Semicolon,
    #[default]
    Pipe,
    Space,
    Colon,
}

impl Delimiter {
    /// All candidates in tie-breaking order.
    pub const CANDIDATES: [Delimiter; 6] = [
        Delimiter::Comma,
        Delimiter::Tab,
        Delimiter::Semicolon,
        Delimiter::Pipe,
        Delimiter::Space,
        Delimiter::Colon,
    ];

    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Tab => '\t',
            Self::Semicolon => ';',
            Self::Pipe => '|',
            Self::Space => ' ',
            Self::Colon => ':',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }

    pub fn from_char(c: char) -> Option<Self> {
        Self::CANDIDATES.into_iter().find(|d| d.as_char() == c)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab => write!(f, "\\t"),
            other => write!(f, "{}", other.as_char()),
        }
    }
}

/// Encoding and delimiter guessed from a sample of the input file.
///
/// Computed once per run and dropped after the load step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedProperties {
    pub encoding: &'static Encoding,
    pub delimiter: Delimiter,
}

impl DetectedProperties {
    pub fn new(encoding: &'static Encoding, delimiter: Delimiter) -> Self {
        Self {
            encoding,
            delimiter,
        }
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

impl Default for DetectedProperties {
    fn default() -> Self {
        Self::new(UTF_8, Delimiter::Pipe)
    }
}

/// Format of a persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Parquet,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parquet => write!(f, "parquet"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// What the persister actually wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedOutput {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub rows: usize,
    /// True when the columnar write failed and the text fallback was used.
    pub used_fallback: bool,
}

/// Target type of a designated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionKind {
    Datetime,
    Numeric,
}

/// Outcome of coercing a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCoercion {
    /// Normalized column name.
    pub column: String,
    pub kind: CoercionKind,
    /// Missing values before coercion.
    pub nulls_before: usize,
    /// Missing values after coercion; the difference counts unparseable values.
    pub nulls_after: usize,
}

impl ColumnCoercion {
    pub fn unparseable(&self) -> usize {
        self.nulls_after.saturating_sub(self.nulls_before)
    }
}

/// Summary of a successful pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub input_path: PathBuf,
    /// Name of the detected text encoding.
    pub encoding: String,
    pub delimiter: Delimiter,
    /// Name of the loading strategy whose table was accepted.
    pub strategy: String,
    /// (rows, columns) of the raw table.
    pub raw_shape: (usize, usize),
    /// (rows, columns) of the cleaned table.
    pub clean_shape: (usize, usize),
    pub columns: Vec<String>,
    pub coercions: Vec<ColumnCoercion>,
    pub output: PersistedOutput,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_round_trip_chars() {
        for delimiter in Delimiter::CANDIDATES {
            assert_eq!(Delimiter::from_char(delimiter.as_char()), Some(delimiter));
        }
        assert_eq!(Delimiter::from_char('#'), None);
    }

    #[test]
    fn test_delimiter_display_escapes_tab() {
        assert_eq!(Delimiter::Tab.to_string(), "\\t");
        assert_eq!(Delimiter::Pipe.to_string(), "|");
    }

    #[test]
    fn test_default_properties() {
        let props = DetectedProperties::default();
        assert_eq!(props.encoding_name(), "UTF-8");
        assert_eq!(props.delimiter, Delimiter::Pipe);
    }

    #[test]
    fn test_coercion_unparseable_count() {
        let coercion = ColumnCoercion {
            column: "totalpremium".to_string(),
            kind: CoercionKind::Numeric,
            nulls_before: 1,
            nulls_after: 3,
        };
        assert_eq!(coercion.unparseable(), 2);
    }
}
