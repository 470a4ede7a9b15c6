//! Error types for the ingestion pipeline.
//!
//! Only pipeline-level preconditions surface as errors. Lower layers
//! (detection, per-strategy parsing, per-value coercion, columnar writes)
//! recover locally and log instead.
//!
//! Errors serialize as `{code, message}` so a run outcome can be emitted as
//! JSON by the CLI.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input file is missing, not a regular file, or empty.
    #[error("Input file not found or empty: {}", .0.display())]
    InputUnavailable(PathBuf),

    /// Every loading strategy failed or produced a single-column table.
    #[error("All loading strategies exhausted for {}", .0.display())]
    LoadExhausted(PathBuf),

    /// The table handed to the cleaner has no rows or no columns.
    #[error("No data provided for cleaning")]
    EmptyInput,

    /// Two source columns normalize to the same name and the policy forbids suffixing.
    #[error("Column '{original}' normalizes to '{normalized}', which already exists")]
    DuplicateColumn { original: String, normalized: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Both the columnar write and the text fallback failed.
    #[error("Failed to persist table to {}: {reason}", .path.display())]
    PersistFailed { path: PathBuf, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<IngestError>,
    },
}

impl IngestError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        IngestError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputUnavailable(_) => "INPUT_UNAVAILABLE",
            Self::LoadExhausted(_) => "LOAD_EXHAUSTED",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::DuplicateColumn { .. } => "DUPLICATE_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::PersistFailed { .. } => "PERSIST_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the run stopped because there was nothing usable to ingest,
    /// as opposed to an unexpected failure.
    pub fn is_input_problem(&self) -> bool {
        match self {
            Self::InputUnavailable(_) | Self::LoadExhausted(_) | Self::EmptyInput => true,
            Self::WithContext { source, .. } => source.is_input_problem(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for IngestError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}

impl Serialize for IngestError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("IngestError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IngestError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IngestError::Io(e).with_context(context))
    }
}
