//! Delimited File Ingestion Library
//!
//! Turns a raw delimited text export of unknown encoding and delimiter into a
//! typed table on disk, built with Rust and Polars.
//!
//! # Overview
//!
//! A run goes through five stages:
//!
//! - **Validate**: the input must be an existing, non-empty regular file
//! - **Detect**: guess the text encoding and the field delimiter from a sample
//! - **Load**: decode once, then try several parsing strategies until one
//!   yields more than one column
//! - **Clean**: normalize column names and coerce the designated date and
//!   numeric columns; unparseable values become null
//! - **Save**: write Parquet, falling back to CSV if that fails
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_ingest::{IngestConfig, Pipeline};
//!
//! let config = IngestConfig::builder()
//!     .input_path("data/raw/MachineLearningRating_v3/MachineLearningRating_v3.txt")
//!     .output_dir("data/processed")
//!     .build()?;
//!
//! let result = Pipeline::builder().config(config).build()?.run()?;
//!
//! println!("Strategy: {}", result.strategy);
//! println!("Saved to: {}", result.output.path.display());
//! ```
//!
//! # Using the stages directly
//!
//! Every stage is usable on its own:
//!
//! ```rust,ignore
//! use lex_ingest::{Cleaner, LoaderStrategy, PropertyDetector, validate_file};
//!
//! if validate_file(path) {
//!     let props = PropertyDetector::default().detect(path);
//!     if let Some(loaded) = LoaderStrategy::default().load(path, &props) {
//!         let clean = Cleaner::default().clean(loaded.data)?;
//!     }
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`IngestConfig`] to change paths, sample sizes and the designated
//! columns:
//!
//! ```rust,ignore
//! use lex_ingest::{DuplicateColumnPolicy, IngestConfig};
//!
//! let config = IngestConfig::builder()
//!     .encoding_sample_bytes(64 * 1024)
//!     .date_columns(["transactionmonth", "policystartdate"])
//!     .numeric_columns(["totalpremium", "totalclaims"])
//!     .duplicate_column_policy(DuplicateColumnPolicy::Fail)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod detect;
pub mod error;
pub mod loader;
pub mod persist;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod validator;

// Re-exports for convenient access
pub use cleaner::{Cleaner, normalize_column_name, normalize_column_names};
pub use config::{ConfigValidationError, DuplicateColumnPolicy, IngestConfig, IngestConfigBuilder};
pub use detect::{PropertyDetector, detect_delimiter, detect_encoding};
pub use error::{IngestError, Result as IngestResult, ResultExt};
pub use loader::{
    FlexibleCsvReader, LineSplitReader, LoadedTable, LoaderStrategy, StrictTableReader,
    TableReader, decode_input,
};
pub use persist::{CsvTableWriter, ParquetTableWriter, Persister, TableWriter};
pub use pipeline::{
    ClosureProgressReporter, IngestStage, Pipeline, PipelineBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use types::{
    CoercionKind, ColumnCoercion, Delimiter, DetectedProperties, OutputFormat, PersistedOutput,
    PipelineResult,
};
pub use validator::validate_file;
