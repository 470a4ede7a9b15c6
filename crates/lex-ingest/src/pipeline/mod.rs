//! Pipeline module.
//!
//! This module provides the ingestion pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, IngestStage, ProgressReporter, ProgressUpdate};
