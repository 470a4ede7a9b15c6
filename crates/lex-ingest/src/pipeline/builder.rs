//! Main ingestion pipeline.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating a single ingestion run.

use crate::cleaner::Cleaner;
use crate::config::{ConfigValidationError, IngestConfig};
use crate::detect::PropertyDetector;
use crate::error::{IngestError, Result};
use crate::loader::LoaderStrategy;
use crate::persist::{Persister, TableWriter};
use crate::pipeline::progress::{
    ClosureProgressReporter, IngestStage, ProgressReporter, ProgressUpdate,
};
use crate::types::PipelineResult;
use crate::utils::column_names;
use crate::validator::validate_file;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The ingestion pipeline: validate, detect, load, clean, save.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ingest::{IngestConfig, Pipeline};
///
/// let config = IngestConfig::builder()
///     .input_path("data/raw/policies.txt")
///     .output_dir("data/processed")
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("wrote {}", result.output.path.display());
/// ```
pub struct Pipeline {
    config: IngestConfig,
    detector: PropertyDetector,
    loader: LoaderStrategy,
    cleaner: Cleaner,
    persister: Persister,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Runs may be handed to a worker thread.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run the pipeline once against the configured input.
    ///
    /// # Errors
    ///
    /// - [`IngestError::InputUnavailable`] if the input is missing or empty
    /// - [`IngestError::LoadExhausted`] if no loading strategy produced a table
    /// - [`IngestError::EmptyInput`] if the loaded table has no rows or columns
    /// - [`IngestError::PersistFailed`] if neither output format could be written
    pub fn run(&self) -> Result<PipelineResult> {
        match self.run_internal() {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Saved {} rows to {}",
                    result.output.rows,
                    result.output.path.display()
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn finish_stage(&self, stage: IngestStage) {
        self.report_progress(ProgressUpdate::new(
            stage,
            1.0,
            format!("{} done", stage.display_name()),
        ));
    }

    fn run_internal(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let input_path = &self.config.input_path;

        info!("Starting ingestion of {}", input_path.display());

        // Step 1: Validate
        self.report_progress(ProgressUpdate::new(
            IngestStage::Validating,
            0.0,
            "Checking input file...",
        ));
        if !validate_file(input_path) {
            return Err(IngestError::InputUnavailable(input_path.clone()));
        }
        self.finish_stage(IngestStage::Validating);

        // Step 2: Detect
        self.report_progress(ProgressUpdate::new(
            IngestStage::Detecting,
            0.0,
            "Detecting encoding and delimiter...",
        ));
        let properties = self.detector.detect(input_path);
        info!(
            "Detected encoding {} with delimiter '{}'",
            properties.encoding_name(),
            properties.delimiter
        );
        self.finish_stage(IngestStage::Detecting);

        // Step 3: Load
        self.report_progress(ProgressUpdate::new(
            IngestStage::Loading,
            0.0,
            "Loading table...",
        ));
        let loaded = self
            .loader
            .load(input_path, &properties)
            .ok_or_else(|| IngestError::LoadExhausted(input_path.clone()))?;
        let raw_shape = loaded.data.shape();
        self.finish_stage(IngestStage::Loading);

        // Step 4: Clean
        self.report_progress(ProgressUpdate::new(
            IngestStage::Cleaning,
            0.0,
            format!("Cleaning {} rows...", raw_shape.0),
        ));
        let (mut clean, coercions) = self.cleaner.clean_with_report(loaded.data)?;
        let clean_shape = clean.shape();
        let columns = column_names(&clean);
        self.finish_stage(IngestStage::Cleaning);

        // Step 5: Save
        self.report_progress(ProgressUpdate::new(
            IngestStage::Saving,
            0.0,
            "Saving processed table...",
        ));
        let output = self.persister.save(&mut clean)?;
        self.finish_stage(IngestStage::Saving);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Ingestion finished in {} ms: {} rows x {} columns",
            duration_ms, clean_shape.0, clean_shape.1
        );

        Ok(PipelineResult {
            input_path: input_path.clone(),
            encoding: properties.encoding_name().to_string(),
            delimiter: properties.delimiter,
            strategy: loaded.strategy.to_string(),
            raw_shape,
            clean_shape,
            columns,
            coercions,
            output,
            duration_ms,
        })
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<IngestConfig>,
    loader: Option<LoaderStrategy>,
    writers: Option<(Box<dyn TableWriter>, Box<dyn TableWriter>)>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: IngestConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default loading strategies.
    pub fn loader(mut self, loader: LoaderStrategy) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Replace the Parquet and CSV writers.
    pub fn writers(mut self, primary: Box<dyn TableWriter>, fallback: Box<dyn TableWriter>) -> Self {
        self.writers = Some((primary, fallback));
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For anything more involved, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let mut persister = Persister::from_config(&config);
        if let Some((primary, fallback)) = self.writers {
            persister = persister.with_writers(primary, fallback);
        }

        Ok(Pipeline {
            detector: PropertyDetector::from_config(&config),
            loader: self.loader.unwrap_or_default(),
            cleaner: Cleaner::from_config(&config),
            persister,
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}
