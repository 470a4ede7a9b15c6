//! Configuration types for the ingestion pipeline.
//!
//! Paths that used to be fixed are injected here so the pipeline can run
//! against temporary directories. Use [`IngestConfig::builder()`] for a
//! fluent setup; every field has a default matching the production layout.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the raw input file.
pub const DEFAULT_INPUT_PATH: &str =
    "data/raw/MachineLearningRating_v3/MachineLearningRating_v3.txt";

/// Default directory for processed output.
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// Columns coerced to date-times, matched against normalized names.
pub const DEFAULT_DATE_COLUMNS: [&str; 2] = ["transactionmonth", "vehicleintroductiondate"];

/// Columns coerced to floating point, matched against normalized names.
pub const DEFAULT_NUMERIC_COLUMNS: [&str; 4] = [
    "capital_outstanding",
    "totalpremium",
    "totalclaims",
    "customvalueestimate",
];

/// What to do when two source columns normalize to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DuplicateColumnPolicy {
    /// Keep every column; later duplicates get `_1`, `_2`, ... appended.
    #[default]
    Suffix,
    /// Stop cleaning with [`IngestError::DuplicateColumn`](crate::IngestError::DuplicateColumn).
    Fail,
}

/// Configuration for the ingestion pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ingest::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .input_path("data/raw/policies.txt")
///     .output_dir("data/processed")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// File to ingest.
    pub input_path: PathBuf,

    /// Directory receiving the processed table. Created if missing.
    pub output_dir: PathBuf,

    /// File name of the Parquet output inside `output_dir`.
    /// Default: "insurance_data.parquet"
    pub parquet_file_name: String,

    /// File name of the CSV fallback inside `output_dir`.
    /// Default: "insurance_data.csv"
    pub csv_file_name: String,

    /// Number of leading bytes fed to the charset detector.
    /// Default: 10,000
    pub encoding_sample_bytes: usize,

    /// Number of leading lines sampled for delimiter detection.
    /// Must be at least 2 because the second line is the one counted.
    /// Default: 5
    pub delimiter_sample_lines: usize,

    /// Normalized names of columns coerced to date-times.
    pub date_columns: Vec<String>,

    /// Normalized names of columns coerced to floating point.
    pub numeric_columns: Vec<String>,

    /// Handling of names that collide after normalization.
    /// Default: Suffix
    pub duplicate_column_policy: DuplicateColumnPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            parquet_file_name: "insurance_data.parquet".to_string(),
            csv_file_name: "insurance_data.csv".to_string(),
            encoding_sample_bytes: 10_000,
            delimiter_sample_lines: 5,
            date_columns: DEFAULT_DATE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            numeric_columns: DEFAULT_NUMERIC_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            duplicate_column_policy: DuplicateColumnPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// Create a new configuration builder.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Full path of the Parquet output.
    pub fn parquet_path(&self) -> PathBuf {
        self.output_dir.join(&self.parquet_file_name)
    }

    /// Full path of the CSV fallback output.
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(&self.csv_file_name)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.encoding_sample_bytes == 0 {
            return Err(ConfigValidationError::InvalidSampleSize {
                field: "encoding_sample_bytes".to_string(),
                value: self.encoding_sample_bytes,
                minimum: 1,
            });
        }

        if self.delimiter_sample_lines < 2 {
            return Err(ConfigValidationError::InvalidSampleSize {
                field: "delimiter_sample_lines".to_string(),
                value: self.delimiter_sample_lines,
                minimum: 2,
            });
        }

        for (field, name) in [
            ("parquet_file_name", &self.parquet_file_name),
            ("csv_file_name", &self.csv_file_name),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyFileName(field.to_string()));
            }
        }

        if self.parquet_file_name == self.csv_file_name {
            return Err(ConfigValidationError::SameOutputFile(
                self.parquet_file_name.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid sample size for '{field}': {value} (must be at least {minimum})")]
    InvalidSampleSize {
        field: String,
        value: usize,
        minimum: usize,
    },

    #[error("Output file name '{0}' must not be empty")]
    EmptyFileName(String),

    #[error("Parquet and CSV outputs must use different file names (both are '{0}')")]
    SameOutputFile(String),
}

/// Builder for [`IngestConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    parquet_file_name: Option<String>,
    csv_file_name: Option<String>,
    encoding_sample_bytes: Option<usize>,
    delimiter_sample_lines: Option<usize>,
    date_columns: Option<Vec<String>>,
    numeric_columns: Option<Vec<String>>,
    duplicate_column_policy: Option<DuplicateColumnPolicy>,
}

impl IngestConfigBuilder {
    /// Set the file to ingest.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the Parquet file name (without directory).
    pub fn parquet_file_name(mut self, name: impl Into<String>) -> Self {
        self.parquet_file_name = Some(name.into());
        self
    }

    /// Set the CSV fallback file name (without directory).
    pub fn csv_file_name(mut self, name: impl Into<String>) -> Self {
        self.csv_file_name = Some(name.into());
        self
    }

    /// Set how many bytes are sampled for encoding detection.
    pub fn encoding_sample_bytes(mut self, bytes: usize) -> Self {
        self.encoding_sample_bytes = Some(bytes);
        self
    }

    /// Set how many lines are sampled for delimiter detection.
    pub fn delimiter_sample_lines(mut self, lines: usize) -> Self {
        self.delimiter_sample_lines = Some(lines);
        self
    }

    /// Replace the designated date columns.
    pub fn date_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the designated numeric columns.
    pub fn numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the policy for names that collide after normalization.
    pub fn duplicate_column_policy(mut self, policy: DuplicateColumnPolicy) -> Self {
        self.duplicate_column_policy = Some(policy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `IngestConfig` or an error if validation fails.
    pub fn build(self) -> Result<IngestConfig, ConfigValidationError> {
        let defaults = IngestConfig::default();
        let config = IngestConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            parquet_file_name: self.parquet_file_name.unwrap_or(defaults.parquet_file_name),
            csv_file_name: self.csv_file_name.unwrap_or(defaults.csv_file_name),
            encoding_sample_bytes: self
                .encoding_sample_bytes
                .unwrap_or(defaults.encoding_sample_bytes),
            delimiter_sample_lines: self
                .delimiter_sample_lines
                .unwrap_or(defaults.delimiter_sample_lines),
            date_columns: self.date_columns.unwrap_or(defaults.date_columns),
            numeric_columns: self.numeric_columns.unwrap_or(defaults.numeric_columns),
            duplicate_column_policy: self.duplicate_column_policy.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.input_path, PathBuf::from(DEFAULT_INPUT_PATH));
        assert_eq!(
            config.parquet_path(),
            PathBuf::from("data/processed/insurance_data.parquet")
        );
        assert_eq!(
            config.csv_path(),
            PathBuf::from("data/processed/insurance_data.csv")
        );
        assert_eq!(config.encoding_sample_bytes, 10_000);
        assert_eq!(config.delimiter_sample_lines, 5);
        assert_eq!(config.duplicate_column_policy, DuplicateColumnPolicy::Suffix);
    }

    #[test]
    fn test_builder_defaults() {
        let config = IngestConfig::builder().build().unwrap();
        assert_eq!(config.date_columns, vec!["transactionmonth", "vehicleintroductiondate"]);
        assert_eq!(config.numeric_columns.len(), 4);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = IngestConfig::builder()
            .input_path("/tmp/in.txt")
            .output_dir("/tmp/out")
            .parquet_file_name("table.parquet")
            .csv_file_name("table.csv")
            .date_columns(["policy_start"])
            .numeric_columns(vec!["premium".to_string()])
            .duplicate_column_policy(DuplicateColumnPolicy::Fail)
            .build()
            .unwrap();

        assert_eq!(config.parquet_path(), PathBuf::from("/tmp/out/table.parquet"));
        assert_eq!(config.date_columns, vec!["policy_start"]);
        assert_eq!(config.numeric_columns, vec!["premium"]);
        assert_eq!(config.duplicate_column_policy, DuplicateColumnPolicy::Fail);
    }

    #[test]
    fn test_validation_sample_lines_below_two() {
        let result = IngestConfig::builder().delimiter_sample_lines(1).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSampleSize { minimum: 2, .. }
        ));
    }

    #[test]
    fn test_validation_zero_sample_bytes() {
        let result = IngestConfig::builder().encoding_sample_bytes(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSampleSize { value: 0, .. }
        ));
    }

    #[test]
    fn test_validation_same_output_file() {
        let result = IngestConfig::builder()
            .parquet_file_name("out")
            .csv_file_name("out")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::SameOutputFile(_)
        ));
    }

    #[test]
    fn test_validation_empty_file_name() {
        let result = IngestConfig::builder().csv_file_name("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyFileName(_)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "input_path": "raw/input.txt",
            "output_dir": "processed",
            "parquet_file_name": "claims.parquet",
            "csv_file_name": "claims.csv",
            "encoding_sample_bytes": 4096,
            "delimiter_sample_lines": 3,
            "date_columns": ["transactionmonth"],
            "numeric_columns": ["totalclaims"],
            "duplicate_column_policy": "Fail"
        }"#;

        let config: IngestConfig = serde_json::from_str(json).expect("Should deserialize");
        assert!(config.validate().is_ok());
        assert_eq!(config.csv_path(), PathBuf::from("processed/claims.csv"));
        assert_eq!(config.encoding_sample_bytes, 4096);
        assert_eq!(config.duplicate_column_policy, DuplicateColumnPolicy::Fail);
    }
}
