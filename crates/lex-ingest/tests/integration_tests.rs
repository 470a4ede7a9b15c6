//! Integration tests for the ingestion pipeline.
//!
//! These tests run the full pipeline against files written to scratch
//! directories and read the persisted output back.

use encoding_rs::WINDOWS_1252;
use lex_ingest::{
    CsvTableWriter, Delimiter, IngestConfig, IngestError, IngestStage, OutputFormat, Pipeline,
    IngestResult, PipelineResult, TableWriter,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, tempdir};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn write_input(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write input file");
    path
}

fn config_for(input: &Path, output_dir: &Path) -> IngestConfig {
    IngestConfig::builder()
        .input_path(input)
        .output_dir(output_dir)
        .build()
        .expect("Valid config")
}

fn run(input: &Path, output_dir: &Path) -> IngestResult<PipelineResult> {
    Pipeline::builder()
        .config(config_for(input, output_dir))
        .build()
        .unwrap()
        .run()
}

fn read_parquet(path: &Path) -> DataFrame {
    let file = File::open(path).expect("Output file should exist");
    ParquetReader::new(file)
        .finish()
        .expect("Failed to read Parquet output")
}

fn date_millis(y: i32, m: u32, d: u32) -> i64 {
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

fn datetime_at(df: &DataFrame, column: &str, idx: usize) -> Option<i64> {
    match df.column(column).unwrap().get(idx).unwrap() {
        AnyValue::Datetime(v, TimeUnit::Milliseconds, _) => Some(v),
        AnyValue::Null => None,
        other => panic!("Expected millisecond datetime in '{}', got {:?}", column, other),
    }
}

fn float_at(df: &DataFrame, column: &str, idx: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(idx)
}

struct BrokenParquetWriter;

impl TableWriter for BrokenParquetWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Parquet
    }

    fn write(&self, _df: &mut DataFrame, _path: &Path) -> IngestResult<()> {
        Err(IngestError::InvalidConfig(
            "columnar engine not available".to_string(),
        ))
    }
}

// ============================================================================
// End-to-End Scenarios
// ============================================================================

#[test]
fn test_pipe_delimited_policy_scenario() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "MachineLearningRating_v3.txt",
        b"Transaction Month|TotalPremium|TotalClaims\n2023-01|100.5|20\n2023-02|abc|30\n",
    );
    let output_dir = dir.path().join("processed");

    let result = run(&input, &output_dir).unwrap();

    assert_eq!(result.delimiter, Delimiter::Pipe);
    assert_eq!(result.strategy, "flexible_csv");
    assert_eq!(result.raw_shape, (2, 3));
    assert_eq!(result.clean_shape, (2, 3));
    assert_eq!(
        result.columns,
        vec!["transaction_month", "totalpremium", "totalclaims"]
    );
    assert_eq!(result.output.format, OutputFormat::Parquet);
    assert_eq!(result.output.path, output_dir.join("insurance_data.parquet"));
    assert!(!result.output.used_fallback);

    let df = read_parquet(&result.output.path);
    assert_eq!(df.height(), 2);
    assert_eq!(
        datetime_at(&df, "transaction_month", 0),
        Some(date_millis(2023, 1, 1))
    );
    assert_eq!(
        datetime_at(&df, "transaction_month", 1),
        Some(date_millis(2023, 2, 1))
    );
    assert_eq!(float_at(&df, "totalpremium", 0), Some(100.5));
    assert_eq!(float_at(&df, "totalpremium", 1), None);
    assert_eq!(float_at(&df, "totalclaims", 0), Some(20.0));
    assert_eq!(float_at(&df, "totalclaims", 1), Some(30.0));
}

#[test]
fn test_policy_fixture_file() {
    let dir = tempdir().unwrap();
    let input = fixtures_path().join("policies_pipe.txt");

    let result = run(&input, dir.path()).unwrap();
    assert_eq!(result.delimiter, Delimiter::Pipe);
    assert_eq!(result.clean_shape, (7, 11));

    let df = read_parquet(&result.output.path);

    // Header had no spaces, so the designated name matches directly.
    assert_eq!(
        datetime_at(&df, "transactionmonth", 0),
        Some(date_millis(2015, 3, 1))
    );
    assert_eq!(datetime_at(&df, "transactionmonth", 6), None);

    // `CapitalOutstanding` matches the designated `capital_outstanding`.
    assert_eq!(df.column("capitaloutstanding").unwrap().dtype(), &DataType::Float64);
    assert_eq!(float_at(&df, "capitaloutstanding", 5), Some(169900.0));

    assert_eq!(float_at(&df, "customvalueestimate", 0), Some(119300.0));
    assert_eq!(df.column("customvalueestimate").unwrap().null_count(), 6);

    assert_eq!(float_at(&df, "totalpremium", 4), None);
    assert_eq!(float_at(&df, "totalclaims", 6), Some(7020.614035087719));

    // Not designated: left as text.
    assert_eq!(df.column("vehicleintrodate").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("province").unwrap().dtype(), &DataType::String);

    let premium = result
        .coercions
        .iter()
        .find(|c| c.column == "totalpremium")
        .unwrap();
    assert_eq!(premium.unparseable(), 1);
}

#[test]
fn test_semicolon_file_with_quotes() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "export.csv",
        b"Make;Model;TotalPremium\n\"MERCEDES-BENZ\";\"E 240; AUTO\";\"1,250.00\"\nTOYOTA;COROLLA;80\n",
    );

    let result = run(&input, &dir.path().join("out")).unwrap();
    assert_eq!(result.delimiter, Delimiter::Semicolon);
    assert_eq!(result.clean_shape, (2, 3));

    let df = read_parquet(&result.output.path);
    assert_eq!(
        df.column("model").unwrap().str().unwrap().get(0),
        Some("E 240; AUTO")
    );
    assert_eq!(float_at(&df, "totalpremium", 0), Some(1250.0));
}

#[test]
fn test_legacy_encoded_tab_file() {
    let dir = tempdir().unwrap();
    let text = "Nom\tVille\tRemarque\n\
                Hélène\tBesançon\tdéjà-réglé\n\
                François\tOrléans\tCrème brûlée, garçon, façade, élève\n\
                Amélie\tNîmes\tRéclamation reçue après l'échéance prévue\n";
    let (bytes, _, _) = WINDOWS_1252.encode(text);
    let input = write_input(&dir, "latin.txt", &bytes);

    let result = run(&input, &dir.path().join("out")).unwrap();
    assert_eq!(result.delimiter, Delimiter::Tab);
    assert_ne!(result.encoding, "UTF-8");

    let df = read_parquet(&result.output.path);
    assert_eq!(df.column("ville").unwrap().str().unwrap().get(0), Some("Besançon"));
}

#[test]
fn test_carriage_return_only_file() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "classic_mac.csv",
        b"PolicyID,TotalPremium,TotalClaims\r1001,21.5,0\r1002,abc,7\r",
    );

    let result = run(&input, &dir.path().join("out")).unwrap();
    assert_eq!(result.delimiter, Delimiter::Comma);
    assert_eq!(result.clean_shape, (2, 3));

    let df = read_parquet(&result.output.path);
    assert_eq!(df.column("policyid").unwrap().str().unwrap().get(1), Some("1002"));
    assert_eq!(float_at(&df, "totalpremium", 0), Some(21.5));
    assert_eq!(float_at(&df, "totalpremium", 1), None);
    assert_eq!(float_at(&df, "totalclaims", 1), Some(7.0));
}

// ============================================================================
// Failure Paths
// ============================================================================

#[test]
fn test_missing_input_file() {
    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("out");

    let err = run(&dir.path().join("absent.txt"), &output_dir).unwrap_err();
    assert!(matches!(err, IngestError::InputUnavailable(_)));
    assert!(!output_dir.exists());
}

#[test]
fn test_empty_input_file() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "empty.txt", b"");
    let output_dir = dir.path().join("out");

    let err = run(&input, &output_dir).unwrap_err();
    assert_eq!(err.error_code(), "INPUT_UNAVAILABLE");
    assert!(!output_dir.exists());
}

#[test]
fn test_single_column_file_exhausts_strategies() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "one_column.txt", b"policyid\n1001\n1002\n");
    let output_dir = dir.path().join("out");

    let err = run(&input, &output_dir).unwrap_err();
    assert!(matches!(err, IngestError::LoadExhausted(_)));
    assert!(err.is_input_problem());
    assert!(!output_dir.exists());
}

#[test]
fn test_header_only_file_is_empty_input() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "header_only.txt", b"a|b|c\n");

    let err = run(&input, &dir.path().join("out")).unwrap_err();
    assert!(matches!(err, IngestError::EmptyInput));
}

// ============================================================================
// Persistence Fallback
// ============================================================================

#[test]
fn test_csv_fallback_when_parquet_fails() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "input.txt",
        b"Transaction Month|TotalPremium|TotalClaims\n2023-01|100.5|20\n2023-02|abc|30\n",
    );
    let output_dir = dir.path().join("processed");

    let result = Pipeline::builder()
        .config(config_for(&input, &output_dir))
        .writers(Box::new(BrokenParquetWriter), Box::new(CsvTableWriter))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.output.used_fallback);
    assert_eq!(result.output.format, OutputFormat::Csv);
    assert_eq!(result.output.path, output_dir.join("insurance_data.csv"));
    assert!(!output_dir.join("insurance_data.parquet").exists());

    let text = fs::read_to_string(&result.output.path).unwrap();
    let mut lines = text.lines();
    // Header row only, no index column.
    assert_eq!(
        lines.next(),
        Some("transaction_month,totalpremium,totalclaims")
    );
    assert_eq!(lines.count(), 2);
}

// ============================================================================
// Progress Reporting
// ============================================================================

#[test]
fn test_failed_run_reports_failed_stage() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "one_column.txt", b"policyid\n1001\n");

    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    let result = Pipeline::builder()
        .config(config_for(&input, &dir.path().join("out")))
        .on_progress(move |update| updates_clone.lock().unwrap().push(update))
        .build()
        .unwrap()
        .run();

    assert!(result.is_err());
    let updates = updates.lock().unwrap();
    let last = updates.last().unwrap();
    assert_eq!(last.stage, IngestStage::Failed);
    assert!(last.message.contains("one_column.txt"));
    assert!(updates.iter().any(|u| u.stage == IngestStage::Loading));
    assert!(!updates.iter().any(|u| u.stage == IngestStage::Cleaning));
}

#[test]
fn test_result_serializes_to_json() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "input.txt", b"a,b\n1,2\n");

    let result = run(&input, &dir.path().join("out")).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["delimiter"], "comma");
    assert_eq!(json["output"]["format"], "parquet");
    assert_eq!(json["clean_shape"], serde_json::json!([1, 2]));
}
