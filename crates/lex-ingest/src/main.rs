//! CLI entry point for the ingestion pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use lex_ingest::config::{DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_DIR};
use lex_ingest::{DuplicateColumnPolicy, IngestConfig, Pipeline, PipelineResult};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Load a raw delimited policy file and save it as a typed table",
    long_about = "Detects the encoding and delimiter of a raw text export, loads it with \
                  fallback parsing strategies, normalizes column names, coerces the known \
                  date and amount columns, and saves the result as Parquet (CSV if Parquet \
                  cannot be written).\n\n\
                  EXAMPLES:\n  \
                  # Default locations\n  \
                  lex-ingest\n\n  \
                  # Custom input and output\n  \
                  lex-ingest -i exports/policies.txt -o data/processed\n\n  \
                  # Machine-readable summary\n  \
                  lex-ingest --json | jq .output.path"
)]
struct Args {
    /// Path to the raw delimited text file
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: String,

    /// Directory receiving the processed table
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Fail instead of renaming columns whose normalized names collide
    #[arg(long)]
    strict_columns: bool,

    /// Output the run summary as JSON to stdout instead of logs
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries the
/// JSON summary.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let policy = if args.strict_columns {
        DuplicateColumnPolicy::Fail
    } else {
        DuplicateColumnPolicy::Suffix
    };

    let config = IngestConfig::builder()
        .input_path(&args.input)
        .output_dir(&args.output)
        .duplicate_column_policy(policy)
        .build()
        .context("Invalid configuration")?;

    let pipeline = Pipeline::builder()
        .config(config)
        .build()
        .context("Failed to build pipeline")?;

    match pipeline.run() {
        Ok(result) => print_summary(&result, args.json),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Ingestion failed: {}", e))
        }
    }
}

/// Note: uses `println!` for the JSON summary so it can be piped.
fn print_summary(result: &PipelineResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    info!("{}", "=".repeat(60));
    info!("INGESTION SUMMARY");
    info!("{}", "=".repeat(60));
    info!("  Input:      {}", result.input_path.display());
    info!("  Encoding:   {}", result.encoding);
    info!("  Delimiter:  '{}'", result.delimiter);
    info!("  Strategy:   {}", result.strategy);
    info!("  Raw shape:  {:?}", result.raw_shape);
    info!("  Clean shape: {:?}", result.clean_shape);
    for coercion in &result.coercions {
        info!(
            "  {:<28} {:?} ({} unparseable)",
            coercion.column,
            coercion.kind,
            coercion.unparseable()
        );
    }
    info!(
        "  Output:     {} ({}{})",
        result.output.path.display(),
        result.output.format,
        if result.output.used_fallback {
            ", fallback"
        } else {
            ""
        }
    );
    info!("  Duration:   {} ms", result.duration_ms);
    Ok(())
}
