//! CLI entry point for the tabular cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tabular_cleaning::{
    CleaningConfig, CleaningOutcome, CleaningPipeline, CleaningReport, CriticalColumns,
    DataCleaner, DataProfiler, DatasetProfile, DatasetWriter, MissingValueResolver, PathGuard,
    ReportGenerator, load_source,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Deterministic CSV cleaning: profiling, deduplication and missing values",
    long_about = "Cleans CSV datasets without any model in the loop.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  TABULAR_UPLOADS_DIR   Directory for raw uploads (default: uploads)\n  \
                  TABULAR_RESULTS_DIR   Directory for cleaned files (default: results)\n  \
                  RUST_LOG              Overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Profile a dataset\n  \
                  tabular-cleaning analyze -i data.csv\n\n  \
                  # Full cleaning with two critical columns\n  \
                  tabular-cleaning clean -i data.csv --critical customer_id,product_id\n\n  \
                  # Preview without writing anything\n  \
                  tabular-cleaning clean -i data.csv --critical \"\" --dry-run"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout holds only JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Missing fraction (0.0 - 1.0) above which a non-critical column is
    /// filled instead of having its incomplete rows dropped
    #[arg(long, default_value = "0.05", global = true)]
    threshold: f64,

    /// Directory for raw uploads
    #[arg(long, env = "TABULAR_UPLOADS_DIR", default_value = "uploads", global = true)]
    uploads_dir: PathBuf,

    /// Directory for cleaned datasets and reports
    #[arg(long, env = "TABULAR_RESULTS_DIR", default_value = "results", global = true)]
    results_dir: PathBuf,

    /// Refuse to write outside the uploads and results directories
    #[arg(long, global = true)]
    restrict_paths: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Profile a dataset: counts, types, missing values and duplicates
    Analyze {
        /// CSV file path or http(s) URL
        #[arg(short, long)]
        input: String,
    },

    /// Remove exact duplicate rows
    Dedup {
        /// CSV file path or http(s) URL
        #[arg(short, long)]
        input: String,

        /// Where to save the deduplicated CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fill or drop missing values, column by column
    Resolve {
        /// CSV file path or http(s) URL
        #[arg(short, long)]
        input: String,

        /// Comma-separated critical columns; pass "" for none
        #[arg(long)]
        critical: String,

        /// Where to save the resolved CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Deduplicate, then resolve missing values, then save
    Clean {
        /// CSV file path or http(s) URL
        #[arg(short, long)]
        input: String,

        /// Comma-separated critical columns; pass "" for none
        #[arg(long)]
        critical: String,

        /// Where to save the cleaned CSV
        ///
        /// Defaults to <results-dir>/<uuid>_temp_cleaned.csv
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what cleaning would do without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Write a detailed JSON report as <input_name>_report.json
        #[arg(short = 'r', long)]
        emit_report: bool,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout holds only JSON.
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
    // .env must be loaded before parsing so env-backed flags see it
    dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    let config = CleaningConfig::builder()
        .missing_fill_threshold(cli.threshold)
        .uploads_dir(&cli.uploads_dir)
        .results_dir(&cli.results_dir)
        .restrict_paths(cli.restrict_paths)
        .build()?;

    match &cli.command {
        Command::Analyze { input } => run_analyze(&cli, &config, input),
        Command::Dedup { input, output } => run_dedup(&cli, &config, input, output.as_deref()),
        Command::Resolve {
            input,
            critical,
            output,
        } => run_resolve(
            &cli,
            &config,
            input,
            &CriticalColumns::parse_list(critical),
            output.as_deref(),
        ),
        Command::Clean {
            input,
            critical,
            output,
            dry_run,
            emit_report,
        } => {
            let critical = CriticalColumns::parse_list(critical);
            if *dry_run {
                run_dry_run(&cli, &config, input, &critical)
            } else {
                run_clean(&cli, &config, input, &critical, output.as_deref(), *emit_report)
            }
        }
    }
}

fn load(input: &str, config: &CleaningConfig) -> Result<DataFrame> {
    let df = load_source(input, config).with_context(|| format!("Failed to load {}", input))?;
    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

/// Save to an explicit path, honoring `--restrict-paths`.
fn save_to(df: &mut DataFrame, path: &Path, config: &CleaningConfig) -> Result<PathBuf> {
    if config.restrict_paths {
        PathGuard::from_config(config)?.check(path)?;
    }
    Ok(DatasetWriter::save(df, path)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_analyze(cli: &Cli, config: &CleaningConfig, input: &str) -> Result<()> {
    let df = load(input, config)?;
    let profile = DataProfiler::profile_dataset(&df)?;

    if cli.json {
        return print_json(&profile);
    }

    println!("\n{}", "=".repeat(80));
    println!("{}", profile.analysis_text());
    println!("{}\n", "=".repeat(80));
    print_column_table(&profile);
    Ok(())
}

fn run_dedup(
    cli: &Cli,
    config: &CleaningConfig,
    input: &str,
    output: Option<&Path>,
) -> Result<()> {
    let df = load(input, config)?;
    let (mut deduplicated, removed) = DataCleaner::remove_duplicates(&df)?;

    let saved = output
        .map(|path| save_to(&mut deduplicated, path, config))
        .transpose()?;

    if cli.json {
        return print_json(&json!({
            "input_file": input,
            "original_rows": df.height(),
            "final_rows": deduplicated.height(),
            "removed_duplicates": removed,
            "output_file": saved,
        }));
    }

    println!(
        "Removed {} duplicate rows ({} -> {} rows)",
        removed,
        df.height(),
        deduplicated.height()
    );
    if let Some(path) = saved {
        println!("Data saved to {}", path.display());
    }
    Ok(())
}

fn run_resolve(
    cli: &Cli,
    config: &CleaningConfig,
    input: &str,
    critical: &CriticalColumns,
    output: Option<&Path>,
) -> Result<()> {
    let df = load(input, config)?;
    let (mut resolved, actions) = MissingValueResolver::from_config(config).resolve(&df, critical)?;

    let saved = output
        .map(|path| save_to(&mut resolved, path, config))
        .transpose()?;

    if cli.json {
        return print_json(&json!({
            "input_file": input,
            "original_rows": df.height(),
            "final_rows": resolved.height(),
            "actions_taken": actions,
            "output_file": saved,
        }));
    }

    println!("Rows: {} -> {}", df.height(), resolved.height());
    if actions.is_empty() {
        println!("No missing values found");
    }
    for action in &actions {
        println!("  - {}", action);
    }
    if let Some(path) = saved {
        println!("Data saved to {}", path.display());
    }
    Ok(())
}

fn build_pipeline(cli: &Cli, config: &CleaningConfig) -> Result<CleaningPipeline> {
    let mut builder = CleaningPipeline::builder().config(config.clone());

    if !cli.quiet && !cli.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

fn run_clean(
    cli: &Cli,
    config: &CleaningConfig,
    input: &str,
    critical: &CriticalColumns,
    output: Option<&Path>,
    emit_report: bool,
) -> Result<()> {
    let df = load(input, config)?;
    let pipeline = build_pipeline(cli, config)?;

    info!("{}", "=".repeat(80));
    info!("Starting cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let result = match output {
        Some(path) => pipeline.process_and_save_to(df, critical, path),
        None => pipeline.process_and_save(df, critical, &config.results_dir),
    };

    let outcome = result.map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    let output_file = outcome
        .saved
        .as_ref()
        .map(|saved| saved.path.display().to_string());
    let report = ReportGenerator::build_report(input, output_file.as_deref(), critical, &outcome);

    if emit_report {
        let report_dir = outcome
            .saved
            .as_ref()
            .and_then(|saved| saved.path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| config.results_dir.clone());
        let report_path =
            ReportGenerator::new(report_dir).write_report_to_file(&report, &file_stem(Path::new(input)))?;
        info!("Report written to: {}", report_path.display());
    }

    if cli.json {
        return print_json(&report);
    }

    print_human_readable_summary(&report, &outcome);
    Ok(())
}

/// Preview of `clean`: runs the pipeline in memory and writes nothing.
///
/// Uses `println!` on purpose: this output is the point of `--dry-run` and
/// must show regardless of log level.
fn run_dry_run(
    cli: &Cli,
    config: &CleaningConfig,
    input: &str,
    critical: &CriticalColumns,
) -> Result<()> {
    let df = load(input, config)?;
    let outcome = build_pipeline(cli, config)?.process(df, critical)?;

    if cli.json {
        let report = ReportGenerator::build_report(input, None, critical, &outcome);
        return print_json(&report);
    }

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of cleaning actions");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", input);
    println!("  Rows: {}", outcome.profile.row_count);
    println!("  Columns: {}", outcome.profile.column_count);
    println!(
        "  Critical columns: {}",
        if critical.is_empty() {
            "(none)".to_string()
        } else {
            critical.sorted().join(", ")
        }
    );
    println!();

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));
    print_column_table(&outcome.profile);
    println!();

    println!("PLANNED ACTIONS");
    println!("{}", "-".repeat(40));
    let summary = &outcome.summary;
    if summary.duplicates_removed > 0 {
        println!("  Will remove {} duplicate rows", summary.duplicates_removed);
    } else {
        println!("  No duplicate rows found");
    }
    for action in &summary.actions_taken {
        println!("  - {}", action);
    }
    println!(
        "  Rows: {} -> {}",
        summary.original_rows, summary.final_rows
    );
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this cleaning, run without --dry-run");
    println!("{}", "=".repeat(80));
    Ok(())
}

fn print_column_table(profile: &DatasetProfile) {
    println!(
        "{:<20} {:<12} {:<12} {:<10} {:<10}",
        "Column", "Dtype", "Type", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(68));

    for col in &profile.column_profiles {
        println!(
            "{:<20} {:<12} {:<12} {:<10.1} {:<10}",
            truncate_str(&col.name, 19),
            truncate_str(&col.dtype, 11),
            col.inferred_type,
            col.null_percentage,
            col.unique_count
        );
    }
}

/// Print a human-readable summary of the cleaning results.
fn print_human_readable_summary(report: &CleaningReport, outcome: &CleaningOutcome) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.original_rows, summary.columns
    );
    if let Some(ref output_file) = report.output_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output_file,
            summary.final_rows,
            outcome.data.width()
        );
    }
    println!();

    println!("Processing Summary:");
    println!("  Duplicates removed: {}", summary.duplicates_removed);
    println!(
        "  Rows removed for missing values: {}",
        summary.rows_removed_for_missing
    );
    println!("  Values filled: {}", summary.values_filled);
    println!(
        "  Rows: {} -> {} ({:.1}% removed)",
        summary.original_rows, summary.final_rows, summary.rows_removed_percent
    );
    println!();

    if !report.actions_taken.is_empty() {
        println!("Actions Taken:");
        for action in &report.actions_taken {
            println!("  - {}", action);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save a detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Extract the file stem (name without extension) from a path or URL.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}
