//! Tabular Cleaning Library
//!
//! Deterministic cleaning for CSV datasets, built on Polars.
//!
//! # Overview
//!
//! Four stages, each usable on its own:
//!
//! - **Analysis**: row/column counts, per-column distinct and missing counts,
//!   dtypes and duplicate rows ([`DataProfiler`])
//! - **Deduplication**: exact duplicate rows collapse to their first
//!   occurrence ([`DataCleaner`])
//! - **Missing-value resolution**: per column, drop incomplete rows or fill
//!   with the median/mode ([`MissingValueResolver`])
//! - **Persistence**: atomic CSV writes, optionally confined to allowed
//!   directories ([`DatasetWriter`], [`PathGuard`])
//!
//! [`CleaningPipeline`] chains them with progress reporting and cancellation,
//! and the [`tools`] module exposes them as JSON-returning functions.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tabular_cleaning::{CleaningConfig, CleaningPipeline, CriticalColumns, load_source};
//!
//! let config = CleaningConfig::default();
//! let df = load_source("uploads/customers.csv", &config)?;
//!
//! let outcome = CleaningPipeline::builder()
//!     .config(config)
//!     .build()?
//!     .process(df, &CriticalColumns::parse_list("customer_id, product_id"))?;
//!
//! for action in &outcome.summary.actions_taken {
//!     println!("{}", action);
//! }
//! ```
//!
//! # Critical Columns
//!
//! Every cleaning entry point takes the critical columns explicitly. Rows
//! missing a critical column are always dropped, whatever the missing
//! fraction. Pass [`CriticalColumns::none()`] when no column is critical.
//!
//! # Configuration
//!
//! ```rust,ignore
//! use tabular_cleaning::CleaningConfig;
//!
//! let config = CleaningConfig::builder()
//!     .missing_fill_threshold(0.05)   // Fill columns with >5% missing
//!     .null_markers(["", "NA", "?"])
//!     .results_dir("results")
//!     .restrict_paths(true)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod storage;
pub mod tools;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{CleaningConfig, CleaningConfigBuilder, ConfigValidationError, DEFAULT_NULL_MARKERS};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{FilledColumn, MissingValueResolver, StatisticalImputer};
pub use io::{is_url, load_csv_path, load_source, parse_csv, to_csv_string, write_csv};
pub use pipeline::{
    CancellationToken, CleaningOutcome, CleaningPipeline, CleaningPipelineBuilder, CleaningStage,
    ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use reporting::{CleaningReport, ReportGenerator};
pub use storage::{DatasetWriter, PathGuard, SavedDataset};
pub use tools::ToolResponse;
pub use types::{
    ActionKind, ActionRecord, CleaningSummary, ColumnProfile, CriticalColumns, DatasetProfile,
    FillMethod, InferredType, RemovalReason,
};
pub use utils::{is_integer_dtype, is_numeric_dtype};
