//! JSON tool boundary.
//!
//! These functions take CSV text and plain arguments, as an orchestration
//! runtime would pass them, and never fail: every error is folded into a
//! [`ToolResponse::Error`] carrying the message and its error code.
//!
//! ```text
//! {"status": "success", "cleaned_data": "...", "removed_duplicates": 2}
//! {"status": "error", "error_message": "...", "error_code": "PARSE_ERROR"}
//! ```

use crate::cleaner::DataCleaner;
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::imputers::MissingValueResolver;
use crate::io::{parse_csv, to_csv_string};
use crate::pipeline::CleaningPipeline;
use crate::profiler::DataProfiler;
use crate::storage::{DatasetWriter, PathGuard};
use crate::types::{ActionRecord, CleaningSummary, CriticalColumns};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::warn;

/// Outcome of a tool call, flattened into one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse<T> {
    Success(T),
    Error {
        error_message: String,
        error_code: String,
    },
}

impl<T> ToolResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) => Some(payload),
            Self::Error { .. } => None,
        }
    }
}

impl<T> From<Result<T>> for ToolResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(e) => {
                warn!("Tool call failed: {}", e);
                Self::Error {
                    error_message: e.to_string(),
                    error_code: e.error_code().to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub total_rows: usize,
    pub total_columns: usize,
    /// Distinct non-null values per column, in column order.
    pub unique_values: Map<String, Value>,
    pub missing_values: Map<String, Value>,
    pub data_types: Map<String, Value>,
    pub duplicates: usize,
    pub total_missing: usize,
    pub analysis_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeduplicationPayload {
    pub cleaned_data: String,
    pub removed_duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValuesPayload {
    pub cleaned_data: String,
    pub actions_taken: Vec<ActionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanDataPayload {
    pub temp_file: String,
    pub file_id: String,
    pub cleaned_data: String,
    pub summary: CleaningSummary,
    pub save_message: String,
}

/// Profile CSV text.
pub fn analyze_data(data: &str, config: &CleaningConfig) -> ToolResponse<AnalysisPayload> {
    analyze(data, config).into()
}

/// Remove exact duplicate rows from CSV text.
pub fn clean_duplicates(data: &str, config: &CleaningConfig) -> ToolResponse<DeduplicationPayload> {
    deduplicate(data, config).into()
}

/// Fill or drop missing values in CSV text.
pub fn handle_missing_values(
    data: &str,
    critical_columns: &CriticalColumns,
    config: &CleaningConfig,
) -> ToolResponse<MissingValuesPayload> {
    resolve_missing(data, critical_columns, config).into()
}

/// Write CSV text to `filename`.
pub fn save_csv(
    cleaned_data: &str,
    filename: &str,
    config: &CleaningConfig,
) -> ToolResponse<SavePayload> {
    save(cleaned_data, Path::new(filename), config).into()
}

/// Deduplicate, resolve missing values and save the result under
/// `results_dir` (the configured results directory when `None`).
pub fn clean_data(
    data: &str,
    critical_columns: &CriticalColumns,
    results_dir: Option<&Path>,
    config: &CleaningConfig,
) -> ToolResponse<CleanDataPayload> {
    clean(data, critical_columns, results_dir, config).into()
}

fn analyze(data: &str, config: &CleaningConfig) -> Result<AnalysisPayload> {
    let profile = DataProfiler::analyze_csv(data, config)?;

    let mut unique_values = Map::new();
    let mut missing_values = Map::new();
    let mut data_types = Map::new();
    for col in &profile.column_profiles {
        unique_values.insert(col.name.clone(), col.unique_count.into());
        missing_values.insert(col.name.clone(), col.null_count.into());
        data_types.insert(col.name.clone(), col.dtype.clone().into());
    }

    Ok(AnalysisPayload {
        total_rows: profile.row_count,
        total_columns: profile.column_count,
        unique_values,
        missing_values,
        data_types,
        duplicates: profile.duplicate_count,
        total_missing: profile.total_missing(),
        analysis_text: profile.analysis_text(),
    })
}

fn deduplicate(data: &str, config: &CleaningConfig) -> Result<DeduplicationPayload> {
    let (df, removed) = DataCleaner::remove_duplicates_csv(data, config)?;
    Ok(DeduplicationPayload {
        cleaned_data: to_csv_string(&df)?,
        removed_duplicates: removed,
    })
}

fn resolve_missing(
    data: &str,
    critical_columns: &CriticalColumns,
    config: &CleaningConfig,
) -> Result<MissingValuesPayload> {
    let (df, actions_taken) = MissingValueResolver::resolve_csv(data, critical_columns, config)?;
    Ok(MissingValuesPayload {
        cleaned_data: to_csv_string(&df)?,
        actions_taken,
    })
}

fn save(cleaned_data: &str, path: &Path, config: &CleaningConfig) -> Result<SavePayload> {
    check_destination(path, config)?;
    let path = DatasetWriter::save_csv_text(cleaned_data, path)?;
    Ok(SavePayload {
        message: format!("Data saved to {}", path.display()),
    })
}

fn clean(
    data: &str,
    critical_columns: &CriticalColumns,
    results_dir: Option<&Path>,
    config: &CleaningConfig,
) -> Result<CleanDataPayload> {
    let df = parse_csv(data, config)?;
    let dir = results_dir.unwrap_or(config.results_dir.as_path());

    let outcome = CleaningPipeline::builder()
        .config(config.clone())
        .build()?
        .process_and_save(df, critical_columns, dir)?;

    let saved = outcome
        .saved
        .ok_or_else(|| CleaningError::Internal("pipeline did not save its result".to_string()))?;
    let temp_file = saved.path.display().to_string();

    Ok(CleanDataPayload {
        cleaned_data: to_csv_string(&outcome.data)?,
        save_message: format!("Temporary file saved: {}", temp_file),
        temp_file,
        file_id: saved.file_id,
        summary: outcome.summary,
    })
}

fn check_destination(path: &Path, config: &CleaningConfig) -> Result<()> {
    if config.restrict_paths {
        PathGuard::from_config(config)?.check(path)?;
    }
    Ok(())
}
