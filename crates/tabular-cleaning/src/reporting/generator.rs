use crate::error::{Result, ResultExt};
use crate::pipeline::CleaningOutcome;
use crate::storage::write_atomic;
use crate::types::{ActionRecord, CriticalColumns, DatasetProfile};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Columns with more than this share of missing values are flagged in the
/// quality assessment.
const HIGH_NULL_PERCENTAGE: f64 = 50.0;

// ============================================================================
// Report Types
// ============================================================================

/// Report of one cleaning run, for `--json` output and `--emit-report` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: String,
    /// Path of the cleaned dataset (if written)
    pub output_file: Option<String>,
    /// Critical columns the run was given, sorted
    pub critical_columns: Vec<String>,
    pub processing_summary: ProcessingSummaryReport,
    /// Ordered action log of the missing-value pass
    pub actions_taken: Vec<ActionRecord>,
    pub quality_assessment: QualityAssessment,
    /// Profile of the raw input
    pub dataset_profile: DatasetProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    pub original_rows: usize,
    pub final_rows: usize,
    pub duplicates_removed: usize,
    pub rows_removed_for_missing: usize,
    pub values_filled: usize,
    pub rows_removed_percent: f64,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub duplicate_count: usize,
    pub duplicate_percentage: String,
    pub total_missing: usize,
    pub high_null_columns: Vec<String>,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds [`CleaningReport`]s and writes them next to the cleaned data.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build a report from a finished pipeline run.
    pub fn build_report(
        input_file: &str,
        output_file: Option<&str>,
        critical: &CriticalColumns,
        outcome: &CleaningOutcome,
    ) -> CleaningReport {
        let summary = &outcome.summary;
        let profile = &outcome.profile;

        let processing_summary = ProcessingSummaryReport {
            original_rows: summary.original_rows,
            final_rows: summary.final_rows,
            duplicates_removed: summary.duplicates_removed,
            rows_removed_for_missing: summary.rows_removed_for_missing(),
            values_filled: summary.values_filled(),
            rows_removed_percent: summary.rows_removed_percentage(),
            columns: profile.column_count,
        };

        let high_null_columns = profile
            .column_profiles
            .iter()
            .filter(|col| col.null_percentage > HIGH_NULL_PERCENTAGE)
            .map(|col| col.name.clone())
            .collect();

        let quality_assessment = QualityAssessment {
            duplicate_count: profile.duplicate_count,
            duplicate_percentage: format!("{:.1}", profile.duplicate_percentage),
            total_missing: profile.total_missing(),
            high_null_columns,
        };

        CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            critical_columns: critical.sorted().into_iter().map(String::from).collect(),
            processing_summary,
            actions_taken: summary.actions_taken.clone(),
            quality_assessment,
            dataset_profile: profile.clone(),
        }
    }

    /// Write a report as pretty JSON to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &CleaningReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let json = serde_json::to_string_pretty(report)?;

        write_atomic(&report_path, |writer| {
            writer
                .write_all(json.as_bytes())
                .context(format!("Failed to write {}", report_path.display()))
        })?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CleaningPipeline;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn outcome() -> CleaningOutcome {
        let df = df![
            "id" => [Some(1i64), Some(1), None, Some(4)],
            "note" => [None, None, None, Some("x")],
        ]
        .unwrap();
        CleaningPipeline::builder()
            .build()
            .unwrap()
            .process(df, &CriticalColumns::parse_list("id"))
            .unwrap()
    }

    #[test]
    fn test_build_report() {
        let critical = CriticalColumns::parse_list("id");
        let report =
            ReportGenerator::build_report("in.csv", Some("out.csv"), &critical, &outcome());

        assert_eq!(report.input_file, "in.csv");
        assert_eq!(report.output_file.as_deref(), Some("out.csv"));
        assert_eq!(report.critical_columns, vec!["id".to_string()]);
        assert_eq!(report.processing_summary.original_rows, 4);
        assert_eq!(report.processing_summary.duplicates_removed, 1);
        assert_eq!(report.processing_summary.rows_removed_for_missing, 1);
        assert_eq!(report.quality_assessment.high_null_columns, vec!["note".to_string()]);
        assert_eq!(report.dataset_profile.row_count, 4);
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("reports"));
        let report =
            ReportGenerator::build_report("in.csv", None, &CriticalColumns::none(), &outcome());

        let path = generator.write_report_to_file(&report, "customers").unwrap();

        assert_eq!(path, dir.path().join("reports/customers_report.json"));
        let back: CleaningReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.processing_summary.final_rows, report.processing_summary.final_rows);
        assert!(back.output_file.is_none());
    }
}
