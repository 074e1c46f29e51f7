//! Main cleaning pipeline module.
//!
//! This module provides the `CleaningPipeline` struct and builder that run
//! the analyze, deduplicate and resolve stages in order.

use crate::cleaner::DataCleaner;
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::imputers::MissingValueResolver;
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::storage::{DatasetWriter, PathGuard, SavedDataset};
use crate::types::{CleaningSummary, CriticalColumns, DatasetProfile};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Suffix of the file name written by [`CleaningPipeline::process_and_save`].
pub const CLEANED_FILE_SUFFIX: &str = "temp_cleaned";

/// Where a pipeline run writes its result.
#[derive(Debug, Clone, Copy)]
enum SaveTarget<'a> {
    /// `<dir>/<uuid>_temp_cleaned.csv`
    Dir(&'a Path),
    /// Exactly this file.
    File(&'a Path),
}

impl SaveTarget<'_> {
    fn path(&self) -> &Path {
        match self {
            Self::Dir(path) | Self::File(path) => path,
        }
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// The cleaned dataset.
    pub data: DataFrame,
    /// Profile of the dataset as it came in.
    pub profile: DatasetProfile,
    pub summary: CleaningSummary,
    /// Set when the run saved its result.
    pub saved: Option<SavedDataset>,
}

/// The cleaning pipeline.
///
/// Use [`CleaningPipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_cleaning::{CleaningPipeline, CriticalColumns};
///
/// let outcome = CleaningPipeline::builder()
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(df, &CriticalColumns::parse_list("customer_id"))?;
///
/// println!("{} -> {} rows", outcome.summary.original_rows, outcome.summary.final_rows);
/// ```
pub struct CleaningPipeline {
    config: CleaningConfig,
    resolver: MissingValueResolver,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
}

static_assertions::assert_impl_all!(CleaningPipeline: Send);

impl CleaningPipeline {
    pub fn builder() -> CleaningPipelineBuilder {
        CleaningPipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Deduplicate `df` and resolve its missing values.
    ///
    /// # Errors
    ///
    /// Returns `Err(CleaningError::Cancelled)` if the token was cancelled
    /// before or during the run.
    pub fn process(&self, df: DataFrame, critical: &CriticalColumns) -> Result<CleaningOutcome> {
        self.run(df, critical, None)
    }

    /// Like [`process`](Self::process), then save the result as
    /// `<dir>/<uuid>_temp_cleaned.csv`.
    pub fn process_and_save(
        &self,
        df: DataFrame,
        critical: &CriticalColumns,
        dir: impl AsRef<Path>,
    ) -> Result<CleaningOutcome> {
        self.run(df, critical, Some(SaveTarget::Dir(dir.as_ref())))
    }

    /// Like [`process`](Self::process), then save the result to `path`.
    ///
    /// The file id of the returned [`SavedDataset`] is the file stem.
    pub fn process_and_save_to(
        &self,
        df: DataFrame,
        critical: &CriticalColumns,
        path: impl AsRef<Path>,
    ) -> Result<CleaningOutcome> {
        self.run(df, critical, Some(SaveTarget::File(path.as_ref())))
    }

    fn run(
        &self,
        df: DataFrame,
        critical: &CriticalColumns,
        target: Option<SaveTarget<'_>>,
    ) -> Result<CleaningOutcome> {
        match self.process_internal(df, critical, target) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Cleaned dataset has {} rows",
                    outcome.summary.final_rows
                )));
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(
        &self,
        df: DataFrame,
        critical: &CriticalColumns,
        target: Option<SaveTarget<'_>>,
    ) -> Result<CleaningOutcome> {
        let start_time = Instant::now();

        info!("Starting cleaning pipeline...");
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            "Starting cleaning pipeline...",
        ));
        if !critical.is_empty() {
            debug!("Critical columns: {:?}", critical.sorted());
        }

        if let Some(target) = target.filter(|_| self.config.restrict_paths) {
            PathGuard::from_config(&self.config)?.check(target.path())?;
        }

        self.check_cancelled()?;

        // Step 1: Profile the raw dataset
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Analyzing,
            0.0,
            "Analyzing dataset...",
        ));
        let mut profile = DataProfiler::profile_columns(&df)?;
        info!(
            "Step 1: {} rows x {} columns, {} missing values",
            profile.row_count,
            profile.column_count,
            profile.total_missing()
        );

        self.check_cancelled()?;

        // Step 2: Remove duplicates
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Deduplicating,
            0.0,
            "Removing duplicate rows...",
        ));
        let (df, duplicates_removed) = DataCleaner::remove_duplicates(&df)?;
        profile.set_duplicate_count(duplicates_removed);
        info!("Step 2: Removed {} duplicate rows", duplicates_removed);

        self.check_cancelled()?;

        // Step 3: Resolve missing values, column by column
        let (mut df, actions_taken) = self.resolver.resolve_with(&df, critical, |idx, total, name| {
            self.check_cancelled()?;
            self.report_progress(ProgressUpdate::with_items(
                CleaningStage::ResolvingMissing,
                format!("Column: {}", name),
                idx,
                total,
                format!("Resolving missing values in '{}'", name),
            ));
            Ok(())
        })?;
        info!("Step 3: {} columns needed intervention", actions_taken.len());

        self.check_cancelled()?;

        // Step 4: Save
        let saved = match target {
            Some(target) => {
                self.report_progress(ProgressUpdate::with_sub_stage(
                    CleaningStage::Saving,
                    target.path().display().to_string(),
                    0.0,
                    "Saving cleaned dataset...",
                ));
                let saved = match target {
                    SaveTarget::Dir(dir) => {
                        DatasetWriter::save_unique(&mut df, dir, CLEANED_FILE_SUFFIX)?
                    }
                    SaveTarget::File(path) => SavedDataset {
                        file_id: path
                            .file_stem()
                            .map(|stem| stem.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        path: DatasetWriter::save(&mut df, path)?,
                    },
                };
                info!("Step 4: Saved to {}", saved.path.display());
                Some(saved)
            }
            None => None,
        };

        let summary = CleaningSummary {
            original_rows: profile.row_count,
            final_rows: df.height(),
            duplicates_removed,
            actions_taken,
        };
        debug_assert!(summary.is_consistent());

        info!(
            "Pipeline completed in {:.2}s: {} -> {} rows",
            start_time.elapsed().as_secs_f64(),
            summary.original_rows,
            summary.final_rows
        );

        Ok(CleaningOutcome {
            data: df,
            profile,
            summary,
            saved,
        })
    }
}

/// Builder for [`CleaningPipeline`].
#[derive(Default)]
pub struct CleaningPipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

impl CleaningPipelineBuilder {
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For reporters with their own state, use
    /// [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<CleaningPipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(CleaningPipeline {
            resolver: MissingValueResolver::from_config(&config),
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionRecord, FillMethod, RemovalReason};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn sample_df() -> DataFrame {
        df![
            "id" => [Some(1i64), Some(1), None, Some(3), Some(4)],
            "v" => [Some(10.0), Some(10.0), Some(5.0), None, Some(7.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = CleaningPipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().missing_fill_threshold, 0.05);
        assert_eq!(pipeline.resolver.threshold(), 0.05);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = CleaningConfig {
            missing_fill_threshold: -0.1,
            ..CleaningConfig::default()
        };
        assert!(CleaningPipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_process_dedups_then_resolves() {
        let pipeline = CleaningPipeline::builder().build().unwrap();
        let critical = CriticalColumns::parse_list("id");

        let outcome = pipeline.process(sample_df(), &critical).unwrap();

        // 5 rows -> 1 duplicate -> id drops 1 -> v is 1 of 3 missing, filled
        assert_eq!(outcome.summary.original_rows, 5);
        assert_eq!(outcome.summary.duplicates_removed, 1);
        assert_eq!(
            outcome.summary.actions_taken,
            vec![
                ActionRecord::removed_rows("id", RemovalReason::CriticalColumn, 1),
                ActionRecord::filled("v", FillMethod::Median, 1),
            ]
        );
        assert_eq!(outcome.summary.final_rows, 3);
        assert_eq!(outcome.data.height(), 3);
        assert!(outcome.summary.is_consistent());
        assert_eq!(outcome.profile.row_count, 5);
        assert!(outcome.saved.is_none());
    }

    #[test]
    fn test_profile_takes_duplicates_from_dedup_stage() {
        let df = sample_df();
        let outcome = CleaningPipeline::builder()
            .build()
            .unwrap()
            .process(df.clone(), &CriticalColumns::none())
            .unwrap();

        let standalone = DataProfiler::profile_dataset(&df).unwrap();
        assert_eq!(outcome.profile.duplicate_count, 1);
        assert_eq!(outcome.profile.duplicate_count, standalone.duplicate_count);
        assert_eq!(outcome.profile.duplicate_percentage, 20.0);
        assert_eq!(outcome.profile.total_missing(), standalone.total_missing());
    }

    #[test]
    fn test_process_reports_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = CleaningPipeline::builder()
            .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
            .build()
            .unwrap();
        pipeline.process(sample_df(), &CriticalColumns::none()).unwrap();

        let mut seen = stages.lock().unwrap().clone();
        seen.dedup();
        assert_eq!(
            seen,
            vec![
                CleaningStage::Initializing,
                CleaningStage::Analyzing,
                CleaningStage::Deduplicating,
                CleaningStage::ResolvingMissing,
                CleaningStage::Complete,
            ]
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();
        let pipeline = CleaningPipeline::builder()
            .cancellation_token(token)
            .on_progress(move |update| *last_clone.lock().unwrap() = Some(update.stage))
            .build()
            .unwrap();

        let result = pipeline.process(sample_df(), &CriticalColumns::none());

        assert!(matches!(result, Err(CleaningError::Cancelled)));
        assert_eq!(*last.lock().unwrap(), Some(CleaningStage::Cancelled));
    }

    #[test]
    fn test_cancelled_between_columns() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let pipeline = CleaningPipeline::builder()
            .cancellation_token(token)
            .on_progress(move |update| {
                if update.stage == CleaningStage::ResolvingMissing {
                    token_clone.cancel();
                }
            })
            .build()
            .unwrap();

        let result = pipeline.process(sample_df(), &CriticalColumns::none());
        assert!(matches!(result, Err(CleaningError::Cancelled)));
    }

    #[test]
    fn test_process_and_save() {
        let dir = TempDir::new().unwrap();
        let pipeline = CleaningPipeline::builder().build().unwrap();

        let outcome = pipeline
            .process_and_save(sample_df(), &CriticalColumns::none(), dir.path())
            .unwrap();

        let saved = outcome.saved.unwrap();
        assert!(saved.path.exists());
        assert!(saved.file_name().ends_with("_cleaned.csv"));
    }

    #[test]
    fn test_process_and_save_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("clean.csv");
        let pipeline = CleaningPipeline::builder().build().unwrap();

        let outcome = pipeline
            .process_and_save_to(sample_df(), &CriticalColumns::none(), &path)
            .unwrap();

        let saved = outcome.saved.unwrap();
        assert_eq!(saved.path, path);
        assert_eq!(saved.file_id, "clean");
        assert!(path.exists());
    }

    #[test]
    fn test_rejected_file_target_fails_before_processing() {
        let dir = TempDir::new().unwrap();
        let config = CleaningConfig::builder()
            .uploads_dir(dir.path().join("uploads"))
            .results_dir(dir.path().join("results"))
            .restrict_paths(true)
            .build()
            .unwrap();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();
        let pipeline = CleaningPipeline::builder()
            .config(config)
            .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        let path = dir.path().join("escape.csv");
        let result = pipeline.process_and_save_to(sample_df(), &CriticalColumns::none(), &path);

        assert!(matches!(result, Err(CleaningError::PathNotAllowed(_))));
        assert!(!path.exists());
        let stages = stages.lock().unwrap();
        assert_eq!(stages.last(), Some(&CleaningStage::Failed));
        assert!(!stages.contains(&CleaningStage::Analyzing));
        assert!(!stages.contains(&CleaningStage::Complete));
    }

    #[test]
    fn test_process_and_save_outside_allowed_dirs() {
        let dir = TempDir::new().unwrap();
        let config = CleaningConfig::builder()
            .uploads_dir(dir.path().join("uploads"))
            .results_dir(dir.path().join("results"))
            .restrict_paths(true)
            .build()
            .unwrap();
        let pipeline = CleaningPipeline::builder().config(config).build().unwrap();

        let result =
            pipeline.process_and_save(sample_df(), &CriticalColumns::none(), dir.path().join("other"));
        assert!(matches!(result, Err(CleaningError::PathNotAllowed(_))));

        let outcome = pipeline
            .process_and_save(sample_df(), &CriticalColumns::none(), dir.path().join("results"))
            .unwrap();
        assert!(outcome.saved.is_some());
    }
}
