//! Progress reporting and cancellation support for the cleaning pipeline.
//!
//! A caller running the pipeline on a worker thread can watch it through a
//! [`ProgressReporter`] and stop it with a [`CancellationToken`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tabular_cleaning::{CancellationToken, CleaningPipeline, CriticalColumns};
//!
//! let token = CancellationToken::new();
//! let token_clone = token.clone();
//!
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     token_clone.cancel();
//! });
//!
//! let outcome = CleaningPipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(|update| println!("[{:?}] {}", update.stage, update.message))
//!     .build()?
//!     .process(df, &CriticalColumns::none());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Validating configuration
    Initializing,
    /// Profiling the raw dataset
    Analyzing,
    /// Removing exact duplicate rows
    Deduplicating,
    /// Filling or dropping missing values, one column at a time
    ResolvingMissing,
    /// Writing the cleaned dataset
    Saving,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline was cancelled by the caller
    Cancelled,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Analyzing => "Analyzing Dataset",
            Self::Deduplicating => "Removing Duplicates",
            Self::ResolvingMissing => "Resolving Missing Values",
            Self::Saving => "Saving Dataset",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of overall progress this stage accounts for (0.0 - 1.0).
    ///
    /// The working stages sum to 1.0; terminal stages weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::Analyzing => 0.20,
            Self::Deduplicating => 0.15,
            Self::ResolvingMissing => 0.45,
            Self::Saving => 0.15,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::Analyzing => 0.05,
            Self::Deduplicating => 0.25,
            Self::ResolvingMissing => 0.40,
            Self::Saving => 0.85,
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Whether the pipeline has stopped at this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Failed)
    }
}

/// A single progress event emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: CleaningStage,

    /// Optional detail such as "Column: age"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    fn at(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Creates a progress update for a stage without sub-stage info.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        Self::at(stage, stage_progress, message)
    }

    /// Creates a progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: CleaningStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::at(stage, stage_progress, message)
        }
    }

    /// Creates a progress update for item `current` of `total`.
    pub fn with_items(
        stage: CleaningStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::at(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::at(CleaningStage::Complete, 1.0, message)
    }

    pub fn cancelled() -> Self {
        Self::at(CleaningStage::Cancelled, 0.0, "Pipeline cancelled")
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::at(CleaningStage::Failed, 0.0, message)
    }
}

/// Receives progress updates while the pipeline runs.
///
/// Implementations must be `Send + Sync`: the pipeline may run on a worker
/// thread while the reporter forwards events elsewhere.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_cleaning::{ProgressReporter, ProgressUpdate};
///
/// struct LogReporter;
///
/// impl ProgressReporter for LogReporter {
///     fn report(&self, update: ProgressUpdate) {
///         tracing::info!("{:.0}% {}", update.progress * 100.0, update.message);
///     }
/// }
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Called once per stage and once per column during missing-value
    /// resolution. Keep it cheap.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running pipeline.
///
/// Clones share one flag, so [`cancel()`](Self::cancel) may be called from
/// any thread. The pipeline checks the flag between stages and between
/// columns, and returns
/// [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// once it is set.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation of the pipeline.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once this token or any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
