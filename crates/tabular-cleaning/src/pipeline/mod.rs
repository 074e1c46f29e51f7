//! Pipeline module.
//!
//! This module provides the cleaning pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{CLEANED_FILE_SUFFIX, CleaningOutcome, CleaningPipeline, CleaningPipelineBuilder};
pub use progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
