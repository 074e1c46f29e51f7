//! Data profiling module for dataset analysis.
//!
//! This module provides the analyzer stage of the pipeline:
//! - Row and column counts
//! - Per-column distinct, missing and type information
//! - Duplicate detection

mod type_inference;

use crate::cleaner::DataCleaner;
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::io::parse_csv;
use crate::types::{ColumnProfile, DatasetProfile};
use crate::utils::value_to_string;
use polars::prelude::*;
use rand::prelude::*;
use tracing::debug;

pub(crate) use type_inference::infer_column_type;

/// Maximum number of sample values kept per column.
const MAX_SAMPLE_VALUES: usize = 10;

/// Data profiler for analyzing dataset structure and quality.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Column profiles come back in the dataset's column order.
    pub fn profile_dataset(df: &DataFrame) -> Result<DatasetProfile> {
        let mut profile = Self::profile_columns(df)?;
        profile.set_duplicate_count(DataCleaner::count_duplicates(df)?);
        Ok(profile)
    }

    /// Profile every column, leaving the duplicate count at zero for a
    /// caller that deduplicates anyway.
    pub(crate) fn profile_columns(df: &DataFrame) -> Result<DatasetProfile> {
        let mut column_profiles = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            column_profiles.push(Self::profile_column(df, col_name.as_str())?);
        }

        debug!("Profiled {} columns", column_profiles.len());

        Ok(DatasetProfile {
            row_count: df.height(),
            column_count: df.width(),
            column_profiles,
            duplicate_count: 0,
            duplicate_percentage: 0.0,
        })
    }

    /// Parse CSV text and profile it.
    pub fn analyze_csv(data: &str, config: &CleaningConfig) -> Result<DatasetProfile> {
        let df = parse_csv(data, config)?;
        Self::profile_dataset(&df)
    }

    /// Profile a single column by name.
    pub fn profile_column(df: &DataFrame, col_name: &str) -> Result<ColumnProfile> {
        let col = df
            .column(col_name)
            .map_err(|_| CleaningError::ColumnNotFound(col_name.to_string()))?;
        let series = col.as_materialized_series();

        let null_count = series.null_count();
        let null_percentage = if df.height() > 0 {
            (null_count as f64 / df.height() as f64) * 100.0
        } else {
            0.0
        };

        let non_null_series = series.drop_nulls();
        let unique_count = non_null_series.n_unique()?;

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype: series.dtype().to_string(),
            inferred_type: infer_column_type(series),
            unique_count,
            null_count,
            null_percentage,
            sample_values: Self::sample_values(&non_null_series),
        })
    }

    /// Pick up to [`MAX_SAMPLE_VALUES`] non-null values with a fixed seed so
    /// repeated runs show the same samples.
    fn sample_values(non_null_series: &Series) -> Vec<String> {
        if non_null_series.is_empty() {
            return Vec::new();
        }

        let sample_size = std::cmp::min(MAX_SAMPLE_VALUES, non_null_series.len());
        let mut rng = StdRng::seed_from_u64(42);
        let indices: Vec<usize> = (0..non_null_series.len()).collect();
        let mut sampled_indices: Vec<usize> = indices
            .choose_multiple(&mut rng, sample_size)
            .copied()
            .collect();
        sampled_indices.sort_unstable();

        sampled_indices
            .into_iter()
            .filter_map(|idx| non_null_series.get(idx).ok())
            .map(|val| value_to_string(&val))
            .collect()
    }
}
