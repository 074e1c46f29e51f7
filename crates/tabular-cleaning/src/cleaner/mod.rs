//! Data cleaning module.
//!
//! This module provides the deduplication stage: exact duplicate rows are
//! collapsed to their first occurrence.

use crate::config::CleaningConfig;
use crate::error::{Result, ResultExt};
use crate::io::parse_csv;
use polars::prelude::*;
use tracing::debug;

/// Data cleaner for row-level cleaning operations.
pub struct DataCleaner;

impl DataCleaner {
    /// Remove exact duplicate rows.
    ///
    /// Two rows are duplicates when every column compares equal, with null
    /// equal to null. The first occurrence survives and survivors keep their
    /// original relative order. Returns the new frame and the number of rows
    /// removed.
    pub fn remove_duplicates(df: &DataFrame) -> Result<(DataFrame, usize)> {
        if df.width() == 0 || df.height() < 2 {
            return Ok((df.clone(), 0));
        }

        let before = df.height();
        let deduplicated = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()
            .context("Failed to remove duplicate rows")?;
        let removed = before - deduplicated.height();

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            debug!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        } else {
            debug!("No duplicate rows found");
        }

        Ok((deduplicated, removed))
    }

    /// Count rows that [`remove_duplicates`](Self::remove_duplicates) would drop.
    pub fn count_duplicates(df: &DataFrame) -> Result<usize> {
        Self::remove_duplicates(df).map(|(_, removed)| removed)
    }

    /// Parse CSV text and remove its duplicate rows.
    pub fn remove_duplicates_csv(
        data: &str,
        config: &CleaningConfig,
    ) -> Result<(DataFrame, usize)> {
        let df = parse_csv(data, config)?;
        Self::remove_duplicates(&df)
    }
}
