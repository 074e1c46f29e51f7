//! Missing-value resolution.
//!
//! Columns are visited left to right. For each column holding missing
//! values exactly one of three things happens:
//!
//! 1. the column is critical: rows missing it are dropped
//! 2. the missing fraction exceeds the threshold: values are imputed
//! 3. otherwise: rows missing it are dropped
//!
//! The missing fraction is measured against the row count at the moment the
//! column is visited, so earlier drops change later decisions.

use super::StatisticalImputer;
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result, ResultExt};
use crate::io::parse_csv;
use crate::profiler::infer_column_type;
use crate::types::{ActionRecord, CriticalColumns, FillMethod, InferredType, RemovalReason};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Decides, per column, whether missing values are filled or their rows
/// dropped.
#[derive(Debug, Clone, Copy)]
pub struct MissingValueResolver {
    threshold: f64,
}

impl Default for MissingValueResolver {
    fn default() -> Self {
        Self::from_config(&CleaningConfig::default())
    }
}

impl MissingValueResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new(config.missing_fill_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve every missing value in `df`.
    ///
    /// Returns the cleaned frame and one [`ActionRecord`] per column that
    /// had missing values when visited, in column order.
    pub fn resolve(
        &self,
        df: &DataFrame,
        critical: &CriticalColumns,
    ) -> Result<(DataFrame, Vec<ActionRecord>)> {
        self.resolve_with(df, critical, |_, _, _| Ok(()))
    }

    /// Like [`resolve`](Self::resolve), calling `on_column(index, total, name)`
    /// before each column is visited. An error from the callback aborts the
    /// pass.
    pub fn resolve_with<F>(
        &self,
        df: &DataFrame,
        critical: &CriticalColumns,
        mut on_column: F,
    ) -> Result<(DataFrame, Vec<ActionRecord>)>
    where
        F: FnMut(usize, usize, &str) -> Result<()>,
    {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let total = names.len();

        let mut working = df.clone();
        let mut actions = Vec::new();

        for (idx, name) in names.iter().enumerate() {
            on_column(idx, total, name)?;

            let missing = column_series(&working, name)?.null_count();
            if missing == 0 {
                continue;
            }

            let rows = working.height();
            let action = if critical.contains(name) {
                working = drop_missing_rows(&working, name)?;
                ActionRecord::removed_rows(name, RemovalReason::CriticalColumn, missing)
            } else if (missing as f64 / rows as f64) > self.threshold {
                self.fill_column(&mut working, name, missing)?
            } else {
                working = drop_missing_rows(&working, name)?;
                ActionRecord::removed_rows(name, RemovalReason::LowThreshold, missing)
            };

            debug!("{}", action);
            actions.push(action);
        }

        info!(
            "Missing-value pass: {} -> {} rows, {} columns touched",
            df.height(),
            working.height(),
            actions.len()
        );

        Ok((working, actions))
    }

    /// Parse CSV text and resolve its missing values.
    pub fn resolve_csv(
        data: &str,
        critical: &CriticalColumns,
        config: &CleaningConfig,
    ) -> Result<(DataFrame, Vec<ActionRecord>)> {
        let df = parse_csv(data, config)?;
        Self::from_config(config).resolve(&df, critical)
    }

    fn fill_column(&self, df: &mut DataFrame, name: &str, missing: usize) -> Result<ActionRecord> {
        let series = column_series(df, name)?.clone();

        let (method, filled) = match infer_column_type(&series) {
            InferredType::Numeric => (
                FillMethod::Median,
                StatisticalImputer::fill_median(&series)?.map(|f| f.series),
            ),
            InferredType::Categorical => (
                FillMethod::Mode,
                StatisticalImputer::fill_mode(&series)?.map(|f| f.series),
            ),
        };

        match filled {
            Some(filled) => {
                df.replace(name, filled)
                    .context(format!("Failed to replace column '{}'", name))?;
                Ok(ActionRecord::filled(name, method, missing))
            }
            None => {
                warn!(
                    "Column '{}' has no values to compute a {} from; leaving it unchanged",
                    name, method
                );
                Ok(ActionRecord::filled(name, method, 0))
            }
        }
    }
}

fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| CleaningError::ColumnNotFound(name.to_string()))
}

fn drop_missing_rows(df: &DataFrame, name: &str) -> Result<DataFrame> {
    let mask = column_series(df, name)?.is_not_null();
    df.filter(&mask)
        .context(format!("Failed to drop rows missing '{}'", name))
}
