//! Statistical imputation methods.
//!
//! Provides the median and mode fills used by the missing-value resolver.

use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, is_integer_dtype, numeric_median, string_mode,
};
use polars::prelude::*;
use tracing::debug;

/// A filled column together with the value that was written into its gaps.
#[derive(Debug, Clone)]
pub struct FilledColumn<V> {
    pub series: Series,
    pub fill_value: V,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill the nulls of a numeric Series with the median of its non-null
    /// values.
    ///
    /// Integer columns stay integer when the median is integral; otherwise
    /// the result is Float64. Returns `None` when the median is undefined
    /// (no non-null values).
    pub fn fill_median(series: &Series) -> PolarsResult<Option<FilledColumn<f64>>> {
        let Some(median) = numeric_median(series) else {
            return Ok(None);
        };

        let filled = fill_numeric_nulls(series, median)?;
        let filled = if is_integer_dtype(series.dtype()) && median.fract() == 0.0 {
            filled.strict_cast(series.dtype())?
        } else {
            filled
        };

        debug!("Filled '{}' with median: {:.2}", series.name(), median);
        Ok(Some(FilledColumn {
            series: filled,
            fill_value: median,
        }))
    }

    /// Fill the nulls of a Series with its most frequent non-null value.
    ///
    /// Non-string columns are filled through their string rendering and cast
    /// back to the original dtype when every value converts; otherwise the
    /// column stays String. Returns `None` when the column has no values.
    pub fn fill_mode(series: &Series) -> PolarsResult<Option<FilledColumn<String>>> {
        let Some(mode) = string_mode(series) else {
            return Ok(None);
        };

        let filled = fill_string_nulls(series, &mode)?;
        let filled = if series.dtype() == &DataType::String {
            filled
        } else {
            match filled.strict_cast(series.dtype()) {
                Ok(restored) => restored,
                Err(e) => {
                    debug!(
                        "Keeping '{}' as String after mode fill: {}",
                        series.name(),
                        e
                    );
                    filled
                }
            }
        };

        debug!("Filled '{}' with mode: '{}'", series.name(), mode);
        Ok(Some(FilledColumn {
            series: filled,
            fill_value: mode,
        }))
    }
}
