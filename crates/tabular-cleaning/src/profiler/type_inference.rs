//! Type inference logic for column analysis.

use crate::types::InferredType;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Decide whether a column is treated as numeric or categorical.
///
/// Only the physical dtype matters: integer and float columns are numeric,
/// everything else (strings, booleans, dates) is categorical. A column that
/// parsed with no values at all comes out of the CSV reader as String and is
/// therefore categorical.
pub(crate) fn infer_column_type(series: &Series) -> InferredType {
    if is_numeric_dtype(series.dtype()) {
        InferredType::Numeric
    } else {
        InferredType::Categorical
    }
}
