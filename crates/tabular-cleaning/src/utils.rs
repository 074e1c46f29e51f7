//! Shared utilities for the cleaning pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// Value Rendering
// =============================================================================

/// Render a cell the way it appears in CSV output (strings unquoted).
pub fn value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Median of the non-null values of a numeric Series.
///
/// Returns `None` when the Series is not numeric or holds no values.
pub fn numeric_median(series: &Series) -> Option<f64> {
    if !is_numeric_dtype(series.dtype()) {
        return None;
    }
    series.median()
}

/// Calculate the mode (most frequent non-null value) of a Series, rendered as
/// a string.
///
/// Ties are broken by picking the lexicographically smallest value so the
/// result does not depend on hash ordering.
pub fn string_mode(series: &Series) -> Option<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return None;
    }

    let str_series = non_null.cast(&DataType::String).ok()?;
    let str_chunked = str_series.str().ok()?;

    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always Float64; callers narrow it back when the fill value
/// allows it.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let as_float = series.cast(&DataType::Float64)?;
    let filled: Float64Chunked = as_float
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill null values in a Series with a string value.
///
/// Non-string Series are rendered to strings first.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let as_str = series.cast(&DataType::String)?;
    let filled: StringChunked = as_str
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(filled.with_name(series.name().clone()).into_series())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_integer_dtype() {
        assert!(is_integer_dtype(&DataType::Int32));
        assert!(is_integer_dtype(&DataType::UInt8));
        assert!(!is_integer_dtype(&DataType::Float64));
        assert!(!is_integer_dtype(&DataType::String));
    }

    #[test]
    fn test_value_to_string_unquoted() {
        assert_eq!(value_to_string(&AnyValue::String("abc")), "abc");
        assert_eq!(value_to_string(&AnyValue::Int64(42)), "42");
    }

    #[test]
    fn test_numeric_median() {
        let series = Series::new("v".into(), &[Some(1.0), None, Some(3.0), Some(10.0)]);
        assert_eq!(numeric_median(&series), Some(3.0));

        let even = Series::new("v".into(), &[1i64, 2]);
        assert_eq!(numeric_median(&even), Some(1.5));

        let empty = Series::new("v".into(), &[Option::<f64>::None, None]);
        assert_eq!(numeric_median(&empty), None);

        let text = Series::new("v".into(), &["a", "b"]);
        assert_eq!(numeric_median(&text), None);
    }

    #[test]
    fn test_string_mode() {
        let series = Series::new("test".into(), &["a", "b", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_tie_picks_smallest() {
        let series = Series::new("test".into(), &[Some("pear"), Some("apple"), None, Some("pear"), Some("apple")]);
        assert_eq!(string_mode(&series), Some("apple".to_string()));
    }

    #[test]
    fn test_string_mode_all_null() {
        let series = Series::new("test".into(), &[Option::<&str>::None, None]);
        assert_eq!(string_mode(&series), None);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.name().as_str(), "test");
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("city".into(), &[Some("Oslo"), None, Some("Rome")]);
        let filled = fill_string_nulls(&series, "Oslo").unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.str().unwrap().get(1), Some("Oslo"));
        assert_eq!(filled.str().unwrap().get(2), Some("Rome"));
    }
}
