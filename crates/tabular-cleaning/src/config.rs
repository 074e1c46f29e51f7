//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cell contents treated as missing when parsing CSV input.
///
/// Mirrors the markers a pandas `read_csv` treats as NaN by default, so a
/// dataset exported from a notebook profiles the same way here.
pub const DEFAULT_NULL_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// Critical columns are not part of the configuration; every cleaning entry
/// point takes them as an explicit argument.
///
/// # Example
///
/// ```rust,ignore
/// use tabular_cleaning::config::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .missing_fill_threshold(0.10)
///     .results_dir("results")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Missing fraction above which a non-critical column is filled instead
    /// of having its incomplete rows dropped (0.0 - 1.0).
    /// Default: 0.05 (5%)
    pub missing_fill_threshold: f64,

    /// Number of rows polars samples to infer column types; `None` scans
    /// the whole table.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Cell contents parsed as null in addition to empty fields.
    /// Default: [`DEFAULT_NULL_MARKERS`]
    pub null_markers: Vec<String>,

    /// Directory for uploaded raw datasets.
    /// Default: "uploads"
    pub uploads_dir: PathBuf,

    /// Directory for cleaned datasets and reports.
    /// Default: "results"
    pub results_dir: PathBuf,

    /// Whether saves are restricted to `uploads_dir` and `results_dir`.
    /// Default: false
    pub restrict_paths: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_fill_threshold: 0.05,
            infer_schema_length: None,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            uploads_dir: PathBuf::from("uploads"),
            results_dir: PathBuf::from("results"),
            restrict_paths: false,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.missing_fill_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "missing_fill_threshold".to_string(),
                value: self.missing_fill_threshold,
            });
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidSchemaLength(0));
        }

        if let Some(marker) = self.null_markers.iter().find(|m| m.contains(['\n', '\r'])) {
            return Err(ConfigValidationError::InvalidNullMarker(marker.clone()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid schema inference length: {0} (must be at least 1)")]
    InvalidSchemaLength(usize),

    #[error("Invalid null marker {0:?}: markers cannot contain line breaks")]
    InvalidNullMarker(String),
}

impl From<ConfigValidationError> for crate::error::CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    missing_fill_threshold: Option<f64>,
    infer_schema_length: Option<Option<usize>>,
    null_markers: Option<Vec<String>>,
    uploads_dir: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    restrict_paths: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Set the missing fraction above which non-critical columns are filled.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.05 = 5%)
    pub fn missing_fill_threshold(mut self, threshold: f64) -> Self {
        self.missing_fill_threshold = Some(threshold);
        self
    }

    /// Set the number of rows sampled for schema inference.
    ///
    /// A value that turns out too small is retried with a full scan.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(Some(rows));
        self
    }

    /// Replace the list of cell contents parsed as null.
    pub fn null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Set the uploads directory.
    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }

    /// Set the results directory.
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }

    /// Restrict saves to the uploads and results directories.
    pub fn restrict_paths(mut self, restrict: bool) -> Self {
        self.restrict_paths = Some(restrict);
        self
    }

    /// Build the configuration, validating all values.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            missing_fill_threshold: self
                .missing_fill_threshold
                .unwrap_or(defaults.missing_fill_threshold),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            null_markers: self.null_markers.unwrap_or(defaults.null_markers),
            uploads_dir: self.uploads_dir.unwrap_or(defaults.uploads_dir),
            results_dir: self.results_dir.unwrap_or(defaults.results_dir),
            restrict_paths: self.restrict_paths.unwrap_or(defaults.restrict_paths),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.missing_fill_threshold, 0.05);
        assert_eq!(config.infer_schema_length, None);
        assert!(config.null_markers.iter().any(|m| m == "NA"));
        assert!(!config.restrict_paths);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CleaningConfig::builder()
            .missing_fill_threshold(0.2)
            .results_dir("out")
            .restrict_paths(true)
            .null_markers(["?"])
            .build()
            .unwrap();

        assert_eq!(config.missing_fill_threshold, 0.2);
        assert_eq!(config.results_dir, PathBuf::from("out"));
        assert!(config.restrict_paths);
        assert_eq!(config.null_markers, vec!["?".to_string()]);
    }

    #[test]
    fn test_invalid_threshold() {
        let result = CleaningConfig::builder().missing_fill_threshold(1.5).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_invalid_schema_length() {
        let result = CleaningConfig::builder().infer_schema_length(0).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidSchemaLength(0))
        ));
    }

    #[test]
    fn test_builder_schema_window() {
        let config = CleaningConfig::builder().infer_schema_length(100).build().unwrap();
        assert_eq!(config.infer_schema_length, Some(100));
    }

    #[test]
    fn test_invalid_null_marker() {
        let result = CleaningConfig::builder().null_markers(["a\nb"]).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidNullMarker(_))
        ));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = CleaningConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: CleaningConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.missing_fill_threshold, config.missing_fill_threshold);
        assert_eq!(back.results_dir, config.results_dir);
    }
}
