use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// Profiling Types
// ============================================================================

/// Primitive type a column is treated as when choosing a fill strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    /// Integer or floating point values, filled with the median.
    Numeric,
    /// Text, boolean, temporal or anything else, filled with the mode.
    Categorical,
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub inferred_type: InferredType,
    /// Distinct non-null values.
    pub unique_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub sample_values: Vec<String>,
}

impl ColumnProfile {
    pub fn has_missing(&self) -> bool {
        self.null_count > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub column_profiles: Vec<ColumnProfile>,
    pub duplicate_count: usize,
    pub duplicate_percentage: f64,
}

impl DatasetProfile {
    /// Look up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|c| c.name == name)
    }

    /// Record how many rows duplicate an earlier row.
    pub fn set_duplicate_count(&mut self, duplicate_count: usize) {
        self.duplicate_count = duplicate_count;
        self.duplicate_percentage = if self.row_count > 0 {
            (duplicate_count as f64 / self.row_count as f64) * 100.0
        } else {
            0.0
        };
    }

    /// Total number of missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.column_profiles.iter().map(|c| c.null_count).sum()
    }

    /// Number of columns holding at least one missing value.
    pub fn columns_with_missing(&self) -> usize {
        self.column_profiles.iter().filter(|c| c.has_missing()).count()
    }

    /// Render the human-readable overview shown to a reviewer before cleaning.
    pub fn analysis_text(&self) -> String {
        let names: Vec<&str> = self
            .column_profiles
            .iter()
            .take(5)
            .map(|c| c.name.as_str())
            .collect();
        let ellipsis = if self.column_count > 5 { "..." } else { "" };

        format!(
            "DATA ANALYSIS COMPLETE\n\n\
             Dataset Overview:\n\
             - Total rows: {}\n\
             - Total columns: {}\n\
             - Columns: {}{}\n\n\
             Data Quality Issues:\n\
             - Duplicate rows found: {}\n\
             - Total missing values: {}\n\
             - Columns with missing data: {}\n\n\
             Ready to proceed with data cleaning!",
            group_thousands(self.row_count),
            self.column_count,
            names.join(", "),
            ellipsis,
            group_thousands(self.duplicate_count),
            group_thousands(self.total_missing()),
            self.columns_with_missing(),
        )
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// Critical Columns
// ============================================================================

/// Columns whose absence disqualifies a row outright.
///
/// Names that are not columns of the dataset are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalColumns(HashSet<String>);

impl CriticalColumns {
    /// An explicit empty set: no column is critical.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"customer_id, product_id"`.
    ///
    /// Blank entries are skipped, so `""` yields the empty set.
    pub fn parse_list(list: &str) -> Self {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sorted names, for stable logging and display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S: Into<String>> FromIterator<S> for CriticalColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Action Log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    Median,
    Mode,
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Median => write!(f, "median"),
            Self::Mode => write!(f, "mode"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// The column is in the caller's critical set.
    CriticalColumn,
    /// The column's missing fraction was at or below the fill threshold.
    LowThreshold,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriticalColumn => write!(f, "critical_column"),
            Self::LowThreshold => write!(f, "low_threshold"),
        }
    }
}

/// What the resolver did to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    Filled { method: FillMethod },
    RemovedRows { reason: RemovalReason },
}

/// One entry per column that required intervention.
///
/// Serializes flat, e.g.
/// `{"column":"v","action":"filled","method":"median","count":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub column: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Values filled or rows removed.
    pub count: usize,
}

impl ActionRecord {
    pub fn filled(column: impl Into<String>, method: FillMethod, count: usize) -> Self {
        Self {
            column: column.into(),
            kind: ActionKind::Filled { method },
            count,
        }
    }

    pub fn removed_rows(column: impl Into<String>, reason: RemovalReason, count: usize) -> Self {
        Self {
            column: column.into(),
            kind: ActionKind::RemovedRows { reason },
            count,
        }
    }

    /// Rows this action removed from the dataset (zero for fills).
    pub fn rows_removed(&self) -> usize {
        match self.kind {
            ActionKind::RemovedRows { .. } => self.count,
            ActionKind::Filled { .. } => 0,
        }
    }
}

impl fmt::Display for ActionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ActionKind::Filled { method } => write!(
                f,
                "Filled {} missing values in '{}' with {}",
                self.count, self.column, method
            ),
            ActionKind::RemovedRows { reason } => write!(
                f,
                "Removed {} rows missing '{}' ({})",
                self.count, self.column, reason
            ),
        }
    }
}

// ============================================================================
// Summary Types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub original_rows: usize,
    pub final_rows: usize,
    pub duplicates_removed: usize,
    pub actions_taken: Vec<ActionRecord>,
}

impl CleaningSummary {
    /// Rows removed by the missing-value pass.
    pub fn rows_removed_for_missing(&self) -> usize {
        self.actions_taken.iter().map(ActionRecord::rows_removed).sum()
    }

    /// Values imputed by the missing-value pass.
    pub fn values_filled(&self) -> usize {
        self.actions_taken
            .iter()
            .filter(|a| matches!(a.kind, ActionKind::Filled { .. }))
            .map(|a| a.count)
            .sum()
    }

    /// Every original row is either kept, a removed duplicate, or dropped
    /// by a `removed_rows` action.
    pub fn is_consistent(&self) -> bool {
        self.final_rows + self.duplicates_removed + self.rows_removed_for_missing()
            == self.original_rows
    }

    /// Percentage of original rows that did not survive cleaning.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.original_rows == 0 {
            0.0
        } else {
            (self.original_rows - self.final_rows) as f64 / self.original_rows as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_record_serializes_flat() {
        let record = ActionRecord::filled("v", FillMethod::Median, 1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"column": "v", "action": "filled", "method": "median", "count": 1})
        );

        let record = ActionRecord::removed_rows("id", RemovalReason::CriticalColumn, 2);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "column": "id",
                "action": "removed_rows",
                "reason": "critical_column",
                "count": 2
            })
        );
    }

    #[test]
    fn test_action_record_deserializes() {
        let json = r#"{"column":"city","action":"removed_rows","reason":"low_threshold","count":3}"#;
        let record: ActionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record,
            ActionRecord::removed_rows("city", RemovalReason::LowThreshold, 3)
        );
    }

    #[test]
    fn test_critical_columns_parse_list() {
        let critical = CriticalColumns::parse_list(" customer_id, product_id ,,");
        assert_eq!(critical.len(), 2);
        assert!(critical.contains("customer_id"));
        assert!(critical.contains("product_id"));
        assert!(CriticalColumns::parse_list("").is_empty());
    }

    #[test]
    fn test_summary_consistency() {
        let summary = CleaningSummary {
            original_rows: 10,
            final_rows: 6,
            duplicates_removed: 2,
            actions_taken: vec![
                ActionRecord::removed_rows("a", RemovalReason::LowThreshold, 2),
                ActionRecord::filled("b", FillMethod::Mode, 3),
            ],
        };
        assert!(summary.is_consistent());
        assert_eq!(summary.values_filled(), 3);
        assert_eq!(summary.rows_removed_percentage(), 40.0);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_action_record_display() {
        let record = ActionRecord::removed_rows("id", RemovalReason::CriticalColumn, 1);
        assert_eq!(record.to_string(), "Removed 1 rows missing 'id' (critical_column)");
    }
}
