//! Table schema concerns: reserved column names, absence normalization, and
//! the feature-column contract shared between training and prediction.

pub mod cleaner;

pub use cleaner::{CleanConfig, CleanedTable, TableCleaner};

use serde::{Deserialize, Serialize};

/// Student identifier column
pub const NAME_COLUMN: &str = "Name";
/// Rule-assigned label column, written by the grading engine
pub const GRADE_COLUMN: &str = "Grade";
/// Optional expected-grade column carried through to prediction
pub const EXPECTED_COLUMN: &str = "Expected";
/// Sum of the subject columns, appended by the cleaner
pub const TOTAL_COLUMN: &str = "Total";
/// 0/1 indicator: any subject below the pass mark
pub const FAIL_FLAG_COLUMN: &str = "HasFailedSubject";
/// Classifier output column, written by the predictor
pub const PREDICTED_COLUMN: &str = "PredictedGrade";
/// Predicted-vs-expected verdict column
pub const MATCH_COLUMN: &str = "Match";

/// Placeholder for missing student names
pub const NAME_PLACEHOLDER: &str = "Unknown_Student";
/// Case-insensitive marker for a score a student never earned
pub const ABSENT_TOKEN: &str = "absent";

/// Columns the pipeline itself derives. Always excluded from subject
/// inference and recomputed on every cleaning pass, which is what makes
/// cleaning idempotent.
pub(crate) const DERIVED_COLUMNS: [&str; 4] = [
    TOTAL_COLUMN,
    FAIL_FLAG_COLUMN,
    PREDICTED_COLUMN,
    MATCH_COLUMN,
];

/// Normalize a raw cell: `None` for null, empty, whitespace-only, or the
/// absence marker; the trimmed text otherwise.
pub(crate) fn normalize_cell(cell: Option<&str>) -> Option<&str> {
    let text = cell?.trim();
    if text.is_empty() || text.eq_ignore_ascii_case(ABSENT_TOKEN) {
        None
    } else {
        Some(text)
    }
}

/// The ordered feature-column contract fixed at cleaning time and persisted
/// inside the model artifact.
///
/// Prediction never re-infers this from new data; it is threaded through as
/// data so that training and prediction cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    subjects: Vec<String>,
    columns: Vec<String>,
}

impl FeatureSpec {
    /// Build the contract from subject columns in first-encountered order.
    /// `Total` follows the subjects; the fail indicator follows `Total` when
    /// included.
    pub fn new(subjects: Vec<String>, include_fail_flag: bool) -> Self {
        let mut columns = subjects.clone();
        columns.push(TOTAL_COLUMN.to_string());
        if include_fail_flag {
            columns.push(FAIL_FLAG_COLUMN.to_string());
        }
        Self { subjects, columns }
    }

    /// Subject columns, in first-encountered order
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Full ordered feature list offered to the classifier
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cell() {
        assert_eq!(normalize_cell(Some("80")), Some("80"));
        assert_eq!(normalize_cell(Some("  72.5 ")), Some("72.5"));
        assert_eq!(normalize_cell(Some("")), None);
        assert_eq!(normalize_cell(Some("   ")), None);
        assert_eq!(normalize_cell(Some("absent")), None);
        assert_eq!(normalize_cell(Some("ABSENT")), None);
        assert_eq!(normalize_cell(Some("Absent ")), None);
        assert_eq!(normalize_cell(None), None);
    }

    #[test]
    fn test_feature_spec_order() {
        let spec = FeatureSpec::new(vec!["Math".into(), "Science".into()], true);
        assert_eq!(spec.subjects(), &["Math".to_string(), "Science".to_string()]);
        assert_eq!(
            spec.columns(),
            &[
                "Math".to_string(),
                "Science".to_string(),
                "Total".to_string(),
                "HasFailedSubject".to_string()
            ]
        );
        assert_eq!(spec.n_features(), 4);
    }

    #[test]
    fn test_feature_spec_without_fail_flag() {
        let spec = FeatureSpec::new(vec!["Math".into()], false);
        assert_eq!(spec.columns(), &["Math".to_string(), "Total".to_string()]);
    }
}
