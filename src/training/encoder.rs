//! Label encoding for grade classes

use crate::error::{GradecastError, Result};
use crate::grading::GradeLabel;
use serde::{Deserialize, Serialize};

/// Bidirectional mapping between grade labels and integer class codes.
///
/// Codes are positions in the sorted list of distinct labels seen at fit
/// time, so the same labels always produce the same encoding. The codec is
/// stored in the model artifact and reused verbatim at prediction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCodec {
    labels: Vec<GradeLabel>,
}

impl LabelCodec {
    /// Build a codec from observed labels
    pub fn fit(labels: &[GradeLabel]) -> Self {
        let mut distinct: Vec<GradeLabel> = labels.to_vec();
        distinct.sort();
        distinct.dedup();
        Self { labels: distinct }
    }

    /// Code for a label
    pub fn encode(&self, label: GradeLabel) -> Result<usize> {
        self.labels
            .iter()
            .position(|&l| l == label)
            .ok_or_else(|| {
                GradecastError::InvalidInput(format!("label {} not seen during training", label))
            })
    }

    /// Label for a code
    pub fn decode(&self, code: usize) -> Result<GradeLabel> {
        self.labels.get(code).copied().ok_or_else(|| {
            GradecastError::ArtifactCorrupt(format!(
                "class code {} outside the stored label set of size {}",
                code,
                self.labels.len()
            ))
        })
    }

    /// Labels in code order
    pub fn labels(&self) -> &[GradeLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
