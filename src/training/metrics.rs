//! Holdout evaluation metrics

use super::encoder::LabelCodec;
use crate::error::{GradecastError, Result};
use crate::grading::GradeLabel;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one grade class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: GradeLabel,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of holdout rows truly in this class
    pub support: usize,
}

/// Classification report over a holdout set.
///
/// Purely observational: training never fails on poor metrics, the report
/// only feeds logs and experiment records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub per_class: Vec<ClassMetrics>,
    pub n_samples: usize,
}

impl ClassificationReport {
    /// Compute the report from coded labels.
    ///
    /// `y_true` and `y_pred` hold class codes as `f64`; the codec maps them
    /// back to grade labels for the per-class breakdown.
    pub fn compute(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        codec: &LabelCodec,
    ) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(GradecastError::Shape {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Err(GradecastError::InvalidInput(
                "cannot score an empty holdout".to_string(),
            ));
        }

        let n_classes = codec.len();
        let mut confusion = vec![vec![0usize; n_classes]; n_classes];
        let mut correct = 0usize;

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let t_idx = t.round() as i64;
            let p_idx = p.round() as i64;
            if t_idx == p_idx {
                correct += 1;
            }
            let in_range = |v: i64| v >= 0 && (v as usize) < n_classes;
            if in_range(t_idx) && in_range(p_idx) {
                confusion[t_idx as usize][p_idx as usize] += 1;
            }
        }

        let mut per_class = Vec::with_capacity(n_classes);
        for c in 0..n_classes {
            let tp = confusion[c][c];
            let predicted_c: usize = (0..n_classes).map(|r| confusion[r][c]).sum();
            let actual_c: usize = confusion[c].iter().sum();

            let precision = if predicted_c > 0 {
                tp as f64 / predicted_c as f64
            } else {
                0.0
            };
            let recall = if actual_c > 0 {
                tp as f64 / actual_c as f64
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            per_class.push(ClassMetrics {
                label: codec.decode(c)?,
                precision,
                recall,
                f1,
                support: actual_c,
            });
        }

        let k = per_class.len().max(1) as f64;
        Ok(Self {
            accuracy: correct as f64 / n_samples as f64,
            macro_precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k,
            macro_recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k,
            macro_f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k,
            per_class,
            n_samples,
        })
    }
}
