//! Rule-based grade assignment
//!
//! The grading rules are the ground truth the classifier later learns to
//! reproduce: a hard fail override on any subject below the pass mark,
//! otherwise letter bands over the total score.

use crate::error::{GradecastError, Result};
use crate::schema::{CleanedTable, GRADE_COLUMN};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Any subject strictly below this mark fails the student outright
pub const PASS_MARK: f64 = 35.0;
/// Total at or above this is an A
pub const A_MIN: f64 = 340.0;
/// Total at or above this (below `A_MIN`) is a B
pub const B_MIN: f64 = 300.0;
/// Total at or above this (below `B_MIN`) is a C
pub const C_MIN: f64 = 250.0;

/// Closed set of grade labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeLabel {
    A,
    B,
    C,
    D,
    Fail,
}

impl GradeLabel {
    /// Canonical display form
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLabel::A => "A",
            GradeLabel::B => "B",
            GradeLabel::C => "C",
            GradeLabel::D => "D",
            GradeLabel::Fail => "Fail",
        }
    }

    /// Case-insensitive parse of a label written as text. Accepts the single
    /// letters `a`-`d`, `fail`, and `f` for `Fail`.
    pub fn parse(text: &str) -> Option<GradeLabel> {
        match text.trim().to_ascii_lowercase().as_str() {
            "a" => Some(GradeLabel::A),
            "b" => Some(GradeLabel::B),
            "c" => Some(GradeLabel::C),
            "d" => Some(GradeLabel::D),
            "f" | "fail" => Some(GradeLabel::Fail),
            _ => None,
        }
    }
}

impl std::fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grading thresholds. The defaults are the fixed production rules; the
/// struct exists so tests can probe boundaries without global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRules {
    pub pass_mark: f64,
    pub a_min: f64,
    pub b_min: f64,
    pub c_min: f64,
}

impl Default for GradeRules {
    fn default() -> Self {
        Self {
            pass_mark: PASS_MARK,
            a_min: A_MIN,
            b_min: B_MIN,
            c_min: C_MIN,
        }
    }
}

impl GradeRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when any subject score sits below the pass mark
    pub fn has_failed(&self, scores: &[f64]) -> bool {
        scores.iter().any(|&s| s < self.pass_mark)
    }

    /// Letter band for a total score, highest band first, lower bounds
    /// inclusive
    pub fn band(&self, total: f64) -> GradeLabel {
        match total {
            t if t >= self.a_min => GradeLabel::A,
            t if t >= self.b_min => GradeLabel::B,
            t if t >= self.c_min => GradeLabel::C,
            _ => GradeLabel::D,
        }
    }

    /// Grade one cleaned row of subject scores. The fail override beats the
    /// bands: a student with a failed subject never receives a letter grade,
    /// however large the total.
    pub fn grade(&self, scores: &[f64]) -> Result<GradeLabel> {
        if scores.is_empty() {
            return Err(GradecastError::InvalidInput(
                "cannot grade a row with no subject scores".to_string(),
            ));
        }
        if self.has_failed(scores) {
            return Ok(GradeLabel::Fail);
        }
        Ok(self.band(scores.iter().sum()))
    }

    /// Append a `Grade` column computed row-wise from the table's subject
    /// columns. Produces a new table; the input is untouched.
    pub fn label(&self, table: &CleanedTable) -> Result<CleanedTable> {
        let subjects = table.spec().subjects();
        if subjects.is_empty() {
            return Err(GradecastError::InvalidInput(
                "cannot grade a table with no subject columns".to_string(),
            ));
        }

        let df = table.df();
        let mut subject_cas = Vec::with_capacity(subjects.len());
        for name in subjects {
            subject_cas.push(df.column(name)?.f64()?);
        }

        let n_rows = df.height();
        let mut scores = vec![0.0; subjects.len()];
        let mut grades = Vec::with_capacity(n_rows);
        for i in 0..n_rows {
            for (j, ca) in subject_cas.iter().enumerate() {
                scores[j] = ca.get(i).unwrap_or(0.0);
            }
            grades.push(self.grade(&scores)?.to_string());
        }

        let mut out = df.clone();
        out.with_column(Column::new(GRADE_COLUMN.into(), grades))?;
        Ok(CleanedTable::new(out, table.spec().clone()))
    }
}
