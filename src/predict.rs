//! Batch prediction with a stored model
//!
//! The predictor re-cleans incoming data against the artifact's feature
//! spec, so new tables pass through exactly the cleaning the model was
//! trained behind. Columns the spec does not name never reach the model.

use crate::artifact::ModelArtifact;
use crate::error::{GradecastError, Result};
use crate::grading::GradeLabel;
use crate::schema::{
    TableCleaner, EXPECTED_COLUMN, MATCH_COLUMN, NAME_COLUMN, NAME_PLACEHOLDER, PREDICTED_COLUMN,
};
use crate::training::feature_matrix;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// One scored student
#[derive(Debug, Clone)]
pub struct PredictionRow {
    pub name: String,
    pub predicted: GradeLabel,
    /// Raw `Expected` cell, when the input carried one
    pub expected: Option<String>,
    /// Whether the expectation matched; `None` when nothing was expected
    pub matched: Option<bool>,
}

/// Scored table plus per-row details, in input order
#[derive(Debug, Clone)]
pub struct PredictionTable {
    df: DataFrame,
    rows: Vec<PredictionRow>,
}

impl PredictionTable {
    /// Cleaned table extended with `PredictedGrade` (and `Match` when the
    /// input carried an `Expected` column)
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    /// Fraction of compared rows whose expectation matched; `None` when no
    /// row carried an expectation
    pub fn match_rate(&self) -> Option<f64> {
        let compared: Vec<bool> = self.rows.iter().filter_map(|r| r.matched).collect();
        if compared.is_empty() {
            return None;
        }
        let hits = compared.iter().filter(|&&m| m).count();
        Some(hits as f64 / compared.len() as f64)
    }
}

/// Scores raw tables with a loaded [`ModelArtifact`]
#[derive(Debug)]
pub struct Predictor {
    artifact: ModelArtifact,
    cleaner: TableCleaner,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            artifact,
            cleaner: TableCleaner::new(),
        }
    }

    /// Load the artifact at `path` and wrap it in a predictor
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(ModelArtifact::load(path)?))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Score every row of a raw table.
    ///
    /// Fails before producing any output when the input lacks a column the
    /// model was trained on; a partial prediction table is never returned.
    pub fn predict(&self, df: &DataFrame) -> Result<PredictionTable> {
        if df.height() == 0 {
            return Err(GradecastError::InvalidInput(
                "no rows to predict".to_string(),
            ));
        }

        let cleaned = self.cleaner.clean_to_spec(df, &self.artifact.features)?;
        let x = feature_matrix(cleaned.df(), self.artifact.features.columns())?;
        let codes = self.artifact.classifier.predict(&x)?;

        let mut predicted = Vec::with_capacity(codes.len());
        for (row, code) in codes.iter().enumerate() {
            let rounded = code.round();
            if rounded < 0.0 {
                return Err(GradecastError::ArtifactCorrupt(format!(
                    "negative class code {} at row {}",
                    code, row
                )));
            }
            predicted.push(self.artifact.labels.decode(rounded as usize)?);
        }

        let names = Self::name_column(cleaned.df())?;
        let expected = Self::expected_column(cleaned.df())?;

        let rows: Vec<PredictionRow> = (0..predicted.len())
            .map(|i| {
                let expected_i = expected.as_ref().and_then(|v| v[i].clone());
                let matched = expected_i
                    .as_deref()
                    .map(|e| GradeLabel::parse(e) == Some(predicted[i]));
                PredictionRow {
                    name: names[i].clone(),
                    predicted: predicted[i],
                    expected: expected_i,
                    matched,
                }
            })
            .collect();

        let mut out = cleaned.into_df();
        let predicted_strs: Vec<&str> = predicted.iter().map(|l| l.as_str()).collect();
        out.with_column(Column::new(PREDICTED_COLUMN.into(), predicted_strs))?;
        if expected.is_some() {
            let matches: Vec<Option<bool>> = rows.iter().map(|r| r.matched).collect();
            out.with_column(Column::new(MATCH_COLUMN.into(), matches))?;
        }

        debug!(rows = rows.len(), "scored table");
        Ok(PredictionTable { df: out, rows })
    }

    fn name_column(df: &DataFrame) -> Result<Vec<String>> {
        let names = df.column(NAME_COLUMN)?.str()?;
        Ok(names
            .into_iter()
            .map(|v| v.unwrap_or(NAME_PLACEHOLDER).to_string())
            .collect())
    }

    /// Trimmed `Expected` cells; `None` when the column is absent entirely
    fn expected_column(df: &DataFrame) -> Result<Option<Vec<Option<String>>>> {
        let column = match df.column(EXPECTED_COLUMN) {
            Ok(column) => column,
            Err(_) => return Ok(None),
        };
        let casted = column.cast(&DataType::String)?;
        let values = casted.str()?;
        Ok(Some(
            values
                .into_iter()
                .map(|v| {
                    v.and_then(|s| {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            None
                        } else {
                            Some(trimmed.to_string())
                        }
                    })
                })
                .collect(),
        ))
    }
}
