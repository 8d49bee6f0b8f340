//! Cleaning engine: subject inference, absence repair, and derived columns

use crate::error::{GradecastError, Result};
use crate::grading::PASS_MARK;
use crate::schema::{
    normalize_cell, FeatureSpec, DERIVED_COLUMNS, EXPECTED_COLUMN, FAIL_FLAG_COLUMN, GRADE_COLUMN,
    NAME_COLUMN, NAME_PLACEHOLDER, TOTAL_COLUMN,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the cleaning engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Columns excluded from subject inference by name, on top of the
    /// derived columns which are always excluded
    pub exclude: Vec<String>,
    /// Whether the fail indicator participates in the feature contract.
    /// The indicator column itself is always written to the cleaned table.
    pub include_fail_flag: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                NAME_COLUMN.to_string(),
                GRADE_COLUMN.to_string(),
                EXPECTED_COLUMN.to_string(),
            ],
            include_fail_flag: true,
        }
    }
}

impl CleanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude an additional column from subject inference
    pub fn with_excluded(mut self, column: impl Into<String>) -> Self {
        self.exclude.push(column.into());
        self
    }

    /// Include or exclude the fail indicator from the feature contract
    pub fn with_fail_flag(mut self, include: bool) -> Self {
        self.include_fail_flag = include;
        self
    }
}

/// A cleaned table together with the feature contract that was fixed while
/// cleaning it
#[derive(Debug, Clone)]
pub struct CleanedTable {
    df: DataFrame,
    spec: FeatureSpec,
}

impl CleanedTable {
    pub fn new(df: DataFrame, spec: FeatureSpec) -> Self {
        Self { df, spec }
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn spec(&self) -> &FeatureSpec {
        &self.spec
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }
}

/// Cleaning engine for raw score tables.
///
/// Two modes share one policy. [`TableCleaner::clean`] infers the subject
/// columns from the data and fixes the [`FeatureSpec`]; it runs at training
/// time. [`TableCleaner::clean_to_spec`] takes the spec persisted in an
/// artifact and never re-infers, so prediction-time feature extraction
/// cannot drift from what the model was trained on.
#[derive(Debug, Clone, Default)]
pub struct TableCleaner {
    config: CleanConfig,
}

impl TableCleaner {
    pub fn new() -> Self {
        Self::with_config(CleanConfig::default())
    }

    pub fn with_config(config: CleanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean a raw table, inferring subject columns from content.
    ///
    /// A non-reserved column is a subject if its dtype is numeric, or if it
    /// is a string column where at least one cell parses as a number after
    /// absence normalization. Missing and absent scores fill with zero.
    pub fn clean(&self, df: &DataFrame) -> Result<CleanedTable> {
        if df.width() == 0 {
            return Err(GradecastError::Schema("input table has no columns".to_string()));
        }

        let mut subjects: Vec<(String, Vec<f64>)> = Vec::new();
        let mut passthrough: Vec<Column> = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            if name == NAME_COLUMN {
                continue;
            }
            if DERIVED_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            if self.config.exclude.iter().any(|c| c == &name) {
                passthrough.push(col.clone());
                continue;
            }
            match Self::infer_numeric_values(col)? {
                Some(values) => subjects.push((name, values)),
                None => passthrough.push(col.clone()),
            }
        }

        if subjects.is_empty() {
            return Err(GradecastError::Schema(
                "no subject columns could be inferred from the input".to_string(),
            ));
        }

        debug!(
            n_subjects = subjects.len(),
            n_rows = df.height(),
            "inferred subject columns"
        );

        let subject_names: Vec<String> = subjects.iter().map(|(n, _)| n.clone()).collect();
        let spec = FeatureSpec::new(subject_names, self.config.include_fail_flag);
        self.assemble(df, subjects, passthrough, spec)
    }

    /// Clean a raw table against a fixed feature contract.
    ///
    /// Subject columns come from the spec, in spec order. Columns the spec
    /// names but the table lacks produce a [`GradecastError::FeatureMismatch`]
    /// listing every missing name; extra columns pass through untouched and
    /// are never summed into `Total`.
    pub fn clean_to_spec(&self, df: &DataFrame, spec: &FeatureSpec) -> Result<CleanedTable> {
        if df.width() == 0 {
            return Err(GradecastError::Schema("input table has no columns".to_string()));
        }

        let missing: Vec<String> = spec
            .subjects()
            .iter()
            .filter(|name| df.column(name).is_err())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(GradecastError::FeatureMismatch { missing });
        }

        let mut subjects: Vec<(String, Vec<f64>)> = Vec::with_capacity(spec.subjects().len());
        for name in spec.subjects() {
            let col = df.column(name)?;
            subjects.push((name.clone(), Self::forced_numeric_values(col)?));
        }

        let passthrough: Vec<Column> = df
            .get_columns()
            .iter()
            .filter(|col| {
                let name = col.name().as_str();
                name != NAME_COLUMN
                    && !DERIVED_COLUMNS.contains(&name)
                    && !spec.subjects().iter().any(|s| s == name)
            })
            .cloned()
            .collect();

        self.assemble(df, subjects, passthrough, spec.clone())
    }

    /// Numeric extraction for inference mode. `None` means the column showed
    /// no numeric evidence and stays a passthrough column.
    fn infer_numeric_values(col: &Column) -> Result<Option<Vec<f64>>> {
        match col.dtype() {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {
                let casted = col.cast(&DataType::Float64)?;
                let ca = casted.f64()?;
                Ok(Some(Self::fill_missing(ca)))
            }
            DataType::String => {
                let ca = col.str()?;
                let mut values = Vec::with_capacity(ca.len());
                let mut numeric_seen = false;
                for cell in ca.into_iter() {
                    match normalize_cell(cell).and_then(|text| text.parse::<f64>().ok()) {
                        Some(value) => {
                            numeric_seen = true;
                            values.push(value);
                        }
                        None => values.push(0.0),
                    }
                }
                if numeric_seen {
                    Ok(Some(values))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    /// Numeric extraction for spec mode: the column is a subject no matter
    /// what it holds, so every unusable cell falls back to the fill value.
    fn forced_numeric_values(col: &Column) -> Result<Vec<f64>> {
        match col.dtype() {
            DataType::String => {
                let ca = col.str()?;
                Ok(ca
                    .into_iter()
                    .map(|cell| {
                        normalize_cell(cell)
                            .and_then(|text| text.parse::<f64>().ok())
                            .unwrap_or(0.0)
                    })
                    .collect())
            }
            _ => {
                let casted = col.cast(&DataType::Float64)?;
                let ca = casted.f64()?;
                Ok(Self::fill_missing(ca))
            }
        }
    }

    fn fill_missing(ca: &Float64Chunked) -> Vec<f64> {
        ca.into_iter()
            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
            .collect()
    }

    /// Repaired Name column: nulls and empty names become the placeholder;
    /// a missing column is synthesized outright.
    fn name_values(&self, df: &DataFrame) -> Result<Column> {
        match df.column(NAME_COLUMN) {
            Ok(col) => {
                let casted;
                let col = if matches!(col.dtype(), DataType::String) {
                    col
                } else {
                    casted = col.cast(&DataType::String)?;
                    &casted
                };
                let names: Vec<String> = col
                    .str()?
                    .into_iter()
                    .map(|cell| match cell {
                        Some(s) if !s.trim().is_empty() => s.to_string(),
                        _ => NAME_PLACEHOLDER.to_string(),
                    })
                    .collect();
                Ok(Column::new(NAME_COLUMN.into(), names))
            }
            Err(_) => Ok(Column::new(
                NAME_COLUMN.into(),
                vec![NAME_PLACEHOLDER.to_string(); df.height()],
            )),
        }
    }

    /// Build the output table: Name, subjects, Total, fail indicator, then
    /// passthrough columns in their original relative order.
    fn assemble(
        &self,
        df: &DataFrame,
        subjects: Vec<(String, Vec<f64>)>,
        passthrough: Vec<Column>,
        spec: FeatureSpec,
    ) -> Result<CleanedTable> {
        let n_rows = df.height();
        let mut total = vec![0.0; n_rows];
        let mut failed = vec![0.0; n_rows];
        for (_, values) in &subjects {
            for (i, &v) in values.iter().enumerate() {
                total[i] += v;
                if v < PASS_MARK {
                    failed[i] = 1.0;
                }
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(subjects.len() + 3 + passthrough.len());
        columns.push(self.name_values(df)?);
        for (name, values) in subjects {
            columns.push(Column::new(name.as_str().into(), values));
        }
        columns.push(Column::new(TOTAL_COLUMN.into(), total));
        columns.push(Column::new(FAIL_FLAG_COLUMN.into(), failed));
        columns.extend(passthrough);

        let out = DataFrame::new(columns)?;
        Ok(CleanedTable::new(out, spec))
    }
}
