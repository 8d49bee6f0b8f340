//! Training engine
//!
//! Takes a cleaned, labeled table, splits it deterministically, fits the
//! configured classifier and packages the result as a [`ModelArtifact`].

use super::config::TrainerConfig;
use super::encoder::LabelCodec;
use super::metrics::ClassificationReport;
use crate::artifact::ModelArtifact;
use crate::error::{GradecastError, Result};
use crate::grading::GradeLabel;
use crate::schema::{CleanedTable, GRADE_COLUMN};
use crate::tracking::{RunObserver, RunRecord};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use tracing::{info, warn};

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
///
/// Every requested column must exist; the error lists all missing names at
/// once so a caller sees the full gap, not just the first.
pub(crate) fn feature_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| df.column(name).is_err())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(GradecastError::FeatureMismatch { missing });
    }

    let n_rows = df.height();
    let n_cols = columns.len();

    let col_data: Vec<Vec<f64>> = columns
        .iter()
        .map(|name| {
            let column = df.column(name)?;
            let casted = column.cast(&DataType::Float64)?;
            let values: Vec<f64> = casted
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    // from_shape_fn builds the row-major layout straight from the
    // column-major polars buffers
    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// What a completed training run produced
#[derive(Debug)]
pub struct TrainOutcome {
    /// The trained model with its codec and feature spec
    pub artifact: ModelArtifact,
    /// Holdout metrics; `None` when `train_fraction` left no holdout
    pub report: Option<ClassificationReport>,
    pub n_train: usize,
    pub n_holdout: usize,
    pub training_time_secs: f64,
}

/// Fits classifiers on labeled grade tables
pub struct Trainer {
    config: TrainerConfig,
    observers: Vec<Box<dyn RunObserver>>,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Register an observer to be notified after each run
    pub fn with_observer(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on a labeled table.
    ///
    /// The table must carry a `Grade` column; rows are shuffled with the
    /// configured seed before the train/holdout split, so the same seed on
    /// the same table reproduces the same model.
    pub fn train(&self, table: &CleanedTable) -> Result<TrainOutcome> {
        self.config.validate()?;

        let df = table.df();
        let n_samples = df.height();
        if n_samples == 0 {
            return Err(GradecastError::InvalidInput(
                "cannot train on an empty table".to_string(),
            ));
        }

        let labels = Self::extract_labels(df)?;
        let codec = LabelCodec::fit(&labels);

        let y_codes: Vec<f64> = labels
            .iter()
            .map(|&label| codec.encode(label).map(|c| c as f64))
            .collect::<Result<Vec<f64>>>()?;
        let y = Array1::from_vec(y_codes);
        let x = feature_matrix(df, table.spec().columns())?;

        // Seeded shuffle, then a contiguous split
        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let n_train = ((n_samples as f64 * self.config.train_fraction).floor() as usize)
            .clamp(1, n_samples);
        let (train_idx, holdout_idx) = indices.split_at(n_train);

        let x_train = x.select(Axis(0), train_idx);
        let y_train = Array1::from_vec(train_idx.iter().map(|&i| y[i]).collect());

        let mut classifier = self.config.build_classifier();
        let start = Instant::now();
        classifier.fit(&x_train, &y_train)?;
        let training_time_secs = start.elapsed().as_secs_f64();

        let report = if holdout_idx.is_empty() {
            None
        } else {
            let x_holdout = x.select(Axis(0), holdout_idx);
            let y_holdout = Array1::from_vec(holdout_idx.iter().map(|&i| y[i]).collect());
            let y_pred = classifier.predict(&x_holdout)?;
            Some(ClassificationReport::compute(&y_holdout, &y_pred, &codec)?)
        };

        match &report {
            Some(r) => info!(
                classifier = classifier.kind(),
                n_train,
                n_holdout = holdout_idx.len(),
                accuracy = r.accuracy,
                macro_f1 = r.macro_f1,
                "training finished"
            ),
            None => info!(
                classifier = classifier.kind(),
                n_train, "training finished without a holdout"
            ),
        }

        let artifact = ModelArtifact::new(classifier, codec, table.spec().clone());
        let outcome = TrainOutcome {
            artifact,
            report,
            n_train,
            n_holdout: holdout_idx.len(),
            training_time_secs,
        };

        self.notify_observers(&outcome);
        Ok(outcome)
    }

    fn extract_labels(df: &DataFrame) -> Result<Vec<GradeLabel>> {
        let grade_col = df.column(GRADE_COLUMN).map_err(|_| {
            GradecastError::Schema(
                "missing Grade column; label the table before training".to_string(),
            )
        })?;
        let grades = grade_col.str()?;

        let mut labels = Vec::with_capacity(df.height());
        for (row, value) in grades.into_iter().enumerate() {
            let text = value.ok_or_else(|| {
                GradecastError::InvalidInput(format!("row {}: missing grade label", row))
            })?;
            let label = GradeLabel::parse(text).ok_or_else(|| {
                GradecastError::InvalidInput(format!(
                    "row {}: unrecognized grade label '{}'",
                    row, text
                ))
            })?;
            labels.push(label);
        }
        Ok(labels)
    }

    fn notify_observers(&self, outcome: &TrainOutcome) {
        if self.observers.is_empty() {
            return;
        }

        let mut run = RunRecord::new()
            .with_param("classifier", outcome.artifact.classifier.kind())
            .with_param("seed", self.config.seed)
            .with_param("train_fraction", self.config.train_fraction)
            .with_param("n_trees", self.config.n_trees)
            .with_param("n_features", outcome.artifact.features.n_features())
            .with_param("n_train", outcome.n_train)
            .with_param("n_holdout", outcome.n_holdout)
            .with_metric("training_time_secs", outcome.training_time_secs);
        if let Some(depth) = self.config.max_depth {
            run = run.with_param("max_depth", depth);
        }
        if let Some(report) = &outcome.report {
            run = run
                .with_metric("accuracy", report.accuracy)
                .with_metric("macro_precision", report.macro_precision)
                .with_metric("macro_recall", report.macro_recall)
                .with_metric("macro_f1", report.macro_f1);
        }

        for observer in &self.observers {
            if let Err(e) = observer.record_run(&run) {
                warn!(error = %e, "run observer failed; continuing");
            }
        }
    }
}
