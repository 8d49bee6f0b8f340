//! Gradecast - Student grade pipeline
//!
//! This crate cleans raw student score tables, grades them with fixed rules
//! and trains classifiers that predict grades for new students:
//! - Cleaning turns messy score columns into a numeric feature table with a
//!   `Total` per student
//! - Grading applies the banding rules (with a fail override for any
//!   sub-pass subject score)
//! - Training fits a decision tree or random forest and stores it as a
//!   single JSON artifact
//! - Prediction re-cleans new data against the stored feature spec and
//!   scores it, optionally checking an `Expected` column
//!
//! # Modules
//!
//! - [`schema`] - Cleaning engine and the feature spec
//! - [`grading`] - Grade bands and the labeling rules
//! - [`training`] - Label codec, classifiers, trainer and metrics
//! - [`artifact`] - Model artifact persistence
//! - [`predict`] - Batch prediction with a stored model
//! - [`tracking`] - Experiment tracking
//! - [`utils`] - Table loading and saving
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pipeline stages
pub mod schema;
pub mod grading;
pub mod training;
pub mod artifact;
pub mod predict;

// Infrastructure
pub mod tracking;
pub mod utils;

// Services
pub mod cli;

pub use error::{GradecastError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{GradecastError, Result};

    // Cleaning
    pub use crate::schema::{CleanConfig, CleanedTable, FeatureSpec, TableCleaner};

    // Grading
    pub use crate::grading::{GradeLabel, GradeRules};

    // Training
    pub use crate::training::{
        ClassifierKind, ClassificationReport, LabelCodec, TrainOutcome, Trainer, TrainerConfig,
    };

    // Artifacts and prediction
    pub use crate::artifact::ModelArtifact;
    pub use crate::predict::{PredictionRow, PredictionTable, Predictor};

    // Experiment tracking
    pub use crate::tracking::{ExperimentLog, RunObserver, RunRecord};

    // Data IO
    pub use crate::utils::{DataLoader, DataSaver};
}
