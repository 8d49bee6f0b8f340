//! Integration test: Full pipeline (load → clean → grade → train → predict)

use gradecast::error::GradecastError;
use gradecast::grading::GradeRules;
use gradecast::predict::Predictor;
use gradecast::schema::TableCleaner;
use gradecast::tracking::ExperimentLog;
use gradecast::training::{Trainer, TrainerConfig};
use gradecast::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::path::{Path, PathBuf};

const BANDS: [(&str, [f64; 4]); 5] = [
    ("A", [90.0, 90.0, 90.0, 80.0]),
    ("B", [80.0, 80.0, 80.0, 70.0]),
    ("C", [65.0, 65.0, 65.0, 60.0]),
    ("D", [55.0, 55.0, 55.0, 45.0]),
    ("Fail", [30.0, 80.0, 80.0, 80.0]),
];

/// Eight students per grade band. `with_expected` adds an `Expected` column
/// holding the grade each row earns under the default rules.
fn scores_df(with_expected: bool) -> DataFrame {
    let mut names = Vec::new();
    let mut math = Vec::new();
    let mut science = Vec::new();
    let mut english = Vec::new();
    let mut history = Vec::new();
    let mut expected = Vec::new();
    for (band, (grade, base)) in BANDS.iter().enumerate() {
        for i in 0..8 {
            names.push(format!("student_{}_{}", band, i));
            math.push(base[0] + i as f64 * 0.5);
            science.push(base[1]);
            english.push(base[2]);
            history.push(base[3]);
            expected.push(grade.to_string());
        }
    }

    let mut columns = vec![
        Column::new("Name".into(), names),
        Column::new("Math".into(), math),
        Column::new("Science".into(), science),
        Column::new("English".into(), english),
        Column::new("History".into(), history),
    ];
    if with_expected {
        columns.push(Column::new("Expected".into(), expected));
    }
    DataFrame::new(columns).unwrap()
}

fn write_csv(df: &mut DataFrame, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    DataSaver::save_csv(df, &path).unwrap();
    path
}

/// Train on every row so the tree reproduces the labels it was fitted on,
/// then check the whole disk round trip: store, reload, predict, export.
#[test]
fn test_csv_to_predictions_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let train_csv = write_csv(&mut scores_df(false), dir.path(), "scores.csv");

    let raw = DataLoader::new().load(&train_csv).unwrap();
    let cleaned = TableCleaner::new().clean(&raw).unwrap();
    let labeled = GradeRules::default().label(&cleaned).unwrap();

    let track_dir = dir.path().join("runs");
    let trainer = Trainer::new(TrainerConfig::default().with_train_fraction(1.0))
        .with_observer(Box::new(ExperimentLog::new(&track_dir)));
    let outcome = trainer.train(&labeled).unwrap();

    let model_path = dir.path().join("models").join("grade_model.json");
    outcome.artifact.store(&model_path).unwrap();

    // fresh process: reload the artifact and score new input with expectations
    let predictor = Predictor::from_file(&model_path).unwrap();
    let predict_csv = write_csv(&mut scores_df(true), dir.path(), "incoming.csv");
    let incoming = DataLoader::new().load(&predict_csv).unwrap();
    let predictions = predictor.predict(&incoming).unwrap();

    assert_eq!(predictions.rows().len(), 40);
    assert_eq!(predictions.match_rate(), Some(1.0));

    // the run landed in the experiment log
    let runs = ExperimentLog::load_runs(&track_dir).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(
        runs[0].params.get("classifier").map(String::as_str),
        Some("decision_tree")
    );
    assert!(runs[0].metrics.contains_key("training_time_secs"));
}

#[test]
fn test_predictions_survive_csv_export() {
    let dir = tempfile::tempdir().unwrap();

    let raw = scores_df(false);
    let cleaned = TableCleaner::new().clean(&raw).unwrap();
    let labeled = GradeRules::default().label(&cleaned).unwrap();
    let outcome = Trainer::new(TrainerConfig::default().with_train_fraction(1.0))
        .train(&labeled)
        .unwrap();

    let predictions = Predictor::new(outcome.artifact)
        .predict(&scores_df(true))
        .unwrap();
    let out_path = dir.path().join("predicted.csv");
    DataSaver::save_csv(&mut predictions.into_df(), &out_path).unwrap();

    let reloaded = DataLoader::new().load(&out_path).unwrap();
    assert_eq!(reloaded.height(), 40);
    assert!(reloaded.column("PredictedGrade").is_ok());
    assert!(reloaded.column("Match").is_ok());

    let grades = reloaded.column("PredictedGrade").unwrap();
    let grades = grades.str().unwrap();
    assert_eq!(grades.get(0), Some("A"));
    assert_eq!(grades.get(39), Some("Fail"));
}

#[test]
fn test_missing_subjects_fail_before_scoring() {
    let raw = scores_df(false);
    let cleaned = TableCleaner::new().clean(&raw).unwrap();
    let labeled = GradeRules::default().label(&cleaned).unwrap();
    let outcome = Trainer::new(TrainerConfig::default()).train(&labeled).unwrap();

    // drop two of the trained subjects from the incoming table
    let partial = scores_df(false)
        .drop("English")
        .unwrap()
        .drop("History")
        .unwrap();
    let err = Predictor::new(outcome.artifact).predict(&partial).unwrap_err();
    match err {
        GradecastError::FeatureMismatch { missing } => {
            assert_eq!(missing, vec!["English".to_string(), "History".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_tampered_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let raw = scores_df(false);
    let cleaned = TableCleaner::new().clean(&raw).unwrap();
    let labeled = GradeRules::default().label(&cleaned).unwrap();
    let outcome = Trainer::new(TrainerConfig::default()).train(&labeled).unwrap();

    let model_path = dir.path().join("grade_model.json");
    outcome.artifact.store(&model_path).unwrap();

    let json = std::fs::read_to_string(&model_path).unwrap();
    std::fs::write(&model_path, &json[..json.len() / 2]).unwrap();

    let err = Predictor::from_file(&model_path).unwrap_err();
    assert!(matches!(err, GradecastError::ArtifactCorrupt(_)));
}
