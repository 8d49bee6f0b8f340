//! Gradecast CLI Module
//!
//! Command-line interface for cleaning score tables, training grade
//! classifiers and scoring new students.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::grading::GradeRules;
use crate::predict::Predictor;
use crate::schema::{CleanConfig, TableCleaner};
use crate::tracking::ExperimentLog;
use crate::training::{ClassifierKind, Trainer, TrainerConfig};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gradecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Student grade cleaning, grading and prediction pipeline")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a raw score table and write the processed CSV
    Clean {
        /// Input table (CSV, TSV, JSON or JSONL)
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Leave the HasFailedSubject column out of the feature set
        #[arg(long)]
        no_fail_flag: bool,
    },

    /// Train a grade classifier on a score table
    Train {
        /// Input table (CSV, TSV, JSON or JSONL)
        #[arg(short, long)]
        data: PathBuf,

        /// Where to store the model artifact
        #[arg(short, long, default_value = "models/grade_model.json")]
        output: PathBuf,

        /// Classifier (decision_tree, random_forest)
        #[arg(short, long, default_value = "decision_tree")]
        model: String,

        /// Fraction of rows used for training
        #[arg(long, default_value_t = 0.8)]
        train_fraction: f64,

        /// Seed for the train/holdout shuffle
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Maximum tree depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Number of trees for a random forest
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Directory to append experiment records to
        #[arg(long)]
        track_dir: Option<PathBuf>,

        /// Leave the HasFailedSubject column out of the feature set
        #[arg(long)]
        no_fail_flag: bool,
    },

    /// Predict grades for new students with a stored model
    Predict {
        /// Trained model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Input table (CSV, TSV, JSON or JSONL)
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV with predictions appended
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show table information
    Info {
        /// Input table (CSV, TSV, JSON or JSONL)
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn cleaner_for(no_fail_flag: bool) -> TableCleaner {
    TableCleaner::with_config(CleanConfig::new().with_fail_flag(!no_fail_flag))
}

pub fn cmd_clean(data_path: &Path, output_path: &Path, no_fail_flag: bool) -> anyhow::Result<()> {
    section("Clean");

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run("Cleaning");
    let cleaned = cleaner_for(no_fail_flag).clean(&df)?;
    step_done(&format!(
        "{} subjects, {} feature columns",
        cleaned.spec().subjects().len(),
        cleaned.spec().n_features()
    ));

    step_run("Grading");
    let labeled = GradeRules::default().label(&cleaned)?;
    step_done(&format!("{} rows labeled", labeled.height()));

    println!();
    println!(
        "  {:<12} {}",
        muted("Subjects"),
        cleaned.spec().subjects().join(", ")
    );
    println!(
        "  {:<12} {}",
        muted("Features"),
        cleaned.spec().columns().join(", ")
    );

    step_run(&format!("Saving → {}", output_path.display()));
    let mut out = labeled.into_df();
    DataSaver::save_csv(&mut out, output_path)?;
    step_done(&format!("{} rows × {} cols", out.height(), out.width()));

    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &Path,
    output_path: &Path,
    model: &str,
    train_fraction: f64,
    seed: u64,
    max_depth: Option<usize>,
    trees: usize,
    track_dir: Option<&Path>,
    no_fail_flag: bool,
) -> anyhow::Result<()> {
    section("Train");

    let Some(kind) = ClassifierKind::parse(model) else {
        anyhow::bail!("invalid model type: {} (expected decision_tree or random_forest)", model);
    };

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run("Cleaning");
    let cleaned = cleaner_for(no_fail_flag).clean(&df)?;
    step_done(&format!("{} feature columns", cleaned.spec().n_features()));

    step_run("Grading");
    let labeled = GradeRules::default().label(&cleaned)?;
    step_done(&format!("{} rows labeled", labeled.height()));

    let mut config = TrainerConfig::new()
        .with_classifier(kind)
        .with_train_fraction(train_fraction)
        .with_seed(seed)
        .with_n_trees(trees);
    if let Some(depth) = max_depth {
        config = config.with_max_depth(depth);
    }

    let mut trainer = Trainer::new(config);
    if let Some(dir) = track_dir {
        trainer = trainer.with_observer(Box::new(ExperimentLog::new(dir)));
    }

    step_run(&format!("Training {}", model.cyan()));
    let outcome = trainer.train(&labeled)?;
    step_done(&format!(
        "{} train / {} holdout in {:.3}s",
        outcome.n_train, outcome.n_holdout, outcome.training_time_secs
    ));

    if let Some(report) = &outcome.report {
        println!();
        println!(
            "  {:<16} {}",
            muted("Accuracy"),
            format!("{:.4}", report.accuracy).white().bold()
        );
        println!(
            "  {:<16} {}",
            muted("Macro F1"),
            format!("{:.4}", report.macro_f1).white()
        );
        println!();
        println!(
            "  {:<8} {:>10} {:>8} {:>8} {:>8}",
            muted("Class"),
            muted("Precision"),
            muted("Recall"),
            muted("F1"),
            muted("Support")
        );
        println!("  {}", dim(&"─".repeat(46)));
        for class in &report.per_class {
            println!(
                "  {:<8} {:>10.3} {:>8.3} {:>8.3} {:>8}",
                class.label.as_str(),
                class.precision,
                class.recall,
                class.f1,
                class.support
            );
        }
    } else {
        println!();
        println!("  {}", dim("no holdout rows; metrics skipped"));
    }

    step_run(&format!("Saving → {}", output_path.display()));
    outcome.artifact.store(output_path)?;
    step_done("artifact written");

    println!();
    Ok(())
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let predictor = Predictor::from_file(model_path)?;
    step_done(&format!(
        "{} with {} features",
        predictor.artifact().classifier.kind(),
        predictor.artifact().features.n_features()
    ));

    step_run("Loading data");
    let df = DataLoader::new().load(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let table = predictor.predict(&df)?;

    println!();
    for row in table.rows() {
        match (&row.expected, row.matched) {
            (Some(expected), Some(true)) => println!(
                "  {:<20} {:<5} {} {}",
                row.name,
                row.predicted.as_str(),
                ok("✓"),
                dim(&format!("expected {}", expected))
            ),
            (Some(expected), Some(false)) => println!(
                "  {:<20} {:<5} {} {}",
                row.name,
                row.predicted.as_str(),
                "✗".red(),
                dim(&format!("expected {}", expected))
            ),
            _ => println!("  {:<20} {}", row.name, row.predicted.as_str()),
        }
    }

    if let Some(rate) = table.match_rate() {
        println!();
        println!(
            "  {:<16} {}",
            muted("Match rate"),
            format!("{:.1}%", rate * 100.0).white().bold()
        );
    }

    if let Some(path) = output_path {
        step_run(&format!("Saving → {}", path.display()));
        let mut out = table.into_df();
        DataSaver::save_csv(&mut out, path)?;
        step_done(&format!("{} rows × {} cols", out.height(), out.width()));
    }

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Table Info");

    let df = DataLoader::new().load(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!(
        "  {:<20} {:<12} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(50)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    match TableCleaner::new().clean(&df) {
        Ok(cleaned) => {
            println!();
            println!(
                "  {:<12} {}",
                muted("Subjects"),
                cleaned.spec().subjects().join(", ")
            );
        }
        Err(e) => {
            println!();
            println!("  {} {}", "not cleanable:".yellow(), dim(&e.to_string()));
        }
    }

    println!();
    Ok(())
}
