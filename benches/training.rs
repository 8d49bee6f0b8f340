use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gradecast::grading::GradeRules;
use gradecast::predict::Predictor;
use gradecast::schema::{CleanedTable, TableCleaner};
use gradecast::training::{ClassifierKind, Trainer, TrainerConfig};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn synthetic_scores(n_rows: usize, n_subjects: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let names: Vec<String> = (0..n_rows).map(|i| format!("student_{}", i)).collect();
    let mut columns = vec![Column::new("Name".into(), names)];
    for s in 0..n_subjects {
        let scores: Vec<f64> = (0..n_rows).map(|_| rng.gen::<f64>() * 100.0).collect();
        columns.push(Column::new(format!("Subject{}", s).into(), scores));
    }
    DataFrame::new(columns).unwrap()
}

fn labeled_table(df: &DataFrame) -> CleanedTable {
    let cleaned = TableCleaner::new().clean(df).unwrap();
    GradeRules::default().label(&cleaned).unwrap()
}

fn bench_cleaning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cleaning");

    for n_rows in [1_000, 10_000].iter() {
        let df = synthetic_scores(*n_rows, 6);
        let cleaner = TableCleaner::new();

        group.bench_with_input(BenchmarkId::new("clean", n_rows), &df, |b, df| {
            b.iter(|| cleaner.clean(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 2_000].iter() {
        let table = labeled_table(&synthetic_scores(*n_rows, 6));

        group.bench_with_input(BenchmarkId::new("tree", n_rows), &table, |b, table| {
            b.iter(|| {
                Trainer::new(TrainerConfig::default())
                    .train(black_box(table))
                    .unwrap()
            })
        });
    }

    let table = labeled_table(&synthetic_scores(500, 6));
    for n_trees in [10, 50].iter() {
        group.bench_with_input(BenchmarkId::new("forest", n_trees), &table, |b, table| {
            b.iter(|| {
                let config = TrainerConfig::default()
                    .with_classifier(ClassifierKind::RandomForest)
                    .with_n_trees(*n_trees);
                Trainer::new(config).train(black_box(table)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let table = labeled_table(&synthetic_scores(2_000, 6));
    let outcome = Trainer::new(TrainerConfig::default()).train(&table).unwrap();
    let predictor = Predictor::new(outcome.artifact);

    for n_rows in [100, 1_000, 5_000].iter() {
        let df = synthetic_scores(*n_rows, 6);

        group.bench_with_input(BenchmarkId::new("predict", n_rows), &df, |b, df| {
            b.iter(|| predictor.predict(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cleaning, bench_training, bench_prediction);
criterion_main!(benches);
