//! Experiment tracking
//!
//! Training runs can report their parameters and holdout metrics to any
//! number of observers. The built-in [`ExperimentLog`] appends one JSON line
//! per run to `runs.jsonl` under a chosen directory, which keeps the history
//! greppable and safe to append to across processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One training run: identity, parameters and resulting metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    /// Configuration the run was launched with
    pub params: BTreeMap<String, String>,
    /// Holdout metrics, empty when no holdout existed
    pub metrics: BTreeMap<String, f64>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_metric(mut self, key: &str, value: f64) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }
}

impl Default for RunRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer notified after each completed training run.
///
/// Observer failures never fail training; the trainer logs and moves on.
pub trait RunObserver: Send + Sync {
    fn record_run(&self, run: &RunRecord) -> std::result::Result<(), String>;
}

/// Appends run records to `<dir>/runs.jsonl`, one JSON object per line
pub struct ExperimentLog {
    dir: PathBuf,
}

impl ExperimentLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join("runs.jsonl")
    }

    fn append(&self, run: &RunRecord) -> std::result::Result<(), String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("failed to create {}: {}", self.dir.display(), e))?;

        let line = serde_json::to_string(run)
            .map_err(|e| format!("failed to serialize run {}: {}", run.run_id, e))?;

        let path = self.log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
        writeln!(file, "{}", line).map_err(|e| format!("failed to append run record: {}", e))?;
        Ok(())
    }

    /// Read back every recorded run, skipping lines that fail to parse
    pub fn load_runs(dir: &Path) -> std::result::Result<Vec<RunRecord>, String> {
        let path = dir.join("runs.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Ok(contents
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

impl RunObserver for ExperimentLog {
    fn record_run(&self, run: &RunRecord) -> std::result::Result<(), String> {
        self.append(run)
    }
}
