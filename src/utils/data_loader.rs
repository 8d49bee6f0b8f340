//! Table loading and saving

use crate::error::{GradecastError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loads raw tables from disk, dispatching on file extension
pub struct DataLoader {
    has_header: bool,
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            has_header: true,
            infer_schema_length: Some(100),
        }
    }

    /// Treat the first row as data instead of a header
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Rows polars samples when inferring column types
    pub fn with_infer_schema_length(mut self, length: Option<usize>) -> Self {
        self.infer_schema_length = length;
        self
    }

    /// Load a table, picking the reader from the file extension.
    ///
    /// `.csv` and `.tsv` go through the CSV reader, `.json` and `.jsonl`
    /// through the JSON reader. Anything else is rejected rather than
    /// guessed at.
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(GradecastError::InputNotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => self.load_csv(path, b','),
            "tsv" => self.load_csv(path, b'\t'),
            "json" | "jsonl" => self.load_json(path),
            other => Err(GradecastError::InvalidInput(format!(
                "unsupported input format '{}' for {} (expected csv, tsv, json or jsonl)",
                other,
                path.display()
            ))),
        }
    }

    fn load_csv(&self, path: &Path, separator: u8) -> Result<DataFrame> {
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(separator);
        let df = CsvReadOptions::default()
            .with_has_header(self.has_header)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;
        Ok(df)
    }

    fn load_json(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;
        Ok(JsonReader::new(file).finish()?)
    }
}

/// Writes tables back to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV, creating parent directories as needed
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}
