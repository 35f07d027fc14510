// src/benchmark/recorder.rs — CSV result file, one row per (problem, system)

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::dataset::BenchmarkKind;
use crate::infra::errors::BenchError;

pub const HEADER: &[&str] = &[
    "problem_id",
    "system_name",
    "generated_code",
    "passed_test",
    "generation_latency_sec",
    "total_tokens_used",
    "loc",
    "cyclomatic_complexity",
    "has_imports",
    "has_docstring",
    "syntax_valid",
    "num_functions",
    "avg_exec_time_ns",
    "exec_time_status",
    "refinement_rounds",
    "error",
];

/// Field order must match `HEADER`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultRow {
    pub problem_id: String,
    pub system_name: String,
    /// Newlines escaped as a literal `\n` so each row stays on one line.
    pub generated_code: String,
    pub passed_test: bool,
    pub generation_latency_sec: f64,
    pub total_tokens_used: u32,
    pub loc: u32,
    pub cyclomatic_complexity: u32,
    pub has_imports: bool,
    pub has_docstring: bool,
    pub syntax_valid: bool,
    pub num_functions: u32,
    /// Empty when not measured.
    pub avg_exec_time_ns: Option<f64>,
    pub exec_time_status: String,
    pub refinement_rounds: u8,
    pub error: String,
}

pub fn escape_code(code: &str) -> String {
    code.replace("\r\n", "\n").replace('\n', "\\n")
}

/// Appends rows to a CSV sink, flushing after every row.
pub struct ResultRecorder<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl ResultRecorder<File> {
    /// Create `<dir>/results_<kind>_<YYYYmmdd_HHMMSS>.csv` and write the header.
    pub fn create(dir: &Path, kind: BenchmarkKind) -> Result<(Self, PathBuf), BenchError> {
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("results_{}_{}.csv", kind.label(), stamp));
        let file = File::create(&path)?;
        tracing::info!("Writing results to {}", path.display());
        Ok((Self::from_writer(file)?, path))
    }
}

impl<W: Write> ResultRecorder<W> {
    pub fn from_writer(inner: W) -> Result<Self, BenchError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn append(&mut self, row: &ResultRow) -> Result<(), BenchError> {
        self.writer.serialize(row)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, BenchError> {
        self.writer
            .into_inner()
            .map_err(|e| BenchError::Io(e.into_error()))
    }
}
