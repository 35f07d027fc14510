// src/evaluator/python.rs — Run Python scripts in a subprocess with a timeout

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::infra::errors::BenchError;

const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

/// Outcome of one script execution.
#[derive(Debug, Clone)]
pub enum ScriptRun {
    Exited {
        code: Option<i32>,
        success: bool,
        stdout: String,
        stderr: String,
    },
    TimedOut,
}

impl ScriptRun {
    pub fn succeeded(&self) -> bool {
        matches!(self, ScriptRun::Exited { success: true, .. })
    }
}

/// A resolved Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    interpreter: PathBuf,
}

impl PythonRunner {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Use the configured interpreter, or the first of `python3`/`python` on PATH.
    pub fn resolve(configured: Option<&str>) -> Result<Self, BenchError> {
        if let Some(name) = configured {
            return which::which(name).map(Self::new).map_err(|e| {
                BenchError::Config(format!("Python interpreter '{}' not found: {}", name, e))
            });
        }
        INTERPRETER_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or_else(|| {
                BenchError::Config(format!(
                    "no Python interpreter on PATH (tried {})",
                    INTERPRETER_CANDIDATES.join(", ")
                ))
            })
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    /// Write `source` to a temporary `.py` file and run it. The child is
    /// killed if it outlives `timeout`; the file is removed afterwards.
    pub async fn run_script(
        &self,
        source: &str,
        timeout: Duration,
    ) -> Result<ScriptRun, BenchError> {
        let mut script = tempfile::Builder::new()
            .prefix("codegen-bench-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(source.as_bytes())?;
        script.flush()?;

        let child = Command::new(&self.interpreter)
            .arg(script.path())
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output?;
                Ok(ScriptRun::Exited {
                    code: output.status.code(),
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            Err(_) => {
                tracing::debug!("Script exceeded {:?}, killed", timeout);
                Ok(ScriptRun::TimedOut)
            }
        }
    }
}

/// Last `max_lines` non-empty lines of process output.
pub fn tail(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}
