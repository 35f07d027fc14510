// src/evaluator/correctness.rs — Run a problem's tests against generated code

use std::sync::Arc;
use std::time::Duration;

use super::python::{tail, PythonRunner, ScriptRun};
use crate::benchmark::dataset::{Problem, TestSpec};
use crate::core::types::Draft;

const STDERR_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Passed,
    Failed {
        exit_code: Option<i32>,
        stderr_tail: String,
    },
    TimedOut,
    /// Not executed: the draft is a failure or carries an error marker.
    Skipped { reason: String },
    /// The harness itself could not run.
    Error { message: String },
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    /// Short reason for the result file, empty when the check passed.
    pub fn reason(&self) -> String {
        match self {
            CheckOutcome::Passed => String::new(),
            CheckOutcome::Failed {
                exit_code,
                stderr_tail,
            } => {
                let last = stderr_tail.lines().last().unwrap_or("");
                match exit_code {
                    Some(code) => format!("exit {}: {}", code, last),
                    None => format!("killed: {}", last),
                }
            }
            CheckOutcome::TimedOut => "timed out".into(),
            CheckOutcome::Skipped { reason } => reason.clone(),
            CheckOutcome::Error { message } => message.clone(),
        }
    }
}

/// Assemble the test script: code, blank line, then the harness.
pub fn build_test_script(problem: &Problem, code: &str) -> Result<String, String> {
    let mut script = String::with_capacity(code.len() + 512);
    script.push_str(code);
    script.push_str("\n\n");

    match &problem.tests {
        TestSpec::CheckFunction { source } => {
            let entry = problem
                .entry_point
                .as_deref()
                .ok_or_else(|| format!("{} has no entry point", problem.id))?;
            script.push_str(source);
            script.push_str(&format!("\ncheck({})\n", entry));
        }
        TestSpec::Assertions { setup, asserts } => {
            script.push_str("import sys\n");
            if !setup.trim().is_empty() {
                script.push_str(setup);
                script.push('\n');
            }
            for assertion in asserts {
                script.push_str(&format!(
                    "try:\n    {}\nexcept AssertionError:\n    print('Test Failed')\n    sys.exit(1)\n",
                    assertion.trim()
                ));
            }
            script.push_str("print('All Tests Passed')\n");
        }
    }
    Ok(script)
}

pub struct CorrectnessChecker {
    python: Arc<PythonRunner>,
    timeout: Duration,
}

impl CorrectnessChecker {
    pub fn new(python: Arc<PythonRunner>, timeout: Duration) -> Self {
        Self { python, timeout }
    }

    pub async fn check(&self, problem: &Problem, draft: &Draft) -> CheckOutcome {
        let code = match draft {
            Draft::Failed { reason } => {
                return CheckOutcome::Skipped {
                    reason: format!("generation failed: {}", reason),
                }
            }
            Draft::Code(code) if code.contains("ERROR") => {
                return CheckOutcome::Skipped {
                    reason: "code contains an error marker".into(),
                }
            }
            Draft::Code(code) => code,
        };

        let script = match build_test_script(problem, code) {
            Ok(s) => s,
            Err(message) => return CheckOutcome::Error { message },
        };

        match self.python.run_script(&script, self.timeout).await {
            Ok(run) if run.succeeded() => CheckOutcome::Passed,
            Ok(ScriptRun::Exited {
                code,
                stdout,
                stderr,
                ..
            }) => {
                let detail = if stderr.trim().is_empty() { stdout } else { stderr };
                CheckOutcome::Failed {
                    exit_code: code,
                    stderr_tail: tail(&detail, STDERR_TAIL_LINES),
                }
            }
            Ok(ScriptRun::TimedOut) => CheckOutcome::TimedOut,
            Err(e) => {
                tracing::warn!("Could not run tests for {}: {}", problem.id, e);
                CheckOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn humaneval_add() -> Problem {
        Problem {
            id: "HumanEval/0".into(),
            prompt: "def add(a, b):\n".into(),
            entry_point: Some("add".into()),
            tests: TestSpec::CheckFunction {
                source: concat!(
                    "def check(candidate):\n",
                    "    assert candidate(1, 2) == 3\n",
                    "    assert candidate(-1, 1) == 0\n"
                )
                .into(),
            },
        }
    }

    fn mbpp_square() -> Problem {
        Problem {
            id: "2".into(),
            prompt: "Square a number".into(),
            entry_point: Some("square".into()),
            tests: TestSpec::Assertions {
                setup: String::new(),
                asserts: vec!["assert square(3) == 9".into(), "assert square(-2) == 4".into()],
            },
        }
    }

    fn checker() -> Option<CorrectnessChecker> {
        let python = PythonRunner::resolve(None).ok()?;
        Some(CorrectnessChecker::new(Arc::new(python), Duration::from_secs(5)))
    }

    #[test]
    fn test_humaneval_script_shape() {
        let script =
            build_test_script(&humaneval_add(), "def add(a, b):\n    return a + b").unwrap();
        assert!(script.starts_with("def add(a, b):\n    return a + b\n\ndef check(candidate):"));
        assert!(script.ends_with("\ncheck(add)\n"));
    }

    #[test]
    fn test_mbpp_script_wraps_each_assertion() {
        let script = build_test_script(&mbpp_square(), "def square(x):\n    return x * x").unwrap();
        assert!(script.contains("import sys\n"));
        assert_eq!(script.matches("except AssertionError:").count(), 2);
        assert!(script.contains("try:\n    assert square(3) == 9\n"));
        assert!(script.ends_with("print('All Tests Passed')\n"));
    }

    #[test]
    fn test_missing_entry_point_is_harness_error() {
        let mut p = humaneval_add();
        p.entry_point = None;
        assert!(build_test_script(&p, "x = 1").is_err());
    }

    #[tokio::test]
    async fn test_error_marker_never_executes() {
        // No interpreter needed: the check short-circuits.
        let checker = CorrectnessChecker::new(
            Arc::new(PythonRunner::new("/nonexistent/python")),
            Duration::from_secs(1),
        );
        let p = humaneval_add();
        let outcome = checker
            .check(&p, &Draft::Code("# ERROR\ndef add(a, b):\n    return a + b".into()))
            .await;
        assert!(matches!(outcome, CheckOutcome::Skipped { .. }));
        let outcome = checker.check(&p, &Draft::failed("timeout")).await;
        assert!(!outcome.passed());
    }

    #[tokio::test]
    async fn test_check_pass_fail_and_timeout() {
        let Some(checker) = checker() else {
            eprintln!("skipping: no python interpreter");
            return;
        };
        let p = humaneval_add();
        let ok = checker
            .check(&p, &Draft::Code("def add(a, b):\n    return a + b".into()))
            .await;
        assert_eq!(ok, CheckOutcome::Passed);

        let wrong = checker
            .check(&p, &Draft::Code("def add(a, b):\n    return a - b".into()))
            .await;
        match &wrong {
            CheckOutcome::Failed { exit_code, stderr_tail } => {
                assert_eq!(*exit_code, Some(1));
                assert!(stderr_tail.contains("AssertionError"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let mbpp = mbpp_square();
        let failed = checker
            .check(&mbpp, &Draft::Code("def square(x):\n    return x + x".into()))
            .await;
        assert!(!failed.passed());
        assert!(failed.reason().contains("Test Failed"));
    }

    #[tokio::test]
    async fn test_infinite_loop_times_out() {
        let Some(python) = PythonRunner::resolve(None).ok() else {
            return;
        };
        let checker = CorrectnessChecker::new(Arc::new(python), Duration::from_millis(500));
        let spin = Draft::Code("def add(a, b):\n    while True:\n        pass".into());
        let outcome = checker.check(&humaneval_add(), &spin).await;
        assert_eq!(outcome, CheckOutcome::TimedOut);
    }
}
