// src/evaluator/timing.rs — Best-effort execution timing of generated code

use std::sync::Arc;
use std::time::Duration;

use super::python::{tail, PythonRunner, ScriptRun};
use super::syntax;
use crate::benchmark::dataset::Problem;
use crate::core::types::Draft;

/// Imports made available to the timed code, matching what models assume.
pub const SETUP_IMPORTS: &str = "from typing import List, Tuple, Optional, Dict, Any, Set
import re
import math
import statistics
import heapq
import collections
from collections import Counter, defaultdict
from itertools import chain
";

/// (per-run ns upper bound, iterations) from the 10-run calibration; slower
/// calls fall through to `SLOW_ITERATIONS`.
const ITERATION_TIERS: &[(u64, u32)] = &[
    (1_000_000, 10_000),
    (10_000_000, 1_000),
    (100_000_000, 100),
];
const SLOW_ITERATIONS: u32 = 10;
const CALIBRATION_RUNS: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum TimingOutcome {
    Measured { avg_ns: f64, iterations: u32 },
    /// No call expression could be derived.
    NoInputs,
    CallFailed { detail: String },
    TimedOut,
    /// Not attempted: failed draft or timing disabled.
    Skipped,
}

impl TimingOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            TimingOutcome::Measured { .. } => "measured",
            TimingOutcome::NoInputs => "no_inputs",
            TimingOutcome::CallFailed { .. } => "call_failed",
            TimingOutcome::TimedOut => "timed_out",
            TimingOutcome::Skipped => "skipped",
        }
    }

    pub fn avg_ns(&self) -> Option<f64> {
        match self {
            TimingOutcome::Measured { avg_ns, .. } => Some(*avg_ns),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStrategy {
    /// A `>>>` example in the prompt.
    DocExample,
    /// Left-hand side of the first `assert X == Y` test.
    TestAssertion,
    /// Guessed from the entry point's parameter names.
    ParameterNames,
    /// Guessed from keywords in the problem text.
    Keywords,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallGuess {
    pub expr: String,
    pub strategy: CallStrategy,
}

/// Derive a call expression to time, trying examples first and guesses last.
pub fn synthesize_call(problem: &Problem, code: &str) -> Option<CallGuess> {
    let entry = problem.entry_point.as_deref();

    if let Some(entry) = entry {
        let example = problem
            .prompt
            .lines()
            .filter(|line| line.contains(entry))
            .find_map(|line| line.split_once(">>>").map(|(_, call)| call.trim()))
            .filter(|call| !call.is_empty());
        if let Some(call) = example {
            return Some(CallGuess {
                expr: call.to_string(),
                strategy: CallStrategy::DocExample,
            });
        }
    }

    if let Some(call) = problem.first_assertion().and_then(assertion_call) {
        return Some(CallGuess {
            expr: call,
            strategy: CallStrategy::TestAssertion,
        });
    }

    let entry = entry?;
    if let Some(params) = syntax::function_parameters(code, entry) {
        let args: Vec<&str> = params.iter().map(|p| guess_argument(p)).collect();
        return Some(CallGuess {
            expr: format!("{}({})", entry, args.join(", ")),
            strategy: CallStrategy::ParameterNames,
        });
    }

    let text = problem.prompt.to_lowercase();
    let arg = if text.contains("list") {
        "[1, 2, 3]"
    } else if text.contains("string") {
        "'test'"
    } else if text.contains("int") {
        "5"
    } else {
        ""
    };
    Some(CallGuess {
        expr: format!("{}({})", entry, arg),
        strategy: CallStrategy::Keywords,
    })
}

fn assertion_call(assertion: &str) -> Option<String> {
    let body = assertion.trim().strip_prefix("assert ")?;
    let (lhs, _) = body.split_once("==")?;
    let lhs = lhs.trim();
    (!lhs.is_empty()).then(|| lhs.to_string())
}

fn guess_argument(param: &str) -> &'static str {
    let name = param.to_lowercase();
    if name.contains("list") || name.contains("arr") {
        "[1, 2, 3]"
    } else if name.contains("str") || name.contains("text") {
        "'test'"
    } else if name.contains("dict") {
        "{}"
    } else {
        "1"
    }
}

fn setup_code(code: &str) -> String {
    format!("{}\n{}\n", SETUP_IMPORTS, code)
}

/// Script that runs the call once.
pub fn verify_script(code: &str, call: &str) -> String {
    format!("{}\n{}\n", setup_code(code), call)
}

/// Script that calibrates, measures and prints `{"avg_ns", "iterations"}`.
pub fn timing_script(code: &str, call: &str) -> String {
    // JSON string literals are valid Python string literals.
    let setup = serde_json::to_string(&setup_code(code)).unwrap_or_default();
    let stmt = serde_json::to_string(call).unwrap_or_default();
    let tiers = serde_json::to_string(ITERATION_TIERS).unwrap_or_default();
    format!(
        r#"import json as __json
import time as __time

__globals = {{}}
exec({setup}, __globals)
__stmt = compile({stmt}, "<timed>", "exec")


def __run(n):
    start = __time.perf_counter_ns()
    for _ in range(n):
        exec(__stmt, __globals.copy())
    return __time.perf_counter_ns() - start


__per_run = __run({calibration}) / {calibration}
__iterations = next((n for limit, n in {tiers} if __per_run < limit), {slow})
__avg = __run(__iterations) / __iterations
print(__json.dumps({{"avg_ns": __avg, "iterations": __iterations}}))
"#,
        setup = setup,
        stmt = stmt,
        tiers = tiers,
        calibration = CALIBRATION_RUNS,
        slow = SLOW_ITERATIONS,
    )
}

/// Read the JSON result from the last non-empty stdout line.
fn parse_timing_output(stdout: &str) -> Option<(f64, u32)> {
    let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    let avg = value["avg_ns"].as_f64()?;
    let iterations = u32::try_from(value["iterations"].as_u64()?).ok()?;
    Some((avg, iterations))
}

pub struct ExecTimer {
    python: Arc<PythonRunner>,
    verify_timeout: Duration,
    run_timeout: Duration,
}

impl ExecTimer {
    pub fn new(python: Arc<PythonRunner>, verify_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            python,
            verify_timeout,
            run_timeout,
        }
    }

    pub async fn measure(&self, problem: &Problem, draft: &Draft) -> TimingOutcome {
        let code = match draft {
            Draft::Code(code) if !code.trim().is_empty() && !code.contains("ERROR") => code,
            _ => return TimingOutcome::Skipped,
        };
        let Some(call) = synthesize_call(problem, code) else {
            return TimingOutcome::NoInputs;
        };
        tracing::debug!("Timing {} with {:?} call `{}`", problem.id, call.strategy, call.expr);

        let verify = verify_script(code, &call.expr);
        if let Err(outcome) = self.run(&verify, self.verify_timeout).await {
            return outcome;
        }

        match self.run(&timing_script(code, &call.expr), self.run_timeout).await {
            Ok(stdout) => match parse_timing_output(&stdout) {
                Some((avg_ns, iterations)) => TimingOutcome::Measured { avg_ns, iterations },
                None => TimingOutcome::CallFailed {
                    detail: "unreadable timing output".into(),
                },
            },
            Err(outcome) => outcome,
        }
    }

    /// Run a script, returning stdout on success or the terminal outcome.
    async fn run(&self, script: &str, timeout: Duration) -> Result<String, TimingOutcome> {
        match self.python.run_script(script, timeout).await {
            Ok(ScriptRun::Exited {
                success: true,
                stdout,
                ..
            }) => Ok(stdout),
            Ok(ScriptRun::Exited { stderr, .. }) => Err(TimingOutcome::CallFailed {
                detail: tail(&stderr, 1),
            }),
            Ok(ScriptRun::TimedOut) => Err(TimingOutcome::TimedOut),
            Err(e) => Err(TimingOutcome::CallFailed {
                detail: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::dataset::TestSpec;

    fn problem(prompt: &str, entry: Option<&str>, tests: TestSpec) -> Problem {
        Problem {
            id: "t".into(),
            prompt: prompt.into(),
            entry_point: entry.map(String::from),
            tests,
        }
    }

    fn check_fn() -> TestSpec {
        TestSpec::CheckFunction {
            source: "def check(candidate):\n    pass\n".into(),
        }
    }

    #[test]
    fn test_doc_example_preferred() {
        let p = problem(
            "def incr_list(l: list):\n    \"\"\"\n    >>> incr_list([1, 2, 3])\n    [2, 3, 4]\n    \"\"\"\n",
            Some("incr_list"),
            check_fn(),
        );
        let call = synthesize_call(&p, "def incr_list(l):\n    return [x + 1 for x in l]").unwrap();
        assert_eq!(call.expr, "incr_list([1, 2, 3])");
        assert_eq!(call.strategy, CallStrategy::DocExample);
    }

    #[test]
    fn test_assertion_lhs() {
        let p = problem(
            "Square a number",
            Some("square"),
            TestSpec::Assertions {
                setup: String::new(),
                asserts: vec!["assert square(4) == 16".into()],
            },
        );
        let call = synthesize_call(&p, "def square(x):\n    return x * x").unwrap();
        assert_eq!(call.expr, "square(4)");
        assert_eq!(call.strategy, CallStrategy::TestAssertion);
    }

    #[test]
    fn test_parameter_name_guess() {
        let p = problem("Do something.", Some("solve"), check_fn());
        let code = "def solve(arr, text, mapping_dict, n):\n    return n";
        let call = synthesize_call(&p, code).unwrap();
        assert_eq!(call.expr, "solve([1, 2, 3], 'test', {}, 1)");
        assert_eq!(call.strategy, CallStrategy::ParameterNames);
    }

    #[test]
    fn test_keyword_fallback() {
        let p = problem("Given a string, reverse it.", Some("rev"), check_fn());
        // Entry point not defined in the code, so parameters are unknown.
        let call = synthesize_call(&p, "x = 1").unwrap();
        assert_eq!(call.expr, "rev('test')");
        assert_eq!(call.strategy, CallStrategy::Keywords);

        let p = problem("Return nothing useful.", Some("noop"), check_fn());
        assert_eq!(synthesize_call(&p, "x = 1").unwrap().expr, "noop()");
    }

    #[test]
    fn test_no_entry_point_no_inputs() {
        let p = problem("No hints here", None, check_fn());
        assert!(synthesize_call(&p, "def f(): pass").is_none());
    }

    #[test]
    fn test_timing_script_embeds_literals() {
        let script = timing_script("def f(s):\n    return \"x\" + s", "f('a')");
        assert!(script.contains(r#"compile("f('a')", "<timed>", "exec")"#));
        assert!(script.contains("[[1000000,10000],[10000000,1000],[100000000,100]]"));
        assert!(script.contains("perf_counter_ns"));
        assert!(script.contains(r#"return \"x\" + s"#));
    }

    #[test]
    fn test_parse_timing_output_uses_last_line() {
        let out = "debug print\n{\"avg_ns\": 1234.5, \"iterations\": 10000}\n";
        assert_eq!(parse_timing_output(out), Some((1234.5, 10000)));
        assert_eq!(parse_timing_output("nothing"), None);
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(TimingOutcome::NoInputs.status(), "no_inputs");
        assert_eq!(
            TimingOutcome::Measured {
                avg_ns: 10.0,
                iterations: 10
            }
            .avg_ns(),
            Some(10.0)
        );
        assert_eq!(TimingOutcome::TimedOut.avg_ns(), None);
    }

    #[tokio::test]
    async fn test_measure_real_function() {
        let Ok(python) = PythonRunner::resolve(None) else {
            eprintln!("skipping: no python interpreter");
            return;
        };
        let timer = ExecTimer::new(
            Arc::new(python),
            Duration::from_secs(20),
            Duration::from_secs(60),
        );
        let p = problem("Add two numbers", Some("add"), check_fn());

        let outcome = timer
            .measure(&p, &Draft::Code("def add(a, b):\n    return a + b".into()))
            .await;
        match outcome {
            TimingOutcome::Measured { avg_ns, iterations } => {
                assert!(avg_ns > 0.0);
                assert_eq!(iterations, 10_000);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let broken = timer
            .measure(&p, &Draft::Code("def add(a, b):\n    return a / 0".into()))
            .await;
        assert!(matches!(broken, TimingOutcome::CallFailed { .. }));

        let failed = timer.measure(&p, &Draft::failed("no reply")).await;
        assert_eq!(failed, TimingOutcome::Skipped);
    }
}
