// src/benchmark/dataset.rs — HumanEval / MBPP problem loading

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

use crate::infra::errors::BenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum BenchmarkKind {
    #[value(name = "humaneval")]
    HumanEval,
    #[value(name = "mbpp")]
    Mbpp,
}

impl BenchmarkKind {
    /// Label used in result file names and the summary.
    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkKind::HumanEval => "HumanEval",
            BenchmarkKind::Mbpp => "MBPP",
        }
    }

    pub fn default_dataset(&self) -> &'static str {
        match self {
            BenchmarkKind::HumanEval => "data/human-eval-v2-20210705.jsonl",
            BenchmarkKind::Mbpp => "data/mbpp.jsonl",
        }
    }
}

impl std::fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a problem's tests are expressed.
#[derive(Debug, Clone, PartialEq)]
pub enum TestSpec {
    /// A `check(candidate)` function, invoked with the entry point.
    CheckFunction { source: String },
    /// Setup code followed by standalone `assert` statements.
    Assertions { setup: String, asserts: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub id: String,
    pub prompt: String,
    pub entry_point: Option<String>,
    pub tests: TestSpec,
}

impl Problem {
    /// First assertion, used as an example call.
    pub fn first_assertion(&self) -> Option<&str> {
        match &self.tests {
            TestSpec::Assertions { asserts, .. } => asserts.first().map(|s| s.as_str()),
            TestSpec::CheckFunction { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawProblem {
    task_id: serde_json::Value,
    prompt: Option<String>,
    text: Option<String>,
    entry_point: Option<String>,
    test: Option<String>,
    #[serde(default)]
    test_list: Vec<String>,
    #[serde(default)]
    test_setup_code: String,
}

/// Load up to `limit` problems from a JSONL file.
pub fn load_problems(
    path: &Path,
    kind: BenchmarkKind,
    limit: Option<usize>,
) -> Result<Vec<Problem>, BenchError> {
    if !path.exists() {
        return Err(BenchError::DatasetMissing {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let problems = parse_problems(&content, kind, limit)?;
    tracing::info!("Loaded {} {} problems from {}", problems.len(), kind, path.display());
    Ok(problems)
}

/// Parse JSONL content. Blank lines are skipped; line numbers are 1-based.
pub fn parse_problems(
    content: &str,
    kind: BenchmarkKind,
    limit: Option<usize>,
) -> Result<Vec<Problem>, BenchError> {
    let mut problems = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if limit.is_some_and(|n| problems.len() >= n) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let raw: RawProblem = serde_json::from_str(line).map_err(|e| BenchError::Dataset {
            line: line_no,
            message: e.to_string(),
        })?;
        let problem = into_problem(raw, kind).map_err(|message| BenchError::Dataset {
            line: line_no,
            message,
        })?;
        problems.push(problem);
    }
    Ok(problems)
}

fn into_problem(raw: RawProblem, kind: BenchmarkKind) -> Result<Problem, String> {
    let id = match &raw.task_id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => return Err(format!("unsupported task_id {}", other)),
    };
    let prompt = raw
        .prompt
        .or(raw.text)
        .ok_or_else(|| format!("{}: missing 'prompt' or 'text'", id))?;

    match kind {
        BenchmarkKind::HumanEval => {
            let source = raw
                .test
                .ok_or_else(|| format!("{}: missing 'test'", id))?;
            Ok(Problem {
                id,
                prompt,
                entry_point: raw.entry_point.filter(|e| !e.is_empty()),
                tests: TestSpec::CheckFunction { source },
            })
        }
        BenchmarkKind::Mbpp => {
            if raw.test_list.is_empty() {
                return Err(format!("{}: empty 'test_list'", id));
            }
            let first = &raw.test_list[0];
            let entry_point = raw
                .entry_point
                .filter(|e| !e.is_empty())
                .or_else(|| entry_point_from_assert(first));
            let prompt = format!(
                "{}\nYour code should pass this test:\n{}",
                prompt.trim_end(),
                first
            );
            Ok(Problem {
                id,
                prompt,
                entry_point,
                tests: TestSpec::Assertions {
                    setup: raw.test_setup_code,
                    asserts: raw.test_list,
                },
            })
        }
    }
}

const WRAPPER_CALLS: &[&str] = &[
    "set", "sorted", "list", "tuple", "dict", "frozenset", "round", "abs", "len", "str", "int",
    "float", "bool", "isclose", "all", "any", "max", "min", "sum",
];

fn call_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^.\w])([A-Za-z_]\w*)\s*\(").expect("valid regex"))
}

/// First called name in an assertion that is not a wrapping builtin:
/// `assert set(similar_elements(a, b)) == ...` gives `similar_elements`.
pub fn entry_point_from_assert(assertion: &str) -> Option<String> {
    let body = assertion.trim().strip_prefix("assert")?;
    call_pattern()
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|name| !WRAPPER_CALLS.contains(name))
        .map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HUMANEVAL_LINE: &str = r#"{"task_id": "HumanEval/0", "prompt": "def add(a, b):\n    \"\"\"Add.\"\"\"\n", "entry_point": "add", "test": "def check(candidate):\n    assert candidate(1, 2) == 3\n"}"#;
    const MBPP_LINE: &str = r#"{"task_id": 11, "text": "Write a python function to remove first and last occurrence of a given character from the string.", "code": "", "test_list": ["assert remove_Occ(\"hello\",\"l\") == \"heo\"", "assert remove_Occ(\"abcda\",\"a\") == \"bcd\""], "test_setup_code": "", "challenge_test_list": []}"#;

    #[test]
    fn test_parse_humaneval() {
        let problems = parse_problems(HUMANEVAL_LINE, BenchmarkKind::HumanEval, None).unwrap();
        assert_eq!(problems.len(), 1);
        let p = &problems[0];
        assert_eq!(p.id, "HumanEval/0");
        assert_eq!(p.entry_point.as_deref(), Some("add"));
        assert!(matches!(p.tests, TestSpec::CheckFunction { .. }));
        assert!(p.first_assertion().is_none());
    }

    #[test]
    fn test_parse_mbpp_numeric_id_and_entry_point() {
        let problems = parse_problems(MBPP_LINE, BenchmarkKind::Mbpp, None).unwrap();
        let p = &problems[0];
        assert_eq!(p.id, "11");
        assert_eq!(p.entry_point.as_deref(), Some("remove_Occ"));
        assert!(p.prompt.ends_with("assert remove_Occ(\"hello\",\"l\") == \"heo\""));
        match &p.tests {
            TestSpec::Assertions { setup, asserts } => {
                assert_eq!(setup, "");
                assert_eq!(asserts.len(), 2);
            }
            other => panic!("unexpected tests: {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_and_limit() {
        let content = format!("\n{}\n\n{}\n{}\n", HUMANEVAL_LINE, HUMANEVAL_LINE, HUMANEVAL_LINE);
        let problems = parse_problems(&content, BenchmarkKind::HumanEval, Some(2)).unwrap();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let content = format!("{}\n\n{{not json\n", HUMANEVAL_LINE);
        let err = parse_problems(&content, BenchmarkKind::HumanEval, None).unwrap_err();
        match err {
            BenchError::Dataset { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_problems(Path::new("/nonexistent/data.jsonl"), BenchmarkKind::Mbpp, None)
            .unwrap_err();
        assert!(matches!(err, BenchError::DatasetMissing { .. }));
    }

    #[test]
    fn test_entry_point_from_assert_skips_wrappers() {
        assert_eq!(
            entry_point_from_assert("assert set(similar_elements((3, 4), (5, 4))) == set((4, 5))"),
            Some("similar_elements".into())
        );
        assert_eq!(
            entry_point_from_assert("assert math.isclose(area(2), 12.56, rel_tol=0.001)"),
            Some("area".into())
        );
        assert_eq!(
            entry_point_from_assert("assert is_woodall(383) == True"),
            Some("is_woodall".into())
        );
        assert_eq!(entry_point_from_assert("x = 1"), None);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(BenchmarkKind::HumanEval.to_string(), "HumanEval");
        assert_eq!(BenchmarkKind::Mbpp.label(), "MBPP");
    }
}
