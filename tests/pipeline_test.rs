// tests/pipeline_test.rs — Integration test: dataset → system → evaluation → CSV

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use codegen_bench::benchmark::dataset::{load_problems, BenchmarkKind};
use codegen_bench::benchmark::recorder::{ResultRecorder, HEADER};
use codegen_bench::benchmark::runner::{BenchEntry, BenchmarkRunner, RunEvent};
use codegen_bench::core::agents::CodeAgent;
use codegen_bench::core::prompts::PromptStyle;
use codegen_bench::core::system::Baseline;
use codegen_bench::core::types::AgentRole;
use codegen_bench::evaluator::python::PythonRunner;
use codegen_bench::evaluator::EvaluationPipeline;
use codegen_bench::infra::config::EvaluationConfig;
use codegen_bench::infra::errors::BenchError;
use codegen_bench::provider::backend::Backend;
use codegen_bench::provider::*;

/// Always answers with the same fenced solution.
struct FixedReply(&'static str);

#[async_trait]
impl ModelProvider for FixedReply {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Fixed Reply"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, BenchError> {
        Ok(ChatResponse {
            content: self.0.to_string(),
            usage: TokenUsage {
                input_tokens: 20,
                output_tokens: 10,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

const DATASET: &str = r#"{"task_id": "HumanEval/0", "prompt": "def add(a: int, b: int) -> int:\n    \"\"\"Add two numbers.\n    >>> add(2, 3)\n    5\n    \"\"\"\n", "entry_point": "add", "test": "def check(candidate):\n    assert candidate(2, 3) == 5\n    assert candidate(-1, 1) == 0\n"}
{"task_id": "HumanEval/1", "prompt": "def sub(a: int, b: int) -> int:\n    \"\"\"Subtract b from a.\"\"\"\n", "entry_point": "sub", "test": "def check(candidate):\n    assert candidate(5, 3) == 2\n"}
"#;

fn baseline(reply: &'static str) -> BenchEntry {
    let backend = Backend::new(ModelRef::new("mock", "fixed"), Arc::new(FixedReply(reply)));
    let agent = CodeAgent::new(AgentRole::Generator, backend, PromptStyle::Minimal.system_prompt());
    BenchEntry {
        system: Box::new(Baseline::new("Baseline_Mock", agent)),
        delay_between_problems: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_add_end_to_end() {
    let Ok(python) = PythonRunner::resolve(None) else {
        eprintln!("skipping: no python interpreter");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("humaneval.jsonl");
    std::fs::write(&path, DATASET).unwrap();
    let problems = load_problems(&path, BenchmarkKind::HumanEval, Some(1)).unwrap();
    assert_eq!(problems.len(), 1);

    let config = EvaluationConfig::default();
    let pipeline = EvaluationPipeline::new(Arc::new(python), &config);
    let events = Arc::new(std::sync::Mutex::new(0usize));
    let counter = events.clone();
    let runner = BenchmarkRunner::new(
        vec![baseline("```python\ndef add(a, b):\n    return a + b\n```")],
        pipeline,
    )
    .with_events(move |event: RunEvent| {
        if matches!(event, RunEvent::RowDone { .. }) {
            *counter.lock().unwrap() += 1;
        }
    });

    let mut recorder = ResultRecorder::from_writer(Vec::new()).unwrap();
    let summary = runner.run(&problems, &mut recorder).await.unwrap();
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.systems[0].passed, 1);
    assert_eq!(*events.lock().unwrap(), 1);

    let csv = String::from_utf8(recorder.into_inner().unwrap()).unwrap();
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());

    let record = reader.records().next().unwrap().unwrap();
    let field = |name: &str| {
        let idx = HEADER.iter().position(|h| *h == name).unwrap();
        record.get(idx).unwrap().to_string()
    };
    assert_eq!(field("problem_id"), "HumanEval/0");
    assert_eq!(field("system_name"), "Baseline_Mock");
    assert_eq!(field("generated_code"), r"def add(a, b):\n    return a + b");
    assert_eq!(field("passed_test"), "true");
    assert_eq!(field("cyclomatic_complexity"), "1");
    assert_eq!(field("num_functions"), "1");
    assert_eq!(field("syntax_valid"), "true");
    assert_eq!(field("total_tokens_used"), "30");
    assert_eq!(field("exec_time_status"), "measured");
    assert!(field("avg_exec_time_ns").parse::<f64>().unwrap() > 0.0);
    assert_eq!(field("error"), "");
}

#[tokio::test]
async fn test_wrong_answer_and_error_marker() {
    let Ok(python) = PythonRunner::resolve(None) else {
        eprintln!("skipping: no python interpreter");
        return;
    };
    let problems = codegen_bench::benchmark::dataset::parse_problems(
        DATASET,
        BenchmarkKind::HumanEval,
        None,
    )
    .unwrap();
    let config = EvaluationConfig {
        measure_exec_time: false,
        ..Default::default()
    };
    let runner = BenchmarkRunner::new(
        vec![
            baseline("def add(a, b):\n    return a * b\n\ndef sub(a, b):\n    return a - b"),
            baseline("# ERROR handling omitted\ndef add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b"),
        ],
        EvaluationPipeline::new(Arc::new(python), &config),
    );
    let mut recorder = ResultRecorder::from_writer(Vec::new()).unwrap();
    let summary = runner.run(&problems, &mut recorder).await.unwrap();

    assert_eq!(summary.rows, 4);
    // First system: add is wrong, sub is right.
    assert_eq!(summary.systems[0].attempted, 2);
    assert_eq!(summary.systems[0].passed, 1);
    // Second system: the error marker means nothing is executed.
    assert_eq!(summary.systems[1].passed, 0);
}
