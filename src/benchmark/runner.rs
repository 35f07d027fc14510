// src/benchmark/runner.rs — Sequential problem × system benchmark loop

use std::io::Write;
use std::time::Duration;

use super::dataset::Problem;
use super::recorder::{escape_code, ResultRecorder, ResultRow};
use crate::core::system::CodeGenSystem;
use crate::core::types::SolveOutput;
use crate::evaluator::{Evaluation, EvaluationPipeline};
use crate::infra::errors::BenchError;

/// A system plus its pacing between problems.
pub struct BenchEntry {
    pub system: Box<dyn CodeGenSystem>,
    pub delay_between_problems: Duration,
}

/// Per-row progress for the console.
#[derive(Debug, Clone)]
pub enum RunEvent {
    ProblemStart {
        index: usize,
        total: usize,
        id: String,
    },
    SystemStart {
        name: String,
    },
    Waiting {
        name: String,
        delay: Duration,
    },
    RowDone {
        passed: bool,
        complexity: u32,
        loc: u32,
        latency: Duration,
        tokens: u32,
        exec_status: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemTally {
    pub name: String,
    pub attempted: usize,
    pub passed: usize,
    pub total_latency: Duration,
    pub total_tokens: u64,
}

impl SystemTally {
    pub fn pass_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.passed as f64 / self.attempted as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub problems: usize,
    pub rows: usize,
    pub systems: Vec<SystemTally>,
}

pub struct BenchmarkRunner {
    entries: Vec<BenchEntry>,
    pipeline: EvaluationPipeline,
    on_event: Option<Box<dyn Fn(RunEvent) + Send + Sync>>,
}

impl BenchmarkRunner {
    pub fn new(entries: Vec<BenchEntry>, pipeline: EvaluationPipeline) -> Self {
        Self {
            entries,
            pipeline,
            on_event: None,
        }
    }

    pub fn with_events(mut self, cb: impl Fn(RunEvent) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(ref cb) = self.on_event {
            cb(event);
        }
    }

    /// Evaluate every system on every problem, appending one row per pair.
    pub async fn run<W: Write>(
        &self,
        problems: &[Problem],
        recorder: &mut ResultRecorder<W>,
    ) -> Result<RunSummary, BenchError> {
        let mut summary = RunSummary {
            problems: problems.len(),
            rows: 0,
            systems: self
                .entries
                .iter()
                .map(|e| SystemTally {
                    name: e.system.name().to_string(),
                    ..Default::default()
                })
                .collect(),
        };

        for (index, problem) in problems.iter().enumerate() {
            self.emit(RunEvent::ProblemStart {
                index: index + 1,
                total: problems.len(),
                id: problem.id.clone(),
            });

            for (entry, tally) in self.entries.iter().zip(summary.systems.iter_mut()) {
                let name = entry.system.name().to_string();
                if index > 0 && !entry.delay_between_problems.is_zero() {
                    self.emit(RunEvent::Waiting {
                        name: name.clone(),
                        delay: entry.delay_between_problems,
                    });
                    tokio::time::sleep(entry.delay_between_problems).await;
                }

                self.emit(RunEvent::SystemStart { name: name.clone() });
                let output = entry.system.solve(&problem.prompt).await;
                let evaluation = self.pipeline.evaluate(problem, &output.draft).await;
                let row = build_row(problem, &name, &output, &evaluation);

                self.emit(RunEvent::RowDone {
                    passed: row.passed_test,
                    complexity: row.cyclomatic_complexity,
                    loc: row.loc,
                    latency: output.latency,
                    tokens: output.tokens,
                    exec_status: evaluation.timing.status(),
                });

                tally.attempted += 1;
                tally.passed += usize::from(row.passed_test);
                tally.total_latency += output.latency;
                tally.total_tokens += u64::from(output.tokens);

                recorder.append(&row)?;
            }
        }
        summary.rows = recorder.rows_written();

        Ok(summary)
    }
}

pub fn build_row(
    problem: &Problem,
    system_name: &str,
    output: &SolveOutput,
    evaluation: &Evaluation,
) -> ResultRow {
    let error = match output.draft.failure_reason() {
        Some(reason) => reason.to_string(),
        None => evaluation.check.reason(),
    };
    ResultRow {
        problem_id: problem.id.clone(),
        system_name: system_name.to_string(),
        generated_code: escape_code(&output.draft.as_text()),
        passed_test: evaluation.check.passed(),
        generation_latency_sec: output.latency.as_secs_f64(),
        total_tokens_used: output.tokens,
        loc: evaluation.metrics.loc,
        cyclomatic_complexity: evaluation.metrics.cyclomatic_complexity,
        has_imports: evaluation.metrics.has_imports,
        has_docstring: evaluation.metrics.has_docstring,
        syntax_valid: evaluation.metrics.syntax_valid,
        num_functions: evaluation.metrics.num_functions,
        avg_exec_time_ns: evaluation.timing.avg_ns(),
        exec_time_status: evaluation.timing.status().to_string(),
        refinement_rounds: output.refinement_rounds,
        error,
    }
}
