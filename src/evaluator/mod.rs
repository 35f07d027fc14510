// src/evaluator/mod.rs — Correctness, quality and timing of a draft

pub mod correctness;
pub mod python;
pub mod quality;
pub mod syntax;
pub mod timing;

use std::sync::Arc;
use std::time::Duration;

use crate::benchmark::dataset::Problem;
use crate::core::types::Draft;
use crate::infra::config::EvaluationConfig;
use crate::infra::errors::BenchError;
use correctness::{CheckOutcome, CorrectnessChecker};
use python::PythonRunner;
use quality::QualityMetrics;
use timing::{ExecTimer, TimingOutcome};

/// Everything measured about one draft.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub check: CheckOutcome,
    pub metrics: QualityMetrics,
    pub timing: TimingOutcome,
}

/// Runs the three evaluators in order for each draft.
pub struct EvaluationPipeline {
    checker: CorrectnessChecker,
    timer: Option<ExecTimer>,
}

impl EvaluationPipeline {
    pub fn new(python: Arc<PythonRunner>, config: &EvaluationConfig) -> Self {
        let checker = CorrectnessChecker::new(
            python.clone(),
            Duration::from_secs(config.check_timeout_secs),
        );
        let timer = config.measure_exec_time.then(|| {
            ExecTimer::new(
                python,
                Duration::from_secs(config.timing_verify_timeout_secs),
                Duration::from_secs(config.timing_run_timeout_secs),
            )
        });
        Self { checker, timer }
    }

    pub fn from_config(config: &EvaluationConfig) -> Result<Self, BenchError> {
        let python = PythonRunner::resolve(config.python.as_deref())?;
        tracing::info!("Using Python interpreter {}", python.interpreter().display());
        Ok(Self::new(Arc::new(python), config))
    }

    pub async fn evaluate(&self, problem: &Problem, draft: &Draft) -> Evaluation {
        let check = self.checker.check(problem, draft).await;
        let metrics = match draft {
            Draft::Code(code) => quality::analyze(code),
            Draft::Failed { .. } => QualityMetrics::default(),
        };
        let timing = match &self.timer {
            Some(timer) => timer.measure(problem, draft).await,
            None => TimingOutcome::Skipped,
        };
        Evaluation {
            check,
            metrics,
            timing,
        }
    }
}
