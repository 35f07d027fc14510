// src/core/orchestrator.rs — Generator → reviewer → refiner loop

use std::sync::Arc;
use std::time::Duration;

use super::agents::{CodeAgent, Reviewer};
use super::prompts;
use super::types::*;

/// Callback invoked at each loop transition.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Drives one problem through draft, review and refinement.
pub struct Orchestrator {
    generator: CodeAgent,
    reviewer: Reviewer,
    refiner: CodeAgent,
    max_iterations: u8,
    on_failure: OnAgentFailure,
    on_progress: Option<ProgressCallback>,
}

/// Mutable state of a single run.
struct IterationState {
    draft: Draft,
    latency: Duration,
    tokens: u32,
    rounds: u8,
    approved: bool,
}

impl IterationState {
    fn absorb<T>(&mut self, call: &AgentCall<T>) {
        self.latency += call.latency;
        self.tokens += call.tokens;
    }

    fn finish(self) -> SolveOutput {
        SolveOutput {
            draft: self.draft,
            latency: self.latency,
            tokens: self.tokens,
            refinement_rounds: self.rounds,
            approved: self.approved,
        }
    }
}

impl Orchestrator {
    pub fn new(generator: CodeAgent, reviewer: Reviewer, refiner: CodeAgent) -> Self {
        Self {
            generator,
            reviewer,
            refiner,
            max_iterations: 1,
            on_failure: OnAgentFailure::default(),
            on_progress: None,
        }
    }

    /// Upper bound on review/refine rounds. Zero means generate only.
    pub fn with_max_iterations(mut self, max_iterations: u8) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_failure_policy(mut self, policy: OnAgentFailure) -> Self {
        self.on_failure = policy;
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: ProgressCallback) -> Self {
        self.on_progress = Some(cb);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    fn report_failure(&self, role: AgentRole, draft: &Draft) {
        if let Some(reason) = draft.failure_reason() {
            tracing::warn!("{} failed: {}", role, reason);
            self.emit(ProgressEvent::AgentFailed {
                role,
                reason: reason.to_string(),
            });
        }
    }

    pub async fn run(&self, problem: &str) -> SolveOutput {
        let first = self.generator.write(&prompts::generator_user(problem)).await;
        let mut state = IterationState {
            draft: Draft::failed("not generated"),
            latency: Duration::ZERO,
            tokens: 0,
            rounds: 0,
            approved: false,
        };
        state.absorb(&first);
        state.draft = first.value;

        match &state.draft {
            Draft::Code(code) => self.emit(ProgressEvent::DraftReady {
                latency: first.latency,
                lines: code.lines().count(),
            }),
            failed => self.report_failure(AgentRole::Generator, failed),
        }

        if !(state.draft.is_failed() && self.on_failure == OnAgentFailure::Stop) {
            self.refine(problem, &mut state).await;
        }

        self.emit(ProgressEvent::Complete {
            rounds: state.rounds,
            latency: state.latency,
            tokens: state.tokens,
            approved: state.approved,
        });
        tracing::debug!(
            "Loop finished: {} rounds, approved={}, {} tokens",
            state.rounds,
            state.approved,
            state.tokens
        );
        state.finish()
    }

    async fn refine(&self, problem: &str, state: &mut IterationState) {
        while state.rounds < self.max_iterations {
            let iteration = state.rounds + 1;
            let review = self.reviewer.review(problem, &state.draft.as_text()).await;
            state.absorb(&review);

            let feedback = match review.value {
                Verdict::Approved => {
                    state.approved = true;
                    self.emit(ProgressEvent::Approved { iteration });
                    return;
                }
                Verdict::Revise(feedback) => {
                    self.emit(ProgressEvent::ReviewDone {
                        iteration,
                        latency: review.latency,
                        feedback: feedback.clone(),
                    });
                    feedback
                }
                Verdict::Failed { reason } => {
                    let failed = Draft::failed(reason);
                    self.report_failure(AgentRole::Reviewer, &failed);
                    if self.on_failure == OnAgentFailure::Stop {
                        return;
                    }
                    failed.as_text().into_owned()
                }
            };

            let refined = self
                .refiner
                .write(&prompts::refiner_user(&state.draft.as_text(), &feedback, problem))
                .await;
            state.absorb(&refined);
            state.draft = refined.value;
            state.rounds = iteration;

            if state.draft.is_failed() {
                self.report_failure(AgentRole::Refiner, &state.draft);
                if self.on_failure == OnAgentFailure::Stop {
                    return;
                }
            } else {
                self.emit(ProgressEvent::Refined {
                    iteration,
                    latency: refined.latency,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accumulates_failed_calls() {
        let mut state = IterationState {
            draft: Draft::Code("x = 1".into()),
            latency: Duration::ZERO,
            tokens: 0,
            rounds: 0,
            approved: false,
        };
        state.absorb(&AgentCall {
            value: (),
            latency: Duration::from_millis(250),
            tokens: 40,
        });
        state.absorb(&AgentCall {
            value: (),
            latency: Duration::from_millis(100),
            tokens: 0,
        });
        let out = state.finish();
        assert_eq!(out.latency, Duration::from_millis(350));
        assert_eq!(out.tokens, 40);
        assert_eq!(out.refinement_rounds, 0);
    }
}
