// src/cli/progress.rs — Terminal rendering of loop and run progress

use std::sync::Arc;

use crate::benchmark::runner::RunEvent;
use crate::core::orchestrator::ProgressCallback;
use crate::core::types::ProgressEvent;
use crate::util::preview_line;

const FEEDBACK_PREVIEW: usize = 60;

/// Agent-loop progress on stderr so stdout stays clean for results.
pub fn terminal_progress() -> ProgressCallback {
    Arc::new(|event: ProgressEvent| eprintln!("{}", format_progress(&event)))
}

/// Per-problem/system lines on stdout.
pub fn run_events() -> impl Fn(RunEvent) + Send + Sync + 'static {
    |event: RunEvent| println!("{}", format_run_event(&event))
}

pub fn format_progress(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::DraftReady { latency, lines } => format!(
            "      [generator] draft ready: {} line(s) in {:.2}s",
            lines,
            latency.as_secs_f64()
        ),
        ProgressEvent::ReviewDone {
            iteration,
            latency,
            feedback,
        } => format!(
            "      [review {}] {} ({:.2}s)",
            iteration,
            preview_line(feedback, FEEDBACK_PREVIEW),
            latency.as_secs_f64()
        ),
        ProgressEvent::Approved { iteration } => {
            format!("      [review {}] approved", iteration)
        }
        ProgressEvent::Refined { iteration, latency } => format!(
            "      [refine {}] revised in {:.2}s",
            iteration,
            latency.as_secs_f64()
        ),
        ProgressEvent::AgentFailed { role, reason } => {
            format!("      [{}] failed: {}", role, preview_line(reason, 120))
        }
        ProgressEvent::Complete {
            rounds,
            latency,
            tokens,
            approved,
        } => format!(
            "      [done] rounds={} approved={} tokens={} latency={:.2}s",
            rounds,
            approved,
            tokens,
            latency.as_secs_f64()
        ),
    }
}

pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::ProblemStart { index, total, id } => {
            format!("\n[Problem {}/{}] ID: {}", index, total, id)
        }
        RunEvent::SystemStart { name } => format!("  [Testing: {}]", name),
        RunEvent::Waiting { name, delay } => {
            format!("  [{}] waiting {}s (rate limit)", name, delay.as_secs())
        }
        RunEvent::RowDone {
            passed,
            complexity,
            loc,
            latency,
            tokens,
            exec_status,
        } => format!(
            "    Passed: {} | Complexity: {} | LOC: {} | Latency: {:.2}s | Tokens: {} | Exec: {}",
            passed,
            complexity,
            loc,
            latency.as_secs_f64(),
            tokens,
            exec_status
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AgentRole;
    use std::time::Duration;

    #[test]
    fn test_review_feedback_is_previewed() {
        let line = format_progress(&ProgressEvent::ReviewDone {
            iteration: 1,
            latency: Duration::from_millis(1500),
            feedback: "Handle the empty list case\nthen return 0".into(),
        });
        assert_eq!(line, "      [review 1] Handle the empty list case (1.50s)");
    }

    #[test]
    fn test_agent_failure_format() {
        let line = format_progress(&ProgressEvent::AgentFailed {
            role: AgentRole::Refiner,
            reason: "Provider 'ollama' error: timeout".into(),
        });
        assert_eq!(line, "      [refiner] failed: Provider 'ollama' error: timeout");
    }

    #[test]
    fn test_complete_format() {
        let line = format_progress(&ProgressEvent::Complete {
            rounds: 1,
            latency: Duration::from_secs(3),
            tokens: 420,
            approved: false,
        });
        assert_eq!(
            line,
            "      [done] rounds=1 approved=false tokens=420 latency=3.00s"
        );
    }

    #[test]
    fn test_run_event_formats() {
        assert_eq!(
            format_run_event(&RunEvent::ProblemStart {
                index: 2,
                total: 164,
                id: "HumanEval/1".into()
            }),
            "\n[Problem 2/164] ID: HumanEval/1"
        );
        assert_eq!(
            format_run_event(&RunEvent::RowDone {
                passed: true,
                complexity: 1,
                loc: 2,
                latency: Duration::from_millis(2500),
                tokens: 88,
                exec_status: "measured",
            }),
            "    Passed: true | Complexity: 1 | LOC: 2 | Latency: 2.50s | Tokens: 88 | Exec: measured"
        );
    }
}
