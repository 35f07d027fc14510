// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;

/// Prefix used when a failed draft has to be rendered as text.
pub const ERROR_MARKER: &str = "ERROR:";

/// The current candidate solution. A failure is its own variant so it can
/// never be executed as code by accident.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Code(String),
    Failed { reason: String },
}

impl Draft {
    pub fn failed(reason: impl Into<String>) -> Self {
        Draft::Failed {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Draft::Code(code) => Some(code),
            Draft::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Draft::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Draft::Code(_) => None,
            Draft::Failed { reason } => Some(reason),
        }
    }

    /// Text form for prompts and result files: the code itself, or
    /// `ERROR: <reason>` for a failure.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Draft::Code(code) => Cow::Borrowed(code),
            Draft::Failed { reason } => Cow::Owned(format!("{} {}", ERROR_MARKER, reason)),
        }
    }
}

/// What the refinement loop does when an agent call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnAgentFailure {
    /// End the loop. A failed reviewer keeps the last good draft.
    #[default]
    Stop,
    /// Feed the failure text onward as if it were code/feedback.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Generator,
    Reviewer,
    Refiner,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Generator => write!(f, "generator"),
            AgentRole::Reviewer => write!(f, "reviewer"),
            AgentRole::Refiner => write!(f, "refiner"),
        }
    }
}

/// The result of one agent call plus its cost.
#[derive(Debug, Clone)]
pub struct AgentCall<T> {
    pub value: T,
    pub latency: Duration,
    pub tokens: u32,
}

/// Reviewer decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Approved,
    Revise(String),
    Failed { reason: String },
}

/// What a system hands back for one problem.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    pub draft: Draft,
    pub latency: Duration,
    pub tokens: u32,
    pub refinement_rounds: u8,
    pub approved: bool,
}

/// Real-time progress events emitted by the refinement loop.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    DraftReady {
        latency: Duration,
        lines: usize,
    },
    ReviewDone {
        iteration: u8,
        latency: Duration,
        feedback: String,
    },
    Approved {
        iteration: u8,
    },
    Refined {
        iteration: u8,
        latency: Duration,
    },
    AgentFailed {
        role: AgentRole,
        reason: String,
    },
    Complete {
        rounds: u8,
        latency: Duration,
        tokens: u32,
        approved: bool,
    },
}
