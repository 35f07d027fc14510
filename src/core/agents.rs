// src/core/agents.rs — Role-scoped agents over a backend

use super::extract::{extract_code, strip_scaffolding};
use super::prompts;
use super::types::{AgentCall, AgentRole, Draft, Verdict};
use crate::provider::backend::Backend;

/// An agent that produces code: the generator, the refiner, or a baseline.
pub struct CodeAgent {
    role: AgentRole,
    backend: Backend,
    system_prompt: String,
    strip_scaffolding: bool,
}

impl CodeAgent {
    pub fn new(role: AgentRole, backend: Backend, system_prompt: impl Into<String>) -> Self {
        Self {
            role,
            backend,
            system_prompt: system_prompt.into(),
            strip_scaffolding: true,
        }
    }

    pub fn generator(backend: Backend) -> Self {
        Self::new(AgentRole::Generator, backend, prompts::GENERATOR_SYSTEM)
    }

    pub fn refiner(backend: Backend) -> Self {
        Self::new(AgentRole::Refiner, backend, prompts::REFINER_SYSTEM)
    }

    pub fn with_strip_scaffolding(mut self, enabled: bool) -> Self {
        self.strip_scaffolding = enabled;
        self
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Call the backend and turn the reply into a draft.
    pub async fn write(&self, user_prompt: &str) -> AgentCall<Draft> {
        let gen = self.backend.generate(&self.system_prompt, user_prompt).await;
        let value = match gen.outcome {
            Draft::Code(reply) => {
                let code = extract_code(&reply);
                if self.strip_scaffolding {
                    Draft::Code(strip_scaffolding(&code))
                } else {
                    Draft::Code(code)
                }
            }
            failed => failed,
        };
        AgentCall {
            value,
            latency: gen.latency,
            tokens: gen.tokens,
        }
    }
}

/// The manager agent: approves a draft or asks for one fix.
pub struct Reviewer {
    backend: Backend,
}

impl Reviewer {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub async fn review(&self, problem: &str, code: &str) -> AgentCall<Verdict> {
        let gen = self
            .backend
            .generate(prompts::REVIEWER_SYSTEM, &prompts::reviewer_user(problem, code))
            .await;
        let value = match gen.outcome {
            Draft::Code(feedback) if prompts::is_approval(&feedback) => Verdict::Approved,
            Draft::Code(feedback) => Verdict::Revise(feedback.trim().to_string()),
            Draft::Failed { reason } => Verdict::Failed { reason },
        };
        AgentCall {
            value,
            latency: gen.latency,
            tokens: gen.tokens,
        }
    }
}
