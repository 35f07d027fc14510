// src/core/system.rs — Strategies under comparison

use async_trait::async_trait;

use super::agents::{CodeAgent, Reviewer};
use super::orchestrator::{Orchestrator, ProgressCallback};
use super::prompts::{self, PromptStyle};
use super::types::{AgentRole, SolveOutput};
use crate::infra::config::{BackendsConfig, SystemConfig};
use crate::provider::resolver::ProviderSet;

/// A code-generation strategy: turns a problem prompt into a draft.
#[async_trait]
pub trait CodeGenSystem: Send + Sync {
    fn name(&self) -> &str;

    async fn solve(&self, problem: &str) -> SolveOutput;
}

/// Single generation with a fixed system prompt.
pub struct Baseline {
    name: String,
    agent: CodeAgent,
}

impl Baseline {
    pub fn new(name: impl Into<String>, agent: CodeAgent) -> Self {
        Self {
            name: name.into(),
            agent,
        }
    }
}

#[async_trait]
impl CodeGenSystem for Baseline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, problem: &str) -> SolveOutput {
        let call = self.agent.write(&prompts::baseline_user(problem)).await;
        SolveOutput {
            draft: call.value,
            latency: call.latency,
            tokens: call.tokens,
            refinement_rounds: 0,
            approved: false,
        }
    }
}

/// Generator, reviewer and refiner cooperating through the orchestrator.
pub struct AgentTeam {
    name: String,
    orchestrator: Orchestrator,
}

impl AgentTeam {
    pub fn new(name: impl Into<String>, orchestrator: Orchestrator) -> Self {
        Self {
            name: name.into(),
            orchestrator,
        }
    }
}

#[async_trait]
impl CodeGenSystem for AgentTeam {
    fn name(&self) -> &str {
        &self.name
    }

    async fn solve(&self, problem: &str) -> SolveOutput {
        self.orchestrator.run(problem).await
    }
}

/// Instantiate a configured system against resolved providers.
pub fn build_system(
    config: &SystemConfig,
    providers: &ProviderSet,
    backends: &BackendsConfig,
    strip_scaffolding: bool,
    progress: Option<ProgressCallback>,
) -> Box<dyn CodeGenSystem> {
    match config {
        SystemConfig::Baseline {
            name,
            model,
            prompt,
            ..
        } => {
            let agent = baseline_agent(providers.backend(model, backends), *prompt)
                .with_strip_scaffolding(strip_scaffolding);
            Box::new(Baseline::new(name.clone(), agent))
        }
        SystemConfig::AgentTeam {
            name,
            generator,
            reviewer,
            refiner,
            max_iterations,
            on_failure,
            ..
        } => {
            let mut orchestrator = Orchestrator::new(
                CodeAgent::generator(providers.backend(generator, backends))
                    .with_strip_scaffolding(strip_scaffolding),
                Reviewer::new(providers.backend(reviewer, backends)),
                CodeAgent::refiner(providers.backend(refiner, backends))
                    .with_strip_scaffolding(strip_scaffolding),
            )
            .with_max_iterations(*max_iterations)
            .with_failure_policy(*on_failure);
            if let Some(cb) = progress {
                orchestrator = orchestrator.with_progress(cb);
            }
            Box::new(AgentTeam::new(name.clone(), orchestrator))
        }
    }
}

fn baseline_agent(backend: crate::provider::backend::Backend, style: PromptStyle) -> CodeAgent {
    CodeAgent::new(AgentRole::Generator, backend, style.system_prompt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::Config;

    #[tokio::test]
    async fn test_default_systems_build_without_providers() {
        let config = Config::default();
        let providers = ProviderSet::new();
        let systems: Vec<_> = config
            .systems
            .iter()
            .map(|s| build_system(s, &providers, &config.backends, true, None))
            .collect();
        assert_eq!(systems[0].name(), "Baseline_Llama31_8B");
        assert_eq!(systems[1].name(), "Agentic_Team");

        // No providers resolved: both systems fail fast instead of erroring.
        for system in &systems {
            let out = system.solve("def add(a, b):").await;
            assert!(out.draft.is_failed());
            assert_eq!(out.tokens, 0);
            assert_eq!(out.refinement_rounds, 0);
        }
    }
}
